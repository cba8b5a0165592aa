//! House Price Predictor
//!
//! Sale price estimation for residential properties from a fixed set of
//! attributes, with optimistic / pessimistic market scenarios.
//!
//! ## Architecture
//!
//! ```text
//! RawPropertyRecord → Schema (validate) → Encoder (fit / transform) → Regressor
//!                                                  ↓                      ↓
//!                                     TrainedArtifact { rule, model } ← Pipeline
//!                                                  ↓
//!                      ArtifactStore / ArtifactSlot → PredictionService ← Scenario
//! ```

pub mod config;
pub mod data;
pub mod error;
pub mod ml;
pub mod scenario;
pub mod schema;
pub mod storage;

#[cfg(test)]
mod config_tests;
