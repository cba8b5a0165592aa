//! Prediction service
//!
//! Scores raw property records against an explicitly attached artifact.
//!
//! Usage:
//! ```ignore
//! let mut service = PredictionService::new(FeatureSchema::new());
//! service.attach(Arc::new(artifact));
//! let result = service.predict(&raw, Scenario::Optimistic)?;
//! ```

use super::estimator::FittedModel;
use super::forest::RandomForest;
use super::pipeline::TrainedArtifact;
use crate::error::{PredictorError, Result};
use crate::scenario::{Scenario, ScenarioAdjuster};
use crate::schema::{fields, FeatureSchema, PropertyRecord, RawPropertyRecord};
use rust_decimal::prelude::*;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

/// Non-fatal conditions noticed while scoring
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PredictionWarning {
    /// Category not in the artifact's vocabulary; encoded as all zeros
    UnknownCategory { field: &'static str, value: String },
}

impl fmt::Display for PredictionWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PredictionWarning::UnknownCategory { field, value } => {
                write!(f, "unknown {} '{}' scored without a category effect", field, value)
            }
        }
    }
}

/// One scored record
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionResult {
    /// Estimated sale price in USD, rounded to cents
    pub point_estimate: Decimal,
    /// The record actually scored (after any scenario adjustment)
    pub input_echo: PropertyRecord,
    pub scenario: Scenario,
    /// Artifact that produced the estimate
    pub artifact_id: Uuid,
    pub warnings: Vec<PredictionWarning>,
}

/// Estimates for all three scenarios of one record
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScenarioEstimates {
    pub baseline: PredictionResult,
    pub optimistic: PredictionResult,
    pub pessimistic: PredictionResult,
}

impl ScenarioEstimates {
    pub fn get(&self, scenario: Scenario) -> &PredictionResult {
        match scenario {
            Scenario::Baseline => &self.baseline,
            Scenario::Optimistic => &self.optimistic,
            Scenario::Pessimistic => &self.pessimistic,
        }
    }
}

/// Read-only scoring over an attached artifact
pub struct PredictionService<M = RandomForest> {
    schema: FeatureSchema,
    adjuster: ScenarioAdjuster,
    artifact: Option<Arc<TrainedArtifact<M>>>,
}

impl<M: FittedModel> PredictionService<M> {
    /// Service with no artifact attached; predictions fail until one is
    pub fn new(schema: FeatureSchema) -> Self {
        let adjuster = ScenarioAdjuster::new(&schema);
        Self {
            schema,
            adjuster,
            artifact: None,
        }
    }

    pub fn with_artifact(schema: FeatureSchema, artifact: Arc<TrainedArtifact<M>>) -> Self {
        let mut service = Self::new(schema);
        service.attach(artifact);
        service
    }

    pub fn with_adjuster(mut self, adjuster: ScenarioAdjuster) -> Self {
        self.adjuster = adjuster;
        self
    }

    /// Attach (or replace) the artifact used for scoring
    pub fn attach(&mut self, artifact: Arc<TrainedArtifact<M>>) {
        tracing::info!("Prediction service using artifact {}", artifact.id());
        self.artifact = Some(artifact);
    }

    pub fn detach(&mut self) -> Option<Arc<TrainedArtifact<M>>> {
        self.artifact.take()
    }

    pub fn artifact(&self) -> Option<&Arc<TrainedArtifact<M>>> {
        self.artifact.as_ref()
    }

    pub fn is_loaded(&self) -> bool {
        self.artifact.is_some()
    }

    pub fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    /// Score a raw record under a scenario.
    ///
    /// Fails with `ArtifactNotLoaded` when nothing is attached and
    /// `InvalidRecord` when a field is missing or outside its domain.
    pub fn predict(&self, raw: &RawPropertyRecord, scenario: Scenario) -> Result<PredictionResult> {
        self.predict_with(raw, self.artifact.as_deref(), scenario)
    }

    /// Score against an explicitly supplied artifact instead of the attached one
    pub fn predict_with(
        &self,
        raw: &RawPropertyRecord,
        artifact: Option<&TrainedArtifact<M>>,
        scenario: Scenario,
    ) -> Result<PredictionResult> {
        let artifact = artifact.ok_or(PredictorError::ArtifactNotLoaded)?;
        let record = self.schema.validate(raw)?;
        self.score(artifact, &record, scenario)
    }

    /// Score a raw record under every scenario
    pub fn predict_scenarios(&self, raw: &RawPropertyRecord) -> Result<ScenarioEstimates> {
        let artifact = self.loaded()?;
        let record = self.schema.validate(raw)?;

        Ok(ScenarioEstimates {
            baseline: self.score(artifact, &record, Scenario::Baseline)?,
            optimistic: self.score(artifact, &record, Scenario::Optimistic)?,
            pessimistic: self.score(artifact, &record, Scenario::Pessimistic)?,
        })
    }

    fn loaded(&self) -> Result<&TrainedArtifact<M>> {
        self.artifact.as_deref().ok_or(PredictorError::ArtifactNotLoaded)
    }

    fn score(
        &self,
        artifact: &TrainedArtifact<M>,
        record: &PropertyRecord,
        scenario: Scenario,
    ) -> Result<PredictionResult> {
        let adjusted = self.adjuster.apply(scenario, record);

        let mut warnings = Vec::new();
        if !artifact.rule().is_known(&adjusted.neighborhood) {
            tracing::warn!(
                "Neighborhood '{}' not in artifact vocabulary, encoding as unknown",
                adjusted.neighborhood
            );
            warnings.push(PredictionWarning::UnknownCategory {
                field: fields::NEIGHBORHOOD,
                value: adjusted.neighborhood.clone(),
            });
        }

        let features = artifact.encode(&adjusted);
        let raw_estimate = artifact.predict_encoded(&features);
        let point_estimate = Decimal::from_f64(raw_estimate)
            .ok_or_else(|| {
                PredictorError::Estimator(format!("estimate {} is not representable", raw_estimate))
            })?
            .round_dp(2);

        tracing::debug!(
            "Scored {} scenario (trend {:.2}): {}",
            scenario,
            adjusted.recent_price_trend,
            point_estimate
        );

        Ok(PredictionResult {
            point_estimate,
            input_echo: adjusted,
            scenario,
            artifact_id: artifact.id(),
            warnings,
        })
    }
}
