//! Machine learning pipeline
//!
//! Provides sale price estimation with:
//! - Feature encoding (one-hot neighborhood, numeric passthrough, derived flag)
//! - A pluggable estimator seam with a random forest default
//! - Training into an immutable artifact
//! - Scenario-aware prediction over an attached artifact

pub mod encoder;
pub mod estimator;
pub mod forest;
pub mod pipeline;
pub mod predictor;


pub use encoder::{EncodedFeatureVector, EncodingRule, FeatureEncoder, NumericColumn};
pub use estimator::{FittedModel, MeanModel, MeanRegressor, Regressor};
pub use forest::{ForestParams, RandomForest, RandomForestRegressor, RegressionTree, TreeNode, TreeParams};
pub use pipeline::{ArtifactMetadata, TrainedArtifact, TrainingPipeline, ARTIFACT_FORMAT_VERSION};
pub use predictor::{PredictionResult, PredictionService, PredictionWarning, ScenarioEstimates};
