//! Configuration
//!
//! Loaded from an optional TOML file, then overridden by `HOUSE_PRICE__*`
//! environment variables (e.g. `HOUSE_PRICE__TRAINING__N_ESTIMATORS=200`).

use crate::error::{PredictorError, Result};
use crate::ml::{ForestParams, TreeParams};
use crate::scenario::ScenarioAdjuster;
use crate::schema::FeatureSchema;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub artifact: ArtifactConfig,
    #[serde(default)]
    pub training: TrainingConfig,
    #[serde(default)]
    pub data: DataConfig,
    #[serde(default)]
    pub scenario: ScenarioConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactConfig {
    /// Artifact file; `~` and `$VARS` are expanded
    #[serde(default = "default_artifact_path")]
    pub path: String,
}

fn default_artifact_path() -> String {
    "house_price_predictor.json".to_string()
}

impl Default for ArtifactConfig {
    fn default() -> Self {
        Self {
            path: default_artifact_path(),
        }
    }
}

impl ArtifactConfig {
    pub fn resolved_path(&self) -> PathBuf {
        expand_path(&self.path)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingConfig {
    #[serde(default = "default_n_estimators")]
    pub n_estimators: usize,
    /// Unlimited when absent
    #[serde(default)]
    pub max_depth: Option<usize>,
    #[serde(default = "default_min_samples_split")]
    pub min_samples_split: usize,
    #[serde(default = "default_min_samples_leaf")]
    pub min_samples_leaf: usize,
    #[serde(default = "default_true")]
    pub bootstrap: bool,
    #[serde(default = "default_seed")]
    pub seed: u64,
}

fn default_n_estimators() -> usize {
    100
}
fn default_min_samples_split() -> usize {
    2
}
fn default_min_samples_leaf() -> usize {
    1
}
fn default_true() -> bool {
    true
}
fn default_seed() -> u64 {
    42
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            n_estimators: default_n_estimators(),
            max_depth: None,
            min_samples_split: default_min_samples_split(),
            min_samples_leaf: default_min_samples_leaf(),
            bootstrap: true,
            seed: default_seed(),
        }
    }
}

impl TrainingConfig {
    pub fn forest_params(&self) -> ForestParams {
        ForestParams {
            n_estimators: self.n_estimators,
            tree: TreeParams {
                max_depth: self.max_depth,
                min_samples_split: self.min_samples_split,
                min_samples_leaf: self.min_samples_leaf,
            },
            bootstrap: self.bootstrap,
            seed: self.seed,
        }
    }
}

/// Synthetic dataset settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    #[serde(default = "default_samples")]
    pub samples: usize,
    #[serde(default = "default_seed")]
    pub seed: u64,
    /// JSON-lines training file; synthetic data is generated when unset
    #[serde(default)]
    pub train_file: Option<String>,
}

fn default_samples() -> usize {
    500
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            samples: default_samples(),
            seed: default_seed(),
            train_file: None,
        }
    }
}

impl DataConfig {
    pub fn resolved_train_file(&self) -> Option<PathBuf> {
        self.train_file.as_deref().map(expand_path)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioConfig {
    /// Trend shift in percentage points for optimistic / pessimistic
    #[serde(default = "default_trend_shift")]
    pub trend_shift: f64,
}

fn default_trend_shift() -> f64 {
    ScenarioAdjuster::DEFAULT_SHIFT
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self {
            trend_shift: default_trend_shift(),
        }
    }
}

impl ScenarioConfig {
    pub fn adjuster(&self, schema: &FeatureSchema) -> Result<ScenarioAdjuster> {
        ScenarioAdjuster::with_shift(schema, self.trend_shift)
    }
}

fn expand_path(path: &str) -> PathBuf {
    match shellexpand::full(path) {
        Ok(expanded) => PathBuf::from(expanded.as_ref()),
        Err(e) => {
            tracing::warn!("Could not expand path '{}': {}", path, e);
            PathBuf::from(path)
        }
    }
}

impl Config {
    /// Load configuration from file and environment
    pub fn load(path: &str) -> Result<Self> {
        dotenvy::dotenv().ok();

        let settings = config::Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .add_source(
                config::Environment::with_prefix("HOUSE_PRICE")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: Config = settings.try_deserialize()?;
        if !config.scenario.trend_shift.is_finite() {
            return Err(PredictorError::InvalidShift(config.scenario.trend_shift));
        }
        tracing::debug!("Loaded config from {}", path);
        Ok(config)
    }
}
