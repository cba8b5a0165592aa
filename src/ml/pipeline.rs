//! Training pipeline and the trained artifact
//!
//! `train` validates every labeled row, fits the encoding rule, encodes the
//! rows with it and fits the estimator on the encoded matrix. The artifact is
//! only constructed once every step has succeeded.

use super::encoder::{EncodedFeatureVector, EncodingRule, FeatureEncoder};
use super::estimator::{FittedModel, Regressor};
use super::forest::{ForestParams, RandomForest, RandomForestRegressor};
use crate::error::{FieldError, PredictorError, Result};
use crate::schema::{fields, FeatureSchema, LabeledRecord, PropertyRecord};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Bumped whenever the serialized artifact layout changes
pub const ARTIFACT_FORMAT_VERSION: u32 = 1;

/// Descriptive data stored with every artifact
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactMetadata {
    pub id: Uuid,
    pub format_version: u32,
    pub trained_at: DateTime<Utc>,
    /// Number of labeled rows the artifact was trained on
    pub n_samples: usize,
    /// Estimator name, e.g. `random_forest`
    pub estimator: String,
}

/// Immutable bundle of encoding rule and fitted estimator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainedArtifact<M = RandomForest> {
    metadata: ArtifactMetadata,
    rule: EncodingRule,
    model: M,
}

impl<M: FittedModel> TrainedArtifact<M> {
    fn assemble(rule: EncodingRule, model: M, n_samples: usize) -> Result<Self> {
        let artifact = Self {
            metadata: ArtifactMetadata {
                id: Uuid::new_v4(),
                format_version: ARTIFACT_FORMAT_VERSION,
                trained_at: Utc::now(),
                n_samples,
                estimator: model.name().to_string(),
            },
            rule,
            model,
        };
        artifact.validate()?;
        Ok(artifact)
    }

    /// Check internal consistency (used after deserialization)
    pub fn validate(&self) -> Result<()> {
        if self.metadata.format_version != ARTIFACT_FORMAT_VERSION {
            return Err(PredictorError::CorruptArtifact(format!(
                "unsupported format version {} (expected {})",
                self.metadata.format_version, ARTIFACT_FORMAT_VERSION
            )));
        }
        self.rule.validate()?;
        self.model.validate()?;
        if self.model.n_features() != self.rule.width() {
            return Err(PredictorError::CorruptArtifact(format!(
                "estimator expects {} features but encoding produces {}",
                self.model.n_features(),
                self.rule.width()
            )));
        }
        Ok(())
    }

    pub fn metadata(&self) -> &ArtifactMetadata {
        &self.metadata
    }

    pub fn id(&self) -> Uuid {
        self.metadata.id
    }

    pub fn rule(&self) -> &EncodingRule {
        &self.rule
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    /// Encoded column names in estimator order
    pub fn feature_names(&self) -> Vec<String> {
        self.rule.feature_names()
    }

    /// Encode a validated record with this artifact's rule
    pub fn encode(&self, record: &PropertyRecord) -> EncodedFeatureVector {
        self.rule.transform(record)
    }

    /// Score an encoded vector
    pub fn predict_encoded(&self, features: &EncodedFeatureVector) -> f64 {
        self.model.predict_row(features.as_slice())
    }
}

/// Fits an encoding rule and an estimator into a [`TrainedArtifact`]
pub struct TrainingPipeline<R> {
    schema: FeatureSchema,
    encoder: FeatureEncoder,
    estimator: R,
}

impl TrainingPipeline<RandomForestRegressor> {
    /// Pipeline with the default random forest estimator
    pub fn random_forest(schema: FeatureSchema, params: ForestParams) -> Self {
        Self::new(schema, RandomForestRegressor::new(params))
    }
}

impl<R: Regressor> TrainingPipeline<R> {
    pub fn new(schema: FeatureSchema, estimator: R) -> Self {
        let encoder = FeatureEncoder::new(schema.clone());
        Self {
            schema,
            encoder,
            estimator,
        }
    }

    pub fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    pub fn estimator(&self) -> &R {
        &self.estimator
    }

    /// Train on labeled records.
    ///
    /// Fails with `EmptyDataset` on no rows, `SchemaMismatch` when a row is
    /// missing a field (label included) or carries an undeclared one, and
    /// `InvalidTrainingRow` when a value is outside its domain.
    pub fn train(&self, data: &[LabeledRecord]) -> Result<TrainedArtifact<R::Model>> {
        if data.is_empty() {
            return Err(PredictorError::EmptyDataset);
        }

        let mut records = Vec::with_capacity(data.len());
        let mut targets = Vec::with_capacity(data.len());
        for (row, labeled) in data.iter().enumerate() {
            let record = self
                .schema
                .validate(&labeled.record)
                .map_err(|e| PredictorError::training_row(row, e))?;
            let price = labeled
                .sale_price
                .ok_or_else(|| PredictorError::training_row(row, FieldError::Missing(fields::SALE_PRICE)))?;
            if !price.is_finite() {
                return Err(PredictorError::training_row(row, FieldError::NotFinite(fields::SALE_PRICE)));
            }
            records.push(record);
            targets.push(price);
        }

        let rule = self.encoder.fit(&records);
        let matrix: Vec<Vec<f64>> = records
            .iter()
            .map(|r| self.encoder.transform(r, &rule).into_vec())
            .collect();

        let model = self.estimator.fit(&matrix, &targets)?;
        let artifact = TrainedArtifact::assemble(rule, model, records.len())?;

        tracing::info!(
            "Trained {} artifact {} on {} rows ({} features)",
            artifact.metadata.estimator,
            artifact.metadata.id,
            artifact.metadata.n_samples,
            artifact.rule.width()
        );

        Ok(artifact)
    }
}
