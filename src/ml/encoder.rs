//! Feature encoding
//!
//! Turns a validated [`PropertyRecord`] into the numeric vector the estimator
//! consumes:
//!
//! ```text
//! [ one-hot neighborhood (|vocabulary|) | numeric + derived columns ]
//! ```
//!
//! The vocabulary and the numeric column order are fitted once and stored in
//! an [`EncodingRule`], which travels inside the trained artifact. Inference
//! always encodes with the artifact's rule.

use crate::error::{PredictorError, Result};
use crate::schema::{fields, FeatureSchema, PropertyRecord};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A numeric column and how to read it from a record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NumericColumn {
    LivingArea,
    OverallQuality,
    YearBuilt,
    RecentPriceTrend,
    PropertyTax,
    CrimeRate,
    SchoolRating,
    DistanceToCity,
    PricePerSqftFlag,
}

impl NumericColumn {
    /// Column backing a schema field, if the field is numeric
    pub fn for_field(name: &str) -> Option<Self> {
        let column = match name {
            fields::LIVING_AREA => NumericColumn::LivingArea,
            fields::OVERALL_QUALITY => NumericColumn::OverallQuality,
            fields::YEAR_BUILT => NumericColumn::YearBuilt,
            fields::RECENT_PRICE_TREND => NumericColumn::RecentPriceTrend,
            fields::PROPERTY_TAX => NumericColumn::PropertyTax,
            fields::CRIME_RATE => NumericColumn::CrimeRate,
            fields::SCHOOL_RATING => NumericColumn::SchoolRating,
            fields::DISTANCE_TO_CITY => NumericColumn::DistanceToCity,
            fields::PRICE_PER_SQFT_FLAG => NumericColumn::PricePerSqftFlag,
            _ => return None,
        };
        Some(column)
    }

    pub fn name(self) -> &'static str {
        match self {
            NumericColumn::LivingArea => fields::LIVING_AREA,
            NumericColumn::OverallQuality => fields::OVERALL_QUALITY,
            NumericColumn::YearBuilt => fields::YEAR_BUILT,
            NumericColumn::RecentPriceTrend => fields::RECENT_PRICE_TREND,
            NumericColumn::PropertyTax => fields::PROPERTY_TAX,
            NumericColumn::CrimeRate => fields::CRIME_RATE,
            NumericColumn::SchoolRating => fields::SCHOOL_RATING,
            NumericColumn::DistanceToCity => fields::DISTANCE_TO_CITY,
            NumericColumn::PricePerSqftFlag => fields::PRICE_PER_SQFT_FLAG,
        }
    }

    /// Read the column value. The flag is always derived from `living_area`.
    pub fn value(self, record: &PropertyRecord) -> f64 {
        match self {
            NumericColumn::LivingArea => record.living_area,
            NumericColumn::OverallQuality => f64::from(record.overall_quality),
            NumericColumn::YearBuilt => f64::from(record.year_built),
            NumericColumn::RecentPriceTrend => record.recent_price_trend,
            NumericColumn::PropertyTax => record.property_tax,
            NumericColumn::CrimeRate => record.crime_rate,
            NumericColumn::SchoolRating => f64::from(record.school_rating),
            NumericColumn::DistanceToCity => record.distance_to_city,
            NumericColumn::PricePerSqftFlag => f64::from(record.price_per_sqft_flag()),
        }
    }
}

/// Encoded feature vector
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedFeatureVector {
    values: Vec<f64>,
    categorical_width: usize,
}

impl EncodedFeatureVector {
    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// The one-hot neighborhood block
    pub fn categorical_block(&self) -> &[f64] {
        &self.values[..self.categorical_width]
    }

    /// Numeric and derived columns, in rule order
    pub fn numeric_block(&self) -> &[f64] {
        &self.values[self.categorical_width..]
    }

    pub fn into_vec(self) -> Vec<f64> {
        self.values
    }
}

/// Fitted encoding: category vocabulary plus numeric column order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncodingRule {
    /// Sorted, de-duplicated neighborhood labels, one column each
    vocabulary: Vec<String>,
    numeric_columns: Vec<NumericColumn>,
}

impl EncodingRule {
    /// Build a rule from explicit parts, checking its invariants
    pub fn new(vocabulary: Vec<String>, numeric_columns: Vec<NumericColumn>) -> Result<Self> {
        let rule = Self {
            vocabulary,
            numeric_columns,
        };
        rule.validate()?;
        Ok(rule)
    }

    /// Check the invariants a deserialized rule must hold
    pub fn validate(&self) -> Result<()> {
        if self.vocabulary.windows(2).any(|w| w[0] >= w[1]) {
            return Err(PredictorError::CorruptArtifact(
                "encoding vocabulary is not sorted and unique".into(),
            ));
        }
        if self.numeric_columns.is_empty() {
            return Err(PredictorError::CorruptArtifact(
                "encoding rule has no numeric columns".into(),
            ));
        }
        let distinct: BTreeSet<&str> = self.numeric_columns.iter().map(|c| c.name()).collect();
        if distinct.len() != self.numeric_columns.len() {
            return Err(PredictorError::CorruptArtifact(
                "encoding rule repeats a numeric column".into(),
            ));
        }
        Ok(())
    }

    pub fn vocabulary(&self) -> &[String] {
        &self.vocabulary
    }

    pub fn numeric_columns(&self) -> &[NumericColumn] {
        &self.numeric_columns
    }

    /// Total encoded width
    pub fn width(&self) -> usize {
        self.vocabulary.len() + self.numeric_columns.len()
    }

    /// One-hot column of a label, if the label was seen at fit time
    pub fn category_index(&self, label: &str) -> Option<usize> {
        self.vocabulary
            .binary_search_by(|known| known.as_str().cmp(label))
            .ok()
    }

    pub fn is_known(&self, label: &str) -> bool {
        self.category_index(label).is_some()
    }

    /// Column names in encoded order, e.g. `neighborhood_CollgCr`, `living_area`
    pub fn feature_names(&self) -> Vec<String> {
        self.vocabulary
            .iter()
            .map(|label| format!("{}_{}", fields::NEIGHBORHOOD, label))
            .chain(self.numeric_columns.iter().map(|c| c.name().to_string()))
            .collect()
    }

    /// Encode one record. Unknown neighborhoods produce an all-zero block.
    pub fn transform(&self, record: &PropertyRecord) -> EncodedFeatureVector {
        let mut values = vec![0.0; self.width()];

        if let Some(idx) = self.category_index(&record.neighborhood) {
            values[idx] = 1.0;
        }

        let offset = self.vocabulary.len();
        for (i, column) in self.numeric_columns.iter().enumerate() {
            values[offset + i] = column.value(record);
        }

        EncodedFeatureVector {
            values,
            categorical_width: self.vocabulary.len(),
        }
    }
}

/// Fits encoding rules and applies them
#[derive(Debug, Clone)]
pub struct FeatureEncoder {
    schema: FeatureSchema,
}

impl FeatureEncoder {
    pub fn new(schema: FeatureSchema) -> Self {
        Self { schema }
    }

    /// Fit the rule on validated records.
    ///
    /// The vocabulary is the sorted set of observed labels that belong to the
    /// known neighborhood set; numeric columns follow schema declaration order.
    pub fn fit(&self, records: &[PropertyRecord]) -> EncodingRule {
        let observed: BTreeSet<&str> = records.iter().map(|r| r.neighborhood.as_str()).collect();
        let vocabulary: Vec<String> = observed
            .iter()
            .filter(|label| self.schema.is_known_neighborhood(label))
            .map(|label| label.to_string())
            .collect();

        let skipped = observed.len() - vocabulary.len();
        if skipped > 0 {
            tracing::debug!("Excluded {} unrecognized neighborhood labels from vocabulary", skipped);
        }

        let numeric_columns: Vec<NumericColumn> = self
            .schema
            .numeric_fields()
            .filter_map(|f| NumericColumn::for_field(f.name))
            .collect();

        tracing::debug!(
            "Fitted encoding rule: {} categories, {} numeric columns",
            vocabulary.len(),
            numeric_columns.len()
        );

        EncodingRule {
            vocabulary,
            numeric_columns,
        }
    }

    pub fn transform(&self, record: &PropertyRecord, rule: &EncodingRule) -> EncodedFeatureVector {
        rule.transform(record)
    }
}
