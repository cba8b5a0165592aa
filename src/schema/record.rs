//! Property records: raw input as collected, and the validated form

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Attribute values as they arrive from a form, batch file or API payload.
///
/// Every field is optional so that missing attributes can be reported as
/// schema errors instead of failing deserialization. Anything not declared
/// here lands in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawPropertyRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub living_area: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overall_quality: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year_built: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub neighborhood: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recent_price_trend: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub property_tax: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub crime_rate: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub school_rating: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance_to_city: Option<f64>,
    /// Accepted on input but never trusted; the encoder derives it from `living_area`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price_per_sqft_flag: Option<i64>,
    /// Undeclared attributes
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

/// A record whose every field passed schema validation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyRecord {
    /// Above-grade living area in square feet
    pub living_area: f64,
    /// Overall material and finish quality, 1-10
    pub overall_quality: u8,
    pub year_built: i32,
    /// Neighborhood label; labels outside the known set are kept as-is
    pub neighborhood: String,
    /// Recent local price trend in percent
    pub recent_price_trend: f64,
    /// Annual property tax
    pub property_tax: f64,
    /// Crime rate index, 1-10
    pub crime_rate: f64,
    /// School rating, 1-10
    pub school_rating: u8,
    /// Distance to the city center in miles
    pub distance_to_city: f64,
}

impl PropertyRecord {
    /// The derived flag: 1 when the property has a positive living area, else 0
    pub fn price_per_sqft_flag(&self) -> u8 {
        if self.living_area > 0.0 {
            1
        } else {
            0
        }
    }

    /// Convert back to the raw representation (without a supplied flag)
    pub fn to_raw(&self) -> RawPropertyRecord {
        RawPropertyRecord {
            living_area: Some(self.living_area),
            overall_quality: Some(i64::from(self.overall_quality)),
            year_built: Some(i64::from(self.year_built)),
            neighborhood: Some(self.neighborhood.clone()),
            recent_price_trend: Some(self.recent_price_trend),
            property_tax: Some(self.property_tax),
            crime_rate: Some(self.crime_rate),
            school_rating: Some(i64::from(self.school_rating)),
            distance_to_city: Some(self.distance_to_city),
            price_per_sqft_flag: None,
            extra: BTreeMap::new(),
        }
    }
}

impl From<&PropertyRecord> for RawPropertyRecord {
    fn from(record: &PropertyRecord) -> Self {
        record.to_raw()
    }
}

/// A training observation: raw attributes plus the observed sale price
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabeledRecord {
    #[serde(flatten)]
    pub record: RawPropertyRecord,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sale_price: Option<f64>,
}

impl LabeledRecord {
    pub fn new(record: RawPropertyRecord, sale_price: f64) -> Self {
        Self {
            record,
            sale_price: Some(sale_price),
        }
    }
}
