//! Feature schema
//!
//! Declares the fixed attribute set of a property, the kind of each attribute
//! and its valid domain, and validates raw records against it.
//!
//! The declaration order of the numeric and derived fields here is the column
//! order the encoder fixes at training time.

mod record;
#[cfg(test)]
mod tests;

pub use record::{LabeledRecord, PropertyRecord, RawPropertyRecord};

use crate::error::FieldError;
use chrono::{Datelike, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Field names as they appear in raw records and feature names
pub mod fields {
    pub const LIVING_AREA: &str = "living_area";
    pub const OVERALL_QUALITY: &str = "overall_quality";
    pub const YEAR_BUILT: &str = "year_built";
    pub const NEIGHBORHOOD: &str = "neighborhood";
    pub const RECENT_PRICE_TREND: &str = "recent_price_trend";
    pub const PROPERTY_TAX: &str = "property_tax";
    pub const CRIME_RATE: &str = "crime_rate";
    pub const SCHOOL_RATING: &str = "school_rating";
    pub const DISTANCE_TO_CITY: &str = "distance_to_city";
    pub const PRICE_PER_SQFT_FLAG: &str = "price_per_sqft_flag";
    pub const SALE_PRICE: &str = "sale_price";
}

/// The neighborhood labels the system knows about
pub const KNOWN_NEIGHBORHOODS: [&str; 12] = [
    "CollgCr", "Veenker", "Crawfor", "NoRidge", "Mitchel", "Somerst",
    "NWAmes", "OldTown", "BrkSide", "Sawyer", "NridgHt", "NAmes",
];

/// Bounds of `recent_price_trend`, in percent
pub const TREND_MIN: f64 = -5.0;
pub const TREND_MAX: f64 = 5.0;

/// Earliest accepted construction year
pub const MIN_YEAR_BUILT: i32 = 1900;

/// Attribute kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Continuous,
    Integer,
    Categorical,
    /// Computed from other fields, never taken from input
    Derived,
}

/// Valid domain of an attribute
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Domain {
    /// Strictly greater than zero
    Positive,
    /// Zero or greater
    NonNegative,
    /// Inclusive range
    Range { min: f64, max: f64 },
    /// Any label; labels outside the known set are treated as unknown downstream
    Labels,
    /// Derived value, not validated
    Computed,
}

impl Domain {
    pub fn contains(&self, value: f64) -> bool {
        match *self {
            Domain::Positive => value > 0.0,
            Domain::NonNegative => value >= 0.0,
            Domain::Range { min, max } => value >= min && value <= max,
            Domain::Labels | Domain::Computed => true,
        }
    }

    /// Clamp a value into the domain (ranges and lower bounds only)
    pub fn clamp(&self, value: f64) -> f64 {
        match *self {
            Domain::Range { min, max } => value.clamp(min, max),
            Domain::NonNegative => value.max(0.0),
            _ => value,
        }
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Domain::Positive => write!(f, "(0, inf)"),
            Domain::NonNegative => write!(f, "[0, inf)"),
            Domain::Range { min, max } => write!(f, "[{}, {}]", min, max),
            Domain::Labels => write!(f, "any label"),
            Domain::Computed => write!(f, "derived"),
        }
    }
}

/// Declaration of one attribute
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
    pub domain: Domain,
}

impl FieldSpec {
    /// Check a numeric value against this field's domain
    pub fn check(&self, value: f64) -> Result<f64, FieldError> {
        if !value.is_finite() {
            return Err(FieldError::NotFinite(self.name));
        }
        if !self.domain.contains(value) {
            return Err(FieldError::OutOfDomain {
                field: self.name,
                value,
                domain: self.domain.to_string(),
            });
        }
        Ok(value)
    }
}

/// The fixed attribute set of a property record
#[derive(Debug, Clone)]
pub struct FeatureSchema {
    current_year: i32,
    fields: Vec<FieldSpec>,
}

impl Default for FeatureSchema {
    fn default() -> Self {
        Self::new()
    }
}

impl FeatureSchema {
    /// Schema whose `year_built` upper bound is the current calendar year
    pub fn new() -> Self {
        Self::with_current_year(Utc::now().year())
    }

    /// Schema with a fixed upper bound for `year_built`
    pub fn with_current_year(current_year: i32) -> Self {
        use fields::*;

        let fields = vec![
            FieldSpec { name: LIVING_AREA, kind: FieldKind::Continuous, domain: Domain::Positive },
            FieldSpec {
                name: OVERALL_QUALITY,
                kind: FieldKind::Integer,
                domain: Domain::Range { min: 1.0, max: 10.0 },
            },
            FieldSpec {
                name: YEAR_BUILT,
                kind: FieldKind::Integer,
                domain: Domain::Range { min: f64::from(MIN_YEAR_BUILT), max: f64::from(current_year) },
            },
            FieldSpec { name: NEIGHBORHOOD, kind: FieldKind::Categorical, domain: Domain::Labels },
            FieldSpec {
                name: RECENT_PRICE_TREND,
                kind: FieldKind::Continuous,
                domain: Domain::Range { min: TREND_MIN, max: TREND_MAX },
            },
            FieldSpec { name: PROPERTY_TAX, kind: FieldKind::Continuous, domain: Domain::NonNegative },
            FieldSpec {
                name: CRIME_RATE,
                kind: FieldKind::Continuous,
                domain: Domain::Range { min: 1.0, max: 10.0 },
            },
            FieldSpec {
                name: SCHOOL_RATING,
                kind: FieldKind::Integer,
                domain: Domain::Range { min: 1.0, max: 10.0 },
            },
            FieldSpec { name: DISTANCE_TO_CITY, kind: FieldKind::Continuous, domain: Domain::NonNegative },
            FieldSpec { name: PRICE_PER_SQFT_FLAG, kind: FieldKind::Derived, domain: Domain::Computed },
        ];

        Self { current_year, fields }
    }

    pub fn current_year(&self) -> i32 {
        self.current_year
    }

    /// All fields in declaration order
    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Numeric, integer and derived fields in declaration order
    pub fn numeric_fields(&self) -> impl Iterator<Item = &FieldSpec> {
        self.fields.iter().filter(|f| f.kind != FieldKind::Categorical)
    }

    /// Inclusive bounds of the price trend
    pub fn trend_range(&self) -> (f64, f64) {
        match self.field(fields::RECENT_PRICE_TREND).map(|f| f.domain) {
            Some(Domain::Range { min, max }) => (min, max),
            _ => (TREND_MIN, TREND_MAX),
        }
    }

    pub fn is_known_neighborhood(&self, label: &str) -> bool {
        KNOWN_NEIGHBORHOODS.contains(&label)
    }

    fn numeric(&self, name: &'static str, value: Option<f64>) -> Result<f64, FieldError> {
        let value = value.ok_or(FieldError::Missing(name))?;
        match self.field(name) {
            Some(field) => field.check(value),
            None => Ok(value),
        }
    }

    fn integer(&self, name: &'static str, value: Option<i64>) -> Result<i64, FieldError> {
        let value = value.ok_or(FieldError::Missing(name))?;
        // i64 -> f64 is exact for every value that can pass the domain check
        if let Some(field) = self.field(name) {
            field.check(value as f64)?;
        }
        Ok(value)
    }

    /// Validate a raw record, producing a fully typed record.
    ///
    /// Values outside a field's domain are rejected, not clamped. A supplied
    /// `price_per_sqft_flag` is ignored. Unknown neighborhood labels pass.
    pub fn validate(&self, raw: &RawPropertyRecord) -> Result<PropertyRecord, FieldError> {
        use fields::*;

        if let Some(name) = raw.extra.keys().next() {
            return Err(FieldError::Unexpected(name.clone()));
        }

        let living_area = self.numeric(LIVING_AREA, raw.living_area)?;
        let overall_quality = self.integer(OVERALL_QUALITY, raw.overall_quality)?;
        let year_built = self.integer(YEAR_BUILT, raw.year_built)?;
        let neighborhood = raw
            .neighborhood
            .clone()
            .ok_or(FieldError::Missing(NEIGHBORHOOD))?;
        let recent_price_trend = self.numeric(RECENT_PRICE_TREND, raw.recent_price_trend)?;
        let property_tax = self.numeric(PROPERTY_TAX, raw.property_tax)?;
        let crime_rate = self.numeric(CRIME_RATE, raw.crime_rate)?;
        let school_rating = self.integer(SCHOOL_RATING, raw.school_rating)?;
        let distance_to_city = self.numeric(DISTANCE_TO_CITY, raw.distance_to_city)?;

        Ok(PropertyRecord {
            living_area,
            overall_quality: overall_quality as u8,
            year_built: year_built as i32,
            neighborhood,
            recent_price_trend,
            property_tax,
            crime_rate,
            school_rating: school_rating as u8,
            distance_to_city,
        })
    }

    /// Clamp the integer fields (quality, rating, year) of a raw record to
    /// their bounds. Continuous fields are left for the input layer to bound.
    pub fn clamp_integers(&self, raw: &RawPropertyRecord) -> RawPropertyRecord {
        use fields::*;

        let clamp = |name: &'static str, value: Option<i64>| {
            value.map(|v| match self.field(name) {
                Some(field) => field.domain.clamp(v as f64) as i64,
                None => v,
            })
        };

        RawPropertyRecord {
            overall_quality: clamp(OVERALL_QUALITY, raw.overall_quality),
            year_built: clamp(YEAR_BUILT, raw.year_built),
            school_rating: clamp(SCHOOL_RATING, raw.school_rating),
            ..raw.clone()
        }
    }
}
