//! Market scenarios
//!
//! Derives "what-if" records by shifting the recent price trend up or down,
//! so optimistic and pessimistic estimates come from the same artifact
//! without retraining.

use crate::error::{PredictorError, Result};
use crate::schema::{FeatureSchema, PropertyRecord};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which market trend to score a record under
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scenario {
    /// Record as given
    #[default]
    Baseline,
    /// Trend shifted up
    Optimistic,
    /// Trend shifted down
    Pessimistic,
}

impl Scenario {
    pub const ALL: [Scenario; 3] = [Scenario::Baseline, Scenario::Optimistic, Scenario::Pessimistic];

    pub fn as_str(&self) -> &'static str {
        match self {
            Scenario::Baseline => "baseline",
            Scenario::Optimistic => "optimistic",
            Scenario::Pessimistic => "pessimistic",
        }
    }
}

impl fmt::Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Scenario {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "baseline" | "base" => Ok(Scenario::Baseline),
            "optimistic" | "up" => Ok(Scenario::Optimistic),
            "pessimistic" | "down" => Ok(Scenario::Pessimistic),
            other => Err(format!(
                "unknown scenario '{}', expected baseline, optimistic or pessimistic",
                other
            )),
        }
    }
}

/// Shifts `recent_price_trend`, clamped to the schema's trend range
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScenarioAdjuster {
    shift: f64,
    min: f64,
    max: f64,
}

impl ScenarioAdjuster {
    /// Trend shift in percentage points
    pub const DEFAULT_SHIFT: f64 = 3.0;

    pub fn new(schema: &FeatureSchema) -> Self {
        let (min, max) = schema.trend_range();
        Self {
            shift: Self::DEFAULT_SHIFT,
            min,
            max,
        }
    }

    /// Adjuster with a custom shift (sign is ignored). NaN and infinities are rejected.
    pub fn with_shift(schema: &FeatureSchema, shift: f64) -> Result<Self> {
        if !shift.is_finite() {
            return Err(PredictorError::InvalidShift(shift));
        }
        Ok(Self {
            shift: shift.abs(),
            ..Self::new(schema)
        })
    }

    pub fn shift(&self) -> f64 {
        self.shift
    }

    /// Trend raised by the shift, capped at the upper bound
    pub fn optimistic(&self, record: &PropertyRecord) -> PropertyRecord {
        self.with_trend(record, record.recent_price_trend + self.shift)
    }

    /// Trend lowered by the shift, floored at the lower bound
    pub fn pessimistic(&self, record: &PropertyRecord) -> PropertyRecord {
        self.with_trend(record, record.recent_price_trend - self.shift)
    }

    pub fn baseline(&self, record: &PropertyRecord) -> PropertyRecord {
        record.clone()
    }

    pub fn apply(&self, scenario: Scenario, record: &PropertyRecord) -> PropertyRecord {
        match scenario {
            Scenario::Baseline => self.baseline(record),
            Scenario::Optimistic => self.optimistic(record),
            Scenario::Pessimistic => self.pessimistic(record),
        }
    }

    fn with_trend(&self, record: &PropertyRecord, trend: f64) -> PropertyRecord {
        PropertyRecord {
            recent_price_trend: trend.clamp(self.min, self.max),
            ..record.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(trend: f64) -> PropertyRecord {
        PropertyRecord {
            living_area: 1500.0,
            overall_quality: 8,
            year_built: 2005,
            neighborhood: "CollgCr".to_string(),
            recent_price_trend: trend,
            property_tax: 2500.0,
            crime_rate: 5.0,
            school_rating: 7,
            distance_to_city: 5.0,
        }
    }

    fn adjuster() -> ScenarioAdjuster {
        ScenarioAdjuster::new(&FeatureSchema::with_current_year(2025))
    }

    #[test]
    fn test_optimistic_is_clamped() {
        let adjusted = adjuster().optimistic(&record(4.0));
        assert_eq!(adjusted.recent_price_trend, 5.0);
    }

    #[test]
    fn test_pessimistic_is_clamped() {
        let adjusted = adjuster().pessimistic(&record(-4.0));
        assert_eq!(adjusted.recent_price_trend, -5.0);
    }

    #[test]
    fn test_shift_inside_range() {
        let adj = adjuster();
        assert_eq!(adj.optimistic(&record(0.0)).recent_price_trend, 3.0);
        assert_eq!(adj.pessimistic(&record(1.5)).recent_price_trend, -1.5);
    }

    #[test]
    fn test_baseline_is_identity() {
        let base = record(2.2);
        assert_eq!(adjuster().baseline(&base), base);
        assert_eq!(adjuster().apply(Scenario::Baseline, &base), base);
    }

    #[test]
    fn test_other_fields_unchanged() {
        let base = record(1.0);
        let adjusted = adjuster().optimistic(&base);
        assert_eq!(
            PropertyRecord {
                recent_price_trend: base.recent_price_trend,
                ..adjusted
            },
            base
        );
    }

    #[test]
    fn test_trend_stays_in_range_for_any_input() {
        let adj = adjuster();
        let mut trend = -9.0;
        while trend <= 9.0 {
            for scenario in [Scenario::Optimistic, Scenario::Pessimistic] {
                let t = adj.apply(scenario, &record(trend)).recent_price_trend;
                assert!((-5.0..=5.0).contains(&t), "{} gave {} for {}", scenario, t, trend);
            }
            trend += 0.25;
        }
    }

    #[test]
    fn test_non_finite_shift_rejected() {
        let schema = FeatureSchema::with_current_year(2025);
        for shift in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            assert!(matches!(
                ScenarioAdjuster::with_shift(&schema, shift),
                Err(PredictorError::InvalidShift(_))
            ));
        }

        let adj = ScenarioAdjuster::with_shift(&schema, -1.0e9).unwrap();
        assert_eq!(adj.shift(), 1.0e9);
        assert_eq!(adj.optimistic(&record(0.0)).recent_price_trend, 5.0);
        assert_eq!(adj.pessimistic(&record(0.0)).recent_price_trend, -5.0);
    }

    #[test]
    fn test_scenario_parsing() {
        assert_eq!("Optimistic".parse::<Scenario>().unwrap(), Scenario::Optimistic);
        assert_eq!("down".parse::<Scenario>().unwrap(), Scenario::Pessimistic);
        assert!("sideways".parse::<Scenario>().is_err());
        assert_eq!(Scenario::default(), Scenario::Baseline);
    }
}
