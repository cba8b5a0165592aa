//! Tests for the feature schema

#[cfg(test)]
mod tests {
    use super::super::*;
    use crate::error::FieldError;

    fn schema() -> FeatureSchema {
        FeatureSchema::with_current_year(2025)
    }

    fn raw() -> RawPropertyRecord {
        RawPropertyRecord {
            living_area: Some(1500.0),
            overall_quality: Some(8),
            year_built: Some(2005),
            neighborhood: Some("CollgCr".to_string()),
            recent_price_trend: Some(0.0),
            property_tax: Some(2500.0),
            crime_rate: Some(5.0),
            school_rating: Some(7),
            distance_to_city: Some(5.0),
            ..Default::default()
        }
    }

    #[test]
    fn test_validate_complete_record() {
        let record = schema().validate(&raw()).unwrap();
        assert_eq!(record.living_area, 1500.0);
        assert_eq!(record.overall_quality, 8);
        assert_eq!(record.year_built, 2005);
        assert_eq!(record.neighborhood, "CollgCr");
        assert_eq!(record.school_rating, 7);
        assert_eq!(record.price_per_sqft_flag(), 1);
    }

    #[test]
    fn test_missing_field() {
        let input = RawPropertyRecord {
            school_rating: None,
            ..raw()
        };
        assert_eq!(
            schema().validate(&input),
            Err(FieldError::Missing(fields::SCHOOL_RATING))
        );
    }

    #[test]
    fn test_missing_neighborhood() {
        let input = RawPropertyRecord {
            neighborhood: None,
            ..raw()
        };
        assert_eq!(
            schema().validate(&input),
            Err(FieldError::Missing(fields::NEIGHBORHOOD))
        );
    }

    #[test]
    fn test_quality_out_of_domain() {
        let input = RawPropertyRecord {
            overall_quality: Some(11),
            ..raw()
        };
        match schema().validate(&input) {
            Err(FieldError::OutOfDomain { field, value, .. }) => {
                assert_eq!(field, fields::OVERALL_QUALITY);
                assert_eq!(value, 11.0);
            }
            other => panic!("Expected OutOfDomain, got {:?}", other),
        }
    }

    #[test]
    fn test_non_positive_living_area_rejected() {
        for area in [0.0, -10.0] {
            let input = RawPropertyRecord {
                living_area: Some(area),
                ..raw()
            };
            assert!(matches!(
                schema().validate(&input),
                Err(FieldError::OutOfDomain { field: fields::LIVING_AREA, .. })
            ));
        }
    }

    #[test]
    fn test_year_bounds_follow_current_year() {
        let future = RawPropertyRecord {
            year_built: Some(2026),
            ..raw()
        };
        assert!(schema().validate(&future).is_err());
        assert!(FeatureSchema::with_current_year(2026).validate(&future).is_ok());

        let ancient = RawPropertyRecord {
            year_built: Some(1899),
            ..raw()
        };
        assert!(schema().validate(&ancient).is_err());
    }

    #[test]
    fn test_trend_bounds_inclusive() {
        for trend in [-5.0, 5.0] {
            let input = RawPropertyRecord {
                recent_price_trend: Some(trend),
                ..raw()
            };
            assert!(schema().validate(&input).is_ok());
        }
        let input = RawPropertyRecord {
            recent_price_trend: Some(5.01),
            ..raw()
        };
        assert!(schema().validate(&input).is_err());
    }

    #[test]
    fn test_nan_rejected() {
        let input = RawPropertyRecord {
            crime_rate: Some(f64::NAN),
            ..raw()
        };
        assert_eq!(
            schema().validate(&input),
            Err(FieldError::NotFinite(fields::CRIME_RATE))
        );
    }

    #[test]
    fn test_unknown_neighborhood_passes_validation() {
        let input = RawPropertyRecord {
            neighborhood: Some("Atlantis".to_string()),
            ..raw()
        };
        let record = schema().validate(&input).unwrap();
        assert_eq!(record.neighborhood, "Atlantis");
        assert!(!schema().is_known_neighborhood("Atlantis"));
        assert!(schema().is_known_neighborhood("NoRidge"));
    }

    #[test]
    fn test_supplied_flag_is_ignored() {
        let input = RawPropertyRecord {
            price_per_sqft_flag: Some(0),
            ..raw()
        };
        let record = schema().validate(&input).unwrap();
        assert_eq!(record.price_per_sqft_flag(), 1);
    }

    #[test]
    fn test_unexpected_field_from_json() {
        let json = r#"{
            "living_area": 1500.0, "overall_quality": 8, "year_built": 2005,
            "neighborhood": "CollgCr", "recent_price_trend": 0.0,
            "property_tax": 2500.0, "crime_rate": 5.0, "school_rating": 7,
            "distance_to_city": 5.0, "garage_cars": 2
        }"#;
        let input: RawPropertyRecord = serde_json::from_str(json).unwrap();
        assert_eq!(
            schema().validate(&input),
            Err(FieldError::Unexpected("garage_cars".to_string()))
        );
    }

    #[test]
    fn test_missing_field_from_json() {
        let input: RawPropertyRecord = serde_json::from_str(r#"{"living_area": 1500.0}"#).unwrap();
        assert_eq!(
            schema().validate(&input),
            Err(FieldError::Missing(fields::OVERALL_QUALITY))
        );
    }

    #[test]
    fn test_clamp_integers() {
        let input = RawPropertyRecord {
            overall_quality: Some(14),
            year_built: Some(1850),
            school_rating: Some(0),
            ..raw()
        };
        let clamped = schema().clamp_integers(&input);
        assert_eq!(clamped.overall_quality, Some(10));
        assert_eq!(clamped.year_built, Some(1900));
        assert_eq!(clamped.school_rating, Some(1));
        assert_eq!(clamped.living_area, input.living_area);
        assert!(schema().validate(&clamped).is_ok());
    }

    #[test]
    fn test_numeric_fields_order() {
        let names: Vec<&str> = schema().numeric_fields().map(|f| f.name).collect();
        assert_eq!(
            names,
            vec![
                fields::LIVING_AREA,
                fields::OVERALL_QUALITY,
                fields::YEAR_BUILT,
                fields::RECENT_PRICE_TREND,
                fields::PROPERTY_TAX,
                fields::CRIME_RATE,
                fields::SCHOOL_RATING,
                fields::DISTANCE_TO_CITY,
                fields::PRICE_PER_SQFT_FLAG,
            ]
        );
    }

    #[test]
    fn test_record_round_trips_through_raw() {
        let record = schema().validate(&raw()).unwrap();
        assert_eq!(schema().validate(&record.to_raw()).unwrap(), record);
    }
}
