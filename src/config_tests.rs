//! Tests for configuration

#[cfg(test)]
mod tests {
    use super::super::config::*;
    use crate::schema::FeatureSchema;

    #[test]
    fn test_config_defaults_from_empty_toml() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.artifact.path, "house_price_predictor.json");
        assert_eq!(config.training.n_estimators, 100);
        assert_eq!(config.training.max_depth, None);
        assert_eq!(config.training.min_samples_split, 2);
        assert_eq!(config.training.min_samples_leaf, 1);
        assert!(config.training.bootstrap);
        assert_eq!(config.training.seed, 42);
        assert_eq!(config.data.samples, 500);
        assert_eq!(config.data.seed, 42);
        assert!(config.data.train_file.is_none());
        assert_eq!(config.scenario.trend_shift, 3.0);
    }

    #[test]
    fn test_training_config_partial() {
        let toml_str = r#"
n_estimators = 25
max_depth = 8
"#;
        let config: TrainingConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.n_estimators, 25);
        assert_eq!(config.max_depth, Some(8));
        assert_eq!(config.min_samples_leaf, 1);

        let params = config.forest_params();
        assert_eq!(params.n_estimators, 25);
        assert_eq!(params.tree.max_depth, Some(8));
        assert_eq!(params.seed, 42);
    }

    #[test]
    fn test_full_config_sections() {
        let toml_str = r#"
[artifact]
path = "models/house.json"

[training]
seed = 7
bootstrap = false

[data]
samples = 50
train_file = "data/train.jsonl"

[scenario]
trend_shift = 1.5
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.artifact.resolved_path(), std::path::PathBuf::from("models/house.json"));
        assert_eq!(config.training.seed, 7);
        assert!(!config.training.bootstrap);
        assert_eq!(config.data.samples, 50);
        assert_eq!(
            config.data.resolved_train_file(),
            Some(std::path::PathBuf::from("data/train.jsonl"))
        );
        assert_eq!(config.scenario.trend_shift, 1.5);
    }

    #[test]
    fn test_scenario_config_adjuster() {
        let config = ScenarioConfig { trend_shift: -2.0 };
        let adjuster = config.adjuster(&FeatureSchema::with_current_year(2025)).unwrap();
        assert_eq!(adjuster.shift(), 2.0);

        let nan = ScenarioConfig { trend_shift: f64::NAN };
        assert!(nan.adjuster(&FeatureSchema::with_current_year(2025)).is_err());
    }

    #[test]
    fn test_load_rejects_non_finite_shift() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[scenario]\ntrend_shift = nan\n").unwrap();

        let result = Config::load(path.to_str().unwrap());
        assert!(matches!(result, Err(crate::error::PredictorError::InvalidShift(_))));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[training]\nn_estimators = 12\n").unwrap();

        let config = Config::load(path.to_str().unwrap()).unwrap();
        assert_eq!(config.training.n_estimators, 12);
        assert_eq!(config.data.samples, 500);
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");

        let config = Config::load(path.to_str().unwrap()).unwrap();
        assert_eq!(config.artifact.path, "house_price_predictor.json");
    }
}
