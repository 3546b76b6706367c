use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::alignment::domain::span_match::{AlignParams, EditCosts};
use crate::shared::constants::{
    DEFAULT_COST_DELETION, DEFAULT_COST_INSERTION, DEFAULT_COST_SUBSTITUTION,
    DEFAULT_MAX_EDIT_DISTANCE, DEFAULT_PRIOR_WEIGHT,
};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("config {path} is not valid JSON: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("{field} must be {expected}, got {value}")]
    InvalidValue {
        field: &'static str,
        expected: &'static str,
        value: f64,
    },
}

/// Tunable scoring parameters, loadable from a JSON file. Missing fields take
/// their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlignConfig {
    pub cost_substitution: f64,
    pub cost_insertion: f64,
    pub cost_deletion: f64,
    pub prior_weight: f64,
    pub max_edit_distance: f64,
}

impl Default for AlignConfig {
    fn default() -> Self {
        Self {
            cost_substitution: DEFAULT_COST_SUBSTITUTION,
            cost_insertion: DEFAULT_COST_INSERTION,
            cost_deletion: DEFAULT_COST_DELETION,
            prior_weight: DEFAULT_PRIOR_WEIGHT,
            max_edit_distance: DEFAULT_MAX_EDIT_DISTANCE,
        }
    }
}

impl AlignConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let json = fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.to_path_buf(),
            source: e,
        })?;
        let config: Self = serde_json::from_str(&json).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            source: e,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let non_negative = [
            ("cost_substitution", self.cost_substitution),
            ("cost_insertion", self.cost_insertion),
            ("cost_deletion", self.cost_deletion),
            ("prior_weight", self.prior_weight),
        ];
        for (field, value) in non_negative {
            if !(value.is_finite() && value >= 0.0) {
                return Err(ConfigError::InvalidValue {
                    field,
                    expected: "a non-negative number",
                    value,
                });
            }
        }
        if !(0.0..=1.0).contains(&self.max_edit_distance) {
            return Err(ConfigError::InvalidValue {
                field: "max_edit_distance",
                expected: "between 0.0 and 1.0",
                value: self.max_edit_distance,
            });
        }
        Ok(())
    }

    pub fn edit_costs(&self) -> EditCosts {
        EditCosts {
            substitution: self.cost_substitution,
            deletion: self.cost_deletion,
            insertion: self.cost_insertion,
        }
    }

    pub fn params(&self, expected_word: usize) -> AlignParams {
        AlignParams {
            expected_word,
            prior_weight: self.prior_weight,
            costs: self.edit_costs(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::rstest;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let c = AlignConfig::default();
        assert_relative_eq!(c.cost_substitution, 1.0);
        assert_relative_eq!(c.cost_insertion, 1.0);
        assert_relative_eq!(c.cost_deletion, 0.8);
        assert_relative_eq!(c.prior_weight, 0.005);
        assert_relative_eq!(c.max_edit_distance, 0.25);
        assert!(c.validate().is_ok());
    }

    #[test]
    fn test_params_carry_costs() {
        let p = AlignConfig::default().params(12);
        assert_eq!(p.expected_word, 12);
        assert_relative_eq!(p.costs.deletion, 0.8);
        assert_relative_eq!(p.costs.insertion, 1.0);
    }

    #[rstest]
    #[case::negative_cost(
        AlignConfig { cost_deletion: -0.1, ..AlignConfig::default() },
        "cost_deletion"
    )]
    #[case::nan_cost(
        AlignConfig { cost_substitution: f64::NAN, ..AlignConfig::default() },
        "cost_substitution"
    )]
    #[case::negative_prior(
        AlignConfig { prior_weight: -1.0, ..AlignConfig::default() },
        "prior_weight"
    )]
    #[case::threshold_above_one(
        AlignConfig { max_edit_distance: 1.5, ..AlignConfig::default() },
        "max_edit_distance"
    )]
    fn test_validate_rejects(#[case] config: AlignConfig, #[case] expected_field: &str) {
        match config.validate() {
            Err(ConfigError::InvalidValue { field, .. }) => assert_eq!(field, expected_field),
            other => panic!("expected invalid value, got {other:?}"),
        }
    }

    #[test]
    fn test_load_partial_file_uses_defaults() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("align.json");
        fs::write(&path, r#"{"prior_weight": 0.01}"#).unwrap();
        let c = AlignConfig::load(&path).unwrap();
        assert_relative_eq!(c.prior_weight, 0.01);
        assert_relative_eq!(c.cost_deletion, 0.8);
    }

    #[test]
    fn test_load_missing_file_is_error() {
        let tmp = TempDir::new().unwrap();
        assert!(matches!(
            AlignConfig::load(&tmp.path().join("missing.json")),
            Err(ConfigError::Read { .. })
        ));
    }

    #[test]
    fn test_load_invalid_json_is_error() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("align.json");
        fs::write(&path, "{prior_weight").unwrap();
        assert!(matches!(
            AlignConfig::load(&path),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn test_load_validates() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("align.json");
        fs::write(&path, r#"{"cost_insertion": -2}"#).unwrap();
        assert!(matches!(
            AlignConfig::load(&path),
            Err(ConfigError::InvalidValue { field: "cost_insertion", .. })
        ));
    }
}
