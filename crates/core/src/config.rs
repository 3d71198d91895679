//! Analysis configuration files
//!
//! An analysis is a theoretical volume, the factor tuple to apply and the
//! scenarios to compare against. Files are JSON:
//!
//! ```json
//! {
//!   "theoretical_volume": 1000000.0,
//!   "unit": "tonnes_per_year",
//!   "factors": { "fc": 0.85, "fcp": 0.30, "fs": 0.85, "fl": 0.80 },
//!   "scenarios": []
//! }
//! ```
//!
//! `unit`, `factors` and `scenarios` are optional; they default to tonnes,
//! the realistic preset and the four built-in scenarios.

use crate::core_types::units::{Volume, VolumeUnit};
use crate::error::ConfigError;
use crate::factors::CorrectionFactors;
use crate::scenario::Scenario;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::info;

/// Inputs of one FDE analysis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Theoretical annual production
    pub theoretical_volume: f64,
    /// Unit of `theoretical_volume`
    #[serde(default)]
    pub unit: VolumeUnit,
    /// Factor tuple for the cascade and flow views
    #[serde(default)]
    pub factors: CorrectionFactors,
    /// Scenarios for the comparison view
    #[serde(default = "Scenario::builtin")]
    pub scenarios: Vec<Scenario>,
}

impl AnalysisConfig {
    /// Config with realistic factors and built-in scenarios
    pub fn new(theoretical: Volume) -> Self {
        Self {
            theoretical_volume: theoretical.amount(),
            unit: theoretical.unit(),
            factors: CorrectionFactors::default(),
            scenarios: Scenario::builtin(),
        }
    }

    /// Theoretical volume with its unit
    pub fn theoretical(&self) -> Volume {
        Volume::new(self.theoretical_volume, self.unit)
    }

    /// Parse from a JSON string
    ///
    /// # Errors
    /// Returns [`ConfigError::ParseFailed`] if the JSON does not match the schema
    pub fn from_json_str(contents: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(contents).map_err(|e| ConfigError::ParseFailed(e.to_string()))
    }

    /// Load from file
    ///
    /// # Errors
    /// Returns error if file cannot be read or parsed
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents =
            fs::read_to_string(path).map_err(|e| ConfigError::LoadFailed(e.to_string()))?;
        let config = Self::from_json_str(&contents)?;
        info!(
            path = %path.display(),
            scenarios = config.scenarios.len(),
            "loaded analysis config"
        );
        Ok(config)
    }

    /// Save to file
    ///
    /// # Errors
    /// Returns error if file cannot be written or config cannot be serialized
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let contents = serde_json::to_string_pretty(self)
            .map_err(|e| ConfigError::SerializeFailed(e.to_string()))?;

        fs::write(path, contents).map_err(|e| ConfigError::SaveFailed(e.to_string()))?;

        Ok(())
    }

    /// Check the main factor tuple and every scenario's factors
    ///
    /// # Errors
    /// Returns [`ConfigError::InvalidFactors`] naming the first invalid source
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.factors
            .validate()
            .map_err(|error| ConfigError::InvalidFactors {
                source_name: "factors".to_string(),
                error,
            })?;
        for scenario in &self.scenarios {
            scenario
                .factors
                .validate()
                .map_err(|error| ConfigError::InvalidFactors {
                    source_name: scenario.id.clone(),
                    error,
                })?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::factors::Factor;

    #[test]
    fn test_minimal_json_uses_defaults() {
        let config = AnalysisConfig::from_json_str(r#"{ "theoretical_volume": 5000.0 }"#)
            .expect("valid json");
        assert_eq!(config.unit, VolumeUnit::TonnesPerYear);
        assert_eq!(config.factors, CorrectionFactors::REALISTIC);
        assert_eq!(config.scenarios, Scenario::builtin());
        assert_eq!(config.theoretical(), Volume::tonnes_per_year(5000.0));
    }

    #[test]
    fn test_full_json() {
        let json = r##"{
            "theoretical_volume": 120000.0,
            "unit": "cubic_meters_per_year",
            "factors": { "fc": 0.9, "fcp": 0.1, "fs": 0.8, "fl": 0.7 },
            "scenarios": [{
                "id": "vinasse",
                "name": "Vinasse",
                "description": "Mill effluent",
                "factors": { "fc": 0.95, "fcp": 0.6, "fs": 0.7, "fl": 0.9 },
                "color": "#123456"
            }]
        }"##;
        let config = AnalysisConfig::from_json_str(json).expect("valid json");
        assert_eq!(config.unit, VolumeUnit::CubicMetersPerYear);
        assert_eq!(config.scenarios.len(), 1);
        assert_eq!(config.scenarios[0].id, "vinasse");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_json() {
        let err = AnalysisConfig::from_json_str("{ not json").unwrap_err();
        assert!(matches!(err, ConfigError::ParseFailed(_)));
    }

    #[test]
    fn test_validate_names_scenario() {
        let mut config = AnalysisConfig::new(Volume::tonnes_per_year(1.0));
        config.scenarios[2].factors = config.scenarios[2].factors.with(Factor::Logistics, 0.2);
        match config.validate() {
            Err(ConfigError::InvalidFactors { source_name, error }) => {
                assert_eq!(source_name, "conservative");
                assert_eq!(error.factor(), Factor::Logistics);
            }
            other => panic!("expected invalid factors, got {other:?}"),
        }
    }

    #[test]
    fn test_validate_main_factors_first() {
        let mut config = AnalysisConfig::new(Volume::tonnes_per_year(1.0));
        config.factors.fc = 2.0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidFactors { ref source_name, .. }) if source_name == "factors"
        ));
    }

    #[test]
    fn test_load_missing_file() {
        let err = AnalysisConfig::load("/nonexistent/analysis.json").unwrap_err();
        assert!(matches!(err, ConfigError::LoadFailed(_)));
    }
}
