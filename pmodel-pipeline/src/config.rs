//! Batch run configuration
//!
//! Dataset conventions (base year of the archive time axis, the temperature
//! fill value, the month length used for annual totals) are configuration
//! rather than model logic. All fields have defaults, so a configuration file
//! only needs to list what it changes:
//!
//! ```toml
//! first_year = 2000
//! last_year = 2010
//!
//! [model]
//! closure = "smith19"
//! ```

use crate::errors::{PipelineError, PipelineResult};
use pmodel_core::broadcast::FloatValue;
use pmodel_core::model::{PModel, PModelSettings};
use pmodel_core::parameters::{PModelParameters, DEFAULT_MONTH_LENGTH_DAYS};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// First year of the archive time axis
pub const DEFAULT_BASE_YEAR: i32 = 1901;

/// Temperatures at or below this value (°C) are fill values
pub const DEFAULT_TEMPERATURE_SENTINEL: FloatValue = -25.0;

/// Conversion from daily shortwave radiation (kJ m⁻² day⁻¹) to PPFD (mol m⁻² day⁻¹)
pub const DEFAULT_PPFD_PER_SHORTWAVE: FloatValue = 2.04e-3;

/// Settings for a batch run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// First simulated year
    /// default: 1982
    pub first_year: i32,

    /// Last simulated year, inclusive
    /// default: 2016
    pub last_year: i32,

    /// Year of time index 0 in the archive
    /// default: 1901
    pub base_year: i32,

    /// Temperatures at or below this value are replaced by NaN
    /// unit: °C
    /// default: -25.0
    pub temperature_sentinel: FloatValue,

    /// Days per month used to turn monthly mean daily GPP into annual totals
    /// unit: days
    /// default: 30.0
    pub month_length_days: FloatValue,

    /// Conversion factor from shortwave radiation to PPFD
    /// unit: mol / kJ
    /// default: 2.04e-3
    pub ppfd_per_shortwave: FloatValue,

    /// Apply the empirical soil moisture stress
    /// default: true
    pub soil_moisture_stress: bool,

    /// Simulate years in parallel
    /// default: true
    pub parallel: bool,

    /// Quantum yield and closure selection
    pub model: PModelSettings,

    /// Model constants
    pub parameters: PModelParameters,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            first_year: 1982,
            last_year: 2016,
            base_year: DEFAULT_BASE_YEAR,
            temperature_sentinel: DEFAULT_TEMPERATURE_SENTINEL,
            month_length_days: DEFAULT_MONTH_LENGTH_DAYS,
            ppfd_per_shortwave: DEFAULT_PPFD_PER_SHORTWAVE,
            soil_moisture_stress: true,
            parallel: true,
            model: PModelSettings::default(),
            parameters: PModelParameters::default(),
        }
    }
}

impl PipelineConfig {
    /// Parse and validate a TOML configuration
    pub fn from_toml_str(content: &str) -> PipelineResult<Self> {
        let config: PipelineConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML configuration file
    pub fn from_file(path: impl AsRef<Path>) -> PipelineResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn to_toml_string(&self) -> PipelineResult<String> {
        Ok(toml::to_string(self)?)
    }

    /// Years covered by the run
    pub fn years(&self) -> std::ops::RangeInclusive<i32> {
        self.first_year..=self.last_year
    }

    /// Check the configuration for values the run cannot use
    pub fn validate(&self) -> PipelineResult<()> {
        if self.first_year > self.last_year {
            return Err(PipelineError::InvalidConfig(format!(
                "first_year ({}) is after last_year ({})",
                self.first_year, self.last_year
            )));
        }
        if self.first_year < self.base_year {
            return Err(PipelineError::InvalidConfig(format!(
                "first_year ({}) is before the archive base year ({})",
                self.first_year, self.base_year
            )));
        }
        if !(self.month_length_days.is_finite() && self.month_length_days > 0.0) {
            return Err(PipelineError::InvalidConfig(format!(
                "month_length_days must be positive, got {}",
                self.month_length_days
            )));
        }
        if !(self.ppfd_per_shortwave.is_finite() && self.ppfd_per_shortwave > 0.0) {
            return Err(PipelineError::InvalidConfig(format!(
                "ppfd_per_shortwave must be positive, got {}",
                self.ppfd_per_shortwave
            )));
        }
        self.build_model().map(|_| ())
    }

    /// Build the configured P-model
    pub fn build_model(&self) -> PipelineResult<PModel> {
        PModel::from_parameters(self.parameters.clone(), self.model.clone())
            .map_err(|e| PipelineError::InvalidConfig(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pmodel_core::pathway::ClosureMethod;

    #[test]
    fn test_defaults() {
        let config = PipelineConfig::default();
        assert_eq!(config.years(), 1982..=2016);
        assert_eq!(config.base_year, 1901);
        assert_eq!(config.temperature_sentinel, -25.0);
        assert_eq!(config.month_length_days, 30.0);
        assert_eq!(config.model.closure, ClosureMethod::Wang17);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml() {
        let config = PipelineConfig::from_toml_str(
            r#"
first_year = 2000
last_year = 2002
parallel = false

[model]
closure = "smith19"
do_ftemp_kphio = false

[parameters]
soilm_b = 0.7
"#,
        )
        .unwrap();
        assert_eq!(config.years(), 2000..=2002);
        assert!(!config.parallel);
        assert_eq!(config.model.closure, ClosureMethod::Smith19);
        assert!(!config.model.do_ftemp_kphio);
        assert_eq!(config.parameters.soilm_b, 0.7);
        assert_eq!(config.parameters.unit_cost_ratio, 146.0);
    }

    #[test]
    fn test_toml_round_trip() {
        let mut config = PipelineConfig::default();
        config.model.kphio = Some(0.07);
        config.first_year = 1990;

        let serialised = config.to_toml_string().unwrap();
        let deserialised = PipelineConfig::from_toml_str(&serialised).unwrap();
        assert_eq!(config, deserialised);
    }

    #[test]
    fn test_invalid_configs() {
        let reversed = PipelineConfig {
            first_year: 2010,
            last_year: 2000,
            ..Default::default()
        };
        assert!(matches!(reversed.validate(), Err(PipelineError::InvalidConfig(_))));

        let before_base = PipelineConfig {
            first_year: 1850,
            ..Default::default()
        };
        assert!(matches!(before_base.validate(), Err(PipelineError::InvalidConfig(_))));

        let c4_closure = "[model]\nclosure = \"c4\"";
        assert!(matches!(
            PipelineConfig::from_toml_str(c4_closure),
            Err(PipelineError::InvalidConfig(_))
        ));

        let equal_thetas = "[parameters]\nsoilm_theta0 = 0.6\nsoilm_thetastar = 0.6";
        assert!(matches!(
            PipelineConfig::from_toml_str(equal_thetas),
            Err(PipelineError::InvalidConfig(_))
        ));

        let saturated_theta = PipelineConfig {
            parameters: PModelParameters {
                smith19_theta: 1.0,
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(matches!(saturated_theta.validate(), Err(PipelineError::InvalidConfig(_))));

        let unknown_closure = "[model]\nclosure = \"prentice\"";
        assert!(matches!(
            PipelineConfig::from_toml_str(unknown_closure),
            Err(PipelineError::ConfigParse(_))
        ));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let result = PipelineConfig::from_file("/nonexistent/pmodel/config.toml");
        assert!(matches!(result, Err(PipelineError::Io(_))));
    }
}
