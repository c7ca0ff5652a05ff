//! P-model Parameters
//!
//! Physical constants and empirical coefficients shared by every P-model
//! formula. A single [`PModelParameters`] value is passed explicitly into each
//! calculation; there is no global model state.
//!
//! # References
//!
//! - Bernacchi et al. (2001): Michaelis-Menten constants and Γ* at 25 °C with
//!   their activation energies.
//! - Kattge & Knorr (2007): instantaneous Vcmax temperature response.
//! - Heskel et al. (2016): dark respiration temperature response.
//! - Wang et al. (2017), Smith et al. (2019): Jmax limitation closures.
//! - Stocker et al. (2020): empirical soil moisture stress and quantum yield
//!   temperature dependence.

use crate::broadcast::FloatValue;
use crate::errors::{PModelError, PModelResult};
use serde::{Deserialize, Serialize};

/// Quantum yield of photosynthesis used when temperature scaling is enabled
pub const DEFAULT_KPHIO_WITH_FTEMP: FloatValue = 0.081785;

/// Quantum yield of photosynthesis used when temperature scaling is disabled
pub const DEFAULT_KPHIO_WITHOUT_FTEMP: FloatValue = 0.049977;

/// Month length used to convert monthly mean daily GPP into annual totals.
///
/// This is a fixed convention rather than a calendar-accurate month length.
pub const DEFAULT_MONTH_LENGTH_DAYS: FloatValue = 30.0;

/// Parameters for the P-model formulas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PModelParameters {
    /// Universal gas constant
    /// unit: J / mol / K
    /// default: 8.3145
    pub gas_constant: FloatValue,

    /// Conversion from °C to K
    /// unit: K
    /// default: 273.15
    pub kelvin_offset: FloatValue,

    /// Reference temperature for the Arrhenius responses (25 °C)
    /// unit: K
    /// default: 298.15
    pub reference_temperature: FloatValue,

    /// Standard atmospheric pressure at sea level
    /// unit: Pa
    /// default: 101325.0
    pub standard_pressure: FloatValue,

    /// Adiabatic temperature lapse rate
    /// unit: K / m
    /// default: 0.0065
    pub lapse_rate: FloatValue,

    /// Gravitational acceleration
    /// unit: m / s^2
    /// default: 9.80665
    pub gravity: FloatValue,

    /// Molecular weight of dry air
    /// unit: kg / mol
    /// default: 0.028963
    pub molar_mass_dry_air: FloatValue,

    /// Atmospheric O2 mixing ratio
    /// unit: ppm
    /// default: 209476.0
    pub o2_mixing_ratio: FloatValue,

    /// Molar mass of carbon, converting mol C into g C
    /// unit: g / mol
    /// default: 12.0107
    pub carbon_molar_mass: FloatValue,

    /// CO2 compensation point at 25 °C and standard pressure
    /// unit: Pa
    /// default: 4.332
    pub gammastar_25: FloatValue,

    /// Activation energy of the CO2 compensation point
    /// unit: J / mol
    /// default: 37830.0
    pub gammastar_activation_energy: FloatValue,

    /// Michaelis-Menten constant for CO2 at 25 °C
    /// unit: Pa
    /// default: 39.97
    pub kc_25: FloatValue,

    /// Michaelis-Menten constant for O2 at 25 °C
    /// unit: Pa
    /// default: 27480.0
    pub ko_25: FloatValue,

    /// Activation energy of the CO2 Michaelis-Menten constant
    /// unit: J / mol
    /// default: 79430.0
    pub kc_activation_energy: FloatValue,

    /// Activation energy of the O2 Michaelis-Menten constant
    /// unit: J / mol
    /// default: 36380.0
    pub ko_activation_energy: FloatValue,

    /// Activation energy of Vcmax (Kattge & Knorr)
    /// unit: J / mol
    /// default: 71513.0
    pub vcmax_activation_energy: FloatValue,

    /// Deactivation energy of Vcmax (Kattge & Knorr)
    /// unit: J / mol
    /// default: 200000.0
    pub vcmax_deactivation_energy: FloatValue,

    /// Intercept of the Vcmax entropy term against growth temperature
    /// unit: J / mol / K
    /// default: 668.39
    pub vcmax_entropy_intercept: FloatValue,

    /// Slope of the Vcmax entropy term against growth temperature
    /// unit: J / mol / K / °C
    /// default: -1.07
    pub vcmax_entropy_slope: FloatValue,

    /// Linear coefficient of the dark respiration temperature response
    /// unit: 1 / °C
    /// default: 0.1012
    pub rd_linear_coef: FloatValue,

    /// Quadratic coefficient of the dark respiration temperature response
    /// unit: 1 / °C^2
    /// default: 0.0005
    pub rd_quadratic_coef: FloatValue,

    /// Ratio of dark respiration to Vcmax at 25 °C (Atkin et al. 2015)
    /// unit: dimensionless
    /// default: 0.015
    pub rd_to_vcmax: FloatValue,

    /// Polynomial coefficients (constant, linear, quadratic in °C) of the
    /// C3 quantum yield temperature response
    /// default: [0.352, 0.022, -0.00034]
    pub kphio_c3_coefs: [FloatValue; 3],

    /// Polynomial coefficients (constant, linear, quadratic in °C) of the
    /// C4 quantum yield temperature response
    /// default: [-0.008, 0.00375, -0.58e-4]
    pub kphio_c4_coefs: [FloatValue; 3],

    /// Unit cost ratio of carboxylation to transpiration (β)
    /// unit: dimensionless
    /// default: 146.0
    pub unit_cost_ratio: FloatValue,

    /// Cost of maintaining Jmax in the Wang et al. (2017) closure
    /// unit: dimensionless
    /// default: 0.41
    pub wang17_jmax_cost: FloatValue,

    /// Curvature of the light response in the Smith et al. (2019) closure
    /// unit: dimensionless
    /// default: 0.85
    pub smith19_theta: FloatValue,

    /// Cost of maintaining Jmax in the Smith et al. (2019) closure
    /// unit: dimensionless
    /// default: 0.05336251
    pub smith19_jmax_cost: FloatValue,

    /// Soil moisture at which stress is maximal
    /// unit: m^3 / m^3 (relative soil water content)
    /// default: 0.0
    pub soilm_theta0: FloatValue,

    /// Soil moisture above which there is no stress
    /// unit: m^3 / m^3 (relative soil water content)
    /// default: 0.6
    pub soilm_thetastar: FloatValue,

    /// Intercept of the stress at `soilm_theta0` against the aridity index
    /// unit: dimensionless
    /// default: 0.0
    pub soilm_a: FloatValue,

    /// Slope of the stress at `soilm_theta0` against the aridity index
    /// unit: dimensionless
    /// default: 0.685
    pub soilm_b: FloatValue,
}

impl Default for PModelParameters {
    fn default() -> Self {
        Self {
            // Physical constants
            gas_constant: 8.3145,
            kelvin_offset: 273.15,
            reference_temperature: 298.15,
            standard_pressure: 101325.0,
            lapse_rate: 0.0065,
            gravity: 9.80665,
            molar_mass_dry_air: 0.028963,
            o2_mixing_ratio: 209476.0,
            carbon_molar_mass: 12.0107,

            // Bernacchi et al. (2001)
            gammastar_25: 4.332,
            gammastar_activation_energy: 37830.0,
            kc_25: 39.97,
            ko_25: 27480.0,
            kc_activation_energy: 79430.0,
            ko_activation_energy: 36380.0,

            // Kattge & Knorr (2007)
            vcmax_activation_energy: 71513.0,
            vcmax_deactivation_energy: 200000.0,
            vcmax_entropy_intercept: 668.39,
            vcmax_entropy_slope: -1.07,

            // Heskel et al. (2016), Atkin et al. (2015)
            rd_linear_coef: 0.1012,
            rd_quadratic_coef: 0.0005,
            rd_to_vcmax: 0.015,

            // Quantum yield temperature dependence
            kphio_c3_coefs: [0.352, 0.022, -0.00034],
            kphio_c4_coefs: [-0.008, 0.00375, -0.58e-4],

            // Optimality and Jmax closures
            unit_cost_ratio: 146.0,
            wang17_jmax_cost: 0.41,
            smith19_theta: 0.85,
            smith19_jmax_cost: 0.05336251,

            // Soil moisture stress
            soilm_theta0: 0.0,
            soilm_thetastar: 0.6,
            soilm_a: 0.0,
            soilm_b: 0.685,
        }
    }
}

impl PModelParameters {
    /// Exponent of the barometric formula, `g M / (R L)`.
    pub fn barometric_exponent(&self) -> FloatValue {
        self.gravity * self.molar_mass_dry_air / (self.gas_constant * self.lapse_rate)
    }

    /// Threshold on `mj` below which the Smith et al. (2019) closure uses the
    /// lower branch of its ω solution.
    ///
    /// The threshold comes from the smaller root of
    /// $$P \theta x^2 - P x + 1 = 0, \quad P = \frac{(1/1.4 - 0.7)^2}{1 - \theta} + 3.4$$
    /// and depends only on `smith19_theta` and `smith19_jmax_cost`.
    pub fn smith19_m_star(&self) -> FloatValue {
        let theta = self.smith19_theta;
        let cap_p = ((1.0 as FloatValue / 1.4) - 0.7).powi(2) / (1.0 - theta) + 3.4;
        let discriminant = (cap_p * cap_p - 4.0 * cap_p * theta).sqrt();
        let smaller_root = (cap_p - discriminant) / (2.0 * cap_p * theta);
        4.0 * self.smith19_jmax_cost / smaller_root
    }

    /// Reject values for which the soil stress or Smith et al. (2019)
    /// formulas have no finite solution.
    ///
    /// # Errors
    ///
    /// `InvalidParameter` naming the offending field.
    pub fn validate(&self) -> PModelResult<()> {
        if !(self.soilm_theta0.is_finite()
            && self.soilm_thetastar.is_finite()
            && self.soilm_theta0 < self.soilm_thetastar)
        {
            return Err(PModelError::InvalidParameter(format!(
                "soilm_theta0 ({}) must be below soilm_thetastar ({})",
                self.soilm_theta0, self.soilm_thetastar
            )));
        }
        if !(self.smith19_theta > 0.0 && self.smith19_theta < 1.0) {
            return Err(PModelError::InvalidParameter(format!(
                "smith19_theta must lie in (0, 1), got {}",
                self.smith19_theta
            )));
        }
        if !self.smith19_m_star().is_finite() {
            return Err(PModelError::InvalidParameter(format!(
                "smith19_theta ({}) and smith19_jmax_cost ({}) give no real m*",
                self.smith19_theta, self.smith19_jmax_cost
            )));
        }
        Ok(())
    }
}
