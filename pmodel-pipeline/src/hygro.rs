//! Vapour pressure deficit from archive humidity and temperature
//!
//! The archive provides actual vapour pressure (hPa, at sea level) together
//! with daily minimum and maximum temperature. VPD is the mean of the deficits
//! at the two temperature extremes, using the Allen et al. (1998) Magnus
//! parameterisation of saturation vapour pressure:
//!
//! $$e_s(T) = a \exp\left(\frac{b T}{T + c}\right)$$
//!
//! $$D = \frac{(e_s(T_{min}) - e) + (e_s(T_{max}) - e)}{2}$$
//!
//! The vapour pressure is first scaled to the local pressure by $p / p_0$.
//! Negative deficits are set to zero; NaN inputs give NaN.

use pmodel_core::broadcast::{map4, Field, FloatValue};
use pmodel_core::PModelResult;

/// Coefficients of the Magnus equation for saturation vapour pressure
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MagnusCoefficients {
    /// unit: kPa
    pub a: FloatValue,
    /// unit: dimensionless
    pub b: FloatValue,
    /// unit: °C
    pub c: FloatValue,
}

/// Allen et al. (1998) coefficients
pub const ALLEN_1998: MagnusCoefficients = MagnusCoefficients {
    a: 0.6108,
    b: 17.27,
    c: 237.3,
};

impl MagnusCoefficients {
    /// Saturation vapour pressure (kPa) at `tc` (°C)
    pub fn saturation_vapour_pressure(&self, tc: FloatValue) -> FloatValue {
        self.a * (self.b * tc / (tc + self.c)).exp()
    }
}

/// Vapour pressure deficit.
///
/// # Arguments
///
/// * `vap` - Actual vapour pressure at sea level (hPa)
/// * `tmin` - Daily minimum air temperature (°C)
/// * `tmax` - Daily maximum air temperature (°C)
/// * `patm` - Local atmospheric pressure (Pa)
/// * `standard_pressure` - Sea-level pressure the vapour pressure refers to (Pa)
///
/// # Returns
///
/// VPD (Pa), never negative
pub fn vapour_pressure_deficit(
    vap: &Field,
    tmin: &Field,
    tmax: &Field,
    patm: &Field,
    standard_pressure: FloatValue,
) -> PModelResult<Field> {
    map4(
        "vapour_pressure_deficit",
        vap,
        tmin,
        tmax,
        patm,
        |vap, tmin, tmax, patm| {
            // hPa -> kPa at local pressure
            let vp = 0.1 * vap * patm / standard_pressure;
            let deficit_min = ALLEN_1998.saturation_vapour_pressure(tmin) - vp;
            let deficit_max = ALLEN_1998.saturation_vapour_pressure(tmax) - vp;
            // kPa -> Pa
            let vpd = 0.5 * (deficit_min + deficit_max) * 1000.0;
            if vpd < 0.0 {
                0.0
            } else {
                vpd
            }
        },
    )
}
