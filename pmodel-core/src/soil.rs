//! Empirical soil moisture stress
//!
//! Multiplicative down-regulation of light-use efficiency under water
//! limitation (Stocker et al. 2020). The stress at the driest soil moisture,
//! θ₀, rises linearly with the long-run aridity index α. Between θ₀ and θ*
//! the factor follows a parabola and above θ* there is no stress:
//!
//! $$y_0 = a + b \alpha$$
//!
//! $$\beta = \frac{1 - y_0}{(\theta_0 - \theta^*)^2}$$
//!
//! $$f(\theta) = \begin{cases} 1 - \beta (\theta - \theta^*)^2 & \theta \le \theta^* \\ 1 & \theta > \theta^* \end{cases}$$
//!
//! The result is clipped to [0, 1].

use crate::broadcast::{map2, scalar, Field, FloatValue};
use crate::errors::PModelResult;
use crate::parameters::PModelParameters;

fn stress_scalar(soilm: FloatValue, meanalpha: FloatValue, params: &PModelParameters) -> FloatValue {
    let y0 = params.soilm_a + params.soilm_b * meanalpha;
    let beta = (1.0 - y0) / (params.soilm_theta0 - params.soilm_thetastar).powi(2);
    let stress = if soilm <= params.soilm_thetastar {
        1.0 - beta * (soilm - params.soilm_thetastar).powi(2)
    } else if soilm.is_nan() {
        FloatValue::NAN
    } else {
        1.0
    };
    // `clamp` keeps NaN as NaN
    stress.clamp(0.0, 1.0)
}

/// Soil moisture stress factor.
///
/// # Arguments
///
/// * `soilm` - Relative soil moisture (fraction of field capacity)
/// * `meanalpha` - Long-run ratio of actual to equilibrium evapotranspiration
///
/// # Returns
///
/// Stress factor in [0, 1], where 1 means no stress. NaN inputs give NaN.
pub fn soil_moisture_stress(
    soilm: &Field,
    meanalpha: &Field,
    params: &PModelParameters,
) -> PModelResult<Field> {
    map2("soil_moisture_stress", soilm, meanalpha, |sm, alpha| {
        stress_scalar(sm, alpha, params)
    })
}

/// Whether and how soil moisture stress is applied in a timestep
#[derive(Debug, Clone, PartialEq, Default)]
pub enum SoilState {
    /// No stress, equivalent to a factor of 1
    #[default]
    Disabled,
    /// Stress computed from soil moisture and the aridity index
    Enabled { soil_moisture: Field, mean_alpha: Field },
}

impl SoilState {
    /// Stress factor for this state
    pub fn stress_factor(&self, params: &PModelParameters) -> PModelResult<Field> {
        match self {
            SoilState::Disabled => Ok(scalar(1.0)),
            SoilState::Enabled {
                soil_moisture,
                mean_alpha,
            } => soil_moisture_stress(soil_moisture, mean_alpha, params),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::PModelError;
    use is_close::is_close;
    use ndarray::{array, Array};

    fn stress(sm: FloatValue, alpha: FloatValue) -> FloatValue {
        soil_moisture_stress(&scalar(sm), &scalar(alpha), &PModelParameters::default())
            .unwrap()
            .sum()
    }

    #[test]
    fn test_reference_values() {
        assert!(is_close!(stress(0.2, 0.5), 0.7077777777777778));
        assert!(is_close!(stress(0.2, 1.0), 0.86));
        assert!(stress(0.0, 0.0).abs() < 1e-12);
    }

    #[test]
    fn test_no_stress_at_or_above_threshold() {
        for alpha in [0.0, 0.3, 0.7, 1.0, 1.26] {
            assert_eq!(stress(1.0, alpha), 1.0);
            assert!((stress(0.6, alpha) - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn test_stress_is_bounded_and_monotonic() {
        let params = PModelParameters::default();
        let sm = Array::linspace(0.0, 1.0, 51).into_dyn();
        for alpha in [0.0, 0.5, 1.0, 2.0] {
            let factor = soil_moisture_stress(&sm, &scalar(alpha), &params).unwrap();
            let values: Vec<FloatValue> = factor.iter().copied().collect();
            assert!(values.iter().all(|v| (0.0..=1.0).contains(v)));
            for w in values.windows(2) {
                assert!(w[1] >= w[0] - 1e-12);
            }
        }
    }

    #[test]
    fn test_nan_soil_moisture_propagates() {
        assert!(stress(FloatValue::NAN, 0.5).is_nan());
    }

    #[test]
    fn test_shape_mismatch() {
        let result = soil_moisture_stress(
            &array![0.1, 0.2, 0.3].into_dyn(),
            &array![0.5, 0.5].into_dyn(),
            &PModelParameters::default(),
        );
        assert!(matches!(result, Err(PModelError::ShapeMismatch { .. })));
    }

    #[test]
    fn test_disabled_state_is_unit_scalar() {
        let factor = SoilState::Disabled
            .stress_factor(&PModelParameters::default())
            .unwrap();
        assert_eq!(factor.ndim(), 0);
        assert_eq!(factor.sum(), 1.0);
    }
}
