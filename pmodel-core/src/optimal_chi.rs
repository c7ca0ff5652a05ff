//! Optimal chi
//!
//! Resolves the ratio of leaf-internal to ambient CO2 partial pressure (χ)
//! that minimises the summed unit costs of carboxylation and transpiration,
//! together with the CO2 limitation terms used by the light-use efficiency
//! closures.
//!
//! # C3 pathway (Prentice et al. 2014)
//!
//! $$\xi = \sqrt{\frac{\beta (K + \Gamma^*)}{1.6 \eta^*}}$$
//!
//! $$\chi = \frac{\Gamma^*}{c_a} + \left(1 - \frac{\Gamma^*}{c_a}\right) \frac{\xi}{\xi + \sqrt{D}}$$
//!
//! $$m_j = \frac{c_a - \Gamma^*}{c_a + 2\Gamma^* + 3\Gamma^* \sqrt{\frac{1.6 \eta^* D}{\beta (K + \Gamma^*)}}}$$
//!
//! $$m_c = \frac{\chi - \gamma}{\chi + \kappa}, \quad \gamma = \Gamma^* / c_a, \quad \kappa = K / c_a$$
//!
//! # C4 pathway
//!
//! C4 photosynthesis is treated as CO2-saturated, so χ, $m_j$, $m_c$ and
//! $m_{joc}$ are all the scalar 1 whatever the shape of the inputs. The inputs
//! are still required to be mutually broadcastable.

use crate::broadcast::{check_broadcast, map5, scalar, Field, FloatValue};
use crate::errors::PModelResult;
use crate::parameters::PModelParameters;
use crate::pathway::Pathway;
use serde::Serialize;

/// Ratio of diffusivities of water vapour and CO2 in air
const WATER_CO2_DIFFUSIVITY_RATIO: FloatValue = 1.6;

/// Optimal chi and CO2 limitation terms for one pathway
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OptimalChi {
    /// Pathway the solution was resolved for
    pub pathway: Pathway,
    /// Ratio of internal to ambient CO2 partial pressure
    pub chi: Field,
    /// CO2 limitation factor for light-limited assimilation
    pub mj: Field,
    /// CO2 limitation factor for Rubisco-limited assimilation
    pub mc: Field,
    /// Ratio `mj / mc`
    pub mjoc: Field,
}

/// Prentice et al. (2014) solution at a single point, returning `(chi, mj, mc, mjoc)`
fn prentice14(
    kmm: FloatValue,
    gammastar: FloatValue,
    ns_star: FloatValue,
    ca: FloatValue,
    vpd: FloatValue,
    beta: FloatValue,
) -> (FloatValue, FloatValue, FloatValue, FloatValue) {
    let xi = (beta * (kmm + gammastar) / (WATER_CO2_DIFFUSIVITY_RATIO * ns_star)).sqrt();
    let gamma = gammastar / ca;
    let kappa = kmm / ca;

    let chi = gamma + (1.0 - gamma) * xi / (xi + vpd.sqrt());

    let vsr = (WATER_CO2_DIFFUSIVITY_RATIO * ns_star * vpd / (beta * (kmm + gammastar))).sqrt();
    let mj = (ca - gammastar) / (ca + 2.0 * gammastar + 3.0 * gammastar * vsr);

    let mc = (chi - gamma) / (chi + kappa);
    let mjoc = (chi + kappa) / (chi + 2.0 * gamma);

    (chi, mj, mc, mjoc)
}

/// Resolve optimal chi for `pathway`.
///
/// # Arguments
///
/// * `kmm` - Michaelis-Menten coefficient (Pa)
/// * `gammastar` - CO2 compensation point (Pa)
/// * `ns_star` - Water viscosity relative to 25 °C
/// * `ca` - Ambient CO2 partial pressure (Pa)
/// * `vpd` - Vapour pressure deficit (Pa)
///
/// # Errors
///
/// Returns a shape mismatch if the inputs cannot be broadcast together, for
/// both pathways.
pub fn resolve_optimal_chi(
    kmm: &Field,
    gammastar: &Field,
    ns_star: &Field,
    ca: &Field,
    vpd: &Field,
    pathway: Pathway,
    params: &PModelParameters,
) -> PModelResult<OptimalChi> {
    match pathway {
        Pathway::C3 => {
            let beta = params.unit_cost_ratio;
            let solved = map5(
                "resolve_optimal_chi",
                kmm,
                gammastar,
                ns_star,
                ca,
                vpd,
                |k, g, ns, ca, d| prentice14(k, g, ns, ca, d, beta),
            )?;
            Ok(OptimalChi {
                pathway,
                chi: solved.mapv(|s| s.0),
                mj: solved.mapv(|s| s.1),
                mc: solved.mapv(|s| s.2),
                mjoc: solved.mapv(|s| s.3),
            })
        }
        Pathway::C4 => {
            check_broadcast("resolve_optimal_chi", &[kmm, gammastar, ns_star, ca, vpd])?;
            Ok(OptimalChi {
                pathway,
                chi: scalar(1.0),
                mj: scalar(1.0),
                mc: scalar(1.0),
                mjoc: scalar(1.0),
            })
        }
    }
}
