//! Light-use efficiency and Vcmax closures
//!
//! Combines an [`OptimalChi`] solution with the intrinsic quantum yield to give
//! the light-use efficiency (LUE, g C per mol absorbed photons) and the
//! maximum carboxylation rate per unit absorbed irradiance. The closures
//! differ in how the limitation of electron transport (Jmax) is treated:
//!
//! | Method    | Jmax limitation $m'$                                               |
//! |-----------|--------------------------------------------------------------------|
//! | `none`    | $m' = m_j$                                                        |
//! | `wang17`  | $m' = \sqrt{m_j^2 - c^{2/3} m_j^{4/3}}$                           |
//! | `smith19` | $m' = m_j \omega^* / (8 \theta)$                                  |
//! | `c4`      | $m' = m_j$, applied to the CO2-saturated C4 solution               |
//!
//! In every case
//!
//! $$LUE = \phi_0 f_\phi(T) m' M_C \beta(\theta)$$
//!
//! where $\phi_0$ is `kphio`, $f_\phi$ the quantum yield temperature
//! scaling, $M_C$ the molar mass of carbon and $\beta(\theta)$ the soil
//! moisture stress factor.

use crate::broadcast::{map4, Field, FloatValue};
use crate::errors::PModelResult;
use crate::optimal_chi::OptimalChi;
use crate::parameters::PModelParameters;
use crate::pathway::ClosureMethod;
use serde::Serialize;

/// Light-use efficiency and Vcmax per unit absorbed irradiance
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LueVcmax {
    /// Closure that produced this result
    pub method: ClosureMethod,
    /// Light-use efficiency (g C / mol photons)
    pub lue: Field,
    /// Vcmax per unit absorbed irradiance (mol C / mol photons)
    pub vcmax_unitiabs: Field,
    /// ω from the `smith19` closure
    pub omega: Option<Field>,
    /// ω* from the `smith19` closure
    pub omega_star: Option<Field>,
}

/// Per-point output of a closure: `(m' / m_j, omega, omega_star)`.
///
/// `m' / m_j` scales both LUE and Vcmax relative to the unlimited case.
type Limitation = (FloatValue, FloatValue, FloatValue);

fn wang17_limitation(mj: FloatValue, params: &PModelParameters) -> Limitation {
    let c = params.wang17_jmax_cost;
    let mprime_sq = mj * mj - c.powf(2.0 / 3.0) * mj.powf(4.0 / 3.0);
    // Negative radicands are undefined and become NaN through sqrt
    let mprime = mprime_sq.sqrt();
    // At ca = Γ* both terms vanish and there is no assimilation to limit
    let ratio = if mprime == 0.0 { 0.0 } else { mprime / mj };
    (ratio, FloatValue::NAN, FloatValue::NAN)
}

fn smith19_limitation(mj: FloatValue, params: &PModelParameters, m_star: FloatValue) -> Limitation {
    let theta = params.smith19_theta;
    let cm = 4.0 * params.smith19_jmax_cost / mj;
    let v = 1.0 / (cm * (1.0 - theta * cm)) - 4.0 * theta;

    let root = ((1.0 - theta) * v).sqrt();
    let omega = if mj < m_star {
        -(1.0 - 2.0 * theta) - root
    } else {
        -(1.0 - 2.0 * theta) + root
    };
    let omega_star = 1.0 + omega - ((1.0 + omega).powi(2) - 4.0 * theta * omega).sqrt();

    (omega_star / (8.0 * theta), omega, omega_star)
}

/// Light-use efficiency and Vcmax for an optimal chi solution.
///
/// # Arguments
///
/// * `optchi` - Optimal chi solution
/// * `kphio` - Intrinsic quantum yield of photosynthesis
/// * `ftemp_kphio` - Temperature scaling of the quantum yield, 1 to disable
/// * `soilmstress` - Soil moisture stress factor, 1 to disable
/// * `method` - Jmax limitation closure
///
/// # Errors
///
/// * [`IncompatibleMethod`](crate::errors::PModelError::IncompatibleMethod) if
///   `method` does not apply to the pathway of `optchi`.
/// * A shape mismatch if the corrections cannot be broadcast against `optchi`.
pub fn lue_vcmax(
    optchi: &OptimalChi,
    kphio: FloatValue,
    ftemp_kphio: &Field,
    soilmstress: &Field,
    method: ClosureMethod,
    params: &PModelParameters,
) -> PModelResult<LueVcmax> {
    method.ensure_supports(optchi.pathway)?;

    let carbon = params.carbon_molar_mass;
    let m_star = params.smith19_m_star();
    let limitation = |mj: FloatValue| -> Limitation {
        match method {
            ClosureMethod::None | ClosureMethod::C4 => (1.0, FloatValue::NAN, FloatValue::NAN),
            ClosureMethod::Wang17 => wang17_limitation(mj, params),
            ClosureMethod::Smith19 => smith19_limitation(mj, params, m_star),
        }
    };

    let solved = map4(
        "lue_vcmax",
        &optchi.mj,
        &optchi.mjoc,
        ftemp_kphio,
        soilmstress,
        |mj, mjoc, ft, sm| {
            let (ratio, omega, omega_star) = limitation(mj);
            let yield_eff = kphio * ft * sm;
            let lue = yield_eff * mj * ratio * carbon;
            let vcmax_unitiabs = yield_eff * mjoc * ratio;
            (lue, vcmax_unitiabs, omega, omega_star)
        },
    )?;

    let (omega, omega_star) = if method == ClosureMethod::Smith19 {
        (
            Some(solved.mapv(|s| s.2)),
            Some(solved.mapv(|s| s.3)),
        )
    } else {
        (None, None)
    };

    Ok(LueVcmax {
        method,
        lue: solved.mapv(|s| s.0),
        vcmax_unitiabs: solved.mapv(|s| s.1),
        omega,
        omega_star,
    })
}
