//! Physical constant formulas
//!
//! Stateless formulas converting temperature, pressure and elevation into the
//! photosynthetic quantities used by the P-model. Each formula accepts
//! scalar or gridded [`Field`]s; two-argument formulas broadcast their inputs
//! and fail with [`PModelError::ShapeMismatch`](crate::errors::PModelError)
//! when the shapes are incompatible.
//!
//! Temperatures are in °C unless the argument is explicitly in Kelvin.

use crate::broadcast::{map1, map2, FloatValue, Field};
use crate::errors::PModelResult;
use crate::parameters::PModelParameters;
use crate::pathway::Pathway;

/// Chen et al. (1997) polynomial for the bulk modulus term λ, (bar cm³)/g
const CHEN_LAMBDA: [FloatValue; 5] = [
    1788.316,
    21.55053,
    -0.4695911,
    3.096363e-3,
    -7.341182e-6,
];

/// Chen et al. (1997) polynomial for the reference pressure p₀, bar
const CHEN_PO: [FloatValue; 5] = [
    5918.499,
    58.05267,
    -1.1253317,
    6.6123869e-3,
    -1.4661625e-5,
];

/// Chen et al. (1997) polynomial for the specific volume at infinite pressure, cm³/g
const CHEN_VINF: [FloatValue; 10] = [
    0.6980547,
    -7.435626e-4,
    3.704258e-5,
    -6.315724e-7,
    9.829576e-9,
    -1.197269e-10,
    1.005461e-12,
    -5.437898e-15,
    1.69946e-17,
    -2.295063e-20,
];

/// Huber et al. (2009) reference temperature, K
const HUBER_TK_AST: FloatValue = 647.096;
/// Huber et al. (2009) reference density, kg/m³
const HUBER_RHO_AST: FloatValue = 322.0;
/// Huber et al. (2009) reference viscosity, Pa s
const HUBER_MU_AST: FloatValue = 1e-6;
/// Huber et al. (2009) ideal-gas viscosity coefficients
const HUBER_H0: [FloatValue; 4] = [1.67752, 2.20462, 0.6366564, -0.241605];
/// Huber et al. (2009) residual viscosity coefficients, indexed `[density power][temperature power]`
const HUBER_H1: [[FloatValue; 6]; 7] = [
    [0.520094, 0.0850895, -1.08374, -0.289555, 0.0, 0.0],
    [0.222531, 0.999115, 1.88797, 1.26613, 0.0, 0.120573],
    [-0.281378, -0.906851, -0.772479, -0.489837, -0.257040, 0.0],
    [0.161913, 0.257399, 0.0, 0.0, 0.0, 0.0],
    [-0.0325372, 0.0, 0.0, 0.0698452, 0.0, 0.0],
    [0.0, 0.0, 0.0, 0.0, 0.00872102, 0.0],
    [0.0, 0.0, 0.0, -0.00435673, 0.0, -0.000593264],
];

/// Evaluate a polynomial with coefficients in increasing order of power
fn polynomial(coefs: &[FloatValue], x: FloatValue) -> FloatValue {
    coefs.iter().rev().fold(0.0, |acc, &c| acc * x + c)
}

/// Atmospheric pressure from elevation using the barometric formula.
///
/// $$p = p_0 \left(1 - \frac{L z}{T_0}\right)^{g M / (R L)}$$
///
/// # Arguments
///
/// * `elevation` - Elevation above sea level (m)
///
/// # Returns
///
/// Atmospheric pressure (Pa)
pub fn atmospheric_pressure(elevation: &Field, params: &PModelParameters) -> Field {
    let exponent = params.barometric_exponent();
    map1(elevation, |z| {
        params.standard_pressure
            * (1.0 - params.lapse_rate * z / params.reference_temperature).powf(exponent)
    })
}

fn water_density_scalar(tc: FloatValue, patm: FloatValue) -> FloatValue {
    let lambda = polynomial(&CHEN_LAMBDA, tc);
    let po = polynomial(&CHEN_PO, tc);
    let vinf = polynomial(&CHEN_VINF, tc);
    // Pa -> bar
    let pbar = 1e-5 * patm;
    let specific_volume = vinf + lambda / (po + pbar);
    // g/cm³ -> kg/m³
    1e3 / specific_volume
}

/// Density of water (Chen et al. 1997, Tumlirz equation).
///
/// # Arguments
///
/// * `tc` - Air temperature (°C)
/// * `patm` - Atmospheric pressure (Pa)
///
/// # Returns
///
/// Water density (kg / m^3)
pub fn water_density(tc: &Field, patm: &Field) -> PModelResult<Field> {
    map2("water_density", tc, patm, water_density_scalar)
}

fn water_viscosity_scalar(tc: FloatValue, patm: FloatValue, kelvin_offset: FloatValue) -> FloatValue {
    let rho = water_density_scalar(tc, patm);

    let tbar = (tc + kelvin_offset) / HUBER_TK_AST;
    let rbar = rho / HUBER_RHO_AST;

    let mu0 = 1e2 * tbar.sqrt()
        / (HUBER_H0[0] + HUBER_H0[1] / tbar + HUBER_H0[2] / tbar.powi(2) + HUBER_H0[3] / tbar.powi(3));

    let ctbar = 1.0 / tbar - 1.0;
    let mut mu1 = 0.0;
    for i in 0..6 {
        let coef2: FloatValue = HUBER_H1
            .iter()
            .enumerate()
            .map(|(j, row)| row[i] * (rbar - 1.0).powi(j as i32))
            .sum();
        mu1 += ctbar.powi(i as i32) * coef2;
    }
    let mu1 = (rbar * mu1).exp();

    mu0 * mu1 * HUBER_MU_AST
}

/// Viscosity of water (Huber et al. 2009).
///
/// # Arguments
///
/// * `tc` - Air temperature (°C)
/// * `patm` - Atmospheric pressure (Pa)
///
/// # Returns
///
/// Dynamic viscosity (Pa s)
pub fn water_viscosity(tc: &Field, patm: &Field, params: &PModelParameters) -> PModelResult<Field> {
    map2("water_viscosity", tc, patm, |t, p| {
        water_viscosity_scalar(t, p, params.kelvin_offset)
    })
}

/// Viscosity of water relative to its value at 25 °C and standard pressure (η*).
pub fn viscosity_ratio(tc: &Field, patm: &Field, params: &PModelParameters) -> PModelResult<Field> {
    let reference = water_viscosity_scalar(
        params.reference_temperature - params.kelvin_offset,
        params.standard_pressure,
        params.kelvin_offset,
    );
    map2("viscosity_ratio", tc, patm, |t, p| {
        water_viscosity_scalar(t, p, params.kelvin_offset) / reference
    })
}

fn arrhenius_scalar(tk: FloatValue, activation_energy: FloatValue, params: &PModelParameters) -> FloatValue {
    let tref = params.reference_temperature;
    (activation_energy * (tk - tref) / (tref * params.gas_constant * tk)).exp()
}

/// Arrhenius-type temperature scaling relative to 25 °C.
///
/// $$f(T) = \exp\left(\frac{H_a (T - T_{ref})}{T_{ref} R T}\right)$$
///
/// # Arguments
///
/// * `tk` - Temperature (K)
/// * `activation_energy` - Activation energy $H_a$ (J / mol)
pub fn temperature_response_arrhenius(
    tk: &Field,
    activation_energy: FloatValue,
    params: &PModelParameters,
) -> Field {
    map1(tk, |t| arrhenius_scalar(t, activation_energy, params))
}

fn gammastar_scalar(tc: FloatValue, patm: FloatValue, params: &PModelParameters) -> FloatValue {
    params.gammastar_25 * patm / params.standard_pressure
        * arrhenius_scalar(
            tc + params.kelvin_offset,
            params.gammastar_activation_energy,
            params,
        )
}

/// Photorespiratory CO2 compensation point, Γ* (Bernacchi et al. 2001).
///
/// # Arguments
///
/// * `tc` - Air temperature (°C)
/// * `patm` - Atmospheric pressure (Pa)
///
/// # Returns
///
/// Γ* (Pa)
pub fn co2_compensation_point(
    tc: &Field,
    patm: &Field,
    params: &PModelParameters,
) -> PModelResult<Field> {
    map2("co2_compensation_point", tc, patm, |t, p| {
        gammastar_scalar(t, p, params)
    })
}

fn kmm_scalar(tc: FloatValue, patm: FloatValue, params: &PModelParameters) -> FloatValue {
    let tk = tc + params.kelvin_offset;
    let kc = params.kc_25 * arrhenius_scalar(tk, params.kc_activation_energy, params);
    let ko = params.ko_25 * arrhenius_scalar(tk, params.ko_activation_energy, params);
    let po = params.o2_mixing_ratio * 1e-6 * patm;
    kc * (1.0 + po / ko)
}

/// Effective Michaelis-Menten coefficient for Rubisco-limited photosynthesis.
///
/// $$K = K_c \left(1 + \frac{p_{O_2}}{K_o}\right)$$
///
/// # Arguments
///
/// * `tc` - Air temperature (°C)
/// * `patm` - Atmospheric pressure (Pa)
///
/// # Returns
///
/// K (Pa)
pub fn michaelis_menten_constant(
    tc: &Field,
    patm: &Field,
    params: &PModelParameters,
) -> PModelResult<Field> {
    map2("michaelis_menten_constant", tc, patm, |t, p| {
        kmm_scalar(t, p, params)
    })
}

/// Convert a CO2 mixing ratio (ppm) into a partial pressure (Pa).
pub fn co2_to_ca(co2: &Field, patm: &Field) -> PModelResult<Field> {
    map2("co2_to_ca", co2, patm, |c, p| 1e-6 * c * p)
}

/// Instantaneous temperature scaling of Vcmax (Kattge & Knorr 2007).
///
/// A peaked Arrhenius function with a deactivation term whose entropy depends
/// on the growth temperature, taken equal to `tc`. Equals 1 at 25 °C.
///
/// # Arguments
///
/// * `tc` - Air temperature (°C)
pub fn instantaneous_vcmax_scaling(tc: &Field, params: &PModelParameters) -> Field {
    let r = params.gas_constant;
    let tref = params.reference_temperature;
    let hd = params.vcmax_deactivation_energy;
    map1(tc, |t| {
        let tk = t + params.kelvin_offset;
        let entropy = params.vcmax_entropy_intercept + params.vcmax_entropy_slope * t;
        let fva = arrhenius_scalar(tk, params.vcmax_activation_energy, params);
        let fvb = (1.0 + ((tref * entropy - hd) / (r * tref)).exp())
            / (1.0 + ((tk * entropy - hd) / (r * tk)).exp());
        fva * fvb
    })
}

/// Instantaneous temperature scaling of dark respiration (Heskel et al. 2016).
///
/// $$f(T) = \exp\left(a (T - 25) - b (T^2 - 25^2)\right)$$
pub fn instantaneous_rd_scaling(tc: &Field, params: &PModelParameters) -> Field {
    let t25 = params.reference_temperature - params.kelvin_offset;
    map1(tc, |t| {
        (params.rd_linear_coef * (t - t25) - params.rd_quadratic_coef * (t * t - t25 * t25)).exp()
    })
}

/// Temperature dependence of the quantum yield efficiency.
///
/// A quadratic in °C whose coefficients differ between the C3 and C4
/// pathways. Values are not clipped; callers handle sub-freezing cells.
pub fn quantum_yield_temperature_scaling(
    tc: &Field,
    pathway: Pathway,
    params: &PModelParameters,
) -> Field {
    let coefs = match pathway {
        Pathway::C3 => params.kphio_c3_coefs,
        Pathway::C4 => params.kphio_c4_coefs,
    };
    map1(tc, |t| polynomial(&coefs, t))
}
