//! Photosynthetic environment
//!
//! Bundles the four environmental drivers of the P-model with the derived
//! quantities every later stage needs. The derived values are computed once
//! at construction, so a sample is immutable and can be shared freely between
//! the C3 and C4 evaluations of the same month.

use crate::broadcast::{check_broadcast, Field};
use crate::errors::PModelResult;
use crate::functions::{
    co2_compensation_point, co2_to_ca, michaelis_menten_constant, viscosity_ratio,
};
use crate::parameters::PModelParameters;
use log::debug;
use serde::Serialize;

/// Environmental drivers and derived photosynthetic quantities
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnvironmentSample {
    tc: Field,
    patm: Field,
    vpd: Field,
    co2: Field,

    ca: Field,
    gammastar: Field,
    kmm: Field,
    ns_star: Field,
}

impl EnvironmentSample {
    /// Build an environment from its drivers.
    ///
    /// # Arguments
    ///
    /// * `tc` - Air temperature (°C)
    /// * `patm` - Atmospheric pressure (Pa)
    /// * `vpd` - Vapour pressure deficit (Pa)
    /// * `co2` - Atmospheric CO2 concentration (ppm)
    ///
    /// # Errors
    ///
    /// Returns a shape mismatch if the four drivers cannot be broadcast together.
    pub fn new(
        tc: Field,
        patm: Field,
        vpd: Field,
        co2: Field,
        params: &PModelParameters,
    ) -> PModelResult<Self> {
        let shape = check_broadcast("EnvironmentSample::new", &[&tc, &patm, &vpd, &co2])?;
        debug!("building photosynthetic environment with shape {:?}", shape);

        let ca = co2_to_ca(&co2, &patm)?;
        let gammastar = co2_compensation_point(&tc, &patm, params)?;
        let kmm = michaelis_menten_constant(&tc, &patm, params)?;
        let ns_star = viscosity_ratio(&tc, &patm, params)?;

        Ok(Self {
            tc,
            patm,
            vpd,
            co2,
            ca,
            gammastar,
            kmm,
            ns_star,
        })
    }

    /// Air temperature (°C)
    pub fn tc(&self) -> &Field {
        &self.tc
    }

    /// Atmospheric pressure (Pa)
    pub fn patm(&self) -> &Field {
        &self.patm
    }

    /// Vapour pressure deficit (Pa)
    pub fn vpd(&self) -> &Field {
        &self.vpd
    }

    /// Atmospheric CO2 concentration (ppm)
    pub fn co2(&self) -> &Field {
        &self.co2
    }

    /// Ambient CO2 partial pressure (Pa)
    pub fn ca(&self) -> &Field {
        &self.ca
    }

    /// Photorespiratory CO2 compensation point (Pa)
    pub fn gammastar(&self) -> &Field {
        &self.gammastar
    }

    /// Effective Michaelis-Menten coefficient (Pa)
    pub fn kmm(&self) -> &Field {
        &self.kmm
    }

    /// Water viscosity relative to 25 °C
    pub fn ns_star(&self) -> &Field {
        &self.ns_star
    }

    /// Shape of the broadcast environment
    pub fn shape(&self) -> PModelResult<Vec<usize>> {
        check_broadcast(
            "EnvironmentSample::shape",
            &[&self.tc, &self.patm, &self.vpd, &self.co2],
        )
    }
}
