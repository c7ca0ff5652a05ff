//! P-model
//!
//! [`PModel`] fixes the model parameters and the optional corrections once and
//! evaluates one photosynthetic pathway at a time. Evaluation happens in two
//! stages, mirroring how the model is usually applied:
//!
//! 1. [`PModel::unit_iabs`] solves the model per unit of absorbed irradiance,
//!    which depends only on the environment.
//! 2. [`UnitIabs::scale_iabs`] scales the solution by the absorbed
//!    photosynthetically active radiation (fAPAR × PPFD) to give GPP and the
//!    related fluxes.
//!
//! The model holds no mutable state, so one instance can be shared across
//! threads and timesteps.

use crate::broadcast::{map1, map2, map3, map5, mask_non_finite, scalar, Field, FloatValue};
use crate::environment::EnvironmentSample;
use crate::errors::{PModelError, PModelResult};
use crate::functions::{
    instantaneous_rd_scaling, instantaneous_vcmax_scaling, quantum_yield_temperature_scaling,
};
use crate::lue::{lue_vcmax, LueVcmax};
use crate::optimal_chi::{resolve_optimal_chi, OptimalChi};
use crate::parameters::{PModelParameters, DEFAULT_KPHIO_WITHOUT_FTEMP, DEFAULT_KPHIO_WITH_FTEMP};
use crate::pathway::{ClosureMethod, Pathway};
use serde::{Deserialize, Serialize};

/// Optional corrections and closure selection for a [`PModel`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PModelSettings {
    /// Intrinsic quantum yield. When unset, a default calibrated for the
    /// value of `do_ftemp_kphio` is used.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kphio: Option<FloatValue>,
    /// Apply the temperature dependence of the quantum yield
    pub do_ftemp_kphio: bool,
    /// Closure used for the C3 pathway. The C4 pathway always uses
    /// [`ClosureMethod::C4`].
    pub closure: ClosureMethod,
}

impl Default for PModelSettings {
    fn default() -> Self {
        Self {
            kphio: None,
            do_ftemp_kphio: true,
            closure: ClosureMethod::Wang17,
        }
    }
}

/// A configured P-model
#[derive(Debug, Clone, PartialEq)]
pub struct PModel {
    params: PModelParameters,
    settings: PModelSettings,
}

impl PModel {
    /// Create a model from parameters and settings.
    ///
    /// # Errors
    ///
    /// * `IncompatibleMethod` if the configured closure cannot be used for C3.
    /// * `InvalidParameter` if an explicit `kphio` is not finite and positive,
    ///   or the parameters fail [`PModelParameters::validate`].
    pub fn from_parameters(params: PModelParameters, settings: PModelSettings) -> PModelResult<Self> {
        settings.closure.ensure_supports(Pathway::C3)?;
        params.validate()?;
        if let Some(kphio) = settings.kphio {
            if !(kphio.is_finite() && kphio > 0.0) {
                return Err(PModelError::InvalidParameter(format!(
                    "kphio must be finite and positive, got {kphio}"
                )));
            }
        }
        Ok(Self { params, settings })
    }

    pub fn parameters(&self) -> &PModelParameters {
        &self.params
    }

    pub fn settings(&self) -> &PModelSettings {
        &self.settings
    }

    /// Intrinsic quantum yield in use
    pub fn kphio(&self) -> FloatValue {
        match self.settings.kphio {
            Some(kphio) => kphio,
            None if self.settings.do_ftemp_kphio => DEFAULT_KPHIO_WITH_FTEMP,
            None => DEFAULT_KPHIO_WITHOUT_FTEMP,
        }
    }

    /// Closure applied to `pathway`
    pub fn closure_for(&self, pathway: Pathway) -> ClosureMethod {
        match pathway {
            Pathway::C3 => self.settings.closure,
            Pathway::C4 => ClosureMethod::C4,
        }
    }

    /// Temperature scaling of the quantum yield for `pathway`, or 1 when disabled
    pub fn ftemp_kphio(&self, tc: &Field, pathway: Pathway) -> Field {
        if self.settings.do_ftemp_kphio {
            quantum_yield_temperature_scaling(tc, pathway, &self.params)
        } else {
            scalar(1.0)
        }
    }

    /// Solve the model for one pathway per unit absorbed irradiance.
    ///
    /// `soilmstress` is the multiplicative soil moisture stress factor; pass
    /// a scalar 1 to disable it.
    pub fn unit_iabs(
        &self,
        env: &EnvironmentSample,
        pathway: Pathway,
        soilmstress: &Field,
    ) -> PModelResult<UnitIabs> {
        let params = &self.params;
        let optchi = resolve_optimal_chi(
            env.kmm(),
            env.gammastar(),
            env.ns_star(),
            env.ca(),
            env.vpd(),
            pathway,
            params,
        )?;

        let kphio = self.kphio();
        let ftemp_kphio = self.ftemp_kphio(env.tc(), pathway);
        let lue = lue_vcmax(
            &optchi,
            kphio,
            &ftemp_kphio,
            soilmstress,
            self.closure_for(pathway),
            params,
        )?;

        let ci = map2("PModel::unit_iabs", &optchi.chi, env.ca(), |chi, ca| chi * ca)?;
        let iwue = map3("PModel::unit_iabs", env.ca(), &ci, env.patm(), |ca, ci, patm| {
            (5.0 / 8.0) * (ca - ci) / (1e-6 * patm)
        })?;

        Ok(UnitIabs {
            pathway,
            kphio_eff: map1(&ftemp_kphio, |ft| kphio * ft),
            ca: env.ca().clone(),
            gammastar: env.gammastar().clone(),
            kmm: env.kmm().clone(),
            fvcmax: instantaneous_vcmax_scaling(env.tc(), params),
            frd: instantaneous_rd_scaling(env.tc(), params),
            rd_to_vcmax: params.rd_to_vcmax,
            carbon_molar_mass: params.carbon_molar_mass,
            optchi,
            lue,
            ci,
            iwue,
        })
    }
}

/// Solution of the P-model per unit absorbed irradiance for one pathway
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnitIabs {
    pub pathway: Pathway,
    pub optchi: OptimalChi,
    pub lue: LueVcmax,
    /// Leaf-internal CO2 partial pressure (Pa)
    pub ci: Field,
    /// Intrinsic water use efficiency (µmol / mol)
    pub iwue: Field,

    kphio_eff: Field,
    ca: Field,
    gammastar: Field,
    kmm: Field,
    fvcmax: Field,
    frd: Field,
    rd_to_vcmax: FloatValue,
    carbon_molar_mass: FloatValue,
}

/// Fluxes for a given absorbed irradiance
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Productivity {
    /// Gross primary productivity (g C, in the time and area units of the irradiance)
    pub gpp: Field,
    /// Maximum carboxylation capacity (mol C, per irradiance units)
    pub vcmax: Field,
    /// Vcmax normalised to 25 °C
    pub vcmax25: Field,
    /// Dark respiration
    pub rd: Field,
    /// Maximum rate of electron transport
    pub jmax: Field,
    /// Stomatal conductance (mol C / Pa, per irradiance units)
    pub gs: Field,
}

impl UnitIabs {
    /// Scale the solution by absorbed irradiance.
    ///
    /// # Arguments
    ///
    /// * `fapar` - Fraction of absorbed photosynthetically active radiation
    /// * `ppfd` - Photosynthetic photon flux density
    ///
    /// Non-finite `jmax` and `gs` values (for example `gs` in the C4 pathway,
    /// where ci equals ca) are returned as NaN.
    pub fn scale_iabs(&self, fapar: &Field, ppfd: &Field) -> PModelResult<Productivity> {
        let context = "UnitIabs::scale_iabs";
        let iabs = map2(context, fapar, ppfd, |fapar, ppfd| fapar * ppfd)?;

        let gpp = map2(context, &self.lue.lue, &iabs, |lue, iabs| lue * iabs)?;
        let vcmax = map2(context, &self.lue.vcmax_unitiabs, &iabs, |v, iabs| v * iabs)?;
        let vcmax25 = map2(context, &vcmax, &self.fvcmax, |v, f| v / f)?;
        let rd_to_vcmax = self.rd_to_vcmax;
        let rd = map3(context, &vcmax, &self.frd, &self.fvcmax, |v, frd, fv| {
            rd_to_vcmax * (frd / fv) * v
        })?;

        let jmax_factor = map5(
            context,
            &self.lue.vcmax_unitiabs,
            &self.ci,
            &self.gammastar,
            &self.kmm,
            &self.kphio_eff,
            |v, ci, g, k, kphio| v * (ci + 2.0 * g) / (kphio * (ci + k)),
        )?;
        let jmax = map3(context, &jmax_factor, &self.kphio_eff, &iabs, |fact, kphio, iabs| {
            4.0 * kphio * iabs / ((1.0 / fact).powi(2) - 1.0).sqrt()
        })?;

        let carbon = self.carbon_molar_mass;
        let gs = map3(context, &gpp, &self.ca, &self.ci, |gpp, ca, ci| {
            gpp / carbon / (ca - ci)
        })?;

        Ok(Productivity {
            gpp,
            vcmax,
            vcmax25,
            rd,
            jmax: mask_non_finite(jmax),
            gs: mask_non_finite(gs),
        })
    }
}
