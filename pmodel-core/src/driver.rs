//! Per-timestep GPP driver
//!
//! Runs both photosynthetic pathways for one timestep, blends them by their
//! areal fractions and applies the clipping rules that keep monthly GPP
//! physically meaningful:
//!
//! - cells with a mean temperature below 0 °C produce exactly zero GPP,
//! - GPP is never negative,
//! - NaN inputs (missing data) stay NaN.
//!
//! Monthly grids are aggregated into annual totals with [`annual_total`].

use crate::broadcast::{broadcast_shape, map2, map3, scalar, Field, FloatValue};
use crate::environment::EnvironmentSample;
use crate::errors::PModelResult;
use crate::model::PModel;
use crate::pathway::Pathway;
use crate::soil::SoilState;
use log::{debug, warn};
use ndarray::IxDyn;
use serde::Serialize;

/// Areal fractions of C3 and C4 vegetation.
///
/// Fractions are expected in [0, 1] but are not required to sum to one.
#[derive(Debug, Clone, PartialEq)]
pub struct PathwayFractions {
    pub c3: Field,
    pub c4: Field,
}

impl PathwayFractions {
    pub fn new(c3: Field, c4: Field) -> Self {
        Self { c3, c4 }
    }

    /// Pure C3 vegetation everywhere
    pub fn c3_only() -> Self {
        Self::new(scalar(1.0), scalar(0.0))
    }

    /// Fraction for `pathway`
    pub fn fraction(&self, pathway: Pathway) -> &Field {
        match pathway {
            Pathway::C3 => &self.c3,
            Pathway::C4 => &self.c4,
        }
    }
}

/// GPP for one timestep, in the units of the supplied irradiance
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GppGrid {
    /// Blended, clipped GPP
    pub gpp: Field,
    /// Fraction-weighted, clipped C3 contribution
    pub c3_gpp: Field,
    /// Fraction-weighted, clipped C4 contribution
    pub c4_gpp: Field,
}

/// Force frozen cells to zero and clip negative values, leaving NaN untouched
fn clip_gpp(gpp: FloatValue, tc: FloatValue) -> FloatValue {
    if tc < 0.0 || gpp < 0.0 {
        0.0
    } else {
        gpp
    }
}

fn count_nan(field: &Field) -> usize {
    field.iter().filter(|v| v.is_nan()).count()
}

impl PModel {
    /// Estimate GPP for one timestep.
    ///
    /// # Arguments
    ///
    /// * `env` - Photosynthetic environment
    /// * `fapar` - Fraction of absorbed photosynthetically active radiation
    /// * `ppfd` - Photosynthetic photon flux density
    /// * `fractions` - C3 and C4 areal fractions
    /// * `soil` - Soil moisture stress state
    ///
    /// The GPP units follow those of `ppfd`: with PPFD in mol m⁻² day⁻¹ the
    /// result is in g C m⁻² day⁻¹.
    ///
    /// # Errors
    ///
    /// Any shape mismatch between the inputs.
    pub fn estimate_gpp(
        &self,
        env: &EnvironmentSample,
        fapar: &Field,
        ppfd: &Field,
        fractions: &PathwayFractions,
        soil: &SoilState,
    ) -> PModelResult<GppGrid> {
        let context = "PModel::estimate_gpp";
        let stress = soil.stress_factor(self.parameters())?;
        let apar = map2(context, fapar, ppfd, |fapar, ppfd| fapar * ppfd)?;

        let over_one = map2(context, &fractions.c3, &fractions.c4, |c3, c4| c3 + c4 > 1.0)?
            .iter()
            .filter(|&&flag| flag)
            .count();
        if over_one > 0 {
            warn!(
                "C3 and C4 fractions sum above one in {} cells; contributions are not renormalised",
                over_one
            );
        }

        let weighted_gpp = |pathway: Pathway| -> PModelResult<Field> {
            let unit = self.unit_iabs(env, pathway, &stress)?;
            let gpp = map2(context, &unit.lue.lue, &apar, |lue, apar| lue * apar)?;
            let weighted = map3(
                context,
                &gpp,
                fractions.fraction(pathway),
                env.tc(),
                |gpp, fraction, tc| clip_gpp(gpp * fraction, tc),
            )?;
            debug!(
                "{} pathway: {} of {} cells are NaN",
                pathway,
                count_nan(&weighted),
                weighted.len()
            );
            Ok(weighted)
        };

        let c3_gpp = weighted_gpp(Pathway::C3)?;
        let c4_gpp = weighted_gpp(Pathway::C4)?;
        let gpp = map3(context, &c3_gpp, &c4_gpp, env.tc(), |c3, c4, tc| {
            clip_gpp(c3 + c4, tc)
        })?;

        Ok(GppGrid {
            gpp,
            c3_gpp,
            c4_gpp,
        })
    }
}

/// Aggregate monthly mean daily values into an annual total.
///
/// NaN cells count as zero, and each month is weighted by the same
/// `month_length_days`.
pub fn annual_total(monthly: &[Field], month_length_days: FloatValue) -> PModelResult<Field> {
    let shapes: Vec<&[usize]> = monthly.iter().map(|m| m.shape()).collect();
    let shape = broadcast_shape("annual_total", &shapes)?;

    let mut total = Field::zeros(IxDyn(&shape));
    for month in monthly {
        total = map2("annual_total", &total, month, |acc, value| {
            if value.is_nan() {
                acc
            } else {
                acc + value
            }
        })?;
    }
    Ok(total.mapv_into(|v| v * month_length_days))
}
