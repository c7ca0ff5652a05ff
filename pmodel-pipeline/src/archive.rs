//! In-memory climate archive
//!
//! The batch run reads its inputs from a [`ClimateArchive`]: static
//! lat × lon maps, a monthly CO2 series and monthly lat × lon × time cubes.
//! Reading these from disk is left to the caller. The archive checks that
//! every layer lines up and hands out monthly slices with fill values
//! already masked.
//!
//! Monthly layers share one time axis, where index 0 is January of the base
//! year:
//!
//! $$i = (y - y_0) \times 12 + m, \quad m \in [0, 11]$$

use crate::errors::{PipelineError, PipelineResult};
use ndarray::{Array1, Array2, Array3, Axis};
use pmodel_core::broadcast::{Field, FloatValue};
use std::fmt;

/// Monthly climate layers held in the archive
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ClimateVariable {
    /// Mean air temperature (°C)
    MeanTemperature,
    /// Daily minimum air temperature (°C)
    MinTemperature,
    /// Daily maximum air temperature (°C)
    MaxTemperature,
    /// Vapour pressure at sea level (hPa)
    VapourPressure,
    /// Downwelling shortwave radiation (kJ m⁻² day⁻¹)
    Shortwave,
    /// Fraction of absorbed photosynthetically active radiation
    Fapar,
    /// Relative soil moisture
    SoilMoisture,
    /// Long-run ratio of actual to equilibrium evapotranspiration
    Alpha,
}

impl ClimateVariable {
    pub const ALL: [ClimateVariable; 8] = [
        ClimateVariable::MeanTemperature,
        ClimateVariable::MinTemperature,
        ClimateVariable::MaxTemperature,
        ClimateVariable::VapourPressure,
        ClimateVariable::Shortwave,
        ClimateVariable::Fapar,
        ClimateVariable::SoilMoisture,
        ClimateVariable::Alpha,
    ];

    /// Whether fill values below the temperature sentinel apply to this layer
    pub fn is_temperature(&self) -> bool {
        matches!(
            self,
            ClimateVariable::MeanTemperature
                | ClimateVariable::MinTemperature
                | ClimateVariable::MaxTemperature
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ClimateVariable::MeanTemperature => "tmp",
            ClimateVariable::MinTemperature => "tmn",
            ClimateVariable::MaxTemperature => "tmx",
            ClimateVariable::VapourPressure => "vap",
            ClimateVariable::Shortwave => "swin",
            ClimateVariable::Fapar => "fapar",
            ClimateVariable::SoilMoisture => "soil_moisture",
            ClimateVariable::Alpha => "alpha",
        }
    }
}

impl fmt::Display for ClimateVariable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Static maps and monthly climate cubes
#[derive(Debug, Clone, PartialEq)]
pub struct ClimateArchive {
    /// Elevation above sea level (m)
    pub elevation: Array2<FloatValue>,
    /// C3 vegetation fraction
    pub c3_fraction: Array2<FloatValue>,
    /// C4 vegetation fraction
    pub c4_fraction: Array2<FloatValue>,
    /// Atmospheric CO2 (ppm) per time index
    pub co2: Array1<FloatValue>,

    pub tmp: Array3<FloatValue>,
    pub tmn: Array3<FloatValue>,
    pub tmx: Array3<FloatValue>,
    pub vap: Array3<FloatValue>,
    pub swin: Array3<FloatValue>,
    pub fapar: Array3<FloatValue>,
    pub soil_moisture: Array3<FloatValue>,
    pub alpha: Array3<FloatValue>,
}

/// Inputs of one month, as fields ready for the model
#[derive(Debug, Clone, PartialEq)]
pub struct MonthlyInputs {
    pub tmp: Field,
    pub tmn: Field,
    pub tmx: Field,
    pub vap: Field,
    pub swin: Field,
    pub fapar: Field,
    pub soil_moisture: Field,
    pub alpha: Field,
    pub co2: FloatValue,
}

/// Time index of (`year`, zero-based `month`) relative to `base_year`, which may be negative
pub fn month_index(year: i32, month: usize, base_year: i32) -> i64 {
    (year as i64 - base_year as i64) * 12 + month as i64
}

impl ClimateArchive {
    pub fn cube(&self, variable: ClimateVariable) -> &Array3<FloatValue> {
        match variable {
            ClimateVariable::MeanTemperature => &self.tmp,
            ClimateVariable::MinTemperature => &self.tmn,
            ClimateVariable::MaxTemperature => &self.tmx,
            ClimateVariable::VapourPressure => &self.vap,
            ClimateVariable::Shortwave => &self.swin,
            ClimateVariable::Fapar => &self.fapar,
            ClimateVariable::SoilMoisture => &self.soil_moisture,
            ClimateVariable::Alpha => &self.alpha,
        }
    }

    /// Shape of the spatial grid (lat, lon)
    pub fn grid_shape(&self) -> (usize, usize) {
        self.elevation.dim()
    }

    /// Number of months available in every monthly layer
    pub fn months_available(&self) -> usize {
        ClimateVariable::ALL
            .iter()
            .map(|&v| self.cube(v).len_of(Axis(2)))
            .chain(std::iter::once(self.co2.len()))
            .min()
            .unwrap_or(0)
    }

    /// Check that every layer is on the elevation grid
    pub fn validate(&self) -> PipelineResult<()> {
        let grid = self.grid_shape();
        for (name, map) in [("c3_fraction", &self.c3_fraction), ("c4_fraction", &self.c4_fraction)] {
            if map.dim() != grid {
                return Err(PipelineError::Archive(format!(
                    "{} has shape {:?} but the elevation grid is {:?}",
                    name,
                    map.dim(),
                    grid
                )));
            }
        }
        for variable in ClimateVariable::ALL {
            let (lat, lon, _) = self.cube(variable).dim();
            if (lat, lon) != grid {
                return Err(PipelineError::Archive(format!(
                    "{} has a {:?} grid but the elevation grid is {:?}",
                    variable,
                    (lat, lon),
                    grid
                )));
            }
        }
        Ok(())
    }

    /// Resolve the time index of a month and check it is in the archive
    pub fn checked_month_index(
        &self,
        year: i32,
        month: usize,
        base_year: i32,
    ) -> PipelineResult<usize> {
        let index = month_index(year, month, base_year);
        let available = self.months_available();
        if month > 11 || index < 0 || index >= available as i64 {
            return Err(PipelineError::MonthOutOfRange {
                year,
                month: month + 1,
                index,
                available,
            });
        }
        Ok(index as usize)
    }

    /// One month of `variable`.
    ///
    /// Temperature layers have values at or below `temperature_sentinel`
    /// replaced by NaN.
    pub fn month_slice(
        &self,
        variable: ClimateVariable,
        index: usize,
        temperature_sentinel: FloatValue,
    ) -> Field {
        let slice = self.cube(variable).index_axis(Axis(2), index).to_owned();
        let slice = if variable.is_temperature() {
            slice.mapv_into(|v| if v <= temperature_sentinel { FloatValue::NAN } else { v })
        } else {
            slice
        };
        slice.into_dyn()
    }

    /// Every input of the month at `index`
    pub fn monthly_inputs(&self, index: usize, temperature_sentinel: FloatValue) -> MonthlyInputs {
        let slice = |variable| self.month_slice(variable, index, temperature_sentinel);
        MonthlyInputs {
            tmp: slice(ClimateVariable::MeanTemperature),
            tmn: slice(ClimateVariable::MinTemperature),
            tmx: slice(ClimateVariable::MaxTemperature),
            vap: slice(ClimateVariable::VapourPressure),
            swin: slice(ClimateVariable::Shortwave),
            fapar: slice(ClimateVariable::Fapar),
            soil_moisture: slice(ClimateVariable::SoilMoisture),
            alpha: slice(ClimateVariable::Alpha),
            co2: self.co2[index],
        }
    }
}
