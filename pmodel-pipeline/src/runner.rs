//! Batch runner
//!
//! Iterates the configured years and months of a [`ClimateArchive`], runs the
//! P-model driver on each month and aggregates the monthly grids into annual
//! totals.
//!
//! Every year is independent: it reads the shared archive immutably and owns
//! its output grids, so years can be simulated in parallel with rayon. Grids
//! are written to the sink only once the whole year is finished. A stop flag
//! is checked between months; a year interrupted part-way is dropped rather
//! than written.

use crate::archive::{ClimateArchive, MonthlyInputs};
use crate::config::PipelineConfig;
use crate::errors::{PipelineError, PipelineResult};
use crate::hygro::vapour_pressure_deficit;
use crate::sink::OutputSink;
use log::{debug, info, warn};
use ndarray::{Array2, Ix2};
use pmodel_core::broadcast::{map1, scalar, Field};
use pmodel_core::driver::{annual_total, PathwayFractions};
use pmodel_core::environment::EnvironmentSample;
use pmodel_core::functions::atmospheric_pressure;
use pmodel_core::model::PModel;
use pmodel_core::soil::SoilState;
use pmodel_core::PModelResult;
use rayon::prelude::*;
use std::sync::atomic::{AtomicBool, Ordering};

/// Months in a year
pub const MONTHS_PER_YEAR: usize = 12;

/// Outputs of one simulated year
#[derive(Debug, Clone, PartialEq)]
pub struct YearOutput {
    pub year: i32,
    /// Monthly mean daily GPP (g C m⁻² day⁻¹), January first
    pub monthly: Vec<Array2<f64>>,
    /// Annual total GPP (g C m⁻² yr⁻¹)
    pub annual: Array2<f64>,
}

/// Outcome of [`Pipeline::run`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Years written to the sink, in order
    pub completed: Vec<i32>,
    /// Years not simulated because the run was stopped, in order
    pub skipped: Vec<i32>,
}

/// P-model run over a climate archive
#[derive(Debug)]
pub struct Pipeline<'a> {
    archive: &'a ClimateArchive,
    config: PipelineConfig,
    model: PModel,
    patm: Field,
    fractions: PathwayFractions,
}

fn into_grid(field: Field) -> PipelineResult<Array2<f64>> {
    let shape = field.shape().to_vec();
    field.into_dimensionality::<Ix2>().map_err(|_| {
        PipelineError::Archive(format!("expected a lat × lon grid, got shape {:?}", shape))
    })
}

impl<'a> Pipeline<'a> {
    /// Prepare a run, validating the configuration against the archive.
    ///
    /// # Errors
    ///
    /// * An invalid configuration or misaligned archive layers.
    /// * `MonthOutOfRange` if the archive does not cover the configured years.
    pub fn new(archive: &'a ClimateArchive, config: PipelineConfig) -> PipelineResult<Self> {
        config.validate()?;
        archive.validate()?;
        archive.checked_month_index(config.first_year, 0, config.base_year)?;
        archive.checked_month_index(config.last_year, MONTHS_PER_YEAR - 1, config.base_year)?;

        let model = config.build_model()?;
        let patm = atmospheric_pressure(&archive.elevation.clone().into_dyn(), model.parameters());
        let fractions = PathwayFractions::new(
            archive.c3_fraction.clone().into_dyn(),
            archive.c4_fraction.clone().into_dyn(),
        );

        Ok(Self {
            archive,
            config,
            model,
            patm,
            fractions,
        })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Atmospheric pressure on the archive grid (Pa)
    pub fn patm(&self) -> &Field {
        &self.patm
    }

    fn estimate_month(&self, inputs: MonthlyInputs) -> PModelResult<Field> {
        let params = self.model.parameters();
        let factor = self.config.ppfd_per_shortwave;
        let ppfd = map1(&inputs.swin, |swin| swin * factor);
        let vpd = vapour_pressure_deficit(
            &inputs.vap,
            &inputs.tmn,
            &inputs.tmx,
            &self.patm,
            params.standard_pressure,
        )?;
        let env = EnvironmentSample::new(
            inputs.tmp,
            self.patm.clone(),
            vpd,
            scalar(inputs.co2),
            params,
        )?;
        let soil = if self.config.soil_moisture_stress {
            SoilState::Enabled {
                soil_moisture: inputs.soil_moisture,
                mean_alpha: inputs.alpha,
            }
        } else {
            SoilState::Disabled
        };

        let grid = self
            .model
            .estimate_gpp(&env, &inputs.fapar, &ppfd, &self.fractions, &soil)?;
        Ok(grid.gpp)
    }

    /// Monthly mean daily GPP (g C m⁻² day⁻¹) for `year` and zero-based `month`
    pub fn run_month(&self, year: i32, month: usize) -> PipelineResult<Array2<f64>> {
        let index = self
            .archive
            .checked_month_index(year, month, self.config.base_year)?;
        let inputs = self
            .archive
            .monthly_inputs(index, self.config.temperature_sentinel);

        let gpp = self
            .estimate_month(inputs)
            .map_err(|e| PipelineError::timestep(year, month, e))?;
        debug!(
            "{}-{:02}: {} of {} cells are NaN",
            year,
            month + 1,
            gpp.iter().filter(|v| v.is_nan()).count(),
            gpp.len()
        );
        into_grid(gpp)
    }

    /// Simulate a year, returning `None` if `stop` is raised between months
    fn simulate_year(&self, year: i32, stop: Option<&AtomicBool>) -> PipelineResult<Option<YearOutput>> {
        let mut monthly = Vec::with_capacity(MONTHS_PER_YEAR);
        for month in 0..MONTHS_PER_YEAR {
            if stop.is_some_and(|flag| flag.load(Ordering::Relaxed)) {
                return Ok(None);
            }
            monthly.push(self.run_month(year, month)?);
        }

        let fields: Vec<Field> = monthly.iter().map(|m| m.clone().into_dyn()).collect();
        let annual = annual_total(&fields, self.config.month_length_days)
            .map_err(|e| PipelineError::timestep(year, MONTHS_PER_YEAR - 1, e))?;
        info!("Simulated year {}", year);

        Ok(Some(YearOutput {
            year,
            monthly,
            annual: into_grid(annual)?,
        }))
    }

    /// Simulate all twelve months of `year` and their annual total
    pub fn run_year(&self, year: i32) -> PipelineResult<YearOutput> {
        self.simulate_year(year, None)?
            .ok_or_else(|| PipelineError::InvalidConfig(format!("year {} was not simulated", year)))
    }

    fn write_year<S: OutputSink + ?Sized>(sink: &S, output: &YearOutput) -> PipelineResult<()> {
        for (month, grid) in output.monthly.iter().enumerate() {
            sink.write_monthly(output.year, month, grid)?;
        }
        sink.write_annual(output.year, &output.annual)
    }

    /// Simulate the configured years, writing each finished year to `sink`.
    ///
    /// Raising `stop` prevents further months from starting. Years already
    /// written are complete; the others are reported as skipped.
    ///
    /// # Errors
    ///
    /// The first failed timestep or sink write.
    pub fn run<S: OutputSink + ?Sized>(&self, sink: &S, stop: &AtomicBool) -> PipelineResult<RunSummary> {
        let years: Vec<i32> = self.config.years().collect();
        info!(
            "Running P-model for {}-{} ({} years, parallel: {})",
            self.config.first_year,
            self.config.last_year,
            years.len(),
            self.config.parallel
        );

        let process = |year: i32| -> PipelineResult<(i32, bool)> {
            match self.simulate_year(year, Some(stop))? {
                Some(output) => {
                    Self::write_year(sink, &output)?;
                    Ok((year, true))
                }
                None => Ok((year, false)),
            }
        };

        let outcomes: Vec<(i32, bool)> = if self.config.parallel {
            years
                .par_iter()
                .map(|&year| process(year))
                .collect::<PipelineResult<Vec<_>>>()?
        } else {
            years
                .iter()
                .map(|&year| process(year))
                .collect::<PipelineResult<Vec<_>>>()?
        };

        let mut summary = RunSummary::default();
        for (year, completed) in outcomes {
            if completed {
                summary.completed.push(year);
            } else {
                summary.skipped.push(year);
            }
        }
        if !summary.skipped.is_empty() {
            warn!(
                "Run stopped early: {} years completed, {} skipped",
                summary.completed.len(),
                summary.skipped.len()
            );
        }
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::tests::uniform_archive;
    use crate::sink::MemorySink;
    use approx::assert_relative_eq;

    fn config(first_year: i32, last_year: i32) -> PipelineConfig {
        PipelineConfig {
            first_year,
            last_year,
            base_year: 2000,
            ..Default::default()
        }
    }

    #[test]
    fn test_new_rejects_years_outside_archive() {
        let archive = uniform_archive(2, 2, 24);
        assert!(Pipeline::new(&archive, config(2000, 2001)).is_ok());
        assert!(matches!(
            Pipeline::new(&archive, config(2000, 2002)),
            Err(PipelineError::MonthOutOfRange { .. })
        ));
    }

    #[test]
    fn test_run_month_shape_and_value() {
        let archive = uniform_archive(2, 3, 12);
        let pipeline = Pipeline::new(&archive, config(2000, 2000)).unwrap();
        let grid = pipeline.run_month(2000, 0).unwrap();
        assert_eq!(grid.dim(), (2, 3));
        assert!(grid.iter().all(|&v| v > 0.0));
        assert_relative_eq!(grid[[0, 0]], grid[[1, 2]], max_relative = 1e-12);
    }

    #[test]
    fn test_run_year_annual_is_thirty_times_monthly_sum() {
        let archive = uniform_archive(1, 2, 12);
        let pipeline = Pipeline::new(&archive, config(2000, 2000)).unwrap();
        let output = pipeline.run_year(2000).unwrap();
        assert_eq!(output.monthly.len(), 12);
        let monthly_sum: f64 = output.monthly.iter().map(|m| m[[0, 0]]).sum();
        assert_relative_eq!(output.annual[[0, 0]], monthly_sum * 30.0, max_relative = 1e-12);
    }

    #[test]
    fn test_stop_before_start_skips_every_year() {
        let archive = uniform_archive(1, 1, 36);
        let pipeline = Pipeline::new(&archive, config(2000, 2002)).unwrap();
        let sink = MemorySink::new();
        let stop = AtomicBool::new(true);

        let summary = pipeline.run(&sink, &stop).unwrap();
        assert!(summary.completed.is_empty());
        assert_eq!(summary.skipped, vec![2000, 2001, 2002]);
        assert_eq!(sink.monthly_count(), 0);
    }
}
