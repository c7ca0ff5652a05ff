//! Gridded gross primary productivity from the P-model
//!
//! Re-exports the model core and the batch pipeline:
//! - [`pmodel_core`]: P-model formulas, optimal chi, light-use efficiency
//!   closures and the per-timestep GPP driver
//! - [`pmodel_pipeline`]: configuration, climate archive contracts and the
//!   batch runner
//!
//! [`ndarray`] is re-exported so callers can build input grids without
//! matching its version themselves.

pub use ndarray;
pub use pmodel_core;
pub use pmodel_pipeline;

pub use pmodel_core::driver::{annual_total, GppGrid, PathwayFractions};
pub use pmodel_core::environment::EnvironmentSample;
pub use pmodel_core::model::{PModel, PModelSettings};
pub use pmodel_core::parameters::PModelParameters;
pub use pmodel_core::pathway::{ClosureMethod, Pathway};
pub use pmodel_core::soil::SoilState;
pub use pmodel_core::{PModelError, PModelResult};
pub use pmodel_pipeline::config::PipelineConfig;
pub use pmodel_pipeline::runner::Pipeline;
pub use pmodel_pipeline::{PipelineError, PipelineResult};
