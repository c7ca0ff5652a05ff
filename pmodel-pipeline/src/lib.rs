//! Batch P-model runs over monthly gridded climate archives
//!
//! This crate wraps [`pmodel_core`] with what a multi-decade global run needs:
//! - `config`: TOML run configuration and dataset conventions
//! - `archive`: in-memory climate layers, fill-value masking and the monthly time index
//! - `hygro`: vapour pressure deficit from vapour pressure and temperature extremes
//! - `sink`: destination for finished monthly and annual grids
//! - `runner`: year and month iteration, annual totals, parallel years and stopping
//!
//! Reading archives from disk and writing output files are left to the caller.

pub mod archive;
pub mod config;
pub mod hygro;
pub mod runner;
pub mod sink;

pub mod errors;

pub use errors::{PipelineError, PipelineResult};
