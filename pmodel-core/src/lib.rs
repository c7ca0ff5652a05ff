//! Core of the P-model light-use efficiency model of gross primary productivity
//!
//! This crate holds the model itself and performs no I/O. Every quantity may be
//! a scalar or a grid ([`broadcast::Field`]), and all formulas broadcast their
//! inputs with explicit shape checking.
//!
//! # Module Organisation
//!
//! Modules are listed leaves first:
//! - `functions`: physical constants and temperature responses
//! - `environment`: drivers of a timestep plus their derived quantities
//! - `optimal_chi`: least-cost ratio of internal to ambient CO2 (C3 and C4)
//! - `soil`: empirical soil moisture stress
//! - `lue`: light-use efficiency and Vcmax closures
//! - `model`: a configured P-model and its per-pathway outputs
//! - `driver`: blended, clipped GPP per timestep and annual aggregation
//!
//! # Example
//!
//! ```rust
//! use pmodel_core::broadcast::scalar;
//! use pmodel_core::driver::PathwayFractions;
//! use pmodel_core::environment::EnvironmentSample;
//! use pmodel_core::model::{PModel, PModelSettings};
//! use pmodel_core::parameters::PModelParameters;
//! use pmodel_core::soil::SoilState;
//!
//! let params = PModelParameters::default();
//! let env = EnvironmentSample::new(
//!     scalar(20.0),
//!     scalar(101325.0),
//!     scalar(1000.0),
//!     scalar(400.0),
//!     &params,
//! )
//! .unwrap();
//! let model = PModel::from_parameters(params, PModelSettings::default()).unwrap();
//! let grid = model
//!     .estimate_gpp(
//!         &env,
//!         &scalar(0.8),
//!         &scalar(800.0),
//!         &PathwayFractions::c3_only(),
//!         &SoilState::Disabled,
//!     )
//!     .unwrap();
//! assert!(grid.gpp.sum() > 0.0);
//! ```

pub mod broadcast;
pub mod driver;
pub mod environment;
pub mod functions;
pub mod lue;
pub mod model;
pub mod optimal_chi;
pub mod parameters;
pub mod pathway;
pub mod soil;

pub mod errors;

pub use errors::{PModelError, PModelResult};
