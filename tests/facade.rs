//! The root crate exposes enough to run the model on a grid without naming
//! the member crates.

use approx::assert_relative_eq;
use pmodel::ndarray::array;
use pmodel::pmodel_core::broadcast::scalar;
use pmodel::{
    EnvironmentSample, PModel, PModelParameters, PModelSettings, PathwayFractions, SoilState,
};

#[test]
fn test_grid_run_through_facade() {
    let params = PModelParameters::default();
    let env = EnvironmentSample::new(
        array![[20.0, -3.0]].into_dyn(),
        scalar(101325.0),
        scalar(1000.0),
        scalar(400.0),
        &params,
    )
    .unwrap();
    let model = PModel::from_parameters(params, PModelSettings::default()).unwrap();
    let grid = model
        .estimate_gpp(
            &env,
            &scalar(0.8),
            &scalar(800.0),
            &PathwayFractions::c3_only(),
            &SoilState::Disabled,
        )
        .unwrap();

    assert_relative_eq!(grid.gpp[[0, 0]], 163.04095889103155, max_relative = 1e-6);
    assert_eq!(grid.gpp[[0, 1]], 0.0);
}
