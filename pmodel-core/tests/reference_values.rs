//! Reference value tests for the P-model formulas.
//!
//! Expected values come from an independent implementation of the same
//! equations and must agree to a relative tolerance of 1e-6:
//! - Scalar values of every physical formula at several temperatures and
//!   pressures
//! - Element-wise equivalence of gridded and scalar evaluation
//! - Shape mismatches in every multi-input formula

use approx::assert_relative_eq;
use ndarray::{array, Array};
use pmodel_core::broadcast::{scalar, Field, FloatValue};
use pmodel_core::functions::*;
use pmodel_core::optimal_chi::resolve_optimal_chi;
use pmodel_core::parameters::PModelParameters;
use pmodel_core::pathway::Pathway;
use pmodel_core::soil::soil_moisture_stress;
use pmodel_core::PModelError;

const TOLERANCE: FloatValue = 1e-6;

fn value(field: &Field) -> FloatValue {
    assert_eq!(field.len(), 1);
    field.sum()
}

/// Pressure at 1000 m elevation
const PATM_1000: FloatValue = 90241.54240716255;
/// Pressure at 2500 m elevation
const PATM_2500: FloatValue = 75474.26954974145;

mod physical_formulas {
    use super::*;

    #[test]
    fn test_atmospheric_pressure() {
        let params = PModelParameters::default();
        for (elevation, expected) in [(0.0, 101325.0), (1000.0, PATM_1000), (2500.0, PATM_2500)] {
            let patm = atmospheric_pressure(&scalar(elevation), &params);
            assert_relative_eq!(value(&patm), expected, max_relative = TOLERANCE);
        }
    }

    /// (tc, patm, density, viscosity, gammastar, kmm)
    const CASES: [(FloatValue, FloatValue, FloatValue, FloatValue, FloatValue, FloatValue); 4] = [
        (
            20.0,
            101325.0,
            998.205643453922,
            0.0010015971565904226,
            3.339250944433388,
            46.099277868343556,
        ),
        (
            10.0,
            PATM_1000,
            999.6949651629168,
            0.0013059138663607266,
            1.719030362618661,
            18.278400210188593,
        ),
        (
            30.0,
            PATM_2500,
            995.6390651978726,
            0.0007972222756211329,
            4.150317461654688,
            98.42574773892059,
        ),
        (
            -5.0,
            101325.0,
            999.2970522748885,
            0.00215342070463653,
            0.7856320297755716,
            5.532640536987413,
        ),
    ];

    #[test]
    fn test_water_properties() {
        let params = PModelParameters::default();
        for (tc, patm, density, viscosity, _, _) in CASES {
            let (tc, patm) = (scalar(tc), scalar(patm));
            assert_relative_eq!(
                value(&water_density(&tc, &patm).unwrap()),
                density,
                max_relative = TOLERANCE
            );
            assert_relative_eq!(
                value(&water_viscosity(&tc, &patm, &params).unwrap()),
                viscosity,
                max_relative = TOLERANCE
            );
        }
    }

    #[test]
    fn test_photosynthetic_constants() {
        let params = PModelParameters::default();
        for (tc, patm, _, _, gammastar, kmm) in CASES {
            let (tc, patm) = (scalar(tc), scalar(patm));
            assert_relative_eq!(
                value(&co2_compensation_point(&tc, &patm, &params).unwrap()),
                gammastar,
                max_relative = TOLERANCE
            );
            assert_relative_eq!(
                value(&michaelis_menten_constant(&tc, &patm, &params).unwrap()),
                kmm,
                max_relative = TOLERANCE
            );
        }
    }

    #[test]
    fn test_viscosity_ratio() {
        let params = PModelParameters::default();
        for (tc, patm, expected) in [
            (20.0, 101325.0, 1.1253613870908417),
            (10.0, PATM_1000, 1.4672815616526722),
            (30.0, PATM_2500, 0.8957325407819496),
        ] {
            let ns = viscosity_ratio(&scalar(tc), &scalar(patm), &params).unwrap();
            assert_relative_eq!(value(&ns), expected, max_relative = TOLERANCE);
        }
    }

    #[test]
    fn test_co2_to_ca() {
        let ca = co2_to_ca(&scalar(400.0), &scalar(PATM_1000)).unwrap();
        assert_relative_eq!(value(&ca), 36.09661696286501, max_relative = TOLERANCE);
    }

    #[test]
    fn test_temperature_responses() {
        let params = PModelParameters::default();
        // (tc, arrhenius at 65330 J/mol, vcmax scaling, rd scaling)
        let cases = [
            (20.0, 0.6379522506583025, 0.6370757237016323, 0.6746913175768723),
            (10.0, 0.24756067109138466, 0.2609756329634171, 0.28493334592888403),
            (30.0, 1.5444447594135533, 1.5427221126407435, 1.4455646406287255),
            (-5.0, 0.05242395862579263, 0.09610217870455755, 0.06482914553295596),
        ];
        for (tc, arrhenius, fvcmax, frd) in cases {
            let tk = scalar(tc + params.kelvin_offset);
            assert_relative_eq!(
                value(&temperature_response_arrhenius(&tk, 65330.0, &params)),
                arrhenius,
                max_relative = TOLERANCE
            );
            assert_relative_eq!(
                value(&instantaneous_vcmax_scaling(&scalar(tc), &params)),
                fvcmax,
                max_relative = TOLERANCE
            );
            assert_relative_eq!(
                value(&instantaneous_rd_scaling(&scalar(tc), &params)),
                frd,
                max_relative = TOLERANCE
            );
        }
    }

    #[test]
    fn test_quantum_yield_scaling_is_not_clipped() {
        let params = PModelParameters::default();
        let c4_cold = quantum_yield_temperature_scaling(&scalar(-5.0), Pathway::C4, &params);
        assert_relative_eq!(value(&c4_cold), -0.0282, max_relative = TOLERANCE);
    }
}

mod optimal_chi_and_soil {
    use super::*;

    #[test]
    fn test_c3_optimal_chi_at_altitude() {
        let optchi = resolve_optimal_chi(
            &scalar(18.278400210188593),
            &scalar(1.719030362618661),
            &scalar(1.4672815616526722),
            &scalar(380.0 * 1e-6 * PATM_1000),
            &scalar(500.0),
            Pathway::C3,
            &PModelParameters::default(),
        )
        .unwrap();
        assert_relative_eq!(value(&optchi.chi), 0.631420181481826, max_relative = TOLERANCE);
        assert_relative_eq!(value(&optchi.mj), 0.7944611187058486, max_relative = TOLERANCE);
        assert_relative_eq!(value(&optchi.mc), 0.4991994284893747, max_relative = TOLERANCE);
        assert_relative_eq!(value(&optchi.mjoc), 1.5914704091508358, max_relative = TOLERANCE);
    }

    #[test]
    fn test_c4_optimal_chi_ignores_inputs() {
        let params = PModelParameters::default();
        let shapes: [Vec<usize>; 3] = [vec![], vec![7], vec![2, 3, 4]];
        for shape in shapes {
            let input = Array::from_elem(shape, 12.5).into_dyn();
            let optchi =
                resolve_optimal_chi(&input, &input, &input, &input, &input, Pathway::C4, &params)
                    .unwrap();
            assert_eq!(optchi.chi, scalar(1.0));
            assert_eq!(optchi.mj, scalar(1.0));
            assert_eq!(optchi.mc, scalar(1.0));
            assert_eq!(optchi.mjoc, scalar(1.0));
        }
    }

    #[test]
    fn test_saturated_soil_is_unstressed() {
        let params = PModelParameters::default();
        let alpha = array![0.0, 0.25, 0.5, 0.75, 1.0].into_dyn();
        let stress = soil_moisture_stress(&scalar(1.0), &alpha, &params).unwrap();
        assert!(stress.iter().all(|&s| s == 1.0));
    }
}

mod broadcasting {
    use super::*;

    #[test]
    fn test_grid_matches_elementwise_scalar() {
        let params = PModelParameters::default();
        let tc = array![[-5.0, 0.0, 10.0], [20.0, 25.0, 35.0]].into_dyn();
        let patm = array![101325.0, PATM_1000, PATM_2500].into_dyn();

        let gammastar = co2_compensation_point(&tc, &patm, &params).unwrap();
        let kmm = michaelis_menten_constant(&tc, &patm, &params).unwrap();
        let ns = viscosity_ratio(&tc, &patm, &params).unwrap();
        assert_eq!(gammastar.shape(), &[2, 3]);

        for i in 0..2 {
            for j in 0..3 {
                let t = scalar(tc[[i, j]]);
                let p = scalar(patm[[j]]);
                assert_eq!(
                    gammastar[[i, j]],
                    value(&co2_compensation_point(&t, &p, &params).unwrap())
                );
                assert_eq!(
                    kmm[[i, j]],
                    value(&michaelis_menten_constant(&t, &p, &params).unwrap())
                );
                assert_eq!(ns[[i, j]], value(&viscosity_ratio(&t, &p, &params).unwrap()));
            }
        }
    }

    #[test]
    fn test_optimal_chi_grid_matches_scalar() {
        let params = PModelParameters::default();
        let vpd = array![[200.0, 800.0], [1500.0, 3000.0]].into_dyn();
        let grid = resolve_optimal_chi(
            &scalar(46.1),
            &scalar(3.34),
            &scalar(1.12),
            &scalar(40.53),
            &vpd,
            Pathway::C3,
            &params,
        )
        .unwrap();
        for ((idx, &d), &chi) in vpd.indexed_iter().zip(grid.chi.iter()) {
            let single = resolve_optimal_chi(
                &scalar(46.1),
                &scalar(3.34),
                &scalar(1.12),
                &scalar(40.53),
                &scalar(d),
                Pathway::C3,
                &params,
            )
            .unwrap();
            assert_eq!(chi, value(&single.chi), "chi differs at {:?}", idx);
        }
    }

    #[test]
    fn test_every_multi_input_formula_rejects_mismatched_shapes() {
        let params = PModelParameters::default();
        let a = Array::from_elem((3, 4), 15.0).into_dyn();
        let b = Array::from_elem((5,), 15.0).into_dyn();

        let results = vec![
            water_density(&a, &b),
            water_viscosity(&a, &b, &params),
            viscosity_ratio(&a, &b, &params),
            co2_compensation_point(&a, &b, &params),
            michaelis_menten_constant(&a, &b, &params),
            co2_to_ca(&a, &b),
            soil_moisture_stress(&a, &b, &params),
        ];
        for result in results {
            assert!(matches!(result, Err(PModelError::ShapeMismatch { .. })));
        }

        for pathway in Pathway::ALL {
            let result = resolve_optimal_chi(&a, &a, &a, &a, &b, pathway, &params);
            assert!(matches!(result, Err(PModelError::ShapeMismatch { .. })));
        }
    }
}
