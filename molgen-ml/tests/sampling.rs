mod common;

use common::{MAX_ATOMS, PeriodicValidator, StubModel, dataset};
use molgen_core::FixStrategy;
use molgen_ml::MlError;
use molgen_ml::sampling::{ResampleOptions, resample_invalid, sample_with_fix};
use rand::SeedableRng;
use rand::rngs::StdRng;

fn options(count: usize, max_attempts: usize) -> ResampleOptions {
    ResampleOptions {
        count,
        fix: FixStrategy::Mirror,
        canonical: true,
        max_attempts,
    }
}

#[test]
fn test_all_valid_fills_in_one_draw() {
    let model = StubModel::new(0.0);
    let validator = PeriodicValidator::all();
    let mut rng = StdRng::seed_from_u64(42);

    let resampled =
        resample_invalid(&model, &validator, &dataset(), options(25, 10), &mut rng).unwrap();

    assert_eq!(resampled.batch.len(), 25);
    assert_eq!(resampled.batch.max_atoms(), MAX_ATOMS);
    assert_eq!(resampled.attempts, 1);
    assert_eq!(resampled.drawn, 25);
}

#[test]
fn test_none_valid_exhausts_budget() {
    let model = StubModel::new(0.0);
    let validator = PeriodicValidator::none();
    let mut rng = StdRng::seed_from_u64(42);

    let err =
        resample_invalid(&model, &validator, &dataset(), options(10, 5), &mut rng).unwrap_err();

    match err {
        MlError::ResampleBudgetExceeded {
            requested,
            obtained,
            attempts,
        } => {
            assert_eq!(requested, 10);
            assert_eq!(obtained, 0);
            assert_eq!(attempts, 5);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_partial_validity_draws_only_missing() {
    let model = StubModel::new(0.0);
    // Every second graph is valid: 8 -> 4 kept, then 4 -> 2, 2 -> 1, 1 -> 1.
    let validator = PeriodicValidator::every(2);
    let mut rng = StdRng::seed_from_u64(9);

    let resampled =
        resample_invalid(&model, &validator, &dataset(), options(8, 10), &mut rng).unwrap();

    assert_eq!(resampled.batch.len(), 8);
    assert_eq!(resampled.attempts, 4);
    assert_eq!(resampled.drawn, 15);
}

#[test]
fn test_sample_with_fix_repairs_structure() {
    let model = StubModel::new(0.0);
    let info = dataset();
    let mut rng = StdRng::seed_from_u64(3);

    let batch = sample_with_fix(&model, 16, FixStrategy::Random, &info, &mut rng).unwrap();
    assert_eq!(batch.len(), 16);

    for graph in batch.samples() {
        for i in 0..MAX_ATOMS {
            assert_eq!(graph.edges[[i, i]], info.no_bond);
            for j in 0..MAX_ATOMS {
                assert_eq!(graph.edges[[i, j]], graph.edges[[j, i]]);
                if graph.nodes[i] == info.empty_atom {
                    assert_eq!(graph.edges[[i, j]], info.no_bond);
                }
            }
        }
    }
}
