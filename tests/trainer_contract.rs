//! Integration tests for the training entry point: output shapes,
//! determinism, and input validation.

use canopy_classifiers::config::ForestConfig;
use canopy_classifiers::train_and_predict;
use ndarray::Array2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Two jittered clusters per class, `n_per_class` rows each.
fn clustered_data(
    n_per_class: usize,
    n_features: usize,
    labels: &[i32],
    seed: u64,
) -> (Array2<f32>, Vec<i32>) {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut data = Vec::with_capacity(n_per_class * labels.len() * n_features);
    let mut y = Vec::with_capacity(n_per_class * labels.len());

    for (c, &label) in labels.iter().enumerate() {
        let center = c as f32 * 10.0;
        for _ in 0..n_per_class {
            for _ in 0..n_features {
                data.push(center + rng.gen::<f32>());
            }
            y.push(label);
        }
    }

    let x = Array2::from_shape_vec((n_per_class * labels.len(), n_features), data)
        .expect("synthetic data has rectangular shape");
    (x, y)
}

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn fast_config() -> ForestConfig {
    ForestConfig {
        n_trees: 25,
        seed: 42,
        max_depth: Some(6),
        n_jobs: 1,
    }
}

// ---------------------------------------------------------------------------
// Output shapes and probability invariants
// ---------------------------------------------------------------------------

#[test]
fn predictions_match_test_rows_and_probabilities_sum_to_one() {
    init_logging();
    let (train_x, train_y) = clustered_data(15, 4, &[0, 1, 2], 1);
    let (test_x, _) = clustered_data(3, 4, &[0, 1, 2], 2);

    let outcome = train_and_predict(&train_x, &train_y, &test_x, &fast_config(), None).unwrap();

    assert_eq!(outcome.predictions.len(), test_x.nrows());
    assert_eq!(outcome.probabilities.dim(), (test_x.nrows(), 3));
    assert_eq!(outcome.classes, vec![0, 1, 2]);

    for row in outcome.probabilities.rows() {
        let sum: f32 = row.iter().sum();
        assert!((sum - 1.0).abs() < 1e-5, "probability row sums to {}", sum);
    }
}

#[test]
fn binary_labels_yield_two_probability_columns() {
    let (train_x, train_y) = clustered_data(20, 3, &[-1, 1], 3);
    let (test_x, _) = clustered_data(5, 3, &[-1, 1], 4);

    let outcome = train_and_predict(&train_x, &train_y, &test_x, &fast_config(), None).unwrap();

    assert_eq!(outcome.probabilities.ncols(), 2);
    assert_eq!(outcome.classes, vec![-1, 1]);
    assert!(outcome.predictions.iter().all(|p| *p == -1 || *p == 1));
}

#[test]
fn separated_clusters_are_classified_correctly() {
    let (train_x, train_y) = clustered_data(20, 2, &[0, 1], 5);
    let (test_x, test_y) = clustered_data(6, 2, &[0, 1], 6);

    let outcome = train_and_predict(&train_x, &train_y, &test_x, &fast_config(), None).unwrap();

    assert_eq!(
        outcome.predictions, test_y,
        "widely separated clusters should be classified perfectly"
    );
}

// ---------------------------------------------------------------------------
// Determinism
// ---------------------------------------------------------------------------

#[test]
fn identical_inputs_and_seed_give_identical_outputs() {
    let (train_x, train_y) = clustered_data(15, 3, &[0, 1], 7);
    let (test_x, _) = clustered_data(8, 3, &[0, 1], 8);
    let config = fast_config();

    let first = train_and_predict(&train_x, &train_y, &test_x, &config, None).unwrap();
    let second = train_and_predict(&train_x, &train_y, &test_x, &config, None).unwrap();

    assert_eq!(first.predictions, second.predictions);
    assert_eq!(first.probabilities, second.probabilities);
}

// ---------------------------------------------------------------------------
// Input validation
// ---------------------------------------------------------------------------

#[test]
fn mismatched_label_count_is_an_error() {
    let (train_x, mut train_y) = clustered_data(10, 3, &[0, 1], 9);
    train_y.truncate(train_y.len() - 3);
    let (test_x, _) = clustered_data(2, 3, &[0, 1], 10);

    let result = train_and_predict(&train_x, &train_y, &test_x, &fast_config(), None);
    assert!(result.is_err(), "misaligned labels must not be truncated");
}

#[test]
fn mismatched_column_counts_are_an_error() {
    let (train_x, train_y) = clustered_data(10, 3, &[0, 1], 11);
    let (test_x, _) = clustered_data(2, 4, &[0, 1], 12);

    let result = train_and_predict(&train_x, &train_y, &test_x, &fast_config(), None);
    assert!(result.is_err());
}

#[test]
fn zero_trees_is_an_error() {
    let (train_x, train_y) = clustered_data(10, 3, &[0, 1], 13);
    let config = ForestConfig {
        n_trees: 0,
        ..fast_config()
    };

    let result = train_and_predict(&train_x, &train_y, &train_x, &config, None);
    assert!(result.is_err());
}

#[test]
fn empty_training_set_is_an_error() {
    let train_x = Array2::<f32>::zeros((0, 3));
    let test_x = Array2::<f32>::zeros((2, 3));

    let result = train_and_predict(&train_x, &[], &test_x, &fast_config(), None);
    assert!(result.is_err());
}
