use anyhow::{bail, Result};
use ndarray::Array2;

use crate::config::{ForestConfig, TrackingConfig};
use crate::models::ForestClassifier;
use crate::tracking::{self, FsTrackingStore};

/// Everything a training call produces.
#[derive(Debug, Clone)]
pub struct TrainOutcome {
    /// Hard class label per test row.
    pub predictions: Vec<i32>,
    /// Per-class probabilities, shape (test rows, distinct training labels);
    /// column `j` refers to `classes[j]` and each row sums to 1.
    pub probabilities: Array2<f32>,
    /// Distinct training labels, ascending.
    pub classes: Vec<i32>,
}

/// Train a random forest and predict the held-out feature set.
///
/// One synchronous pass: fit, predict, optionally record. When `tracking`
/// is given, the run is recorded into a filesystem store at its configured
/// root before this function returns; a recorder failure fails the whole
/// call (nothing here retries or falls back).
pub fn train_and_predict(
    train_features: &Array2<f32>,
    train_labels: &[i32],
    test_features: &Array2<f32>,
    config: &ForestConfig,
    tracking: Option<&TrackingConfig>,
) -> Result<TrainOutcome> {
    if train_features.ncols() != test_features.ncols() {
        bail!(
            "train and test features disagree on column count: {} vs {}",
            train_features.ncols(),
            test_features.ncols()
        );
    }

    let mut classifier = ForestClassifier::new(config.clone());
    classifier.fit(train_features, train_labels)?;
    log::info!(
        "trained random forest: {} trees on {} samples",
        config.n_trees,
        train_features.nrows()
    );

    let predictions = classifier.predict(test_features)?;
    let probabilities = classifier.predict_proba(test_features)?;

    if let Some(tracking_config) = tracking {
        log::info!(
            "recording run into tracking store at {}",
            tracking_config.root.display()
        );
        let mut store = FsTrackingStore::open(&tracking_config.root)?;
        tracking::record(&mut store, &classifier, train_features, tracking_config)?;
    }

    Ok(TrainOutcome {
        predictions,
        probabilities,
        classes: classifier.classes().to_vec(),
    })
}
