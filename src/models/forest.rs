use anyhow::{anyhow, bail, Context, Result};
use aprender::primitives::Matrix;
use aprender::tree::RandomForestClassifier;
use ndarray::Array2;

use crate::config::ForestConfig;

/// Random-forest classifier wrapper.
///
/// Tree construction, bagging, and vote aggregation are owned entirely by
/// `aprender`; this type maps between the crate's `ndarray`/`i32` surface
/// and the library's matrix/index-label types, and exposes the fitted state
/// the tracking recorder needs (hyperparameters, serialized model bytes).
pub struct ForestClassifier {
    config: ForestConfig,
    model: Option<RandomForestClassifier>,
    /// Distinct training labels, ascending. Probability column `j` always
    /// refers to `classes[j]`.
    classes: Vec<i32>,
    n_features: usize,
}

impl ForestClassifier {
    pub fn new(config: ForestConfig) -> Self {
        ForestClassifier {
            config,
            model: None,
            classes: Vec::new(),
            n_features: 0,
        }
    }

    /// Fit the forest on labeled feature rows.
    ///
    /// `y` must hold one label per row of `x`; a mismatch is a validation
    /// error, never a silent truncation.
    pub fn fit(&mut self, x: &Array2<f32>, y: &[i32]) -> Result<()> {
        self.config.validate()?;

        let (n_rows, n_cols) = x.dim();
        if n_rows != y.len() {
            bail!(
                "training features and labels are misaligned: {} feature rows vs {} labels",
                n_rows,
                y.len()
            );
        }
        if n_rows == 0 || n_cols == 0 {
            bail!("training data must contain at least one row and one feature column");
        }

        let mut classes: Vec<i32> = y.to_vec();
        classes.sort_unstable();
        classes.dedup();

        // aprender expects class indices 0..k, so train on positions in the
        // sorted class table and translate back on prediction.
        let mut targets = Vec::with_capacity(y.len());
        for &label in y {
            let index = classes
                .binary_search(&label)
                .map_err(|_| anyhow!("label {} missing from class table", label))?;
            targets.push(index);
        }

        let mut model = RandomForestClassifier::new(self.config.n_trees)
            .with_random_state(self.config.seed);
        if let Some(depth) = self.config.max_depth {
            model = model.with_max_depth(depth);
        }

        log::debug!(
            "fitting random forest: {} trees, {} samples, {} features, {} classes",
            self.config.n_trees,
            n_rows,
            n_cols,
            classes.len()
        );
        model
            .fit(&to_matrix(x)?, &targets)
            .context("random forest training failed")?;

        self.model = Some(model);
        self.classes = classes;
        self.n_features = n_cols;
        Ok(())
    }

    /// Predict a hard class label for every row of `x`.
    ///
    /// Labels are the argmax of the probability rows; on a vote tie the
    /// lowest class wins, which keeps predictions deterministic for a fixed
    /// seed.
    pub fn predict(&self, x: &Array2<f32>) -> Result<Vec<i32>> {
        let proba = self.predict_proba(x)?;
        let mut predictions = Vec::with_capacity(proba.nrows());
        for row in proba.rows() {
            let mut best = 0;
            for (j, &p) in row.iter().enumerate() {
                if p > row[best] {
                    best = j;
                }
            }
            predictions.push(self.classes[best]);
        }
        Ok(predictions)
    }

    /// Predict per-class probabilities for every row of `x`.
    ///
    /// The result has one column per class seen during fitting, ordered as
    /// [`classes`](Self::classes); each row sums to 1.
    pub fn predict_proba(&self, x: &Array2<f32>) -> Result<Array2<f32>> {
        let model = self
            .model
            .as_ref()
            .ok_or_else(|| anyhow!("classifier has not been fitted"))?;

        let (n_rows, n_cols) = x.dim();
        if n_cols != self.n_features {
            bail!(
                "feature count mismatch: model was fitted on {} columns, got {}",
                self.n_features,
                n_cols
            );
        }

        let proba = model.predict_proba(&to_matrix(x)?);
        let (p_rows, p_cols) = proba.shape();
        if p_rows != n_rows || p_cols != self.classes.len() {
            bail!(
                "backend returned probabilities of shape ({}, {}), expected ({}, {})",
                p_rows,
                p_cols,
                n_rows,
                self.classes.len()
            );
        }

        let mut data = Vec::with_capacity(p_rows * p_cols);
        for i in 0..p_rows {
            for j in 0..p_cols {
                data.push(proba.get(i, j));
            }
        }
        Array2::from_shape_vec((p_rows, p_cols), data)
            .context("failed to shape probability matrix")
    }

    /// Distinct training labels, ascending.
    pub fn classes(&self) -> &[i32] {
        &self.classes
    }

    pub fn is_fitted(&self) -> bool {
        self.model.is_some()
    }

    /// Hyperparameters as key/value pairs, one per configuration knob.
    /// The tracking recorder logs each pair as a run parameter.
    pub fn params(&self) -> Vec<(String, String)> {
        let max_depth = match self.config.max_depth {
            Some(depth) => depth.to_string(),
            None => "None".to_string(),
        };
        vec![
            ("n_trees".to_string(), self.config.n_trees.to_string()),
            ("seed".to_string(), self.config.seed.to_string()),
            ("max_depth".to_string(), max_depth),
            ("n_jobs".to_string(), self.config.n_jobs.to_string()),
        ]
    }

    /// Serialize the fitted model for artifact storage.
    pub fn model_bytes(&self) -> Result<Vec<u8>> {
        let model = self
            .model
            .as_ref()
            .ok_or_else(|| anyhow!("classifier has not been fitted"))?;
        bincode::serialize(model).context("failed to serialize fitted model")
    }
}

fn to_matrix(x: &Array2<f32>) -> Result<Matrix<f32>> {
    let (rows, cols) = x.dim();
    Matrix::from_vec(rows, cols, x.iter().copied().collect()).map_err(|e| anyhow!(e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ForestConfig;

    fn small_config() -> ForestConfig {
        ForestConfig {
            n_trees: 15,
            seed: 7,
            max_depth: Some(4),
            n_jobs: 1,
        }
    }

    fn two_cluster_data() -> (Array2<f32>, Vec<i32>) {
        // Two well-separated clusters in 2D.
        let x = Array2::from_shape_vec(
            (10, 2),
            vec![
                0.0, 0.1, 0.2, 0.0, 0.1, 0.3, 0.3, 0.2, 0.0, 0.0, //
                5.0, 5.1, 5.2, 5.0, 5.1, 5.3, 5.3, 5.2, 5.0, 5.0,
            ],
        )
        .unwrap();
        let y = vec![0, 0, 0, 0, 0, 1, 1, 1, 1, 1];
        (x, y)
    }

    #[test]
    fn fit_and_predict_separable_clusters() {
        let (x, y) = two_cluster_data();
        let mut clf = ForestClassifier::new(small_config());
        clf.fit(&x, &y).unwrap();
        assert!(clf.is_fitted());

        let predictions = clf.predict(&x).unwrap();
        assert_eq!(predictions, y, "separable clusters should be recovered");

        let proba = clf.predict_proba(&x).unwrap();
        assert_eq!(proba.dim(), (10, 2));
        for row in proba.rows() {
            let sum: f32 = row.iter().sum();
            assert!((sum - 1.0).abs() < 1e-5, "row sums to {}", sum);
        }
    }

    #[test]
    fn non_contiguous_labels_round_trip() {
        let (x, y) = two_cluster_data();
        let y: Vec<i32> = y.iter().map(|&v| if v == 0 { -3 } else { 9 }).collect();
        let mut clf = ForestClassifier::new(small_config());
        clf.fit(&x, &y).unwrap();

        assert_eq!(clf.classes(), &[-3, 9]);
        let predictions = clf.predict(&x).unwrap();
        assert!(predictions.iter().all(|p| *p == -3 || *p == 9));
    }

    #[test]
    fn misaligned_labels_are_rejected() {
        let (x, mut y) = two_cluster_data();
        y.pop();
        let mut clf = ForestClassifier::new(small_config());
        let err = clf.fit(&x, &y).unwrap_err();
        assert!(
            err.to_string().contains("misaligned"),
            "unexpected error: {}",
            err
        );
    }

    #[test]
    fn unfitted_classifier_refuses_to_predict() {
        let (x, _) = two_cluster_data();
        let clf = ForestClassifier::new(small_config());
        assert!(clf.predict(&x).is_err());
        assert!(clf.predict_proba(&x).is_err());
        assert!(clf.model_bytes().is_err());
    }

    #[test]
    fn feature_count_mismatch_is_rejected() {
        let (x, y) = two_cluster_data();
        let mut clf = ForestClassifier::new(small_config());
        clf.fit(&x, &y).unwrap();

        let wrong = Array2::from_shape_vec((2, 3), vec![0.0; 6]).unwrap();
        assert!(clf.predict_proba(&wrong).is_err());
    }

    #[test]
    fn params_cover_every_knob() {
        let clf = ForestClassifier::new(small_config());
        let params = clf.params();
        let keys: Vec<&str> = params.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, ["n_trees", "seed", "max_depth", "n_jobs"]);
        assert_eq!(params[2].1, "4");

        let unbounded = ForestClassifier::new(ForestConfig::default());
        assert_eq!(unbounded.params()[2].1, "None");
    }

    #[test]
    fn model_bytes_non_empty_after_fit() {
        let (x, y) = two_cluster_data();
        let mut clf = ForestClassifier::new(small_config());
        clf.fit(&x, &y).unwrap();
        let bytes = clf.model_bytes().unwrap();
        assert!(!bytes.is_empty());
    }
}
