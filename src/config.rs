use std::path::PathBuf;

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

/// Experiment label used when none is configured. Registered model names are
/// derived from it, so changing it changes the registry namespace.
pub const DEFAULT_EXPERIMENT: &str = "Random_Forest_Experiment";

/// Hyperparameters for the random-forest classifier.
///
/// Every knob here is forwarded to (or recorded alongside) the external
/// forest implementation and logged one-per-key by the tracking recorder.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct ForestConfig {
    /// Number of trees in the forest.
    pub n_trees: usize,
    /// Seed for bootstrap sampling and any other internal randomness.
    pub seed: u64,
    /// Maximum depth of each tree. `None` leaves depth unbounded.
    pub max_depth: Option<usize>,
    /// Worker parallelism requested from the training backend. `0` means
    /// "use all available cores".
    pub n_jobs: usize,
}

impl Default for ForestConfig {
    fn default() -> Self {
        Self {
            n_trees: 1000,
            seed: 42,
            max_depth: None,
            n_jobs: 1,
        }
    }
}

impl ForestConfig {
    /// Check the configuration before training starts.
    pub fn validate(&self) -> Result<()> {
        if self.n_trees == 0 {
            bail!("n_trees must be greater than zero");
        }
        if self.max_depth == Some(0) {
            bail!("max_depth must be either None (unbounded) or a positive integer");
        }
        Ok(())
    }
}

/// Where and under which labels a training run is recorded.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct TrackingConfig {
    /// Experiment label. Run records live under it and registered model
    /// names are prefixed with it.
    pub experiment: String,
    /// Root directory of the filesystem tracking store.
    pub root: PathBuf,
    /// Optional uniqueness tag. When set it is appended to the registered
    /// model name and to the local training-sample file name, so same-day
    /// invocations do not collide. When unset, same-day registrations under
    /// the same experiment stack up as successive registry versions.
    pub run_tag: Option<String>,
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            experiment: DEFAULT_EXPERIMENT.to_string(),
            root: PathBuf::from("./canopy-tracking"),
            run_tag: None,
        }
    }
}
