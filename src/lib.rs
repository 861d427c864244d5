//! canopy-classifiers: random-forest training with experiment tracking.
//!
//! This crate is a thin orchestration layer around an external random-forest
//! implementation (`aprender`) and a tracking/model-registry store. It exposes
//! a single training entry point, [`trainer::train_and_predict`], which fits a
//! forest, returns hard predictions and per-class probabilities for a held-out
//! feature set, and optionally records the run (hyperparameters, a sample of
//! the training data, the serialized model) into a tracking backend before
//! returning.
//!
//! The tracking backend sits behind the [`tracking::TrackingBackend`] seam; a
//! filesystem-backed implementation ships as [`tracking::FsTrackingStore`].
pub mod config;
pub mod error;
pub mod models;
pub mod tracking;
pub mod trainer;

pub use trainer::{train_and_predict, TrainOutcome};
