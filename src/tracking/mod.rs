//! Experiment tracking and model registry.
//!
//! The store itself is a collaborator behind [`TrackingBackend`]; run
//! records, artifacts, and registered versions are owned by whichever
//! backend is plugged in. [`FsTrackingStore`] is the bundled
//! filesystem-backed implementation.

pub mod backend;
pub mod fs_store;
pub mod recorder;

pub use backend::{TrackingBackend, TrackingRun};
pub use fs_store::FsTrackingStore;
pub use recorder::record;
