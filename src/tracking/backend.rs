use std::path::Path;

use crate::error::TrackingError;

/// A tracking run in progress.
///
/// Dropping the handle closes the run, so a run opened by
/// [`TrackingBackend::start_run`] is finalized on every exit path of the
/// recording block, including early returns on error.
pub trait TrackingRun {
    /// Unique run identifier, usable in `runs:/<id>/<name>` artifact URIs.
    fn run_id(&self) -> &str;

    /// Log a single hyperparameter as a key/value pair.
    fn log_param(&mut self, key: &str, value: &str) -> Result<(), TrackingError>;

    /// Attach a local file to the run as an artifact.
    fn log_artifact(&mut self, path: &Path) -> Result<(), TrackingError>;

    /// Attach serialized model bytes to the run under `name`.
    fn log_model(&mut self, name: &str, bytes: &[u8]) -> Result<(), TrackingError>;
}

/// The tracking/registry service seam.
///
/// Mirrors the operations the recorder needs: experiment selection, run
/// creation, model registration, and version metadata updates. Everything
/// stateful (run records, artifact storage, version numbering) belongs to
/// the implementation.
pub trait TrackingBackend {
    type Run: TrackingRun;

    /// Select the experiment context, creating it if it does not exist.
    fn set_experiment(&mut self, name: &str) -> Result<(), TrackingError>;

    /// Ask the backend to instrument training automatically. Best-effort:
    /// returns `false` when the backend has no such facility.
    fn enable_autolog(&mut self) -> bool {
        false
    }

    /// Open a new run scoped to `run_name` within the active experiment.
    fn start_run(&mut self, run_name: &str) -> Result<Self::Run, TrackingError>;

    /// Register a new model version under `name`, pointing at the artifact
    /// `source_uri`. Returns the version number assigned by the registry.
    fn register_model(&mut self, source_uri: &str, name: &str) -> Result<u64, TrackingError>;

    /// Attach a human-readable description to a registered version.
    fn update_version_description(
        &mut self,
        name: &str,
        version: u64,
        description: &str,
    ) -> Result<(), TrackingError>;
}
