use std::fs;
use std::path::{Path, PathBuf};

use chrono::Local;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::TrackingError;
use crate::tracking::backend::{TrackingBackend, TrackingRun};

/// Filesystem-backed tracking store.
///
/// Layout under the root directory:
///
/// ```text
/// <root>/<experiment>/meta.json
/// <root>/<experiment>/runs/<run_id>/run.json
/// <root>/<experiment>/runs/<run_id>/params/<key>
/// <root>/<experiment>/runs/<run_id>/artifacts/<file>
/// <root>/<experiment>/runs/<run_id>/artifacts/<model_name>/model.bin
/// <root>/registry/<model_name>/versions/<n>/version.json
/// ```
pub struct FsTrackingStore {
    root: PathBuf,
    experiment_dir: Option<PathBuf>,
}

#[derive(Serialize, Deserialize, Debug)]
struct ExperimentMeta {
    name: String,
    created_at: String,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
struct RunRecord {
    run_id: String,
    run_name: String,
    status: String,
    start_time: String,
    end_time: Option<String>,
}

#[derive(Serialize, Deserialize, Debug)]
struct VersionRecord {
    name: String,
    version: u64,
    source_uri: String,
    description: String,
    created_at: String,
}

impl FsTrackingStore {
    /// Open (creating if necessary) a store rooted at `root`.
    pub fn open(root: impl AsRef<Path>) -> Result<Self, TrackingError> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root)?;
        Ok(FsTrackingStore {
            root,
            experiment_dir: None,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn versions_dir(&self, model_name: &str) -> PathBuf {
        self.root.join("registry").join(model_name).join("versions")
    }

    fn version_file(&self, model_name: &str, version: u64) -> PathBuf {
        self.versions_dir(model_name)
            .join(version.to_string())
            .join("version.json")
    }
}

impl TrackingBackend for FsTrackingStore {
    type Run = FsRun;

    fn set_experiment(&mut self, name: &str) -> Result<(), TrackingError> {
        if name.is_empty() {
            return Err(TrackingError::permanent("experiment name must not be empty"));
        }
        let dir = self.root.join(name);
        fs::create_dir_all(dir.join("runs"))?;

        let meta_path = dir.join("meta.json");
        if !meta_path.exists() {
            let meta = ExperimentMeta {
                name: name.to_string(),
                created_at: Local::now().to_rfc3339(),
            };
            fs::write(&meta_path, serde_json::to_string_pretty(&meta)?)?;
            log::info!("created experiment {:?} at {}", name, dir.display());
        }

        self.experiment_dir = Some(dir);
        Ok(())
    }

    fn start_run(&mut self, run_name: &str) -> Result<FsRun, TrackingError> {
        let experiment_dir = self.experiment_dir.as_ref().ok_or_else(|| {
            TrackingError::permanent("no active experiment: call set_experiment first")
        })?;

        let mut rng = rand::thread_rng();
        let run_id = format!("{:016x}{:016x}", rng.gen::<u64>(), rng.gen::<u64>());

        let run_dir = experiment_dir.join("runs").join(&run_id);
        fs::create_dir_all(run_dir.join("params"))?;
        fs::create_dir_all(run_dir.join("artifacts"))?;

        let record = RunRecord {
            run_id: run_id.clone(),
            run_name: run_name.to_string(),
            status: "RUNNING".to_string(),
            start_time: Local::now().to_rfc3339(),
            end_time: None,
        };
        fs::write(
            run_dir.join("run.json"),
            serde_json::to_string_pretty(&record)?,
        )?;
        log::info!("started run {:?} ({})", run_name, run_id);

        Ok(FsRun {
            dir: run_dir,
            record,
            closed: false,
        })
    }

    fn register_model(&mut self, source_uri: &str, name: &str) -> Result<u64, TrackingError> {
        let versions_dir = self.versions_dir(name);
        fs::create_dir_all(&versions_dir)?;

        // Next version is one past the highest existing directory name.
        let mut latest = 0u64;
        for entry in fs::read_dir(&versions_dir)? {
            let entry = entry?;
            if let Some(v) = entry
                .file_name()
                .to_str()
                .and_then(|s| s.parse::<u64>().ok())
            {
                latest = latest.max(v);
            }
        }
        let version = latest + 1;

        let record = VersionRecord {
            name: name.to_string(),
            version,
            source_uri: source_uri.to_string(),
            description: String::new(),
            created_at: Local::now().to_rfc3339(),
        };
        let version_dir = versions_dir.join(version.to_string());
        fs::create_dir_all(&version_dir)?;
        fs::write(
            version_dir.join("version.json"),
            serde_json::to_string_pretty(&record)?,
        )?;
        log::info!("registered model {:?} version {}", name, version);

        Ok(version)
    }

    fn update_version_description(
        &mut self,
        name: &str,
        version: u64,
        description: &str,
    ) -> Result<(), TrackingError> {
        let file = self.version_file(name, version);
        let raw = fs::read_to_string(&file).map_err(|_| {
            TrackingError::permanent(format!(
                "model {:?} has no registered version {}",
                name, version
            ))
        })?;
        let mut record: VersionRecord = serde_json::from_str(&raw)?;
        record.description = description.to_string();
        fs::write(&file, serde_json::to_string_pretty(&record)?)?;
        Ok(())
    }
}

/// A run directory being written. Closing happens in `Drop`, so the run
/// record reaches a terminal status even when recording fails midway.
#[derive(Debug)]
pub struct FsRun {
    dir: PathBuf,
    record: RunRecord,
    closed: bool,
}

impl FsRun {
    fn finalize(&mut self) -> Result<(), TrackingError> {
        if self.closed {
            return Ok(());
        }
        self.record.status = "FINISHED".to_string();
        self.record.end_time = Some(Local::now().to_rfc3339());
        fs::write(
            self.dir.join("run.json"),
            serde_json::to_string_pretty(&self.record)?,
        )?;
        self.closed = true;
        Ok(())
    }
}

impl TrackingRun for FsRun {
    fn run_id(&self) -> &str {
        &self.record.run_id
    }

    fn log_param(&mut self, key: &str, value: &str) -> Result<(), TrackingError> {
        if key.is_empty() || key.contains(std::path::is_separator) {
            return Err(TrackingError::permanent(format!(
                "invalid parameter key {:?}",
                key
            )));
        }
        fs::write(self.dir.join("params").join(key), value)?;
        Ok(())
    }

    fn log_artifact(&mut self, path: &Path) -> Result<(), TrackingError> {
        let file_name = path.file_name().ok_or_else(|| {
            TrackingError::permanent(format!("artifact path {:?} has no file name", path))
        })?;
        fs::copy(path, self.dir.join("artifacts").join(file_name))?;
        Ok(())
    }

    fn log_model(&mut self, name: &str, bytes: &[u8]) -> Result<(), TrackingError> {
        let model_dir = self.dir.join("artifacts").join(name);
        fs::create_dir_all(&model_dir)?;
        fs::write(model_dir.join("model.bin"), bytes)?;
        Ok(())
    }
}

impl Drop for FsRun {
    fn drop(&mut self) {
        if let Err(err) = self.finalize() {
            log::warn!("failed to close run {}: {}", self.record.run_id, err);
        }
    }
}
