use std::fs::File;
use std::path::PathBuf;

use chrono::Local;
use ndarray::Array2;

use crate::config::TrackingConfig;
use crate::error::TrackingError;
use crate::models::ForestClassifier;
use crate::tracking::backend::{TrackingBackend, TrackingRun};

/// Run names encode the training-set size.
pub fn run_name_for(train_size: usize) -> String {
    format!("Train_size_{}", train_size)
}

/// Registered model names combine the experiment label, the calendar date,
/// and the optional uniqueness tag.
pub fn model_name_for(experiment: &str, date: &str, run_tag: Option<&str>) -> String {
    match run_tag {
        Some(tag) => format!("{}_{}_{}", experiment, date, tag),
        None => format!("{}_{}", experiment, date),
    }
}

fn sample_file_name(run_tag: Option<&str>) -> PathBuf {
    match run_tag {
        Some(tag) => PathBuf::from(format!("train_sample_{}.csv", tag)),
        None => PathBuf::from("train_sample.csv"),
    }
}

/// Record a fitted classifier into a tracking backend.
///
/// The sequence matters: later steps reference identifiers produced by
/// earlier ones (the run id in the artifact URI, the version number in the
/// description update). Effects, in order:
///
/// 1. select/create the experiment,
/// 2. attempt autolog (best-effort),
/// 3. open a run named after the training-set size,
/// 4. log one parameter per classifier hyperparameter,
/// 5. write the training features to a local CSV and attach it,
/// 6. attach the serialized model under the derived model name,
/// 7. register a model version at `runs:/<run_id>/<model_name>`,
/// 8. describe the version with the registration date.
///
/// The run is closed when its handle drops, on success and failure alike.
/// The local CSV stays behind in the working directory; without a
/// `run_tag`, concurrent invocations in the same directory race on it.
pub fn record<B: TrackingBackend>(
    backend: &mut B,
    classifier: &ForestClassifier,
    train_features: &Array2<f32>,
    config: &TrackingConfig,
) -> Result<(), TrackingError> {
    backend.set_experiment(&config.experiment)?;

    if !backend.enable_autolog() {
        log::debug!("tracking backend has no autolog facility; continuing without it");
    }

    let train_size = train_features.nrows();
    let run_name = run_name_for(train_size);

    let current_date = Local::now().format("%d-%m-%Y").to_string();
    let model_name = model_name_for(&config.experiment, &current_date, config.run_tag.as_deref());

    let mut run = backend.start_run(&run_name)?;

    for (key, value) in classifier.params() {
        run.log_param(&key, &value)?;
    }

    let sample_path = sample_file_name(config.run_tag.as_deref());
    write_train_sample(&sample_path, train_features)?;
    run.log_artifact(&sample_path)?;

    let model = classifier
        .model_bytes()
        .map_err(|err| TrackingError::Serialization(err.to_string()))?;
    run.log_model(&model_name, &model)?;

    let model_uri = format!("runs:/{}/{}", run.run_id(), model_name);
    let version = backend.register_model(&model_uri, &model_name)?;
    backend.update_version_description(
        &model_name,
        version,
        &format!("Random forest model registered on {}", current_date),
    )?;

    log::info!(
        "recorded run {:?}: model {:?} registered as version {}",
        run_name,
        model_name,
        version
    );
    Ok(())
}

/// Write the training features as CSV: a header of column indices, no
/// index column, one row per sample.
fn write_train_sample(path: &PathBuf, features: &Array2<f32>) -> Result<(), TrackingError> {
    let mut writer = csv::Writer::from_writer(File::create(path)?);

    let n_cols = features.ncols();
    writer.write_record((0..n_cols).map(|c| c.to_string()))?;
    for row in features.rows() {
        writer.write_record(row.iter().map(|v| v.to_string()))?;
    }
    writer.flush()?;
    Ok(())
}
