//! Resolves every job in the manifest to a [`CaseRecord`].
//!
//! Matching runs to completion before any scoring, so a malformed submission
//! fails before a single volume is loaded.

use crate::config::{DuplicateSubjectPolicy, EvalConfig};
use crate::errors::{EvalError, EvalResult};
use crate::manifest::{self, json_kind, Job};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// One scoring entry, built once per job.
#[derive(Debug, Clone, PartialEq)]
pub struct CaseRecord {
    pub subject_id: String,
    pub job_pk: String,
    pub detection_map: PathBuf,
    pub likelihood: f64,
    pub ground_truth: PathBuf,
}

/// Everything before the first occurrence of `suffix`; the whole name when
/// the suffix is absent or empty.
pub fn subject_id_from_image_name<'a>(image_name: &'a str, suffix: &str) -> &'a str {
    if suffix.is_empty() {
        return image_name;
    }
    match image_name.find(suffix) {
        Some(idx) => &image_name[..idx],
        None => image_name,
    }
}

/// Detection map file at `location`: the location itself when it is a file,
/// else the first `*.mha` (by name) inside it.
pub fn find_detection_map(location: &Path) -> EvalResult<PathBuf> {
    if location.is_file() {
        return Ok(location.to_path_buf());
    }

    let entries = std::fs::read_dir(location).map_err(|e| EvalError::DetectionMapMissing {
        location: location.to_path_buf(),
        source: Some(e),
    })?;

    let mut candidates: Vec<PathBuf> = entries
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.is_file() && p.extension().is_some_and(|ext| ext == "mha"))
        .collect();
    candidates.sort();
    candidates
        .into_iter()
        .next()
        .ok_or_else(|| EvalError::DetectionMapMissing {
            location: location.to_path_buf(),
            source: None,
        })
}

/// Reads a case-level likelihood: the file must hold a single JSON number.
pub fn load_likelihood(path: &Path) -> EvalResult<f64> {
    let text = std::fs::read_to_string(path).map_err(|e| EvalError::Likelihood {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    let value: serde_json::Value =
        serde_json::from_str(&text).map_err(|e| EvalError::Likelihood {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
    match value.as_f64() {
        Some(v) if v.is_finite() => Ok(v),
        _ => Err(EvalError::Likelihood {
            path: path.to_path_buf(),
            message: format!("expected a number, found {}", json_kind(&value)),
        }),
    }
}

/// Resolves one job.
pub fn match_case(job: &Job, config: &EvalConfig) -> EvalResult<CaseRecord> {
    let challenge = config.challenge;

    let likelihood_location = manifest::get_file_location(
        &config.input_dir,
        &job.pk,
        &job.outputs,
        challenge.likelihood_slug(),
    )?;
    let detection_map_location = manifest::get_file_location(
        &config.input_dir,
        &job.pk,
        &job.outputs,
        challenge.detection_map_slug(),
    )?;
    let image_name =
        manifest::get_image_name(&job.pk, &job.inputs, challenge.subject_image_slug())?;

    let subject_id = subject_id_from_image_name(image_name, challenge.subject_suffix());
    if subject_id.is_empty() {
        return Err(EvalError::EmptySubjectId {
            image_name: image_name.to_string(),
        });
    }

    let detection_map = find_detection_map(&detection_map_location)?;
    let likelihood = load_likelihood(&likelihood_location)?;
    let ground_truth = config.ground_truth_path(subject_id);

    tracing::info!(
        subject_id,
        job_pk = %job.pk,
        likelihood,
        detection_map = %detection_map.display(),
        "matched case"
    );

    Ok(CaseRecord {
        subject_id: subject_id.to_string(),
        job_pk: job.pk.clone(),
        detection_map,
        likelihood,
        ground_truth,
    })
}

/// Resolves every job, in manifest order.
pub fn match_cases(jobs: &[Job], config: &EvalConfig) -> EvalResult<Vec<CaseRecord>> {
    let mut records = Vec::with_capacity(jobs.len());
    let mut seen: HashMap<String, String> = HashMap::new();

    for job in jobs {
        let record = match_case(job, config)?;

        if let Some(first_job) = seen.get(&record.subject_id) {
            match config.duplicate_subjects {
                DuplicateSubjectPolicy::Reject => {
                    return Err(EvalError::DuplicateSubject {
                        subject_id: record.subject_id.clone(),
                        first_job: first_job.clone(),
                        second_job: record.job_pk.clone(),
                    });
                }
                DuplicateSubjectPolicy::Overwrite => {
                    tracing::warn!(
                        subject_id = %record.subject_id,
                        first_job = %first_job,
                        second_job = %record.job_pk,
                        "duplicate subject id, later job overwrites earlier prediction"
                    );
                }
            }
        }
        seen.insert(record.subject_id.clone(), record.job_pk.clone());
        records.push(record);
    }

    Ok(records)
}
