//! `predictions.json` schema and lookups.
//!
//! The manifest is a list of algorithm jobs. Each job lists the interface
//! values it consumed (`inputs`) and produced (`outputs`); a value is found
//! by its interface slug.

use crate::errors::{EvalError, EvalResult};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// One submitted algorithm run.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Job {
    #[serde(deserialize_with = "de_pk")]
    pub pk: String,
    #[serde(default)]
    pub inputs: Vec<InterfaceValue>,
    #[serde(default)]
    pub outputs: Vec<InterfaceValue>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct InterfaceValue {
    pub interface: Interface,
    #[serde(default)]
    pub image: Option<ImageRef>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Interface {
    pub slug: String,
    #[serde(default)]
    pub relative_path: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ImageRef {
    pub name: String,
    #[serde(default, deserialize_with = "de_opt_pk")]
    pub pk: Option<String>,
}

// Primary keys are UUID strings in practice, integers in some exports.
fn de_pk<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    match value {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "pk must be a string or integer, got {}",
            json_kind(&other)
        ))),
    }
}

fn de_opt_pk<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) => Some(s),
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

pub(crate) fn json_kind(v: &serde_json::Value) -> &'static str {
    match v {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "a list",
        serde_json::Value::Object(_) => "an object",
    }
}

/// Reads and parses the manifest at `path`.
pub fn read_predictions(path: &Path) -> EvalResult<Vec<Job>> {
    let text = std::fs::read_to_string(path).map_err(|source| EvalError::ManifestRead {
        path: path.to_path_buf(),
        source,
    })?;
    parse_predictions(&text)
}

/// Parses manifest text. Anything other than a list of job objects is fatal.
pub fn parse_predictions(text: &str) -> EvalResult<Vec<Job>> {
    let doc: serde_json::Value = serde_json::from_str(text)
        .map_err(|e| EvalError::manifest(format!("not valid JSON: {}", e)))?;

    let serde_json::Value::Array(entries) = doc else {
        return Err(EvalError::manifest(format!(
            "expected a list of jobs, found {}",
            json_kind(&doc)
        )));
    };

    entries
        .into_iter()
        .enumerate()
        .map(|(idx, entry)| {
            if !entry.is_object() {
                return Err(EvalError::manifest(format!(
                    "job #{} must be an object, found {}",
                    idx,
                    json_kind(&entry)
                )));
            }
            serde_json::from_value::<Job>(entry)
                .map_err(|e| EvalError::manifest(format!("job #{}: {}", idx, e)))
        })
        .collect()
}

fn find_value<'a>(values: &'a [InterfaceValue], slug: &str) -> Option<&'a InterfaceValue> {
    values.iter().find(|v| v.interface.slug == slug)
}

/// User-provided image name of the value with `slug`.
pub fn get_image_name<'a>(
    job_pk: &str,
    values: &'a [InterfaceValue],
    slug: &str,
) -> EvalResult<&'a str> {
    let value = find_value(values, slug).ok_or_else(|| EvalError::InterfaceNotFound {
        slug: slug.to_string(),
        job_pk: job_pk.to_string(),
    })?;
    value
        .image
        .as_ref()
        .map(|img| img.name.as_str())
        .ok_or_else(|| EvalError::ImageNotFound {
            slug: slug.to_string(),
            job_pk: job_pk.to_string(),
        })
}

/// Location of the interface relative to the job's input or output dir.
pub fn get_interface_relative_path<'a>(
    job_pk: &str,
    values: &'a [InterfaceValue],
    slug: &str,
) -> EvalResult<&'a str> {
    find_value(values, slug)
        .map(|v| v.interface.relative_path.as_str())
        .ok_or_else(|| EvalError::InterfaceNotFound {
            slug: slug.to_string(),
            job_pk: job_pk.to_string(),
        })
}

/// Where a job's output file lives inside the evaluation container:
/// `<input_dir>/<job_pk>/output/<relative_path>`.
pub fn get_file_location(
    input_dir: &Path,
    job_pk: &str,
    values: &[InterfaceValue],
    slug: &str,
) -> EvalResult<PathBuf> {
    let relative_path = get_interface_relative_path(job_pk, values, slug)?;
    Ok(input_dir.join(job_pk).join("output").join(relative_path))
}
