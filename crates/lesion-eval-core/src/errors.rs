//! Error types for the evaluation pipeline.

use std::path::PathBuf;

/// Exit code for malformed submissions and configuration problems.
pub const EXIT_INVALID_SUBMISSION: i32 = 2;
/// Exit code for failures while scoring or writing results.
pub const EXIT_EVALUATION_FAILED: i32 = 1;

/// Evaluation errors.
#[derive(Debug, thiserror::Error)]
pub enum EvalError {
    /// Manifest could not be read from disk.
    #[error("failed to read manifest {path}: {source}")]
    ManifestRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Manifest is not valid JSON or has the wrong shape.
    #[error("invalid manifest: {message}")]
    ManifestParse { message: String },

    /// No interface value with the requested slug.
    #[error("value with interface {slug} not found in job {job_pk}")]
    InterfaceNotFound { slug: String, job_pk: String },

    /// The interface value exists but carries no image descriptor.
    #[error("image with interface {slug} not found in job {job_pk}")]
    ImageNotFound { slug: String, job_pk: String },

    /// No `.mha` file at the detection map location, or the location could
    /// not be listed.
    #[error("no detection map (*.mha) found at {}", location.display())]
    DetectionMapMissing {
        location: PathBuf,
        #[source]
        source: Option<std::io::Error>,
    },

    /// Likelihood file unreadable or not a JSON number.
    #[error("invalid likelihood file {}: {message}", path.display())]
    Likelihood { path: PathBuf, message: String },

    /// Derived subject id is empty.
    #[error("image name {image_name:?} yields an empty subject id")]
    EmptySubjectId { image_name: String },

    /// Two jobs map to the same subject id and duplicates are rejected.
    #[error("subject {subject_id} is produced by jobs {first_job} and {second_job}")]
    DuplicateSubject {
        subject_id: String,
        first_job: String,
        second_job: String,
    },

    /// Run settings out of range.
    #[error("invalid configuration: {message}")]
    Config { message: String },

    /// Volume file could not be read or decoded.
    #[error("failed to load volume {}: {message}", path.display())]
    Volume { path: PathBuf, message: String },

    /// Detection map and ground truth disagree on grid size.
    #[error("shape mismatch for subject {subject_id}: detection map {det:?}, ground truth {gt:?}")]
    ShapeMismatch {
        subject_id: String,
        det: [usize; 3],
        gt: [usize; 3],
    },

    /// Request lists have different lengths.
    #[error("evaluation request is inconsistent: {message}")]
    InvalidRequest { message: String },

    /// Scorer failure not covered by another variant.
    #[error("scorer {scorer} failed: {message}")]
    Scorer { scorer: String, message: String },

    /// Metrics file could not be written.
    #[error("failed to write metrics {}: {message}", path.display())]
    MetricsWrite { path: PathBuf, message: String },
}

impl EvalError {
    /// Exit code for CLI.
    pub fn exit_code(&self) -> i32 {
        match self {
            // Malformed submission / configuration
            Self::ManifestRead { .. }
            | Self::ManifestParse { .. }
            | Self::InterfaceNotFound { .. }
            | Self::ImageNotFound { .. }
            | Self::DetectionMapMissing { .. }
            | Self::Likelihood { .. }
            | Self::EmptySubjectId { .. }
            | Self::DuplicateSubject { .. }
            | Self::Config { .. } => EXIT_INVALID_SUBMISSION,

            // Scoring and output
            Self::Volume { .. }
            | Self::ShapeMismatch { .. }
            | Self::InvalidRequest { .. }
            | Self::Scorer { .. }
            | Self::MetricsWrite { .. } => EXIT_EVALUATION_FAILED,
        }
    }

    pub fn volume(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Volume {
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn manifest(message: impl Into<String>) -> Self {
        Self::ManifestParse {
            message: message.into(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }
}

/// Result type for evaluation operations.
pub type EvalResult<T> = Result<T, EvalError>;
