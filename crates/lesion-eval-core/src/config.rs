use std::path::{Path, PathBuf};

pub const DEFAULT_INPUT_DIR: &str = "/input";
pub const DEFAULT_OUTPUT_DIR: &str = "/output";
pub const DEFAULT_GROUND_TRUTH_DIR: &str = "ground_truth";

pub const PREDICTIONS_FILE: &str = "predictions.json";
pub const METRICS_FILE: &str = "metrics.json";

/// Challenge flavour: decides which interface slugs identify a case and how
/// ground-truth labels are binarized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Challenge {
    /// Pancreatic cancer detection on venous-phase CT.
    #[default]
    Panorama,
    /// Clinically significant prostate cancer detection on MRI.
    PiCai,
}

impl Challenge {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Panorama => "panorama",
            Self::PiCai => "picai",
        }
    }

    pub fn likelihood_slug(&self) -> &'static str {
        match self {
            Self::Panorama => "pdac-likelihood",
            Self::PiCai => "cspca-case-level-likelihood",
        }
    }

    pub fn detection_map_slug(&self) -> &'static str {
        match self {
            Self::Panorama => "pdac-detection-map",
            Self::PiCai => "cspca-detection-map",
        }
    }

    /// Input interface whose image name carries the subject id.
    pub fn subject_image_slug(&self) -> &'static str {
        match self {
            Self::Panorama => "venous-phase-ct-scan",
            Self::PiCai => "transverse-t2-prostate-mri",
        }
    }

    /// Suffix stripped from the subject image name.
    pub fn subject_suffix(&self) -> &'static str {
        match self {
            Self::Panorama => "_0000.mha",
            Self::PiCai => "_t2w.mha",
        }
    }

    pub fn ground_truth_extension(&self) -> &'static str {
        "nii.gz"
    }

    /// Label transform applied to every ground-truth voxel before scoring.
    pub fn label_postprocess(&self) -> LabelPostprocess {
        match self {
            Self::Panorama => binarize_label_eq_one,
            Self::PiCai => binarize_label_positive,
        }
    }
}

/// Maps a raw ground-truth label value to the value used for scoring.
pub type LabelPostprocess = fn(f32) -> f32;

/// Only label 1 counts as lesion.
pub fn binarize_label_eq_one(label: f32) -> f32 {
    if label == 1.0 {
        1.0
    } else {
        0.0
    }
}

/// Every label >= 1 counts as lesion.
pub fn binarize_label_positive(label: f32) -> f32 {
    if label >= 1.0 {
        1.0
    } else {
        0.0
    }
}

/// What to do when two jobs resolve to the same subject id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DuplicateSubjectPolicy {
    /// Keep every record; the later one wins in per-subject mappings.
    #[default]
    Overwrite,
    /// Fail matching.
    Reject,
}

/// Resolved pipeline configuration.
#[derive(Debug, Clone)]
pub struct EvalConfig {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    pub ground_truth_dir: PathBuf,
    pub challenge: Challenge,
    pub duplicate_subjects: DuplicateSubjectPolicy,
    pub include_case_results: bool,
}

impl Default for EvalConfig {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from(DEFAULT_INPUT_DIR),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            ground_truth_dir: PathBuf::from(DEFAULT_GROUND_TRUTH_DIR),
            challenge: Challenge::default(),
            duplicate_subjects: DuplicateSubjectPolicy::default(),
            include_case_results: false,
        }
    }
}

impl EvalConfig {
    pub fn predictions_path(&self) -> PathBuf {
        self.input_dir.join(PREDICTIONS_FILE)
    }

    pub fn metrics_path(&self) -> PathBuf {
        self.output_dir.join(METRICS_FILE)
    }

    /// `<ground_truth_dir>/<subject_id>.<ext>`; existence is not checked.
    pub fn ground_truth_path(&self, subject_id: &str) -> PathBuf {
        ground_truth_path(
            &self.ground_truth_dir,
            subject_id,
            self.challenge.ground_truth_extension(),
        )
    }
}

pub fn ground_truth_path(dir: &Path, subject_id: &str, extension: &str) -> PathBuf {
    dir.join(format!("{}.{}", subject_id, extension))
}
