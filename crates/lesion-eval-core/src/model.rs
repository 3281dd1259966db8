use serde::Serialize;
use std::collections::BTreeMap;

/// One ground-truth lesion or detection candidate of a case.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LesionResult {
    /// True for a ground-truth lesion (hit or missed), false for a false positive.
    pub is_lesion: bool,
    /// Candidate confidence; 0 for a missed lesion.
    pub confidence: f64,
    /// Overlap with the matched counterpart; 0 when unmatched.
    pub overlap: f64,
}

impl LesionResult {
    pub fn hit(confidence: f64, overlap: f64) -> Self {
        Self {
            is_lesion: true,
            confidence,
            overlap,
        }
    }

    pub fn missed() -> Self {
        Self {
            is_lesion: true,
            confidence: 0.0,
            overlap: 0.0,
        }
    }

    pub fn false_positive(confidence: f64) -> Self {
        Self {
            is_lesion: false,
            confidence,
            overlap: 0.0,
        }
    }

    /// Placeholder for a case with neither lesions nor candidates.
    pub fn empty_case() -> Self {
        Self::false_positive(0.0)
    }
}

/// Scorer output. Keyed by subject id, so a repeated subject keeps the
/// values of its last occurrence.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Metrics {
    pub lesion_results: BTreeMap<String, Vec<LesionResult>>,
    /// Case-level ground truth (1 when the case has a lesion).
    pub case_target: BTreeMap<String, f64>,
    /// Case-level prediction used for ranking metrics.
    pub case_pred: BTreeMap<String, f64>,
    /// Candidates extracted per case.
    pub num_candidates: BTreeMap<String, usize>,
    /// Subjects in request order, duplicates included.
    pub subject_list: Vec<String>,
    /// Scorer version string.
    pub version: String,
}

impl Metrics {
    pub fn num_cases(&self) -> usize {
        self.case_target.len()
    }

    pub fn num_lesions(&self) -> usize {
        self.lesion_results
            .values()
            .flatten()
            .filter(|r| r.is_lesion)
            .count()
    }

    pub fn num_lesions_for(&self, subject_id: &str) -> usize {
        self.lesion_results
            .get(subject_id)
            .map(|rs| rs.iter().filter(|r| r.is_lesion).count())
            .unwrap_or(0)
    }
}
