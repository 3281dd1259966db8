//! Adapter between matched cases and a lesion-detection scorer.

use crate::config::LabelPostprocess;
use crate::errors::{EvalError, EvalResult};
use crate::matcher::CaseRecord;
use crate::model::Metrics;
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Everything a scorer needs for one run. The three lists are parallel.
#[derive(Debug, Clone)]
pub struct EvaluationRequest {
    pub y_det: Vec<PathBuf>,
    pub y_true: Vec<PathBuf>,
    pub subject_list: Vec<String>,
    /// Applied to ground-truth label values before scoring.
    pub y_true_postprocess: LabelPostprocess,
}

impl EvaluationRequest {
    pub fn from_cases(cases: &[CaseRecord], y_true_postprocess: LabelPostprocess) -> Self {
        Self {
            y_det: cases.iter().map(|c| c.detection_map.clone()).collect(),
            y_true: cases.iter().map(|c| c.ground_truth.clone()).collect(),
            subject_list: cases.iter().map(|c| c.subject_id.clone()).collect(),
            y_true_postprocess,
        }
    }

    pub fn len(&self) -> usize {
        self.subject_list.len()
    }

    pub fn validate(&self) -> EvalResult<()> {
        if self.y_det.len() != self.subject_list.len() || self.y_true.len() != self.subject_list.len()
        {
            return Err(EvalError::InvalidRequest {
                message: format!(
                    "{} detection maps, {} ground truths, {} subjects",
                    self.y_det.len(),
                    self.y_true.len(),
                    self.subject_list.len()
                ),
            });
        }
        Ok(())
    }
}

/// Lesion-detection scorer. Called once per run, synchronously.
pub trait Scorer {
    fn name(&self) -> &str;

    fn evaluate(&self, request: &EvaluationRequest) -> EvalResult<Metrics>;
}

/// Submitted likelihood per subject; a later case overwrites an earlier one.
pub fn case_predictions(cases: &[CaseRecord]) -> BTreeMap<String, f64> {
    cases
        .iter()
        .map(|c| (c.subject_id.clone(), c.likelihood))
        .collect()
}

/// Scores all cases in one call, then replaces the scorer's case-level
/// predictions (derived from the detection maps) with the submitted
/// likelihoods. Scorer errors are returned unchanged.
pub fn evaluate_cases(
    cases: &[CaseRecord],
    scorer: &dyn Scorer,
    y_true_postprocess: LabelPostprocess,
) -> EvalResult<Metrics> {
    let request = EvaluationRequest::from_cases(cases, y_true_postprocess);
    request.validate()?;

    tracing::info!(scorer = scorer.name(), cases = request.len(), "performing evaluation");
    tracing::debug!(
        y_det = ?request.y_det,
        y_true = ?request.y_true,
        subject_list = ?request.subject_list,
        "scoring request"
    );

    let mut metrics = scorer.evaluate(&request)?;

    metrics.case_pred = case_predictions(cases);
    tracing::info!(
        num_cases = metrics.num_cases(),
        num_lesions = metrics.num_lesions(),
        "evaluation succeeded"
    );
    Ok(metrics)
}
