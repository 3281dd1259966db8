use crate::case_eval::{evaluate_case, ScoringOptions};
use lesion_eval_core::evaluator::{EvaluationRequest, Scorer};
use lesion_eval_core::{read_volume, EvalError, EvalResult, Metrics};

/// Scorer version reported in the aggregates.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Native lesion-detection scorer. Loads one case at a time.
#[derive(Debug, Clone, Default)]
pub struct LesionScorer {
    pub options: ScoringOptions,
}

impl LesionScorer {
    pub fn new(options: ScoringOptions) -> Self {
        Self { options }
    }
}

impl Scorer for LesionScorer {
    fn name(&self) -> &str {
        "lesion-eval"
    }

    fn evaluate(&self, request: &EvaluationRequest) -> EvalResult<Metrics> {
        request.validate()?;

        let mut metrics = Metrics {
            subject_list: request.subject_list.clone(),
            version: VERSION.to_string(),
            ..Default::default()
        };

        for ((det_path, gt_path), subject_id) in request
            .y_det
            .iter()
            .zip(&request.y_true)
            .zip(&request.subject_list)
        {
            let y_det = read_volume(det_path)?;
            let mut y_true = read_volume(gt_path)?;
            if y_det.dims != y_true.dims {
                return Err(EvalError::ShapeMismatch {
                    subject_id: subject_id.clone(),
                    det: y_det.dims,
                    gt: y_true.dims,
                });
            }
            y_true.map_in_place(request.y_true_postprocess);

            let case = evaluate_case(&y_det, &y_true, &self.options);
            tracing::debug!(
                subject_id = %subject_id,
                candidates = case.num_candidates,
                case_target = case.case_target,
                "scored case"
            );

            metrics
                .case_target
                .insert(subject_id.clone(), case.case_target);
            metrics.case_pred.insert(subject_id.clone(), case.case_pred);
            metrics
                .num_candidates
                .insert(subject_id.clone(), case.num_candidates);
            metrics
                .lesion_results
                .insert(subject_id.clone(), case.lesion_results);
        }

        Ok(metrics)
    }
}
