use crate::curves::{average_precision, froc_curve, roc_auc, sensitivity_at_fp_rate};
use lesion_eval_core::report::FPR_OPERATING_POINTS;
use lesion_eval_core::{Aggregates, LesionResult, Metrics};

fn finite_or_zero(v: Option<f64>) -> f64 {
    v.filter(|x| x.is_finite()).unwrap_or(0.0)
}

/// Leaderboard aggregates for a scored run. Undefined values are 0.
pub fn aggregate(metrics: &Metrics) -> Aggregates {
    let num_cases = metrics.num_cases();
    if num_cases == 0 {
        return Aggregates::empty(metrics.version.clone());
    }

    let (targets, preds): (Vec<f64>, Vec<f64>) = metrics
        .case_target
        .iter()
        .map(|(subject, &target)| {
            let pred = metrics.case_pred.get(subject).copied().unwrap_or(0.0);
            (target, pred)
        })
        .unzip();
    let auroc = finite_or_zero(roc_auc(&targets, &preds));

    let lesions: Vec<LesionResult> = metrics.lesion_results.values().flatten().copied().collect();
    let ap = finite_or_zero(average_precision(&lesions));

    let froc = froc_curve(&lesions, num_cases);
    let lesion_tpr_at_fpr = FPR_OPERATING_POINTS
        .iter()
        .map(|&fpr| (fpr, sensitivity_at_fp_rate(&froc, fpr)))
        .collect();

    Aggregates {
        score: (auroc + ap) / 2.0,
        auroc,
        ap,
        lesion_tpr_at_fpr,
        num_cases,
        num_lesions: metrics.num_lesions(),
        evaluator_version: metrics.version.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metrics_with(cases: &[(&str, f64, f64, Vec<LesionResult>)]) -> Metrics {
        let mut m = Metrics {
            version: "t".into(),
            ..Default::default()
        };
        for (s, target, pred, lesions) in cases {
            m.case_target.insert(s.to_string(), *target);
            m.case_pred.insert(s.to_string(), *pred);
            m.lesion_results.insert(s.to_string(), lesions.clone());
            m.subject_list.push(s.to_string());
        }
        m
    }

    #[test]
    fn empty_run_is_all_zero() {
        let agg = aggregate(&Metrics::default());
        assert_eq!(agg.num_cases, 0);
        assert_eq!(agg.auroc, 0.0);
        assert_eq!(agg.lesion_tpr_at_fpr.len(), FPR_OPERATING_POINTS.len());
    }

    #[test]
    fn single_class_run_has_finite_metrics() {
        let m = metrics_with(&[("a", 0.0, 0.3, vec![LesionResult::empty_case()])]);
        let agg = aggregate(&m);
        assert_eq!(agg.num_cases, 1);
        assert_eq!(agg.num_lesions, 0);
        assert!(agg.score.is_finite() && agg.auroc.is_finite() && agg.ap.is_finite());
        assert_eq!(agg.score, 0.0);
    }

    #[test]
    fn ranking_uses_case_predictions() {
        let m = metrics_with(&[
            ("pos", 1.0, 0.9, vec![LesionResult::hit(0.8, 0.5)]),
            ("neg", 0.0, 0.1, vec![LesionResult::false_positive(0.2)]),
        ]);
        let agg = aggregate(&m);
        assert_eq!(agg.auroc, 1.0);
        assert_eq!(agg.ap, 1.0);
        assert_eq!(agg.score, 1.0);
        assert_eq!(agg.num_lesions, 1);
        // 0.5 FP per case once the 0.2 candidate is included; sensitivity already 1 before.
        assert!(agg.lesion_tpr_at_fpr.iter().all(|&(_, tpr)| tpr == 1.0));
    }
}
