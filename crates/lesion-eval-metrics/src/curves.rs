//! Ranking metrics: case-level ROC AUC, lesion-level average precision and
//! FROC (lesion sensitivity against false positives per case).
//!
//! Lesion-level curves only use thresholds above zero: a missed lesion has
//! confidence 0 and must never count as detected.

use lesion_eval_core::LesionResult;

/// Area under the ROC curve via the rank-sum statistic, averaging ties.
/// `None` when only one class is present.
pub fn roc_auc(targets: &[f64], preds: &[f64]) -> Option<f64> {
    debug_assert_eq!(targets.len(), preds.len());

    let mut order: Vec<usize> = (0..preds.len()).collect();
    order.sort_by(|&a, &b| preds[a].total_cmp(&preds[b]));

    let mut ranks = vec![0f64; preds.len()];
    let mut i = 0;
    while i < order.len() {
        let mut j = i;
        while j + 1 < order.len() && preds[order[j + 1]] == preds[order[i]] {
            j += 1;
        }
        // 1-based average rank of the tie group i..=j
        let avg = (i + j) as f64 / 2.0 + 1.0;
        for &k in &order[i..=j] {
            ranks[k] = avg;
        }
        i = j + 1;
    }

    let positives = targets.iter().filter(|&&t| t > 0.0).count();
    let negatives = targets.len() - positives;
    if positives == 0 || negatives == 0 {
        return None;
    }

    let rank_sum: f64 = targets
        .iter()
        .zip(&ranks)
        .filter(|(t, _)| **t > 0.0)
        .map(|(_, &r)| r)
        .sum();
    let p = positives as f64;
    Some((rank_sum - p * (p + 1.0) / 2.0) / (p * negatives as f64))
}

/// One operating point of a lesion-level curve.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CurvePoint {
    pub threshold: f64,
    pub true_positives: usize,
    pub false_positives: usize,
}

/// Cumulative TP/FP counts at every distinct positive confidence, highest first.
pub fn lesion_curve(results: &[LesionResult]) -> Vec<CurvePoint> {
    let mut scored: Vec<&LesionResult> = results.iter().filter(|r| r.confidence > 0.0).collect();
    scored.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));

    let mut points: Vec<CurvePoint> = Vec::new();
    let (mut tp, mut fp) = (0usize, 0usize);
    for (idx, r) in scored.iter().enumerate() {
        if r.is_lesion {
            tp += 1;
        } else {
            fp += 1;
        }
        let last_of_group = scored
            .get(idx + 1)
            .map_or(true, |next| next.confidence != r.confidence);
        if last_of_group {
            points.push(CurvePoint {
                threshold: r.confidence,
                true_positives: tp,
                false_positives: fp,
            });
        }
    }
    points
}

/// Step-wise average precision: Σ (Rₙ − Rₙ₋₁)·Pₙ. `None` without lesions.
pub fn average_precision(results: &[LesionResult]) -> Option<f64> {
    let num_lesions = results.iter().filter(|r| r.is_lesion).count();
    if num_lesions == 0 {
        return None;
    }

    let mut ap = 0.0;
    let mut prev_recall = 0.0;
    for p in lesion_curve(results) {
        let recall = p.true_positives as f64 / num_lesions as f64;
        let precision = p.true_positives as f64 / (p.true_positives + p.false_positives) as f64;
        ap += (recall - prev_recall) * precision;
        prev_recall = recall;
    }
    Some(ap)
}

/// FROC point: lesion sensitivity at a given false-positive-per-case rate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrocPoint {
    pub threshold: f64,
    pub sensitivity: f64,
    pub fp_per_case: f64,
}

pub fn froc_curve(results: &[LesionResult], num_cases: usize) -> Vec<FrocPoint> {
    let num_lesions = results.iter().filter(|r| r.is_lesion).count();
    if num_lesions == 0 || num_cases == 0 {
        return Vec::new();
    }
    lesion_curve(results)
        .into_iter()
        .map(|p| FrocPoint {
            threshold: p.threshold,
            sensitivity: p.true_positives as f64 / num_lesions as f64,
            fp_per_case: p.false_positives as f64 / num_cases as f64,
        })
        .collect()
}

/// Highest sensitivity whose FP-per-case rate does not exceed `fpr`; 0 when
/// no operating point qualifies.
pub fn sensitivity_at_fp_rate(curve: &[FrocPoint], fpr: f64) -> f64 {
    curve
        .iter()
        .filter(|p| p.fp_per_case <= fpr)
        .map(|p| p.sensitivity)
        .fold(0.0, f64::max)
}
