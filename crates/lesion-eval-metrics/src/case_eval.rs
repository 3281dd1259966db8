//! Lesion-level evaluation of a single case.
//!
//! Ground-truth lesions and detection candidates are both 26-connected
//! components. A candidate's confidence is its peak value. Lesions and
//! candidates are paired greedily by descending overlap; a pair counts only
//! when its overlap exceeds `min_overlap`.

use crate::components::label_components;
use lesion_eval_core::{LesionResult, Volume};
use std::collections::HashMap;

pub const DEFAULT_MIN_OVERLAP: f64 = 0.10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OverlapMetric {
    /// Intersection over union.
    #[default]
    Iou,
    /// Dice similarity coefficient.
    Dsc,
}

impl OverlapMetric {
    fn compute(&self, intersection: usize, size_a: usize, size_b: usize) -> f64 {
        let inter = intersection as f64;
        match self {
            Self::Iou => {
                let union = (size_a + size_b - intersection) as f64;
                if union == 0.0 {
                    0.0
                } else {
                    inter / union
                }
            }
            Self::Dsc => {
                let total = (size_a + size_b) as f64;
                if total == 0.0 {
                    0.0
                } else {
                    2.0 * inter / total
                }
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScoringOptions {
    pub min_overlap: f64,
    pub overlap_metric: OverlapMetric,
    /// When several candidates overlap a lesion sufficiently, the ones not
    /// selected are dropped instead of counted as false positives.
    pub allow_unmatched_candidates_with_minimal_overlap: bool,
}

impl Default for ScoringOptions {
    fn default() -> Self {
        Self {
            min_overlap: DEFAULT_MIN_OVERLAP,
            overlap_metric: OverlapMetric::default(),
            allow_unmatched_candidates_with_minimal_overlap: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct CaseEvaluation {
    pub lesion_results: Vec<LesionResult>,
    pub case_target: f64,
    /// Peak detection value; replaced later by the submitted likelihood.
    pub case_pred: f64,
    pub num_candidates: usize,
}

/// Evaluates one case. `y_true` must already be post-processed and both
/// volumes must share dims; [`crate::LesionScorer`] checks this before calling.
pub(crate) fn evaluate_case(y_det: &Volume, y_true: &Volume, options: &ScoringOptions) -> CaseEvaluation {
    debug_assert_eq!(y_det.dims, y_true.dims);

    let gt_mask: Vec<bool> = y_true.data.iter().map(|&v| v > 0.0).collect();
    let det_mask: Vec<bool> = y_det.data.iter().map(|&v| v > 0.0).collect();
    let (gt_labels, num_gt) = label_components(&gt_mask, y_true.dims);
    let (cand_labels, num_cand) = label_components(&det_mask, y_det.dims);

    // Index 0 is background.
    let mut gt_size = vec![0usize; num_gt + 1];
    let mut cand_size = vec![0usize; num_cand + 1];
    let mut confidence = vec![0f64; num_cand + 1];
    let mut intersection: HashMap<(usize, usize), usize> = HashMap::new();

    for (i, (&g, &c)) in gt_labels.iter().zip(&cand_labels).enumerate() {
        let (g, c) = (g as usize, c as usize);
        gt_size[g] += 1;
        cand_size[c] += 1;
        if c != 0 {
            confidence[c] = confidence[c].max(f64::from(y_det.data[i]));
        }
        if g != 0 && c != 0 {
            *intersection.entry((g, c)).or_insert(0) += 1;
        }
    }

    let mut pairs: Vec<(f64, usize, usize)> = intersection
        .iter()
        .map(|(&(g, c), &inter)| {
            (
                options
                    .overlap_metric
                    .compute(inter, gt_size[g], cand_size[c]),
                g,
                c,
            )
        })
        .collect();
    pairs.sort_by(|a, b| {
        b.0.total_cmp(&a.0)
            .then_with(|| confidence[b.2].total_cmp(&confidence[a.2]))
            .then_with(|| (a.1, a.2).cmp(&(b.1, b.2)))
    });

    let mut gt_match: Vec<Option<(usize, f64)>> = vec![None; num_gt + 1];
    let mut cand_matched = vec![false; num_cand + 1];
    let mut cand_sufficient = vec![false; num_cand + 1];
    for &(overlap, g, c) in &pairs {
        if overlap <= options.min_overlap {
            continue;
        }
        cand_sufficient[c] = true;
        if gt_match[g].is_none() && !cand_matched[c] {
            gt_match[g] = Some((c, overlap));
            cand_matched[c] = true;
        }
    }

    let mut lesion_results = Vec::with_capacity(num_gt + num_cand);
    for m in gt_match.iter().skip(1) {
        lesion_results.push(match m {
            Some((c, overlap)) => LesionResult::hit(confidence[*c], *overlap),
            None => LesionResult::missed(),
        });
    }
    for c in 1..=num_cand {
        if cand_matched[c] {
            continue;
        }
        if options.allow_unmatched_candidates_with_minimal_overlap && cand_sufficient[c] {
            continue;
        }
        lesion_results.push(LesionResult::false_positive(confidence[c]));
    }
    if lesion_results.is_empty() {
        lesion_results.push(LesionResult::empty_case());
    }

    CaseEvaluation {
        lesion_results,
        case_target: f64::from(y_true.max()),
        case_pred: f64::from(y_det.max()),
        num_candidates: num_cand,
    }
}
