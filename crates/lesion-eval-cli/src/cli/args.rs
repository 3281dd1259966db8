use clap::builder::FalseyValueParser;
use clap::{Parser, ValueEnum};
use lesion_eval_core::config::{
    DEFAULT_GROUND_TRUTH_DIR, DEFAULT_INPUT_DIR, DEFAULT_OUTPUT_DIR,
};
use lesion_eval_core::{Challenge, DuplicateSubjectPolicy, EvalConfig, EvalError};
use lesion_eval_metrics::case_eval::DEFAULT_MIN_OVERLAP;
use lesion_eval_metrics::{OverlapMetric, ScoringOptions};
use std::path::PathBuf;

/// Every flag is optional: the container runs the binary without arguments.
#[derive(Parser, Debug, Clone)]
#[command(
    name = "lesion-eval",
    version,
    about = "Aggregates lesion detection results of a challenge submission into metrics.json"
)]
pub struct Cli {
    /// Directory holding predictions.json and the per-job outputs
    #[arg(long, env = "LESION_EVAL_INPUT_DIR", default_value = DEFAULT_INPUT_DIR)]
    pub input_dir: PathBuf,

    /// Directory metrics.json is written to
    #[arg(long, env = "LESION_EVAL_OUTPUT_DIR", default_value = DEFAULT_OUTPUT_DIR)]
    pub output_dir: PathBuf,

    /// Directory with one <subject_id>.nii.gz label volume per case
    #[arg(long, env = "LESION_EVAL_GROUND_TRUTH_DIR", default_value = DEFAULT_GROUND_TRUTH_DIR)]
    pub ground_truth_dir: PathBuf,

    #[arg(long, env = "LESION_EVAL_CHALLENGE", value_enum, default_value_t = ChallengeArg::Panorama)]
    pub challenge: ChallengeArg,

    /// Minimum overlap for a detection candidate to hit a lesion
    #[arg(long, env = "LESION_EVAL_MIN_OVERLAP", default_value_t = DEFAULT_MIN_OVERLAP)]
    pub min_overlap: f64,

    #[arg(long, env = "LESION_EVAL_OVERLAP_METRIC", value_enum, default_value_t = OverlapMetricArg::Iou)]
    pub overlap_metric: OverlapMetricArg,

    #[arg(long, env = "LESION_EVAL_ON_DUPLICATE_SUBJECT", value_enum, default_value_t = DuplicatePolicyArg::Overwrite)]
    pub on_duplicate_subject: DuplicatePolicyArg,

    /// Also write per-case results next to the aggregates
    #[arg(long, env = "LESION_EVAL_INCLUDE_CASE_RESULTS", value_parser = FalseyValueParser::new())]
    pub include_case_results: bool,

    /// Count candidates that overlap an already matched lesion as false positives
    #[arg(long)]
    pub count_redundant_candidates: bool,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum ChallengeArg {
    Panorama,
    Picai,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum OverlapMetricArg {
    Iou,
    Dsc,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum DuplicatePolicyArg {
    Overwrite,
    Error,
}

impl From<ChallengeArg> for Challenge {
    fn from(v: ChallengeArg) -> Self {
        match v {
            ChallengeArg::Panorama => Challenge::Panorama,
            ChallengeArg::Picai => Challenge::PiCai,
        }
    }
}

impl From<OverlapMetricArg> for OverlapMetric {
    fn from(v: OverlapMetricArg) -> Self {
        match v {
            OverlapMetricArg::Iou => OverlapMetric::Iou,
            OverlapMetricArg::Dsc => OverlapMetric::Dsc,
        }
    }
}

impl From<DuplicatePolicyArg> for DuplicateSubjectPolicy {
    fn from(v: DuplicatePolicyArg) -> Self {
        match v {
            DuplicatePolicyArg::Overwrite => DuplicateSubjectPolicy::Overwrite,
            DuplicatePolicyArg::Error => DuplicateSubjectPolicy::Reject,
        }
    }
}

impl Cli {
    pub fn validate(&self) -> Result<(), EvalError> {
        if !(0.0..1.0).contains(&self.min_overlap) {
            return Err(EvalError::config(format!(
                "--min-overlap must be in [0, 1), got {}",
                self.min_overlap
            )));
        }
        Ok(())
    }

    pub fn eval_config(&self) -> EvalConfig {
        EvalConfig {
            input_dir: self.input_dir.clone(),
            output_dir: self.output_dir.clone(),
            ground_truth_dir: self.ground_truth_dir.clone(),
            challenge: self.challenge.into(),
            duplicate_subjects: self.on_duplicate_subject.into(),
            include_case_results: self.include_case_results,
        }
    }

    pub fn scoring_options(&self) -> ScoringOptions {
        ScoringOptions {
            min_overlap: self.min_overlap,
            overlap_metric: self.overlap_metric.into(),
            allow_unmatched_candidates_with_minimal_overlap: !self.count_redundant_candidates,
        }
    }
}
