//! Case matching and result aggregation for lesion-detection challenges.
//!
//! The pipeline is strictly linear:
//!
//! 1. [`manifest::read_predictions`] parses `predictions.json`.
//! 2. [`matcher::match_cases`] resolves every job to a [`CaseRecord`]
//!    (subject id, detection map, likelihood, ground truth).
//! 3. [`evaluator::evaluate_cases`] calls a [`Scorer`] once and substitutes
//!    the submitted case-level likelihoods.
//! 4. [`report::write_metrics`] writes `metrics.json`.
//!
//! The scorer itself lives behind the [`Scorer`] trait; `lesion-eval-metrics`
//! provides the native implementation.

pub mod config;
pub mod errors;
pub mod evaluator;
pub mod inputs;
pub mod manifest;
pub mod matcher;
pub mod model;
pub mod report;
pub mod volume;

pub use config::{Challenge, DuplicateSubjectPolicy, EvalConfig, LabelPostprocess};
pub use errors::{EvalError, EvalResult};
pub use evaluator::{evaluate_cases, EvaluationRequest, Scorer};
pub use manifest::{read_predictions, Job};
pub use matcher::{match_cases, CaseRecord};
pub use model::{LesionResult, Metrics};
pub use report::{write_metrics, Aggregates, MetricsReport};
pub use volume::{read_volume, Volume};
