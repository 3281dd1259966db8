//! Native lesion-detection scoring.
//!
//! [`LesionScorer`] implements [`lesion_eval_core::Scorer`]: it extracts
//! lesions and detection candidates per case, pairs them by overlap, and
//! [`aggregate`] turns the per-case results into AUROC, average precision
//! and lesion sensitivity at fixed false-positive-per-case rates.

pub mod aggregate;
pub mod case_eval;
pub mod components;
pub mod curves;
pub mod scorer;

pub use aggregate::aggregate;
pub use case_eval::{OverlapMetric, ScoringOptions};
pub use scorer::{LesionScorer, VERSION};
