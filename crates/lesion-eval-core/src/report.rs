//! `metrics.json` output.

use crate::errors::{EvalError, EvalResult};
use crate::matcher::CaseRecord;
use crate::model::Metrics;
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::path::Path;

/// False-positives-per-case operating points reported as lesion TPR.
pub const FPR_OPERATING_POINTS: [f64; 7] = [0.1, 0.2, 0.3, 0.4, 0.5, 1.0, 5.0];

/// Leaderboard aggregates. Serialized as a flat object with a fixed key order.
#[derive(Debug, Clone, PartialEq)]
pub struct Aggregates {
    pub score: f64,
    pub auroc: f64,
    pub ap: f64,
    /// (false positives per case, lesion TPR), in [`FPR_OPERATING_POINTS`] order.
    pub lesion_tpr_at_fpr: Vec<(f64, f64)>,
    pub num_cases: usize,
    pub num_lesions: usize,
    pub evaluator_version: String,
}

impl Aggregates {
    /// All-zero aggregates for a run without cases.
    pub fn empty(version: impl Into<String>) -> Self {
        Self {
            score: 0.0,
            auroc: 0.0,
            ap: 0.0,
            lesion_tpr_at_fpr: FPR_OPERATING_POINTS.iter().map(|&x| (x, 0.0)).collect(),
            num_cases: 0,
            num_lesions: 0,
            evaluator_version: version.into(),
        }
    }

    pub fn tpr_key(fpr: f64) -> String {
        format!("lesion_TPR_at_FPR_{:.1}", fpr)
    }
}

impl Serialize for Aggregates {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(6 + self.lesion_tpr_at_fpr.len()))?;
        map.serialize_entry("score", &self.score)?;
        map.serialize_entry("auroc", &self.auroc)?;
        map.serialize_entry("AP", &self.ap)?;
        for (fpr, tpr) in &self.lesion_tpr_at_fpr {
            map.serialize_entry(&Self::tpr_key(*fpr), tpr)?;
        }
        map.serialize_entry("num_cases", &self.num_cases)?;
        map.serialize_entry("num_lesions", &self.num_lesions)?;
        map.serialize_entry("evaluator_version", &self.evaluator_version)?;
        map.end()
    }
}

/// Per-case line of the optional `results` list.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct CaseSummary {
    pub subject_id: String,
    pub job_pk: String,
    pub case_target: f64,
    pub case_pred: f64,
    pub num_lesions: usize,
    pub num_candidates: usize,
}

/// Builds one summary per case record, in record order.
pub fn case_summaries(metrics: &Metrics, cases: &[CaseRecord]) -> Vec<CaseSummary> {
    cases
        .iter()
        .map(|c| CaseSummary {
            subject_id: c.subject_id.clone(),
            job_pk: c.job_pk.clone(),
            case_target: metrics.case_target.get(&c.subject_id).copied().unwrap_or(0.0),
            case_pred: metrics
                .case_pred
                .get(&c.subject_id)
                .copied()
                .unwrap_or(c.likelihood),
            num_lesions: metrics.num_lesions_for(&c.subject_id),
            num_candidates: metrics
                .num_candidates
                .get(&c.subject_id)
                .copied()
                .unwrap_or(0),
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct MetricsReport {
    pub aggregates: Aggregates,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub results: Option<Vec<CaseSummary>>,
}

impl MetricsReport {
    pub fn to_json_pretty(&self) -> EvalResult<String> {
        let mut buf = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
        self.serialize(&mut ser).map_err(|e| EvalError::MetricsWrite {
            path: Default::default(),
            message: e.to_string(),
        })?;
        String::from_utf8(buf).map_err(|e| EvalError::MetricsWrite {
            path: Default::default(),
            message: e.to_string(),
        })
    }
}

/// Writes the report, replacing any existing file. Not atomic.
pub fn write_metrics(report: &MetricsReport, path: &Path) -> EvalResult<()> {
    let write_err = |message: String| EvalError::MetricsWrite {
        path: path.to_path_buf(),
        message,
    };

    let json = report
        .to_json_pretty()
        .map_err(|e| write_err(e.to_string()))?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| write_err(e.to_string()))?;
    }
    std::fs::write(path, json).map_err(|e| write_err(e.to_string()))?;

    tracing::info!(path = %path.display(), "metrics written");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::LesionResult;
    use std::path::PathBuf;

    #[test]
    fn aggregates_serialize_with_fixed_keys_in_order() {
        let report = MetricsReport {
            aggregates: Aggregates::empty("0.4.0"),
            results: None,
        };
        let json = report.to_json_pretty().unwrap();
        let keys: Vec<&str> = json
            .lines()
            .filter_map(|l| l.trim().strip_prefix('"'))
            .filter_map(|l| l.split('"').next())
            .collect();
        assert_eq!(
            keys,
            vec![
                "aggregates",
                "score",
                "auroc",
                "AP",
                "lesion_TPR_at_FPR_0.1",
                "lesion_TPR_at_FPR_0.2",
                "lesion_TPR_at_FPR_0.3",
                "lesion_TPR_at_FPR_0.4",
                "lesion_TPR_at_FPR_0.5",
                "lesion_TPR_at_FPR_1.0",
                "lesion_TPR_at_FPR_5.0",
                "num_cases",
                "num_lesions",
                "evaluator_version",
            ]
        );
        assert!(json.contains("\n    \"aggregates\""), "4-space indent:\n{json}");
    }

    #[test]
    fn write_overwrites_and_creates_parent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("metrics.json");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "stale").unwrap();

        let report = MetricsReport {
            aggregates: Aggregates::empty("x"),
            results: Some(Vec::new()),
        };
        write_metrics(&report, &path).unwrap();

        let v: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(v["aggregates"]["num_cases"], 0);
        assert!(v["results"].as_array().unwrap().is_empty());

        let nested = dir.path().join("a").join("b").join("metrics.json");
        write_metrics(&report, &nested).unwrap();
        assert!(nested.exists());
    }

    #[test]
    fn case_summaries_follow_record_order() {
        let mut metrics = Metrics::default();
        metrics.case_target.insert("a".into(), 1.0);
        metrics.case_pred.insert("a".into(), 0.8);
        metrics
            .lesion_results
            .insert("a".into(), vec![LesionResult::hit(0.7, 0.4)]);
        metrics.num_candidates.insert("a".into(), 1);

        let cases = vec![CaseRecord {
            subject_id: "a".into(),
            job_pk: "j1".into(),
            detection_map: PathBuf::from("det.mha"),
            likelihood: 0.8,
            ground_truth: PathBuf::from("a.nii.gz"),
        }];
        let summaries = case_summaries(&metrics, &cases);
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].num_lesions, 1);
        assert_eq!(summaries[0].num_candidates, 1);
        assert_eq!(summaries[0].case_target, 1.0);
    }
}
