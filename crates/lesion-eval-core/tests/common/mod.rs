#![allow(dead_code)]

use serde_json::{json, Value};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Container input directory laid out the way the platform mounts it.
pub struct InputFixture {
    pub dir: TempDir,
    jobs: Vec<Value>,
}

impl InputFixture {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().unwrap(),
            jobs: Vec::new(),
        }
    }

    pub fn input_dir(&self) -> &Path {
        self.dir.path()
    }

    pub fn ground_truth_dir(&self) -> PathBuf {
        self.dir.path().join("ground_truth")
    }

    /// Adds a panorama job with likelihood file and (empty) detection map.
    pub fn add_job(&mut self, pk: &str, image_name: &str, likelihood: f64) -> &mut Self {
        let out = self.dir.path().join(pk).join("output");
        fs::create_dir_all(out.join("images/pdac-detection-map")).unwrap();
        fs::write(out.join("pdac-likelihood.json"), likelihood.to_string()).unwrap();
        fs::write(out.join("images/pdac-detection-map/det.mha"), b"").unwrap();

        self.jobs.push(json!({
            "pk": pk,
            "inputs": [{
                "interface": {"slug": "venous-phase-ct-scan", "relative_path": "images/venous-phase-ct"},
                "image": {"name": image_name, "pk": format!("img-{pk}")}
            }],
            "outputs": [
                {"interface": {"slug": "pdac-likelihood", "relative_path": "pdac-likelihood.json"}, "image": null},
                {"interface": {"slug": "pdac-detection-map", "relative_path": "images/pdac-detection-map"},
                 "image": {"name": "det.mha", "pk": format!("det-{pk}")}}
            ]
        }));
        self
    }

    /// Adds a job whose outputs lack the detection map slug.
    pub fn add_job_without_detection_map(&mut self, pk: &str, image_name: &str) -> &mut Self {
        let out = self.dir.path().join(pk).join("output");
        fs::create_dir_all(&out).unwrap();
        fs::write(out.join("pdac-likelihood.json"), "0.5").unwrap();
        self.jobs.push(json!({
            "pk": pk,
            "inputs": [{
                "interface": {"slug": "venous-phase-ct-scan", "relative_path": "images/venous-phase-ct"},
                "image": {"name": image_name, "pk": "img"}
            }],
            "outputs": [
                {"interface": {"slug": "pdac-likelihood", "relative_path": "pdac-likelihood.json"}, "image": null}
            ]
        }));
        self
    }

    pub fn write_manifest(&self) -> PathBuf {
        let path = self.dir.path().join("predictions.json");
        fs::write(&path, serde_json::to_string_pretty(&self.jobs).unwrap()).unwrap();
        path
    }
}
