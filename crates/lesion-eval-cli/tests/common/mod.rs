#![allow(dead_code)]

use assert_cmd::Command;
use flate2::write::GzEncoder;
use flate2::Compression;
use serde_json::{json, Value};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub const DIMS: [usize; 3] = [4, 4, 2];
pub const VOXELS: usize = 32;

/// Full container layout: /input, /output and the ground truth directory.
pub struct Submission {
    pub root: TempDir,
    jobs: Vec<Value>,
}

impl Submission {
    pub fn new() -> Self {
        let root = tempfile::tempdir().unwrap();
        fs::create_dir_all(root.path().join("input")).unwrap();
        fs::create_dir_all(root.path().join("ground_truth")).unwrap();
        Self {
            root,
            jobs: Vec::new(),
        }
    }

    pub fn input_dir(&self) -> PathBuf {
        self.root.path().join("input")
    }

    pub fn output_dir(&self) -> PathBuf {
        self.root.path().join("output")
    }

    pub fn ground_truth_dir(&self) -> PathBuf {
        self.root.path().join("ground_truth")
    }

    pub fn metrics_path(&self) -> PathBuf {
        self.output_dir().join("metrics.json")
    }

    /// Adds a panorama job for `subject` with detection map and likelihood outputs.
    pub fn add_case(&mut self, pk: &str, subject: &str, likelihood: f64, det: &[f32]) -> &mut Self {
        let out = self.input_dir().join(pk).join("output");
        let det_dir = out.join("images/pdac-detection-map");
        fs::create_dir_all(&det_dir).unwrap();
        fs::write(out.join("pdac-likelihood.json"), likelihood.to_string()).unwrap();
        write_mha(&det_dir.join("detection.mha"), DIMS, det);

        self.jobs.push(json!({
            "pk": pk,
            "inputs": [{
                "interface": {"slug": "venous-phase-ct-scan", "relative_path": "images/venous-phase-ct"},
                "image": {"name": format!("{subject}_0000.mha"), "pk": format!("img-{pk}")}
            }],
            "outputs": [
                {"interface": {"slug": "pdac-likelihood", "relative_path": "pdac-likelihood.json"}, "image": null},
                {"interface": {"slug": "pdac-detection-map", "relative_path": "images/pdac-detection-map"},
                 "image": {"name": "detection.mha", "pk": format!("det-{pk}")}}
            ]
        }));
        self
    }

    pub fn add_ground_truth(&self, subject: &str, labels: &[u8]) -> &Self {
        write_nii_gz(
            &self.ground_truth_dir().join(format!("{subject}.nii.gz")),
            DIMS,
            labels,
        );
        self
    }

    /// Appends a raw manifest entry without creating any files.
    pub fn push_raw_job(&mut self, job: Value) -> &mut Self {
        self.jobs.push(job);
        self
    }

    pub fn write_manifest(&self) {
        fs::write(
            self.input_dir().join("predictions.json"),
            serde_json::to_string_pretty(&self.jobs).unwrap(),
        )
        .unwrap();
    }

    pub fn command(&self) -> Command {
        let mut cmd = Command::cargo_bin("lesion-eval").unwrap();
        cmd.env_remove("RUST_LOG")
            .env_remove("LESION_EVAL_INCLUDE_CASE_RESULTS")
            .arg("--input-dir")
            .arg(self.input_dir())
            .arg("--output-dir")
            .arg(self.output_dir())
            .arg("--ground-truth-dir")
            .arg(self.ground_truth_dir());
        cmd
    }

    pub fn read_metrics(&self) -> Value {
        serde_json::from_str(&fs::read_to_string(self.metrics_path()).unwrap()).unwrap()
    }
}

pub fn write_mha(path: &Path, dims: [usize; 3], data: &[f32]) {
    let mut bytes = format!(
        "ObjectType = Image\nNDims = 3\nBinaryData = True\nBinaryDataByteOrderMSB = False\nDimSize = {} {} {}\nElementType = MET_FLOAT\nElementDataFile = LOCAL\n",
        dims[0], dims[1], dims[2]
    )
    .into_bytes();
    for v in data {
        bytes.extend_from_slice(&v.to_le_bytes());
    }
    fs::write(path, bytes).unwrap();
}

pub fn write_nii_gz(path: &Path, dims: [usize; 3], labels: &[u8]) {
    let mut h = vec![0u8; 352];
    h[0..4].copy_from_slice(&348i32.to_le_bytes());
    h[40..42].copy_from_slice(&3i16.to_le_bytes());
    for (i, d) in dims.iter().enumerate() {
        h[42 + 2 * i..44 + 2 * i].copy_from_slice(&(*d as i16).to_le_bytes());
    }
    h[70..72].copy_from_slice(&2i16.to_le_bytes());
    h[72..74].copy_from_slice(&8i16.to_le_bytes());
    h[108..112].copy_from_slice(&352f32.to_le_bytes());
    h[344..348].copy_from_slice(b"n+1\0");
    h.extend_from_slice(labels);

    let mut enc = GzEncoder::new(Vec::new(), Compression::default());
    enc.write_all(&h).unwrap();
    fs::write(path, enc.finish().unwrap()).unwrap();
}
