//! Volume loading for detection maps and ground-truth labels.
//!
//! Supports MetaImage (`.mha`, `.mhd` + raw) and single-file NIfTI-1
//! (`.nii`, `.nii.gz`). Every sample is converted to `f32`; voxels are kept
//! in file order, x fastest, which both formats share.

pub mod mha;
pub mod nifti;

use crate::errors::{EvalError, EvalResult};
use std::path::Path;

/// A scalar 3-D image. 1-D and 2-D images are padded with unit dimensions.
#[derive(Debug, Clone, PartialEq)]
pub struct Volume {
    /// Extent along x, y, z.
    pub dims: [usize; 3],
    pub data: Vec<f32>,
}

impl Volume {
    pub fn new(dims: [usize; 3], data: Vec<f32>) -> Result<Self, String> {
        let expected = voxel_count(dims)?;
        if data.len() != expected {
            return Err(format!(
                "{} samples for dims {:?} (expected {})",
                data.len(),
                dims,
                expected
            ));
        }
        Ok(Self { dims, data })
    }

    /// Largest sample, 0 for an empty volume.
    pub fn max(&self) -> f32 {
        if self.data.is_empty() {
            return 0.0;
        }
        self.data.iter().copied().fold(f32::NEG_INFINITY, f32::max)
    }

    pub fn map_in_place(&mut self, f: impl Fn(f32) -> f32) {
        for v in &mut self.data {
            *v = f(*v);
        }
    }
}

/// Loads a volume, picking the reader from the file name.
pub fn read_volume(path: &Path) -> EvalResult<Volume> {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();

    let result = if name.ends_with(".nii") || name.ends_with(".nii.gz") {
        nifti::read_nifti(path)
    } else if name.ends_with(".mha") || name.ends_with(".mhd") {
        mha::read_mha(path)
    } else {
        Err(format!("unsupported volume format: {}", name))
    };

    result.map_err(|message| EvalError::volume(path, message))
}

/// On-disk sample type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleKind {
    U8,
    I8,
    U16,
    I16,
    U32,
    I32,
    U64,
    I64,
    F32,
    F64,
}

impl SampleKind {
    pub fn size(&self) -> usize {
        match self {
            Self::U8 | Self::I8 => 1,
            Self::U16 | Self::I16 => 2,
            Self::U32 | Self::I32 | Self::F32 => 4,
            Self::U64 | Self::I64 | Self::F64 => 8,
        }
    }
}

/// Decodes `count` samples from the front of `bytes`.
pub(crate) fn decode_samples(
    bytes: &[u8],
    kind: SampleKind,
    count: usize,
    big_endian: bool,
) -> Result<Vec<f32>, String> {
    let size = kind.size();
    let needed = count
        .checked_mul(size)
        .ok_or_else(|| format!("volume of {} samples is too large", count))?;
    if bytes.len() < needed {
        return Err(format!(
            "truncated pixel data: {} bytes, expected {}",
            bytes.len(),
            needed
        ));
    }

    let samples = bytes[..needed].chunks_exact(size).map(|chunk| {
        let mut buf = [0u8; 8];
        buf[..size].copy_from_slice(chunk);
        if big_endian {
            buf[..size].reverse();
        }
        match kind {
            SampleKind::U8 => f32::from(buf[0]),
            SampleKind::I8 => f32::from(buf[0] as i8),
            SampleKind::U16 => f32::from(u16::from_le_bytes([buf[0], buf[1]])),
            SampleKind::I16 => f32::from(i16::from_le_bytes([buf[0], buf[1]])),
            SampleKind::U32 => u32::from_le_bytes([buf[0], buf[1], buf[2], buf[3]]) as f32,
            SampleKind::I32 => i32::from_le_bytes([buf[0], buf[1], buf[2], buf[3]]) as f32,
            SampleKind::F32 => f32::from_le_bytes([buf[0], buf[1], buf[2], buf[3]]),
            SampleKind::U64 => u64::from_le_bytes(buf) as f32,
            SampleKind::I64 => i64::from_le_bytes(buf) as f32,
            SampleKind::F64 => f64::from_le_bytes(buf) as f32,
        }
    });
    Ok(samples.collect())
}

/// Folds an N-d extent into x/y/z. Trailing dimensions beyond z must be 1.
pub(crate) fn fold_dims(extent: &[usize]) -> Result<[usize; 3], String> {
    if extent.is_empty() {
        return Err("image has no dimensions".to_string());
    }
    if let Some(extra) = extent.iter().skip(3).find(|&&d| d != 1) {
        return Err(format!(
            "only scalar 3-D images are supported (extra dimension of size {})",
            extra
        ));
    }
    let mut dims = [1usize; 3];
    for (slot, &d) in dims.iter_mut().zip(extent) {
        *slot = d;
    }
    voxel_count(dims)?;
    Ok(dims)
}

/// Number of voxels in `dims`; header extents are untrusted, so overflow is an error.
pub(crate) fn voxel_count(dims: [usize; 3]) -> Result<usize, String> {
    dims.iter()
        .try_fold(1usize, |acc, &d| acc.checked_mul(d))
        .ok_or_else(|| format!("volume too large: dims {:?}", dims))
}
