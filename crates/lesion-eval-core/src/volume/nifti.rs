//! Single-file NIfTI-1 reader (`n+1` magic), optionally gzip-compressed.

use super::{decode_samples, fold_dims, voxel_count, SampleKind, Volume};
use flate2::read::GzDecoder;
use std::io::Read;
use std::path::Path;

const HEADER_SIZE: usize = 348;
const NIFTI2_HEADER_SIZE: i32 = 540;

struct Fields<'a> {
    bytes: &'a [u8],
    big_endian: bool,
}

impl Fields<'_> {
    fn raw<const N: usize>(&self, offset: usize) -> [u8; N] {
        let mut out = [0u8; N];
        out.copy_from_slice(&self.bytes[offset..offset + N]);
        if self.big_endian {
            out.reverse();
        }
        out
    }

    fn i16(&self, offset: usize) -> i16 {
        i16::from_le_bytes(self.raw(offset))
    }

    fn f32(&self, offset: usize) -> f32 {
        f32::from_le_bytes(self.raw(offset))
    }
}

fn datatype_kind(code: i16) -> Result<SampleKind, String> {
    Ok(match code {
        2 => SampleKind::U8,
        4 => SampleKind::I16,
        8 => SampleKind::I32,
        16 => SampleKind::F32,
        64 => SampleKind::F64,
        256 => SampleKind::I8,
        512 => SampleKind::U16,
        768 => SampleKind::U32,
        1024 => SampleKind::I64,
        1280 => SampleKind::U64,
        other => return Err(format!("unsupported NIfTI datatype {}", other)),
    })
}

fn inflate_if_gzip(bytes: Vec<u8>) -> Result<Vec<u8>, String> {
    if bytes.starts_with(&[0x1f, 0x8b]) {
        let mut out = Vec::new();
        GzDecoder::new(bytes.as_slice())
            .read_to_end(&mut out)
            .map_err(|e| format!("cannot decompress gzip stream: {}", e))?;
        Ok(out)
    } else {
        Ok(bytes)
    }
}

pub fn read_nifti(path: &Path) -> Result<Volume, String> {
    let bytes = inflate_if_gzip(std::fs::read(path).map_err(|e| e.to_string())?)?;
    parse_nifti(&bytes)
}

pub(crate) fn parse_nifti(bytes: &[u8]) -> Result<Volume, String> {
    if bytes.len() < HEADER_SIZE {
        return Err(format!("file too short for a NIfTI header ({} bytes)", bytes.len()));
    }

    let head = [bytes[0], bytes[1], bytes[2], bytes[3]];
    let big_endian = match (i32::from_le_bytes(head), i32::from_be_bytes(head)) {
        (348, _) => false,
        (_, 348) => true,
        (NIFTI2_HEADER_SIZE, _) | (_, NIFTI2_HEADER_SIZE) => {
            return Err("NIfTI-2 files are not supported".to_string())
        }
        (other, _) => return Err(format!("not a NIfTI-1 file (sizeof_hdr = {})", other)),
    };
    let fields = Fields { bytes, big_endian };

    let magic = &bytes[344..348];
    if magic != b"n+1\0" {
        return Err(format!(
            "unsupported NIfTI magic {:?} (only single-file n+1 is supported)",
            String::from_utf8_lossy(magic)
        ));
    }

    let ndim = fields.i16(40);
    if !(1..=7).contains(&ndim) {
        return Err(format!("invalid NIfTI dim[0] = {}", ndim));
    }
    let extent: Vec<usize> = (1..=ndim as usize)
        .map(|i| {
            let d = fields.i16(40 + 2 * i);
            usize::try_from(d).map_err(|_| format!("invalid NIfTI dim[{}] = {}", i, d))
        })
        .collect::<Result<_, _>>()?;
    let dims = fold_dims(&extent)?;

    let kind = datatype_kind(fields.i16(70))?;
    let vox_offset = fields.f32(108);
    if !vox_offset.is_finite() || vox_offset < HEADER_SIZE as f32 {
        return Err(format!("invalid NIfTI vox_offset {}", vox_offset));
    }
    let offset = vox_offset as usize;
    if offset > bytes.len() {
        return Err(format!("vox_offset {} is past end of file", offset));
    }

    let count = voxel_count(dims)?;
    let mut data = decode_samples(&bytes[offset..], kind, count, big_endian)?;

    let slope = fields.f32(112);
    let inter = fields.f32(116);
    if slope.is_finite() && slope != 0.0 && !(slope == 1.0 && inter == 0.0) {
        let inter = if inter.is_finite() { inter } else { 0.0 };
        for v in &mut data {
            *v = *v * slope + inter;
        }
    }

    Volume::new(dims, data)
}
