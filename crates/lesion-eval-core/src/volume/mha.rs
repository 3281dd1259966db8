//! MetaImage reader.
//!
//! Header is `Key = Value` text lines ending with `ElementDataFile`. With
//! `ElementDataFile = LOCAL` pixel data follows the header in the same file
//! (`.mha`); otherwise it names a raw file next to the header (`.mhd`).

use super::{decode_samples, fold_dims, voxel_count, SampleKind, Volume};
use flate2::read::ZlibDecoder;
use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

#[derive(Debug)]
struct MetaHeader {
    fields: HashMap<String, String>,
    data_offset: usize,
}

impl MetaHeader {
    fn get(&self, key: &str) -> Option<&str> {
        self.fields
            .get(&key.to_ascii_lowercase())
            .map(String::as_str)
    }

    fn require(&self, key: &str) -> Result<&str, String> {
        self.get(key)
            .ok_or_else(|| format!("MetaImage header is missing {}", key))
    }

    fn flag(&self, key: &str) -> bool {
        self.get(key)
            .is_some_and(|v| v.eq_ignore_ascii_case("true") || v == "1")
    }
}

fn parse_header(bytes: &[u8]) -> Result<MetaHeader, String> {
    let mut fields = HashMap::new();
    let mut pos = 0;

    while pos < bytes.len() {
        let end = bytes[pos..]
            .iter()
            .position(|&b| b == b'\n')
            .map(|i| pos + i)
            .unwrap_or(bytes.len());
        let line = std::str::from_utf8(&bytes[pos..end])
            .map_err(|_| "MetaImage header is not text".to_string())?
            .trim();
        pos = (end + 1).min(bytes.len());

        if line.is_empty() {
            continue;
        }
        let (key, value) = line
            .split_once('=')
            .ok_or_else(|| format!("malformed MetaImage header line: {:?}", line))?;
        let key = key.trim().to_ascii_lowercase();
        let done = key == "elementdatafile";
        fields.insert(key, value.trim().to_string());
        if done {
            return Ok(MetaHeader {
                fields,
                data_offset: pos,
            });
        }
    }

    Err("MetaImage header has no ElementDataFile entry".to_string())
}

fn element_kind(name: &str) -> Result<SampleKind, String> {
    Ok(match name {
        "MET_UCHAR" => SampleKind::U8,
        "MET_CHAR" => SampleKind::I8,
        "MET_USHORT" => SampleKind::U16,
        "MET_SHORT" => SampleKind::I16,
        "MET_UINT" | "MET_ULONG" => SampleKind::U32,
        "MET_INT" | "MET_LONG" => SampleKind::I32,
        "MET_ULONG_LONG" => SampleKind::U64,
        "MET_LONG_LONG" => SampleKind::I64,
        "MET_FLOAT" => SampleKind::F32,
        "MET_DOUBLE" => SampleKind::F64,
        other => return Err(format!("unsupported MetaImage element type {}", other)),
    })
}

pub fn read_mha(path: &Path) -> Result<Volume, String> {
    let bytes = std::fs::read(path).map_err(|e| e.to_string())?;
    let header = parse_header(&bytes)?;

    let extent: Vec<usize> = header
        .require("DimSize")?
        .split_whitespace()
        .map(|d| {
            d.parse::<usize>()
                .map_err(|_| format!("invalid DimSize entry {:?}", d))
        })
        .collect::<Result<_, _>>()?;
    if let Some(ndims) = header.get("NDims") {
        let ndims: usize = ndims
            .parse()
            .map_err(|_| format!("invalid NDims {:?}", ndims))?;
        if ndims != extent.len() {
            return Err(format!(
                "NDims is {} but DimSize has {} entries",
                ndims,
                extent.len()
            ));
        }
    }
    let dims = fold_dims(&extent)?;

    let channels = header.get("ElementNumberOfChannels").unwrap_or("1");
    if channels != "1" {
        return Err(format!(
            "only single-channel images are supported (ElementNumberOfChannels = {})",
            channels
        ));
    }

    let kind = element_kind(header.require("ElementType")?)?;
    let big_endian =
        header.flag("BinaryDataByteOrderMSB") || header.flag("ElementByteOrderMSB");

    let data_file = header.require("ElementDataFile")?;
    let raw: Vec<u8> = if data_file.eq_ignore_ascii_case("LOCAL") {
        bytes[header.data_offset..].to_vec()
    } else {
        let base = path.parent().unwrap_or_else(|| Path::new("."));
        std::fs::read(base.join(data_file))
            .map_err(|e| format!("cannot read data file {}: {}", data_file, e))?
    };

    let raw = if header.flag("CompressedData") {
        let mut out = Vec::new();
        ZlibDecoder::new(raw.as_slice())
            .read_to_end(&mut out)
            .map_err(|e| format!("cannot inflate pixel data: {}", e))?;
        out
    } else {
        raw
    };

    let count = voxel_count(dims)?;
    let data = decode_samples(&raw, kind, count, big_endian)?;
    Volume::new(dims, data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::ZlibEncoder;
    use flate2::Compression;
    use std::io::Write;

    fn header(dims: &str, element: &str, extra: &str) -> String {
        format!(
            "ObjectType = Image\nNDims = 3\nBinaryData = True\n{extra}DimSize = {dims}\nElementType = {element}\nElementDataFile = LOCAL\n"
        )
    }

    #[test]
    fn reads_local_uncompressed_data() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("det.mha");
        let mut bytes = header("2 1 1", "MET_FLOAT", "").into_bytes();
        bytes.extend_from_slice(&0.25f32.to_le_bytes());
        bytes.extend_from_slice(&0.5f32.to_le_bytes());
        std::fs::write(&path, bytes).unwrap();

        let vol = read_mha(&path).unwrap();
        assert_eq!(vol.dims, [2, 1, 1]);
        assert_eq!(vol.data, vec![0.25, 0.5]);
    }

    #[test]
    fn reads_zlib_compressed_data() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("det.mha");
        let mut enc = ZlibEncoder::new(Vec::new(), Compression::default());
        enc.write_all(&[0u8, 3, 0, 7]).unwrap();
        let compressed = enc.finish().unwrap();

        let mut bytes =
            header("2 2 1", "MET_UCHAR", "CompressedData = True\n").into_bytes();
        bytes.extend_from_slice(&compressed);
        std::fs::write(&path, bytes).unwrap();

        let vol = read_mha(&path).unwrap();
        assert_eq!(vol.data, vec![0.0, 3.0, 0.0, 7.0]);
    }

    #[test]
    fn reads_detached_raw_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("det.raw"), [1u8, 2]).unwrap();
        let path = dir.path().join("det.mhd");
        std::fs::write(
            &path,
            "NDims = 2\nDimSize = 2 1\nElementType = MET_UCHAR\nElementDataFile = det.raw\n",
        )
        .unwrap();

        let vol = read_mha(&path).unwrap();
        assert_eq!(vol.dims, [2, 1, 1]);
        assert_eq!(vol.data, vec![1.0, 2.0]);
    }

    #[test]
    fn rejects_multichannel_and_mismatched_ndims() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rgb.mha");
        let mut bytes =
            header("1 1 1", "MET_UCHAR", "ElementNumberOfChannels = 3\n").into_bytes();
        bytes.extend_from_slice(&[0, 0, 0]);
        std::fs::write(&path, bytes).unwrap();
        assert!(read_mha(&path).unwrap_err().contains("single-channel"));

        let path = dir.path().join("bad.mha");
        let mut bytes = header("1 1", "MET_UCHAR", "").into_bytes();
        bytes.push(0);
        std::fs::write(&path, bytes).unwrap();
        assert!(read_mha(&path).unwrap_err().contains("NDims"));
    }

    #[test]
    fn rejects_extent_whose_voxel_count_overflows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("huge.mha");
        let bytes = header("4294967296 4294967296 1", "MET_FLOAT", "").into_bytes();
        std::fs::write(&path, bytes).unwrap();

        let err = read_mha(&path).unwrap_err();
        if cfg!(target_pointer_width = "64") {
            assert!(err.contains("too large"), "{err}");
        }
    }
}
