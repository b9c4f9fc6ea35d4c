//! Reading and writing precomputed 1-D array artifacts (`.json` and `.npy`).

use crate::types::{DatasetError, DatasetResult};
use serde::Serialize;
use std::fs;
use std::path::Path;

const NPY_MAGIC: &[u8] = b"\x93NUMPY";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NpyKind {
    Int,
    UInt,
    Float,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct NpyDtype {
    kind: NpyKind,
    width: usize,
    big_endian: bool,
}

struct NpyArray<'a> {
    dtype: NpyDtype,
    len: usize,
    data: &'a [u8],
}

enum ArtifactFormat {
    Json,
    Npy,
}

fn format_of(path: &Path) -> DatasetResult<ArtifactFormat> {
    match path.extension().and_then(|s| s.to_str()) {
        Some("json") => Ok(ArtifactFormat::Json),
        Some("npy") => Ok(ArtifactFormat::Npy),
        other => Err(DatasetError::artifact(
            path,
            format!("unsupported artifact extension {other:?} (expected .json or .npy)"),
        )),
    }
}

fn read_bytes(path: &Path) -> DatasetResult<Vec<u8>> {
    fs::read(path).map_err(|e| DatasetError::io(path, e))
}

/// Load an integer array, e.g. a precomputed sampling index.
pub fn load_int_array(path: &Path) -> DatasetResult<Vec<i64>> {
    let raw = read_bytes(path)?;
    match format_of(path)? {
        ArtifactFormat::Json => serde_json::from_slice(&raw).map_err(|e| DatasetError::Json {
            path: path.to_path_buf(),
            source: e,
        }),
        ArtifactFormat::Npy => {
            let arr = parse_npy(&raw).map_err(|msg| DatasetError::artifact(path, msg))?;
            if arr.dtype.kind == NpyKind::Float {
                return Err(DatasetError::artifact(
                    path,
                    "expected an integer array, found floating point data",
                ));
            }
            arr.to_i64().map_err(|msg| DatasetError::artifact(path, msg))
        }
    }
}

/// Load a float array, e.g. a precomputed label weight vector.
pub fn load_float_array(path: &Path) -> DatasetResult<Vec<f32>> {
    let raw = read_bytes(path)?;
    match format_of(path)? {
        ArtifactFormat::Json => serde_json::from_slice(&raw).map_err(|e| DatasetError::Json {
            path: path.to_path_buf(),
            source: e,
        }),
        ArtifactFormat::Npy => {
            let arr = parse_npy(&raw).map_err(|msg| DatasetError::artifact(path, msg))?;
            arr.to_f32().map_err(|msg| DatasetError::artifact(path, msg))
        }
    }
}

/// Write a JSON array artifact, creating parent directories as needed.
pub fn save_json_array<T: Serialize>(path: &Path, values: &[T]) -> DatasetResult<()> {
    ensure_parent(path)?;
    let data = serde_json::to_vec(values).map_err(|e| DatasetError::Json {
        path: path.to_path_buf(),
        source: e,
    })?;
    fs::write(path, data).map_err(|e| DatasetError::io(path, e))
}

/// Write a sampling index as a little-endian `int32` `.npy` file.
pub fn save_npy_index(path: &Path, values: &[usize]) -> DatasetResult<()> {
    let mut body = Vec::with_capacity(values.len() * 4);
    for &v in values {
        let v = i32::try_from(v)
            .map_err(|_| DatasetError::artifact(path, format!("index {v} does not fit in int32")))?;
        body.extend_from_slice(&v.to_le_bytes());
    }
    write_npy(path, "<i4", values.len(), &body)
}

/// Write label weights as a little-endian `float32` `.npy` file.
pub fn save_npy_weights(path: &Path, values: &[f32]) -> DatasetResult<()> {
    let mut body = Vec::with_capacity(values.len() * 4);
    for v in values {
        body.extend_from_slice(&v.to_le_bytes());
    }
    write_npy(path, "<f4", values.len(), &body)
}

fn ensure_parent(path: &Path) -> DatasetResult<()> {
    let parent = path.parent().unwrap_or_else(|| Path::new("."));
    if !parent.as_os_str().is_empty() && !parent.exists() {
        fs::create_dir_all(parent).map_err(|e| DatasetError::io(parent, e))?;
    }
    Ok(())
}

fn write_npy(path: &Path, descr: &str, len: usize, body: &[u8]) -> DatasetResult<()> {
    ensure_parent(path)?;
    let mut header = format!("{{'descr': '{descr}', 'fortran_order': False, 'shape': ({len},), }}");
    // magic(6) + version(2) + header_len(2) + header + '\n' must be a multiple of 64
    let unpadded = NPY_MAGIC.len() + 2 + 2 + header.len() + 1;
    let pad = (64 - unpadded % 64) % 64;
    header.push_str(&" ".repeat(pad));
    header.push('\n');

    let mut out = Vec::with_capacity(NPY_MAGIC.len() + 4 + header.len() + body.len());
    out.extend_from_slice(NPY_MAGIC);
    out.extend_from_slice(&[1, 0]);
    out.extend_from_slice(&(header.len() as u16).to_le_bytes());
    out.extend_from_slice(header.as_bytes());
    out.extend_from_slice(body);
    fs::write(path, out).map_err(|e| DatasetError::io(path, e))
}

fn parse_npy(raw: &[u8]) -> Result<NpyArray<'_>, String> {
    if raw.len() < 10 || &raw[..6] != NPY_MAGIC {
        return Err("missing NUMPY magic".to_string());
    }
    let major = raw[6];
    let (header_len, header_start) = match major {
        1 => (u16::from_le_bytes([raw[8], raw[9]]) as usize, 10),
        2 | 3 => {
            if raw.len() < 12 {
                return Err("truncated npy header".to_string());
            }
            (
                u32::from_le_bytes([raw[8], raw[9], raw[10], raw[11]]) as usize,
                12,
            )
        }
        v => return Err(format!("unsupported npy version {v}")),
    };
    let data_start = header_start + header_len;
    if raw.len() < data_start {
        return Err("truncated npy header".to_string());
    }
    let header = std::str::from_utf8(&raw[header_start..data_start])
        .map_err(|_| "npy header is not valid text".to_string())?;

    let descr = header_value(header, "descr")
        .and_then(|v| v.split('\'').nth(1))
        .ok_or_else(|| "npy header has no descr".to_string())?;
    let dtype = parse_descr(descr)?;
    let shape = header_value(header, "shape")
        .and_then(|v| {
            let open = v.find('(')?;
            let close = v.find(')')?;
            Some(&v[open + 1..close])
        })
        .ok_or_else(|| "npy header has no shape".to_string())?;
    let dims: Vec<usize> = shape
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.parse::<usize>().map_err(|_| format!("bad shape entry {s:?}")))
        .collect::<Result<_, _>>()?;
    if dims.len() > 1 && dims.iter().filter(|&&d| d != 1).count() > 1 {
        return Err(format!("expected a 1-D array, found shape {dims:?}"));
    }
    let len = dims
        .iter()
        .try_fold(1usize, |acc, &d| acc.checked_mul(d))
        .ok_or_else(|| format!("npy shape {dims:?} overflows"))?;
    let byte_len = len
        .checked_mul(dtype.width)
        .ok_or_else(|| format!("npy shape {dims:?} overflows"))?;
    let data = &raw[data_start..];
    if data.len() < byte_len {
        return Err(format!(
            "npy body has {} bytes, expected {byte_len}",
            data.len()
        ));
    }
    Ok(NpyArray {
        dtype,
        len,
        data: &data[..byte_len],
    })
}

fn header_value<'a>(header: &'a str, key: &str) -> Option<&'a str> {
    let needle = format!("'{key}':");
    let at = header.find(&needle)?;
    Some(header[at + needle.len()..].trim_start())
}

fn parse_descr(descr: &str) -> Result<NpyDtype, String> {
    let mut chars = descr.chars();
    let (big_endian, rest) = match chars.next() {
        Some('<') | Some('=') | Some('|') => (false, chars.as_str()),
        Some('>') => (true, chars.as_str()),
        _ => (false, descr),
    };
    if rest.len() < 2 || !rest.is_char_boundary(1) {
        return Err(format!("bad npy dtype {descr:?}"));
    }
    let (kind, width) = rest.split_at(1);
    let kind = match kind {
        "i" => NpyKind::Int,
        "u" => NpyKind::UInt,
        "f" => NpyKind::Float,
        other => return Err(format!("unsupported npy dtype kind {other:?}")),
    };
    let width: usize = width
        .parse()
        .map_err(|_| format!("bad npy dtype width in {descr:?}"))?;
    let supported = match kind {
        NpyKind::Float => matches!(width, 4 | 8),
        _ => matches!(width, 1 | 2 | 4 | 8),
    };
    if !supported {
        return Err(format!("unsupported npy dtype {descr:?}"));
    }
    Ok(NpyDtype {
        kind,
        width,
        big_endian,
    })
}

impl NpyArray<'_> {
    fn chunk<const N: usize>(&self, i: usize) -> [u8; N] {
        let mut buf = [0u8; N];
        buf.copy_from_slice(&self.data[i * N..(i + 1) * N]);
        if self.dtype.big_endian {
            buf.reverse();
        }
        buf
    }

    fn to_i64(&self) -> Result<Vec<i64>, String> {
        (0..self.len)
            .map(|i| match (self.dtype.kind, self.dtype.width) {
                (NpyKind::Int, 1) => Ok(i8::from_le_bytes(self.chunk::<1>(i)) as i64),
                (NpyKind::Int, 2) => Ok(i16::from_le_bytes(self.chunk::<2>(i)) as i64),
                (NpyKind::Int, 4) => Ok(i32::from_le_bytes(self.chunk::<4>(i)) as i64),
                (NpyKind::Int, 8) => Ok(i64::from_le_bytes(self.chunk::<8>(i))),
                (NpyKind::UInt, 1) => Ok(self.chunk::<1>(i)[0] as i64),
                (NpyKind::UInt, 2) => Ok(u16::from_le_bytes(self.chunk::<2>(i)) as i64),
                (NpyKind::UInt, 4) => Ok(u32::from_le_bytes(self.chunk::<4>(i)) as i64),
                (NpyKind::UInt, 8) => i64::try_from(u64::from_le_bytes(self.chunk::<8>(i)))
                    .map_err(|_| format!("value at {i} overflows int64")),
                (kind, width) => Err(format!("cannot read {kind:?}{width} as integer")),
            })
            .collect()
    }

    fn to_f32(&self) -> Result<Vec<f32>, String> {
        match self.dtype.kind {
            NpyKind::Float => Ok((0..self.len)
                .map(|i| match self.dtype.width {
                    4 => f32::from_le_bytes(self.chunk::<4>(i)),
                    _ => f64::from_le_bytes(self.chunk::<8>(i)) as f32,
                })
                .collect()),
            _ => Ok(self.to_i64()?.into_iter().map(|v| v as f32).collect()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn npy_bytes(descr: &str, shape: &str, body: &[u8]) -> Vec<u8> {
        let header = format!("{{'descr': '{descr}', 'fortran_order': False, 'shape': {shape}, }}\n");
        let mut out = NPY_MAGIC.to_vec();
        out.extend_from_slice(&[1, 0]);
        out.extend_from_slice(&(header.len() as u16).to_le_bytes());
        out.extend_from_slice(header.as_bytes());
        out.extend_from_slice(body);
        out
    }

    #[test]
    fn reads_int32_npy() {
        let body: Vec<u8> = [0i32, 0, 1, 2].iter().flat_map(|v| v.to_le_bytes()).collect();
        let raw = npy_bytes("<i4", "(4,)", &body);
        let arr = parse_npy(&raw).unwrap();
        assert_eq!(arr.to_i64().unwrap(), vec![0, 0, 1, 2]);
    }

    #[test]
    fn reads_float64_as_f32() {
        let body: Vec<u8> = [1.5f64, 2.0].iter().flat_map(|v| v.to_le_bytes()).collect();
        let raw = npy_bytes("<f8", "(2,)", &body);
        assert_eq!(parse_npy(&raw).unwrap().to_f32().unwrap(), vec![1.5, 2.0]);
    }

    #[test]
    fn reads_big_endian() {
        let body: Vec<u8> = [7i64, 300].iter().flat_map(|v| v.to_be_bytes()).collect();
        let raw = npy_bytes(">i8", "(2,)", &body);
        assert_eq!(parse_npy(&raw).unwrap().to_i64().unwrap(), vec![7, 300]);
    }

    #[test]
    fn rejects_2d_and_truncated() {
        let raw = npy_bytes("<i4", "(2, 2)", &[0u8; 16]);
        assert!(parse_npy(&raw).is_err());
        let raw = npy_bytes("<i4", "(4,)", &[0u8; 8]);
        assert!(parse_npy(&raw).is_err());
        assert!(parse_npy(b"not an npy file").is_err());
    }

    #[test]
    fn oversized_shape_is_an_error() {
        let raw = npy_bytes("<i8", "(2305843009213693952,)", &[0u8; 16]);
        let err = parse_npy(&raw).err().unwrap();
        assert!(err.contains("overflows"), "{err}");

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("huge.npy");
        fs::write(&path, &raw).unwrap();
        let err = load_int_array(&path).unwrap_err();
        assert!(matches!(err, DatasetError::Artifact { .. }));
    }

    #[test]
    fn written_header_is_aligned() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("idx.npy");
        save_npy_index(&path, &[0, 0, 1, 2, 3, 4, 4]).unwrap();
        let raw = fs::read(&path).unwrap();
        let header_len = u16::from_le_bytes([raw[8], raw[9]]) as usize;
        assert_eq!((10 + header_len) % 64, 0);
        assert_eq!(load_int_array(&path).unwrap(), vec![0, 0, 1, 2, 3, 4, 4]);
    }
}
