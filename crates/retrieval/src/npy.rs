//! Minimal reader for the NumPy `.npy` format, enough to load a 2-D,
//! C-ordered, little-endian `float32` or `float64` embedding matrix.

const MAGIC: &[u8] = b"\x93NUMPY";

#[derive(Debug, thiserror::Error)]
pub enum NpyError {
    #[error("not an .npy file (bad magic)")]
    BadMagic,
    #[error("unsupported .npy version {0}.{1}")]
    UnsupportedVersion(u8, u8),
    #[error("truncated .npy file")]
    Truncated,
    #[error("malformed .npy header: {0}")]
    Header(String),
    #[error("unsupported dtype {0:?} (expected '<f4' or '<f8')")]
    UnsupportedDtype(String),
    #[error("fortran-ordered arrays are not supported")]
    FortranOrder,
    #[error("expected a 2-D array, got shape {0:?}")]
    Shape(Vec<usize>),
    #[error("data section holds {actual} bytes, shape needs {expected}")]
    DataLength { expected: usize, actual: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Dtype {
    F32,
    F64,
}

impl Dtype {
    fn width(self) -> usize {
        match self {
            Self::F32 => 4,
            Self::F64 => 8,
        }
    }
}

/// A row-major matrix decoded to `f32`.
#[derive(Debug, Clone, PartialEq)]
pub struct Matrix {
    pub rows: usize,
    pub cols: usize,
    pub data: Vec<f32>,
}

/// Decode an `.npy` byte buffer.
pub fn parse(bytes: &[u8]) -> Result<Matrix, NpyError> {
    let rest = bytes.strip_prefix(MAGIC).ok_or(NpyError::BadMagic)?;
    let [major, minor, rest @ ..] = rest else {
        return Err(NpyError::Truncated);
    };

    let (header_len, rest) = match *major {
        1 => {
            let [a, b, rest @ ..] = rest else {
                return Err(NpyError::Truncated);
            };
            (u16::from_le_bytes([*a, *b]) as usize, rest)
        },
        2 | 3 => {
            let [a, b, c, d, rest @ ..] = rest else {
                return Err(NpyError::Truncated);
            };
            (u32::from_le_bytes([*a, *b, *c, *d]) as usize, rest)
        },
        _ => return Err(NpyError::UnsupportedVersion(*major, *minor)),
    };
    if rest.len() < header_len {
        return Err(NpyError::Truncated);
    }
    let (header, data) = rest.split_at(header_len);
    let header = std::str::from_utf8(header).map_err(|e| NpyError::Header(e.to_string()))?;

    let dtype = match quoted_value(header, "descr")? {
        "<f4" | "|f4" => Dtype::F32,
        "<f8" | "|f8" => Dtype::F64,
        other => return Err(NpyError::UnsupportedDtype(other.to_string())),
    };
    if bare_value(header, "fortran_order")?.starts_with("True") {
        return Err(NpyError::FortranOrder);
    }
    let shape = shape(header)?;
    let &[rows, cols] = shape.as_slice() else {
        return Err(NpyError::Shape(shape));
    };

    let expected = rows
        .checked_mul(cols)
        .and_then(|n| n.checked_mul(dtype.width()))
        .ok_or_else(|| NpyError::Header(format!("shape ({rows}, {cols}) overflows")))?;
    if data.len() != expected {
        return Err(NpyError::DataLength {
            expected,
            actual: data.len(),
        });
    }

    let data = match dtype {
        Dtype::F32 => data
            .chunks_exact(4)
            .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect(),
        Dtype::F64 => data
            .chunks_exact(8)
            .map(|c| f64::from_le_bytes([c[0], c[1], c[2], c[3], c[4], c[5], c[6], c[7]]) as f32)
            .collect(),
    };

    Ok(Matrix { rows, cols, data })
}

/// Text following `'key':` in the header dict, with leading spaces removed.
fn bare_value<'a>(header: &'a str, key: &str) -> Result<&'a str, NpyError> {
    let needle = format!("'{key}':");
    let start = header
        .find(&needle)
        .ok_or_else(|| NpyError::Header(format!("missing key {key:?}")))?;
    Ok(header[start + needle.len()..].trim_start())
}

fn quoted_value<'a>(header: &'a str, key: &str) -> Result<&'a str, NpyError> {
    let value = bare_value(header, key)?;
    let malformed = || NpyError::Header(format!("key {key:?} is not a quoted string"));
    let inner = value.strip_prefix('\'').ok_or_else(malformed)?;
    let end = inner.find('\'').ok_or_else(malformed)?;
    Ok(&inner[..end])
}

fn shape(header: &str) -> Result<Vec<usize>, NpyError> {
    let value = bare_value(header, "shape")?;
    let malformed = || NpyError::Header("shape is not a tuple".into());
    let inner = value.strip_prefix('(').ok_or_else(malformed)?;
    let end = inner.find(')').ok_or_else(malformed)?;
    inner[..end]
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<usize>()
                .map_err(|_| NpyError::Header(format!("bad shape dimension {s:?}")))
        })
        .collect()
}

/// Encode a row-major `float32` matrix as a version 1.0 `.npy` buffer.
pub fn encode_f32(rows: usize, cols: usize, data: &[f32]) -> Vec<u8> {
    let mut header =
        format!("{{'descr': '<f4', 'fortran_order': False, 'shape': ({rows}, {cols}), }}");
    // Magic (6) + version (2) + length (2) + header + newline, padded to 64.
    let unpadded = MAGIC.len() + 4 + header.len() + 1;
    header.push_str(&" ".repeat((64 - unpadded % 64) % 64));
    header.push('\n');

    let mut out = Vec::with_capacity(MAGIC.len() + 4 + header.len() + data.len() * 4);
    out.extend_from_slice(MAGIC);
    out.extend_from_slice(&[1, 0]);
    out.extend_from_slice(&(header.len() as u16).to_le_bytes());
    out.extend_from_slice(header.as_bytes());
    for v in data {
        out.extend_from_slice(&v.to_le_bytes());
    }
    out
}
