//! Minimal `.npy` header parsing for little-endian float64 matrices.

use crate::{Error, Result};

const MAGIC: &[u8] = b"\x93NUMPY";

/// Layout of a 2-D `<f8` array stored in a `.npy` buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct NpyMatrix {
    pub rows: usize,
    pub cols: usize,
    pub fortran_order: bool,
    pub data_offset: usize,
}

impl NpyMatrix {
    /// Parses the magic string, version and header dictionary, and checks
    /// that the buffer holds the full payload.
    pub(crate) fn parse(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < 10 || &bytes[..6] != MAGIC {
            return Err(Error::InvalidFormat("missing .npy magic string".into()));
        }
        let major = bytes[6];
        let (header_len, header_start) = match major {
            1 => (usize::from(u16::from_le_bytes([bytes[8], bytes[9]])), 10),
            2 | 3 => {
                if bytes.len() < 12 {
                    return Err(Error::InvalidFormat("truncated .npy preamble".into()));
                }
                let len = u32::from_le_bytes([bytes[8], bytes[9], bytes[10], bytes[11]]);
                let len = usize::try_from(len)
                    .map_err(|_| Error::InvalidFormat("oversized .npy header".into()))?;
                (len, 12)
            }
            other => {
                return Err(Error::InvalidFormat(format!(
                    "unsupported .npy version {other}"
                )))
            }
        };

        let data_offset = header_start + header_len;
        let header = bytes
            .get(header_start..data_offset)
            .ok_or_else(|| Error::InvalidFormat("truncated .npy header".into()))?;
        let header = std::str::from_utf8(header)
            .map_err(|_| Error::InvalidFormat(".npy header is not text".into()))?;

        let descr = dict_value(header, "descr")
            .and_then(quoted)
            .ok_or_else(|| Error::InvalidFormat("missing 'descr' in .npy header".into()))?;
        if descr != "<f8" {
            return Err(Error::InvalidFormat(format!(
                "expected dtype '<f8', found '{descr}'"
            )));
        }

        let fortran_order = match dict_value(header, "fortran_order") {
            Some(v) if v.starts_with("True") => true,
            Some(v) if v.starts_with("False") => false,
            _ => {
                return Err(Error::InvalidFormat(
                    "missing 'fortran_order' in .npy header".into(),
                ))
            }
        };

        let shape = dict_value(header, "shape")
            .and_then(parse_shape)
            .ok_or_else(|| Error::InvalidFormat("missing or invalid 'shape' in .npy header".into()))?;
        let &[rows, cols] = shape.as_slice() else {
            return Err(Error::InvalidFormat(format!(
                "expected a 2-D array, found shape {shape:?}"
            )));
        };

        let payload = rows
            .checked_mul(cols)
            .and_then(|n| n.checked_mul(8))
            .ok_or_else(|| Error::InvalidFormat("array shape overflows".into()))?;
        let end = data_offset
            .checked_add(payload)
            .ok_or_else(|| Error::InvalidFormat("array shape overflows".into()))?;
        if bytes.len() < end {
            return Err(Error::InvalidFormat(format!(
                "expected {payload} data bytes, found {}",
                bytes.len().saturating_sub(data_offset)
            )));
        }

        Ok(Self {
            rows,
            cols,
            fortran_order,
            data_offset,
        })
    }

    /// Reads element `(row, col)`. Bounds are checked by [`NpyMatrix::parse`].
    #[inline]
    pub(crate) fn get(&self, bytes: &[u8], row: usize, col: usize) -> f64 {
        let index = if self.fortran_order {
            col * self.rows + row
        } else {
            row * self.cols + col
        };
        let start = self.data_offset + index * 8;
        let mut raw = [0u8; 8];
        raw.copy_from_slice(&bytes[start..start + 8]);
        f64::from_le_bytes(raw)
    }
}

/// Text following `'key':` in a Python dict literal.
fn dict_value<'a>(header: &'a str, key: &str) -> Option<&'a str> {
    let needle_single = format!("'{key}'");
    let needle_double = format!("\"{key}\"");
    let (pos, len) = header
        .find(&needle_single)
        .map(|p| (p, needle_single.len()))
        .or_else(|| header.find(&needle_double).map(|p| (p, needle_double.len())))?;
    let rest = header[pos + len..].trim_start();
    Some(rest.strip_prefix(':')?.trim_start())
}

fn quoted(value: &str) -> Option<&str> {
    let quote = value.chars().next().filter(|c| *c == '\'' || *c == '"')?;
    let body = &value[1..];
    body.find(quote).map(|end| &body[..end])
}

fn parse_shape(value: &str) -> Option<Vec<usize>> {
    let inner = value.strip_prefix('(')?;
    let inner = &inner[..inner.find(')')?];
    inner
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.parse().ok())
        .collect()
}
