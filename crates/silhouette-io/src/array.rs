use std::path::Path;

use crate::error::IoError;

const NPY_MAGIC: &[u8; 6] = b"\x93NUMPY";

/// Element type of a npy array.
#[derive(Debug, Clone, Copy, PartialEq)]
enum NpyDtype {
    F4,
    F8,
}

impl NpyDtype {
    fn size(&self) -> usize {
        match self {
            NpyDtype::F4 => 4,
            NpyDtype::F8 => 8,
        }
    }
}

/// The parsed header dictionary of a npy file.
#[derive(Debug, PartialEq)]
struct NpyHeader {
    dtype: NpyDtype,
    fortran_order: bool,
    shape: Vec<usize>,
}

impl NpyHeader {
    /// Parse the python dictionary literal, e.g.
    /// `{'descr': '<f8', 'fortran_order': False, 'shape': (3, 2), }`.
    fn parse(header: &str) -> Result<Self, IoError> {
        let descr = header_value(header, "descr")?;
        let quote = descr
            .chars()
            .next()
            .filter(|c| *c == '\'' || *c == '"')
            .ok_or_else(|| IoError::InvalidNpyHeader(format!("bad descr in {header}")))?;
        let descr = descr[1..]
            .split(quote)
            .next()
            .ok_or_else(|| IoError::InvalidNpyHeader(format!("bad descr in {header}")))?;

        let dtype = match descr {
            "<f8" => NpyDtype::F8,
            "<f4" => NpyDtype::F4,
            other => return Err(IoError::UnsupportedDtype(other.to_string())),
        };

        let fortran_order = header_value(header, "fortran_order")?;
        let fortran_order = if fortran_order.starts_with("True") {
            true
        } else if fortran_order.starts_with("False") {
            false
        } else {
            return Err(IoError::InvalidNpyHeader(format!(
                "bad fortran_order in {header}"
            )));
        };

        let shape = header_value(header, "shape")?;
        let shape = shape
            .strip_prefix('(')
            .and_then(|s| s.split(')').next())
            .ok_or_else(|| IoError::InvalidNpyHeader(format!("bad shape in {header}")))?;
        let shape = shape
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| {
                s.parse::<usize>()
                    .map_err(|e| IoError::InvalidNpyHeader(format!("bad dimension {s:?}: {e}")))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            dtype,
            fortran_order,
            shape,
        })
    }
}

/// Find the value following `'key':` in a header dictionary.
fn header_value<'a>(header: &'a str, key: &str) -> Result<&'a str, IoError> {
    let pattern = format!("'{key}':");
    let start = header
        .find(&pattern)
        .ok_or_else(|| IoError::InvalidNpyHeader(format!("missing key {key} in {header}")))?;
    Ok(header[start + pattern.len()..].trim_start())
}

/// Decode the content of a npy file into rows.
fn parse_npy(bytes: &[u8]) -> Result<Vec<Vec<f64>>, IoError> {
    if bytes.len() < 10 || &bytes[..6] != NPY_MAGIC {
        return Err(IoError::InvalidNpyHeader("missing magic string".to_string()));
    }

    let (header_len, offset) = match bytes[6] {
        1 => (u16::from_le_bytes([bytes[8], bytes[9]]) as usize, 10),
        2 | 3 if bytes.len() >= 12 => (
            u32::from_le_bytes([bytes[8], bytes[9], bytes[10], bytes[11]]) as usize,
            12,
        ),
        version => {
            return Err(IoError::InvalidNpyHeader(format!(
                "unsupported version {version}"
            )))
        }
    };

    let header_end = offset + header_len;
    let header = bytes
        .get(offset..header_end)
        .ok_or_else(|| IoError::InvalidNpyHeader("header exceeds the file".to_string()))?;
    let header = std::str::from_utf8(header)
        .map_err(|e| IoError::InvalidNpyHeader(format!("header is not text: {e}")))?;
    let header = NpyHeader::parse(header)?;

    let (num_rows, num_cols) = match header.shape.as_slice() {
        [n] if *n == 0 => (0, 0),
        [n] => (1, *n),
        [rows, cols] => (*rows, *cols),
        shape => {
            return Err(IoError::InvalidNpyHeader(format!(
                "expected a 1-D or 2-D array, got shape {shape:?}"
            )))
        }
    };

    let data = &bytes[header_end..];
    let expected = num_rows
        .checked_mul(num_cols)
        .and_then(|n| n.checked_mul(header.dtype.size()))
        .ok_or_else(|| {
            IoError::InvalidNpyHeader(format!("shape {:?} is too large", header.shape))
        })?;
    if data.len() < expected {
        return Err(IoError::TruncatedData {
            expected,
            actual: data.len(),
        });
    }

    let values = match header.dtype {
        NpyDtype::F8 => data[..expected]
            .chunks_exact(8)
            .map(|b| f64::from_le_bytes([b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7]]))
            .collect::<Vec<_>>(),
        NpyDtype::F4 => data[..expected]
            .chunks_exact(4)
            .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]) as f64)
            .collect::<Vec<_>>(),
    };

    let rows = (0..num_rows)
        .map(|i| {
            (0..num_cols)
                .map(|j| {
                    if header.fortran_order {
                        values[j * num_rows + i]
                    } else {
                        values[i * num_cols + j]
                    }
                })
                .collect()
        })
        .collect();

    Ok(rows)
}

/// Decode a text array: one row per line, values separated by whitespace or commas.
fn parse_text(text: &str) -> Result<Vec<Vec<f64>>, IoError> {
    let mut rows = Vec::new();

    for (i, line) in text.lines().enumerate() {
        let content = line.split('#').next().unwrap_or_default().trim();
        if content.is_empty() {
            continue;
        }

        let row = content
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|token| !token.is_empty())
            .map(|token| {
                token.parse::<f64>().map_err(|e| IoError::ArrayParse {
                    line: i + 1,
                    message: format!("{token:?}: {e}"),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        rows.push(row);
    }

    Ok(rows)
}

/// Check that all the rows share one length and return it.
fn check_rectangular(rows: &[Vec<f64>]) -> Result<usize, IoError> {
    let num_cols = rows.first().map_or(0, Vec::len);

    for (row, values) in rows.iter().enumerate() {
        if values.len() != num_cols {
            return Err(IoError::RaggedArray {
                row,
                expected: num_cols,
                actual: values.len(),
            });
        }
    }

    Ok(num_cols)
}

/// Reads a 2-D array of reals from the given file path.
///
/// The format is chosen from the file extension:
///
/// * `npy` - NumPy array file, version 1, 2 or 3, with dtype `<f8` or `<f4`, in C or
///   Fortran order. A 1-D array is read as a single row.
/// * `txt`, `csv`, `dat` - One row per line, values separated by whitespace and/or
///   commas. Blank lines and `#` comments are skipped.
/// * `json` - A list of lists of numbers.
///
/// # Arguments
///
/// * `file_path` - The path to the array file.
///
/// # Returns
///
/// The rows of the array, all of the same length.
///
/// # Errors
///
/// If the file does not exist, has an unsupported extension, cannot be parsed or has
/// rows of different lengths, an error is returned.
pub fn read_array2(file_path: impl AsRef<Path>) -> Result<Vec<Vec<f64>>, IoError> {
    let file_path = file_path.as_ref().to_owned();

    if !file_path.exists() {
        return Err(IoError::FileDoesNotExist(file_path));
    }

    let extension = file_path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);

    let rows = match extension.as_deref() {
        Some("npy") => parse_npy(&std::fs::read(&file_path)?)?,
        Some("txt" | "csv" | "dat") => parse_text(&std::fs::read_to_string(&file_path)?)?,
        Some("json") => serde_json::from_str(&std::fs::read_to_string(&file_path)?)?,
        _ => return Err(IoError::InvalidFileExtension(file_path)),
    };

    let num_cols = check_rectangular(&rows)?;

    log::debug!(
        "read a {}x{} array from {}",
        rows.len(),
        num_cols,
        file_path.display()
    );

    Ok(rows)
}

/// Writes a 2-D array of reals to a npy file (version 1.0, `<f8`, C order).
///
/// # Arguments
///
/// * `file_path` - The path to the npy file.
/// * `rows` - The rows of the array, all of the same length.
pub fn write_array2_npy(file_path: impl AsRef<Path>, rows: &[Vec<f64>]) -> Result<(), IoError> {
    let num_cols = check_rectangular(rows)?;

    let mut header = format!(
        "{{'descr': '<f8', 'fortran_order': False, 'shape': ({}, {}), }}",
        rows.len(),
        num_cols
    );

    // magic, version and header length take 10 bytes; the data starts 64-byte aligned
    let unpadded = NPY_MAGIC.len() + 4 + header.len() + 1;
    header.push_str(&" ".repeat((64 - unpadded % 64) % 64));
    header.push('\n');

    let header_len = u16::try_from(header.len())
        .map_err(|_| IoError::InvalidNpyHeader("header too long".to_string()))?;

    let mut bytes = Vec::with_capacity(10 + header.len() + rows.len() * num_cols * 8);
    bytes.extend_from_slice(NPY_MAGIC);
    bytes.extend_from_slice(&[1, 0]);
    bytes.extend_from_slice(&header_len.to_le_bytes());
    bytes.extend_from_slice(header.as_bytes());
    for value in rows.iter().flatten() {
        bytes.extend_from_slice(&value.to_le_bytes());
    }

    std::fs::write(file_path, bytes)?;

    Ok(())
}

/// Writes a 2-D array of reals to a text file, one whitespace separated row per line.
///
/// The values are written in their shortest exact representation.
pub fn write_array2_txt(file_path: impl AsRef<Path>, rows: &[Vec<f64>]) -> Result<(), IoError> {
    check_rectangular(rows)?;

    let mut text = String::new();
    for row in rows {
        let line = row.iter().map(f64::to_string).collect::<Vec<_>>().join(" ");
        text.push_str(&line);
        text.push('\n');
    }

    std::fs::write(file_path, text)?;

    Ok(())
}
