//! Readers for the footprint, bin geometry and particle snapshot files.
//!

use crate::npy::NpyMatrix;
use crate::{Error, Result};
use log::{debug, info, warn};
use memmap2::Mmap;
use mockifu_core::{
    BinGeometry, BoundingBox, FootprintBoundary, ParticleBatch, ParticleRow, SpatialBin,
    UnitConversion,
};
use std::fs::{self, File};
use std::path::{Path, PathBuf};

/// Columns per particle in a snapshot.
pub const SNAPSHOT_COLUMNS: usize = 9;

/// A memory-mapped file reader.
///
/// Uses memmap2 to efficiently access file contents without
/// loading the entire file into memory.
pub struct MappedFileReader {
    mmap: Mmap,
    path: PathBuf,
}

impl MappedFileReader {
    /// Opens a file for memory-mapped reading.
    ///
    /// # Errors
    /// Returns an error if the file cannot be opened or memory-mapped.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(&path)?;
        // SAFETY: The file is opened read-only and we assume it is not modified concurrently.
        // This is the standard safety contract for memory mapping.
        #[allow(unsafe_code)]
        let mmap = unsafe { Mmap::map(&file)? };
        Ok(Self {
            mmap,
            path: path.as_ref().to_path_buf(),
        })
    }

    /// Returns the file contents as a byte slice.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.mmap[..]
    }

    /// Returns the file size in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.mmap.len()
    }

    /// Returns true if the file is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.mmap.is_empty()
    }

    /// Path the mapping was opened from.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Non-blank, non-comment lines with their 1-based line numbers.
fn data_rows(text: &str) -> impl Iterator<Item = (usize, Vec<&str>)> {
    text.lines().enumerate().filter_map(|(i, line)| {
        let line = line.split('#').next().unwrap_or("").trim();
        if line.is_empty() {
            None
        } else {
            Some((i + 1, line.split_whitespace().collect()))
        }
    })
}

/// Parses the first `count` fields of a row as floats.
fn parse_floats(path: &Path, line: usize, fields: &[&str], count: usize) -> Result<Vec<f64>> {
    if fields.len() < count {
        return Err(Error::parse(
            path,
            line,
            format!("expected {count} columns, found {}", fields.len()),
        ));
    }
    fields[..count]
        .iter()
        .map(|f| {
            f.parse::<f64>()
                .map_err(|e| Error::parse(path, line, format!("invalid number '{f}': {e}")))
        })
        .collect()
}

/// Reads an `IFU_hull` file.
///
/// The first line is `n_vertices min_r max_r x_min x_max y_min y_max`, and
/// every following row holds one `x y` vertex. When the declared vertex
/// count disagrees with the rows present, the rows win.
///
/// # Errors
/// Returns an error if the file cannot be read, a row is malformed, or the
/// boundary fails validation.
pub fn read_footprint<P: AsRef<Path>>(path: P) -> Result<FootprintBoundary> {
    let path = path.as_ref();
    let text = fs::read_to_string(path)?;
    let mut rows = data_rows(&text);

    let (line, header) = rows
        .next()
        .ok_or_else(|| Error::InvalidFormat(format!("{}: missing header", path.display())))?;
    if header.len() < 7 {
        return Err(Error::parse(
            path,
            line,
            format!("header needs 7 fields, found {}", header.len()),
        ));
    }
    let declared: usize = header[0]
        .parse()
        .map_err(|e| Error::parse(path, line, format!("invalid vertex count '{}': {e}", header[0])))?;
    let values = parse_floats(path, line, &header[1..], 6)?;

    let vertices = rows
        .map(|(line, fields)| parse_floats(path, line, &fields, 2).map(|v| (v[0], v[1])))
        .collect::<Result<Vec<_>>>()?;

    if declared != vertices.len() {
        warn!(
            "{}: header declares {declared} vertices, found {}",
            path.display(),
            vertices.len()
        );
    }
    debug!("read {} footprint vertices from {}", vertices.len(), path.display());

    let bounds = BoundingBox::new(values[2], values[3], values[4], values[5]);
    Ok(FootprintBoundary::new(vertices, values[0], values[1], bounds)?)
}

/// Parses a bin label that may be written as an integer or an integral float.
#[allow(clippy::cast_possible_truncation)]
fn parse_label(path: &Path, line: usize, field: &str) -> Result<i64> {
    if let Ok(label) = field.parse::<i64>() {
        return Ok(label);
    }
    match field.parse::<f64>() {
        Ok(v) if v.is_finite() && v.fract() == 0.0 => Ok(v as i64),
        _ => Err(Error::parse(path, line, format!("invalid bin id '{field}'"))),
    }
}

/// Reads a `voronoi_bins.dat` file with rows `id x y area in_use`.
///
/// Bins are numbered by row order; the id column is kept as the bin label.
///
/// # Errors
/// Returns an error if the file cannot be read, a row is malformed, or the
/// file holds no bins.
pub fn read_bin_geometry<P: AsRef<Path>>(path: P) -> Result<BinGeometry> {
    let path = path.as_ref();
    let text = fs::read_to_string(path)?;

    let bins = data_rows(&text)
        .map(|(line, fields)| {
            let values = parse_floats(path, line, &fields, 5)?;
            let label = parse_label(path, line, fields[0])?;
            Ok(SpatialBin::new(
                label,
                values[1],
                values[2],
                values[3],
                values[4] != 0.0,
            ))
        })
        .collect::<Result<Vec<_>>>()?;

    debug!("read {} bins from {}", bins.len(), path.display());
    Ok(BinGeometry::new(bins)?)
}

/// Reads a particle snapshot and converts positions to arcsec.
///
/// Files with a `.npy` extension are memory-mapped and must hold a `<f8`
/// array of shape `(N, 9)`; anything else is read as whitespace-separated
/// text with nine columns per row. Column order is
/// `x y z vx vy vz mass luminosity metallicity`.
///
/// # Errors
/// Returns an error if the file cannot be read or is malformed.
pub fn read_snapshot<P: AsRef<Path>>(path: P, units: UnitConversion) -> Result<ParticleBatch> {
    let path = path.as_ref();
    let is_npy = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("npy"));

    let batch = if is_npy {
        read_npy_snapshot(path, units)?
    } else {
        read_text_snapshot(path, units)?
    };

    info!(
        "loaded {} particles from {} (kpc to arcsec factor {})",
        batch.len(),
        path.display(),
        units.factor()
    );
    Ok(batch)
}

fn converted_row(mut columns: [f64; SNAPSHOT_COLUMNS], units: UnitConversion) -> ParticleRow {
    for c in &mut columns[..3] {
        *c = units.to_arcsec(*c);
    }
    ParticleRow::from_columns(columns)
}

fn read_npy_snapshot(path: &Path, units: UnitConversion) -> Result<ParticleBatch> {
    let reader = MappedFileReader::open(path)?;
    let bytes = reader.as_bytes();
    let matrix = NpyMatrix::parse(bytes).map_err(|e| match e {
        Error::InvalidFormat(msg) => Error::InvalidFormat(format!("{}: {msg}", path.display())),
        other => other,
    })?;
    if matrix.cols != SNAPSHOT_COLUMNS {
        return Err(Error::InvalidFormat(format!(
            "{}: expected {SNAPSHOT_COLUMNS} columns, found {}",
            path.display(),
            matrix.cols
        )));
    }

    let mut batch = ParticleBatch::with_capacity(matrix.rows);
    for row in 0..matrix.rows {
        let mut columns = [0.0; SNAPSHOT_COLUMNS];
        for (col, value) in columns.iter_mut().enumerate() {
            *value = matrix.get(bytes, row, col);
        }
        batch.push(converted_row(columns, units));
    }
    Ok(batch)
}

fn read_text_snapshot(path: &Path, units: UnitConversion) -> Result<ParticleBatch> {
    let text = fs::read_to_string(path)?;
    let mut batch = ParticleBatch::default();
    for (line, fields) in data_rows(&text) {
        let values = parse_floats(path, line, &fields, SNAPSHOT_COLUMNS)?;
        let mut columns = [0.0; SNAPSHOT_COLUMNS];
        columns.copy_from_slice(&values);
        batch.push(converted_row(columns, units));
    }
    Ok(batch)
}
