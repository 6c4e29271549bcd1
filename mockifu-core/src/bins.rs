//! Spatial bin (spaxel) geometry produced by the upstream Voronoi binning.

use crate::error::{Error, Result};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A single spatial bin.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SpatialBin {
    /// Label from the binning file. Kept for reference only; the bin id is
    /// the row index.
    pub label: i64,
    /// Centroid X (arcsec).
    pub x: f64,
    /// Centroid Y (arcsec).
    pub y: f64,
    /// Bin area (arcsec^2).
    pub area: f64,
    /// In-use flag from the binning file.
    pub in_use: bool,
}

impl SpatialBin {
    /// Creates a new bin record.
    #[inline]
    #[must_use]
    pub fn new(label: i64, x: f64, y: f64, area: f64, in_use: bool) -> Self {
        Self {
            label,
            x,
            y,
            area,
            in_use,
        }
    }

    /// Centroid as an `(x, y)` pair.
    #[inline]
    #[must_use]
    pub fn centroid(&self) -> (f64, f64) {
        (self.x, self.y)
    }
}

/// The fixed, ordered set of bins. Bin ids are the dense range `0..len()`.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BinGeometry {
    bins: Vec<SpatialBin>,
}

/// Largest geometry whose bin ids fit the `i32` assignment labels.
pub const MAX_BINS: usize = i32::MAX as usize;

/// Checks that `count` bins can be labelled.
fn check_bin_count(count: usize) -> Result<()> {
    if count == 0 {
        return Err(Error::InputShape("bin geometry has zero bins".to_string()));
    }
    if count > MAX_BINS {
        return Err(Error::InputShape(format!(
            "bin geometry has {count} bins, at most {MAX_BINS} are supported"
        )));
    }
    Ok(())
}

impl BinGeometry {
    /// Wraps a list of bins; fails with [`Error::InputShape`] when it is
    /// empty, holds more than [`MAX_BINS`] bins, or a centroid is not finite.
    ///
    /// # Errors
    /// Returns an error if the geometry cannot be used for nearest-bin queries.
    pub fn new(bins: Vec<SpatialBin>) -> Result<Self> {
        check_bin_count(bins.len())?;
        if let Some(id) = bins
            .iter()
            .position(|b| !b.x.is_finite() || !b.y.is_finite())
        {
            return Err(Error::InputShape(format!(
                "bin {id} has a non-finite centroid"
            )));
        }
        Ok(Self { bins })
    }

    /// Number of bins.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bins.len()
    }

    /// Always false for a constructed geometry; provided for API symmetry.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bins.is_empty()
    }

    /// Bin by id.
    #[must_use]
    pub fn get(&self, id: usize) -> Option<&SpatialBin> {
        self.bins.get(id)
    }

    /// All bins in id order.
    #[must_use]
    pub fn bins(&self) -> &[SpatialBin] {
        &self.bins
    }

    /// Centroids in id order.
    #[must_use]
    pub fn centroids(&self) -> Vec<(f64, f64)> {
        self.bins.iter().map(SpatialBin::centroid).collect()
    }

    /// Total area of the bins flagged as in use.
    #[must_use]
    pub fn area_in_use(&self) -> f64 {
        self.bins.iter().filter(|b| b.in_use).map(|b| b.area).sum()
    }
}
