//! Footprint filtering and nearest-bin assignment.

use crate::spatial::KdTree;
use log::debug;
use mockifu_core::{
    Assignment, BinGeometry, Error, FootprintBoundary, LineOfSight, ParticleBatch, Result,
    UNASSIGNED,
};
use rayon::prelude::*;

/// Maps particles onto bins.
///
/// A particle is first checked against the footprint; only accepted
/// particles are looked up in the k-d tree. Rejected particles, and accepted
/// particles with a non-finite position, are labelled [`UNASSIGNED`].
#[derive(Debug, Clone)]
pub struct BinAssigner<'a> {
    footprint: &'a FootprintBoundary,
    index: KdTree,
    num_bins: usize,
    parallel: bool,
}

impl<'a> BinAssigner<'a> {
    /// Builds the centroid index for `geometry`.
    #[must_use]
    pub fn new(footprint: &'a FootprintBoundary, geometry: &BinGeometry) -> Self {
        Self {
            footprint,
            index: KdTree::from_geometry(geometry),
            num_bins: geometry.len(),
            parallel: true,
        }
    }

    /// Set whether to use parallel processing.
    #[must_use]
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Number of bins in the index.
    #[must_use]
    pub fn num_bins(&self) -> usize {
        self.num_bins
    }

    /// Label for a single sky-plane position.
    ///
    /// Bin ids always fit an `i32` label, since [`BinGeometry::new`] rejects
    /// geometries larger than [`mockifu_core::bins::MAX_BINS`].
    #[must_use]
    pub fn label(&self, x: f64, y: f64) -> i32 {
        if !self.footprint.is_inside(x, y) {
            return UNASSIGNED;
        }
        self.index
            .nearest(x, y)
            .and_then(|bin| i32::try_from(bin).ok())
            .unwrap_or(UNASSIGNED)
    }

    /// Labels already-projected sky-plane coordinates.
    ///
    /// # Errors
    /// Returns [`Error::InputShape`] if `x` and `y` differ in length.
    pub fn assign_xy(&self, x: &[f64], y: &[f64]) -> Result<Assignment> {
        if x.len() != y.len() {
            return Err(Error::InputShape(format!(
                "coordinate arrays differ in length ({} vs {})",
                x.len(),
                y.len()
            )));
        }

        let labels: Vec<i32> = if self.parallel {
            x.par_iter()
                .zip(y.par_iter())
                .map(|(&px, &py)| self.label(px, py))
                .collect()
        } else {
            x.iter()
                .zip(y.iter())
                .map(|(&px, &py)| self.label(px, py))
                .collect()
        };

        let assignment = Assignment::from_labels(labels);
        debug!(
            "assigned {} of {} particles to {} bins",
            assignment.assigned_count(),
            assignment.len(),
            self.num_bins
        );
        Ok(assignment)
    }

    /// Projects `batch` along `los` and labels every particle.
    ///
    /// # Errors
    /// Returns an error if the batch columns are inconsistent.
    pub fn assign(&self, batch: &ParticleBatch, los: LineOfSight) -> Result<Assignment> {
        let (x, y) = batch.sky_plane(los);
        self.assign_xy(x, y)
    }
}
