//! High-level helpers that combine binning and per-bin statistics.

use crate::{BinAssigner, WeightedStatsEngine};
use log::info;
use mockifu_core::{
    Assignment, BinGeometry, BinStatRecord, FootprintBoundary, ObservationConfig, ParticleBatch,
    Result,
};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Counts describing a finished run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ObservationSummary {
    /// Particles in the snapshot.
    pub particles: usize,
    /// Particles that received a bin.
    pub particles_binned: usize,
    /// Bins in the geometry.
    pub bins: usize,
    /// Ids of bins flagged degenerate.
    pub degenerate_bins: Vec<usize>,
}

/// Result of binning a snapshot: the per-particle labels and one record per
/// bin.
#[derive(Debug, Clone)]
pub struct IfuObservation {
    /// Per-particle bin labels.
    pub assignment: Assignment,
    /// Records in ascending bin id order.
    pub records: Vec<BinStatRecord>,
}

impl IfuObservation {
    /// Counts for logging and the run summary.
    #[must_use]
    pub fn summary(&self) -> ObservationSummary {
        ObservationSummary {
            particles: self.assignment.len(),
            particles_binned: self.assignment.assigned_count(),
            bins: self.records.len(),
            degenerate_bins: self
                .records
                .iter()
                .filter(|r| r.is_degenerate())
                .map(|r| r.bin_id)
                .collect(),
        }
    }
}

/// Validates the inputs, assigns particles to bins, then reduces each bin.
///
/// All fatal checks (configuration, particle columns and masses) happen
/// before any particle is binned.
///
/// # Errors
/// Returns an error if the configuration or particle batch is invalid.
pub fn observe(
    batch: &ParticleBatch,
    footprint: &FootprintBoundary,
    geometry: &BinGeometry,
    config: &ObservationConfig,
) -> Result<IfuObservation> {
    config.validate()?;
    batch.validate()?;

    let assigner = BinAssigner::new(footprint, geometry).with_parallel(config.parallel);
    let assignment = assigner.assign(batch, config.line_of_sight)?;
    info!(
        "binned {} of {} particles into {} bins",
        assignment.assigned_count(),
        assignment.len(),
        geometry.len()
    );

    let engine = WeightedStatsEngine::new(config);
    let records = engine.compute_bin_stats(
        &assignment,
        geometry.len(),
        batch.los_velocity(config.line_of_sight),
        &batch.mass,
        &batch.metallicity,
    )?;

    Ok(IfuObservation {
        assignment,
        records,
    })
}
