//! Per-bin output records.

use crate::error::DegenerateBin;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Column names of a serialized record, in output order.
pub const RECORD_COLUMNS: [&str; 15] = [
    "bin_id",
    "gh_v0",
    "gh_v0_err",
    "gh_vd",
    "gh_vd_err",
    "gh_h3",
    "gh_h3_err",
    "gh_h4",
    "gh_h4_err",
    "vel_mean",
    "vel_mean_err",
    "vel_sigma",
    "vel_sigma_err",
    "metallicity",
    "flux",
];

/// Gauss–Hermite LOSVD moments with their errors.
///
/// Downstream readers expect these columns, but nothing fits a line profile,
/// so every field stays zero.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct GaussHermiteMoments {
    pub v0: f64,
    pub v0_err: f64,
    pub vd: f64,
    pub vd_err: f64,
    pub h3: f64,
    pub h3_err: f64,
    pub h4: f64,
    pub h4_err: f64,
}

/// Flux-weighted kinematic and chemical summary of one bin.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BinStatRecord {
    pub bin_id: usize,
    pub gauss_hermite: GaussHermiteMoments,
    /// Flux-weighted mean line-of-sight velocity.
    pub vel_mean: f64,
    /// Bootstrap standard error of `vel_mean`.
    pub vel_mean_err: f64,
    /// Flux-weighted velocity dispersion.
    pub vel_sigma: f64,
    /// Bootstrap standard error of `vel_sigma`.
    pub vel_sigma_err: f64,
    /// Flux-weighted metallicity.
    pub metallicity: f64,
    /// Sum of particle masses in the bin.
    pub flux: f64,
    /// Number of particles assigned to the bin.
    pub particle_count: usize,
    /// Set when the bin could not produce statistics.
    pub degenerate: Option<DegenerateBin>,
}

impl BinStatRecord {
    /// Record for a bin without usable weights: statistics are NaN.
    #[must_use]
    pub fn degenerate(
        bin_id: usize,
        reason: DegenerateBin,
        flux: f64,
        particle_count: usize,
    ) -> Self {
        Self {
            bin_id,
            gauss_hermite: GaussHermiteMoments::default(),
            vel_mean: f64::NAN,
            vel_mean_err: f64::NAN,
            vel_sigma: f64::NAN,
            vel_sigma_err: f64::NAN,
            metallicity: f64::NAN,
            flux,
            particle_count,
            degenerate: Some(reason),
        }
    }

    /// Returns true if the bin was flagged degenerate.
    #[must_use]
    pub fn is_degenerate(&self) -> bool {
        self.degenerate.is_some()
    }

    /// The 14 floating-point columns that follow the bin id, in output order.
    #[must_use]
    pub fn values(&self) -> [f64; 14] {
        let gh = &self.gauss_hermite;
        [
            gh.v0,
            gh.v0_err,
            gh.vd,
            gh.vd_err,
            gh.h3,
            gh.h3_err,
            gh.h4,
            gh.h4_err,
            self.vel_mean,
            self.vel_mean_err,
            self.vel_sigma,
            self.vel_sigma_err,
            self.metallicity,
            self.flux,
        ]
    }
}
