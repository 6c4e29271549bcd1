//! Flux-weighted per-bin statistics with bootstrap errors.
#![allow(clippy::cast_precision_loss, clippy::cast_lossless)]

use log::warn;
use mockifu_core::{
    Assignment, BinStatRecord, DegenerateBin, Error, GaussHermiteMoments, ObservationConfig,
    Result,
};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;

/// Weighted mean and dispersion of one sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeightedMoments {
    /// Weighted mean.
    pub mean: f64,
    /// Weighted dispersion, `sqrt(E[v^2] - E[v]^2)`.
    pub sigma: f64,
}

impl WeightedMoments {
    const UNDEFINED: Self = Self {
        mean: f64::NAN,
        sigma: f64::NAN,
    };

    /// Moments from running sums. Zero total weight gives NaN for both.
    #[inline]
    fn from_sums(sum_w: f64, sum_wv: f64, sum_wv2: f64) -> Self {
        if sum_w <= 0.0 {
            return Self::UNDEFINED;
        }
        let mean = sum_wv / sum_w;
        let second = sum_wv2 / sum_w;
        // Cancellation can push the variance slightly below zero.
        let variance = (second - mean * mean).max(0.0);
        Self {
            mean,
            sigma: variance.sqrt(),
        }
    }
}

/// Flux-weighted mean and dispersion of `velocity` over the particles in
/// `indices`.
#[must_use]
pub fn weighted_moments(indices: &[usize], velocity: &[f64], mass: &[f64]) -> WeightedMoments {
    let (mut sum_w, mut sum_wv, mut sum_wv2) = (0.0, 0.0, 0.0);
    for &i in indices {
        let w = mass[i];
        let v = velocity[i];
        sum_w += w;
        sum_wv += w * v;
        sum_wv2 += w * v * v;
    }
    WeightedMoments::from_sums(sum_w, sum_wv, sum_wv2)
}

/// Standard deviation (population form) of the non-NaN values; NaN if
/// every value is NaN.
#[must_use]
pub fn nan_std(values: &[f64]) -> f64 {
    let (count, sum) = values
        .iter()
        .filter(|v| !v.is_nan())
        .fold((0usize, 0.0), |(n, s), v| (n + 1, s + v));
    if count == 0 {
        return f64::NAN;
    }
    let mean = sum / count as f64;
    let sq: f64 = values
        .iter()
        .filter(|v| !v.is_nan())
        .map(|v| (v - mean) * (v - mean))
        .sum();
    (sq / count as f64).sqrt()
}

/// Bootstrap standard errors of the weighted mean and dispersion.
///
/// Each resample draws `indices.len()` particles with replacement. Resamples
/// with zero total weight are left out of the spread. Returns
/// `(mean_err, sigma_err)`.
pub fn bootstrap_errors<R: Rng>(
    indices: &[usize],
    velocity: &[f64],
    mass: &[f64],
    resamples: usize,
    rng: &mut R,
) -> (f64, f64) {
    let n = indices.len();
    if n == 0 || resamples == 0 {
        return (f64::NAN, f64::NAN);
    }

    let mut means = Vec::with_capacity(resamples);
    let mut sigmas = Vec::with_capacity(resamples);
    for _ in 0..resamples {
        let (mut sum_w, mut sum_wv, mut sum_wv2) = (0.0, 0.0, 0.0);
        for _ in 0..n {
            let i = indices[rng.gen_range(0..n)];
            let w = mass[i];
            let v = velocity[i];
            sum_w += w;
            sum_wv += w * v;
            sum_wv2 += w * v * v;
        }
        let moments = WeightedMoments::from_sums(sum_w, sum_wv, sum_wv2);
        means.push(moments.mean);
        sigmas.push(moments.sigma);
    }

    (nan_std(&means), nan_std(&sigmas))
}

/// Per-bin reduction of velocities, masses and metallicities.
#[derive(Debug, Clone)]
pub struct WeightedStatsEngine {
    resamples: usize,
    seed: u64,
    parallel: bool,
}

impl Default for WeightedStatsEngine {
    fn default() -> Self {
        Self::new(&ObservationConfig::default())
    }
}

impl WeightedStatsEngine {
    /// Create from the run configuration.
    #[must_use]
    pub fn new(config: &ObservationConfig) -> Self {
        Self {
            resamples: config.resamples,
            seed: config.seed,
            parallel: config.parallel,
        }
    }

    /// Bootstrap resamples per bin.
    #[must_use]
    pub fn resamples(&self) -> usize {
        self.resamples
    }

    /// Statistics for a single bin given its particle indices.
    ///
    /// The bootstrap generator is seeded from the engine seed and `bin_id`,
    /// so a bin's errors do not depend on evaluation order.
    #[must_use]
    pub fn bin_stats(
        &self,
        bin_id: usize,
        indices: &[usize],
        velocity: &[f64],
        mass: &[f64],
        metallicity: &[f64],
    ) -> BinStatRecord {
        let flux: f64 = indices.iter().map(|&i| mass[i]).sum();
        if indices.is_empty() {
            return BinStatRecord::degenerate(bin_id, DegenerateBin::NoParticles, flux, 0);
        }
        if flux <= 0.0 {
            return BinStatRecord::degenerate(bin_id, DegenerateBin::ZeroFlux, flux, indices.len());
        }

        let moments = weighted_moments(indices, velocity, mass);
        let metal = indices
            .iter()
            .map(|&i| mass[i] * metallicity[i])
            .sum::<f64>()
            / flux;

        let mut rng = ChaCha8Rng::seed_from_u64(self.seed.wrapping_add(bin_id as u64));
        let (vel_mean_err, vel_sigma_err) =
            bootstrap_errors(indices, velocity, mass, self.resamples, &mut rng);

        BinStatRecord {
            bin_id,
            gauss_hermite: GaussHermiteMoments::default(),
            vel_mean: moments.mean,
            vel_mean_err,
            vel_sigma: moments.sigma,
            vel_sigma_err,
            metallicity: metal,
            flux,
            particle_count: indices.len(),
            degenerate: None,
        }
    }

    /// One record per bin id `0..num_bins`, in ascending id order.
    ///
    /// `velocity`, `mass` and `metallicity` are indexed like the particles
    /// in `assignment`.
    ///
    /// # Errors
    /// Returns [`Error::InputShape`] if the arrays and the assignment differ
    /// in length or a label is out of range, and [`Error::ConfigError`] if
    /// the resample count is zero.
    pub fn compute_bin_stats(
        &self,
        assignment: &Assignment,
        num_bins: usize,
        velocity: &[f64],
        mass: &[f64],
        metallicity: &[f64],
    ) -> Result<Vec<BinStatRecord>> {
        if self.resamples == 0 {
            return Err(Error::ConfigError(
                "bootstrap resample count must be at least 1".to_string(),
            ));
        }
        let n = assignment.len();
        if velocity.len() != n || mass.len() != n || metallicity.len() != n {
            return Err(Error::InputShape(format!(
                "assignment covers {n} particles but got {} velocities, {} masses, {} metallicities",
                velocity.len(),
                mass.len(),
                metallicity.len()
            )));
        }

        let groups = assignment.group_by_bin(num_bins)?;
        let reduce = |(bin_id, indices): (usize, &Vec<usize>)| {
            self.bin_stats(bin_id, indices, velocity, mass, metallicity)
        };

        let records: Vec<BinStatRecord> = if self.parallel {
            groups.par_iter().enumerate().map(reduce).collect()
        } else {
            groups.iter().enumerate().map(reduce).collect()
        };

        for record in &records {
            if let Some(reason) = record.degenerate {
                warn!("bin {}: {reason}; statistics set to NaN", record.bin_id);
            }
        }

        Ok(records)
    }
}
