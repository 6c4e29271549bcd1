//! Run configuration.

use crate::error::{Error, Result};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Bootstrap resamples drawn per bin unless configured otherwise.
pub const DEFAULT_RESAMPLES: usize = 500;

/// Base seed for the per-bin bootstrap generators.
pub const DEFAULT_SEED: u64 = 42;

/// Arcseconds subtended by 1 kpc at a distance of 1 Mpc.
pub const ARCSEC_PER_KPC_AT_1MPC: f64 = 206.264_806;

/// Conversion from simulation length units (kpc) to angular units (arcsec).
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct UnitConversion {
    kpc_to_arcsec: f64,
}

impl UnitConversion {
    /// Uses an explicit kpc to arcsec factor.
    ///
    /// # Errors
    /// Returns [`Error::ConfigError`] unless the factor is finite and positive.
    pub fn new(kpc_to_arcsec: f64) -> Result<Self> {
        if !kpc_to_arcsec.is_finite() || kpc_to_arcsec <= 0.0 {
            return Err(Error::ConfigError(format!(
                "kpc to arcsec factor must be finite and positive, got {kpc_to_arcsec}"
            )));
        }
        Ok(Self { kpc_to_arcsec })
    }

    /// Derives the factor from the object's distance in Mpc
    /// (small-angle approximation).
    ///
    /// # Errors
    /// Returns [`Error::ConfigError`] unless the distance is finite and positive.
    pub fn from_distance_mpc(distance_mpc: f64) -> Result<Self> {
        if !distance_mpc.is_finite() || distance_mpc <= 0.0 {
            return Err(Error::ConfigError(format!(
                "distance must be finite and positive, got {distance_mpc} Mpc"
            )));
        }
        Self::new(ARCSEC_PER_KPC_AT_1MPC / distance_mpc)
    }

    /// Identity conversion, for inputs already in arcsec.
    #[must_use]
    pub fn identity() -> Self {
        Self { kpc_to_arcsec: 1.0 }
    }

    /// The multiplicative factor.
    #[must_use]
    pub fn factor(&self) -> f64 {
        self.kpc_to_arcsec
    }

    /// Converts a length in kpc to arcsec.
    #[inline]
    #[must_use]
    pub fn to_arcsec(&self, kpc: f64) -> f64 {
        kpc * self.kpc_to_arcsec
    }
}

impl Default for UnitConversion {
    fn default() -> Self {
        Self::identity()
    }
}

/// Axis treated as the line of sight. The two remaining axes, in cyclic
/// order, form the sky plane.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum LineOfSight {
    /// Sky plane (y, z).
    X,
    /// Sky plane (z, x).
    Y,
    /// Sky plane (x, y).
    #[default]
    Z,
}

/// Configuration for binning and per-bin statistics.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ObservationConfig {
    /// Projection axis.
    pub line_of_sight: LineOfSight,
    /// Bootstrap resamples per bin.
    pub resamples: usize,
    /// Base seed; bin `i` uses `seed + i`.
    pub seed: u64,
    /// Process particles and bins with rayon.
    pub parallel: bool,
}

impl Default for ObservationConfig {
    fn default() -> Self {
        Self {
            line_of_sight: LineOfSight::Z,
            resamples: DEFAULT_RESAMPLES,
            seed: DEFAULT_SEED,
            parallel: true,
        }
    }
}

impl ObservationConfig {
    /// Creates a configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the line-of-sight axis.
    #[must_use]
    pub fn with_line_of_sight(mut self, line_of_sight: LineOfSight) -> Self {
        self.line_of_sight = line_of_sight;
        self
    }

    /// Sets the bootstrap resample count.
    #[must_use]
    pub fn with_resamples(mut self, resamples: usize) -> Self {
        self.resamples = resamples;
        self
    }

    /// Sets the base seed.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Enables or disables rayon.
    #[must_use]
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Checks the configuration before a run.
    ///
    /// # Errors
    /// Returns [`Error::ConfigError`] when the resample count is zero.
    pub fn validate(&self) -> Result<()> {
        if self.resamples == 0 {
            return Err(Error::ConfigError(
                "bootstrap resample count must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_observation_config_builder() {
        let config = ObservationConfig::new()
            .with_line_of_sight(LineOfSight::X)
            .with_resamples(100)
            .with_seed(7)
            .with_parallel(false);

        assert_eq!(config.line_of_sight, LineOfSight::X);
        assert_eq!(config.resamples, 100);
        assert_eq!(config.seed, 7);
        assert!(!config.parallel);
        assert!(config.validate().is_ok());
        assert!(config.with_resamples(0).validate().is_err());
    }

    #[test]
    fn test_defaults() {
        let config = ObservationConfig::default();
        assert_eq!(config.resamples, DEFAULT_RESAMPLES);
        assert_eq!(config.line_of_sight, LineOfSight::Z);
        assert!(config.parallel);
    }

    #[test]
    fn test_unit_conversion() {
        let units = UnitConversion::from_distance_mpc(10.0).unwrap();
        assert_relative_eq!(units.factor(), 20.626_480_6);
        assert_relative_eq!(units.to_arcsec(2.0), 41.252_961_2);

        assert!(UnitConversion::new(0.0).is_err());
        assert!(UnitConversion::new(f64::NAN).is_err());
        assert!(UnitConversion::from_distance_mpc(-1.0).is_err());
        assert_relative_eq!(UnitConversion::default().to_arcsec(3.5), 3.5);
    }
}
