//! Structure of Arrays (`SoA`) storage for particle snapshots.
//!
//! Every per-particle quantity lives in its own column, so the binning and
//! statistics passes can stream over just the columns they need.

use crate::config::LineOfSight;
use crate::error::{Error, Result};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A batch of star particles stored in Structure of Arrays (`SoA`) format.
///
/// Positions are in angular units (arcsec) once loaded; the core never
/// mutates a batch after it is built.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ParticleBatch {
    pub x: Vec<f64>,
    pub y: Vec<f64>,
    pub z: Vec<f64>,
    pub vx: Vec<f64>,
    pub vy: Vec<f64>,
    pub vz: Vec<f64>,
    /// Mass, used as the flux weight.
    pub mass: Vec<f64>,
    pub luminosity: Vec<f64>,
    pub metallicity: Vec<f64>,
}

/// One particle's fields, in snapshot column order.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ParticleRow {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub vx: f64,
    pub vy: f64,
    pub vz: f64,
    pub mass: f64,
    pub luminosity: f64,
    pub metallicity: f64,
}

impl ParticleRow {
    /// Builds a row from the nine snapshot columns.
    #[must_use]
    pub fn from_columns(c: [f64; 9]) -> Self {
        Self {
            x: c[0],
            y: c[1],
            z: c[2],
            vx: c[3],
            vy: c[4],
            vz: c[5],
            mass: c[6],
            luminosity: c[7],
            metallicity: c[8],
        }
    }
}

impl ParticleBatch {
    /// Creates a new empty batch with specified capacity.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            x: Vec::with_capacity(capacity),
            y: Vec::with_capacity(capacity),
            z: Vec::with_capacity(capacity),
            vx: Vec::with_capacity(capacity),
            vy: Vec::with_capacity(capacity),
            vz: Vec::with_capacity(capacity),
            mass: Vec::with_capacity(capacity),
            luminosity: Vec::with_capacity(capacity),
            metallicity: Vec::with_capacity(capacity),
        }
    }

    /// Returns the number of particles in the batch.
    #[must_use]
    pub fn len(&self) -> usize {
        self.x.len()
    }

    /// Returns true if the batch is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    /// Pushes a single particle.
    pub fn push(&mut self, row: ParticleRow) {
        self.x.push(row.x);
        self.y.push(row.y);
        self.z.push(row.z);
        self.vx.push(row.vx);
        self.vy.push(row.vy);
        self.vz.push(row.vz);
        self.mass.push(row.mass);
        self.luminosity.push(row.luminosity);
        self.metallicity.push(row.metallicity);
    }

    /// Appends all particles from another batch to this one.
    pub fn append(&mut self, other: &ParticleBatch) {
        self.x.extend_from_slice(&other.x);
        self.y.extend_from_slice(&other.y);
        self.z.extend_from_slice(&other.z);
        self.vx.extend_from_slice(&other.vx);
        self.vy.extend_from_slice(&other.vy);
        self.vz.extend_from_slice(&other.vz);
        self.mass.extend_from_slice(&other.mass);
        self.luminosity.extend_from_slice(&other.luminosity);
        self.metallicity.extend_from_slice(&other.metallicity);
    }

    /// Checks that all columns have the same length and that every mass is a
    /// finite, non-negative weight.
    ///
    /// # Errors
    /// [`Error::InputShape`] on a column length mismatch,
    /// [`Error::InvalidParticle`] on a bad mass.
    pub fn validate(&self) -> Result<()> {
        let n = self.x.len();
        let columns = [
            ("y", self.y.len()),
            ("z", self.z.len()),
            ("vx", self.vx.len()),
            ("vy", self.vy.len()),
            ("vz", self.vz.len()),
            ("mass", self.mass.len()),
            ("luminosity", self.luminosity.len()),
            ("metallicity", self.metallicity.len()),
        ];
        for (name, len) in columns {
            if len != n {
                return Err(Error::InputShape(format!(
                    "particle column '{name}' has {len} entries, expected {n}"
                )));
            }
        }

        if let Some(index) = self.mass.iter().position(|m| !m.is_finite() || *m < 0.0) {
            return Err(Error::InvalidParticle {
                index,
                reason: format!("mass {} is not a non-negative weight", self.mass[index]),
            });
        }
        Ok(())
    }

    /// Sky-plane coordinates for the given line of sight.
    #[must_use]
    pub fn sky_plane(&self, los: LineOfSight) -> (&[f64], &[f64]) {
        match los {
            LineOfSight::X => (&self.y, &self.z),
            LineOfSight::Y => (&self.z, &self.x),
            LineOfSight::Z => (&self.x, &self.y),
        }
    }

    /// Velocity component along the line of sight.
    #[must_use]
    pub fn los_velocity(&self, los: LineOfSight) -> &[f64] {
        match los {
            LineOfSight::X => &self.vx,
            LineOfSight::Y => &self.vy,
            LineOfSight::Z => &self.vz,
        }
    }

    /// Total mass of the batch.
    #[must_use]
    pub fn total_mass(&self) -> f64 {
        self.mass.iter().sum()
    }
}
