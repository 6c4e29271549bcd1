//! mockifu-core: Core types for mock integral-field-unit observations.
//!
//! This crate provides the data model shared by the binning and statistics
//! crates: the instrument footprint and its membership test, the spatial bin
//! geometry, particle batches, assignment labels and per-bin records.
//!

pub mod assignment;
pub mod bins;
pub mod config;
pub mod error;
pub mod footprint;
pub mod particle;
pub mod record;

pub use assignment::{Assignment, UNASSIGNED};
pub use bins::{BinGeometry, SpatialBin};
pub use config::{LineOfSight, ObservationConfig, UnitConversion};
pub use error::{DegenerateBin, Error, Result};
pub use footprint::{BoundingBox, FootprintBoundary};
pub use particle::{ParticleBatch, ParticleRow};
pub use record::{BinStatRecord, GaussHermiteMoments, RECORD_COLUMNS};
