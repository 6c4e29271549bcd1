//! mockifu-algorithms: Binning and statistics for mock IFU observations.
//!
//! This crate provides the algorithmic core:
//! - **Spatial index** - balanced 2-D k-d tree over bin centroids
//! - **Bin assigner** - footprint test followed by nearest-bin lookup
//! - **Stats engine** - flux-weighted moments with bootstrap errors
//!
#![warn(missing_docs)]

mod assign;
mod processing;
pub mod spatial;
pub mod stats;

pub use assign::BinAssigner;
pub use processing::{observe, IfuObservation, ObservationSummary};
pub use spatial::KdTree;
pub use stats::{WeightedMoments, WeightedStatsEngine};

// Re-export the core configuration used by the pipeline
pub use mockifu_core::config::ObservationConfig;
