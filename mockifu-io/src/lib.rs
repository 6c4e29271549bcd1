//! mockifu-io: Input readers and output writers for mock IFU observations.
//!
//! This crate reads the instrument footprint (`IFU_hull`), the bin geometry
//! (`voronoi_bins.dat`) and the particle snapshot (`.npy` via memmap2, or
//! whitespace text), and writes per-bin records as `IFU_data` text or CSV.
//!

mod error;
mod npy;
mod reader;
mod writer;

pub use error::{Error, Result};
pub use reader::{
    read_bin_geometry, read_footprint, read_snapshot, MappedFileReader, SNAPSHOT_COLUMNS,
};
pub use writer::{format_exp, format_ifu_row, IfuDataWriter};
