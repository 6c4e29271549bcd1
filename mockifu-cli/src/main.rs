//! mockifu CLI - Mock IFU observations from particle snapshots.
//!
//! This binary bins a snapshot into an instrument footprint and writes the
//! per-bin kinematic table.
#![allow(clippy::uninlined_format_args)]

use clap::{Args, Parser, Subcommand, ValueEnum};
use log::{info, LevelFilter};
use mockifu_algorithms::{observe, ObservationSummary};
use mockifu_core::{LineOfSight, ObservationConfig, UnitConversion};
use mockifu_io::{read_bin_geometry, read_footprint, read_snapshot, IfuDataWriter};
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;
use thiserror::Error;

/// Result type for CLI operations.
type Result<T> = std::result::Result<T, CliError>;

/// CLI error types.
#[derive(Error, Debug)]
enum CliError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("I/O error: {0}")]
    MockIfuIo(#[from] mockifu_io::Error),

    #[error("Core error: {0}")]
    Core(#[from] mockifu_core::Error),

    #[error("Summary error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Line-of-sight axis selection.
#[derive(Debug, Clone, Copy, ValueEnum)]
enum Axis {
    /// Project onto the (y, z) plane
    X,
    /// Project onto the (z, x) plane
    Y,
    /// Project onto the (x, y) plane
    Z,
}

impl From<Axis> for LineOfSight {
    fn from(axis: Axis) -> Self {
        match axis {
            Axis::X => LineOfSight::X,
            Axis::Y => LineOfSight::Y,
            Axis::Z => LineOfSight::Z,
        }
    }
}

/// Input file locations, defaulting to the standard layout under a
/// run directory.
#[derive(Args, Debug)]
struct InputPaths {
    /// Run directory holding `ifu/` and `imgs/`
    dir: PathBuf,

    /// Footprint file [default: <DIR>/ifu/IFU_hull]
    #[arg(long)]
    hull: Option<PathBuf>,

    /// Bin geometry file [default: <DIR>/ifu/voronoi_bins.dat]
    #[arg(long)]
    bins: Option<PathBuf>,

    /// Particle snapshot [default: <DIR>/imgs/coordinates_star.npy]
    #[arg(long)]
    snapshot: Option<PathBuf>,
}

impl InputPaths {
    fn hull(&self) -> PathBuf {
        self.hull
            .clone()
            .unwrap_or_else(|| self.dir.join("ifu").join("IFU_hull"))
    }

    fn bins(&self) -> PathBuf {
        self.bins
            .clone()
            .unwrap_or_else(|| self.dir.join("ifu").join("voronoi_bins.dat"))
    }

    fn snapshot(&self) -> PathBuf {
        self.snapshot
            .clone()
            .unwrap_or_else(|| self.dir.join("imgs").join("coordinates_star.npy"))
    }
}

/// Length-unit conversion for particle positions.
#[derive(Args, Debug)]
#[group(required = true, multiple = false)]
struct UnitArgs {
    /// Multiply positions by this kpc to arcsec factor
    #[arg(long)]
    kpc_to_arcsec: Option<f64>,

    /// Derive the kpc to arcsec factor from the distance in Mpc
    #[arg(long)]
    distance_mpc: Option<f64>,
}

impl UnitArgs {
    fn conversion(&self) -> Result<UnitConversion> {
        let units = match (self.kpc_to_arcsec, self.distance_mpc) {
            (Some(factor), _) => UnitConversion::new(factor)?,
            (None, Some(distance)) => UnitConversion::from_distance_mpc(distance)?,
            (None, None) => UnitConversion::identity(),
        };
        Ok(units)
    }
}

/// Mock integral-field-unit observations from simulated star particles.
#[derive(Parser)]
#[command(name = "mockifu")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Verbose (debug) logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Bin a snapshot and write the per-bin kinematic table
    Build {
        #[command(flatten)]
        paths: InputPaths,

        #[command(flatten)]
        units: UnitArgs,

        /// Output table [default: <DIR>/ifu/IFU_data]
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Line-of-sight axis
        #[arg(long, value_enum, default_value = "z")]
        line_of_sight: Axis,

        /// Bootstrap resamples per bin
        #[arg(long, default_value_t = mockifu_core::config::DEFAULT_RESAMPLES)]
        resamples: usize,

        /// Base seed for the bootstrap generators
        #[arg(long, default_value_t = mockifu_core::config::DEFAULT_SEED)]
        seed: u64,

        /// Disable rayon parallelism
        #[arg(long)]
        serial: bool,

        /// Also write the table as CSV
        #[arg(long)]
        csv: Option<PathBuf>,

        /// Write a JSON run summary
        #[arg(long)]
        summary: Option<PathBuf>,
    },

    /// Show counts and extents of the inputs without binning
    Info {
        #[command(flatten)]
        paths: InputPaths,
    },
}

/// JSON run summary.
#[derive(Serialize)]
struct RunSummary<'a> {
    hull: &'a Path,
    bins: &'a Path,
    snapshot: &'a Path,
    output: &'a Path,
    kpc_to_arcsec: f64,
    config: &'a ObservationConfig,
    #[serde(flatten)]
    observation: ObservationSummary,
    elapsed_seconds: f64,
}

/// Every requested output, opened before anything is written.
struct OutputFiles {
    table: IfuDataWriter,
    csv: Option<IfuDataWriter>,
    summary: Option<BufWriter<File>>,
}

impl OutputFiles {
    /// Opens the optional outputs first, so a bad `--csv` or `--summary`
    /// path fails before the table is created.
    fn create(output: &Path, csv: Option<&Path>, summary: Option<&Path>) -> Result<Self> {
        let summary = summary.map(File::create).transpose()?.map(BufWriter::new);
        let csv = csv.map(IfuDataWriter::create).transpose()?;
        let table = IfuDataWriter::create(output)?;
        Ok(Self {
            table,
            csv,
            summary,
        })
    }
}

fn init_logging(verbose: bool) {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if verbose {
        builder.filter_level(LevelFilter::Debug);
    }
    builder.init();
}

/// Minimum and maximum of the finite values, if any.
fn extent(values: &[f64]) -> Option<(f64, f64)> {
    values
        .iter()
        .copied()
        .filter(|v| v.is_finite())
        .fold(None, |acc, v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
}

fn print_extent(label: &str, values: &[f64]) {
    match extent(values) {
        Some((lo, hi)) => println!("{label} range: {lo} - {hi}"),
        None => println!("{label} range: n/a"),
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Build {
            paths,
            units,
            output,
            line_of_sight,
            resamples,
            seed,
            serial,
            csv,
            summary,
        } => {
            let start = Instant::now();
            let units = units.conversion()?;
            let config = ObservationConfig::new()
                .with_line_of_sight(line_of_sight.into())
                .with_resamples(resamples)
                .with_seed(seed)
                .with_parallel(!serial);
            config.validate()?;

            let (hull, bins, snapshot) = (paths.hull(), paths.bins(), paths.snapshot());
            let output = output.unwrap_or_else(|| paths.dir.join("ifu").join("IFU_data"));

            let footprint = read_footprint(&hull)?;
            let geometry = read_bin_geometry(&bins)?;
            let batch = read_snapshot(&snapshot, units)?;
            info!(
                "footprint: {} vertices, bins: {}, particles: {}",
                footprint.vertices().len(),
                geometry.len(),
                batch.len()
            );

            // Every statistic is computed before any output file is opened.
            let observation = observe(&batch, &footprint, &geometry, &config)?;

            let mut files = OutputFiles::create(&output, csv.as_deref(), summary.as_deref())?;
            files.table.write_records(&observation.records)?;
            info!("wrote {}", output.display());

            if let (Some(writer), Some(path)) = (files.csv.as_mut(), &csv) {
                writer.write_csv(&observation.records)?;
                info!("wrote {}", path.display());
            }

            let elapsed = start.elapsed();
            let run = observation.summary();

            if let (Some(writer), Some(path)) = (files.summary.as_mut(), &summary) {
                let report = RunSummary {
                    hull: &hull,
                    bins: &bins,
                    snapshot: &snapshot,
                    output: &output,
                    kpc_to_arcsec: units.factor(),
                    config: &config,
                    observation: run.clone(),
                    elapsed_seconds: elapsed.as_secs_f64(),
                };
                serde_json::to_writer_pretty(&mut *writer, &report)?;
                writer.flush()?;
                info!("wrote {}", path.display());
            }

            println!("Processed in {:.2}s", elapsed.as_secs_f64());
            println!("Particles binned: {} / {}", run.particles_binned, run.particles);
            println!("Bins: {}", run.bins);
            println!("Degenerate bins: {}", run.degenerate_bins.len());
        }

        Commands::Info { paths } => {
            let hull = paths.hull();
            let footprint = read_footprint(&hull)?;
            let bounds = footprint.bounds();
            println!("Footprint: {}", hull.display());
            println!("  Vertices: {}", footprint.vertices().len());
            println!(
                "  Radius: {} - {}",
                footprint.min_radius(),
                footprint.max_radius()
            );
            println!(
                "  Bounds: x {} - {}, y {} - {}",
                bounds.x_min, bounds.x_max, bounds.y_min, bounds.y_max
            );

            let bins = paths.bins();
            let geometry = read_bin_geometry(&bins)?;
            let (cx, cy): (Vec<f64>, Vec<f64>) = geometry.centroids().into_iter().unzip();
            println!("Bins: {}", bins.display());
            println!("  Count: {}", geometry.len());
            println!("  Area in use: {}", geometry.area_in_use());
            print_extent("  X", &cx);
            print_extent("  Y", &cy);

            let snapshot = paths.snapshot();
            let batch = read_snapshot(&snapshot, UnitConversion::identity())?;
            println!("Snapshot: {}", snapshot.display());
            println!("  Particles: {}", batch.len());
            println!("  Total mass: {:e}", batch.total_mass());
            print_extent("  X (kpc)", &batch.x);
            print_extent("  Y (kpc)", &batch.y);
            print_extent("  Z (kpc)", &batch.z);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_build_requires_one_unit_option() {
        assert!(Cli::try_parse_from(["mockifu", "build", "run"]).is_err());
        assert!(Cli::try_parse_from([
            "mockifu",
            "build",
            "run",
            "--kpc-to-arcsec",
            "2",
            "--distance-mpc",
            "16.5"
        ])
        .is_err());
        assert!(Cli::try_parse_from(["mockifu", "build", "run", "--distance-mpc", "16.5"]).is_ok());
    }

    #[test]
    fn test_build_defaults() {
        let cli =
            Cli::try_parse_from(["mockifu", "build", "run", "--kpc-to-arcsec", "2.5"]).unwrap();
        let Commands::Build {
            paths,
            units,
            output,
            resamples,
            seed,
            serial,
            ..
        } = cli.command
        else {
            panic!("expected build");
        };
        assert_eq!(paths.hull(), Path::new("run/ifu/IFU_hull"));
        assert_eq!(paths.bins(), Path::new("run/ifu/voronoi_bins.dat"));
        assert_eq!(paths.snapshot(), Path::new("run/imgs/coordinates_star.npy"));
        assert!(output.is_none());
        assert_eq!(resamples, 500);
        assert_eq!(seed, mockifu_core::config::DEFAULT_SEED);
        assert!(!serial);
        assert!((units.conversion().unwrap().factor() - 2.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_path_overrides() {
        let cli = Cli::try_parse_from([
            "mockifu",
            "info",
            "run",
            "--snapshot",
            "elsewhere/stars.txt",
        ])
        .unwrap();
        let Commands::Info { paths } = cli.command else {
            panic!("expected info");
        };
        assert_eq!(paths.snapshot(), Path::new("elsewhere/stars.txt"));
        assert_eq!(paths.hull(), Path::new("run/ifu/IFU_hull"));
    }

    #[test]
    fn test_unit_conversion_from_distance() {
        let units = UnitArgs {
            kpc_to_arcsec: None,
            distance_mpc: Some(2.0),
        };
        let factor = units.conversion().unwrap().factor();
        assert!((factor - 103.132_403).abs() < 1e-9);

        let bad = UnitArgs {
            kpc_to_arcsec: Some(-1.0),
            distance_mpc: None,
        };
        assert!(bad.conversion().is_err());
    }

    #[test]
    fn test_outputs_opened_before_any_write() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("IFU_data");
        let missing = dir.path().join("missing");

        let bad_csv = missing.join("table.csv");
        assert!(OutputFiles::create(&output, Some(bad_csv.as_path()), None).is_err());
        assert!(!output.exists());

        let bad_summary = missing.join("summary.json");
        assert!(OutputFiles::create(&output, None, Some(bad_summary.as_path())).is_err());
        assert!(!output.exists());

        let csv = dir.path().join("table.csv");
        let files = OutputFiles::create(&output, Some(csv.as_path()), None).unwrap();
        assert!(files.csv.is_some());
        assert!(files.summary.is_none());
        assert!(output.exists() && csv.exists());
    }

    #[test]
    fn test_extent_skips_non_finite() {
        assert_eq!(extent(&[]), None);
        assert_eq!(extent(&[f64::NAN]), None);
        assert_eq!(extent(&[3.0, f64::NAN, -1.0, 2.0]), Some((-1.0, 3.0)));
    }
}
