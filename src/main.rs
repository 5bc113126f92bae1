//! vdf-assemble: build and inspect VDF files
//!
//! Run with: vdf-assemble assemble <source> <dest> --dims 64 64 64

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use vdf::{
    AssemblerConfig, Dimensions, GridType, IngestPolicy, RawReader, VdfReader, VolumeAssembler,
};

#[derive(Parser)]
#[command(name = "vdf-assemble", version, about = "Assemble volume snapshots into a VDF file")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Convert a folder of raw snapshots into one VDF file
    Assemble {
        source: PathBuf,
        dest: PathBuf,
        /// JSON configuration; flags below override it
        #[arg(long)]
        config: Option<PathBuf>,
        #[arg(long, num_args = 3, value_names = ["X", "Y", "Z"])]
        dims: Option<Vec<u32>>,
        #[arg(long, value_enum)]
        grid: Option<GridArg>,
        #[arg(long, value_enum)]
        on_error: Option<PolicyArg>,
    },
    /// Print the header of a VDF file
    Inspect { file: PathBuf },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum GridArg {
    Cartesian,
    Spherical,
}

impl From<GridArg> for GridType {
    fn from(arg: GridArg) -> Self {
        match arg {
            GridArg::Cartesian => GridType::Cartesian,
            GridArg::Spherical => GridType::Spherical,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum PolicyArg {
    Skip,
    Abort,
}

impl From<PolicyArg> for IngestPolicy {
    fn from(arg: PolicyArg) -> Self {
        match arg {
            PolicyArg::Skip => IngestPolicy::Skip,
            PolicyArg::Abort => IngestPolicy::Abort,
        }
    }
}

fn build_config(
    config: Option<PathBuf>,
    dims: Option<Vec<u32>>,
    grid: Option<GridArg>,
    on_error: Option<PolicyArg>,
) -> Result<AssemblerConfig> {
    let dims = match dims.as_deref() {
        Some(&[x, y, z]) => Some(Dimensions { x, y, z }),
        Some(other) => bail!("--dims takes three values, got {}", other.len()),
        None => None,
    };

    let mut config = match (config, dims) {
        (Some(path), _) => AssemblerConfig::from_json_file(&path)
            .with_context(|| format!("loading {}", path.display()))?,
        (None, Some(dims)) => AssemblerConfig::new(GridType::Cartesian, dims),
        (None, None) => bail!("either --config or --dims is required"),
    };

    if let Some(dims) = dims {
        config.dimensions = dims;
    }
    if let Some(grid) = grid {
        config.grid_type = grid.into();
    }
    if let Some(policy) = on_error {
        config.ingest_policy = policy.into();
    }
    Ok(config)
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Assemble {
            source,
            dest,
            config,
            dims,
            grid,
            on_error,
        } => {
            let config = build_config(config, dims, grid, on_error)?;
            let reader = match config.compression {
                Some(method) => RawReader::new().with_compression(method),
                None => RawReader::new(),
            };
            let mut assembler = VolumeAssembler::from_config(reader, &config)?;
            let report = assembler
                .process_folder(&source, &dest)
                .with_context(|| format!("assembling {}", source.display()))?;

            println!("{}", report.final_path.display());
            for skipped in &report.skipped {
                eprintln!("skipped {}", skipped.display());
            }
        }
        Commands::Inspect { file } => {
            let vdf = VdfReader::open(&file).with_context(|| format!("opening {}", file.display()))?;
            println!("{}", vdf.stats().summary());
        }
    }
    Ok(())
}
