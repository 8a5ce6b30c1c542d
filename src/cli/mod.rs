use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::info;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use echoplate::labware::LabwareRegistry;
use echoplate::outcome::ParseMode;
use echoplate::picklist::VolumeUnit;

mod config;
mod labware;
mod picklist;
mod survey;
mod validate;

pub use config::Config;

/// echoplate - acoustic liquid handler survey, picklist and labware tooling
#[derive(Parser)]
#[command(name = "echoplate")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Verbosity level (-v for info, -vv for debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Load settings from a TOML config file
    #[arg(long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Extra labware XML file to register (repeatable)
    #[arg(short = 'l', long = "labware-file", value_name = "FILE", global = true)]
    labware_files: Vec<PathBuf>,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a plate survey XML file and summarise it
    Survey {
        /// Survey XML file
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Parse mode (strict, lenient); strict by default
        #[arg(short, long)]
        mode: Option<ParseMode>,

        /// Print a plate-shaped grid of one feature kind (e.g. volume)
        #[arg(short, long, value_name = "KIND")]
        grid: Option<String>,

        /// Write the survey back out as platesurvey XML
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Parse a transfer picklist and summarise it
    Picklist {
        /// Picklist CSV or TSV file
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Parse mode (strict, lenient); lenient by default
        #[arg(short, long)]
        mode: Option<ParseMode>,

        /// Unit of a volume column whose header names none (nL, uL, mL)
        #[arg(short, long)]
        unit: Option<VolumeUnit>,

        /// Input is tab-separated
        #[arg(long)]
        tsv: bool,

        /// Write the parsed entries back out as canonical CSV
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Cross-validate a picklist against labware and an optional survey
    Validate {
        /// Picklist CSV or TSV file
        #[arg(value_name = "PICKLIST")]
        picklist: PathBuf,

        /// Survey XML file of the source plate
        #[arg(short, long, value_name = "FILE")]
        survey: Option<PathBuf>,

        /// Picklist parse mode (strict, lenient)
        #[arg(short, long)]
        mode: Option<ParseMode>,

        /// Unit of a volume column whose header names none (nL, uL, mL)
        #[arg(short, long)]
        unit: Option<VolumeUnit>,

        /// Picklist is tab-separated
        #[arg(long)]
        tsv: bool,
    },

    /// List registered labware types
    Labware {
        /// Show a single type
        #[arg(value_name = "NAME")]
        name: Option<String>,
    },
}

/// Options shared by every subcommand
pub(crate) struct Session {
    pub config: Config,
    pub registry: LabwareRegistry,
    pub json: bool,
}

impl Session {
    fn open(cli: &Cli) -> Result<Self> {
        let config = match &cli.config {
            Some(path) => Config::from_file(path)?,
            None => Config::default(),
        };

        let registry = LabwareRegistry::with_builtin();
        for path in config.labware.files.iter().chain(&cli.labware_files) {
            load_labware(&registry, path)?;
        }

        Ok(Self {
            config,
            registry,
            json: cli.json,
        })
    }
}

fn load_labware(registry: &LabwareRegistry, path: &Path) -> Result<()> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open labware file: {}", path.display()))?;
    let loaded = registry
        .load_elwx(BufReader::new(file))
        .with_context(|| format!("Failed to load labware file: {}", path.display()))?;
    info!("Registered {} labware types from {}", loaded.len(), path.display());
    Ok(())
}

pub(crate) fn open_input(path: &Path) -> Result<BufReader<File>> {
    if !path.exists() {
        anyhow::bail!("Input file does not exist: {}", path.display());
    }
    let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    Ok(BufReader::new(file))
}

impl Cli {
    pub fn verbosity(&self) -> u8 {
        self.verbose
    }
}

pub fn init_logging(verbosity: u8) {
    let log_level = match verbosity {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();
}

pub fn dispatch(cli: Cli) -> Result<()> {
    let session = Session::open(&cli)?;

    match cli.command {
        Commands::Survey {
            file,
            mode,
            grid,
            output,
        } => survey::run(&session, file, mode, grid, output),
        Commands::Picklist {
            file,
            mode,
            unit,
            tsv,
            output,
        } => picklist::run(&session, file, mode, unit, tsv, output),
        Commands::Validate {
            picklist,
            survey,
            mode,
            unit,
            tsv,
        } => validate::run(&session, picklist, survey, mode, unit, tsv),
        Commands::Labware { name } => labware::run(&session, name),
    }
}
