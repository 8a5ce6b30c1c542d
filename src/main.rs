//! # echoplate
//!
//! Command-line front end for the `echoplate` library.
//!
//! ## Usage
//!
//! ```bash
//! # Summarise a survey and print its volume grid
//! echoplate survey plate.xml --grid volume
//!
//! # Parse a picklist, skipping bad rows
//! echoplate picklist transfers.csv
//!
//! # Check a picklist against the survey of its source plate
//! echoplate validate transfers.csv --survey plate.xml
//!
//! # List known labware, including types from a labware XML file
//! echoplate --labware-file custom.elwx labware
//! ```
//!
//! Logging follows `RUST_LOG` when it is set, otherwise `-v`/`-vv`.

use anyhow::Result;
use clap::Parser;

mod cli;

fn main() -> Result<()> {
    let cli = cli::Cli::parse();

    // Initialize logging based on verbosity
    cli::init_logging(cli.verbosity());

    cli::dispatch(cli)
}
