use anyhow::{Context, Result};
use log::info;
use serde::Serialize;
use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;

use echoplate::outcome::ParseMode;
use echoplate::picklist::{parse_picklist, write_picklist, PickList, VolumeUnit};

use super::{open_input, Session};

#[derive(Serialize)]
struct SkippedRowJson {
    row: usize,
    line: Option<u64>,
    error: String,
}

#[derive(Serialize)]
struct PickListJson<'a> {
    picklist: &'a PickList,
    skipped: Vec<SkippedRowJson>,
}

/// Parse a picklist and print a summary
pub fn run(
    session: &Session,
    file: PathBuf,
    mode: Option<ParseMode>,
    unit: Option<VolumeUnit>,
    tsv: bool,
    output: Option<PathBuf>,
) -> Result<()> {
    let options = session.config.picklist_options(mode, unit, tsv)?;
    info!("Parsing picklist {} ({:?} mode)", file.display(), options.mode);

    let parsed = parse_picklist(open_input(&file)?, &session.registry, options)
        .with_context(|| format!("Failed to parse picklist {}", file.display()))?;
    let picklist = &parsed.value;

    if let Some(output) = &output {
        let out = File::create(output)
            .with_context(|| format!("Failed to create {}", output.display()))?;
        write_picklist(picklist, BufWriter::new(out)).context("Failed to write picklist")?;
        info!("Wrote {}", output.display());
    }

    if session.json {
        let json = PickListJson {
            picklist,
            skipped: parsed
                .warnings
                .iter()
                .map(|s| SkippedRowJson {
                    row: s.row,
                    line: s.line,
                    error: s.error.to_string(),
                })
                .collect(),
        };
        println!("{}", serde_json::to_string_pretty(&json)?);
        return Ok(());
    }

    println!("Picklist");
    println!("========");
    println!("File: {}", file.display());
    println!("Rows: {}", picklist.source_rows());
    println!("Transfers: {}", picklist.len());
    println!("Skipped: {}", picklist.skipped_rows());
    println!("Volume unit: {}", picklist.volume_unit());
    println!("Total volume: {:.1} nL", picklist.total_volume_nl());

    let withdrawals = picklist.source_withdrawals();
    println!("Source wells: {}", withdrawals.len());
    println!("Destination wells: {}", picklist.destination_totals().len());
    if let Some(((plate, well), volume)) = withdrawals
        .iter()
        .max_by(|a, b| a.1.total_cmp(b.1))
    {
        let plate = if plate.is_empty() { "-" } else { plate.as_str() };
        println!(
            "Largest withdrawal: {:.1} nL from {} {}{}",
            volume,
            plate,
            well.row_label(),
            well.column + 1
        );
    }

    if !parsed.warnings.is_empty() {
        println!();
        for skipped in &parsed.warnings {
            println!("  {}", skipped);
        }
    }

    Ok(())
}
