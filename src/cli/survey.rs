use anyhow::{Context, Result};
use log::info;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

use echoplate::labware::WellPosition;
use echoplate::outcome::ParseMode;
use echoplate::survey::{parse_survey, write_survey_to, CellValue, PlateSurvey};

use super::{open_input, Session};

/// Parse a survey file and print a summary
pub fn run(
    session: &Session,
    file: PathBuf,
    mode: Option<ParseMode>,
    grid: Option<String>,
    output: Option<PathBuf>,
) -> Result<()> {
    let options = session.config.survey_options(mode);
    info!("Parsing survey {} ({:?} mode)", file.display(), options.mode);

    let parsed = parse_survey(open_input(&file)?, &session.registry, options)
        .with_context(|| format!("Failed to parse survey {}", file.display()))?;
    for warning in &parsed.warnings {
        eprintln!("warning: {}", warning);
    }
    let survey = parsed.value;

    if let Some(output) = &output {
        let mut out = BufWriter::new(
            File::create(output)
                .with_context(|| format!("Failed to create {}", output.display()))?,
        );
        write_survey_to(&survey, &mut out).context("Failed to write survey")?;
        out.flush()?;
        info!("Wrote {}", output.display());
    }

    if session.json {
        println!("{}", serde_json::to_string_pretty(&survey)?);
        return Ok(());
    }

    print_summary(&survey);
    if let Some(kind) = grid {
        println!();
        print_grid(&survey, &kind);
    }
    Ok(())
}

fn print_summary(survey: &PlateSurvey) {
    let metadata = survey.metadata();
    let labware = survey.labware();
    let (rows, columns) = labware.shape();

    println!("Plate Survey");
    println!("============");
    println!("Plate: {}", survey.barcode().unwrap_or("(no barcode)"));
    if let Some(name) = &metadata.plate_name {
        println!("Name: {}", name);
    }
    println!("Labware: {} ({}x{})", labware.name(), rows, columns);
    println!("Date: {}", metadata.timestamp.raw);
    if let Some(serial) = &metadata.instrument.serial_number {
        println!("Instrument: {}", serial);
    }
    println!(
        "Wells surveyed: {} of {}",
        survey.len(),
        labware.well_count()
    );

    if let Some((first, last)) = survey.extent() {
        println!(
            "Extent: {} to {}",
            labware.well_name(first),
            labware.well_name(last)
        );
    }

    let volumes: Vec<f64> = survey.wells().iter().filter_map(|w| w.volume_nl()).collect();
    if !volumes.is_empty() {
        let min = volumes.iter().copied().fold(f64::INFINITY, f64::min);
        let max = volumes.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let mean = volumes.iter().sum::<f64>() / volumes.len() as f64;
        println!(
            "Volume (nL): min {:.1}, mean {:.1}, max {:.1}",
            min, mean, max
        );
    }
}

fn print_grid(survey: &PlateSurvey, kind: &str) {
    let grid = survey.value_grid(kind);
    let (_, columns) = grid.shape();

    print!("{:>4}", "");
    for column in 1..=columns {
        print!("{:>9}", column);
    }
    println!();

    for (row, cells) in grid.rows().enumerate() {
        print!("{:>4}", WellPosition::new(row as u16, 0).row_label());
        for cell in cells {
            match cell {
                CellValue::Value(v) => print!("{:>9.1}", v),
                CellValue::NotMeasured => print!("{:>9}", "-"),
                CellValue::NoData => print!("{:>9}", "."),
            }
        }
        println!();
    }
}
