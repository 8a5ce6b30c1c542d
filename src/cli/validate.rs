use anyhow::{Context, Result};
use log::info;
use std::path::PathBuf;

use echoplate::outcome::ParseMode;
use echoplate::picklist::{parse_picklist, VolumeUnit};
use echoplate::survey::parse_survey;
use echoplate::validator::cross_validate;

use super::{open_input, Session};

/// Cross-validate a picklist and exit non-zero when errors are found
pub fn run(
    session: &Session,
    picklist: PathBuf,
    survey: Option<PathBuf>,
    mode: Option<ParseMode>,
    unit: Option<VolumeUnit>,
    tsv: bool,
) -> Result<()> {
    info!("echoplate Validator");
    info!("===================");
    info!("Picklist: {}", picklist.display());

    let options = session.config.picklist_options(mode, unit, tsv)?;
    let parsed = parse_picklist(open_input(&picklist)?, &session.registry, options)
        .with_context(|| format!("Failed to parse picklist {}", picklist.display()))?;
    for skipped in &parsed.warnings {
        eprintln!("warning: {}", skipped);
    }

    let survey = match &survey {
        Some(path) => {
            info!("Survey: {}", path.display());
            let parsed = parse_survey(
                open_input(path)?,
                &session.registry,
                session.config.survey_options(None),
            )
            .with_context(|| format!("Failed to parse survey {}", path.display()))?;
            for warning in &parsed.warnings {
                eprintln!("warning: {}", warning);
            }
            Some(parsed.value)
        }
        None => None,
    };

    let report = cross_validate(&parsed.value, survey.as_ref(), &session.registry);

    if session.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        // Plain Display when the colorized_output feature is off
        println!("{}", report.format_colored());
    }

    // Exit with error code if validation failed
    if report.has_errors() {
        std::process::exit(1);
    }

    Ok(())
}
