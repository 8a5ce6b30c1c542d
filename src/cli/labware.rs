use anyhow::{bail, Result};

use super::Session;

/// List registered labware, or show one type in detail
pub fn run(session: &Session, name: Option<String>) -> Result<()> {
    let definitions = match &name {
        Some(name) => match session.registry.get(name) {
            Some(definition) => vec![definition],
            None => bail!("Unknown labware type: {}", name),
        },
        None => session.registry.snapshot(),
    };

    if session.json {
        println!("{}", serde_json::to_string_pretty(&definitions)?);
        return Ok(());
    }

    println!(
        "{:<24} {:<5} {:<8} {:>5} {:>12} {:>12} {:>6}",
        "Name", "Usage", "Format", "Wells", "Capacity nL", "Dead nL", "Drop"
    );
    for definition in &definitions {
        let drop = definition
            .drop_volume_nl()
            .map(|d| d.to_string())
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{:<24} {:<5} {:<8} {:>5} {:>12.0} {:>12.0} {:>6}",
            definition.name(),
            definition.usage().as_vendor_str(),
            definition.format(),
            definition.well_count(),
            definition.capacity_nl(),
            definition.dead_volume_nl(),
            drop
        );
    }

    if name.is_some() {
        for definition in &definitions {
            for (pos, capacity) in definition.well_capacity_overrides() {
                println!("  {} capacity {:.0} nL", definition.well_name(*pos), capacity);
            }
        }
    }

    Ok(())
}
