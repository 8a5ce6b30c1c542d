//! Built-in labware seed table.
//!
//! Volumes in nanoliters. Source plates carry the working range of the
//! corresponding instrument calibration; destination plates have no dead
//! volume.

use log::error;

use super::{LabwareDefinition, PlateUsage};

struct Seed {
    name: &'static str,
    format: &'static str,
    usage: PlateUsage,
    rows: u16,
    columns: u16,
    capacity_nl: f64,
    dead_volume_nl: f64,
    drop_volume_nl: Option<f64>,
}

const SEEDS: &[Seed] = &[
    Seed {
        name: "384PP_DMSO2",
        format: "384PP",
        usage: PlateUsage::Source,
        rows: 16,
        columns: 24,
        capacity_nl: 65_000.0,
        dead_volume_nl: 15_000.0,
        drop_volume_nl: Some(2.5),
    },
    Seed {
        name: "384PP_AQ_BP",
        format: "384PP",
        usage: PlateUsage::Source,
        rows: 16,
        columns: 24,
        capacity_nl: 65_000.0,
        dead_volume_nl: 20_000.0,
        drop_volume_nl: Some(2.5),
    },
    Seed {
        name: "384LDV_DMSO",
        format: "384LDV",
        usage: PlateUsage::Source,
        rows: 16,
        columns: 24,
        capacity_nl: 14_000.0,
        dead_volume_nl: 4_500.0,
        drop_volume_nl: Some(2.5),
    },
    Seed {
        name: "384LDV_AQ_B2",
        format: "384LDV",
        usage: PlateUsage::Source,
        rows: 16,
        columns: 24,
        capacity_nl: 12_000.0,
        dead_volume_nl: 6_000.0,
        drop_volume_nl: Some(2.5),
    },
    Seed {
        name: "1536LDV_DMSO",
        format: "1536LDV",
        usage: PlateUsage::Source,
        rows: 32,
        columns: 48,
        capacity_nl: 5_500.0,
        dead_volume_nl: 1_000.0,
        drop_volume_nl: Some(2.5),
    },
    Seed {
        name: "6RES_AQ_BP2",
        format: "6RES",
        usage: PlateUsage::Source,
        rows: 2,
        columns: 3,
        capacity_nl: 2_800_000.0,
        dead_volume_nl: 250_000.0,
        drop_volume_nl: Some(25.0),
    },
    Seed {
        name: "Corning_96_3590",
        format: "96",
        usage: PlateUsage::Destination,
        rows: 8,
        columns: 12,
        capacity_nl: 360_000.0,
        dead_volume_nl: 0.0,
        drop_volume_nl: None,
    },
    Seed {
        name: "Corning_384PS_3657",
        format: "384",
        usage: PlateUsage::Destination,
        rows: 16,
        columns: 24,
        capacity_nl: 112_000.0,
        dead_volume_nl: 0.0,
        drop_volume_nl: None,
    },
    Seed {
        name: "Greiner_1536_782096",
        format: "1536",
        usage: PlateUsage::Destination,
        rows: 32,
        columns: 48,
        capacity_nl: 12_500.0,
        dead_volume_nl: 0.0,
        drop_volume_nl: None,
    },
];

pub(super) fn builtin_definitions() -> Vec<LabwareDefinition> {
    SEEDS
        .iter()
        .filter_map(|seed| {
            let mut builder =
                LabwareDefinition::builder(seed.name, seed.usage, seed.rows, seed.columns)
                    .format(seed.format)
                    .capacity_nl(seed.capacity_nl)
                    .dead_volume_nl(seed.dead_volume_nl);
            if let Some(drop) = seed.drop_volume_nl {
                builder = builder.drop_volume_nl(drop);
            }
            match builder.build() {
                Ok(definition) => Some(definition),
                Err(e) => {
                    error!("Skipping built-in labware {}: {}", seed.name, e);
                    None
                }
            }
        })
        .collect()
}
