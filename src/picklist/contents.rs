//! Trace what ends up in a destination well.
//!
//! A well filled from an intermediate well (one that is itself a transfer
//! destination) is followed back to the wells that fed the intermediate, so
//! every [`WellContent`] names a well the picklist never fills.

use serde::Serialize;

use super::models::{PickList, PickListEntry, WellVolumes};
use crate::labware::WellPosition;

/// One original source contributing to a traced well
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WellContent {
    /// Label (name, else barcode) of the original source plate
    pub plate: String,
    /// Original source well
    pub well: WellPosition,
    /// Well as written in the picklist
    pub well_name: String,
    /// Sample name of the transfer out of the original source
    pub sample_name: Option<String>,
    /// Fraction of the traced well's delivered volume that came from this source
    pub ratio: f64,
}

impl PickList {
    /// Transfers delivering into one well, in file order
    pub fn transfers_into<'a: 'p, 'p>(
        &'a self,
        plate: &'p str,
        well: WellPosition,
    ) -> impl Iterator<Item = &'a PickListEntry> + 'p {
        self.iter()
            .filter(move |e| e.destination.well == well && e.destination.plate_label() == plate)
    }

    /// Original sources of a destination well and their share of its volume.
    ///
    /// Ratios are relative to the total volume the picklist delivers into each
    /// well; liquid already in a well before the run is not counted. Sources
    /// of a transfer cycle are reported where the cycle closes.
    pub fn contents(&self, plate: &str, well: WellPosition) -> Vec<WellContent> {
        let totals = self.destination_totals();
        let mut tracer = Tracer {
            picklist: self,
            totals: &totals,
            path: vec![(plate.to_string(), well)],
            found: Vec::new(),
        };
        for entry in self.transfers_into(plate, well) {
            let ratio = share(entry, &totals, plate, well);
            tracer.trace(entry, ratio);
        }
        tracer.found
    }

    /// Contents of every transfer whose destination sample name is `name`
    pub fn contents_of_sample(&self, name: &str) -> Vec<WellContent> {
        let totals = self.destination_totals();
        let mut found = Vec::new();
        for entry in self
            .iter()
            .filter(|e| e.destination_sample_name.as_deref() == Some(name))
        {
            let plate = entry.destination.plate_label();
            let mut tracer = Tracer {
                picklist: self,
                totals: &totals,
                path: vec![(plate.to_string(), entry.destination.well)],
                found: Vec::new(),
            };
            tracer.trace(entry, share(entry, &totals, plate, entry.destination.well));
            found.append(&mut tracer.found);
        }
        found
    }
}

/// Fraction of a well's delivered volume carried by one transfer into it
fn share(entry: &PickListEntry, totals: &WellVolumes, plate: &str, well: WellPosition) -> f64 {
    match totals.get(&(plate.to_string(), well)) {
        Some(total) if *total > 0.0 => entry.volume_nl / total,
        _ => 0.0,
    }
}

struct Tracer<'a> {
    picklist: &'a PickList,
    totals: &'a WellVolumes,
    /// Wells on the current trace, to stop at cycles
    path: Vec<(String, WellPosition)>,
    found: Vec<WellContent>,
}

impl Tracer<'_> {
    fn trace(&mut self, entry: &PickListEntry, ratio: f64) {
        let key = (entry.source.plate_label().to_string(), entry.source.well);
        let is_intermediate = self.totals.contains_key(&key) && !self.path.contains(&key);

        if !is_intermediate {
            self.found.push(WellContent {
                plate: key.0,
                well: key.1,
                well_name: entry.source.well_name.clone(),
                sample_name: entry.sample_name.clone(),
                ratio,
            });
            return;
        }

        let picklist = self.picklist;
        let upstream: Vec<(&PickListEntry, f64)> = picklist
            .transfers_into(&key.0, key.1)
            .map(|up| (up, share(up, self.totals, &key.0, key.1)))
            .collect();
        self.path.push(key);
        for (up, up_share) in upstream {
            self.trace(up, ratio * up_share);
        }
        self.path.pop();
    }
}
