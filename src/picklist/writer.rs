use std::io::Write;

use csv::WriterBuilder;

use super::models::PickList;
use super::parser::headers;
use super::PickListError;

/// Write a picklist as CSV in the instrument's column layout.
///
/// Volumes are written in nL under a plain `Transfer Volume` header, so the
/// output parses back to the same entries. Metadata columns follow the
/// standard columns in their original header order.
pub fn write_picklist<W: Write>(picklist: &PickList, out: W) -> Result<(), PickListError> {
    let mut writer = WriterBuilder::new().from_writer(out);

    let mut header = vec![
        headers::SOURCE_PLATE_NAME,
        headers::SOURCE_PLATE_TYPE,
        headers::SOURCE_PLATE_BARCODE,
        headers::SOURCE_WELL,
        headers::DESTINATION_PLATE_NAME,
        headers::DESTINATION_PLATE_TYPE,
        headers::DESTINATION_PLATE_BARCODE,
        headers::DESTINATION_WELL,
        headers::TRANSFER_VOLUME,
        headers::SAMPLE_NAME,
        headers::DESTINATION_SAMPLE_NAME,
    ];
    header.extend(picklist.metadata_columns().iter().map(String::as_str));
    writer.write_record(&header)?;

    for entry in picklist {
        let opt = |value: &Option<String>| value.clone().unwrap_or_default();
        let mut record = vec![
            opt(&entry.source.plate_name),
            opt(&entry.source.plate_type),
            opt(&entry.source.plate_barcode),
            entry.source.well_name.clone(),
            opt(&entry.destination.plate_name),
            opt(&entry.destination.plate_type),
            opt(&entry.destination.plate_barcode),
            entry.destination.well_name.clone(),
            entry.volume_nl.to_string(),
            opt(&entry.sample_name),
            opt(&entry.destination_sample_name),
        ];
        record.extend(
            picklist
                .metadata_columns()
                .iter()
                .map(|key| entry.metadata.get(key).cloned().unwrap_or_default()),
        );
        writer.write_record(&record)?;
    }

    writer.flush()?;
    Ok(())
}
