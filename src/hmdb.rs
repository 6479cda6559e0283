//! Convert an HMDB search export into the marker table layout
use crate::export::write_atomic;
use crate::Error;
use log::info;
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

/// HMDB export headers and the column each one becomes, in output order
pub const COLUMN_MAP: [(&str, &str); 10] = [
    ("MarkerID", "ref:hmdb"),
    ("Marker No.", "ref:US-TX:thc"),
    ("Title", "name"),
    ("Erected By", "ErectedBy"),
    ("Latitude (minus=S)", "hmdb:Latitude"),
    ("Longitude (minus=W)", "hmdb:Longitude"),
    ("Street Address", "addr:full"),
    ("City or Town", "addr:city"),
    ("County or Parish", "addr:county"),
    ("Missing", "isMissing"),
];

/// Reference columns reduced to their first run of digits
const REFERENCE_COLUMNS: [&str; 2] = ["MarkerID", "Marker No."];

/// First run of ASCII digits in `value`, or an empty string
pub fn extract_digits(value: &str) -> &str {
    match value.find(|c: char| c.is_ascii_digit()) {
        Some(start) => {
            let rest = &value[start..];
            let end = rest
                .find(|c: char| !c.is_ascii_digit())
                .unwrap_or(rest.len());
            &rest[..end]
        }
        None => "",
    }
}

/// Rename and select the HMDB columns, returns the number of rows written
pub fn convert<R: Read, W: Write>(source: R, dest: W) -> Result<usize, Error> {
    let mut rdr = csv::ReaderBuilder::new().flexible(true).from_reader(source);
    let headers = rdr.headers()?.clone();
    let mut indices = Vec::with_capacity(COLUMN_MAP.len());
    for (from, _) in COLUMN_MAP.iter() {
        match headers.iter().position(|h| h == *from) {
            Some(idx) => indices.push((idx, REFERENCE_COLUMNS.contains(from))),
            None => return Err(Error::MissingColumnError(from.to_string())),
        }
    }

    let mut wtr = csv::Writer::from_writer(dest);
    wtr.write_record(COLUMN_MAP.iter().map(|(_, to)| *to))?;
    let mut rows = 0;
    for record in rdr.records() {
        let record = record?;
        wtr.write_record(indices.iter().map(|(idx, digits)| {
            let value = record.get(*idx).unwrap_or("");
            if *digits {
                extract_digits(value)
            } else {
                value
            }
        }))?;
        rows += 1;
    }
    wtr.flush()?;
    Ok(rows)
}

/// Convert the HMDB export at `input` and write the result to `output`
pub fn convert_hmdb_csv(input: &Path, output: &Path) -> Result<usize, Error> {
    let fp = File::open(input)?;
    let mut rows = 0;
    write_atomic(output, |w| {
        rows = convert(fp, w)?;
        Ok(())
    })?;
    info!("Converted HMDB {:?} -> {:?} ({} rows)", input, output, rows);
    Ok(rows)
}
