//! Tabular CSV output with nullable integer identity columns
use crate::markers::{Columns, Marker, MarkerField, MarkerTable};
use crate::Error;
use log::trace;
use std::io::Write;

/// Write markers under the given headers, resolving every header to a marker field
pub fn write_markers_csv<'a, W, I>(
    writer: W,
    headers: &[String],
    columns: &Columns,
    markers: I,
) -> Result<usize, Error>
where
    W: Write,
    I: IntoIterator<Item = &'a Marker>,
{
    let fields: Vec<MarkerField> = headers.iter().map(|h| columns.resolve(h)).collect();
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(headers)?;
    let mut rows = 0;
    for marker in markers {
        wtr.write_record(fields.iter().map(|f| marker.value(f)))?;
        rows += 1;
    }
    wtr.flush()?;
    trace!("Wrote {} CSV rows with {} columns", rows, headers.len());
    Ok(rows)
}

/// Headers of the full export: the table's own layout with any absent identity column
/// appended so those columns are always present
pub fn full_headers(table: &MarkerTable) -> Vec<String> {
    let columns = table.columns();
    let mut headers = table.headers().to_vec();
    for identity in [&columns.reference, &columns.cross_reference, &columns.node_id] {
        if !headers.contains(identity) {
            headers.push(identity.clone());
        }
    }
    headers
}

/// Write all columns of the table for the given markers
pub fn write_full_csv<'a, W, I>(writer: W, table: &MarkerTable, markers: I) -> Result<(), Error>
where
    W: Write,
    I: IntoIterator<Item = &'a Marker>,
{
    write_markers_csv(writer, &full_headers(table), table.columns(), markers)?;
    Ok(())
}

/// Write the reduced column set, columns absent from the source are left empty
pub fn write_simple_csv<'a, W, I>(writer: W, columns: &Columns, markers: I) -> Result<(), Error>
where
    W: Write,
    I: IntoIterator<Item = &'a Marker>,
{
    let headers: Vec<String> = columns
        .simple_fields()
        .into_iter()
        .map(|h| h.to_string())
        .collect();
    write_markers_csv(writer, &headers, columns, markers)?;
    Ok(())
}
