//! Define the view-csv subcommand
use crate::Error;
use log::{debug, warn};
use std::fs::File;
use std::io::Read;
use std::path::PathBuf;
use structopt::StructOpt;

/// Print a CSV file as an aligned plain text table
#[derive(Debug, StructOpt)]
pub struct ViewCsvOpts {
    /// CSV file to display
    #[structopt(name = "FILE", parse(from_os_str))]
    file: PathBuf,
    /// Only show the first N rows
    #[structopt(long)]
    head: Option<usize>,
    /// Only show the last N rows
    #[structopt(long)]
    tail: Option<usize>,
    /// Only show rows whose name contains TEXT (case-insensitive)
    #[structopt(long)]
    search: Option<String>,
    /// Maximum number of rows printed when neither --head nor --tail is used
    #[structopt(long, default_value = "200")]
    max_rows: usize,
}

struct CsvData {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

fn read_csv<R: Read>(source: R) -> Result<CsvData, Error> {
    let mut rdr = csv::ReaderBuilder::new().flexible(true).from_reader(source);
    let headers = rdr.headers()?.iter().map(|h| h.to_string()).collect();
    let mut rows = Vec::new();
    for record in rdr.records() {
        rows.push(record?.iter().map(|v| v.to_string()).collect());
    }
    Ok(CsvData { headers, rows })
}

/// Rows whose `name` column contains `text`, ignoring case
fn search_rows<'a>(data: &'a CsvData, text: &str) -> Vec<&'a Vec<String>> {
    let idx = match data.headers.iter().position(|h| h == "name") {
        Some(idx) => idx,
        None => {
            warn!("CSV has no 'name' column to search");
            return Vec::new();
        }
    };
    let needle = text.to_lowercase();
    data.rows
        .iter()
        .filter(|row| {
            row.get(idx)
                .map(|v| v.to_lowercase().contains(&needle))
                .unwrap_or(false)
        })
        .collect()
}

/// Lay out rows in columns padded to the widest value, two spaces apart
fn format_table(headers: &[String], rows: &[&Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (idx, value) in row.iter().enumerate() {
            let len = value.chars().count();
            match widths.get_mut(idx) {
                Some(w) => *w = (*w).max(len),
                None => widths.push(len),
            }
        }
    }

    let mut out = String::new();
    let lines = std::iter::once(headers.iter().collect::<Vec<&String>>())
        .chain(rows.iter().map(|r| r.iter().collect()));
    for line in lines {
        let text: Vec<String> = line
            .iter()
            .zip(widths.iter())
            .map(|(v, w)| format!("{:<width$}", v, width = *w))
            .collect();
        out.push_str(text.join("  ").trim_end());
        out.push('\n');
    }
    out
}

pub fn view_csv_command(opts: ViewCsvOpts) -> Result<(), Box<dyn std::error::Error>> {
    let data = read_csv(File::open(&opts.file)?)?;
    debug!("Read {} rows from {:?}", data.rows.len(), opts.file);

    let mut rows: Vec<&Vec<String>> = match opts.search.as_deref() {
        Some(text) => search_rows(&data, text),
        None => data.rows.iter().collect(),
    };
    let total = rows.len();
    if let Some(n) = opts.head {
        rows.truncate(n);
    } else if let Some(n) = opts.tail {
        rows = rows.split_off(total.saturating_sub(n));
    } else if rows.len() > opts.max_rows {
        rows.truncate(opts.max_rows);
    }

    print!("{}", format_table(&data.headers, &rows));
    if rows.len() < total {
        println!("... showing {} of {} rows", rows.len(), total);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const DATA: &str = "\
ref,name,county
1,Old Mill,Denton
22,Court House,Denton
333,Mill Creek Bridge,Cooke
";

    #[test]
    fn columns_are_aligned() {
        let data = read_csv(DATA.as_bytes()).unwrap();
        let rows: Vec<&Vec<String>> = data.rows.iter().take(2).collect();
        assert_eq!(
            format_table(&data.headers, &rows),
            "ref  name         county\n\
             1    Old Mill     Denton\n\
             22   Court House  Denton\n"
        );
    }

    #[test]
    fn search_ignores_case() {
        let data = read_csv(DATA.as_bytes()).unwrap();
        let found = search_rows(&data, "MILL");
        assert_eq!(found.len(), 2);
        assert_eq!(found[1][0], "333");

        let no_name = read_csv("a,b\n1,2\n".as_bytes()).unwrap();
        assert!(search_rows(&no_name, "1").is_empty());
    }
}
