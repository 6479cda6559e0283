//! Export unmapped markers grouped by county
use crate::export::{table, write_atomic};
use crate::markers::{is_truthy, Marker, MarkerTable, StatusFilter};
use crate::Error;
use log::{debug, info, warn};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Marker counts keyed by county name
pub type CountySummary = BTreeMap<String, usize>;

/// Unmapped markers that can actually be visited, i.e. not flagged missing or private
pub fn unmapped_for_counties(table: &MarkerTable) -> Vec<&Marker> {
    let columns = table.columns();
    let flagged = |m: &Marker, column: &str| m.extra(column).map(is_truthy).unwrap_or(false);
    let markers: Vec<&Marker> = table
        .select(StatusFilter::UnmappedOnly)
        .into_iter()
        .filter(|m| !flagged(*m, &columns.is_missing) && !flagged(*m, &columns.is_private))
        .collect();
    debug!("{} unmapped markers are eligible for export", markers.len());
    markers
}

/// Markers grouped by county, those without a county are counted and left out
#[derive(Debug, Default)]
pub struct CountyGroups<'a> {
    pub groups: BTreeMap<String, Vec<&'a Marker>>,
    pub skipped: usize,
}

pub fn group_by_county<'a>(markers: &[&'a Marker]) -> CountyGroups<'a> {
    let mut grouped = CountyGroups::default();
    for marker in markers {
        match marker.county().map(str::trim).filter(|c| !c.is_empty()) {
            Some(county) => grouped
                .groups
                .entry(county.to_string())
                .or_insert_with(Vec::new)
                .push(*marker),
            None => grouped.skipped += 1,
        }
    }
    if grouped.skipped > 0 {
        warn!("Skipped {} markers without a county", grouped.skipped);
    }
    grouped
}

/// File name for a county's CSV, spaces and slashes are replaced
pub fn safe_file_name(county: &str) -> String {
    format!("{}.csv", county.replace(' ', "_").replace('/', "-"))
}

fn write_csv(
    path: &Path,
    table: &MarkerTable,
    markers: &[&Marker],
    simple: bool,
) -> Result<(), Error> {
    write_atomic(path, |w| {
        if simple {
            table::write_simple_csv(w, table.columns(), markers.iter().copied())
        } else {
            table::write_full_csv(w, table, markers.iter().copied())
        }
    })
}

/// Write one CSV per county into `out_dir`, creating it if needed
pub fn export_counties(
    table: &MarkerTable,
    groups: &CountyGroups,
    out_dir: &Path,
    simple: bool,
) -> Result<CountySummary, Error> {
    fs::create_dir_all(out_dir)?;
    let mut summary = CountySummary::new();
    for (county, markers) in groups.groups.iter() {
        let path = out_dir.join(safe_file_name(county));
        write_csv(&path, table, markers, simple)?;
        info!("Saved {:?} ({} rows)", path, markers.len());
        summary.insert(county.clone(), markers.len());
    }
    Ok(summary)
}

/// Write the CSV of a single county, matched case-insensitively
///
/// Returns `None` when the county has no markers, nothing is written then.
pub fn export_single_county(
    table: &MarkerTable,
    markers: &[&Marker],
    county: &str,
    out_dir: &Path,
    simple: bool,
) -> Result<Option<(PathBuf, CountySummary)>, Error> {
    let wanted = county.trim().to_lowercase();
    let subset: Vec<&Marker> = markers
        .iter()
        .copied()
        .filter(|m| m.county().map_or(false, |c| c.trim().to_lowercase() == wanted))
        .collect();
    if subset.is_empty() {
        warn!("No markers found in {}", county);
        return Ok(None);
    }
    fs::create_dir_all(out_dir)?;
    let path = out_dir.join(safe_file_name(county));
    write_csv(&path, table, &subset, simple)?;
    info!("Exported {:?} ({} rows)", path, subset.len());
    let mut summary = CountySummary::new();
    summary.insert(county.to_string(), subset.len());
    Ok(Some((path, summary)))
}

/// Write every marker into a single CSV
pub fn merge_all(
    table: &MarkerTable,
    markers: &[&Marker],
    path: &Path,
    simple: bool,
) -> Result<(), Error> {
    write_csv(path, table, markers, simple)?;
    info!("Merged master {:?} ({} rows)", path, markers.len());
    Ok(())
}

pub fn write_summary_json(summary: &CountySummary, path: &Path) -> Result<(), Error> {
    write_atomic(path, |w| Ok(serde_json::to_writer_pretty(w, summary)?))?;
    info!("Summary written {:?}", path);
    Ok(())
}

/// Counties ordered by descending marker count, ties by name
pub fn sorted_counts(summary: &CountySummary) -> Vec<(&str, usize)> {
    let mut counts: Vec<(&str, usize)> = summary.iter().map(|(k, v)| (k.as_str(), *v)).collect();
    counts.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    counts
}

/// Plain text table of the county counts
pub fn stats_table(summary: &CountySummary) -> String {
    let mut out = String::from("===== County Marker Counts =====\n");
    for (county, count) in sorted_counts(summary) {
        out.push_str(&format!("{:<25} {}\n", county, count));
    }
    out.push_str("================================\n");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markers::Columns;

    const DATA: &str = "\
ref:US-TX:thc,ref:hmdb,name,addr:county,thc:Latitude,thc:Longitude,isMissing,isPrivate
1,,A,Denton,33.1,-97.1,,
2,nan,B,Denton,33.2,-97.1,False,False
3,500,Mapped,Denton,33.3,-97.1,,
4,,Gone,Denton,33.4,-97.1,True,
5,,Private,Cooke,33.5,-97.1,,TRUE
6,none,C,Jeff Davis,30.6,-104.0,,
7,,D,Denton/Cooke,33.7,-97.1,,
8,,No County,,33.8,-97.1,,
";

    fn load() -> MarkerTable {
        MarkerTable::from_reader(DATA.as_bytes(), &Columns::default()).unwrap()
    }

    #[test]
    fn eligible_markers_exclude_missing_and_private() {
        let table = load();
        let refs: Vec<_> = unmapped_for_counties(&table)
            .iter()
            .filter_map(|m| m.reference())
            .collect();
        assert_eq!(refs, vec![1, 2, 6, 7, 8]);
    }

    #[test]
    fn one_file_per_county() {
        let table = load();
        let markers = unmapped_for_counties(&table);
        let groups = group_by_county(&markers);
        assert_eq!(groups.skipped, 1);

        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("UnmappedMarkersPerCounty");
        let summary = export_counties(&table, &groups, &out, true).unwrap();
        assert_eq!(summary["Denton"], 2);
        assert_eq!(summary["Jeff Davis"], 1);
        assert_eq!(summary["Denton/Cooke"], 1);
        assert!(out.join("Jeff_Davis.csv").exists());
        assert!(out.join("Denton-Cooke.csv").exists());

        let denton = fs::read_to_string(out.join("Denton.csv")).unwrap();
        assert_eq!(denton.lines().count(), 3);
        assert!(denton.starts_with("ref:US-TX:thc,ref:hmdb,OsmNodeID,name,"));
    }

    #[test]
    fn single_county_is_case_insensitive() {
        let table = load();
        let markers = unmapped_for_counties(&table);
        let dir = tempfile::tempdir().unwrap();
        let (path, summary) = export_single_county(&table, &markers, "denton", dir.path(), false)
            .unwrap()
            .unwrap();
        assert_eq!(path, dir.path().join("denton.csv"));
        assert_eq!(summary["denton"], 2);
        assert!(export_single_county(&table, &markers, "Harris", dir.path(), false)
            .unwrap()
            .is_none());
        assert!(!dir.path().join("Harris.csv").exists());
    }

    #[test]
    fn markers_without_a_position_are_exported() {
        let data = "\
ref:US-TX:thc,ref:hmdb,name,addr:county,thc:Latitude,thc:Longitude
1,,Known,Denton,33.10,-97.1
2,,Unplaced,Denton,,
3,,Typo,Cooke,n/a,-97.3
";
        let table = MarkerTable::from_reader(data.as_bytes(), &Columns::default()).unwrap();
        let markers = unmapped_for_counties(&table);
        assert_eq!(markers.len(), 3);

        let dir = tempfile::tempdir().unwrap();
        let summary = export_counties(&table, &group_by_county(&markers), dir.path(), false)
            .unwrap();
        assert_eq!(summary["Denton"], 2);
        assert_eq!(summary["Cooke"], 1);
        let denton = fs::read_to_string(dir.path().join("Denton.csv")).unwrap();
        let lines: Vec<&str> = denton.lines().collect();
        assert_eq!(lines[1], "1,,Known,Denton,33.10,-97.1,");
        assert_eq!(lines[2], "2,,Unplaced,Denton,,,");
        let cooke = fs::read_to_string(dir.path().join("Cooke.csv")).unwrap();
        assert!(cooke.contains("3,,Typo,Cooke,n/a,-97.3,"));
    }

    #[test]
    fn summary_and_stats() {
        let mut summary = CountySummary::new();
        summary.insert("Cooke".to_string(), 2);
        summary.insert("Denton".to_string(), 5);
        summary.insert("Archer".to_string(), 2);
        assert_eq!(
            sorted_counts(&summary),
            vec![("Denton", 5), ("Archer", 2), ("Cooke", 2)]
        );
        let stats = stats_table(&summary);
        assert!(stats.lines().nth(1).unwrap().starts_with("Denton "));

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("summary.json");
        write_summary_json(&summary, &path).unwrap();
        let parsed: CountySummary =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(parsed, summary);
    }
}
