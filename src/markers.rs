//! Marker records loaded from the THC marker table and the mapped/unmapped status filter
//!
//! A marker is "mapped" when its HMDB cross reference is present. The one rule deciding
//! that lives in [`is_unmapped_value`] and every other module goes through
//! [`Marker::is_mapped`] or [`StatusFilter`] so filtering, exports and the map colors
//! can never disagree.
use crate::gps::Location;
use crate::Error;
use log::{debug, trace};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Names of the marker table columns the application understands
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Columns {
    pub reference: String,
    pub cross_reference: String,
    pub node_id: String,
    pub name: String,
    pub county: String,
    pub city: String,
    pub website: String,
    pub memorial_website: String,
    pub latitude: String,
    pub longitude: String,
    pub start_date: String,
    pub is_missing: String,
    pub is_private: String,
    pub is_osm: String,
}

impl Default for Columns {
    fn default() -> Self {
        Columns {
            reference: "ref:US-TX:thc".to_string(),
            cross_reference: "ref:hmdb".to_string(),
            node_id: "OsmNodeID".to_string(),
            name: "name".to_string(),
            county: "addr:county".to_string(),
            city: "addr:city".to_string(),
            website: "website".to_string(),
            memorial_website: "memorial:website".to_string(),
            latitude: "thc:Latitude".to_string(),
            longitude: "thc:Longitude".to_string(),
            start_date: "start_date".to_string(),
            is_missing: "isMissing".to_string(),
            is_private: "isPrivate".to_string(),
            is_osm: "isOSM".to_string(),
        }
    }
}

impl Columns {
    /// Map a table header onto the typed marker field that stores it
    pub fn resolve(&self, header: &str) -> MarkerField {
        if header == self.reference {
            MarkerField::Reference
        } else if header == self.cross_reference {
            MarkerField::CrossReference
        } else if header == self.node_id {
            MarkerField::NodeId
        } else if header == self.name {
            MarkerField::Name
        } else if header == self.county {
            MarkerField::County
        } else if header == self.latitude {
            MarkerField::Latitude
        } else if header == self.longitude {
            MarkerField::Longitude
        } else {
            MarkerField::Other(header.to_string())
        }
    }

    /// Reduced column set used by the "simple" CSV exports
    pub fn simple_fields(&self) -> Vec<&str> {
        vec![
            self.reference.as_str(),
            self.cross_reference.as_str(),
            self.node_id.as_str(),
            self.name.as_str(),
            self.website.as_str(),
            self.memorial_website.as_str(),
            self.city.as_str(),
            self.county.as_str(),
            self.latitude.as_str(),
            self.longitude.as_str(),
        ]
    }

    fn required(&self) -> [&str; 4] {
        [
            self.cross_reference.as_str(),
            self.county.as_str(),
            self.latitude.as_str(),
            self.longitude.as_str(),
        ]
    }
}

/// A marker table column resolved to where its value is stored
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MarkerField {
    Reference,
    CrossReference,
    NodeId,
    Name,
    County,
    Latitude,
    Longitude,
    Other(String),
}

impl MarkerField {
    /// Identity columns that are always written as nullable integers
    pub fn is_identity(&self) -> bool {
        matches!(
            self,
            MarkerField::Reference | MarkerField::CrossReference | MarkerField::NodeId
        )
    }
}

/// Return true if a cross reference value means "no HMDB entry"
///
/// Values are trimmed and lowercased, then "", "nan" and "none" count as empty as does
/// an absent value.
pub fn is_unmapped_value(value: Option<&str>) -> bool {
    match value {
        None => true,
        Some(v) => {
            let v = v.trim().to_lowercase();
            v.is_empty() || v == "nan" || v == "none"
        }
    }
}

/// Parse an identity value as an integer, anything that isn't a whole number is `None`
///
/// Spreadsheet round trips commonly turn `123` into `123.0`, both parse to `Some(123)`.
pub fn parse_nullable_int(value: &str) -> Option<i64> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    if let Ok(v) = value.parse::<i64>() {
        return Some(v);
    }
    match value.parse::<f64>() {
        Ok(v) if v.is_finite() && v.fract() == 0.0 && v.abs() < i64::MAX as f64 => {
            Some(v as i64)
        }
        _ => None,
    }
}

/// Format a nullable integer, `None` is written as an empty value
pub fn format_nullable_int(value: Option<i64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

/// Interpret a boolean flag column the way spreadsheets write them
pub fn is_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "true" | "t" | "yes" | "y" | "1"
    )
}

/// A single historical marker
#[derive(Clone, Debug, PartialEq)]
pub struct Marker {
    reference: Option<i64>,
    cross_reference: Option<String>,
    node_id: Option<i64>,
    name: Option<String>,
    county: Option<String>,
    /// parsed position, `None` when either coordinate is blank or not a number
    location: Option<Location>,
    /// coordinate cells as they appeared in the table
    latitude_text: Option<String>,
    longitude_text: Option<String>,
    /// all other columns keyed by their header, passed through to exports untouched
    extra: HashMap<String, String>,
}

impl Marker {
    /// Create a marker with only a position, mostly useful for tests and synthetic data
    pub fn new(location: Location) -> Self {
        Marker {
            location: Some(location),
            ..Marker::unlocated()
        }
    }

    /// Create a marker without a usable position
    pub fn unlocated() -> Self {
        Marker {
            reference: None,
            cross_reference: None,
            node_id: None,
            name: None,
            county: None,
            location: None,
            latitude_text: None,
            longitude_text: None,
            extra: HashMap::new(),
        }
    }

    pub fn with_reference(mut self, reference: i64) -> Self {
        self.reference = Some(reference);
        self
    }

    pub fn with_cross_reference(mut self, value: &str) -> Self {
        self.cross_reference = Some(value.to_string());
        self
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }

    pub fn with_county(mut self, county: &str) -> Self {
        self.county = Some(county.to_string());
        self
    }

    /// THC marker number
    pub fn reference(&self) -> Option<i64> {
        self.reference
    }

    /// HMDB cross reference exactly as it appeared in the table
    pub fn cross_reference(&self) -> Option<&str> {
        self.cross_reference.as_deref()
    }

    pub fn node_id(&self) -> Option<i64> {
        self.node_id
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn county(&self) -> Option<&str> {
        self.county.as_deref()
    }

    /// Position of the marker, rows with blank or non-numeric coordinates have none
    pub fn location(&self) -> Option<Location> {
        self.location
    }

    pub fn is_located(&self) -> bool {
        self.location.is_some()
    }

    pub fn is_mapped(&self) -> bool {
        !is_unmapped_value(self.cross_reference())
    }

    /// Value of a pass-through column, empty cells are returned as `None`
    pub fn extra(&self, column: &str) -> Option<&str> {
        self.extra
            .get(column)
            .map(|v| v.as_str())
            .filter(|v| !v.trim().is_empty())
    }

    pub fn set_extra(&mut self, column: &str, value: &str) {
        self.extra.insert(column.to_string(), value.to_string());
    }

    /// Render a field for tabular output, identity fields become nullable integers
    pub fn value(&self, field: &MarkerField) -> String {
        match field {
            MarkerField::Reference => format_nullable_int(self.reference),
            MarkerField::CrossReference => {
                format_nullable_int(self.cross_reference().and_then(parse_nullable_int))
            }
            MarkerField::NodeId => format_nullable_int(self.node_id),
            MarkerField::Name => self.name.clone().unwrap_or_default(),
            MarkerField::County => self.county.clone().unwrap_or_default(),
            MarkerField::Latitude => coordinate_text(
                self.latitude_text.as_deref(),
                self.location.map(|l| l.latitude()),
            ),
            MarkerField::Longitude => coordinate_text(
                self.longitude_text.as_deref(),
                self.location.map(|l| l.longitude()),
            ),
            MarkerField::Other(column) => self.extra.get(column).cloned().unwrap_or_default(),
        }
    }
}

/// Which markers to keep based on their mapped status
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StatusFilter {
    All,
    MappedOnly,
    UnmappedOnly,
}

impl StatusFilter {
    /// Build a filter from the two mutually exclusive command line switches
    pub fn from_flags(unmapped_only: bool, mapped_only: bool) -> Result<Self, Error> {
        match (unmapped_only, mapped_only) {
            (true, true) => Err(Error::ConflictingFilterError),
            (true, false) => Ok(StatusFilter::UnmappedOnly),
            (false, true) => Ok(StatusFilter::MappedOnly),
            (false, false) => Ok(StatusFilter::All),
        }
    }

    /// Short name used in output file names
    pub fn tag(&self) -> &'static str {
        match self {
            StatusFilter::All => "all",
            StatusFilter::MappedOnly => "mapped",
            StatusFilter::UnmappedOnly => "unmapped",
        }
    }

    pub fn matches(&self, marker: &Marker) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::MappedOnly => marker.is_mapped(),
            StatusFilter::UnmappedOnly => !marker.is_mapped(),
        }
    }
}

impl fmt::Display for StatusFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.tag())
    }
}

/// Source text of a coordinate cell, or the parsed value for markers built in code
fn coordinate_text(text: Option<&str>, parsed: Option<f64>) -> String {
    match (text, parsed) {
        (Some(text), _) => text.to_string(),
        (None, Some(v)) => v.to_string(),
        (None, None) => String::new(),
    }
}

/// Ordered collection of every row of a marker table along with its layout
///
/// Rows without usable coordinates are kept so the table can be written back out
/// unchanged; only [`MarkerTable::located`] leaves them out.
#[derive(Clone, Debug)]
pub struct MarkerTable {
    headers: Vec<String>,
    columns: Columns,
    markers: Vec<Marker>,
    unlocated: usize,
}

impl MarkerTable {
    /// Read a marker table from a CSV file
    pub fn load(path: &Path, columns: &Columns) -> Result<Self, Error> {
        let fp = File::open(path)?;
        let table = Self::from_reader(fp, columns)?;
        debug!(
            "Loaded {} markers from {:?} ({} rows without usable coordinates)",
            table.len(),
            path,
            table.unlocated_rows()
        );
        Ok(table)
    }

    /// Read a marker table from CSV data, rows without numeric coordinates are counted
    pub fn from_reader<R: Read>(source: R, columns: &Columns) -> Result<Self, Error> {
        let mut rdr = csv::ReaderBuilder::new().flexible(true).from_reader(source);
        let headers: Vec<String> = rdr.headers()?.iter().map(|h| h.to_string()).collect();
        for required in columns.required().iter() {
            if !headers.iter().any(|h| h == required) {
                return Err(Error::MissingColumnError(required.to_string()));
            }
        }
        let fields: Vec<MarkerField> = headers.iter().map(|h| columns.resolve(h)).collect();

        let mut markers = Vec::new();
        let mut unlocated = 0;
        for (row, record) in rdr.records().enumerate() {
            let marker = Self::build_marker(&headers, &fields, &record?);
            if !marker.is_located() {
                trace!("Row {} has no usable coordinates", row + 2);
                unlocated += 1;
            }
            markers.push(marker);
        }
        if unlocated > 0 {
            debug!(
                "{} marker rows have missing or non-numeric coordinates",
                unlocated
            );
        }

        Ok(MarkerTable {
            headers,
            columns: columns.clone(),
            markers,
            unlocated,
        })
    }

    fn build_marker(
        headers: &[String],
        fields: &[MarkerField],
        record: &csv::StringRecord,
    ) -> Marker {
        let mut marker = Marker::unlocated();
        for (idx, field) in fields.iter().enumerate() {
            let value = match record.get(idx) {
                Some(v) => v,
                None => continue,
            };
            match field {
                MarkerField::Reference => marker.reference = parse_nullable_int(value),
                MarkerField::CrossReference => marker.cross_reference = Some(value.to_string()),
                MarkerField::NodeId => marker.node_id = parse_nullable_int(value),
                MarkerField::Name => marker.name = non_empty(value),
                MarkerField::County => marker.county = non_empty(value),
                MarkerField::Latitude => marker.latitude_text = Some(value.to_string()),
                MarkerField::Longitude => marker.longitude_text = Some(value.to_string()),
                MarkerField::Other(_) => {
                    marker.extra.insert(headers[idx].clone(), value.to_string());
                }
            }
        }
        let latitude = marker.latitude_text.as_deref().and_then(parse_coordinate);
        let longitude = marker.longitude_text.as_deref().and_then(parse_coordinate);
        marker.location = match (longitude, latitude) {
            (Some(lon), Some(lat)) => Some(Location::new(lon, lat)),
            _ => None,
        };
        marker
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn columns(&self) -> &Columns {
        &self.columns
    }

    pub fn markers(&self) -> &[Marker] {
        &self.markers
    }

    pub fn markers_mut(&mut self) -> &mut [Marker] {
        &mut self.markers
    }

    /// Number of rows with missing or non-numeric coordinates
    pub fn unlocated_rows(&self) -> usize {
        self.unlocated
    }

    /// Markers with a usable position, the only ones that can be placed on a map
    pub fn located(&self) -> impl Iterator<Item = &Marker> {
        self.markers.iter().filter(|m| m.is_located())
    }

    pub fn len(&self) -> usize {
        self.markers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }

    /// Table headers resolved to marker fields, in file order
    pub fn fields(&self) -> Vec<MarkerField> {
        self.headers.iter().map(|h| self.columns.resolve(h)).collect()
    }

    /// Append a pass-through column to the table layout if it isn't there yet
    pub fn ensure_column(&mut self, column: &str) {
        if !self.headers.iter().any(|h| h == column) {
            self.headers.push(column.to_string());
        }
    }

    /// Return the markers matching the status filter, in table order
    pub fn select(&self, filter: StatusFilter) -> Vec<&Marker> {
        let selected: Vec<&Marker> = self.markers.iter().filter(|m| filter.matches(m)).collect();
        debug!(
            "Status filter '{}' kept {} of {} markers",
            filter,
            selected.len(),
            self.markers.len()
        );
        selected
    }
}

fn non_empty(value: &str) -> Option<String> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

fn parse_coordinate(value: &str) -> Option<f64> {
    value.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}
