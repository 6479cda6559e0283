//! Load a travel route from a KML track file
//!
//! Every `<coordinates>` element in the document becomes one polyline of the route,
//! regardless of whether it sits inside a `LineString`, a `gx:Track` export or a
//! `MultiGeometry`. Blocks with fewer than two usable vertices are skipped.
use crate::gps::Route;
use crate::Error;
use geo::{Coord, LineString};
use log::{debug, trace, warn};
use quick_xml::events::Event;
use quick_xml::Reader;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Parse the track file located at `path` into a route
pub fn load_route(path: &Path) -> Result<Route, Error> {
    let fp = File::open(path)
        .map_err(|e| Error::RouteParseError(format!("cannot open {:?}: {}", path, e)))?;
    let route = parse_route(BufReader::new(fp))?;
    debug!(
        "Loaded route from {:?} with {} segment(s) and {} vertices",
        path,
        route.num_segments(),
        route.num_vertices()
    );
    Ok(route)
}

/// Parse a KML document into a route
pub fn parse_route<R: BufRead>(source: R) -> Result<Route, Error> {
    let mut reader = Reader::from_reader(source);
    reader.trim_text(true);

    let mut buf = Vec::new();
    let mut segments = Vec::new();
    let mut depth = 0usize;
    let mut elements = 0usize;
    let mut in_coordinates = false;
    let mut text = String::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Err(e) => {
                return Err(Error::RouteParseError(format!(
                    "malformed markup at position {}: {}",
                    reader.buffer_position(),
                    e
                )))
            }
            Ok(Event::Eof) => break,
            Ok(Event::Start(e)) => {
                depth += 1;
                elements += 1;
                if e.local_name().as_ref() == b"coordinates" {
                    in_coordinates = true;
                    text.clear();
                }
            }
            Ok(Event::Empty(_)) => elements += 1,
            Ok(Event::End(e)) => {
                depth = depth.saturating_sub(1);
                if e.local_name().as_ref() == b"coordinates" {
                    in_coordinates = false;
                    let coords = parse_coordinate_block(&text);
                    if coords.len() >= 2 {
                        segments.push(LineString::new(coords));
                    } else {
                        debug!(
                            "Skipping coordinate block with {} usable vertices",
                            coords.len()
                        );
                    }
                }
            }
            Ok(Event::Text(e)) if in_coordinates => {
                let unescaped = e
                    .unescape()
                    .map_err(|e| Error::RouteParseError(format!("bad coordinate text: {}", e)))?;
                text.push_str(&unescaped);
                text.push(' ');
            }
            Ok(Event::CData(e)) if in_coordinates => {
                text.push_str(&String::from_utf8_lossy(&e.into_inner()));
                text.push(' ');
            }
            _ => {}
        }
        buf.clear();
    }

    if elements == 0 {
        return Err(Error::RouteParseError(
            "document does not contain any markup elements".to_string(),
        ));
    }
    if depth != 0 {
        return Err(Error::RouteParseError(
            "document ended before all elements were closed".to_string(),
        ));
    }
    if segments.is_empty() {
        return Err(Error::RouteParseError(
            "no route coordinates found in track".to_string(),
        ));
    }

    Ok(Route::from_segments(segments))
}

/// Parse the whitespace separated `lon,lat[,alt]` tuples of a single coordinates element
fn parse_coordinate_block(text: &str) -> Vec<Coord<f64>> {
    let mut coords = Vec::new();
    for tuple in text.split_whitespace() {
        let mut parts = tuple.split(',');
        let lon = parts.next().and_then(|v| v.trim().parse::<f64>().ok());
        let lat = parts.next().and_then(|v| v.trim().parse::<f64>().ok());
        match (lon, lat) {
            (Some(x), Some(y)) if x.is_finite() && y.is_finite() => coords.push(Coord { x, y }),
            _ => {
                if tuple.contains(',') {
                    warn!("Ignoring unreadable coordinate tuple: {:?}", tuple);
                } else {
                    trace!("Ignoring coordinate tuple without latitude: {:?}", tuple);
                }
            }
        }
    }
    coords
}
