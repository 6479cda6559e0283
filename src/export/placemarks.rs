//! Minimal KML placemarks, one per marker with no styling
use crate::markers::Marker;
use crate::Error;
use quick_xml::escape::escape;
use std::io::Write;

/// Write a KML document holding a point placemark for every marker with a position
pub fn write_placemarks<W: Write + ?Sized>(
    writer: &mut W,
    markers: &[&Marker],
) -> Result<(), Error> {
    writeln!(writer, r#"<?xml version="1.0" encoding="UTF-8"?>"#)?;
    writeln!(
        writer,
        r#"<kml xmlns="http://www.opengis.net/kml/2.2"><Document>"#
    )?;
    for marker in markers {
        let location = match marker.location() {
            Some(l) => l,
            None => continue,
        };
        write!(
            writer,
            "<Placemark><name>{}</name>",
            escape(marker.name().unwrap_or(""))
        )?;
        if marker.is_mapped() {
            let hmdb = marker.cross_reference().map(str::trim).unwrap_or("");
            write!(writer, "<description>HMDB: {}</description>", escape(hmdb))?;
        }
        writeln!(
            writer,
            "<Point><coordinates>{},{},0</coordinates></Point></Placemark>",
            location.longitude(),
            location.latitude()
        )?;
    }
    writeln!(writer, "</Document></kml>")?;
    Ok(())
}
