//! GPX writer
//!
//! Produces byte-exact reproducible GPX 1.1 text. Waypoints and track points
//! without both coordinates are left out of the output entirely.

use crate::model::{Document, TrackPoint, Waypoint};
use crate::{DEFAULT_CREATOR, DEFAULT_VERSION};
use quick_xml::escape::escape;

const GPX_NAMESPACE: &str = "http://www.topografix.com/GPX/1/1";

/// Serialize a [`Document`] to GPX text
pub fn write_gpx(doc: &Document) -> String {
    #[cfg(feature = "profiling")]
    profiling::scope!("writer::write_gpx");

    let meta = doc.metadata();
    let mut lines: Vec<String> = Vec::with_capacity(doc.entity_count() * 3 + 8);

    lines.push(r#"<?xml version="1.0" encoding="UTF-8"?>"#.to_string());
    lines.push(format!(
        r#"<gpx version="{}" creator="{}" xmlns="{}">"#,
        escape(non_empty(meta.version()).unwrap_or(DEFAULT_VERSION)),
        escape(non_empty(meta.creator()).unwrap_or(DEFAULT_CREATOR)),
        GPX_NAMESPACE
    ));

    let name = meta.name().and_then(non_empty);
    let description = meta.description().and_then(non_empty);
    if name.is_some() || description.is_some() {
        lines.push("  <metadata>".to_string());
        push_text_element(&mut lines, 4, "name", name);
        push_text_element(&mut lines, 4, "desc", description);
        lines.push("  </metadata>".to_string());
    }

    let mut skipped = 0usize;

    for waypoint in doc.waypoints() {
        if !write_waypoint(&mut lines, waypoint) {
            skipped += 1;
        }
    }

    for track in doc.tracks() {
        lines.push("  <trk>".to_string());
        push_text_element(&mut lines, 4, "name", track.name().and_then(non_empty));
        for segment in track.segments() {
            lines.push("    <trkseg>".to_string());
            for point in segment.points() {
                if !write_track_point(&mut lines, point) {
                    skipped += 1;
                }
            }
            lines.push("    </trkseg>".to_string());
        }
        lines.push("  </trk>".to_string());
    }

    lines.push("</gpx>".to_string());

    if skipped > 0 {
        tracing::debug!("Skipped {} points without coordinates", skipped);
    }

    lines.join("\n")
}

fn write_waypoint(lines: &mut Vec<String>, waypoint: &Waypoint) -> bool {
    let (Some(lat), Some(lon)) = (waypoint.lat(), waypoint.lon()) else {
        return false;
    };

    lines.push(format!(r#"  <wpt lat="{lat}" lon="{lon}">"#));
    if let Some(ele) = waypoint.elevation() {
        lines.push(format!("    <ele>{ele}</ele>"));
    }
    push_text_element(lines, 4, "time", waypoint.time().and_then(non_empty));
    push_text_element(lines, 4, "name", waypoint.name().and_then(non_empty));
    push_text_element(lines, 4, "desc", waypoint.description().and_then(non_empty));
    lines.push("  </wpt>".to_string());
    true
}

fn write_track_point(lines: &mut Vec<String>, point: &TrackPoint) -> bool {
    let (Some(lat), Some(lon)) = (point.lat(), point.lon()) else {
        return false;
    };

    lines.push(format!(r#"      <trkpt lat="{lat}" lon="{lon}">"#));
    if let Some(ele) = point.elevation() {
        lines.push(format!("        <ele>{ele}</ele>"));
    }
    push_text_element(lines, 8, "time", point.time().and_then(non_empty));
    lines.push("      </trkpt>".to_string());
    true
}

fn push_text_element(lines: &mut Vec<String>, indent: usize, tag: &str, text: Option<&str>) {
    if let Some(text) = text {
        lines.push(format!(
            "{:indent$}<{tag}>{}</{tag}>",
            "",
            escape(text),
            indent = indent
        ));
    }
}

#[inline]
fn non_empty(text: &str) -> Option<&str> {
    (!text.is_empty()).then_some(text)
}
