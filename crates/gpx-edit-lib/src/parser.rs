//! GPX reader
//!
//! The reader is lenient per field and strict on document shape: a `<gpx>` element
//! must exist, but unparsable numbers simply become absent and unknown markup is
//! skipped. The markup is first collected into a small element tree, then the
//! entities are picked out of it by local name.

use crate::field::{coerce_number, coerce_text};
use crate::id::EntityId;
use crate::model::{Document, Metadata, Segment, Track, TrackPoint, Waypoint};
use crate::{DEFAULT_CREATOR, DEFAULT_VERSION, ParseError};
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

/// Parse GPX text into a [`Document`]
///
/// # Errors
/// - [`ParseError::MissingRoot`] if there is no `<gpx>` element
/// - [`ParseError::Xml`] if the markup is not well-formed
pub fn parse_gpx(text: &str) -> Result<Document, ParseError> {
    #[cfg(feature = "profiling")]
    profiling::scope!("parser::parse_gpx");

    let roots = read_elements(text)?;
    let gpx = roots
        .iter()
        .find_map(|element| element.find("gpx"))
        .ok_or(ParseError::MissingRoot)?;

    let mut doc = Document::new();
    doc.metadata = read_metadata(gpx);
    doc.waypoints = gpx
        .children_named("wpt")
        .enumerate()
        .map(|(i, element)| read_waypoint(EntityId::waypoint(i), element))
        .collect();
    doc.tracks = gpx
        .children_named("trk")
        .enumerate()
        .map(|(t, element)| read_track(t, element))
        .collect();

    tracing::debug!(
        "Parsed GPX {}: {} waypoints, {} tracks, {} entities",
        doc.metadata.version,
        doc.waypoints.len(),
        doc.tracks.len(),
        doc.entity_count()
    );

    Ok(doc)
}

fn read_metadata(gpx: &Element) -> Metadata {
    let version = gpx.attribute("version").and_then(coerce_text);
    let creator = gpx.attribute("creator").and_then(coerce_text);
    let metadata = gpx.child("metadata");

    Metadata {
        version: version.unwrap_or_else(|| DEFAULT_VERSION.to_string()),
        creator: creator.unwrap_or_else(|| DEFAULT_CREATOR.to_string()),
        name: metadata.and_then(|m| m.child_text("name")),
        description: metadata.and_then(|m| m.child_text("desc")),
    }
}

fn read_waypoint(id: EntityId, element: &Element) -> Waypoint {
    Waypoint {
        id,
        lat: element.attribute("lat").and_then(coerce_number),
        lon: element.attribute("lon").and_then(coerce_number),
        elevation: element.child_number("ele"),
        time: element.child_text("time"),
        name: element.child_text("name"),
        description: element.child_text("desc"),
    }
}

fn read_track(t: usize, element: &Element) -> Track {
    let track_id = EntityId::track(t);
    let segments = element
        .children_named("trkseg")
        .enumerate()
        .map(|(s, segment)| {
            let segment_id = EntityId::segment(t, s);
            let points = segment
                .children_named("trkpt")
                .enumerate()
                .map(|(p, point)| TrackPoint {
                    id: EntityId::track_point(t, s, p),
                    track_id: track_id.clone(),
                    segment_id: segment_id.clone(),
                    index: p,
                    lat: point.attribute("lat").and_then(coerce_number),
                    lon: point.attribute("lon").and_then(coerce_number),
                    elevation: point.child_number("ele"),
                    time: point.child_text("time"),
                })
                .collect();
            Segment {
                id: segment_id,
                points,
            }
        })
        .collect();

    Track {
        id: track_id,
        name: Some(
            element
                .child_text("name")
                .unwrap_or_else(|| format!("Track {}", t + 1)),
        ),
        segments,
    }
}

/// Minimal owned element tree, names stored without namespace prefix
#[derive(Debug, Default)]
struct Element {
    name: String,
    attributes: Vec<(String, String)>,
    text: String,
    children: Vec<Element>,
}

impl Element {
    fn from_start(start: &BytesStart<'_>) -> Self {
        let name = String::from_utf8_lossy(start.local_name().as_ref()).into_owned();
        let attributes = start
            .attributes()
            .with_checks(false)
            .flatten()
            .map(|attr| {
                let key = String::from_utf8_lossy(attr.key.local_name().as_ref()).into_owned();
                let value = match attr.unescape_value() {
                    Ok(value) => value.into_owned(),
                    Err(_) => String::from_utf8_lossy(&attr.value).into_owned(),
                };
                (key, value)
            })
            .collect();

        Self {
            name,
            attributes,
            ..Default::default()
        }
    }

    fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Element> + 'a {
        self.children.iter().filter(move |c| c.name == name)
    }

    fn child(&self, name: &str) -> Option<&Element> {
        self.children.iter().find(|c| c.name == name)
    }

    fn child_text(&self, name: &str) -> Option<String> {
        self.child(name).and_then(|c| coerce_text(&c.text_content()))
    }

    fn child_number(&self, name: &str) -> Option<f64> {
        self.child(name).and_then(|c| coerce_number(&c.text_content()))
    }

    /// Text of this element and all of its descendants
    fn text_content(&self) -> String {
        let mut text = self.text.clone();
        for child in &self.children {
            text.push_str(&child.text_content());
        }
        text
    }

    /// First element named `name` in document order, including `self`
    fn find(&self, name: &str) -> Option<&Element> {
        if self.name == name {
            return Some(self);
        }
        self.children.iter().find_map(|c| c.find(name))
    }
}

/// Read all top-level elements of a document
fn read_elements(text: &str) -> Result<Vec<Element>, ParseError> {
    let mut reader = Reader::from_str(text);
    let mut buffer = Vec::new();
    let mut stack: Vec<Element> = Vec::new();
    let mut roots: Vec<Element> = Vec::new();

    loop {
        match reader.read_event_into(&mut buffer) {
            Ok(Event::Start(ref e)) => stack.push(Element::from_start(e)),
            Ok(Event::Empty(ref e)) => attach(&mut stack, &mut roots, Element::from_start(e)),
            Ok(Event::End(_)) => {
                if let Some(element) = stack.pop() {
                    attach(&mut stack, &mut roots, element);
                }
            }
            Ok(Event::Text(e)) => push_text(&mut stack, &String::from_utf8_lossy(&e)),
            Ok(Event::CData(e)) => push_text(&mut stack, &String::from_utf8_lossy(&e)),
            Ok(Event::GeneralRef(e)) => {
                push_text(&mut stack, &resolve_reference(&String::from_utf8_lossy(&e)))
            }
            Ok(Event::Eof) => break,
            Err(err) => {
                tracing::warn!(
                    "XML error at position {}: {}",
                    reader.buffer_position(),
                    err
                );
                return Err(err.into());
            }
            _ => {}
        }

        buffer.clear();
    }

    if let Some(open) = stack.last() {
        tracing::warn!("Document ends inside <{}>", open.name);
        return Err(ParseError::Truncated(open.name.clone()));
    }

    Ok(roots)
}

fn attach(stack: &mut [Element], roots: &mut Vec<Element>, element: Element) {
    match stack.last_mut() {
        Some(parent) => parent.children.push(element),
        None => roots.push(element),
    }
}

fn push_text(stack: &mut [Element], text: &str) {
    if let Some(current) = stack.last_mut() {
        current.text.push_str(text);
    }
}

/// Resolve `&name;` given its name: predefined entities and character references.
/// Anything else is kept verbatim.
fn resolve_reference(name: &str) -> String {
    if let Some(code) = name.strip_prefix('#') {
        let value = match code.strip_prefix(['x', 'X']) {
            Some(hex) => u32::from_str_radix(hex, 16).ok(),
            None => code.parse::<u32>().ok(),
        };
        if let Some(c) = value.and_then(char::from_u32) {
            return c.to_string();
        }
    } else if let Some(resolved) = quick_xml::escape::resolve_predefined_entity(name) {
        return resolved.to_string();
    }
    format!("&{name};")
}
