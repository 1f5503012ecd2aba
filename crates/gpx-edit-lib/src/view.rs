//! Read models for map and table views
//!
//! Snapshots are rebuilt from the session on demand and never cached, so a view
//! that asks again after a mutation always sees the current document.

use crate::field::Category;
use crate::id::EntityId;
use crate::model::{TrackPoint, Waypoint};
use crate::session::EditorSession;
use crate::utils;
use geo::{LineString, Point, Rect};

/// Label used for waypoints without a name
pub const UNNAMED_WAYPOINT: &str = "Waypoint";

/// A clickable point on the map
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Marker {
    pub category: Category,
    pub id: EntityId,
    /// Owning track, `None` for waypoints
    pub track_id: Option<EntityId>,
    pub position: Point<f64>,
    pub label: String,
    pub in_current_track: bool,
    pub highlighted: bool,
}

/// The drawn path of one segment
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Polyline {
    pub track_id: EntityId,
    pub segment_id: EntityId,
    pub in_current_track: bool,
    pub path: LineString<f64>,
}

/// Everything a map view needs to draw the document
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct MapScene {
    pub markers: Vec<Marker>,
    pub polylines: Vec<Polyline>,
    /// Fit-to-view rectangle over all markers
    pub bounds: Option<Rect<f64>>,
}

/// One table row
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Row<'a, T> {
    /// 1-based live position in the table
    pub number: usize,
    pub entity: &'a T,
    pub selected: bool,
}

#[cfg_attr(feature = "profiling", profiling::all_functions)]
impl EditorSession {
    /// Markers and polylines for the whole document.
    ///
    /// Entities without both coordinates are not drawn. Empty in a session
    /// without document.
    pub fn map_scene(&self) -> MapScene {
        let Some(doc) = self.document() else {
            return MapScene::default();
        };
        let current = self.current_track_index();
        let selection = self.selection();

        let mut markers = Vec::with_capacity(doc.entity_count());
        let mut polylines = Vec::new();

        for waypoint in doc.waypoints() {
            if let Some(position) = waypoint.position() {
                markers.push(Marker {
                    category: Category::Waypoint,
                    id: waypoint.id().clone(),
                    track_id: None,
                    position,
                    label: waypoint.name().unwrap_or(UNNAMED_WAYPOINT).to_string(),
                    in_current_track: false,
                    highlighted: selection.is_highlighted(Category::Waypoint, waypoint.id()),
                });
            }
        }

        for (index, track) in doc.tracks().iter().enumerate() {
            let in_current_track = current == Some(index);
            let label = track.label(index);

            for segment in track.segments() {
                for (position_in_segment, point) in segment.points().iter().enumerate() {
                    let Some(position) = point.position() else {
                        continue;
                    };
                    markers.push(Marker {
                        category: Category::TrackPoint,
                        id: point.id().clone(),
                        track_id: Some(track.id().clone()),
                        position,
                        label: format!("{} #{}", label, position_in_segment + 1),
                        in_current_track,
                        highlighted: selection
                            .is_highlighted(Category::TrackPoint, point.id()),
                    });
                }

                let path: LineString<f64> = LineString::new(segment.path().map(|p| p.0).collect());
                if path.0.is_empty() {
                    continue;
                }
                polylines.push(Polyline {
                    track_id: track.id().clone(),
                    segment_id: segment.id().clone(),
                    in_current_track,
                    path,
                });
            }
        }

        let bounds = utils::bounding_rect(markers.iter().map(|m| m.position));

        MapScene {
            markers,
            polylines,
            bounds,
        }
    }

    /// Waypoint table rows in document order
    pub fn waypoint_rows(&self) -> Vec<Row<'_, Waypoint>> {
        let Some(doc) = self.document() else {
            return Vec::new();
        };
        doc.waypoints()
            .iter()
            .enumerate()
            .map(|(i, waypoint)| Row {
                number: i + 1,
                entity: waypoint,
                selected: self
                    .selection()
                    .is_highlighted(Category::Waypoint, waypoint.id()),
            })
            .collect()
    }

    /// Rows for the first segment of the current track
    pub fn track_point_rows(&self) -> Vec<Row<'_, TrackPoint>> {
        let Some(segment) = self.current_track().and_then(|t| t.first_segment()) else {
            return Vec::new();
        };
        segment
            .points()
            .iter()
            .enumerate()
            .map(|(i, point)| Row {
                number: i + 1,
                entity: point,
                selected: self
                    .selection()
                    .is_highlighted(Category::TrackPoint, point.id()),
            })
            .collect()
    }

    /// `(index, label)` pairs for a track chooser
    pub fn track_labels(&self) -> Vec<(usize, String)> {
        self.document()
            .map(|doc| {
                doc.tracks()
                    .iter()
                    .enumerate()
                    .map(|(i, track)| (i, track.label(i)))
                    .collect()
            })
            .unwrap_or_default()
    }
}
