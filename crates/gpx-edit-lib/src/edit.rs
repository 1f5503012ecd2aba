//! Mutation API
//!
//! Every change to a loaded document goes through these methods. Field values are
//! always coerced with the shared policy from `field.rs`, ids are never renumbered,
//! and deletions clear selection registers that would otherwise dangle.

use crate::field::{Category, Field, MetaField, coerce_text};
use crate::id::EntityId;
use crate::model::Document;
use crate::session::EditorSession;
use crate::{DEFAULT_CREATOR, DEFAULT_VERSION, EditError, Result};
use std::collections::HashSet;

#[inline]
fn finite(value: f64) -> Option<f64> {
    value.is_finite().then_some(value)
}

#[cfg_attr(feature = "profiling", profiling::all_functions)]
impl EditorSession {
    /// Append a new track with one empty segment and make it current.
    ///
    /// Starts a new document first when none is loaded.
    pub fn create_track(&mut self) -> EntityId {
        let default_filename = &self.config.default_filename;
        let doc = self
            .document
            .get_or_insert_with(|| Document::with_filename(default_filename));

        let name = format!("Track {}", doc.tracks.len() + 1);
        let id = doc.push_track(Some(name));
        self.current_track = doc.tracks.len() - 1;

        tracing::debug!("Created track {}", id);
        id
    }

    /// Remove a track. Returns `false` if no such track exists.
    pub fn delete_track(&mut self, id: &EntityId) -> bool {
        let Some(doc) = self.document.as_mut() else {
            return false;
        };
        let Some(index) = doc.track_index(id) else {
            return false;
        };

        let track = doc.tracks.remove(index);
        let selected_inside = self
            .selection
            .track_point()
            .is_some_and(|selected| track.contains_point(selected));
        if selected_inside {
            self.selection.clear(Category::TrackPoint);
        }

        // Keep pointing at the same track, or at the last one if the current was removed
        if index < self.current_track {
            self.current_track -= 1;
        } else if self.current_track >= doc.tracks.len() {
            self.current_track = doc.tracks.len().saturating_sub(1);
        }

        tracing::debug!("Deleted track {} with {} points", id, track.point_count());
        true
    }

    /// Set a track's name, clearing it when `name` is blank
    pub fn rename_track(&mut self, id: &EntityId, name: &str) -> bool {
        let Some(track) = self
            .document
            .as_mut()
            .and_then(|doc| doc.tracks.iter_mut().find(|t| &t.id == id))
        else {
            return false;
        };
        track.name = coerce_text(name);
        true
    }

    /// Append a waypoint with all optional fields empty
    pub fn add_waypoint(&mut self, lat: f64, lon: f64) -> Result<EntityId> {
        let doc = self.document_mut()?;
        let id = doc.push_waypoint(finite(lat), finite(lon));
        tracing::debug!("Added waypoint {} at ({}, {})", id, lat, lon);
        Ok(id)
    }

    /// Append a point to the first segment of a track, creating the segment if needed
    pub fn add_track_point(&mut self, track_id: &EntityId, lat: f64, lon: f64) -> Result<EntityId> {
        let doc = self.document_mut()?;
        let id = doc
            .track_index(track_id)
            .and_then(|index| doc.push_track_point(index, finite(lat), finite(lon)))
            .ok_or_else(|| EditError::UnknownTrack(track_id.clone()))?;
        tracing::debug!("Added track point {} at ({}, {})", id, lat, lon);
        Ok(id)
    }

    /// Write `raw` into one field of a waypoint or track point.
    ///
    /// Track points are looked up in the first segment of the current track.
    /// Returns `false` when the entity does not exist or does not carry `field`.
    pub fn edit_field(&mut self, category: Category, id: &EntityId, field: Field, raw: &str) -> bool {
        let current_track = self.current_track;
        let Some(doc) = self.document.as_mut() else {
            return false;
        };

        let applied = match category {
            Category::Waypoint => match doc.waypoints.iter_mut().find(|w| &w.id == id) {
                Some(waypoint) => {
                    waypoint.set_field(field, raw);
                    true
                }
                None => false,
            },
            Category::TrackPoint => doc
                .tracks
                .get_mut(current_track)
                .and_then(|track| track.segments.first_mut())
                .and_then(|segment| segment.points.iter_mut().find(|p| &p.id == id))
                .is_some_and(|point| point.set_field(field, raw)),
        };

        if applied {
            tracing::debug!("Edited {} of {}", field, id);
        }
        applied
    }

    /// Edit root attributes or the metadata block.
    ///
    /// Blank version and creator fall back to their defaults, blank name and
    /// description are removed.
    pub fn edit_metadata(&mut self, field: MetaField, raw: &str) -> bool {
        let Some(doc) = self.document.as_mut() else {
            return false;
        };

        let meta = &mut doc.metadata;
        match field {
            MetaField::Version => {
                meta.version = coerce_text(raw).unwrap_or_else(|| DEFAULT_VERSION.to_string())
            }
            MetaField::Creator => {
                meta.creator = coerce_text(raw).unwrap_or_else(|| DEFAULT_CREATOR.to_string())
            }
            MetaField::Name => meta.name = coerce_text(raw),
            MetaField::Description => meta.description = coerce_text(raw),
        }
        true
    }

    /// Set the export file name. Returns the normalized name that was stored.
    pub fn set_export_filename(&mut self, raw: &str) -> Option<String> {
        let doc = self.document.as_mut()?;
        doc.export_filename = crate::model::normalize_filename(raw);
        Some(doc.export_filename.clone())
    }

    /// Delete all waypoints, or all track points of the current track, whose id is
    /// in `ids`. Unknown ids are skipped. Returns how many entities were removed.
    pub fn delete_entities(&mut self, category: Category, ids: &HashSet<EntityId>) -> usize {
        if ids.is_empty() {
            return 0;
        }
        let current_track = self.current_track;
        let Some(doc) = self.document.as_mut() else {
            return 0;
        };

        let mut removed = HashSet::new();
        let mut take = |id: &EntityId| {
            let hit = ids.contains(id);
            if hit {
                removed.insert(id.clone());
            }
            !hit
        };

        match category {
            Category::Waypoint => doc.waypoints.retain(|w| take(&w.id)),
            Category::TrackPoint => {
                if let Some(track) = doc.tracks.get_mut(current_track) {
                    for segment in &mut track.segments {
                        segment.points.retain(|p| take(&p.id));
                    }
                }
            }
        }

        self.selection.clear_if_removed(category, &removed);

        if !removed.is_empty() {
            tracing::debug!("Deleted {} {:?} entities", removed.len(), category);
        }
        removed.len()
    }
}
