//! Selection coordinator
//!
//! Holds the active waypoint and the active track point as two independent
//! single-slot registers. Views read highlight flags and the preferred focus from
//! here; they never keep their own notion of what is selected.

use crate::field::Category;
use crate::id::EntityId;
use crate::model::Document;
use std::collections::HashSet;

/// Where a view should center after a selection, and how far in it should zoom
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ViewFocus {
    pub lat: f64,
    pub lon: f64,
    pub zoom: f64,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Selection {
    waypoint: Option<EntityId>,
    track_point: Option<EntityId>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `id` the active entity of `category`, replacing any previous one
    pub fn select(&mut self, category: Category, id: EntityId) {
        *self.slot_mut(category) = Some(id);
    }

    pub fn clear(&mut self, category: Category) {
        *self.slot_mut(category) = None;
    }

    pub fn clear_all(&mut self) {
        self.waypoint = None;
        self.track_point = None;
    }

    /// Clear the register of `category` if it points at one of `removed`
    pub(crate) fn clear_if_removed(&mut self, category: Category, removed: &HashSet<EntityId>) {
        if self.get(category).is_some_and(|id| removed.contains(id)) {
            self.clear(category);
        }
    }

    #[inline]
    pub fn get(&self, category: Category) -> Option<&EntityId> {
        match category {
            Category::Waypoint => self.waypoint.as_ref(),
            Category::TrackPoint => self.track_point.as_ref(),
        }
    }

    #[inline]
    pub fn waypoint(&self) -> Option<&EntityId> {
        self.waypoint.as_ref()
    }

    #[inline]
    pub fn track_point(&self) -> Option<&EntityId> {
        self.track_point.as_ref()
    }

    /// Highlight flag exposed to presentation layers
    #[inline]
    pub fn is_highlighted(&self, category: Category, id: &EntityId) -> bool {
        self.get(category) == Some(id)
    }

    /// Preferred view focus for the active entity of `category`.
    ///
    /// The zoom is never lower than `current_zoom`: it is raised to `min_zoom`
    /// when the view is further out, and kept otherwise. Returns `None` when
    /// nothing is selected or the entity has no complete coordinates.
    pub fn focus(
        &self,
        doc: &Document,
        category: Category,
        current_zoom: f64,
        min_zoom: f64,
    ) -> Option<ViewFocus> {
        let id = self.get(category)?;
        let position = match category {
            Category::Waypoint => doc.waypoint(id)?.position()?,
            Category::TrackPoint => doc.find_track_point(id)?.1.position()?,
        };

        Some(ViewFocus {
            lat: position.y(),
            lon: position.x(),
            zoom: current_zoom.max(min_zoom),
        })
    }

    fn slot_mut(&mut self, category: Category) -> &mut Option<EntityId> {
        match category {
            Category::Waypoint => &mut self.waypoint,
            Category::TrackPoint => &mut self.track_point,
        }
    }
}
