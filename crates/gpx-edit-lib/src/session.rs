//! Editor session
//!
//! The session is the context object every view talks to. It owns the current
//! document, the index of the track being edited, the [`Selection`] and the
//! add-point mode, and it is the only place where the document can be mutated
//! (see the mutation API in `edit.rs`).

use crate::field::Category;
use crate::id::EntityId;
use crate::model::{Document, Track};
use crate::selection::{Selection, ViewFocus};
use crate::{DEFAULT_FILENAME, EditError, ParseError, Result, parse_gpx, write_gpx};

/// Configuration for an editor session
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Config {
    /// Lowest zoom a selection focus asks the map for (default 14).
    /// A view that is already closer keeps its zoom.
    pub min_focus_zoom: f64,
    /// Export file name for new documents and for loads without a known name
    pub default_filename: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            min_focus_zoom: 14.0,
            default_filename: DEFAULT_FILENAME.to_string(),
        }
    }
}

/// What a click on the map creates while a mode is active
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AddMode {
    Waypoint,
    TrackPoint,
}

/// Serialized document together with the file name to save it under
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Export {
    pub filename: String,
    pub contents: String,
}

/// Single-editor session state
#[derive(Debug, Default)]
pub struct EditorSession {
    pub(crate) config: Config,
    pub(crate) document: Option<Document>,
    pub(crate) current_track: usize,
    pub(crate) selection: Selection,
    pub(crate) add_mode: Option<AddMode>,
}

#[cfg_attr(feature = "profiling", profiling::all_functions)]
impl EditorSession {
    /// Create a session with no document loaded
    pub fn new(config: Config) -> Self {
        Self {
            config,
            document: None,
            current_track: 0,
            selection: Selection::new(),
            add_mode: None,
        }
    }

    #[inline]
    pub fn config(&self) -> &Config {
        &self.config
    }

    #[inline]
    pub fn document(&self) -> Option<&Document> {
        self.document.as_ref()
    }

    #[inline]
    pub fn is_loaded(&self) -> bool {
        self.document.is_some()
    }

    /// Parse `text` and replace the current document with it.
    ///
    /// On failure the session keeps its previous document and selection untouched.
    pub fn load(
        &mut self,
        text: &str,
        filename: Option<&str>,
    ) -> std::result::Result<&Document, ParseError> {
        let mut doc = match parse_gpx(text) {
            Ok(doc) => doc,
            Err(e) => {
                tracing::warn!("Failed to load GPX {:?}: {}", filename, e);
                return Err(e);
            }
        };

        doc.export_filename = filename
            .map(str::to_string)
            .unwrap_or_else(|| self.config.default_filename.clone());

        tracing::info!(
            "Loaded {}: {} waypoints, {} tracks, {} entities",
            doc.export_filename,
            doc.waypoints.len(),
            doc.tracks.len(),
            doc.entity_count()
        );

        self.current_track = 0;
        self.selection.clear_all();
        let doc: &Document = self.document.insert(doc);
        Ok(doc)
    }

    /// Replace the current document with an empty one
    pub fn new_document(&mut self) -> &Document {
        let doc = Document::with_filename(&self.config.default_filename);
        tracing::info!("Started new document {}", doc.export_filename);
        self.current_track = 0;
        self.selection.clear_all();
        self.document.insert(doc)
    }

    /// Drop the document and reset all session state
    pub fn close(&mut self) {
        if let Some(doc) = self.document.take() {
            tracing::debug!("Closed {}", doc.export_filename);
        }
        self.current_track = 0;
        self.selection.clear_all();
        self.add_mode = None;
    }

    pub(crate) fn document_mut(&mut self) -> Result<&mut Document> {
        self.document.as_mut().ok_or(EditError::NoDocument)
    }

    /// Index of the track shown in the point table, `None` without tracks
    pub fn current_track_index(&self) -> Option<usize> {
        let doc = self.document.as_ref()?;
        (self.current_track < doc.tracks.len()).then_some(self.current_track)
    }

    pub fn current_track(&self) -> Option<&Track> {
        self.document.as_ref()?.track(self.current_track)
    }

    /// Switch the point table to the track at `index`
    pub fn select_track(&mut self, index: usize) -> bool {
        let exists = self
            .document
            .as_ref()
            .is_some_and(|doc| index < doc.tracks.len());
        if exists {
            self.current_track = index;
        }
        exists
    }

    #[inline]
    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    /// Make `id` the active entity of `category`.
    ///
    /// Selecting a track point of another track also makes that track current.
    pub fn select(&mut self, category: Category, id: EntityId) {
        if category == Category::TrackPoint {
            if let Some((track_index, _)) = self
                .document
                .as_ref()
                .and_then(|doc| doc.find_track_point(&id))
            {
                self.current_track = track_index;
            }
        }
        tracing::debug!("Selected {:?} {}", category, id);
        self.selection.select(category, id);
    }

    pub fn clear_selection(&mut self, category: Category) {
        self.selection.clear(category);
    }

    /// Preferred map focus for the active entity of `category`
    pub fn focus(&self, category: Category, current_zoom: f64) -> Option<ViewFocus> {
        self.selection.focus(
            self.document.as_ref()?,
            category,
            current_zoom,
            self.config.min_focus_zoom,
        )
    }

    #[inline]
    pub fn add_mode(&self) -> Option<AddMode> {
        self.add_mode
    }

    /// Toggle an add-point mode.
    ///
    /// Toggling the active mode turns it off, toggling the other mode replaces it.
    /// Returns the mode that is active afterwards.
    pub fn toggle_add_mode(&mut self, mode: AddMode) -> Result<Option<AddMode>> {
        if self.add_mode == Some(mode) {
            self.add_mode = None;
        } else {
            let doc = self.document.as_ref().ok_or(EditError::NoDocument)?;
            if mode == AddMode::TrackPoint && doc.tracks.is_empty() {
                return Err(EditError::NoTracks);
            }
            self.add_mode = Some(mode);
        }
        tracing::debug!("Add mode: {:?}", self.add_mode);
        Ok(self.add_mode)
    }

    /// Create an entity at a map position according to the active add mode,
    /// then select it. Track points go to the current track.
    pub fn add_point_at(&mut self, lat: f64, lon: f64) -> Option<EntityId> {
        let (category, id) = match self.add_mode? {
            AddMode::Waypoint => (Category::Waypoint, self.add_waypoint(lat, lon).ok()?),
            AddMode::TrackPoint => {
                let track_id = self.current_track()?.id.clone();
                (
                    Category::TrackPoint,
                    self.add_track_point(&track_id, lat, lon).ok()?,
                )
            }
        };
        self.select(category, id.clone());
        Some(id)
    }

    /// Serialize the current document for saving
    pub fn export(&self) -> Option<Export> {
        let doc = self.document.as_ref()?;
        let export = Export {
            filename: doc.suggested_filename(),
            contents: write_gpx(doc),
        };
        tracing::info!(
            "Exported {} ({} bytes)",
            export.filename,
            export.contents.len()
        );
        Some(export)
    }
}
