//! Entity model
//!
//! A [`Document`] exclusively owns its metadata, waypoints and tracks. Tracks own
//! their segments and segments own their points. Fields are readable by anyone but
//! only writable from inside the crate, so every edit goes through the session's
//! mutation API and its coercion policy.

use crate::field::{Field, coerce_number, coerce_text};
use crate::id::{EntityId, IdSequence};
use crate::{DEFAULT_CREATOR, DEFAULT_FILENAME, DEFAULT_VERSION, utils};
use geo::Point;

/// Root attributes and the optional `<metadata>` block
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Metadata {
    pub(crate) version: String,
    pub(crate) creator: String,
    pub(crate) name: Option<String>,
    pub(crate) description: Option<String>,
}

impl Default for Metadata {
    fn default() -> Self {
        Self {
            version: DEFAULT_VERSION.to_string(),
            creator: DEFAULT_CREATOR.to_string(),
            name: None,
            description: None,
        }
    }
}

impl Metadata {
    #[inline]
    pub fn version(&self) -> &str {
        &self.version
    }

    #[inline]
    pub fn creator(&self) -> &str {
        &self.creator
    }

    #[inline]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    #[inline]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }
}

/// A standalone point of interest
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Waypoint {
    pub(crate) id: EntityId,
    pub(crate) lat: Option<f64>,
    pub(crate) lon: Option<f64>,
    pub(crate) elevation: Option<f64>,
    pub(crate) time: Option<String>,
    pub(crate) name: Option<String>,
    pub(crate) description: Option<String>,
}

impl Waypoint {
    pub(crate) fn new(id: EntityId, lat: Option<f64>, lon: Option<f64>) -> Self {
        Self {
            id,
            lat,
            lon,
            elevation: None,
            time: None,
            name: None,
            description: None,
        }
    }

    #[inline]
    pub fn id(&self) -> &EntityId {
        &self.id
    }

    #[inline]
    pub fn lat(&self) -> Option<f64> {
        self.lat
    }

    #[inline]
    pub fn lon(&self) -> Option<f64> {
        self.lon
    }

    #[inline]
    pub fn elevation(&self) -> Option<f64> {
        self.elevation
    }

    #[inline]
    pub fn time(&self) -> Option<&str> {
        self.time.as_deref()
    }

    #[inline]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    #[inline]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Position as `Point(lon, lat)`, `None` when the waypoint cannot be rendered
    #[inline]
    pub fn position(&self) -> Option<Point<f64>> {
        utils::position(self.lat, self.lon)
    }

    pub(crate) fn set_field(&mut self, field: Field, raw: &str) {
        match field {
            Field::Lat => self.lat = coerce_number(raw),
            Field::Lon => self.lon = coerce_number(raw),
            Field::Elevation => self.elevation = coerce_number(raw),
            Field::Time => self.time = coerce_text(raw),
            Field::Name => self.name = coerce_text(raw),
            Field::Description => self.description = coerce_text(raw),
        }
    }
}

/// One sample of a track segment
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TrackPoint {
    pub(crate) id: EntityId,
    pub(crate) track_id: EntityId,
    pub(crate) segment_id: EntityId,
    /// Position in the segment when the point was created, never renumbered
    pub(crate) index: usize,
    pub(crate) lat: Option<f64>,
    pub(crate) lon: Option<f64>,
    pub(crate) elevation: Option<f64>,
    pub(crate) time: Option<String>,
}

impl TrackPoint {
    #[inline]
    pub fn id(&self) -> &EntityId {
        &self.id
    }

    #[inline]
    pub fn track_id(&self) -> &EntityId {
        &self.track_id
    }

    #[inline]
    pub fn segment_id(&self) -> &EntityId {
        &self.segment_id
    }

    /// Creation-time position hint. Use [`Segment::position_of`] for the live position.
    #[inline]
    pub fn index(&self) -> usize {
        self.index
    }

    #[inline]
    pub fn lat(&self) -> Option<f64> {
        self.lat
    }

    #[inline]
    pub fn lon(&self) -> Option<f64> {
        self.lon
    }

    #[inline]
    pub fn elevation(&self) -> Option<f64> {
        self.elevation
    }

    #[inline]
    pub fn time(&self) -> Option<&str> {
        self.time.as_deref()
    }

    #[inline]
    pub fn position(&self) -> Option<Point<f64>> {
        utils::position(self.lat, self.lon)
    }

    /// Returns `false` for fields track points do not carry
    pub(crate) fn set_field(&mut self, field: Field, raw: &str) -> bool {
        match field {
            Field::Lat => self.lat = coerce_number(raw),
            Field::Lon => self.lon = coerce_number(raw),
            Field::Elevation => self.elevation = coerce_number(raw),
            Field::Time => self.time = coerce_text(raw),
            Field::Name | Field::Description => return false,
        }
        true
    }
}

/// Contiguous ordered run of track points
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Segment {
    pub(crate) id: EntityId,
    pub(crate) points: Vec<TrackPoint>,
}

impl Segment {
    pub(crate) fn new(id: EntityId) -> Self {
        Self {
            id,
            points: Vec::new(),
        }
    }

    #[inline]
    pub fn id(&self) -> &EntityId {
        &self.id
    }

    /// Points in path order
    #[inline]
    pub fn points(&self) -> &[TrackPoint] {
        &self.points
    }

    /// Live position of a point in this segment
    pub fn position_of(&self, id: &EntityId) -> Option<usize> {
        self.points.iter().position(|p| &p.id == id)
    }

    /// Positions of all renderable points, in path order
    pub fn path(&self) -> impl Iterator<Item = Point<f64>> + '_ {
        self.points.iter().filter_map(TrackPoint::position)
    }
}

/// A named path made of one or more segments
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Track {
    pub(crate) id: EntityId,
    pub(crate) name: Option<String>,
    pub(crate) segments: Vec<Segment>,
}

impl Track {
    #[inline]
    pub fn id(&self) -> &EntityId {
        &self.id
    }

    #[inline]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    #[inline]
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// The only segment editable through tables and selection
    #[inline]
    pub fn first_segment(&self) -> Option<&Segment> {
        self.segments.first()
    }

    /// Name for display, falling back to `Track {n}` for the track at `index`
    pub fn label(&self, index: usize) -> String {
        match &self.name {
            Some(name) => name.clone(),
            None => format!("Track {}", index + 1),
        }
    }

    /// Total number of points across all segments
    pub fn point_count(&self) -> usize {
        self.segments.iter().map(|s| s.points.len()).sum()
    }

    /// Haversine length in meters, summed per segment over renderable points
    pub fn length_meters(&self) -> f64 {
        self.segments.iter().map(|s| utils::path_length(s.path())).sum()
    }

    pub(crate) fn contains_point(&self, id: &EntityId) -> bool {
        self.segments
            .iter()
            .any(|s| s.points.iter().any(|p| &p.id == id))
    }
}

/// Complete in-memory representation of one GPX file
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Document {
    pub(crate) metadata: Metadata,
    pub(crate) export_filename: String,
    pub(crate) waypoints: Vec<Waypoint>,
    pub(crate) tracks: Vec<Track>,
    pub(crate) ids: IdSequence,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg_attr(feature = "profiling", profiling::all_functions)]
impl Document {
    /// Create an empty document with default metadata
    pub fn new() -> Self {
        Self {
            metadata: Metadata::default(),
            export_filename: DEFAULT_FILENAME.to_string(),
            waypoints: Vec::new(),
            tracks: Vec::new(),
            ids: IdSequence::default(),
        }
    }

    /// Create an empty document that exports under `filename`
    pub(crate) fn with_filename(filename: &str) -> Self {
        Self {
            export_filename: filename.to_string(),
            ..Self::new()
        }
    }

    #[inline]
    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    /// File name as last set, without normalization
    #[inline]
    pub fn export_filename(&self) -> &str {
        &self.export_filename
    }

    /// File name to offer when saving: trimmed, defaulted and ending in `.gpx`
    pub fn suggested_filename(&self) -> String {
        normalize_filename(&self.export_filename)
    }

    #[inline]
    pub fn waypoints(&self) -> &[Waypoint] {
        &self.waypoints
    }

    #[inline]
    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    #[inline]
    pub fn track(&self, index: usize) -> Option<&Track> {
        self.tracks.get(index)
    }

    pub fn track_index(&self, id: &EntityId) -> Option<usize> {
        self.tracks.iter().position(|t| &t.id == id)
    }

    pub fn waypoint(&self, id: &EntityId) -> Option<&Waypoint> {
        self.waypoints.iter().find(|w| &w.id == id)
    }

    /// Find a track point in any segment of any track, with its track index
    pub fn find_track_point(&self, id: &EntityId) -> Option<(usize, &TrackPoint)> {
        self.tracks.iter().enumerate().find_map(|(index, track)| {
            track
                .segments
                .iter()
                .flat_map(|s| s.points.iter())
                .find(|p| &p.id == id)
                .map(|p| (index, p))
        })
    }

    /// Number of waypoints plus track points, renderable or not
    pub fn entity_count(&self) -> usize {
        self.waypoints.len() + self.tracks.iter().map(Track::point_count).sum::<usize>()
    }

    pub(crate) fn push_waypoint(&mut self, lat: Option<f64>, lon: Option<f64>) -> EntityId {
        let id = self.ids.waypoint();
        self.waypoints.push(Waypoint::new(id.clone(), lat, lon));
        id
    }

    /// Append a track with a single empty segment
    pub(crate) fn push_track(&mut self, name: Option<String>) -> EntityId {
        let id = self.ids.track();
        let segment = Segment::new(self.ids.segment(&id));
        self.tracks.push(Track {
            id: id.clone(),
            name,
            segments: vec![segment],
        });
        id
    }

    /// Append a point to the first segment of the track at `track_index`,
    /// creating that segment when the track has none
    pub(crate) fn push_track_point(
        &mut self,
        track_index: usize,
        lat: Option<f64>,
        lon: Option<f64>,
    ) -> Option<EntityId> {
        let track = self.tracks.get_mut(track_index)?;
        if track.segments.is_empty() {
            track.segments.push(Segment::new(self.ids.segment(&track.id)));
        }
        let segment = &mut track.segments[0];
        let id = self.ids.track_point(&segment.id);
        segment.points.push(TrackPoint {
            id: id.clone(),
            track_id: track.id.clone(),
            segment_id: segment.id.clone(),
            index: segment.points.len(),
            lat,
            lon,
            elevation: None,
            time: None,
        });
        Some(id)
    }
}

/// Normalize a user supplied export file name
pub(crate) fn normalize_filename(raw: &str) -> String {
    let mut name = raw.trim().to_string();
    if name.is_empty() {
        name = DEFAULT_FILENAME.to_string();
    }
    if !name.to_lowercase().ends_with(".gpx") {
        name.push_str(".gpx");
    }
    name
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_document() -> Document {
        let mut doc = Document::new();
        doc.push_waypoint(Some(51.5), Some(-0.12));
        let track = doc.push_track(Some("Morning".to_string()));
        let index = doc.track_index(&track).unwrap();
        doc.push_track_point(index, Some(51.5074), Some(-0.1278));
        doc.push_track_point(index, Some(51.5076), Some(-0.1276));
        doc.push_track_point(index, None, Some(-0.1274));
        doc
    }

    #[test]
    fn test_new_document_defaults() {
        let doc = Document::new();
        assert_eq!(doc.metadata().version(), "1.1");
        assert_eq!(doc.metadata().creator(), "GPX Editor");
        assert_eq!(doc.export_filename(), "edited.gpx");
        assert!(doc.waypoints().is_empty());
        assert!(doc.tracks().is_empty());
    }

    #[test]
    fn test_push_track_creates_one_empty_segment() {
        let mut doc = Document::new();
        let id = doc.push_track(None);
        let track = &doc.tracks()[0];
        assert_eq!(track.id(), &id);
        assert_eq!(track.segments().len(), 1);
        assert!(track.segments()[0].points().is_empty());
    }

    #[test]
    fn test_push_track_point_records_parents_and_index() {
        let doc = create_test_document();
        let track = &doc.tracks()[0];
        let segment = track.first_segment().unwrap();

        for (i, point) in segment.points().iter().enumerate() {
            assert_eq!(point.index(), i);
            assert_eq!(point.track_id(), track.id());
            assert_eq!(point.segment_id(), segment.id());
        }
    }

    #[test]
    fn test_push_track_point_recreates_missing_segment() {
        let mut doc = Document::new();
        doc.push_track(None);
        doc.tracks[0].segments.clear();

        let id = doc.push_track_point(0, Some(1.0), Some(2.0)).unwrap();
        let segment = doc.tracks()[0].first_segment().unwrap();
        assert_eq!(segment.points().len(), 1);
        assert_eq!(segment.points()[0].id(), &id);

        assert!(doc.push_track_point(5, Some(1.0), Some(2.0)).is_none());
    }

    #[test]
    fn test_incomplete_point_has_no_position() {
        let doc = create_test_document();
        let segment = doc.tracks()[0].first_segment().unwrap();
        assert!(segment.points()[0].position().is_some());
        assert!(segment.points()[2].position().is_none());
        assert_eq!(segment.path().count(), 2);
    }

    #[test]
    fn test_track_label_and_stats() {
        let doc = create_test_document();
        let track = &doc.tracks()[0];
        assert_eq!(track.label(0), "Morning");
        assert_eq!(track.point_count(), 3);
        assert!(track.length_meters() > 0.0);
        assert!(track.length_meters() < 1000.0);

        let mut unnamed = track.clone();
        unnamed.name = None;
        assert_eq!(unnamed.label(2), "Track 3");
    }

    #[test]
    fn test_lookup_by_id() {
        let doc = create_test_document();
        let waypoint_id = doc.waypoints()[0].id().clone();
        assert!(doc.waypoint(&waypoint_id).is_some());

        let point_id = doc.tracks()[0].segments()[0].points()[1].id().clone();
        let (track_index, point) = doc.find_track_point(&point_id).unwrap();
        assert_eq!(track_index, 0);
        assert_eq!(point.lat(), Some(51.5076));
        assert_eq!(doc.tracks()[0].segments()[0].position_of(&point_id), Some(1));

        assert!(doc.find_track_point(&EntityId::from("missing")).is_none());
        assert_eq!(doc.entity_count(), 4);
    }

    #[test]
    fn test_waypoint_set_field() {
        let mut waypoint = Waypoint::new(EntityId::waypoint(0), None, None);
        waypoint.set_field(Field::Lat, "51.0");
        waypoint.set_field(Field::Lon, " 11.5 ");
        waypoint.set_field(Field::Name, "  Hut ");
        assert_eq!(waypoint.lat(), Some(51.0));
        assert_eq!(waypoint.lon(), Some(11.5));
        assert_eq!(waypoint.name(), Some("Hut"));

        waypoint.set_field(Field::Lat, "abc");
        waypoint.set_field(Field::Name, "");
        assert_eq!(waypoint.lat(), None);
        assert_eq!(waypoint.name(), None);
    }

    #[test]
    fn test_track_point_rejects_text_only_fields() {
        let mut doc = create_test_document();
        let point = &mut doc.tracks[0].segments[0].points[0];
        assert!(point.set_field(Field::Elevation, "35.5"));
        assert_eq!(point.elevation(), Some(35.5));
        assert!(!point.set_field(Field::Name, "ignored"));
    }

    #[test]
    fn test_normalize_filename() {
        assert_eq!(normalize_filename(""), "edited.gpx");
        assert_eq!(normalize_filename("   "), "edited.gpx");
        assert_eq!(normalize_filename("ride"), "ride.gpx");
        assert_eq!(normalize_filename(" Ride.GPX "), "Ride.GPX");
        assert_eq!(normalize_filename("ride.gpx.bak"), "ride.gpx.bak.gpx");
    }
}
