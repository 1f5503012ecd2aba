//! Command implementations
//!
//! File I/O lives here. Everything else goes through [`EditorSession`], the same
//! intents an interactive view would send.

use crate::settings::{Command, EditArgs, InfoArgs, Settings};
use gpx_edit_lib::{
    Category, Config, Document, EditError, EditorSession, EntityId, Export, Metadata, ParseError,
    Waypoint,
};
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse {path}: {source}")]
    Parse { path: PathBuf, source: ParseError },

    #[error(transparent)]
    Edit(#[from] EditError),

    #[error("No track at index {0}")]
    NoSuchTrack(usize),

    #[error("No waypoint or track point with id {0}")]
    UnknownEntity(EntityId),

    #[error("Cannot set '{field}' on {id}")]
    FieldRejected { id: EntityId, field: String },

    #[error("JSON encoding failed: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T, E = CliError> = std::result::Result<T, E>;

/// Run the selected subcommand
pub fn run(settings: &Settings) -> Result<()> {
    let config = settings.to_config();
    match &settings.command {
        Command::Info(args) => run_info(config, args),
        Command::Edit(args) => run_edit(config, args),
    }
}

fn run_info(config: Config, args: &InfoArgs) -> Result<()> {
    #[cfg(feature = "profiling")]
    profiling::scope!("commands::run_info");

    let mut session = EditorSession::new(config);
    load_file(&mut session, &args.file)?;

    let Some(doc) = session.document() else {
        return Err(EditError::NoDocument.into());
    };
    let summary = Summary::new(doc);
    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print!("{}", summary.render());
    }
    Ok(())
}

fn run_edit(config: Config, args: &EditArgs) -> Result<()> {
    #[cfg(feature = "profiling")]
    profiling::scope!("commands::run_edit");

    let mut session = EditorSession::new(config);
    match &args.file {
        Some(path) => load_file(&mut session, path)?,
        None => {
            session.new_document();
        }
    }

    apply_edits(&mut session, args)?;

    let Some(export) = session.export() else {
        return Err(EditError::NoDocument.into());
    };
    match output_path(args, &export) {
        Some(path) => {
            std::fs::write(&path, &export.contents).map_err(|source| CliError::Write {
                path: path.clone(),
                source,
            })?;
            tracing::info!("Wrote {}", path.display());
        }
        None => println!("{}", export.contents),
    }
    Ok(())
}

fn load_file(session: &mut EditorSession, path: &Path) -> Result<()> {
    let text = std::fs::read_to_string(path).map_err(|source| CliError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let filename = path.file_name().and_then(|name| name.to_str());
    session
        .load(&text, filename)
        .map_err(|source| CliError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
    Ok(())
}

/// Where to write the export, `None` for stdout
fn output_path(args: &EditArgs, export: &Export) -> Option<PathBuf> {
    if let Some(output) = &args.output {
        return Some(output.clone());
    }
    args.out_dir.as_ref().map(|dir| dir.join(&export.filename))
}

/// Apply all edits requested on the command line, in a fixed order:
/// metadata, tracks, additions, field edits, deletions.
pub fn apply_edits(session: &mut EditorSession, args: &EditArgs) -> Result<()> {
    use gpx_edit_lib::MetaField;

    let metadata = [
        (MetaField::Name, &args.name),
        (MetaField::Description, &args.desc),
        (MetaField::Creator, &args.creator),
        (MetaField::Version, &args.gpx_version),
    ];
    for (field, value) in metadata {
        if let Some(value) = value {
            session.edit_metadata(field, value);
        }
    }

    if let Some(filename) = &args.filename {
        session.set_export_filename(filename);
    }

    if args.new_track {
        session.create_track();
    }

    if let Some(index) = args.track {
        if !session.select_track(index) {
            return Err(CliError::NoSuchTrack(index));
        }
    }

    if let Some(name) = &args.rename {
        let id = current_track_id(session)?;
        session.rename_track(&id, name);
    }

    for coordinate in &args.add_waypoint {
        session.add_waypoint(coordinate.lat, coordinate.lon)?;
    }

    if !args.add_point.is_empty() {
        let id = current_track_id(session)?;
        for coordinate in &args.add_point {
            session.add_track_point(&id, coordinate.lat, coordinate.lon)?;
        }
    }

    for edit in &args.set {
        let Some(category) = category_of(session, &edit.id) else {
            return Err(CliError::UnknownEntity(edit.id.clone()));
        };
        // Editing a track point targets the current track, so switch to its track first
        if category == Category::TrackPoint {
            session.select(Category::TrackPoint, edit.id.clone());
        }
        if !session.edit_field(category, &edit.id, edit.field, &edit.value) {
            return Err(CliError::FieldRejected {
                id: edit.id.clone(),
                field: edit.field.to_string(),
            });
        }
    }

    delete_points(session, &args.delete);

    for id in &args.delete_track {
        if !session.delete_track(&EntityId::from(id.as_str())) {
            tracing::warn!("No track with id {}", id);
        }
    }

    Ok(())
}

fn current_track_id(session: &EditorSession) -> Result<EntityId> {
    session
        .current_track()
        .map(|track| track.id().clone())
        .ok_or_else(|| EditError::NoTracks.into())
}

/// Category of an existing entity, `None` for unknown ids
fn category_of(session: &EditorSession, id: &EntityId) -> Option<Category> {
    let doc = session.document()?;
    if doc.waypoint(id).is_some() {
        Some(Category::Waypoint)
    } else if doc.find_track_point(id).is_some() {
        Some(Category::TrackPoint)
    } else {
        None
    }
}

/// Delete waypoints and track points, grouping track points by their track
fn delete_points(session: &mut EditorSession, ids: &[String]) {
    if ids.is_empty() {
        return;
    }
    let Some(doc) = session.document() else {
        return;
    };

    let mut waypoints = HashSet::new();
    let mut by_track: BTreeMap<usize, HashSet<EntityId>> = BTreeMap::new();
    for raw in ids {
        let id = EntityId::from(raw.as_str());
        if doc.waypoint(&id).is_some() {
            waypoints.insert(id);
        } else if let Some((track_index, _)) = doc.find_track_point(&id) {
            by_track.entry(track_index).or_default().insert(id);
        } else {
            tracing::warn!("No waypoint or track point with id {}", id);
        }
    }

    session.delete_entities(Category::Waypoint, &waypoints);

    let current = session.current_track_index();
    for (track_index, points) in by_track {
        session.select_track(track_index);
        session.delete_entities(Category::TrackPoint, &points);
    }
    if let Some(current) = current {
        session.select_track(current);
    }
}

#[derive(Debug, Serialize)]
pub struct TrackSummary {
    pub index: usize,
    pub id: EntityId,
    pub label: String,
    pub segments: usize,
    pub points: usize,
    pub length_meters: f64,
}

/// What `info` reports about a document
#[derive(Debug, Serialize)]
pub struct Summary<'a> {
    pub filename: String,
    pub metadata: &'a Metadata,
    pub tracks: Vec<TrackSummary>,
    pub waypoints: &'a [Waypoint],
    pub entities: usize,
}

impl<'a> Summary<'a> {
    pub fn new(doc: &'a Document) -> Self {
        let tracks = doc
            .tracks()
            .iter()
            .enumerate()
            .map(|(index, track)| TrackSummary {
                index,
                id: track.id().clone(),
                label: track.label(index),
                segments: track.segments().len(),
                points: track.point_count(),
                length_meters: track.length_meters(),
            })
            .collect();

        Self {
            filename: doc.suggested_filename(),
            metadata: doc.metadata(),
            tracks,
            waypoints: doc.waypoints(),
            entities: doc.entity_count(),
        }
    }

    /// Human readable report
    pub fn render(&self) -> String {
        let mut out = String::new();
        let meta = self.metadata;

        out.push_str(&format!("File: {}\n", self.filename));
        out.push_str(&format!("Creator: {} (GPX {})\n", meta.creator(), meta.version()));
        if let Some(name) = meta.name() {
            out.push_str(&format!("Name: {name}\n"));
        }
        if let Some(description) = meta.description() {
            out.push_str(&format!("Description: {description}\n"));
        }

        out.push_str(&format!("Tracks: {}\n", self.tracks.len()));
        for track in &self.tracks {
            out.push_str(&format!(
                "  [{}] {} ({}): {} points in {} segments, {}\n",
                track.index,
                track.label,
                track.id,
                format_number_with_commas(track.points),
                track.segments,
                format_distance(track.length_meters)
            ));
        }

        out.push_str(&format!("Waypoints: {}\n", self.waypoints.len()));
        for waypoint in self.waypoints {
            let position = match (waypoint.lat(), waypoint.lon()) {
                (Some(lat), Some(lon)) => format!("{lat:.6}, {lon:.6}"),
                _ => "no position".to_string(),
            };
            out.push_str(&format!(
                "  {} {}: {}\n",
                waypoint.id(),
                waypoint.name().unwrap_or("-"),
                position
            ));
        }

        out.push_str(&format!(
            "Entities: {}\n",
            format_number_with_commas(self.entities)
        ));
        out
    }
}

/// Format a distance in meters for display
pub fn format_distance(meters: f64) -> String {
    let km = meters / 1000.0;
    if km < 1.0 {
        format!("{:.0} m", meters)
    } else if km < 100.0 {
        format!("{:.2} km", km)
    } else {
        format!("{:.0} km", km)
    }
}

/// Helper to format numbers with comma separators
pub fn format_number_with_commas(n: usize) -> String {
    let s = n.to_string();
    let mut result = String::new();
    for (i, c) in s.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.push(',');
        }
        result.push(c);
    }
    result.chars().rev().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::{Coordinate, FieldEdit};

    const SAMPLE: &str = r#"<gpx version="1.1" creator="Device">
        <metadata><name>Weekend</name></metadata>
        <wpt lat="47.1" lon="11.2"><name>Hut</name></wpt>
        <wpt lat="47.2" lon="11.3"/>
        <trk><name>Up</name><trkseg><trkpt lat="47.0" lon="11.0"/><trkpt lat="47.01" lon="11.0"/></trkseg></trk>
        <trk><trkseg><trkpt lat="47.5" lon="11.5"/><trkpt lat="47.6" lon="11.6"/></trkseg></trk>
    </gpx>"#;

    fn create_test_session() -> EditorSession {
        let mut session = EditorSession::new(Config::default());
        session.load(SAMPLE, Some("weekend.gpx")).unwrap();
        session
    }

    fn coordinate(lat: f64, lon: f64) -> Coordinate {
        Coordinate { lat, lon }
    }

    #[test]
    fn test_format_helpers() {
        assert_eq!(format_distance(512.4), "512 m");
        assert_eq!(format_distance(12_345.0), "12.35 km");
        assert_eq!(format_distance(250_000.0), "250 km");
        assert_eq!(format_number_with_commas(0), "0");
        assert_eq!(format_number_with_commas(999), "999");
        assert_eq!(format_number_with_commas(1_234_567), "1,234,567");
    }

    #[test]
    fn test_summary_render() {
        let session = create_test_session();
        let text = Summary::new(session.document().unwrap()).render();

        assert!(text.contains("File: weekend.gpx"));
        assert!(text.contains("Creator: Device (GPX 1.1)"));
        assert!(text.contains("Name: Weekend"));
        assert!(text.contains("[0] Up (trk-0): 2 points in 1 segments, 1.11 km"));
        assert!(text.contains("[1] Track 2 (trk-1)"));
        assert!(text.contains("wpt-0 Hut: 47.100000, 11.200000"));
        assert!(text.contains("wpt-1 -:"));
        assert!(text.contains("Entities: 6"));
    }

    #[test]
    fn test_summary_json() {
        let session = create_test_session();
        let json = serde_json::to_value(Summary::new(session.document().unwrap())).unwrap();

        assert_eq!(json["filename"], "weekend.gpx");
        assert_eq!(json["tracks"][1]["label"], "Track 2");
        assert_eq!(json["tracks"][0]["points"], 2);
        assert_eq!(json["waypoints"][0]["name"], "Hut");
        assert_eq!(json["waypoints"][0]["id"], "wpt-0");
    }

    #[test]
    fn test_apply_metadata_and_filename() {
        let mut session = create_test_session();
        let args = EditArgs {
            name: Some(String::new()),
            creator: Some("Me".to_string()),
            filename: Some("cleaned".to_string()),
            ..EditArgs::default()
        };
        apply_edits(&mut session, &args).unwrap();

        let export = session.export().unwrap();
        assert_eq!(export.filename, "cleaned.gpx");
        assert!(export.contents.contains(r#"creator="Me""#));
        assert!(!export.contents.contains("<metadata>"));
    }

    #[test]
    fn test_apply_new_track_with_points() {
        let mut session = EditorSession::new(Config::default());
        session.new_document();
        let args = EditArgs {
            new_track: true,
            rename: Some("Loop".to_string()),
            add_point: vec![coordinate(1.0, 2.0), coordinate(1.5, 2.5)],
            add_waypoint: vec![coordinate(-3.0, 4.0)],
            ..EditArgs::default()
        };
        apply_edits(&mut session, &args).unwrap();

        let doc = session.document().unwrap();
        assert_eq!(doc.tracks()[0].name(), Some("Loop"));
        assert_eq!(doc.tracks()[0].point_count(), 2);
        assert_eq!(doc.waypoints()[0].lat(), Some(-3.0));
    }

    #[test]
    fn test_apply_points_without_track_fails() {
        let mut session = EditorSession::new(Config::default());
        session.new_document();
        let args = EditArgs {
            add_point: vec![coordinate(1.0, 2.0)],
            ..EditArgs::default()
        };
        assert!(matches!(
            apply_edits(&mut session, &args),
            Err(CliError::Edit(EditError::NoTracks))
        ));
    }

    #[test]
    fn test_apply_unknown_track_index() {
        let mut session = create_test_session();
        let args = EditArgs {
            track: Some(7),
            ..EditArgs::default()
        };
        assert!(matches!(
            apply_edits(&mut session, &args),
            Err(CliError::NoSuchTrack(7))
        ));
    }

    #[test]
    fn test_apply_field_edits() {
        let mut session = create_test_session();
        let args = EditArgs {
            set: vec![
                "wpt-1:name=Lake".parse().unwrap(),
                "trk-1-seg-0-pt-1:ele=2100".parse().unwrap(),
            ],
            ..EditArgs::default()
        };
        apply_edits(&mut session, &args).unwrap();

        let doc = session.document().unwrap();
        assert_eq!(doc.waypoints()[1].name(), Some("Lake"));
        let (track, point) = doc.find_track_point(&EntityId::track_point(1, 0, 1)).unwrap();
        assert_eq!(track, 1);
        assert_eq!(point.elevation(), Some(2100.0));
    }

    #[test]
    fn test_apply_rejected_field_edit() {
        let mut session = create_test_session();
        let edit: FieldEdit = "trk-0-seg-0-pt-0:name=x".parse().unwrap();
        let args = EditArgs {
            set: vec![edit],
            ..EditArgs::default()
        };
        let err = apply_edits(&mut session, &args).unwrap_err();
        assert_eq!(err.to_string(), "Cannot set 'name' on trk-0-seg-0-pt-0");
    }

    #[test]
    fn test_apply_field_edit_on_unknown_id() {
        let mut session = create_test_session();
        session.select(Category::TrackPoint, EntityId::track_point(0, 0, 1));
        let args = EditArgs {
            set: vec!["trk-9-seg-0-pt-0:ele=100".parse().unwrap()],
            ..EditArgs::default()
        };

        let err = apply_edits(&mut session, &args).unwrap_err();
        assert!(matches!(err, CliError::UnknownEntity(ref id) if id.as_str() == "trk-9-seg-0-pt-0"));
        assert_eq!(
            session.selection().track_point(),
            Some(&EntityId::track_point(0, 0, 1))
        );
        assert_eq!(session.current_track_index(), Some(0));
    }

    #[test]
    fn test_apply_deletions_across_tracks() {
        let mut session = create_test_session();
        let args = EditArgs {
            delete: vec![
                "wpt-0".to_string(),
                "trk-0-seg-0-pt-0".to_string(),
                "trk-1-seg-0-pt-1".to_string(),
                "wpt-9".to_string(),
            ],
            delete_track: vec!["trk-5".to_string()],
            ..EditArgs::default()
        };
        apply_edits(&mut session, &args).unwrap();

        let doc = session.document().unwrap();
        assert_eq!(doc.waypoints().len(), 1);
        assert_eq!(doc.tracks()[0].point_count(), 1);
        assert_eq!(doc.tracks()[1].point_count(), 1);
        assert_eq!(session.current_track_index(), Some(0));
    }

    #[test]
    fn test_apply_delete_track() {
        let mut session = create_test_session();
        let args = EditArgs {
            delete_track: vec!["trk-0".to_string()],
            ..EditArgs::default()
        };
        apply_edits(&mut session, &args).unwrap();
        assert_eq!(session.document().unwrap().tracks().len(), 1);
    }

    #[test]
    fn test_output_path() {
        let export = Export {
            filename: "ride.gpx".to_string(),
            contents: String::new(),
        };
        let mut args = EditArgs::default();
        assert_eq!(output_path(&args, &export), None);

        args.out_dir = Some(PathBuf::from("out"));
        assert_eq!(
            output_path(&args, &export),
            Some(PathBuf::from("out").join("ride.gpx"))
        );

        args.output = Some(PathBuf::from("x.gpx"));
        assert_eq!(output_path(&args, &export), Some(PathBuf::from("x.gpx")));
    }

    #[test]
    fn test_load_missing_file() {
        let mut session = EditorSession::new(Config::default());
        let err = load_file(&mut session, Path::new("/nonexistent/ride.gpx")).unwrap_err();
        assert!(matches!(err, CliError::Read { .. }));
        assert!(!session.is_loaded());
    }

    #[test]
    fn test_edit_writes_file() {
        let dir = std::env::temp_dir().join(format!("gpx-editor-test-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let input = dir.join("input.gpx");
        std::fs::write(&input, SAMPLE).unwrap();

        let args = EditArgs {
            file: Some(input),
            delete: vec!["wpt-1".to_string()],
            out_dir: Some(dir.clone()),
            filename: Some("output".to_string()),
            ..EditArgs::default()
        };
        run_edit(Config::default(), &args).unwrap();

        let written = std::fs::read_to_string(dir.join("output.gpx")).unwrap();
        assert!(written.contains("<name>Hut</name>"));
        assert_eq!(written.matches("<wpt ").count(), 1);

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
