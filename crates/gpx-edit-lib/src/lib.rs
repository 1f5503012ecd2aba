//! GPX Edit Library - Core Data Model for Interactive GPX Editing
//!
//! This library turns a GPX document into typed, individually addressable entities,
//! lets a single editor session mutate them under a fixed coercion policy, and writes
//! them back out deterministically. Map and table views are kept outside of the core:
//! they only consume the read models in [`view`] and send intents back to the session.
//!
//! # Architecture
//!
//! - **[`Document`]**: Owns metadata, waypoints and tracks → segments → points
//! - **[`parse_gpx`]**: Lenient per field, strict on the `<gpx>` root
//! - **[`write_gpx`]**: Byte-exact reproducible output, skipping incomplete points
//! - **[`EditorSession`]**: Mutation API, current track, add-point mode and [`Selection`]
//!
//! # Identity
//!
//! Every entity carries an [`EntityId`] that stays unique for the lifetime of the
//! document. Parsed ids are derived from structural position, interactively created
//! ones come from a per-document counter and are never reused.

mod edit;
mod field;
mod id;
mod model;
mod parser;
mod selection;
mod session;
pub mod utils;
pub mod view;
mod writer;

// Public API exports
pub use field::{Category, Field, MetaField, coerce_number, coerce_text};
pub use id::EntityId;
pub use model::{Document, Metadata, Segment, Track, TrackPoint, Waypoint};
pub use parser::parse_gpx;
pub use selection::{Selection, ViewFocus};
pub use session::{AddMode, Config, EditorSession, Export};
pub use writer::write_gpx;

/// Version attribute used when the root element does not carry one
pub const DEFAULT_VERSION: &str = "1.1";

/// Creator attribute used when the root element does not carry one
pub const DEFAULT_CREATOR: &str = "GPX Editor";

/// Export file name used when none is known
pub const DEFAULT_FILENAME: &str = "edited.gpx";

/// Errors produced while reading a GPX document
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("No <gpx> root element found")]
    MissingRoot,

    #[error("Malformed XML: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("Document ends before <{0}> is closed")]
    Truncated(String),
}

/// Errors produced by editing operations whose preconditions are not met
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EditError {
    #[error("No document loaded")]
    NoDocument,

    #[error("The document contains no tracks")]
    NoTracks,

    #[error("Unknown track: {0}")]
    UnknownTrack(EntityId),
}

pub type Result<T, E = EditError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_exports() {
        // Verify that all public types are accessible
        let _: fn(Config) -> EditorSession = EditorSession::new;
        let _: fn() -> Config = Config::default;
        let _: fn(&str) -> std::result::Result<Document, ParseError> = parse_gpx;
        let _: fn(&Document) -> String = write_gpx;
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(
            ParseError::MissingRoot.to_string(),
            "No <gpx> root element found"
        );
        assert_eq!(
            ParseError::Truncated("trkseg".to_string()).to_string(),
            "Document ends before <trkseg> is closed"
        );
        assert_eq!(
            EditError::UnknownTrack(EntityId::track(3)).to_string(),
            "Unknown track: trk-3"
        );
    }
}
