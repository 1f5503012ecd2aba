//! GPX Editor - command line host for `gpx-edit-lib`
//!
//! Reads GPX files from disk, drives an [`gpx_edit_lib::EditorSession`] with the
//! edits given on the command line and writes the result back out.

pub mod commands;
pub mod logging;
pub mod settings;

pub use commands::{CliError, run};
pub use settings::Settings;
