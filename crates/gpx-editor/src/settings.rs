use clap::{Args, Parser, Subcommand};
use gpx_edit_lib::{Config, DEFAULT_FILENAME, EntityId, Field, coerce_number};
use std::path::PathBuf;
use std::str::FromStr;

#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
/// GPX Editor - inspect and edit waypoints and tracks of GPX files
pub struct Settings {
    /// File name used for new documents and when none is known
    #[clap(long, global = true, default_value = DEFAULT_FILENAME)]
    pub default_filename: String,

    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Print metadata, tracks and waypoints of a GPX file
    Info(InfoArgs),
    /// Load a GPX file (or start a new one), apply edits and write the result
    Edit(EditArgs),
}

#[derive(Args, Debug, Clone)]
pub struct InfoArgs {
    /// GPX file to inspect
    #[clap(value_name = "FILE")]
    pub file: PathBuf,

    /// Print the parsed document as JSON
    #[clap(long, default_value = "false")]
    pub json: bool,
}

#[derive(Args, Debug, Clone, Default)]
pub struct EditArgs {
    /// GPX file to edit, a new document is started when omitted
    #[clap(value_name = "FILE")]
    pub file: Option<PathBuf>,

    /// Document name (empty to remove)
    #[clap(long)]
    pub name: Option<String>,

    /// Document description (empty to remove)
    #[clap(long)]
    pub desc: Option<String>,

    /// Creator attribute (empty restores the default)
    #[clap(long)]
    pub creator: Option<String>,

    /// Version attribute (empty restores the default)
    #[clap(long)]
    pub gpx_version: Option<String>,

    /// File name suggested for the export
    #[clap(long)]
    pub filename: Option<String>,

    /// Append a new track and make it current
    #[clap(long, default_value = "false")]
    pub new_track: bool,

    /// Index of the track that point additions and renames apply to
    #[clap(short, long, value_name = "INDEX")]
    pub track: Option<usize>,

    /// Rename the current track (empty to remove the name)
    #[clap(long, value_name = "NAME")]
    pub rename: Option<String>,

    /// Add a waypoint
    #[clap(long, value_name = "LAT,LON", allow_hyphen_values = true)]
    pub add_waypoint: Vec<Coordinate>,

    /// Append a point to the current track
    #[clap(long, value_name = "LAT,LON", allow_hyphen_values = true)]
    pub add_point: Vec<Coordinate>,

    /// Set a field of a waypoint or track point, e.g. `wpt-0:name=Hut`
    #[clap(long, value_name = "ID:FIELD=VALUE", allow_hyphen_values = true)]
    pub set: Vec<FieldEdit>,

    /// Delete a waypoint or track point by id
    #[clap(long, value_name = "ID")]
    pub delete: Vec<String>,

    /// Delete a track by id
    #[clap(long, value_name = "ID")]
    pub delete_track: Vec<String>,

    /// Write the result to this file
    #[clap(short, long, value_name = "FILE", conflicts_with = "out_dir")]
    pub output: Option<PathBuf>,

    /// Write the result into this directory under the suggested file name
    #[clap(long, value_name = "DIR")]
    pub out_dir: Option<PathBuf>,
}

impl Settings {
    /// Session configuration derived from the command line
    pub fn to_config(&self) -> Config {
        Config {
            default_filename: self.default_filename.clone(),
            ..Config::default()
        }
    }
}

/// A `LAT,LON` pair
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinate {
    pub lat: f64,
    pub lon: f64,
}

impl FromStr for Coordinate {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (lat, lon) = s
            .split_once(',')
            .ok_or_else(|| format!("expected LAT,LON but got '{s}'"))?;
        let parse = |value: &str, what: &str| {
            coerce_number(value).ok_or_else(|| format!("invalid {what} '{}'", value.trim()))
        };
        Ok(Self {
            lat: parse(lat, "latitude")?,
            lon: parse(lon, "longitude")?,
        })
    }
}

/// One `ID:FIELD=VALUE` assignment. An empty value clears the field.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldEdit {
    pub id: EntityId,
    pub field: Field,
    pub value: String,
}

impl FromStr for FieldEdit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (id, rest) = s
            .split_once(':')
            .ok_or_else(|| format!("expected ID:FIELD=VALUE but got '{s}'"))?;
        let (field, value) = rest
            .split_once('=')
            .ok_or_else(|| format!("expected ID:FIELD=VALUE but got '{s}'"))?;

        let id = id.trim();
        if id.is_empty() {
            return Err(format!("missing id in '{s}'"));
        }

        Ok(Self {
            id: EntityId::from(id),
            field: field.parse()?,
            value: value.to_string(),
        })
    }
}
