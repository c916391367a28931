//! ## Dataset Settings
//!
//! Where the trip dataset lives and how its delimited text is laid out.
//! Values come from [`Settings::default`] and can be overridden through the environment:
//!
//! - `TRIP_INSIGHTS_DATA`: path to the dataset (`.csv`, `.tsv`, `.txt` or `.parquet`).
//! - `TRIP_INSIGHTS_DELIMITER`: a single ASCII field delimiter.
//! - `TRIP_INSIGHTS_HAS_HEADER`: `"0"` or `"false"` when the first line holds data.

use crate::exceptions::{TripInsightsError, TripInsightsResult};
use std::path::PathBuf;

/// Default location of the dataset, relative to the working directory.
pub const DEFAULT_DATA_PATH: &str = "uber-rides-dataset.csv";

pub const DATA_PATH_VAR: &str = "TRIP_INSIGHTS_DATA";
pub const DELIMITER_VAR: &str = "TRIP_INSIGHTS_DELIMITER";
pub const HAS_HEADER_VAR: &str = "TRIP_INSIGHTS_HAS_HEADER";

/// Loader configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub data_path: PathBuf,
    pub delimiter: u8,
    pub has_header: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_path: PathBuf::from(DEFAULT_DATA_PATH),
            delimiter: b',',
            has_header: true,
        }
    }
}

impl Settings {
    /// Defaults overridden by whatever `TRIP_INSIGHTS_*` variables are set.
    pub fn from_env() -> TripInsightsResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`Settings::from_env`] but reads variables through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> TripInsightsResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut settings = Self::default();
        if let Some(path) = lookup(DATA_PATH_VAR).filter(|v| !v.is_empty()) {
            settings.data_path = PathBuf::from(path);
        }
        if let Some(delimiter) = lookup(DELIMITER_VAR) {
            settings.delimiter = parse_delimiter(&delimiter)?;
        }
        if let Some(flag) = lookup(HAS_HEADER_VAR) {
            settings.has_header = !(flag == "0" || flag.eq_ignore_ascii_case("false"));
        }
        Ok(settings)
    }

    pub fn with_data_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.data_path = path.into();
        self
    }
}

fn parse_delimiter(value: &str) -> TripInsightsResult<u8> {
    // "\t" is accepted spelled out, since a literal tab is awkward in most shells.
    if value == "\\t" {
        return Ok(b'\t');
    }
    match value.as_bytes() {
        [byte] if byte.is_ascii() => Ok(*byte),
        _ => Err(TripInsightsError::InvalidParameter(format!(
            "Delimiter '{}' must be a single ASCII character",
            value
        ))),
    }
}
