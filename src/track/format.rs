use crate::track::{TrackRecord, VideoMeta};
use crate::Errors;
use anyhow::Result;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// CVAT for video 1.1 XML
pub mod cvat;

/// Full-fidelity JSON document
pub mod json;

/// Document formats the track store is saved to and loaded from
///
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StoreFormat {
    Json,
    Cvat,
}

impl StoreFormat {
    /// Guesses the format from the file extension: `.json` or `.xml`
    ///
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        match path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .as_deref()
        {
            Some("json") => Ok(StoreFormat::Json),
            Some("xml") => Ok(StoreFormat::Cvat),
            _ => Err(Errors::UnsupportedFormat(path.display().to_string()).into()),
        }
    }
}

impl FromStr for StoreFormat {
    type Err = Errors;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "json" => Ok(StoreFormat::Json),
            "cvat" => Ok(StoreFormat::Cvat),
            other => Err(Errors::UnsupportedFormat(other.to_string())),
        }
    }
}

impl fmt::Display for StoreFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreFormat::Json => write!(f, "json"),
            StoreFormat::Cvat => write!(f, "cvat"),
        }
    }
}

/// Everything a decoded document carries
///
/// Settings the format does not keep are `None` and leave the store ones untouched.
///
#[derive(Clone, Debug, Default)]
pub struct StoreContents {
    pub max_disappeared: Option<usize>,
    pub interpolation: Option<bool>,
    pub video: VideoMeta,
    pub records: Vec<TrackRecord>,
}
