use thiserror::Error;

/// Track records, the track store and its serialization formats
pub mod track;

/// Identity trackers
pub mod trackers;

/// Geometry, Kalman filtering and assignment primitives
pub mod utils;

/// Frame-by-frame session that glues the tracker and the store together
pub mod session;

/// Commonly used types
pub mod prelude;

#[cfg(test)]
pub(crate) mod test_stuff;

pub use track::store;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum Errors {
    #[error("Maximum distance must be a finite non-negative number, got {0}.")]
    InvalidMaxDistance(f64),
    #[error("Frame {frame} is not after the last frame {last} of track {track_id}.")]
    NonMonotonicFrame {
        track_id: u64,
        frame: usize,
        last: usize,
    },
    #[error("Format {0} is not supported.")]
    UnsupportedFormat(String),
    #[error("Malformed document: {0}")]
    MalformedDocument(String),
}
