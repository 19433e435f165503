use crate::session;
use crate::track;
use crate::trackers;
use crate::utils;

pub use session::TrackingSession;
pub use track::format::StoreFormat;
pub use track::notify::{ChangeLog, ChangeNotifier, NoopNotifier, StoreChange};
pub use track::store::builder::TrackStoreBuilder;
pub use track::store::TrackStore;
pub use track::{TrackEntry, TrackRecord, VideoMeta};
pub use trackers::centroid::binder::{bind, DecoratedIdentity, Detection, DetectionPayload};
pub use trackers::centroid::{CentroidTracker, TrackerOptions, UnmatchedPolicy};
pub use utils::bbox::{BBox, Position};
pub use utils::palette::Color;
