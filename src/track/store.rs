use crate::track::format::{cvat, json, StoreContents, StoreFormat};
use crate::track::notify::{ChangeNotifier, NoopNotifier, StoreChange};
use crate::track::{TrackEntry, TrackRecord, VideoMeta};
use crate::trackers::centroid::binder::DecoratedIdentity;
use anyhow::{Context, Result};
use log::{info, warn};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Builder for the track store
pub mod builder;


/// Per-identity history of a tracking run
///
/// Records are appended frame by frame, short gaps in boxes are filled by
/// interpolation, and records whose identity expired are either trimmed
/// (refined) or dropped by `prune`.
///
#[derive(Debug, Clone)]
pub struct TrackStore<N = NoopNotifier>
where
    N: ChangeNotifier,
{
    max_disappeared: usize,
    interpolation: bool,
    video: VideoMeta,
    records: BTreeMap<u64, TrackRecord>,
    notifier: N,
}

impl<N> TrackStore<N>
where
    N: ChangeNotifier,
{
    /// Creates a new store, see `TrackStoreBuilder` for the defaults
    ///
    /// # Parameters
    /// * `max_disappeared` - the number of frames an identity may stay unseen, must match the tracker one
    /// * `interpolation` - fill the boxes of the frames the identity was only predicted on
    /// * `video` - metadata written to the documents
    /// * `notifier` - receives the store changes
    ///
    pub fn new(max_disappeared: usize, interpolation: bool, video: VideoMeta, notifier: N) -> Self {
        Self {
            max_disappeared,
            interpolation,
            video,
            records: BTreeMap::default(),
            notifier,
        }
    }

    pub fn max_disappeared(&self) -> usize {
        self.max_disappeared
    }

    pub fn interpolation(&self) -> bool {
        self.interpolation
    }

    pub fn video(&self) -> &VideoMeta {
        &self.video
    }

    pub fn set_video(&mut self, video: VideoMeta) {
        self.video = video;
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    pub fn notifier_mut(&mut self) -> &mut N {
        &mut self.notifier
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, track_id: u64) -> Option<&TrackRecord> {
        self.records.get(&track_id)
    }

    /// Records in ascending identity order
    ///
    pub fn records(&self) -> impl Iterator<Item = &TrackRecord> + '_ {
        self.records.values()
    }

    /// Identities of the refined records
    ///
    pub fn refined(&self) -> impl Iterator<Item = u64> + '_ {
        self.records
            .values()
            .filter(|r| r.is_refined())
            .map(|r| r.track_id())
    }

    pub fn is_refined(&self, track_id: u64) -> bool {
        self.records
            .get(&track_id)
            .map(|r| r.is_refined())
            .unwrap_or(false)
    }

    /// Appends the observation of the identity on the frame
    ///
    /// The record is created on the first observation with the label and the
    /// color of the identity. A frame index that is not after the last one of
    /// the record is rejected and leaves the record untouched.
    ///
    pub fn append(&mut self, frame_index: usize, identity: &DecoratedIdentity) -> Result<()> {
        let track_id = identity.identity;
        let created = !self.records.contains_key(&track_id);

        let record = self.records.entry(track_id).or_insert_with(|| {
            TrackRecord::new(
                track_id,
                identity.color,
                identity.label().map(String::from),
            )
        });

        let pushed = record.push(TrackEntry::new(
            frame_index,
            identity.position,
            identity.bbox(),
        ));

        if let Err(e) = pushed {
            if created {
                self.records.remove(&track_id);
            }
            return Err(e);
        }

        let filled = if self.interpolation {
            record.track_missed_boxes()
        } else {
            0
        };

        if created {
            self.notifier.send(StoreChange::Created(track_id));
        }
        if filled > 0 {
            self.notifier.send(StoreChange::Interpolated {
                track_id,
                frames: filled,
            });
        }
        Ok(())
    }

    /// Refines or drops the records whose identity has been unseen for more
    /// than `max_disappeared` frames at `current_frame`
    ///
    /// A long enough record loses its trailing `max_disappeared` entries, the
    /// ones the tracker only predicted, and is exempt from pruning afterwards.
    /// A shorter one is removed.
    ///
    pub fn prune(&mut self, current_frame: usize) {
        let md = self.max_disappeared;
        let expired = self
            .records
            .values()
            .filter(|r| !r.is_refined())
            .filter(|r| match r.last_frame() {
                Some(last) => current_frame.saturating_sub(last) > md,
                None => true,
            })
            .map(|r| r.track_id())
            .collect::<Vec<_>>();

        for track_id in expired {
            let long_enough = self
                .records
                .get(&track_id)
                .map(|r| r.len() > md * 2)
                .unwrap_or(false);

            if long_enough {
                if let Some(record) = self.records.get_mut(&track_id) {
                    record.refine(md);
                    info!(
                        "Track {} refined to {} entries at frame {}",
                        track_id,
                        record.len(),
                        current_frame
                    );
                }
                self.notifier.send(StoreChange::Refined(track_id));
            } else {
                self.records.remove(&track_id);
                info!(
                    "Track {} dropped as too short at frame {}",
                    track_id, current_frame
                );
                self.notifier.send(StoreChange::Dropped(track_id));
            }
        }
    }

    /// Removes every record
    ///
    pub fn reset(&mut self) {
        self.records.clear();
    }

    /// Replaces the contents of the store with a decoded document
    ///
    /// When several records share a track id, the last one is kept.
    ///
    pub fn replace(&mut self, contents: StoreContents) {
        if let Some(md) = contents.max_disappeared {
            self.max_disappeared = md;
        }
        if let Some(interpolation) = contents.interpolation {
            self.interpolation = interpolation;
        }
        self.video = contents.video;
        self.records.clear();
        for record in contents.records {
            let track_id = record.track_id();
            if self.records.insert(track_id, record).is_some() {
                warn!("Track {} is repeated, the earlier record is replaced", track_id);
            }
        }
    }

    pub fn to_document(&self, format: StoreFormat) -> Result<String> {
        match format {
            StoreFormat::Json => json::encode(self),
            StoreFormat::Cvat => cvat::encode(self),
        }
    }

    /// Loads the document into the store
    ///
    /// The store is left unchanged when the document is rejected.
    ///
    pub fn from_document(&mut self, document: &str, format: StoreFormat) -> Result<()> {
        let contents = match format {
            StoreFormat::Json => json::decode(document)?,
            StoreFormat::Cvat => cvat::decode(document)?,
        };
        self.replace(contents);
        Ok(())
    }

    pub fn save<P: AsRef<Path>>(&self, path: P, format: StoreFormat) -> Result<()> {
        let path = path.as_ref();
        let document = self.to_document(format)?;
        fs::write(path, document)
            .with_context(|| format!("Unable to write {} document {}", format, path.display()))
    }

    pub fn load<P: AsRef<Path>>(&mut self, path: P, format: StoreFormat) -> Result<()> {
        let path = path.as_ref();
        let document = fs::read_to_string(path)
            .with_context(|| format!("Unable to read {} document {}", format, path.display()))?;
        self.from_document(&document, format)
            .with_context(|| format!("Unable to load {}", path.display()))
    }
}
