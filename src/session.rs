use crate::track::notify::{ChangeNotifier, NoopNotifier};
use crate::track::store::builder::TrackStoreBuilder;
use crate::track::store::TrackStore;
use crate::trackers::centroid::binder::{bind, DecoratedIdentity, Detection};
use crate::trackers::centroid::{CentroidTracker, TrackerOptions};
use crate::utils::bbox::Position;
use anyhow::Result;
use log::warn;

/// One tracking run over a video
///
/// Every call of `process` handles the next frame: the tracker associates
/// the detected centroids, the binder attaches the detection payloads, the
/// store records every live identity and prunes the expired ones.
///
pub struct TrackingSession<N = NoopNotifier>
where
    N: ChangeNotifier,
{
    tracker: CentroidTracker,
    store: TrackStore<N>,
    frame: usize,
}

impl TrackingSession<NoopNotifier> {
    /// Creates a session with a store that shares `max_disappeared` with the tracker
    ///
    pub fn new(opts: TrackerOptions) -> Result<Self> {
        let store = TrackStoreBuilder::new(opts.max_disappeared).build();
        Self::with_store(opts, store)
    }
}

impl<N> TrackingSession<N>
where
    N: ChangeNotifier,
{
    pub fn with_store(opts: TrackerOptions, store: TrackStore<N>) -> Result<Self> {
        if store.max_disappeared() != opts.max_disappeared {
            warn!(
                "Store prunes after {} frames while identities expire after {}",
                store.max_disappeared(),
                opts.max_disappeared
            );
        }
        Ok(Self {
            tracker: CentroidTracker::new(opts)?,
            store,
            frame: 0,
        })
    }

    /// Index of the frame the next `process` call handles
    ///
    pub fn frame(&self) -> usize {
        self.frame
    }

    pub fn tracker(&self) -> &CentroidTracker {
        &self.tracker
    }

    pub fn store(&self) -> &TrackStore<N> {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut TrackStore<N> {
        &mut self.store
    }

    pub fn into_store(self) -> TrackStore<N> {
        self.store
    }

    /// Handles the detections of the next frame
    ///
    /// Returns every live identity, decorated with the payload of its detection
    /// when it was matched on this frame.
    ///
    /// The frame is completed even when an identity cannot be recorded: the
    /// other identities are appended, the store is pruned and the session moves
    /// to the next frame before the first append error is returned.
    ///
    pub fn process(&mut self, detections: &[Detection]) -> Result<Vec<DecoratedIdentity>> {
        let centroids = detections.iter().map(|d| d.position).collect::<Vec<Position>>();
        let (positions, colors) = self.tracker.update(&centroids);
        let decorated = bind(&positions, &colors, detections);

        let mut failure = None;
        for identity in &decorated {
            if let Err(e) = self.store.append(self.frame, identity) {
                warn!("Identity {} not recorded: {}", identity.identity, e);
                failure.get_or_insert(e);
            }
        }
        self.store.prune(self.frame);
        self.frame += 1;

        match failure {
            Some(e) => Err(e),
            None => Ok(decorated),
        }
    }

    /// Starts over: no identities, no records, frame zero
    ///
    pub fn reset(&mut self) {
        self.tracker.reset();
        self.store.reset();
        self.frame = 0;
    }
}
