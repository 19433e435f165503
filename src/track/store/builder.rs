use crate::store::TrackStore;
use crate::track::notify::{ChangeNotifier, NoopNotifier};
use crate::track::VideoMeta;

/// Builder for TrackStore
///
pub struct TrackStoreBuilder<N = NoopNotifier>
where
    N: ChangeNotifier,
{
    max_disappeared: usize,
    interpolation: bool,
    video: Option<VideoMeta>,
    notifier: Option<N>,
}

/// Default builder
/// `max_disappeared` is set to the tracker default
///
impl<N> Default for TrackStoreBuilder<N>
where
    N: ChangeNotifier,
{
    fn default() -> TrackStoreBuilder<N> {
        Self::new(crate::trackers::centroid::DEFAULT_MAX_DISAPPEARED)
    }
}

impl<N> TrackStoreBuilder<N>
where
    N: ChangeNotifier,
{
    /// Creates a new builder
    ///
    /// # Parameters
    /// * `max_disappeared` - the number of frames an identity may stay unseen before its record is pruned, should be the same as the tracker uses.
    ///
    pub fn new(max_disappeared: usize) -> Self {
        TrackStoreBuilder {
            max_disappeared,
            interpolation: true,
            video: None,
            notifier: None,
        }
    }

    /// Enables or disables the interpolation of missed boxes, enabled by default
    ///
    pub fn interpolation(mut self, interpolation: bool) -> Self {
        self.interpolation = interpolation;
        self
    }

    /// Sets the video metadata written to the documents
    ///
    pub fn video(mut self, video: VideoMeta) -> Self {
        assert!(
            self.video.is_none(),
            "The method `video` must be called once."
        );
        self.video = Some(video);
        self
    }

    /// Sets the notifier object to use
    ///
    pub fn notifier(mut self, notifier: N) -> Self {
        assert!(
            self.notifier.is_none(),
            "The method `notifier` must be called once."
        );
        self.notifier = Some(notifier);
        self
    }

    /// Builds the TrackStore
    ///
    pub fn build(self) -> TrackStore<N> {
        TrackStore::new(
            self.max_disappeared,
            self.interpolation,
            self.video.unwrap_or_default(),
            self.notifier.unwrap_or_default(),
        )
    }
}
