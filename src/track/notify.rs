/// Changes of the track store a notifier is told about
///
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StoreChange {
    /// The first entry of the identity was appended
    Created(u64),
    /// A gap of `frames` entries was filled by interpolation
    Interpolated { track_id: u64, frames: usize },
    /// The trailing entries of the record were trimmed
    Refined(u64),
    /// The record was too short to keep
    Dropped(u64),
}

impl StoreChange {
    pub fn track_id(&self) -> u64 {
        match self {
            StoreChange::Created(id) | StoreChange::Refined(id) | StoreChange::Dropped(id) => *id,
            StoreChange::Interpolated { track_id, .. } => *track_id,
        }
    }
}

pub trait ChangeNotifier: Default + Clone {
    fn send(&mut self, change: StoreChange);
}

#[derive(Default, Clone, Debug)]
pub struct NoopNotifier;

impl ChangeNotifier for NoopNotifier {
    fn send(&mut self, _change: StoreChange) {}
}

/// Notifier that keeps every change, handy to inspect what a frame did
///
#[derive(Default, Clone, Debug)]
pub struct ChangeLog {
    changes: Vec<StoreChange>,
}

impl ChangeLog {
    pub fn changes(&self) -> &[StoreChange] {
        &self.changes
    }

    /// Returns the collected changes and starts over
    ///
    pub fn drain(&mut self) -> Vec<StoreChange> {
        std::mem::take(&mut self.changes)
    }
}

impl ChangeNotifier for ChangeLog {
    fn send(&mut self, change: StoreChange) {
        self.changes.push(change);
    }
}
