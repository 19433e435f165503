use crate::trackers::centroid::predictor::MotionPredictor;
use crate::utils::bbox::Position;
use crate::utils::linear_sum_assignment::{euclidean_cost_matrix, linear_sum_assignment};
use crate::utils::palette::{color_for, Color};
use crate::Errors;
use anyhow::Result;
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Attaches detection payloads to the tracked identities
pub mod binder;

/// Anchored Kalman motion predictor
pub mod predictor;

/// Frames an identity may stay unmatched by default
pub const DEFAULT_MAX_DISAPPEARED: usize = 40;

/// Default maximum leap in pixels between frames
pub const DEFAULT_MAX_DISTANCE: f64 = 200.0;

/// What happens with the rows and columns left without an accepted match
///
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnmatchedPolicy {
    /// When identities outnumber or equal detections, only the identities are aged,
    /// otherwise only the detections become new identities
    #[default]
    Branching,
    /// Unmatched identities are aged and unmatched detections become new identities
    /// on every frame
    Independent,
}

/// Centroid tracker configuration
///
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerOptions {
    /// How many consecutive frames an identity survives without a match
    pub max_disappeared: usize,
    /// Matches farther than this distance are rejected
    pub max_distance: f64,
    pub unmatched_policy: UnmatchedPolicy,
}

impl Default for TrackerOptions {
    fn default() -> Self {
        Self {
            max_disappeared: DEFAULT_MAX_DISAPPEARED,
            max_distance: DEFAULT_MAX_DISTANCE,
            unmatched_policy: UnmatchedPolicy::default(),
        }
    }
}

impl TrackerOptions {
    pub fn new(max_disappeared: usize, max_distance: f64) -> Self {
        Self {
            max_disappeared,
            max_distance,
            ..Default::default()
        }
    }

    pub fn unmatched_policy(mut self, policy: UnmatchedPolicy) -> Self {
        self.unmatched_policy = policy;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !self.max_distance.is_finite() || self.max_distance < 0.0 {
            return Err(Errors::InvalidMaxDistance(self.max_distance).into());
        }
        Ok(())
    }
}

/// Live identity held by the tracker
///
#[derive(Debug, Clone)]
pub struct TrackedIdentity {
    identity: u64,
    position: Position,
    disappeared: usize,
    predictor: MotionPredictor,
    color: Color,
}

impl TrackedIdentity {
    fn new(identity: u64, position: Position) -> Self {
        Self {
            identity,
            position,
            disappeared: 0,
            predictor: MotionPredictor::default(),
            color: color_for(identity),
        }
    }

    pub fn identity(&self) -> u64 {
        self.identity
    }

    /// Matched detection or the predicted position when not matched
    pub fn position(&self) -> Position {
        self.position
    }

    /// Consecutive frames without a match
    pub fn disappeared(&self) -> usize {
        self.disappeared
    }

    pub fn predictor(&self) -> &MotionPredictor {
        &self.predictor
    }

    pub fn color(&self) -> Color {
        self.color
    }
}

/// Live identity positions and colors
pub type TrackerOutput = (BTreeMap<u64, Position>, BTreeMap<u64, Color>);

/// Tracker that keeps identities of objects by their centroids
///
/// Every update predicts the position of each identity, solves the optimal
/// assignment between predictions and detected centroids, then creates and
/// expires identities according to the [`UnmatchedPolicy`].
///
#[derive(Debug)]
pub struct CentroidTracker {
    opts: TrackerOptions,
    identities: BTreeMap<u64, TrackedIdentity>,
    next_identity: u64,
}

impl CentroidTracker {
    /// Creates new tracker
    ///
    /// # Parameters
    /// * `opts` - tracker options, `max_distance` must be finite and non-negative
    ///
    pub fn new(opts: TrackerOptions) -> Result<Self> {
        opts.validate()?;
        Ok(Self {
            opts,
            identities: BTreeMap::default(),
            next_identity: 1,
        })
    }

    pub fn options(&self) -> &TrackerOptions {
        &self.opts
    }

    pub fn len(&self) -> usize {
        self.identities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.identities.is_empty()
    }

    /// Identity the next created object receives
    pub fn next_identity(&self) -> u64 {
        self.next_identity
    }

    pub fn get(&self, identity: u64) -> Option<&TrackedIdentity> {
        self.identities.get(&identity)
    }

    /// Live identities in creation order
    pub fn identities(&self) -> impl Iterator<Item = &TrackedIdentity> {
        self.identities.values()
    }

    /// Drops all identities and restarts the numbering
    pub fn reset(&mut self) {
        self.identities.clear();
        self.next_identity = 1;
    }

    /// Processes the centroids detected on the next frame
    ///
    /// # Parameters
    /// * `detections` - detected centroids in the detector order
    ///
    /// Returns positions and colors of all live identities.
    ///
    pub fn update(&mut self, detections: &[Position]) -> TrackerOutput {
        for tracked in self.identities.values_mut() {
            tracked.position = tracked.predictor.predict(tracked.position);
        }

        if detections.is_empty() {
            let identities = self.identities.keys().copied().collect::<Vec<_>>();
            for identity in identities {
                self.miss(identity);
            }
            return self.output();
        }

        if self.identities.is_empty() {
            for d in detections {
                self.add(*d);
            }
            return self.output();
        }

        let (identities, positions): (Vec<_>, Vec<_>) = self
            .identities
            .iter()
            .map(|(identity, tracked)| (*identity, tracked.position))
            .unzip();

        let costs = match euclidean_cost_matrix(&positions, detections) {
            Some(costs) => costs,
            None => return self.output(),
        };
        let mut used_rows = BTreeSet::new();
        let mut used_cols = BTreeSet::new();

        for (row, col) in linear_sum_assignment(&costs) {
            if costs[(row, col)] > self.opts.max_distance {
                continue;
            }

            if let Some(tracked) = self.identities.get_mut(&identities[row]) {
                tracked.position = detections[col];
                tracked.disappeared = 0;
            }
            used_rows.insert(row);
            used_cols.insert(col);
        }

        let unused_rows = (0..identities.len())
            .filter(|r| !used_rows.contains(r))
            .collect::<Vec<_>>();
        let unused_cols = (0..detections.len())
            .filter(|c| !used_cols.contains(c))
            .collect::<Vec<_>>();

        let (age_rows, add_cols) = match self.opts.unmatched_policy {
            UnmatchedPolicy::Branching => {
                let rows_dominate = identities.len() >= detections.len();
                (rows_dominate, !rows_dominate)
            }
            UnmatchedPolicy::Independent => (true, true),
        };

        if age_rows {
            for row in unused_rows {
                self.miss(identities[row]);
            }
        }

        if add_cols {
            for col in unused_cols {
                self.add(detections[col]);
            }
        }

        self.output()
    }

    fn add(&mut self, position: Position) -> u64 {
        let identity = self.next_identity;
        self.next_identity += 1;
        debug!("Identity {} created at {:?}", identity, position);
        self.identities
            .insert(identity, TrackedIdentity::new(identity, position));
        identity
    }

    fn delete(&mut self, identity: u64) {
        if self.identities.remove(&identity).is_some() {
            debug!("Identity {} expired", identity);
        }
    }

    fn miss(&mut self, identity: u64) {
        if let Some(tracked) = self.identities.get_mut(&identity) {
            tracked.disappeared += 1;
            if tracked.disappeared > self.opts.max_disappeared {
                self.delete(identity);
            }
        }
    }

    fn output(&self) -> TrackerOutput {
        self.identities
            .iter()
            .map(|(identity, tracked)| ((*identity, tracked.position), (*identity, tracked.color)))
            .unzip()
    }
}
