use crate::trackers::centroid::binder::{DecoratedIdentity, Detection, DetectionPayload};
use crate::utils::bbox::{BBox, Position};
use crate::utils::palette::color_for;
use rand::distributions::Uniform;
use rand::prelude::ThreadRng;
use rand::Rng;

/// Random walk of a bounding box with integer steps
///
pub struct BoxWalk {
    x: i64,
    y: i64,
    width: i64,
    height: i64,
    gen: ThreadRng,
    dist_pos: Uniform<i64>,
    dist_box: Uniform<i64>,
}

impl BoxWalk {
    pub fn new(x: i64, y: i64, width: i64, height: i64, pos_drift: i64, box_drift: i64) -> Self {
        Self {
            x,
            y,
            width,
            height,
            gen: rand::thread_rng(),
            dist_pos: Uniform::new_inclusive(-pos_drift, pos_drift),
            dist_box: Uniform::new_inclusive(-box_drift, box_drift),
        }
    }
}

impl Iterator for BoxWalk {
    type Item = BBox;

    fn next(&mut self) -> Option<Self::Item> {
        self.x += self.gen.sample(&self.dist_pos);
        self.y += self.gen.sample(&self.dist_pos);
        self.width = (self.width + self.gen.sample(&self.dist_box)).max(4);
        self.height = (self.height + self.gen.sample(&self.dist_box)).max(4);

        Some(BBox::new(
            self.x,
            self.y,
            self.x + self.width,
            self.y + self.height,
        ))
    }
}

/// Labeled detections of a random walk
///
pub fn walk_detections(walk: &mut BoxWalk, label: &str, frames: usize) -> Vec<Detection> {
    walk.take(frames)
        .map(|b| Detection::from_bbox(b).label(label))
        .collect()
}

/// Identity as the binder outputs it, coasting when `bbox` is `None`
///
pub fn observed(identity: u64, position: Position, bbox: Option<BBox>) -> DecoratedIdentity {
    DecoratedIdentity {
        identity,
        position,
        color: color_for(identity),
        payload: bbox.map(|b| DetectionPayload {
            bbox: Some(b),
            ..Default::default()
        }),
    }
}

/// Same as `observed` with a label on the payload
///
pub fn observed_labeled(
    identity: u64,
    position: Position,
    bbox: Option<BBox>,
    label: &str,
) -> DecoratedIdentity {
    let mut o = observed(identity, position, bbox);
    if let Some(p) = o.payload.as_mut() {
        p.label = Some(label.to_string());
    }
    o
}

pub fn init_logs() {
    let _ = env_logger::builder().is_test(true).try_init();
}
