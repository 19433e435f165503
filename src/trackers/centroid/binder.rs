use crate::utils::bbox::{BBox, Position};
use crate::utils::palette::{color_for, Color};
use log::debug;
use std::collections::BTreeMap;

/// Detector metadata that rides along with the identity
///
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DetectionPayload {
    pub bbox: Option<BBox>,
    pub confidence: Option<f32>,
    pub label: Option<String>,
}

/// Detected object: the centroid used for association and its payload
///
#[derive(Clone, Debug, PartialEq)]
pub struct Detection {
    pub position: Position,
    pub payload: DetectionPayload,
}

impl Detection {
    pub fn new(position: Position, payload: DetectionPayload) -> Self {
        Self { position, payload }
    }

    /// Detection positioned at the centroid of the box
    ///
    pub fn from_bbox(bbox: BBox) -> Self {
        Self {
            position: bbox.centroid(),
            payload: DetectionPayload {
                bbox: Some(bbox),
                ..Default::default()
            },
        }
    }

    pub fn confidence(mut self, confidence: f32) -> Self {
        self.payload.confidence = Some(confidence);
        self
    }

    pub fn label(mut self, label: &str) -> Self {
        self.payload.label = Some(label.to_string());
        self
    }
}

/// Live identity with the payload of the detection it was matched to
///
#[derive(Clone, Debug, PartialEq)]
pub struct DecoratedIdentity {
    pub identity: u64,
    pub position: Position,
    pub color: Color,
    /// `None` when the identity is coasting on prediction alone
    pub payload: Option<DetectionPayload>,
}

impl DecoratedIdentity {
    pub fn bbox(&self) -> Option<BBox> {
        self.payload.as_ref().and_then(|p| p.bbox)
    }

    pub fn label(&self) -> Option<&str> {
        self.payload.as_ref().and_then(|p| p.label.as_deref())
    }

    pub fn confidence(&self) -> Option<f32> {
        self.payload.as_ref().and_then(|p| p.confidence)
    }
}

/// Matches tracker positions back to the detections of the frame
///
/// An identity receives the payload of the first detection whose position is
/// exactly equal to its own one.
///
pub fn bind(
    identities: &BTreeMap<u64, Position>,
    colors: &BTreeMap<u64, Color>,
    detections: &[Detection],
) -> Vec<DecoratedIdentity> {
    identities
        .iter()
        .map(|(identity, position)| {
            let payload = detections
                .iter()
                .find(|d| d.position == *position)
                .map(|d| d.payload.clone());

            if payload.is_none() {
                debug!(
                    "Identity {} has no detection at {:?}, coasting",
                    identity, position
                );
            }

            DecoratedIdentity {
                identity: *identity,
                position: *position,
                color: colors
                    .get(identity)
                    .copied()
                    .unwrap_or_else(|| color_for(*identity)),
                payload,
            }
        })
        .collect()
}
