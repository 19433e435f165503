use crate::track::format::StoreContents;
use crate::track::notify::ChangeNotifier;
use crate::track::store::TrackStore;
use crate::track::{TrackEntry, TrackRecord, VideoMeta};
use crate::utils::bbox::{BBox, Position};
use crate::utils::palette::Color;
use crate::Errors;
use anyhow::{Context, Result};
use itertools::izip;
use log::warn;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Serialize, Deserialize)]
struct Document {
    max_disappeared: Option<usize>,
    interpolation: Option<bool>,
    video_name: Option<String>,
    video_size: Option<usize>,
    video_width: Option<u32>,
    video_height: Option<u32>,
    #[serde(default)]
    tracks: BTreeMap<u64, TrackDocument>,
    #[serde(default)]
    refined: Vec<u64>,
}

#[derive(Debug, Serialize, Deserialize)]
struct TrackDocument {
    object_id: u64,
    color: Color,
    label: Option<String>,
    centroids: Vec<Position>,
    boxes: Vec<Option<BBox>>,
    indices: Vec<usize>,
    interpolated: Vec<bool>,
    #[serde(default)]
    missed_boxes: usize,
}

impl From<&TrackRecord> for TrackDocument {
    fn from(r: &TrackRecord) -> Self {
        Self {
            object_id: r.track_id(),
            color: r.color(),
            label: r.label().map(String::from),
            centroids: r.positions().collect(),
            boxes: r.boxes().collect(),
            indices: r.frame_indices().collect(),
            interpolated: r.entries().iter().map(|e| e.interpolated).collect(),
            missed_boxes: r.missed_boxes(),
        }
    }
}

impl TrackDocument {
    fn into_record(self, refined: bool) -> Result<TrackRecord> {
        let len = self.indices.len();
        if self.centroids.len() != len || self.boxes.len() != len || self.interpolated.len() != len
        {
            return Err(Errors::MalformedDocument(format!(
                "track {} has {} centroids, {} boxes, {} indices and {} interpolation flags",
                self.object_id,
                self.centroids.len(),
                self.boxes.len(),
                len,
                self.interpolated.len()
            ))
            .into());
        }

        let entries = izip!(self.indices, self.centroids, self.boxes, self.interpolated)
            .map(|(frame_index, position, bbox, interpolated)| TrackEntry {
                frame_index,
                position,
                bbox,
                interpolated,
            })
            .collect();

        TrackRecord::from_entries(
            self.object_id,
            self.color,
            self.label,
            entries,
            self.missed_boxes,
            refined,
        )
    }
}

pub fn encode<N: ChangeNotifier>(store: &TrackStore<N>) -> Result<String> {
    let video = store.video();
    let doc = Document {
        max_disappeared: Some(store.max_disappeared()),
        interpolation: Some(store.interpolation()),
        video_name: video.name.clone(),
        video_size: video.size,
        video_width: video.width,
        video_height: video.height,
        tracks: store
            .records()
            .map(|r| (r.track_id(), TrackDocument::from(r)))
            .collect(),
        refined: store.refined().collect(),
    };
    serde_json::to_string(&doc).context("Unable to serialize the track store to JSON")
}

pub fn decode(document: &str) -> Result<StoreContents> {
    let doc: Document =
        serde_json::from_str(document).context("Unable to parse the JSON track document")?;

    let refined: BTreeSet<u64> = doc.refined.into_iter().collect();
    let mut records = Vec::with_capacity(doc.tracks.len());
    for (key, track) in doc.tracks {
        if key != track.object_id {
            return Err(Errors::MalformedDocument(format!(
                "track stored under {} has object id {}",
                key, track.object_id
            ))
            .into());
        }
        let is_refined = refined.contains(&key);
        records.push(track.into_record(is_refined)?);
    }

    for id in refined
        .iter()
        .filter(|id| !records.iter().any(|r| r.track_id() == **id))
    {
        warn!("Refined track {} is absent from the document, skipped", id);
    }

    Ok(StoreContents {
        max_disappeared: doc.max_disappeared,
        interpolation: doc.interpolation,
        video: VideoMeta {
            name: doc.video_name,
            size: doc.video_size,
            width: doc.video_width,
            height: doc.video_height,
        },
        records,
    })
}
