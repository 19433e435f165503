use crate::track::format::StoreContents;
use crate::track::notify::ChangeNotifier;
use crate::track::store::TrackStore;
use crate::track::{TrackEntry, TrackRecord, VideoMeta};
use crate::utils::bbox::BBox;
use crate::utils::palette::color_for;
use crate::Errors;
use anyhow::{Context, Result};
use log::warn;
use quick_xml::se::Serializer;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

pub const CVAT_VERSION: &str = "1.1";

const XML_DECLARATION: &str = "<?xml version='1.0' encoding='UTF-8'?>\n";
const NO_LABEL: &str = "None";

#[derive(Debug, Serialize, Deserialize)]
struct AnnotationsXml {
    version: String,
    #[serde(default)]
    meta: MetaXml,
    #[serde(rename = "track", default)]
    tracks: Vec<TrackXml>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct MetaXml {
    #[serde(default)]
    task: TaskXml,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct TaskXml {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    size: Option<usize>,
    #[serde(default)]
    original_size: OriginalSizeXml,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    source: Option<String>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct OriginalSizeXml {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    height: Option<u32>,
}

#[derive(Debug, Serialize, Deserialize)]
struct TrackXml {
    #[serde(rename = "@id")]
    id: u64,
    #[serde(rename = "@label")]
    label: String,
    #[serde(rename = "@source", skip_serializing_if = "Option::is_none", default)]
    source: Option<String>,
    #[serde(rename = "box", default)]
    boxes: Vec<BoxXml>,
}

#[derive(Debug, Serialize, Deserialize)]
struct BoxXml {
    #[serde(rename = "@frame")]
    frame: usize,
    #[serde(rename = "@outside", default)]
    outside: u8,
    #[serde(rename = "@occluded", default)]
    occluded: u8,
    #[serde(rename = "@keyframe", default = "keyframe_default")]
    keyframe: u8,
    #[serde(rename = "@xtl")]
    xtl: String,
    #[serde(rename = "@ytl")]
    ytl: String,
    #[serde(rename = "@xbr")]
    xbr: String,
    #[serde(rename = "@ybr")]
    ybr: String,
    #[serde(rename = "@z_order", default)]
    z_order: i32,
}

fn keyframe_default() -> u8 {
    1
}

fn coordinate(track_id: u64, frame: usize, value: &str) -> Result<i64> {
    let parsed: f64 = value.trim().parse().map_err(|_| {
        Errors::MalformedDocument(format!(
            "box of track {} at frame {} has non-numeric coordinate {:?}",
            track_id, frame, value
        ))
    })?;
    if !parsed.is_finite() {
        return Err(Errors::MalformedDocument(format!(
            "box of track {} at frame {} has coordinate {}",
            track_id, frame, value
        ))
        .into());
    }
    Ok(parsed.trunc() as i64)
}

impl BoxXml {
    fn new(frame: usize, bbox: &BBox, interpolated: bool) -> Self {
        Self {
            frame,
            outside: 0,
            occluded: 0,
            keyframe: u8::from(!interpolated),
            xtl: format!("{:.2}", bbox.x_min as f64),
            ytl: format!("{:.2}", bbox.y_min as f64),
            xbr: format!("{:.2}", bbox.x_max as f64),
            ybr: format!("{:.2}", bbox.y_max as f64),
            z_order: 0,
        }
    }

    fn to_entry(&self, track_id: u64) -> Result<TrackEntry> {
        let bbox = BBox::new(
            coordinate(track_id, self.frame, &self.xtl)?,
            coordinate(track_id, self.frame, &self.ytl)?,
            coordinate(track_id, self.frame, &self.xbr)?,
            coordinate(track_id, self.frame, &self.ybr)?,
        );
        Ok(TrackEntry {
            frame_index: self.frame,
            position: bbox.centroid(),
            bbox: Some(bbox),
            interpolated: self.keyframe == 0,
        })
    }
}

impl TrackXml {
    /// `None` when the record has no box to write
    ///
    fn from_record(record: &TrackRecord) -> Option<Self> {
        let mut boxes = record
            .entries()
            .iter()
            .filter_map(|e| e.bbox.map(|b| BoxXml::new(e.frame_index, &b, e.interpolated)))
            .collect::<Vec<_>>();

        boxes.last_mut()?.outside = 1;

        Some(Self {
            id: record.track_id(),
            label: record.label().unwrap_or(NO_LABEL).to_string(),
            source: Some("manual".into()),
            boxes,
        })
    }

    fn into_record(self) -> Result<TrackRecord> {
        let entries = self
            .boxes
            .iter()
            .map(|b| b.to_entry(self.id))
            .collect::<Result<Vec<_>>>()?;
        let label = if self.label == NO_LABEL {
            None
        } else {
            Some(self.label)
        };
        TrackRecord::from_entries(self.id, color_for(self.id), label, entries, 0, true)
    }
}

pub fn encode<N: ChangeNotifier>(store: &TrackStore<N>) -> Result<String> {
    let video = store.video();
    let doc = AnnotationsXml {
        version: CVAT_VERSION.into(),
        meta: MetaXml {
            task: TaskXml {
                size: video.size,
                original_size: OriginalSizeXml {
                    width: video.width,
                    height: video.height,
                },
                source: video.name.clone(),
            },
        },
        tracks: store.records().filter_map(TrackXml::from_record).collect(),
    };

    let mut buf = String::from(XML_DECLARATION);
    let mut ser = Serializer::with_root(&mut buf, Some("annotations"))
        .context("Unable to create the CVAT serializer")?;
    ser.indent(' ', 2);
    doc.serialize(ser)
        .context("Unable to serialize the track store to CVAT XML")?;
    buf.push('\n');
    Ok(buf)
}

pub fn decode(document: &str) -> Result<StoreContents> {
    let doc: AnnotationsXml =
        quick_xml::de::from_str(document).context("Unable to parse the CVAT document")?;

    if doc.version.trim() != CVAT_VERSION {
        warn!(
            "CVAT document version is {}, expected {}",
            doc.version.trim(),
            CVAT_VERSION
        );
    }

    let mut records = Vec::with_capacity(doc.tracks.len());
    let mut seen = BTreeSet::new();
    for track in doc.tracks {
        if !seen.insert(track.id) {
            return Err(Errors::MalformedDocument(format!(
                "track id {} appears more than once",
                track.id
            ))
            .into());
        }
        if track.boxes.is_empty() {
            warn!("CVAT track {} has no boxes, skipped", track.id);
            continue;
        }
        records.push(track.into_record()?);
    }

    let task = doc.meta.task;
    Ok(StoreContents {
        max_disappeared: None,
        interpolation: None,
        video: VideoMeta {
            name: task.source,
            size: task.size,
            width: task.original_size.width,
            height: task.original_size.height,
        },
        records,
    })
}

#[cfg(test)]
mod tests {
    use crate::track::format::cvat::{decode, encode};
    use crate::track::store::builder::TrackStoreBuilder;
    use crate::track::store::TrackStore;
    use crate::track::VideoMeta;
    use crate::trackers::centroid::binder::{DecoratedIdentity, DetectionPayload};
    use crate::utils::bbox::{BBox, Position};
    use crate::utils::palette::color_for;
    use crate::Errors;

    const DOCUMENT: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<annotations>
  <version>1.1</version>
  <meta>
    <task>
      <id>17</id>
      <name>herd</name>
      <size>300</size>
      <original_size>
        <width>1280</width>
        <height>720</height>
      </original_size>
      <source>herd.mp4</source>
    </task>
    <dumped>2023-05-01 10:00:00</dumped>
  </meta>
  <track id="4" label="giraffe" source="manual">
    <box frame="10" outside="0" occluded="0" keyframe="1" xtl="10.75" ytl="20.20" xbr="41.99" ybr="61.00" z_order="0">
      <attribute name="behavior">grazing</attribute>
    </box>
    <box frame="11" outside="0" occluded="0" keyframe="0" xtl="12.00" ytl="22.00" xbr="44.00" ybr="64.00" z_order="0"/>
    <box frame="12" outside="1" occluded="0" keyframe="1" xtl="14.00" ytl="24.00" xbr="46.00" ybr="66.00" z_order="0"/>
  </track>
  <track id="5" label="None" source="manual">
    <box frame="3" outside="1" occluded="0" keyframe="1" xtl="0.00" ytl="0.00" xbr="10.00" ybr="10.00" z_order="0"/>
  </track>
  <track id="6" label="zebra" source="manual">
  </track>
</annotations>
"#;

    #[test]
    fn decode_document() {
        let contents = decode(DOCUMENT).unwrap();
        assert_eq!(contents.max_disappeared, None);
        assert_eq!(contents.interpolation, None);
        assert_eq!(
            contents.video,
            VideoMeta {
                name: Some("herd.mp4".into()),
                size: Some(300),
                width: Some(1280),
                height: Some(720),
            }
        );

        assert_eq!(contents.records.len(), 2);
        let giraffe = &contents.records[0];
        assert_eq!(giraffe.track_id(), 4);
        assert_eq!(giraffe.label(), Some("giraffe"));
        assert_eq!(giraffe.color(), color_for(4));
        assert!(giraffe.is_refined());
        assert_eq!(giraffe.missed_boxes(), 0);
        assert_eq!(giraffe.frame_indices().collect::<Vec<_>>(), vec![10, 11, 12]);
        assert_eq!(giraffe.entries()[0].bbox, Some(BBox::new(10, 20, 41, 61)));
        assert_eq!(giraffe.entries()[0].position, Position::new(25, 40));
        assert!(!giraffe.entries()[0].interpolated);
        assert!(giraffe.entries()[1].interpolated);

        let unlabeled = &contents.records[1];
        assert_eq!(unlabeled.track_id(), 5);
        assert_eq!(unlabeled.label(), None);
    }

    #[test]
    fn duplicate_track_id() {
        let doc = DOCUMENT.replace("<track id=\"5\"", "<track id=\"4\"");
        let err = decode(&doc).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<Errors>(),
            Some(Errors::MalformedDocument(_))
        ));
    }

    #[test]
    fn non_numeric_coordinate() {
        let doc = DOCUMENT.replace("xtl=\"12.00\"", "xtl=\"twelve\"");
        let err = decode(&doc).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<Errors>(),
            Some(Errors::MalformedDocument(_))
        ));
    }

    #[test]
    fn unordered_frames() {
        let doc = DOCUMENT.replace("frame=\"12\"", "frame=\"9\"");
        assert!(decode(&doc).is_err());
    }

    #[test]
    fn not_xml() {
        assert!(decode("{\"tracks\": {}}").is_err());
    }

    #[test]
    fn encode_layout() {
        let mut store: TrackStore = TrackStoreBuilder::new(2)
            .video(VideoMeta {
                name: Some("herd.mp4".into()),
                size: Some(10),
                width: Some(640),
                height: Some(480),
            })
            .build();

        let seen = |identity: u64, bbox: Option<BBox>, label: Option<&str>| DecoratedIdentity {
            identity,
            position: bbox.map(|b| b.centroid()).unwrap_or_default(),
            color: color_for(identity),
            payload: bbox.map(|b| DetectionPayload {
                bbox: Some(b),
                label: label.map(String::from),
                ..Default::default()
            }),
        };

        store
            .append(0, &seen(1, Some(BBox::new(0, 0, 10, 10)), Some("zebra")))
            .unwrap();
        store.append(1, &seen(1, None, None)).unwrap();
        store
            .append(2, &seen(1, Some(BBox::new(20, 20, 30, 30)), Some("zebra")))
            .unwrap();
        store.append(3, &seen(1, None, None)).unwrap();
        store
            .append(3, &seen(2, Some(BBox::new(1, 2, 3, 4)), None))
            .unwrap();
        store.append(4, &seen(3, None, None)).unwrap();

        let xml = encode(&store).unwrap();
        assert!(xml.starts_with("<?xml version='1.0' encoding='UTF-8'?>\n"));
        assert!(xml.contains("<annotations>"));
        assert!(xml.contains("<version>1.1</version>"));
        assert!(xml.contains("<size>10</size>"));
        assert!(xml.contains("<width>640</width>"));
        assert!(xml.contains("<height>480</height>"));
        assert!(xml.contains("<source>herd.mp4</source>"));
        assert!(xml.contains(r#"<track id="1" label="zebra" source="manual">"#));
        assert!(xml.contains(
            r#"<box frame="0" outside="0" occluded="0" keyframe="1" xtl="0.00" ytl="0.00" xbr="10.00" ybr="10.00" z_order="0"/>"#
        ));
        assert!(xml.contains(
            r#"<box frame="1" outside="0" occluded="0" keyframe="0" xtl="10.00" ytl="10.00" xbr="20.00" ybr="20.00" z_order="0"/>"#
        ));
        // the last written box closes the track even when entries without a box follow
        assert!(xml.contains(
            r#"<box frame="2" outside="1" occluded="0" keyframe="1" xtl="20.00" ytl="20.00" xbr="30.00" ybr="30.00" z_order="0"/>"#
        ));
        assert!(!xml.contains(r#"frame="3" outside="0""#));
        assert!(xml.contains(r#"<track id="2" label="None" source="manual">"#));
        // identity 3 never had a box
        assert!(!xml.contains(r#"<track id="3""#));
    }
}
