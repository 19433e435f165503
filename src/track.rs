use crate::utils::bbox::{BBox, Position};
use crate::utils::palette::Color;
use crate::Errors;
use anyhow::Result;

/// Serialization formats of the track store
pub mod format;

/// Store change notifications
pub mod notify;

/// Track store that accumulates, interpolates and prunes the records
pub mod store;

/// Video the records were collected from
///
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct VideoMeta {
    pub name: Option<String>,
    /// Number of frames
    pub size: Option<usize>,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

/// Single observation of the identity on a frame
///
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TrackEntry {
    pub frame_index: usize,
    pub position: Position,
    /// Absent when the identity was only predicted on the frame
    pub bbox: Option<BBox>,
    /// The box was filled in by interpolation
    pub interpolated: bool,
}

impl TrackEntry {
    pub fn new(frame_index: usize, position: Position, bbox: Option<BBox>) -> Self {
        Self {
            frame_index,
            position,
            bbox,
            interpolated: false,
        }
    }
}

/// Full history of one identity
///
#[derive(Clone, Debug, PartialEq)]
pub struct TrackRecord {
    track_id: u64,
    color: Color,
    label: Option<String>,
    entries: Vec<TrackEntry>,
    missed_boxes: usize,
    refined: bool,
}

impl TrackRecord {
    pub fn new(track_id: u64, color: Color, label: Option<String>) -> Self {
        Self {
            track_id,
            color,
            label,
            entries: Vec::default(),
            missed_boxes: 0,
            refined: false,
        }
    }

    /// Builds a record from already collected entries, checking the record invariants
    ///
    pub fn from_entries(
        track_id: u64,
        color: Color,
        label: Option<String>,
        entries: Vec<TrackEntry>,
        missed_boxes: usize,
        refined: bool,
    ) -> Result<Self> {
        for pair in entries.windows(2) {
            if pair[1].frame_index <= pair[0].frame_index {
                return Err(Errors::MalformedDocument(format!(
                    "frame indices of track {} are not strictly increasing at frame {}",
                    track_id, pair[1].frame_index
                ))
                .into());
            }
        }

        if let Some(e) = entries.iter().find(|e| e.interpolated && e.bbox.is_none()) {
            return Err(Errors::MalformedDocument(format!(
                "interpolated entry of track {} at frame {} has no box",
                track_id, e.frame_index
            ))
            .into());
        }

        let trailing_missed = trailing_without_box(&entries);
        if missed_boxes > trailing_missed {
            return Err(Errors::MalformedDocument(format!(
                "track {} misses {} boxes but ends with {} entries without a box",
                track_id, missed_boxes, trailing_missed
            ))
            .into());
        }

        Ok(Self {
            track_id,
            color,
            label,
            entries,
            missed_boxes,
            refined,
        })
    }

    pub fn track_id(&self) -> u64 {
        self.track_id
    }

    pub fn color(&self) -> Color {
        self.color
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    pub fn entries(&self) -> &[TrackEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Consecutive trailing entries without a box that wait for interpolation
    pub fn missed_boxes(&self) -> usize {
        self.missed_boxes
    }

    pub fn is_refined(&self) -> bool {
        self.refined
    }

    pub fn last_frame(&self) -> Option<usize> {
        self.entries.last().map(|e| e.frame_index)
    }

    pub fn positions(&self) -> impl Iterator<Item = Position> + '_ {
        self.entries.iter().map(|e| e.position)
    }

    pub fn boxes(&self) -> impl Iterator<Item = Option<BBox>> + '_ {
        self.entries.iter().map(|e| e.bbox)
    }

    pub fn frame_indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.entries.iter().map(|e| e.frame_index)
    }

    pub(crate) fn push(&mut self, entry: TrackEntry) -> Result<()> {
        if let Some(last) = self.last_frame() {
            if entry.frame_index <= last {
                return Err(Errors::NonMonotonicFrame {
                    track_id: self.track_id,
                    frame: entry.frame_index,
                    last,
                }
                .into());
            }
        }
        self.entries.push(entry);
        Ok(())
    }

    /// Counts a trailing entry without a box, or fills the pending gap
    /// once a box arrives. Returns the number of interpolated entries.
    ///
    pub(crate) fn track_missed_boxes(&mut self) -> usize {
        match self.entries.last() {
            None => 0,
            Some(e) if e.bbox.is_none() => {
                self.missed_boxes += 1;
                0
            }
            Some(_) => self.fill_missed_boxes(),
        }
    }

    fn fill_missed_boxes(&mut self) -> usize {
        let missed = std::mem::take(&mut self.missed_boxes);
        let len = self.entries.len();
        if missed == 0 || len < missed + 2 {
            return 0;
        }

        let (past, current) = match (self.entries[len - missed - 2].bbox, self.entries[len - 1].bbox)
        {
            (Some(past), Some(current)) => (past, current),
            _ => return 0,
        };

        let filled = interpolate_boxes(&current, &past, missed);
        for (k, bbox) in filled.into_iter().enumerate() {
            let entry = &mut self.entries[len - 2 - k];
            entry.bbox = Some(bbox);
            entry.interpolated = true;
        }
        missed
    }

    /// Drops the trailing `tail` entries and freezes the record
    ///
    pub(crate) fn refine(&mut self, tail: usize) {
        let keep = self.entries.len().saturating_sub(tail);
        self.entries.truncate(keep);
        self.missed_boxes = self.missed_boxes.min(trailing_without_box(&self.entries));
        self.refined = true;
    }

    pub(crate) fn set_refined(&mut self, refined: bool) {
        self.refined = refined;
    }
}

fn trailing_without_box(entries: &[TrackEntry]) -> usize {
    entries.iter().rev().take_while(|e| e.bbox.is_none()).count()
}

/// `n` boxes evenly spaced between `from` and `to`, both excluded, starting next to `from`
///
/// Every coordinate is floored, so the direction matters: the boxes are
/// spaced from the newly observed box toward the one observed before the gap.
///
pub fn interpolate_boxes(from: &BBox, to: &BBox, n: usize) -> Vec<BBox> {
    let from = from.as_array();
    let to = to.as_array();
    let div = (n + 1) as f64;
    (1..=n)
        .map(|k| {
            let mut coords = [0i64; 4];
            for (c, coord) in coords.iter_mut().enumerate() {
                let step = (to[c] - from[c]) as f64 / div;
                *coord = (k as f64 * step + from[c] as f64).floor() as i64;
            }
            BBox::from(coords)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use crate::track::{interpolate_boxes, TrackEntry, TrackRecord};
    use crate::utils::bbox::{BBox, Position};
    use crate::utils::palette::Color;
    use crate::Errors;

    fn entry(frame: usize, bbox: Option<BBox>) -> TrackEntry {
        TrackEntry::new(frame, Position::new(frame as i64, 0), bbox)
    }

    #[test]
    fn interpolation_values() {
        let boxes = interpolate_boxes(&BBox::new(0, 0, 0, 0), &BBox::new(10, 20, -10, 3), 2);
        assert_eq!(boxes, vec![BBox::new(3, 6, -4, 1), BBox::new(6, 13, -7, 2)]);
        assert!(interpolate_boxes(&BBox::new(0, 0, 0, 0), &BBox::new(1, 1, 1, 1), 0).is_empty());
    }

    #[test]
    fn push_rejects_non_monotonic() {
        let mut r = TrackRecord::new(1, Color::default(), None);
        r.push(entry(5, None)).unwrap();
        let err = r.push(entry(5, None)).unwrap_err();
        assert_eq!(
            err.downcast_ref::<Errors>(),
            Some(&Errors::NonMonotonicFrame {
                track_id: 1,
                frame: 5,
                last: 5
            })
        );
        assert!(r.push(entry(3, None)).is_err());
        assert!(r.push(entry(6, None)).is_ok());
        assert_eq!(r.len(), 2);
    }

    #[test]
    fn gap_without_leading_box_stays_empty() {
        let mut r = TrackRecord::new(1, Color::default(), None);
        for f in 0..3 {
            r.push(entry(f, None)).unwrap();
            r.track_missed_boxes();
        }
        assert_eq!(r.missed_boxes(), 3);
        r.push(entry(3, Some(BBox::new(1, 1, 2, 2)))).unwrap();
        assert_eq!(r.track_missed_boxes(), 0);
        assert_eq!(r.missed_boxes(), 0);
        assert!(r.entries().iter().all(|e| !e.interpolated));
    }

    #[test]
    fn refine_trims_tail() {
        let mut r = TrackRecord::new(1, Color::default(), Some("zebra".into()));
        r.push(entry(0, Some(BBox::new(0, 0, 1, 1)))).unwrap();
        for f in 1..5 {
            r.push(entry(f, None)).unwrap();
            r.track_missed_boxes();
        }
        r.refine(2);
        assert!(r.is_refined());
        assert_eq!(r.frame_indices().collect::<Vec<_>>(), vec![0, 1, 2]);
        assert_eq!(r.missed_boxes(), 2);
        r.refine(10);
        assert!(r.is_empty());
        assert_eq!(r.missed_boxes(), 0);
    }

    #[test]
    fn from_entries_validation() {
        let ok = TrackRecord::from_entries(
            3,
            Color(1, 2, 3),
            None,
            vec![entry(0, Some(BBox::default())), entry(2, None)],
            1,
            true,
        )
        .unwrap();
        assert!(ok.is_refined());
        assert_eq!(ok.last_frame(), Some(2));

        let unordered = TrackRecord::from_entries(
            3,
            Color::default(),
            None,
            vec![entry(2, None), entry(1, None)],
            0,
            false,
        );
        assert!(matches!(
            unordered.unwrap_err().downcast_ref::<Errors>(),
            Some(Errors::MalformedDocument(_))
        ));

        let mut bad = entry(0, None);
        bad.interpolated = true;
        assert!(TrackRecord::from_entries(3, Color::default(), None, vec![bad], 0, false).is_err());

        assert!(
            TrackRecord::from_entries(3, Color::default(), None, vec![entry(0, None)], 2, false)
                .is_err()
        );
    }

    #[test]
    fn missed_boxes_must_trail() {
        let boxed = || Some(BBox::new(0, 0, 10, 10));
        let all_boxed = vec![entry(0, boxed()), entry(1, boxed()), entry(2, boxed())];
        let err =
            TrackRecord::from_entries(3, Color::default(), None, all_boxed, 1, false).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<Errors>(),
            Some(Errors::MalformedDocument(_))
        ));

        // a box-less entry in the middle does not count
        let hole = vec![entry(0, boxed()), entry(1, None), entry(2, boxed())];
        assert!(TrackRecord::from_entries(3, Color::default(), None, hole, 1, false).is_err());

        let tail = vec![entry(0, boxed()), entry(1, None), entry(2, None)];
        let r = TrackRecord::from_entries(3, Color::default(), None, tail, 2, false).unwrap();
        assert_eq!(r.missed_boxes(), 2);
    }
}
