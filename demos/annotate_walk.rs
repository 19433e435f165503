use anyhow::Result;
use herdtrack::prelude::*;
use rand::distributions::Uniform;
use rand::Rng;

fn walk(x: i64, y: i64, width: i64, height: i64, frames: usize) -> Vec<BBox> {
    let mut rng = rand::thread_rng();
    let step = Uniform::new_inclusive(-3, 3);
    let (mut x, mut y) = (x, y);
    (0..frames)
        .map(|_| {
            x += rng.sample(step);
            y += rng.sample(step);
            BBox::new(x, y, x + width, y + height)
        })
        .collect()
}

fn main() -> Result<()> {
    env_logger::init();

    let frames = 120;
    let zebra = walk(100, 100, 60, 40, frames);
    let giraffe = walk(500, 300, 40, 90, frames);

    let store = TrackStoreBuilder::new(10)
        .video(VideoMeta {
            name: Some("walk.mp4".into()),
            size: Some(frames),
            width: Some(1280),
            height: Some(720),
        })
        .notifier(ChangeLog::default())
        .build();
    let mut session = TrackingSession::with_store(TrackerOptions::new(10, 100.0), store)?;

    for frame in 0..frames {
        let mut detections = vec![Detection::from_bbox(zebra[frame])
            .confidence(0.9)
            .label("zebra")];
        // the giraffe hides behind a tree for a while
        if !(40..46).contains(&frame) {
            detections.push(
                Detection::from_bbox(giraffe[frame])
                    .confidence(0.8)
                    .label("giraffe"),
            );
        }
        let identities = session.process(&detections)?;
        for change in session.store_mut().notifier_mut().drain() {
            eprintln!("Frame {}: {:?}", frame, change);
        }
        if frame % 30 == 0 {
            eprintln!("Frame {}: {:#?}", frame, identities);
        }
    }

    let store = session.into_store();
    for record in store.records() {
        eprintln!(
            "Track {} ({}): {} entries, {} interpolated",
            record.track_id(),
            record.label().unwrap_or("unlabeled"),
            record.len(),
            record.entries().iter().filter(|e| e.interpolated).count()
        );
    }

    let dir = std::env::temp_dir();
    for (name, format) in [
        ("walk_tracks.json", StoreFormat::Json),
        ("walk_annotations.xml", StoreFormat::Cvat),
    ] {
        let path = dir.join(name);
        store.save(&path, format)?;
        eprintln!("Saved {}", path.display());
    }
    Ok(())
}
