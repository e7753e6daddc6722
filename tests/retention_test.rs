//! Retention window integration tests: orphan seeding and sweeping over the
//! real artifact directory layout.

use dubforge::config::StorageConfig;
use dubforge::retention::{start_sweeper, RetentionStore};
use std::time::Duration;

fn storage_with_orphans() -> (tempfile::TempDir, StorageConfig) {
    let dir = tempfile::tempdir().unwrap();
    let storage = StorageConfig {
        data_dir: dir.path().to_path_buf(),
    };
    storage.bootstrap().unwrap();

    std::fs::write(storage.videos_dir().join("a1b2c3d4.mp4"), b"video").unwrap();
    std::fs::write(storage.voices_dir().join("voix_a1b2c3d4.mp3"), b"voice").unwrap();
    std::fs::write(
        storage.subtitles_dir().join("sous_titres_a1b2c3d4.srt"),
        b"1\n",
    )
    .unwrap();
    std::fs::write(
        storage.output_dir().join("video_traduite_a1b2c3d4.mp4"),
        b"dub",
    )
    .unwrap();

    // A fragment left under voices/temp by an interrupted long job.
    let fragment_dir = storage.voice_temp_dir().join("a1b2c3d4");
    std::fs::create_dir_all(&fragment_dir).unwrap();
    std::fs::write(fragment_dir.join("segment_0.mp3"), b"frag").unwrap();

    (dir, storage)
}

#[test]
fn seeding_picks_up_orphans_from_every_artifact_dir() {
    let (_dir, storage) = storage_with_orphans();

    let store = RetentionStore::new(600);
    store.seed_from_dirs(&storage.artifact_dirs());

    // Four top-level artifacts plus the nested fragment under voices/temp.
    assert_eq!(store.len(), 5);
    assert!(store.is_tracked(&storage.output_dir().join("video_traduite_a1b2c3d4.mp4")));
    assert!(store.is_tracked(&storage.voice_temp_dir().join("a1b2c3d4").join("segment_0.mp3")));
}

#[test]
fn expired_orphans_are_reclaimed_on_sweep() {
    let (_dir, storage) = storage_with_orphans();

    let store = RetentionStore::new(0);
    store.seed_from_dirs(&storage.artifact_dirs());

    assert_eq!(store.sweep_expired(), 5);
    assert!(!storage.videos_dir().join("a1b2c3d4.mp4").exists());
    assert!(!storage
        .output_dir()
        .join("video_traduite_a1b2c3d4.mp4")
        .exists());
    assert!(store.is_empty());
}

#[tokio::test]
async fn sweeper_first_tick_is_the_catchup_pass() {
    let (_dir, storage) = storage_with_orphans();

    let store = RetentionStore::new(0);
    store.seed_from_dirs(&storage.artifact_dirs());

    // A long interval does not delay the initial sweep: the first tick fires
    // immediately.
    let handle = start_sweeper(store.clone(), 3600);
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    while !store.is_empty() {
        assert!(
            tokio::time::Instant::now() < deadline,
            "catch-up sweep never ran"
        );
        tokio::time::sleep(Duration::from_millis(20)).await;
    }

    assert!(!storage.videos_dir().join("a1b2c3d4.mp4").exists());
    handle.abort();
}
