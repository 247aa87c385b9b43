use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use reelkit::auth::{Plan, Subscription};
use reelkit::backend::FakeBackend;
use reelkit::config::Config;
use reelkit::media::{MediaArtifact, MediaKind};
use reelkit::storage::MemoryStore;
use reelkit::MediaEngine;
use tempfile::TempDir;

#[allow(dead_code)]
pub fn temp_config_file(contents: &str) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().expect("failed to create tempdir");
    let config_path = temp_dir.path().join("config.yaml");
    fs::write(&config_path, contents).expect("failed to write config file");
    (temp_dir, config_path)
}

#[allow(dead_code)]
pub fn engine_with(
    backend: Arc<FakeBackend>,
    storage: Arc<MemoryStore>,
    plan: Plan,
    credits: u32,
) -> MediaEngine {
    let engine = MediaEngine::new(&Config::default(), backend, storage);
    engine
        .session()
        .set_subscription(Subscription::new(plan, credits));
    engine
}

#[allow(dead_code)]
pub fn photo(name: &str) -> MediaArtifact {
    MediaArtifact::new(format!("file:///{}.jpg", name), MediaKind::Image)
}

#[allow(dead_code)]
pub fn video(name: &str) -> MediaArtifact {
    MediaArtifact::new(format!("file:///{}.mp4", name), MediaKind::Video)
}
