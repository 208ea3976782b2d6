use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use uuid::Uuid;

use crate::common::error::AppResult;

pub const INPUT_VIDEO: &str = "input_video.mp4";
pub const INPUT_AUDIO: &str = "input_audio.mp3";
pub const DUCKED_VIDEO: &str = "ducked_video.mp4";
pub const SHORTS_VIDEO: &str = "shorts_video.mp4";
pub const WATERMARK_VIDEO: &str = "watermark_video.mp4";
pub const SUBTITLE_VIDEO: &str = "subtitle_video.mp4";
pub const FINAL_OUTPUT: &str = "final_output.mp4";

const ARTIFACTS: &[&str] = &[
    INPUT_VIDEO,
    INPUT_AUDIO,
    DUCKED_VIDEO,
    SHORTS_VIDEO,
    WATERMARK_VIDEO,
    SUBTITLE_VIDEO,
    FINAL_OUTPUT,
];

/// Per-job directory holding every artifact of one request.
#[derive(Debug)]
pub struct JobWorkspace {
    id: Uuid,
    root: PathBuf,
}

impl JobWorkspace {
    pub async fn create(base: &Path, id: Uuid) -> AppResult<Self> {
        let root = base.join(id.to_string());
        tokio::fs::create_dir_all(&root).await?;
        debug!("Created workspace {}", root.display());
        Ok(Self { id, root })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path(&self, artifact: &str) -> PathBuf {
        self.root.join(artifact)
    }

    pub fn input_video(&self) -> PathBuf {
        self.path(INPUT_VIDEO)
    }

    pub fn input_audio(&self) -> PathBuf {
        self.path(INPUT_AUDIO)
    }

    pub fn final_output(&self) -> PathBuf {
        self.path(FINAL_OUTPUT)
    }

    /// Best-effort removal of every well-known artifact and the directory.
    /// Missing files are expected.
    pub async fn cleanup(&self) {
        for name in ARTIFACTS {
            let path = self.path(name);
            match tokio::fs::remove_file(&path).await {
                Ok(()) => debug!("Cleaned up: {}", path.display()),
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => warn!("Could not remove {}: {}", path.display(), e),
            }
        }

        if let Err(e) = tokio::fs::remove_dir(&self.root).await {
            if e.kind() != ErrorKind::NotFound {
                warn!("Could not remove workspace {}: {}", self.root.display(), e);
            }
        }
    }
}
