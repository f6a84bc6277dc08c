use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{debug, warn};

use brandlens_common::TranscriptSegment;

/// One JSON file per video id. Entries never expire; an operator deletes
/// the file to force re-acquisition.
pub struct TranscriptCache {
    dir: PathBuf,
}

impl TranscriptCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, video_id: &str) -> PathBuf {
        self.dir.join(format!("{video_id}.json"))
    }

    /// Load a cached transcript. A corrupt file is deleted and treated as
    /// a miss so the next acquisition re-fetches.
    pub async fn load(&self, video_id: &str) -> Option<Vec<TranscriptSegment>> {
        let path = self.path_for(video_id);
        let raw = tokio::fs::read_to_string(&path).await.ok()?;

        match serde_json::from_str::<Vec<TranscriptSegment>>(&raw) {
            Ok(segments) if !segments.is_empty() => {
                debug!(video_id, count = segments.len(), "Transcript cache hit");
                Some(segments)
            }
            Ok(_) => None,
            Err(e) => {
                warn!(video_id, error = %e, "Corrupt transcript cache file, deleting");
                let _ = tokio::fs::remove_file(&path).await;
                None
            }
        }
    }

    pub async fn save(&self, video_id: &str, segments: &[TranscriptSegment]) -> Result<()> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .with_context(|| format!("creating cache dir {}", self.dir.display()))?;
        let payload = serde_json::to_string(segments)?;
        tokio::fs::write(self.path_for(video_id), payload)
            .await
            .with_context(|| format!("writing transcript cache for {video_id}"))?;
        Ok(())
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}
