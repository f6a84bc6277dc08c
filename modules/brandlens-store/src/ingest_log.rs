use tracing::warn;
use uuid::Uuid;

use crate::store::Store;

impl Store {
    /// Append an ingestion log row. Best-effort: a failed audit write never
    /// aborts the pipeline step it describes.
    pub async fn log_ingest_step(
        &self,
        run_id: Uuid,
        channel_id: Option<&str>,
        video_id: Option<&str>,
        status: &str,
        step: &str,
        error: Option<&str>,
    ) {
        let result = sqlx::query(
            "INSERT INTO ingestion_logs (run_id, channel_id, video_id, status, step, error)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        )
        .bind(run_id.to_string())
        .bind(channel_id)
        .bind(video_id)
        .bind(status)
        .bind(step)
        .bind(error)
        .execute(&self.pool)
        .await;

        if let Err(e) = result {
            warn!(%run_id, step, error = %e, "Failed to write ingestion log");
        }
    }
}
