use std::path::Path;

use anyhow::{Result, anyhow};
use axum::extract::multipart::Field;
use tokio::{fs::File, io::AsyncWriteExt};
use tracing::{error, info};

pub const VIDEO_EXTENSIONS: &[&str] = &["mp4", "avi", "mov", "mkv"];
pub const AUDIO_EXTENSIONS: &[&str] = &["mp3", "wav", "aac", "m4a"];

/// Case-insensitive extension check against an allow-list.
pub fn allowed_file(file_name: &str, allowed: &[&str]) -> bool {
    match file_name.rsplit_once('.') {
        Some((_, ext)) => allowed.iter().any(|a| a.eq_ignore_ascii_case(ext)),
        None => false,
    }
}

/// Streams a multipart file field to `dest` chunk by chunk.
///
/// Returns the number of bytes written. A partially written file is removed
/// when the stream breaks.
pub async fn stream_to_file(mut field: Field<'_>, dest: &Path) -> Result<u64> {
    let file_name = field.file_name().unwrap_or("upload").to_string();
    let mut file = File::create(dest)
        .await
        .map_err(|e| anyhow!("Failed to create {}: {}", dest.display(), e))?;
    let mut written: u64 = 0;

    loop {
        let chunk = match field.chunk().await {
            Ok(Some(c)) => c,
            Ok(None) => break,
            Err(e) => {
                error!("Stream error while saving {}: {}", file_name, e);
                drop(file);
                let _ = tokio::fs::remove_file(dest).await;
                return Err(anyhow!("Stream interrupted"));
            }
        };

        file.write_all(&chunk).await?;
        written += chunk.len() as u64;
    }

    file.flush().await?;
    info!("Saved uploaded file {} ({} bytes) to {}", file_name, written, dest.display());
    Ok(written)
}
