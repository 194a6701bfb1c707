//! Assistance-data download: fetch the URL the peer pushed, stream it into
//! local storage, report the outcome back over the link.

use std::path::{Path, PathBuf};
use std::time::Duration;

use gnss_core::proto;
use gnss_core::MessageSink;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

/// Fixed artifact name inside the data directory; overwritten on every
/// successful download.
pub const PGPS_FILE_NAME: &str = "pgps.data";

const HTTP_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, thiserror::Error)]
pub enum DownloadError {
    #[error("command has no url field")]
    MissingUrl,
    #[error("command id is not numeric")]
    BadId,
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("file error: {0}")]
    Io(#[from] std::io::Error),
}

/// Handle one download command (`"<id>\n<url>"`). Every outcome ends in a
/// notification: success carries the id and the absolute artifact path,
/// any failure the tagged `failed` message.
pub async fn fetch_pgps_data(sink: &dyn MessageSink, data_dir: &Path, command: &str) {
    match run(data_dir, command).await {
        Ok((id, path, written)) => {
            debug!(id, bytes = written, path = %path.display(), "assistance data written");
            sink.send_text(&proto::pgps_data_ready_message(id, &path.to_string_lossy()));
        }
        Err(e) => {
            warn!(error = %e, "assistance data download failed");
            sink.send_text(&proto::pgps_data_failed_message());
        }
    }
}

async fn run(data_dir: &Path, command: &str) -> Result<(i64, PathBuf, u64), DownloadError> {
    let (id, url) = command
        .split_once(proto::MSG_DELIMITER)
        .ok_or(DownloadError::MissingUrl)?;
    let id: i64 = id.trim().parse().map_err(|_| DownloadError::BadId)?;
    debug!(id, url, "fetching assistance data");

    let client = reqwest::Client::builder()
        .connect_timeout(HTTP_TIMEOUT)
        .read_timeout(HTTP_TIMEOUT)
        .build()?;
    let mut response = client.get(url).send().await?.error_for_status()?;

    let path = data_dir.join(PGPS_FILE_NAME);
    let mut file = tokio::fs::File::create(&path).await?;
    let mut written = 0u64;
    while let Some(chunk) = response.chunk().await? {
        file.write_all(&chunk).await?;
        written += chunk.len() as u64;
    }
    file.flush().await?;
    drop(file);

    Ok((id, path, written))
}
