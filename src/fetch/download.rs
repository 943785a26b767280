//! File and image downloads.

use std::path::{Path, PathBuf};

use tracing::{debug, error, warn};

use crate::error::{Error, Result};
use crate::fetch::session::Session;

/// Stream a URL to disk, creating parent directories as needed. Download
/// failures propagate regardless of strict mode; a partial file is not a
/// useful result. Returns the bytes written.
pub async fn download_file(session: &Session, url: &str, dest: &Path) -> Result<u64> {
    if url.is_empty() || dest.as_os_str().is_empty() {
        return Err(Error::InvalidInput("url and dest are required".into()));
    }

    session.limiter().wait().await;
    if let Some(parent) = dest.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await?;
        }
    }

    let bytes = session
        .transport()
        .download(url, dest)
        .await
        .map_err(|e| {
            error!(url, error = %e, "download failed");
            Error::Transport {
                url: url.to_string(),
                source: e,
            }
        })?;
    debug!(url, dest = %dest.display(), bytes, "downloaded");
    Ok(bytes)
}

/// Download every image on the current page to `folder/img_{i}.{ext}` and
/// return the saved paths. Per-image failures are logged and skipped unless
/// the session is strict.
pub async fn download_images(session: &Session, folder: &Path) -> Result<Vec<PathBuf>> {
    if folder.as_os_str().is_empty() {
        return Err(Error::InvalidInput("folder is required".into()));
    }

    let images = session.get_images();
    if images.is_empty() {
        warn!("no images found to download");
        return Ok(Vec::new());
    }

    let mut saved = Vec::new();
    for (i, url) in images.iter().enumerate() {
        let dest = folder.join(format!("img_{i}.{}", image_extension(url)));
        match download_file(session, url, &dest).await {
            Ok(_) => saved.push(dest),
            Err(e) => {
                error!(index = i, url = %url, error = %e, "failed to download image");
                if session.config().strict {
                    return Err(e);
                }
            }
        }
    }
    Ok(saved)
}

/// Sniff a file extension from the URL's last dot segment, dropping any
/// query string. Anything empty, longer than 4 characters, or not purely
/// alphanumeric falls back to jpg.
fn image_extension(url: &str) -> &str {
    let tail = url.rsplit('.').next().unwrap_or("");
    let ext = tail.split('?').next().unwrap_or("");
    if !ext.is_empty() && ext.len() <= 4 && ext.chars().all(|c| c.is_ascii_alphanumeric()) {
        ext
    } else {
        "jpg"
    }
}
