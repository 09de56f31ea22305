//! Client side of the snapshot shuttle.
//!
//! Talks to the sync endpoint in `web`: `GET /` downloads the hosted
//! snapshot, `POST /` replaces it. Any non-success status is surfaced as
//! [`Error::RemoteSync`] with the response body attached.

use crate::error::{Error, Result};
use crate::snapshot::Snapshot;

/// Uploads a snapshot document to the sync endpoint.
pub async fn upload(url: &str, snapshot: &Snapshot) -> Result<()> {
    let response = reqwest::Client::new().post(url).json(snapshot).send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(Error::RemoteSync {
            status: status.as_u16(),
            body: response.text().await.unwrap_or_default(),
        });
    }
    log::info!("Uploaded snapshot to {}", url);
    Ok(())
}

/// Downloads the hosted snapshot document.
pub async fn download(url: &str) -> Result<Snapshot> {
    let response = reqwest::get(url).await?;
    let status = response.status();
    if !status.is_success() {
        return Err(Error::RemoteSync {
            status: status.as_u16(),
            body: response.text().await.unwrap_or_default(),
        });
    }
    let snapshot = response.json::<Snapshot>().await?;
    log::info!(
        "Downloaded snapshot from {} ({} materials)",
        url,
        snapshot.materials.len()
    );
    Ok(snapshot)
}
