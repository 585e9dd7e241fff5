mod filestore;
mod package_info;

pub use filestore::{Credentials, FileStore};
pub use package_info::fetch_remote_descriptor;

use anyhow::{Context, Result};
use reqwest::Client;

/// GET a page and return its body
pub async fn fetch_page(client: &Client, url: &str) -> Result<String> {
    let resp = client
        .get(url)
        .send()
        .await
        .context(format!("Failed to connect to {}", url))?;
    resp.error_for_status_ref()
        .context(format!("Failed to retrieve {}", url))?;
    let body = resp.text().await?;
    Ok(body)
}
