use crate::{info, types::PackageType};

use anyhow::{bail, Context, Result};
use futures_util::future::try_join_all;
use reqwest::{
    multipart::{Form, Part},
    Client,
};
use serde::Deserialize;
use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
};

pub struct Credentials {
    pub email: String,
    pub password: String,
}

#[derive(Deserialize)]
struct UploadResponse {
    sha1_hash: UploadedHash,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum UploadedHash {
    Fresh(String),
    /// `["<hash> - already exists"]`
    Existing(Vec<String>),
}

/// Content-addressed storage the build system fetches sources from
pub struct FileStore {
    client: Client,
    url: String,
}

impl FileStore {
    pub fn new(client: Client, url: &str) -> Self {
        FileStore {
            client,
            url: url.to_owned(),
        }
    }

    /// Upload all files, returning the store's hash for each archive type
    pub async fn upload_all(
        &self,
        credentials: &Credentials,
        files: &[(PathBuf, PackageType)],
    ) -> Result<BTreeMap<PackageType, String>> {
        info!("Uploading {} source files to the file-store...", files.len());
        let uploads = files.iter().map(|(path, kind)| async move {
            let hash = self.upload(credentials, path).await?;
            Ok::<_, anyhow::Error>((*kind, hash))
        });
        let hashes = try_join_all(uploads).await.context(
            "Failed to upload to the file-store. Check your connection and credentials, then try again",
        )?;
        Ok(hashes.into_iter().collect())
    }

    pub async fn upload(&self, credentials: &Credentials, path: &Path) -> Result<String> {
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let data = tokio::fs::read(path)
            .await
            .context(format!("Failed to read {}", path.display()))?;
        let form = Form::new().part("file_store[file]", Part::bytes(data).file_name(filename.clone()));

        let resp = self
            .client
            .post(&self.url)
            .basic_auth(&credentials.email, Some(&credentials.password))
            .multipart(form)
            .send()
            .await?;
        resp.error_for_status_ref()?;
        let body: UploadResponse = resp.json().await?;
        let hash = extract_hash(body.sha1_hash).context(format!(
            "Failed to parse the hash returned for {}. Start the process again to resolve it",
            filename
        ))?;
        info!("Uploaded {}: {}", filename, hash);
        Ok(hash)
    }
}

fn extract_hash(hash: UploadedHash) -> Result<String> {
    let hash = match hash {
        UploadedHash::Fresh(hash) => hash.trim().to_owned(),
        UploadedHash::Existing(list) => match list.as_slice() {
            [msg] => msg.split('-').next().unwrap_or_default().trim().to_owned(),
            _ => bail!("Expected a single hash, got {:?}", list),
        },
    };
    if hash.len() <= 1 {
        bail!("Hash {:?} is too short", hash);
    }
    Ok(hash)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(body: &str) -> Result<String> {
        let resp: UploadResponse = serde_json::from_str(body)?;
        extract_hash(resp.sha1_hash)
    }

    #[test]
    fn test_fresh_upload() {
        assert_eq!(
            parse(r#"{"sha1_hash": "0a1b2c3d4e5f60718293a4b5c6d7e8f901234567"}"#).unwrap(),
            "0a1b2c3d4e5f60718293a4b5c6d7e8f901234567"
        );
    }

    #[test]
    fn test_existing_upload() {
        assert_eq!(
            parse(r#"{"sha1_hash": ["0a1b2c3d4e5f60718293a4b5c6d7e8f901234567 - already exists"]}"#)
                .unwrap(),
            "0a1b2c3d4e5f60718293a4b5c6d7e8f901234567"
        );
    }

    #[test]
    fn test_bad_hashes() {
        assert!(parse(r#"{"sha1_hash": ["a - already exists"]}"#).is_err());
        assert!(parse(r#"{"sha1_hash": ["a", "b"]}"#).is_err());
        assert!(parse(r#"{"sha1_hash": ""}"#).is_err());
        assert!(parse(r#"{"error": "unauthorized"}"#).is_err());
    }
}
