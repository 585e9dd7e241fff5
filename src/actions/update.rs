use super::Outcome;
use crate::{
    catalog::CatalogBuilder,
    cli,
    config::Config,
    files::{descriptor, manifest},
    info,
    remote::{self, FileStore},
    repo::{self, git, workdir},
    success,
    types::{needs_update, BumpError, FileMetadata, PackageType},
    utils::downloader::{DownloadJob, Downloader},
};

use anyhow::{format_err, Context, Result};
use console::style;
use reqwest::Client;
use std::{
    collections::BTreeSet,
    path::{Path, PathBuf},
};

/// Bump the package behind `repo_url` to the latest upstream release
pub async fn update_package(
    config: &Config,
    client: &Client,
    repo_url: &str,
    remove_comments: bool,
    assume_yes: bool,
) -> Result<Outcome> {
    let repo = match repo::prepare(config, repo_url, assume_yes)? {
        Some(repo) => repo,
        None => return Ok(Outcome::Cancelled),
    };
    let (descriptor_path, manifest_path) = workdir::locate_package_files(&repo.path)?;

    let old = descriptor::read(&descriptor_path)?;
    if old.is_empty() {
        return Err(BumpError::EmptyDescriptor.into());
    }
    info!("Local package data: {}", old);

    // Neither lookup depends on the other
    let builder = CatalogBuilder::new(config.catalog_config());
    let (new, catalog) = tokio::try_join!(
        remote::fetch_remote_descriptor(client, &config.package_info_url, &old),
        builder.build(client),
    )?;

    if !needs_update(&old, &new) {
        info!("{} is already up to date", style(&old.name).bold());
        return Ok(Outcome::UpToDate);
    }
    info!("Remote package data: {}", new);
    info!(
        "Bumping {} to {}",
        style(&old.version).bold(),
        style(&new.version).bold()
    );

    let sources = catalog.related(&repo.name);
    if sources.is_empty() {
        return Err(BumpError::NoSources(repo.name.clone()).into());
    }

    descriptor::write(&descriptor_path, &old, &new, remove_comments)?;

    let credentials = cli::ask_credentials()?;
    let downloaded = download_sources(config, client, new.short_name(), &repo.data_path, &sources)
        .await
        .context("Failed to download source files")?;
    let store = FileStore::new(client.clone(), &config.filestore_url);
    let hashes = store.upload_all(&credentials, &downloaded).await?;
    manifest::write(&manifest_path, &hashes)?;

    workdir::normalize_line_endings(&[descriptor_path.as_path(), manifest_path.as_path()])?;
    workdir::log_tarballs(&repo.data_path)?;
    info!("Files included by the descriptor:");
    workdir::log_package_files(&old);

    if !cli::ask_confirm(
        assume_yes,
        "Push to origin? Check the file structure before proceeding",
    )? {
        return Ok(Outcome::Cancelled);
    }
    let message = format!(
        "Updated package from version \"{}\" to \"{}\"",
        old.version, new.version
    );
    git::commit_and_push(&repo.path, &[descriptor_path, manifest_path], &message)?;
    success!("{} updated to {}", old.name, new.version);
    Ok(Outcome::Done)
}

/// One archive per type the mirror offers, saved under `data_path`
async fn download_sources(
    config: &Config,
    client: &Client,
    short_name: &str,
    data_path: &Path,
    sources: &[&FileMetadata],
) -> Result<Vec<(PathBuf, PackageType)>> {
    let kinds: BTreeSet<PackageType> = sources.iter().map(|s| s.kind).collect();
    let jobs: Vec<(DownloadJob, PackageType)> = kinds
        .into_iter()
        .map(|kind| {
            let filename = workdir::source_file_name(short_name, kind, &config.tarball_suffix);
            let job = DownloadJob {
                url: format!("{}{}", config.mirror_url, filename),
                description: Some(format!("{} ({})", filename, kind)),
                filename: Some(filename),
            };
            (job, kind)
        })
        .collect();

    let downloader = Downloader::new(client.clone(), config.max_concurrent, config.max_retry);
    let res = downloader
        .fetch(jobs.iter().map(|(job, _)| job.clone()).collect(), data_path)
        .await?;
    info!("Finished downloading");

    jobs.into_iter()
        .map(|(job, kind)| {
            res.get(&job.url)
                .map(|path| (path.clone(), kind))
                .ok_or_else(|| format_err!("{} was not downloaded", job.url))
        })
        .collect()
}
