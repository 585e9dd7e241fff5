use crate::msg;

use anyhow::{format_err, Result};
use futures_util::future::select_all;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use reqwest::Client;
use std::{
    collections::HashMap,
    path::{Path, PathBuf},
};
use tokio::{fs::File, io::AsyncWriteExt, task::JoinHandle};

#[derive(Clone)]
pub struct DownloadJob {
    pub url: String,
    /// Shown next to the progress bar instead of the filename
    pub description: Option<String>,
    pub filename: Option<String>,
}

pub struct Downloader {
    client: Client,
    max_concurrent: usize,
    max_retry: usize,
}

type DownloadHandle = JoinHandle<Result<(String, PathBuf), DownloadError>>;

impl Downloader {
    pub fn new(client: Client, max_concurrent: usize, max_retry: usize) -> Self {
        Downloader {
            client,
            max_concurrent: max_concurrent.max(1),
            max_retry,
        }
    }

    /// Download everything concurrently, showing a progress bar per file.
    /// Returns a map from URL to the downloaded file
    pub async fn fetch(
        &self,
        mut to_download: Vec<DownloadJob>,
        download_path: &Path,
    ) -> Result<HashMap<String, PathBuf>> {
        if !download_path.is_dir() {
            tokio::fs::create_dir_all(download_path).await?;
        }

        let mut position = (0, to_download.len(), to_download.len().to_string().len());
        let mut res = HashMap::new();
        let mut handles: Vec<DownloadHandle> = Vec::with_capacity(self.max_concurrent);

        msg!("", "Downloading {} files...", to_download.len());
        let multibar = MultiProgress::new();
        let bar_template = if crate::cli::get_max_len() < 90 {
            " {wide_msg} {total_bytes:>10} {binary_bytes_per_sec:>12} {eta:>4} {percent:>3}%"
        } else {
            " {msg:<48} {total_bytes:>10} {binary_bytes_per_sec:>12} {eta:>4} [{wide_bar:.white/black}] {percent:>3}%"
        };
        let barsty = ProgressStyle::default_bar()
            .template(bar_template)
            .progress_chars("=>-");

        while !to_download.is_empty() || !handles.is_empty() {
            while handles.len() < self.max_concurrent {
                let job = match to_download.pop() {
                    Some(job) => job,
                    None => break,
                };
                let client = self.client.clone();
                let path = download_path.to_owned();
                let bar = multibar.insert(0, ProgressBar::new(0));
                bar.set_style(barsty.clone());
                position.0 += 1;
                handles.push(tokio::spawn(async move {
                    try_download_file(client, path, job, 0, position, bar).await
                }));
            }

            // Wait for any of them to stop
            let (download_res, _, remaining) = select_all(handles).await;
            handles = remaining;
            match download_res? {
                Ok((url, path)) => {
                    res.insert(url, path);
                }
                Err(err) => {
                    if err.retry <= self.max_retry {
                        let client = self.client.clone();
                        let path = download_path.to_owned();
                        handles.push(tokio::spawn(async move {
                            try_download_file(client, path, err.job, err.retry, err.pos, err.bar)
                                .await
                        }));
                    } else {
                        return Err(err.error);
                    }
                }
            }
        }
        Ok(res)
    }
}

struct DownloadError {
    error: anyhow::Error,
    job: DownloadJob,
    retry: usize,
    pos: (usize, usize, usize),
    bar: ProgressBar,
}

async fn try_download_file(
    client: Client,
    path: PathBuf,
    job: DownloadJob,
    retry: usize,
    pos: (usize, usize, usize),
    bar: ProgressBar,
) -> Result<(String, PathBuf), DownloadError> {
    match download_file(&client, &path, job.clone(), pos, bar.clone()).await {
        Ok(res) => Ok(res),
        Err(error) => Err({
            bar.reset();
            DownloadError {
                error,
                job,
                retry: retry + 1,
                pos,
                bar,
            }
        }),
    }
}

async fn download_file(
    client: &Client,
    path: &Path,
    job: DownloadJob,
    pos: (usize, usize, usize),
    bar: ProgressBar,
) -> Result<(String, PathBuf)> {
    let mut resp = client.get(&job.url).send().await?;
    resp.error_for_status_ref()?;
    let filename = match job.filename {
        Some(n) => n,
        None => resp
            .url()
            .path_segments()
            .and_then(|segments| segments.last())
            .and_then(|name| if name.is_empty() { None } else { Some(name) })
            .ok_or_else(|| format_err!("{} doesn't contain filename", &job.url))?
            .to_string(),
    };
    let msg = job.description.as_ref().unwrap_or(&filename);

    let mut progress_text = format!("({:0width$}/{}) {}", pos.0, pos.1, msg, width = pos.2);
    if console::measure_text_width(&progress_text) > 48 {
        progress_text = console::truncate_str(&progress_text, 45, "...").to_string();
    }
    bar.set_message(progress_text);
    bar.set_length(resp.content_length().unwrap_or(0));
    bar.set_position(0);
    bar.reset();

    let file_path = path.join(&filename);
    let mut f = File::create(&file_path).await?;
    while let Some(chunk) = resp.chunk().await? {
        f.write_all(&chunk).await?;
        bar.inc(chunk.len() as u64);
    }
    f.flush().await?;

    bar.finish_and_clear();
    bar.println(format!(
        "{}{}",
        crate::cli::gen_prefix(&console::style("DONE").dim().to_string()),
        &msg
    ));
    Ok((job.url, file_path))
}
