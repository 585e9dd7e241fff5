pub mod git;
pub mod workdir;

use crate::{cli, config::Config, warn};

use anyhow::{bail, Result};
use console::style;
use std::path::PathBuf;

/// A package repository checked out in the work directory
#[derive(Debug)]
pub struct RepoData {
    pub url: String,
    /// Package short name, `texlive-foo.git` => `foo`
    pub name: String,
    pub path: PathBuf,
    pub data_path: PathBuf,
}

/// Package short name from a repository URL, rejecting URLs git can't clone over https
pub fn repo_name_from_url(url: &str) -> Result<String> {
    if !url.ends_with(".git") || url.starts_with("git") {
        bail!("{} is not an https repository URL ending with .git", url);
    }
    let last = url.rsplit('/').next().unwrap_or_default();
    let name = last.split('.').next().unwrap_or_default().replace("texlive-", "");
    if name.is_empty() {
        bail!("Cannot derive a package name from {}", url);
    }
    Ok(name)
}

/// Clone `url` into a fresh directory and check out its newest branch.
///
/// Returns None if the user refused the branch.
pub fn prepare(config: &Config, url: &str, assume_yes: bool) -> Result<Option<RepoData>> {
    let name = repo_name_from_url(url)?;
    workdir::create_work_dir(&config.work_dir)?;
    let path = workdir::create_repo_dir(&config.work_dir, &name)?;
    git::clone(url, &path)?;

    let branch = git::latest_remote_branch(&path)?;
    if !branch.contains(&config.preferred_branch) {
        warn!(
            "Branch {} not found",
            style(&config.preferred_branch).bold()
        );
        if !cli::ask_confirm(assume_yes, &format!("Proceed with {}?", branch))? {
            return Ok(None);
        }
    }
    git::checkout(&path, &branch)?;

    let data_path = workdir::create_data_dir(&path)?;
    Ok(Some(RepoData {
        url: url.to_owned(),
        name,
        path,
        data_path,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repo_name() {
        let t = vec![
            ("https://abf.io/import/texlive-amsmath.git", Some("amsmath")),
            ("https://abf.io/import/texlive-collection-basic.git", Some("collection-basic")),
            ("https://abf.io/import/fontawesome.git", Some("fontawesome")),
            ("git@abf.io:import/texlive-amsmath.git", None),
            ("https://abf.io/import/texlive-amsmath", None),
            ("https://abf.io/import/.git", None),
        ];
        for (url, expected) in t {
            assert_eq!(repo_name_from_url(url).ok().as_deref(), expected, "{}", url);
        }
    }
}
