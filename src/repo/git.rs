use crate::{debug, info};

use anyhow::{bail, Context, Result};
use std::{
    path::{Path, PathBuf},
    process::Command,
};

pub fn clone(url: &str, dest: &Path) -> Result<()> {
    info!("Cloning {}...", url);
    let dest_str = dest.to_string_lossy();
    git_run(&["clone", url, &*dest_str], None).context(
        "Failed to clone the package repository. Check your connection and that the git host is responding, then try again",
    )?;
    Ok(())
}

/// Newest remote branch name, without the `origin/` prefix
pub fn latest_remote_branch(repo: &Path) -> Result<String> {
    let refs = git_run(
        &["for-each-ref", "--format=%(refname:short)", "refs/remotes/origin"],
        Some(repo),
    )?;
    match pick_branch(&refs) {
        Some(branch) => Ok(branch),
        None => bail!("Repository has no remote branches"),
    }
}

/// Last `origin/*` ref in listing order, skipping the symbolic HEAD
fn pick_branch(refs: &str) -> Option<String> {
    refs.lines()
        .map(str::trim)
        .filter_map(|r| r.strip_prefix("origin/"))
        .filter(|b| *b != "HEAD")
        .last()
        .map(|b| b.to_owned())
}

pub fn checkout(repo: &Path, branch: &str) -> Result<()> {
    info!("Checking out {}...", branch);
    git_run(&["checkout", branch], Some(repo))
        .context(format!("Failed to check out branch {}", branch))?;
    Ok(())
}

/// Commit `files` and push the current branch
pub fn commit_and_push(repo: &Path, files: &[PathBuf], message: &str) -> Result<()> {
    let mut add = vec!["add".to_owned(), "--".to_owned()];
    add.extend(files.iter().map(|f| f.to_string_lossy().into_owned()));
    git_run(&add, Some(repo)).context("Failed to stage changes")?;
    git_run(&["commit", "-m", message], Some(repo)).context("Failed to commit changes")?;
    info!("Committed changes");

    git_run(&["push", "origin"], Some(repo)).context("Failed to push to origin")?;
    info!("Pushed to origin");
    Ok(())
}

fn git_run<T: AsRef<std::ffi::OsStr>>(args: &[T], cwd: Option<&Path>) -> Result<String> {
    let mut cmd = Command::new("git");
    if let Some(cwd) = cwd {
        cmd.current_dir(cwd);
    }
    cmd.args(args);
    debug!("Running {:?}", cmd);

    let output = cmd.output().context("Failed to execute git")?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        match output.status.code() {
            Some(code) => bail!("git exited with return code {}: {}", code, stderr.trim()),
            None => bail!("git process was terminated by signal"),
        }
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pick_branch() {
        let t = vec![
            ("origin\norigin/master\norigin/rosa2021.1\norigin/rosa2023.1\n", Some("rosa2023.1")),
            ("origin/HEAD\norigin/master\n", Some("master")),
            ("origin/HEAD\n", None),
            ("", None),
        ];
        for (refs, expected) in t {
            assert_eq!(pick_branch(refs).as_deref(), expected);
        }
    }
}
