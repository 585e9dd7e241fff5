use crate::{
    info,
    types::{PackageDescriptor, PackageType},
    warn,
};

use anyhow::{bail, Context, Result};
use std::{
    fs,
    path::{Path, PathBuf},
};

const DESCRIPTOR_SUFFIXES: &[&str] = &["spec"];
const MANIFEST_SUFFIXES: &[&str] = &["yml", "yaml"];

pub fn create_work_dir(work_dir: &Path) -> Result<()> {
    if !work_dir.is_dir() {
        fs::create_dir_all(work_dir).context("Failed to create work directory")?;
    }
    Ok(())
}

/// Empty directory for a repository clone, wiping what was there
pub fn create_repo_dir(work_dir: &Path, name: &str) -> Result<PathBuf> {
    let repo_path = work_dir.join(name);
    if repo_path.is_dir() {
        fs::remove_dir_all(&repo_path)
            .context(format!("Failed to clean {}", repo_path.display()))?;
    }
    fs::create_dir_all(&repo_path)?;
    Ok(repo_path)
}

/// Where downloaded tarballs go
pub fn create_data_dir(repo_path: &Path) -> Result<PathBuf> {
    let data_path = repo_path.join("data");
    fs::create_dir_all(&data_path)?;
    Ok(data_path)
}

/// Mirror filename of an archive, e.g. `foo.doc.tar.xz`
pub fn source_file_name(short_name: &str, kind: PackageType, tarball_suffix: &str) -> String {
    match kind.file_infix() {
        Some(infix) => format!("{}.{}.{}", short_name, infix, tarball_suffix),
        None => format!("{}.{}", short_name, tarball_suffix),
    }
}

/// Paths to the descriptor and the checksum manifest of a repository
pub fn locate_package_files(repo_path: &Path) -> Result<(PathBuf, PathBuf)> {
    let mut descriptor = None;
    let mut manifest = None;

    for entry in fs::read_dir(repo_path)? {
        let path = entry?.path();
        let suffix = match path.extension().and_then(|e| e.to_str()) {
            Some(suffix) => suffix,
            None => continue,
        };
        if DESCRIPTOR_SUFFIXES.contains(&suffix) {
            descriptor = Some(path);
        } else if MANIFEST_SUFFIXES.contains(&suffix) {
            manifest = Some(path);
        }
    }

    match (descriptor, manifest) {
        (Some(d), Some(m)) => Ok((d, m)),
        (None, _) => bail!("Descriptor (.spec) not found in {}", repo_path.display()),
        (_, None) => bail!("Checksum manifest (.yml) not found in {}", repo_path.display()),
    }
}

/// Convert CRLF and lone CR line endings to LF
pub fn normalize_line_endings(paths: &[&Path]) -> Result<()> {
    for path in paths {
        let content = fs::read(path).context(format!("Failed to read {}", path.display()))?;
        let normalized = normalize(&content);
        if normalized != content {
            fs::write(path, normalized).context(format!("Failed to write {}", path.display()))?;
        }
    }
    Ok(())
}

fn normalize(content: &[u8]) -> Vec<u8> {
    let mut res = Vec::with_capacity(content.len());
    let mut iter = content.iter().peekable();
    while let Some(&b) = iter.next() {
        if b == b'\r' {
            if iter.peek() == Some(&&b'\n') {
                iter.next();
            }
            res.push(b'\n');
        } else {
            res.push(b);
        }
    }
    res
}

/// Member names of an xz-compressed tarball
pub fn tarball_members(path: &Path) -> Result<Vec<String>> {
    let f = fs::File::open(path).context(format!("Failed to open {}", path.display()))?;
    let mut archive = tar::Archive::new(xz2::read::XzDecoder::new(f));
    let mut res = Vec::new();
    for entry in archive.entries()? {
        let entry = entry?;
        res.push(entry.path()?.display().to_string());
    }
    Ok(res)
}

pub fn log_tarballs(data_path: &Path) -> Result<()> {
    let mut paths: Vec<PathBuf> = fs::read_dir(data_path)?
        .filter_map(|e| e.ok().map(|e| e.path()))
        .collect();
    paths.sort();
    for path in paths {
        let name = path.file_name().unwrap_or_default().to_string_lossy();
        info!("====== File structure of {} ======", name);
        for member in tarball_members(&path).context(format!("Failed to read {}", name))? {
            info!("{}", member);
        }
    }
    Ok(())
}

pub fn log_package_files(descriptor: &PackageDescriptor) {
    warn!("The following list might be incomplete");
    for file in &descriptor.included_files {
        info!("{}: {}", file.kind, file.path);
    }
}
