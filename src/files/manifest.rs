use crate::{
    info,
    types::{BumpError, PackageType},
    utils::patcher::{for_each_line, Line, PatchOptions},
};

use anyhow::{Context, Result};
use std::{collections::BTreeMap, path::Path};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Block {
    Outside,
    /// After the `sources:` key
    Sources,
}

struct ManifestRewrite<'a> {
    block: Block,
    updated: usize,
    hashes: &'a BTreeMap<PackageType, String>,
}

/// Put fresh hashes into the checksum manifest (`.abf.yml`).
///
/// Every entry line gets the hash for the archive type its key names. Fails
/// unless exactly one entry was rewritten per provided hash.
pub fn write(path: &Path, hashes: &BTreeMap<PackageType, String>) -> Result<usize> {
    info!("Updating hashes in {}...", path.display());
    let mut state = ManifestRewrite {
        block: Block::Outside,
        updated: 0,
        hashes,
    };
    for_each_line(path, &mut state, rewrite_line, PatchOptions::default())
        .context(format!("Failed to update manifest {}", path.display()))?;

    if state.updated != hashes.len() {
        return Err(BumpError::HashCountMismatch {
            expected: hashes.len(),
            updated: state.updated,
        })
        .context(format!(
            "{} needs manual inspection, not all of the provided hashes were used",
            path.display()
        ));
    }
    Ok(state.updated)
}

fn rewrite_line(state: &mut ManifestRewrite, line: &Line) -> Result<String> {
    // Keys such as `removed_sources:` stay as they are
    if line.words.len() == 1 {
        if line.section == "sources" {
            state.block = Block::Sources;
            return Ok(line.raw.to_owned());
        }
        if state.block == Block::Sources {
            return Ok(line.raw.to_owned());
        }
    }

    let kind = PackageType::from_manifest_key(&line.section);
    let hash = state
        .hashes
        .get(&kind)
        .ok_or(BumpError::MissingHash(kind))?;
    state.updated += 1;
    Ok(format!("  {}: {}\n", line.section, hash))
}
