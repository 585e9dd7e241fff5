use crate::{
    info,
    types::{IncludedFile, PackageDescriptor, PackageType},
    utils::patcher::{for_each_line, Line, PatchOptions},
};

use anyhow::{format_err, Context, Result};
use std::path::Path;

/// Read name, version, release and included files from a descriptor
pub fn read(path: &Path) -> Result<PackageDescriptor> {
    info!("Parsing {} for package data...", path.display());
    let mut descriptor = PackageDescriptor::default();
    for_each_line(path, &mut descriptor, collect_field, PatchOptions::read_only())
        .context(format!("Failed to parse descriptor {}", path.display()))?;
    Ok(descriptor)
}

fn collect_field(descriptor: &mut PackageDescriptor, line: &Line) -> Result<String> {
    match line.section.as_str() {
        "version" => descriptor.version = value(line)?.to_owned(),
        "name" => descriptor.name = value(line)?.to_owned(),
        "release" => {
            let release = value(line)?;
            descriptor.release = release
                .parse()
                .context(format!("Release {:?} is not a number", release))?;
        }
        section if section.contains("texmfdistdir") || section == "%doc" => {
            // A source line may carry %doc as well, so check for source first
            let kind = if line.raw.contains("source") {
                PackageType::Source
            } else if section == "%doc" {
                PackageType::Doc
            } else {
                PackageType::Main
            };
            if let Some(path) = line.words.last() {
                descriptor.included_files.push(IncludedFile {
                    path: path.to_string(),
                    kind,
                });
            }
        }
        _ => (),
    }
    Ok(String::new())
}

fn value<'a>(line: &Line<'a>) -> Result<&'a str> {
    line.words
        .get(1)
        .copied()
        .ok_or_else(|| format_err!("{} has no value", line.section))
}

/// Swap the version and release of `old` for those of `new`, optionally
/// dropping comment lines
pub fn write(
    path: &Path,
    old: &PackageDescriptor,
    new: &PackageDescriptor,
    remove_comments: bool,
) -> Result<()> {
    info!("Updating descriptor {}...", path.display());
    let old_release = old.release.to_string();
    let new_release = new.release.to_string();
    for_each_line(
        path,
        &mut (),
        |_, line| {
            let res = match line.section.as_str() {
                "version" => line.raw.replacen(&old.version, &new.version, 1),
                "release" => line.raw.replacen(&old_release, &new_release, 1),
                "#" if remove_comments => String::new(),
                _ => line.raw.to_owned(),
            };
            Ok(res)
        },
        PatchOptions::default(),
    )
    .context(format!("Failed to update descriptor {}", path.display()))
}
