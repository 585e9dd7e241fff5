use crate::types::{FileMetadata, PackageType, Placement};

use anyhow::{bail, format_err, Context, Result};
use chrono::NaiveDateTime;

/// Date layouts seen in mirror listings
const DATE_FORMATS: [&str; 5] = [
    "%d-%b-%Y %H:%M",
    "%d-%b-%Y %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%b-%d %H:%M:%S",
];

/// One listing entry, ready to be filed in the catalog
#[derive(Debug, Clone, PartialEq)]
pub struct ClassifiedEntry {
    pub package: String,
    pub metadata: FileMetadata,
    pub placement: Placement,
}

/// Turn a listing filename (`<package>.<kind>...<suffix>`) and its
/// `<date> <size>` metadata line into a catalog entry
pub fn classify(filename: &str, metadata: &str, arch_markers: &[String]) -> Result<ClassifiedEntry> {
    let segments: Vec<&str> = filename.split('.').collect();
    let package = segments[0];
    if package.is_empty() {
        bail!("Listing entry {:?} has no package name", filename);
    }
    let kind = PackageType::from_listing_kind(segments.get(1).unwrap_or(&""));
    let (upload_time, size) = parse_metadata_line(metadata)
        .context(format!("Bad metadata for listing entry {}", filename))?;

    // Third segment from the end holds the revision, e.g. `foo.r12345.tar.xz`
    let tag = segments
        .len()
        .checked_sub(3)
        .map(|i| segments[i])
        .unwrap_or("");
    let is_arch_specific = arch_markers
        .iter()
        .any(|marker| filename.contains(marker.as_str()));

    let (placement, version) = if tag.starts_with('r') || is_arch_specific {
        (Placement::VersionSpecific, tag.to_owned())
    } else {
        (Placement::General, String::new())
    };

    Ok(ClassifiedEntry {
        package: package.to_owned(),
        metadata: FileMetadata {
            kind,
            version,
            upload_time,
            size,
        },
        placement,
    })
}

/// Split `<free-form date> <size>` on the last whitespace run
pub fn parse_metadata_line(line: &str) -> Result<(NaiveDateTime, f64)> {
    let line = line.trim();
    let (date, size) = line
        .rsplit_once(char::is_whitespace)
        .ok_or_else(|| format_err!("Expected \"<date> <size>\", got {:?}", line))?;
    Ok((parse_upload_time(date.trim())?, parse_size(size)?))
}

fn parse_upload_time(s: &str) -> Result<NaiveDateTime> {
    for format in DATE_FORMATS {
        if let Ok(t) = NaiveDateTime::parse_from_str(s, format) {
            return Ok(t);
        }
    }
    bail!("Unrecognized date {:?}", s)
}

/// Size in KiB. Plain numbers are bytes, numbers with a unit suffix are taken
/// as they are
pub fn parse_size(token: &str) -> Result<f64> {
    // Directories have no size
    if token == "-" {
        return Ok(0.0);
    }
    let last = token
        .chars()
        .last()
        .ok_or_else(|| format_err!("Empty size"))?;
    if last.is_alphabetic() {
        let number = &token[..token.len() - last.len_utf8()];
        return number
            .parse::<f64>()
            .context(format!("Malformed size {:?}", token));
    }
    let bytes: u64 = token.parse().context(format!("Malformed size {:?}", token))?;
    Ok((bytes as f64 / 1024.0 * 100.0).round() / 100.0)
}
