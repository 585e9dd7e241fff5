mod catalog;
mod descriptor;
mod error;

pub use catalog::{FileMetadata, MirrorCatalog, Placement};
pub use descriptor::{needs_update, IncludedFile, PackageDescriptor};
pub use error::BumpError;

use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of a source archive. Every package ships up to one of each
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum PackageType {
    Main,
    Source,
    Doc,
}

/// Manifest keys are matched against these fragments in order
const MANIFEST_KEY_TABLE: [(&str, PackageType); 2] =
    [("doc", PackageType::Doc), ("source", PackageType::Source)];

impl PackageType {
    /// Classify by the second dot-separated segment of a mirror filename
    pub fn from_listing_kind(kind: &str) -> Self {
        match kind.to_lowercase().as_str() {
            "doc" => PackageType::Doc,
            "source" => PackageType::Source,
            _ => PackageType::Main,
        }
    }

    /// Classify a checksum manifest entry by its key
    pub fn from_manifest_key(key: &str) -> Self {
        MANIFEST_KEY_TABLE
            .iter()
            .find(|(fragment, _)| key.contains(fragment))
            .map(|(_, t)| *t)
            .unwrap_or(PackageType::Main)
    }

    /// Filename infix used on the mirror, e.g. `foo.doc.tar.xz`
    pub fn file_infix(&self) -> Option<&'static str> {
        match self {
            PackageType::Main => None,
            PackageType::Source => Some("source"),
            PackageType::Doc => Some("doc"),
        }
    }
}

impl fmt::Display for PackageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PackageType::Main => "MAIN",
            PackageType::Source => "SOURCE",
            PackageType::Doc => "DOC",
        };
        f.write_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_listing_kind() {
        let t = vec![
            ("doc", PackageType::Doc),
            ("DOC", PackageType::Doc),
            ("source", PackageType::Source),
            ("tar", PackageType::Main),
            ("r12345", PackageType::Main),
        ];
        for (kind, expected) in t {
            assert_eq!(PackageType::from_listing_kind(kind), expected);
        }
    }

    #[test]
    fn test_manifest_key() {
        let t = vec![
            ("foo.doc.tar.xz", PackageType::Doc),
            ("foo.source.tar.xz", PackageType::Source),
            ("foo.tar.xz", PackageType::Main),
            // First match in the table wins
            ("docsource.tar.xz", PackageType::Doc),
        ];
        for (key, expected) in t {
            assert_eq!(PackageType::from_manifest_key(key), expected);
        }
    }
}
