use super::PackageType;
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct FileMetadata {
    #[serde(rename = "type")]
    pub kind: PackageType,
    /// Revision or platform tag, empty for generic archives
    #[serde(default)]
    pub version: String,
    pub upload_time: NaiveDateTime,
    /// In KiB
    pub size: f64,
}

/// Which list of a `PackageCatalogEntry` a file belongs to
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Placement {
    General,
    VersionSpecific,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct PackageCatalogEntry {
    #[serde(default)]
    pub version_specific: Vec<FileMetadata>,
    #[serde(default)]
    pub general: Vec<FileMetadata>,
}

static EMPTY_ENTRY: PackageCatalogEntry = PackageCatalogEntry {
    version_specific: Vec::new(),
    general: Vec::new(),
};

impl PackageCatalogEntry {
    pub fn push(&mut self, meta: FileMetadata, placement: Placement) {
        match placement {
            Placement::General => self.general.push(meta),
            Placement::VersionSpecific => self.version_specific.push(meta),
        }
    }

    /// Generic files first, then the version-specific ones
    pub fn all(&self) -> impl Iterator<Item = &FileMetadata> {
        self.general.iter().chain(self.version_specific.iter())
    }
}

/// Index of every file available on the mirror, keyed by package short name
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct MirrorCatalog {
    pub update_time: DateTime<Utc>,
    #[serde(default)]
    pub files: BTreeMap<String, PackageCatalogEntry>,
}

impl MirrorCatalog {
    pub fn new(update_time: DateTime<Utc>) -> Self {
        MirrorCatalog {
            update_time,
            files: BTreeMap::new(),
        }
    }

    pub fn insert(&mut self, package: &str, meta: FileMetadata, placement: Placement) {
        self.files
            .entry(package.to_owned())
            .or_default()
            .push(meta, placement);
    }

    /// Entry for a package. Unknown packages have an empty entry
    pub fn get(&self, package: &str) -> &PackageCatalogEntry {
        self.files.get(package).unwrap_or(&EMPTY_ENTRY)
    }

    /// All files, generic and version-specific, available for a package
    pub fn related(&self, package: &str) -> Vec<&FileMetadata> {
        self.get(package).all().collect()
    }

    pub fn contains(&self, package: &str) -> bool {
        self.files.contains_key(package)
    }

    pub fn package_names(&self) -> impl Iterator<Item = &str> {
        self.files.keys().map(|k| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn meta(kind: PackageType, version: &str) -> FileMetadata {
        FileMetadata {
            kind,
            version: version.to_owned(),
            upload_time: NaiveDate::from_ymd_opt(2023, 2, 27)
                .unwrap()
                .and_hms_opt(21, 32, 0)
                .unwrap(),
            size: 1.5,
        }
    }

    #[test]
    fn test_missing_package_is_empty() {
        let catalog = MirrorCatalog::new(Utc::now());
        assert!(catalog.related("nope").is_empty());
        assert_eq!(catalog.get("nope"), &PackageCatalogEntry::default());
        assert!(!catalog.contains("nope"));
    }

    #[test]
    fn test_related_is_union() {
        let mut catalog = MirrorCatalog::new(Utc::now());
        catalog.insert("foo", meta(PackageType::Main, "r123"), Placement::VersionSpecific);
        catalog.insert("foo", meta(PackageType::Main, ""), Placement::General);
        catalog.insert("foo", meta(PackageType::Doc, ""), Placement::General);
        catalog.insert("bar", meta(PackageType::Main, ""), Placement::General);

        let related = catalog.related("foo");
        assert_eq!(related.len(), 3);
        // General entries come first
        assert_eq!(related[0].version, "");
        assert_eq!(related[2].version, "r123");
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.package_names().collect::<Vec<_>>(), vec!["bar", "foo"]);
    }
}
