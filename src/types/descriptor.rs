use super::PackageType;
use std::fmt;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IncludedFile {
    pub path: String,
    pub kind: PackageType,
}

/// Package metadata as recorded in a descriptor (`.spec`) file
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PackageDescriptor {
    pub name: String,
    pub epoch: u32,
    pub version: String,
    pub release: u32,
    pub included_files: Vec<IncludedFile>,
}

impl Default for PackageDescriptor {
    fn default() -> Self {
        PackageDescriptor {
            name: String::new(),
            epoch: 1,
            version: String::new(),
            release: 1,
            included_files: Vec::new(),
        }
    }
}

impl PackageDescriptor {
    pub fn is_empty(&self) -> bool {
        self.name.is_empty() || self.version.is_empty()
    }

    /// Name without the distribution prefix, `texlive-foo` => `foo`
    pub fn short_name(&self) -> &str {
        match self.name.split_once('-') {
            Some((_, rest)) => rest,
            None => &self.name,
        }
    }
}

impl fmt::Display for PackageDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}:{}-{}",
            self.name, self.epoch, self.version, self.release
        )
    }
}

/// Whether `new` should replace `old`.
///
/// Epochs and releases are compared numerically. Versions are opaque: any
/// difference counts as newer.
pub fn needs_update(old: &PackageDescriptor, new: &PackageDescriptor) -> bool {
    if old.epoch != new.epoch {
        return old.epoch < new.epoch;
    }
    if old.version != new.version {
        return true;
    }
    old.release < new.release
}
