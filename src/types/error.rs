use super::PackageType;
use thiserror::Error;

#[derive(Error, Clone, Debug, PartialEq, Eq)]
pub enum BumpError {
    #[error("No preformatted listing block found on the mirror page")]
    ListingBlockMissing,
    #[error("No version row found in the package info table")]
    VersionRowMissing,
    #[error("Manifest has {updated} hash entries but {expected} hashes were provided")]
    HashCountMismatch { expected: usize, updated: usize },
    #[error("No {0} hash was provided for the manifest")]
    MissingHash(PackageType),
    #[error("Failed to extract package name and version from the descriptor")]
    EmptyDescriptor,
    #[error("No source files found on the mirror for {0}")]
    NoSources(String),
}
