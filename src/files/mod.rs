//! Adapters that read and patch the package repository's text files
pub mod descriptor;
pub mod manifest;
