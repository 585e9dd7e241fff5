/// Show catalog entries and descriptor contents in tables
use crate::{
    files::descriptor,
    info,
    types::{BumpError, FileMetadata, MirrorCatalog, PackageDescriptor},
};

use anyhow::Result;
use console::style;
use std::{cmp::Reverse, path::Path};
use tabled::{Alignment, Column, Full, Modify, Style, Table, Tabled};

/// Suggestions offered for an unknown package name
const MAX_SUGGESTIONS: usize = 5;

#[derive(Tabled)]
struct SourceRow {
    #[header("Type")]
    kind: String,
    #[header("Tag")]
    tag: String,
    #[header("Uploaded")]
    uploaded: String,
    #[header("Size (KiB)")]
    size: String,
}

#[derive(Tabled)]
struct FileRow {
    #[header("Type")]
    kind: String,
    #[header("Path")]
    path: String,
}

impl From<&FileMetadata> for SourceRow {
    fn from(meta: &FileMetadata) -> Self {
        SourceRow {
            kind: meta.kind.to_string(),
            tag: meta.version.clone(),
            uploaded: meta.upload_time.format("%F %R").to_string(),
            size: format!("{:.2}", meta.size),
        }
    }
}

pub fn show_sources(catalog: &MirrorCatalog, name: &str) -> Result<()> {
    if !catalog.contains(name) {
        let suggestions = similar_names(catalog, name);
        if !suggestions.is_empty() {
            info!("Did you mean: {}", suggestions.join(", "));
        }
        return Err(BumpError::NoSources(name.to_owned()).into());
    }

    let entry = catalog.get(name);
    if !entry.general.is_empty() {
        println!("{} files for {}:", style("Generic").green().bold(), name);
        print_sources(&entry.general);
    }
    if !entry.version_specific.is_empty() {
        println!(
            "{} files for {}:",
            style("Version-specific").yellow().bold(),
            name
        );
        print_sources(&entry.version_specific);
    }
    Ok(())
}

fn print_sources(files: &[FileMetadata]) {
    let rows: Vec<SourceRow> = files.iter().map(SourceRow::from).collect();
    let table = Table::new(&rows)
        .with(Modify::new(Full).with(Alignment::left()))
        // Size column should align right
        .with(Modify::new(Column(3..4)).with(Alignment::right()))
        .with(Modify::new(Full).with(|s: &str| format!(" {} ", s)))
        .with(Style::psql());
    println!("{}", table);
}

/// Closest package names, best first
fn similar_names(catalog: &MirrorCatalog, name: &str) -> Vec<String> {
    let mut names: Vec<(u8, &str)> = catalog
        .package_names()
        .map(|n| ((255.0 * strsim::jaro_winkler(n, name)) as u8, n))
        .filter(|(score, _)| *score > 200)
        .collect();
    names.sort_by_key(|(score, n)| (Reverse(*score), *n));
    names
        .into_iter()
        .take(MAX_SUGGESTIONS)
        .map(|(_, n)| n.to_owned())
        .collect()
}

pub fn show_files(path: &Path) -> Result<()> {
    let d = descriptor::read(path)?;
    info!("{}: {} included files", d, d.included_files.len());
    let rows = file_rows(&d);
    let table = Table::new(&rows)
        .with(Modify::new(Full).with(Alignment::left()))
        .with(Modify::new(Full).with(|s: &str| format!(" {} ", s)))
        .with(Style::psql());
    println!("{}", table);
    Ok(())
}

fn file_rows(d: &PackageDescriptor) -> Vec<FileRow> {
    d.included_files
        .iter()
        .map(|f| FileRow {
            kind: f.kind.to_string(),
            path: f.path.clone(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{PackageType, Placement};
    use chrono::{NaiveDate, Utc};

    #[test]
    fn test_similar_names() {
        let mut catalog = MirrorCatalog::new(Utc::now());
        let meta = FileMetadata {
            kind: PackageType::Main,
            version: String::new(),
            upload_time: NaiveDate::from_ymd_opt(2023, 1, 1)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap(),
            size: 1.0,
        };
        for name in ["amsmath", "amsfonts", "zhnumber"] {
            catalog.insert(name, meta.clone(), Placement::General);
        }

        let res = similar_names(&catalog, "amsmth");
        assert_eq!(res.first().map(|s| s.as_str()), Some("amsmath"));
        assert!(!res.contains(&"zhnumber".to_owned()));
    }

    #[test]
    fn test_file_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("texlive-foo.spec");
        std::fs::write(
            &path,
            "Name: texlive-foo\nVersion: 1.0\n%files\n%{_texmfdistdir}/tex/latex/foo\n%doc %{_texmfdistdir}/doc/latex/foo\n%{_texmfdistdir}/source/latex/foo\n",
        )
        .unwrap();
        let d = descriptor::read(&path).unwrap();

        let kinds: Vec<String> = file_rows(&d).into_iter().map(|r| r.kind).collect();
        assert_eq!(kinds, vec!["MAIN", "DOC", "SOURCE"]);
    }
}
