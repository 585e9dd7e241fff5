use anyhow::{bail, Context, Result};
use clap::Parser;
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::{
    path::{Path, PathBuf},
    time::Duration,
};

/// Name of the catalog cache file inside the work directory
pub const CATALOG_CACHE_NAME: &str = "mirror_cache.json";

#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(default)]
pub struct Config {
    /// Where package repositories are cloned and tarballs are stored
    pub work_dir: PathBuf,
    /// Directory listing of the upstream source archive
    pub mirror_url: String,
    /// Package info pages, followed by the package short name
    pub package_info_url: String,
    pub filestore_url: String,
    pub cache_ttl_days: u64,
    /// Filename fragments marking platform-specific archives
    pub arch_markers: Vec<String>,
    pub preferred_branch: String,
    pub tarball_suffix: String,
    pub max_concurrent: usize,
    pub max_retry: usize,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            work_dir: PathBuf::from("texbump_tmp"),
            mirror_url: "https://mirror.truenetwork.ru/CTAN/systems/texlive/tlnet/archive/"
                .to_owned(),
            package_info_url: "https://ctan.org/pkg/".to_owned(),
            filestore_url: "http://file-store.rosalinux.ru/api/v1/upload".to_owned(),
            cache_ttl_days: 7,
            arch_markers: [
                "armhf",
                "aarch64",
                "i386",
                "universal-darwin",
                "win",
                "amd64",
                "freebsd",
                "x86_64",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            preferred_branch: "rosa2023.1".to_owned(),
            tarball_suffix: "tar.xz".to_owned(),
            max_concurrent: 5,
            max_retry: 3,
        }
    }
}

impl Config {
    /// Read config from `path`. A missing file means all defaults
    pub fn load(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Ok(Config::default());
        }
        let data = std::fs::read_to_string(path)
            .context(format!("Failed to read config file {}", path.display()))?;
        let config: Config = toml::from_str(&data)
            .context(format!("Failed to parse config file {}", path.display()))?;
        config.check_sanity()?;
        Ok(config)
    }

    pub fn check_sanity(&self) -> Result<()> {
        lazy_static! {
            static ref BASE_URL: Regex = Regex::new("^https?://[^ ]+/$").unwrap();
        }

        for (field, url) in [
            ("mirror_url", &self.mirror_url),
            ("package_info_url", &self.package_info_url),
        ] {
            if !BASE_URL.is_match(url) {
                bail!("{} must be an http(s) URL ending with '/', got {}", field, url);
            }
        }
        if self.cache_ttl_days == 0 {
            bail!("cache_ttl_days must be at least 1");
        }
        if self.max_concurrent == 0 {
            bail!("max_concurrent must be at least 1");
        }
        Ok(())
    }

    pub fn catalog_config(&self) -> CatalogConfig {
        CatalogConfig {
            cache_path: self.work_dir.join(CATALOG_CACHE_NAME),
            ttl: Duration::from_secs(self.cache_ttl_days * 24 * 60 * 60),
            mirror_url: self.mirror_url.clone(),
            arch_markers: self.arch_markers.clone(),
        }
    }
}

/// Everything the catalog builder needs to know
#[derive(Debug, Clone)]
pub struct CatalogConfig {
    pub cache_path: PathBuf,
    pub ttl: Duration,
    pub mirror_url: String,
    pub arch_markers: Vec<String>,
}

#[derive(Parser)]
#[clap(about, version, author)]
pub struct Opts {
    #[clap(
        short,
        long,
        default_value = "texbump.toml",
        help = "Path to the config file"
    )]
    pub config: PathBuf,
    #[clap(short, long, help = "Print additional debug information")]
    pub verbose: bool,
    #[clap(short, long, help = "Answer yes to all confirmations")]
    pub yes: bool,
    #[clap(subcommand)]
    pub subcmd: SubCmd,
}

#[derive(Parser)]
pub enum SubCmd {
    /// Bump a package repository to the latest upstream release
    Update(UpdatePkg),
    /// Build the mirror file catalog, or rebuild it with --force
    RefreshCatalog(RefreshCatalog),
    /// Show files available on the mirror for a package
    Sources(ShowSources),
    /// List files included by a package descriptor
    Files(ShowFiles),
    /// Clone a package repository and check out its newest branch
    Clone(ClonePkg),
}

#[derive(Parser)]
pub struct UpdatePkg {
    /// Git URL of the package repository
    pub repo_url: String,
    /// Drop comment lines from the descriptor
    #[clap(long)]
    pub remove_comments: bool,
}

#[derive(Parser)]
pub struct RefreshCatalog {
    /// Ignore the cached catalog
    #[clap(short, long)]
    pub force: bool,
}

#[derive(Parser)]
pub struct ShowSources {
    /// Package short name, e.g. "amsmath"
    pub name: String,
}

#[derive(Parser)]
pub struct ShowFiles {
    /// Path to the package descriptor
    pub descriptor: PathBuf,
}

#[derive(Parser)]
pub struct ClonePkg {
    /// Git URL of the package repository
    pub repo_url: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config() {
        let config: Config = toml::from_str(
            r#"
            work_dir = "/tmp/bump"
            cache_ttl_days = 3
            "#,
        )
        .unwrap();
        assert_eq!(config.work_dir, PathBuf::from("/tmp/bump"));
        assert_eq!(config.cache_ttl_days, 3);
        assert_eq!(config.max_retry, 3);
        assert!(config.check_sanity().is_ok());

        let catalog = config.catalog_config();
        assert_eq!(catalog.cache_path, PathBuf::from("/tmp/bump/mirror_cache.json"));
        assert_eq!(catalog.ttl, Duration::from_secs(3 * 86400));
    }

    #[test]
    fn test_bad_urls() {
        let config = Config {
            mirror_url: "ftp://mirror.example.org/archive".to_owned(),
            ..Default::default()
        };
        assert!(config.check_sanity().is_err());
    }

    #[test]
    fn test_missing_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(&dir.path().join("nope.toml")).unwrap();
        assert_eq!(config.cache_ttl_days, 7);
        assert_eq!(config.arch_markers.len(), 8);
    }
}
