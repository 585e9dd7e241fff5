mod classify;
pub use classify::classify;

use crate::{
    config::CatalogConfig,
    debug, info, remote,
    types::{BumpError, MirrorCatalog},
    utils::html,
    warn,
};

use anyhow::{Context, Result};
use chrono::Utc;
use reqwest::Client;
use std::{
    fs,
    future::Future,
    io::{BufReader, BufWriter, Write},
    path::Path,
    time::SystemTime,
};

/// Report parsing progress every this many entries
const PROGRESS_STEP: usize = 10000;

/// Builds the mirror catalog, or restores it from the on-disk cache
pub struct CatalogBuilder {
    config: CatalogConfig,
}

impl CatalogBuilder {
    pub fn new(config: CatalogConfig) -> Self {
        CatalogBuilder { config }
    }

    pub fn cache_path(&self) -> &Path {
        &self.config.cache_path
    }

    pub async fn build(&self, client: &Client) -> Result<MirrorCatalog> {
        self.build_with(SystemTime::now(), || {
            remote::fetch_page(client, &self.config.mirror_url)
        })
        .await
    }

    /// Same as `build`, with the clock and the listing fetch supplied by the caller
    pub async fn build_with<F, Fut>(&self, now: SystemTime, fetch: F) -> Result<MirrorCatalog>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<String>>,
    {
        info!("Acquiring available source files list...");
        if let Some(catalog) = self.load_cached(now)? {
            info!("Using cached catalog from {}", catalog.update_time.format("%F %R"));
            return Ok(catalog);
        }

        let page = fetch()
            .await
            .context("Failed to fetch mirror directory listing")?;
        let catalog = self.parse_listing(&page)?;
        self.store(&catalog)?;
        Ok(catalog)
    }

    /// Cached catalog, if the cache file is younger than the TTL
    pub fn load_cached(&self, now: SystemTime) -> Result<Option<MirrorCatalog>> {
        let path = &self.config.cache_path;
        if !is_cache_valid(path, &self.config, now) {
            return Ok(None);
        }

        let f = fs::File::open(path).context(format!("Failed to open {}", path.display()))?;
        match serde_json::from_reader(BufReader::new(f)) {
            Ok(catalog) => Ok(Some(catalog)),
            Err(e) => {
                warn!("Ignoring unreadable catalog cache: {}", e);
                Ok(None)
            }
        }
    }

    /// Build a catalog from the mirror's directory listing page
    pub fn parse_listing(&self, page: &str) -> Result<MirrorCatalog> {
        let block = html::find_blocks(page, "pre")
            .into_iter()
            .next()
            .ok_or(BumpError::ListingBlockMissing)?;
        // First two nodes are the parent directory link and its trailing text
        let nodes: Vec<html::Node> = html::children(block).into_iter().skip(2).collect();

        let total = nodes.len() / 2;
        if nodes.len() % 2 != 0 {
            debug!("Listing has a dangling entry, ignoring it");
        }
        info!("Parsing {} source files. This may take a while...", total);
        let mut catalog = MirrorCatalog::new(Utc::now());
        for (i, pair) in nodes.chunks_exact(2).enumerate() {
            if i > 0 && i % PROGRESS_STEP == 0 {
                info!("Parsed {}/{} source files", i, total);
            }
            let filename = listing_filename(&pair[0]);
            let entry = classify(filename, pair[1].text(), &self.config.arch_markers)?;
            catalog.insert(&entry.package, entry.metadata, entry.placement);
        }
        info!("Indexed {} packages", catalog.len());
        Ok(catalog)
    }

    fn store(&self, catalog: &MirrorCatalog) -> Result<()> {
        let path = &self.config.cache_path;
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.is_dir() {
                fs::create_dir_all(parent).context("Failed to create cache directory")?;
            }
        }
        let f = fs::File::create(path).context(format!("Failed to create {}", path.display()))?;
        let mut writer = BufWriter::new(f);
        serde_json::to_writer_pretty(&mut writer, catalog).context("Failed to write catalog cache")?;
        writer.flush().context("Failed to write catalog cache")?;
        info!("Saved catalog to {} for future reuse", path.display());
        Ok(())
    }

    /// Drop the cache so the next build hits the mirror
    pub fn invalidate(&self) -> Result<()> {
        let path = &self.config.cache_path;
        if path.is_file() {
            fs::remove_file(path).context("Failed to remove catalog cache")?;
        }
        Ok(())
    }
}

/// Long names are truncated in the link text, the href always has all of it
fn listing_filename(node: &html::Node) -> &str {
    match node {
        html::Node::Element {
            href: Some(href),
            text,
        } if text.ends_with("..>") => href,
        other => other.text().trim(),
    }
}

fn is_cache_valid(path: &Path, config: &CatalogConfig, now: SystemTime) -> bool {
    let modified = match fs::metadata(path).and_then(|m| m.modified()) {
        Ok(t) => t,
        Err(_) => return false,
    };
    modified + config.ttl > now
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PackageType;
    use std::{
        path::PathBuf,
        sync::atomic::{AtomicUsize, Ordering},
        time::Duration,
    };

    const DAY: Duration = Duration::from_secs(24 * 60 * 60);

    const LISTING: &str = r#"<html>
<head><title>Index of /archive/</title></head>
<body>
<h1>Index of /archive/</h1><hr><pre><a href="../">../</a>
<a href="amsmath.doc.tar.xz">amsmath.doc.tar.xz</a>                                 27-Feb-2023 21:32              204800
<a href="amsmath.r66000.tar.xz">amsmath.r66000.tar.xz</a>                              27-Feb-2023 21:32               40960
<a href="amsmath.source.tar.xz">amsmath.source.tar.xz</a>                              27-Feb-2023 21:32                1024
<a href="amsmath.tar.xz">amsmath.tar.xz</a>                                     27-Feb-2023 21:32               40960
<a href="luatex.x86_64-linux.tar.xz">luatex.x86_64-linux.tar.xz</a>                         01-Mar-2023 10:00             3145728
<a href="collection-langjapanese.doc.r66000.tar.xz">collection-langjapanese.doc.r66000.tar..&gt;</a> 01-Mar-2023 10:00                 512
</pre><hr></body>
</html>
"#;

    fn builder(dir: &Path) -> CatalogBuilder {
        CatalogBuilder::new(CatalogConfig {
            cache_path: dir.join("cache").join("mirror_cache.json"),
            ..crate::config::Config::default().catalog_config()
        })
    }

    #[test]
    fn test_parse_listing() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = builder(dir.path()).parse_listing(LISTING).unwrap();

        assert_eq!(catalog.len(), 3);
        let amsmath = catalog.get("amsmath");
        assert_eq!(amsmath.general.len(), 3);
        assert_eq!(amsmath.version_specific.len(), 1);
        assert_eq!(amsmath.version_specific[0].version, "r66000");
        assert_eq!(amsmath.general[0].kind, PackageType::Doc);
        assert_eq!(amsmath.general[0].size, 200.0);
        assert_eq!(amsmath.general[1].kind, PackageType::Source);

        let luatex = catalog.get("luatex");
        assert!(luatex.general.is_empty());
        assert_eq!(luatex.version_specific[0].version, "x86_64-linux");

        // Truncated link text falls back to the href
        let japanese = catalog.get("collection-langjapanese");
        assert_eq!(japanese.version_specific[0].kind, PackageType::Doc);
        assert_eq!(japanese.version_specific[0].version, "r66000");
    }

    #[test]
    fn test_missing_listing_block() {
        let dir = tempfile::tempdir().unwrap();
        let err = builder(dir.path())
            .parse_listing("<html><body>Maintenance</body></html>")
            .unwrap_err();
        assert_eq!(
            err.downcast_ref::<BumpError>(),
            Some(&BumpError::ListingBlockMissing)
        );
    }

    #[test]
    fn test_placement_is_exclusive() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = builder(dir.path()).parse_listing(LISTING).unwrap();
        for entry in catalog.files.values() {
            for meta in &entry.general {
                assert!(meta.version.is_empty());
            }
            for meta in &entry.version_specific {
                assert!(!meta.version.is_empty());
            }
        }
    }

    #[tokio::test]
    async fn test_fresh_cache_skips_fetch() {
        let dir = tempfile::tempdir().unwrap();
        let builder = builder(dir.path());
        let fetches = AtomicUsize::new(0);

        let built = builder
            .build_with(SystemTime::now(), || async {
                fetches.fetch_add(1, Ordering::SeqCst);
                Ok::<_, anyhow::Error>(LISTING.to_owned())
            })
            .await
            .unwrap();
        assert_eq!(fetches.load(Ordering::SeqCst), 1);
        assert!(builder.cache_path().is_file());

        // Three days later the snapshot is still good
        let cached = builder
            .build_with(SystemTime::now() + 3 * DAY, || async {
                fetches.fetch_add(1, Ordering::SeqCst);
                Ok::<_, anyhow::Error>(String::new())
            })
            .await
            .unwrap();
        assert_eq!(fetches.load(Ordering::SeqCst), 1);
        assert_eq!(cached, built);
    }

    #[tokio::test]
    async fn test_stale_cache_is_rebuilt() {
        let dir = tempfile::tempdir().unwrap();
        let builder = builder(dir.path());
        builder
            .build_with(SystemTime::now(), || async { Ok::<_, anyhow::Error>(LISTING.to_owned()) })
            .await
            .unwrap();

        let smaller: String = LISTING
            .lines()
            .filter(|l| !l.contains("luatex"))
            .map(|l| format!("{}\n", l))
            .collect();
        let fetches = AtomicUsize::new(0);
        let rebuilt = builder
            .build_with(SystemTime::now() + 8 * DAY, || async {
                fetches.fetch_add(1, Ordering::SeqCst);
                Ok::<_, anyhow::Error>(smaller.clone())
            })
            .await
            .unwrap();
        assert_eq!(fetches.load(Ordering::SeqCst), 1);
        assert!(!rebuilt.contains("luatex"));

        // The cache now holds the rebuilt catalog
        let cached = builder.load_cached(SystemTime::now()).unwrap().unwrap();
        assert_eq!(cached, rebuilt);
    }

    #[tokio::test]
    async fn test_failed_fetch_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let builder = builder(dir.path());
        let res = builder
            .build_with(SystemTime::now(), || async {
                Err::<String, _>(anyhow::format_err!("connection refused"))
            })
            .await;
        assert!(res.is_err());
        assert!(!builder.cache_path().exists());
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_store_reports_full_disk() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = builder(dir.path()).parse_listing(LISTING).unwrap();
        // Small writes to /dev/full only fail once the buffer is flushed
        let full = CatalogBuilder::new(CatalogConfig {
            cache_path: PathBuf::from("/dev/full"),
            ..crate::config::Config::default().catalog_config()
        });
        assert!(full.store(&catalog).is_err());
    }

    #[test]
    fn test_corrupt_cache_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let builder = builder(dir.path());
        fs::create_dir_all(builder.cache_path().parent().unwrap()).unwrap();
        fs::write(builder.cache_path(), "{ not json").unwrap();
        assert!(builder.load_cached(SystemTime::now()).unwrap().is_none());

        builder.invalidate().unwrap();
        assert!(!builder.cache_path().exists());
    }
}
