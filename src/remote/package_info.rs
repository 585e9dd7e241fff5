use crate::{
    info,
    types::{BumpError, PackageDescriptor},
    utils::html,
};

use anyhow::{Context, Result};
use reqwest::Client;

/// Descriptor of the latest upstream release of `local`'s package
pub async fn fetch_remote_descriptor(
    client: &Client,
    base_url: &str,
    local: &PackageDescriptor,
) -> Result<PackageDescriptor> {
    info!("Getting up to date data about {}...", local.short_name());
    let url = format!("{}{}", base_url, local.short_name());
    let page = super::fetch_page(client, &url)
        .await
        .context(format!("Package {} not found upstream", local.short_name()))?;
    let version = parse_version(&page)
        .context(format!("Failed to parse package info page {}", url))?;

    Ok(PackageDescriptor {
        name: local.name.clone(),
        version,
        ..Default::default()
    })
}

/// Version from the first table of a package info page.
///
/// The row's last cell looks like `1.2c 2023-01-05`: only the first word is
/// kept, with dashes removed, so date-only versions become `20230105`.
pub fn parse_version(page: &str) -> Result<String> {
    let table = html::find_blocks(page, "table")
        .into_iter()
        .next()
        .ok_or(BumpError::VersionRowMissing)?;

    for row in html::find_blocks(table, "tr") {
        let cells = html::find_blocks(row, "td");
        let (first, last) = match (cells.first(), cells.last()) {
            (Some(first), Some(last)) => (first, last),
            _ => continue,
        };
        if html::text_content(first).trim().to_lowercase() != "version" {
            continue;
        }
        let value = html::text_content(last);
        if let Some(word) = value.split_whitespace().next() {
            return Ok(word.replace('-', ""));
        }
    }

    Err(BumpError::VersionRowMissing.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"<html><body>
<h1>foo &ndash; Does foo</h1>
<table class="entry">
  <tr><td class="left">Sources</td><td class="right"><code>/macros/latex/contrib/foo</code></td></tr>
  <tr><td class="left">Version</td><td class="right">1.2c&nbsp;2023-01-05</td></tr>
  <tr><td class="left">License</td><td class="right">LPPL 1.3c</td></tr>
</table>
<table><tr><td>Version</td><td>9.9</td></tr></table>
</body></html>"#;

    #[test]
    fn test_parse_version() {
        assert_eq!(parse_version(PAGE).unwrap(), "1.2c");
    }

    #[test]
    fn test_date_version() {
        let page = "<table><tr><th>Key</th></tr><tr><td>VERSION</td><td> <a href=\"#\">2023-01-05</a> </td></tr></table>";
        assert_eq!(parse_version(page).unwrap(), "20230105");
    }

    #[test]
    fn test_no_table() {
        let err = parse_version("<html>Not found</html>").unwrap_err();
        assert_eq!(
            err.downcast_ref::<BumpError>(),
            Some(&BumpError::VersionRowMissing)
        );
        assert!(parse_version("<table><tr><td>License</td><td>MIT</td></tr></table>").is_err());
    }
}
