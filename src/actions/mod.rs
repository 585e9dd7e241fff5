mod show;
mod update;

use crate::{
    catalog::CatalogBuilder,
    config::{Config, Opts, SubCmd},
    info, repo, success,
};

use anyhow::{Context, Result};
use reqwest::Client;

/// How a command ended, when it didn't fail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Done,
    /// Nothing to do, the package is current
    UpToDate,
    /// The user declined a confirmation
    Cancelled,
}

pub async fn fullfill_command(config: &Config, opts: &Opts) -> Result<Outcome> {
    let client = Client::builder()
        .user_agent(concat!("texbump/", env!("CARGO_PKG_VERSION")))
        .build()
        .context("Failed to set up HTTP client")?;

    match &opts.subcmd {
        SubCmd::Update(req) => {
            update::update_package(config, &client, &req.repo_url, req.remove_comments, opts.yes)
                .await
        }
        SubCmd::RefreshCatalog(req) => {
            let builder = CatalogBuilder::new(config.catalog_config());
            if req.force {
                builder.invalidate()?;
            }
            let catalog = builder.build(&client).await?;
            success!(
                "Catalog holds {} packages, built {}",
                catalog.len(),
                catalog.update_time.format("%F %R")
            );
            Ok(Outcome::Done)
        }
        SubCmd::Sources(req) => {
            let builder = CatalogBuilder::new(config.catalog_config());
            let catalog = builder.build(&client).await?;
            show::show_sources(&catalog, &req.name)?;
            Ok(Outcome::Done)
        }
        SubCmd::Files(req) => {
            show::show_files(&req.descriptor)?;
            Ok(Outcome::Done)
        }
        SubCmd::Clone(req) => match repo::prepare(config, &req.repo_url, opts.yes)? {
            Some(repo) => {
                info!("{} is ready at {}", repo.url, repo.path.display());
                Ok(Outcome::Done)
            }
            None => Ok(Outcome::Cancelled),
        },
    }
}
