mod actions;
mod catalog;
mod cli;
mod config;
mod files;
mod remote;
mod repo;
mod types;
mod utils;

use actions::Outcome;
use anyhow::Result;
use clap::Parser;
use config::{Config, Opts};

/// Exit codes:
/// 1 => program screwed up
/// 2 => nothing to do, or user cancelled operation
#[tokio::main(flavor = "current_thread")]
async fn main() {
    match try_main().await {
        Ok(Outcome::Done) => (),
        Ok(Outcome::UpToDate) => std::process::exit(2),
        Ok(Outcome::Cancelled) => {
            info!("Operation cancelled");
            std::process::exit(2);
        }
        Err(err) => {
            error!("{}", err.to_string());
            err.chain().skip(1).for_each(|cause| {
                due_to!("{}", cause);
            });
            std::process::exit(1);
        }
    }
}

async fn try_main() -> Result<Outcome> {
    let opts = Opts::parse();
    cli::set_verbose(opts.verbose);
    let config = Config::load(&opts.config)?;
    debug!("Loaded config: {:?}", config);

    actions::fullfill_command(&config, &opts).await
}
