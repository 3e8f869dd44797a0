//! Command execution for market-steward.
//!
//! Each job resolves its target from the CLI, builds the GitHub client and
//! run configuration, runs, and reports a process exit code: 0 when nothing
//! was inconsistent, 1 when something was found or failed, or the exit code
//! of a failed Maven deploy. A job without a target succeeds without work.

/// Proposes `CODEOWNERS` files.
pub mod code_owners;

/// Deploys missing app artifacts from a local clone.
pub mod release_apps;

/// Repairs the marketplace's `meta.json` manifests.
pub mod scan_meta;

use log::*;

use crate::{
    Result,
    cli::{Args, Command},
    forge::{
        config::RemoteConfig,
        github::Github,
        manager::{ForgeManager, ForgeOptions},
    },
};

/// GitHub client wrapped for the configured dry-run mode.
fn forge_manager(remote: &RemoteConfig, dry_run: bool) -> Result<ForgeManager> {
    let github = Github::new(remote)?;
    Ok(ForgeManager::new(Box::new(github), ForgeOptions { dry_run }))
}

pub async fn run(args: &Args) -> Result<i32> {
    if args.dry_run {
        warn!("dry_run: no changes will be written");
    }

    match &args.command {
        Command::ScanMeta { repo } => scan_meta::execute(args, repo.as_ref()).await,
        Command::ReleaseApps { repo } => {
            release_apps::execute(args, repo.as_ref()).await
        }
        Command::CodeOwners { org, repo } => {
            code_owners::execute(args, org.as_ref(), repo.as_ref()).await
        }
    }
}
