//! `release-apps` command.
use log::*;

use crate::{
    Result,
    cli::{Args, parse_repo},
    command::forge_manager,
    maven::{build::MavenCli, metadata::HttpMetadataSource},
    publish::AppPublisher,
    repo::Checkout,
};

/// Clones the product repository and deploys its missing app artifacts.
pub async fn execute(args: &Args, repo: Option<&String>) -> Result<i32> {
    let Some(repo) = parse_repo(repo)? else {
        info!("no product repository configured: nothing to release");
        return Ok(0);
    };

    let config = args.run_config()?;
    let remote = args.remote_config()?;
    let forge = forge_manager(&remote, config.dry_run)?;

    let branch = forge.default_branch(&repo).await?;
    let checkout =
        Checkout::clone_branch(&config.work_dir, &remote, &repo, &branch)?;

    let metadata = HttpMetadataSource::new()?;
    let build = MavenCli;
    let publisher = AppPublisher::new(&config, &metadata, &build);

    let report = publisher.publish(checkout.path(), &repo).await?;

    info!(
        "{repo}: {} app(s) missing, {} deploy(s) done",
        report.missing_apps.len(),
        report.deployed.len()
    );

    Ok(report.status)
}
