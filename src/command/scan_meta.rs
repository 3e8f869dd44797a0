//! `scan-meta` command.
use log::*;

use crate::{
    Result,
    cli::{Args, parse_repo},
    command::forge_manager,
    maven::template::Templates,
    scan::meta_json::MetaJsonScanner,
};

/// Scans the marketplace repository and opens the repair pull requests.
pub async fn execute(args: &Args, repo: Option<&String>) -> Result<i32> {
    let Some(market) = parse_repo(repo)? else {
        info!("no marketplace repository configured: nothing to scan");
        return Ok(0);
    };

    let config = args.run_config()?;
    let remote = args.remote_config()?;
    let templates = Templates::load(config.template_dir.as_deref())?;
    let forge = forge_manager(&remote, config.dry_run)?;

    let scanner = MetaJsonScanner::new(&forge, &config, &templates, market);
    let report = scanner.scan().await?;

    debug!("scan report: {report:#?}");

    Ok(report.exit_code())
}
