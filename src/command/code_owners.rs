//! `code-owners` command.
use log::*;

use crate::{
    Result,
    cli::{Args, parse_repo},
    codeowners::{CodeOwnerDetector, CodeOwners},
    command::forge_manager,
};

/// Checks a single repository, or every repository of an organization.
pub async fn execute(
    args: &Args,
    org: Option<&String>,
    repo: Option<&String>,
) -> Result<i32> {
    let repo = parse_repo(repo)?;
    let org = org.map(|o| o.trim()).filter(|o| !o.is_empty());

    if repo.is_none() && org.is_none() {
        info!("no organization or repository configured: nothing to check");
        return Ok(0);
    }

    let config = args.run_config()?;
    let remote = args.remote_config()?;
    let owners = CodeOwners::bundled()?;
    let forge = forge_manager(&remote, config.dry_run)?;

    let repos = match (repo, org) {
        (Some(repo), _) => vec![repo],
        (None, Some(org)) => forge.list_org_repos(org).await?,
        (None, None) => vec![],
    };

    info!("checking code owners of {} repositories", repos.len());

    let detector = CodeOwnerDetector::new(&forge, &config, owners);
    let report = detector.detect(&repos).await?;

    Ok(report.exit_code())
}
