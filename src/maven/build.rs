//! Invocation of the external Maven build.
use async_trait::async_trait;
use log::*;
use std::path::PathBuf;
use tokio::process::Command;

#[cfg(test)]
use mockall::automock;

use crate::{Result, forge::config::RepoName, maven::pom::POM};

/// GitHub Packages registry the deploy targets; the repository's
/// `owner/name` is appended.
pub const DEPLOY_REPOSITORY: &str =
    "github::default::https://maven.pkg.github.com/";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployRequest {
    /// Directory holding the aggregating `pom.xml`; Maven runs here.
    pub project_dir: PathBuf,
    /// Module folder to deploy, relative to `project_dir`.
    pub module: String,
    pub repo: RepoName,
}

#[cfg_attr(test, automock)]
#[async_trait]
pub trait BuildTool: Send + Sync {
    /// Runs the deploy and returns the process exit status.
    async fn deploy(&self, req: DeployRequest) -> Result<i32>;
}

/// Runs `mvn` (or `mvn.cmd` on Windows) found on the `PATH`.
#[derive(Debug, Default)]
pub struct MavenCli;

impl MavenCli {
    fn program() -> &'static str {
        if cfg!(windows) { "mvn.cmd" } else { "mvn" }
    }

    pub fn deploy_args(req: &DeployRequest) -> Vec<String> {
        vec![
            "--batch-mode".to_string(),
            "deploy".to_string(),
            "-f".to_string(),
            format!("{}/{POM}", req.module),
            "-Dmaven.test.skip=true".to_string(),
            format!("-DaltDeploymentRepository={DEPLOY_REPOSITORY}{}", req.repo),
        ]
    }
}

#[async_trait]
impl BuildTool for MavenCli {
    async fn deploy(&self, req: DeployRequest) -> Result<i32> {
        let args = Self::deploy_args(&req);

        info!(
            "running {} {} in {}",
            Self::program(),
            args.join(" "),
            req.project_dir.display()
        );

        let status = Command::new(Self::program())
            .args(&args)
            .current_dir(&req.project_dir)
            .status()
            .await?;

        // killed by a signal
        let code = status.code().unwrap_or(1);

        if code != 0 {
            error!("maven deploy of {} exited with {code}", req.module);
        }

        Ok(code)
    }
}
