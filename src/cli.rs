//! CLI argument parsing and GitHub connection configuration.
use clap::{Parser, Subcommand};
use secrecy::SecretString;
use std::{
    env,
    path::{Path, PathBuf},
};

use crate::{
    Result, StewardError,
    config::{DEFAULT_MAVEN_BASE_URL, DEFAULT_WORK_DIR, RunConfig},
    forge::config::{DEFAULT_API_BASE_URL, RemoteConfig, RepoName},
};

pub const TOKEN_ENV: &str = "GITHUB_TOKEN";
pub const ACTOR_ENV: &str = "GITHUB_ACTOR";

/// Global CLI arguments shared by every job.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Args {
    #[arg(long, default_value = "", global = true)]
    /// GitHub personal access token. Falls back to GITHUB_TOKEN env var,
    /// then to --token-file.
    pub github_token: String,

    #[arg(long, global = true)]
    /// File holding the GitHub token.
    pub token_file: Option<PathBuf>,

    #[arg(long, default_value = "", global = true)]
    /// User that triggered the run. Falls back to GITHUB_ACTOR env var.
    pub actor: String,

    #[arg(long, default_value_t = false, global = true)]
    /// Log every change instead of writing it.
    pub dry_run: bool,

    #[arg(long, default_value_t = false, global = true)]
    /// Enable debug logging.
    pub debug: bool,

    #[arg(long, default_value = DEFAULT_WORK_DIR, global = true)]
    /// Directory repositories are cloned into.
    pub work_dir: PathBuf,

    #[arg(long, default_value = "", global = true)]
    /// Comma separated repository or product names to skip.
    pub ignore_repos: String,

    #[arg(long, default_value = "", global = true)]
    /// Inclusive major version range `min,max` of releases to consider.
    pub version_range: String,

    #[arg(long, global = true)]
    /// Directory overriding the bundled app project templates.
    pub template_dir: Option<PathBuf>,

    #[arg(long, default_value = DEFAULT_API_BASE_URL, global = true)]
    /// GitHub REST API base URL.
    pub api_base_url: String,

    #[arg(long, default_value = DEFAULT_MAVEN_BASE_URL, global = true)]
    /// Maven repository holding the released artifacts.
    pub maven_url: String,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Command,
}

/// Maintenance jobs.
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Add missing app artifacts to the marketplace's meta.json files.
    ScanMeta {
        #[arg(long)]
        /// Marketplace repository (owner/name or URL).
        repo: Option<String>,
    },

    /// Deploy app artifacts missing for released product versions.
    ReleaseApps {
        #[arg(long)]
        /// Product repository (owner/name or URL).
        repo: Option<String>,
    },

    /// Propose CODEOWNERS files where they are missing.
    CodeOwners {
        #[arg(long)]
        /// Organization whose repositories are checked.
        org: Option<String>,

        #[arg(long)]
        /// Single repository to check instead of a whole organization.
        repo: Option<String>,
    },
}

/// Blank values count as absent.
fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Flag, then environment, then token file.
fn resolve_token(
    flag: &str,
    env_value: Option<String>,
    token_file: Option<&Path>,
) -> Result<String> {
    if let Some(token) = non_blank(Some(flag.to_string())) {
        return Ok(token);
    }

    if let Some(token) = non_blank(env_value) {
        return Ok(token);
    }

    if let Some(path) = token_file {
        let token = std::fs::read_to_string(path).map_err(|e| {
            StewardError::invalid_config(format!(
                "failed to read token file {}: {e}",
                path.display()
            ))
        })?;

        if let Some(token) = non_blank(Some(token)) {
            return Ok(token);
        }
    }

    Err(StewardError::invalid_config("must set github token"))
}

/// Parses an optional repository reference; blank means no target.
pub fn parse_repo(value: Option<&String>) -> Result<Option<RepoName>> {
    non_blank(value.cloned())
        .map(|value| value.parse::<RepoName>())
        .transpose()
}

impl Args {
    fn actor(&self) -> Option<String> {
        non_blank(Some(self.actor.clone()))
            .or_else(|| non_blank(env::var(ACTOR_ENV).ok()))
    }

    /// Configure the GitHub connection from CLI arguments.
    pub fn remote_config(&self) -> Result<RemoteConfig> {
        let token = resolve_token(
            &self.github_token,
            env::var(TOKEN_ENV).ok(),
            self.token_file.as_deref(),
        )?;

        Ok(RemoteConfig {
            api_base_url: self.api_base_url.clone(),
            token: SecretString::from(token),
            actor: self.actor(),
            ..RemoteConfig::default()
        })
    }

    pub fn run_config(&self) -> Result<RunConfig> {
        RunConfig::builder()
            .dry_run(self.dry_run)
            .actor(self.actor())
            .ignore_repos(self.ignore_repos.clone())
            .version_range(self.version_range.clone())
            .work_dir(self.work_dir.clone())
            .template_dir(self.template_dir.clone())
            .maven_base_url(self.maven_url.clone())
            .build()
    }
}
