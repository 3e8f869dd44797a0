//! Configuration for the GitHub connection and repository references.
use git_url_parse::GitUrl;
use secrecy::SecretString;
use std::{fmt, str::FromStr};

use crate::{Result, StewardError};

/// Default GitHub host.
pub const DEFAULT_HOST: &str = "github.com";
/// Default GitHub REST API base URL.
pub const DEFAULT_API_BASE_URL: &str = "https://api.github.com";
/// Prefix stripped from `sourceUrl` values to get an `owner/name` reference.
pub const GITHUB_URL_PREFIX: &str = "https://github.com/";

/// Remote connection configuration for authenticating and interacting with
/// GitHub.
#[derive(Debug, Clone)]
pub struct RemoteConfig {
    /// Host used for clone URLs (e.g., "github.com").
    pub host: String,
    /// URL scheme (http or https).
    pub scheme: String,
    /// REST API base URL.
    pub api_base_url: String,
    /// Access token for authentication.
    pub token: SecretString,
    /// User that triggered the run, used for clone credentials and PR
    /// assignment.
    pub actor: Option<String>,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            scheme: "https".to_string(),
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            token: SecretString::from("".to_string()),
            actor: None,
        }
    }
}

impl RemoteConfig {
    /// HTTPS clone URL for a repository on this remote.
    pub fn clone_url(&self, repo: &RepoName) -> String {
        format!(
            "{}://{}/{}/{}.git",
            self.scheme, self.host, repo.owner, repo.name
        )
    }
}

/// An `owner/name` repository reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RepoName {
    pub owner: String,
    pub name: String,
}

impl RepoName {
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
        }
    }

    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }
}

impl fmt::Display for RepoName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

impl FromStr for RepoName {
    type Err = StewardError;

    /// Accepts `owner/name` or a full repository URL.
    fn from_str(value: &str) -> Result<Self> {
        let value = value.trim();

        if value.contains("://") || value.starts_with("git@") {
            let parsed = GitUrl::parse(value)?;
            let owner = parsed.owner.ok_or_else(|| {
                StewardError::InvalidRepo(format!("no owner in {value}"))
            })?;
            return Ok(Self::new(owner, parsed.name));
        }

        let value = value.strip_suffix(".git").unwrap_or(value);

        match value.split_once('/') {
            Some((owner, name))
                if !owner.is_empty()
                    && !name.is_empty()
                    && !name.contains('/') =>
            {
                Ok(Self::new(owner, name))
            }
            _ => Err(StewardError::InvalidRepo(value.to_string())),
        }
    }
}
