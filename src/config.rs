//! Run configuration assembled once at startup and passed explicitly to every
//! job.
use derive_builder::Builder;
use std::{fmt, path::PathBuf, str::FromStr};

use crate::{Result, StewardError};

/// Folder of the marketplace repository holding product manifests.
pub const MARKET_FOLDER: &str = "market";
/// Default base URL of the Maven repository products are published to.
pub const DEFAULT_MAVEN_BASE_URL: &str = "https://maven.axonivy.com";
/// Default directory for repository checkouts.
pub const DEFAULT_WORK_DIR: &str = "work";

/// Inclusive range of major versions, written as `min,max`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VersionRange {
    pub min: u32,
    pub max: u32,
}

impl VersionRange {
    pub fn contains(&self, major: u32) -> bool {
        (self.min..=self.max).contains(&major)
    }
}

impl fmt::Display for VersionRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.min, self.max)
    }
}

impl FromStr for VersionRange {
    type Err = StewardError;

    fn from_str(value: &str) -> Result<Self> {
        let invalid = || {
            StewardError::invalid_config(format!(
                "version range must be `min,max` major versions, got: {value}"
            ))
        };

        let (min, max) = value.split_once(',').ok_or_else(invalid)?;
        let min = min.trim().parse::<u32>().map_err(|_| invalid())?;
        let max = max.trim().parse::<u32>().map_err(|_| invalid())?;

        if min > max {
            return Err(invalid());
        }

        Ok(Self { min, max })
    }
}

/// Comma separated repository names, trimmed; blanks dropped.
pub fn parse_ignore_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}

#[derive(Debug, Builder)]
#[builder(setter(into), build_fn(private, name = "_build"))]
pub struct RunConfigParams {
    #[builder(default)]
    pub dry_run: bool,
    #[builder(default)]
    pub actor: Option<String>,
    /// Comma separated list
    #[builder(default)]
    pub ignore_repos: String,
    /// `min,max` or blank
    #[builder(default)]
    pub version_range: String,
    #[builder(default = "PathBuf::from(DEFAULT_WORK_DIR)")]
    pub work_dir: PathBuf,
    #[builder(default)]
    pub template_dir: Option<PathBuf>,
    #[builder(default = "DEFAULT_MAVEN_BASE_URL.to_string()")]
    pub maven_base_url: String,
}

impl RunConfigParamsBuilder {
    pub fn build(&self) -> Result<RunConfig> {
        let params = self._build().map_err(|e| {
            StewardError::invalid_config(format!(
                "Failed to build run config: {}",
                e
            ))
        })?;
        RunConfig::new(params)
    }
}

#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Log mutating platform calls instead of issuing them
    pub dry_run: bool,
    /// User that triggered the run; assigned to opened PRs
    pub actor: Option<String>,
    pub ignore_repos: Vec<String>,
    pub version_range: Option<VersionRange>,
    pub work_dir: PathBuf,
    pub template_dir: Option<PathBuf>,
    pub maven_base_url: String,
    pub market_folder: String,
}

impl RunConfig {
    pub fn builder() -> RunConfigParamsBuilder {
        RunConfigParamsBuilder::default()
    }

    pub fn new(params: RunConfigParams) -> Result<Self> {
        let version_range = match params.version_range.trim() {
            "" => None,
            value => Some(value.parse::<VersionRange>()?),
        };

        let actor = params
            .actor
            .map(|a| a.trim().to_string())
            .filter(|a| !a.is_empty());

        Ok(Self {
            dry_run: params.dry_run,
            actor,
            ignore_repos: parse_ignore_list(&params.ignore_repos),
            version_range,
            work_dir: params.work_dir,
            template_dir: params.template_dir,
            maven_base_url: params.maven_base_url,
            market_folder: MARKET_FOLDER.to_string(),
        })
    }

    /// Case-insensitive match against the ignore list.
    pub fn is_ignored(&self, name: &str) -> bool {
        self.ignore_repos
            .iter()
            .any(|ignored| ignored.eq_ignore_ascii_case(name))
    }
}
