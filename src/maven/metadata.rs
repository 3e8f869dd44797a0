//! Published versions from a Maven repository's `maven-metadata.xml`.
use async_trait::async_trait;
use log::*;
use quick_xml::{Reader, events::Event};
use reqwest::StatusCode;
use std::collections::BTreeMap;
use url::Url;

#[cfg(test)]
use mockall::automock;

use crate::{Result, StewardError, config::VersionRange};

pub const MAVEN_METADATA: &str = "maven-metadata.xml";

/// `<base>/<groupId with / separators>/<artifactId>/maven-metadata.xml`
pub fn metadata_url(
    base_url: &str,
    group_id: &str,
    artifact_id: &str,
) -> Result<Url> {
    let url = format!(
        "{}/{}/{}/{MAVEN_METADATA}",
        base_url.trim_end_matches('/'),
        group_id.replace('.', "/"),
        artifact_id
    );

    Ok(Url::parse(&url)?)
}

/// Text of every `<version>` element, in document order.
pub fn parse_versions(xml: &str) -> Result<Vec<String>> {
    let mut reader = Reader::from_str(xml);
    let mut in_version = false;
    let mut versions = vec![];

    loop {
        match reader.read_event()? {
            Event::Start(e) if e.local_name().as_ref() == b"version" => {
                in_version = true;
            }
            Event::End(e) if e.local_name().as_ref() == b"version" => {
                in_version = false;
            }
            Event::Text(e) if in_version => {
                let version = e.unescape()?.trim().to_string();
                if !version.is_empty() {
                    versions.push(version);
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(versions)
}

/// Keeps the highest version of each major line, optionally limited to an
/// inclusive range of majors, sorted ascending.
///
/// Comparison is on the raw strings, so `10.0.10` sorts below `10.0.9`.
pub fn unify_versions(
    versions: &[String],
    range: Option<&VersionRange>,
) -> Vec<String> {
    let mut latest: BTreeMap<&str, &str> = BTreeMap::new();

    for version in versions {
        let major = version.split('.').next().unwrap_or_default();

        if let Some(range) = range {
            match major.parse::<u32>() {
                Ok(major) if range.contains(major) => {}
                _ => continue,
            }
        }

        latest
            .entry(major)
            .and_modify(|current| {
                if version.as_str() > *current {
                    *current = version.as_str();
                }
            })
            .or_insert(version);
    }

    let mut unified: Vec<String> =
        latest.into_values().map(str::to_string).collect();
    unified.sort();
    unified
}

/// Source of `maven-metadata.xml` documents.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait MetadataSource: Send + Sync {
    /// Fetches the document at `url`; `None` when nothing is published there.
    async fn fetch(&self, url: Url) -> Result<Option<String>>;
}

/// Published versions of the artifact described at `url`, in document
/// order. Empty when nothing is published.
pub async fn published_versions(
    source: &dyn MetadataSource,
    url: Url,
) -> Result<Vec<String>> {
    let Some(xml) = source.fetch(url.clone()).await? else {
        debug!("no metadata published at {url}");
        return Ok(vec![]);
    };

    parse_versions(&xml).map_err(|e| {
        StewardError::invalid_descriptor(url.to_string(), e.to_string())
    })
}

/// [`MetadataSource`] backed by plain HTTP GET requests.
pub struct HttpMetadataSource {
    client: reqwest::Client,
}

impl HttpMetadataSource {
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!(
                env!("CARGO_PKG_NAME"),
                "/",
                env!("CARGO_PKG_VERSION")
            ))
            .build()?;

        Ok(Self { client })
    }
}

#[async_trait]
impl MetadataSource for HttpMetadataSource {
    async fn fetch(&self, url: Url) -> Result<Option<String>> {
        debug!("fetching {url}");

        let response = self.client.get(url.clone()).send().await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let body = response.error_for_status()?.text().await?;

        Ok(Some(body))
    }
}
