//! Product manifest (`meta.json`) of the marketplace repository.
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, ser::PrettyFormatter};

use crate::{Result, StewardError, forge::config::GITHUB_URL_PREFIX};

pub const META_JSON: &str = "meta.json";
pub const ARTIFACTS_KEY: &str = "mavenArtifacts";
pub const DEFAULT_ARTIFACT_TYPE: &str = "zip";

/// One entry of the `mavenArtifacts` array.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtifactRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artifact_id: Option<String>,
    #[serde(
        rename = "type",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub artifact_type: Option<String>,
}

/// A parsed `meta.json`. Keeps the whole document so fields this tool does
/// not know about are written back unchanged and in order.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductManifest {
    path: String,
    root: Map<String, Value>,
}

impl ProductManifest {
    pub fn parse(path: impl Into<String>, content: &str) -> Result<Self> {
        let path = path.into();

        let value: Value = serde_json::from_str(content).map_err(|e| {
            StewardError::invalid_descriptor(path.clone(), e.to_string())
        })?;

        match value {
            Value::Object(root) => Ok(Self { path, root }),
            _ => Err(StewardError::invalid_descriptor(
                path,
                "top level value is not an object",
            )),
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    fn string_field(&self, key: &str) -> Option<&str> {
        self.root.get(key)?.as_str()
    }

    pub fn id(&self) -> Option<&str> {
        self.string_field("id")
    }

    /// Display name. Older manifests store names per language.
    pub fn name(&self) -> Option<&str> {
        match self.root.get("name")? {
            Value::String(name) => Some(name),
            Value::Object(names) => names
                .get("en")
                .or_else(|| names.values().next())?
                .as_str(),
            _ => None,
        }
    }

    pub fn source_url(&self) -> Option<&str> {
        self.string_field("sourceUrl")
    }

    /// `owner/name` of the product's source repository on GitHub.
    pub fn source_repo(&self) -> Option<&str> {
        let url = self.source_url()?.trim();
        let repo = url.strip_prefix(GITHUB_URL_PREFIX)?;
        let repo = repo.trim_end_matches('/');
        (!repo.is_empty()).then_some(repo)
    }

    /// Declared artifacts; entries that are not objects are ignored.
    pub fn artifacts(&self) -> Vec<ArtifactRecord> {
        self.root
            .get(ARTIFACTS_KEY)
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(|item| {
                        serde_json::from_value(item.clone()).ok()
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn push_artifact(&mut self, record: &ArtifactRecord) -> Result<()> {
        let value = serde_json::to_value(record)?;

        match self
            .root
            .entry(ARTIFACTS_KEY)
            .or_insert_with(|| Value::Array(vec![]))
        {
            Value::Array(items) => {
                items.push(value);
                Ok(())
            }
            _ => Err(StewardError::invalid_descriptor(
                self.path.clone(),
                format!("{ARTIFACTS_KEY} is not an array"),
            )),
        }
    }

    /// Pretty printed with four-space indentation.
    pub fn to_pretty_string(&self) -> Result<String> {
        let mut buf = Vec::new();
        let formatter = PrettyFormatter::with_indent(b"    ");
        let mut serializer =
            serde_json::Serializer::with_formatter(&mut buf, formatter);
        self.root.serialize(&mut serializer)?;
        Ok(String::from_utf8(buf)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const META: &str = r#"{
  "id": "foo",
  "name": "Foo Connector",
  "sourceUrl": "https://github.com/axonivy-market/foo-connector",
  "zeta": 1,
  "mavenArtifacts": [
    {
      "key": "foo",
      "name": "Foo",
      "groupId": "com.axonivy.connector.foo",
      "artifactId": "foo",
      "type": "iar",
      "doc": true
    }
  ],
  "alpha": "kept"
}"#;

    #[test]
    fn reads_product_fields() {
        let manifest = ProductManifest::parse("market/connector/foo/meta.json", META).unwrap();

        assert_eq!(manifest.id(), Some("foo"));
        assert_eq!(manifest.name(), Some("Foo Connector"));
        assert_eq!(manifest.source_repo(), Some("axonivy-market/foo-connector"));

        let artifacts = manifest.artifacts();
        assert_eq!(artifacts.len(), 1);
        assert_eq!(artifacts[0].artifact_id.as_deref(), Some("foo"));
        assert_eq!(artifacts[0].artifact_type.as_deref(), Some("iar"));
    }

    #[test]
    fn reads_localized_name() {
        let manifest =
            ProductManifest::parse("meta.json", r#"{"id":"x","name":{"de":"X de","en":"X en"}}"#)
                .unwrap();
        assert_eq!(manifest.name(), Some("X en"));
    }

    #[test]
    fn non_github_source_has_no_repo() {
        let manifest = ProductManifest::parse(
            "meta.json",
            r#"{"id":"x","sourceUrl":"https://gitlab.com/a/b"}"#,
        )
        .unwrap();
        assert_eq!(manifest.source_repo(), None);
    }

    #[test]
    fn preserves_unknown_fields_in_order() {
        let mut manifest = ProductManifest::parse("meta.json", META).unwrap();

        manifest
            .push_artifact(&ArtifactRecord {
                key: Some("foo".into()),
                name: Some("Foo Connector App".into()),
                group_id: Some("com.axonivy.connector.foo".into()),
                artifact_id: Some("foo-app".into()),
                artifact_type: Some(DEFAULT_ARTIFACT_TYPE.into()),
            })
            .unwrap();

        let output = manifest.to_pretty_string().unwrap();

        let zeta = output.find("\"zeta\"").unwrap();
        let artifacts = output.find("\"mavenArtifacts\"").unwrap();
        let alpha = output.find("\"alpha\"").unwrap();
        assert!(zeta < artifacts && artifacts < alpha);
        assert!(output.contains("            \"doc\": true"));
        assert!(output.starts_with("{\n    \"id\": \"foo\""));

        let reparsed = ProductManifest::parse("meta.json", &output).unwrap();
        let last = reparsed.artifacts().pop().unwrap();
        assert_eq!(last.artifact_id.as_deref(), Some("foo-app"));
        assert_eq!(last.artifact_type.as_deref(), Some("zip"));
    }

    #[test]
    fn creates_missing_artifact_array() {
        let mut manifest = ProductManifest::parse("meta.json", r#"{"id":"x"}"#).unwrap();
        manifest.push_artifact(&ArtifactRecord::default()).unwrap();
        assert_eq!(manifest.artifacts().len(), 1);
    }

    #[test]
    fn rejects_invalid_json() {
        let result = ProductManifest::parse("meta.json", "{ \"id\": ");
        assert!(matches!(result, Err(StewardError::InvalidDescriptor { .. })));
        assert!(ProductManifest::parse("meta.json", "[]").is_err());
    }
}
