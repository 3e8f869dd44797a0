//! Read-only model of a Maven `pom.xml`.
use log::*;
use quick_xml::{
    Reader,
    events::{BytesStart, Event},
};
use std::collections::BTreeMap;

use crate::{Result, StewardError, maven::property};

/// File name of a Maven build descriptor.
pub const POM: &str = "pom.xml";
/// Dependency type / packaging of internal product modules.
pub const IAR: &str = "iar";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Dependency {
    pub group_id: Option<String>,
    pub artifact_id: String,
    pub version: Option<String>,
    pub dep_type: Option<String>,
    pub scope: Option<String>,
}

impl Dependency {
    pub fn is_iar(&self) -> bool {
        self.dep_type.as_deref() == Some(IAR)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParentRef {
    pub group_id: Option<String>,
    pub artifact_id: Option<String>,
    pub version: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Scm {
    pub url: Option<String>,
    pub connection: Option<String>,
    pub developer_connection: Option<String>,
    pub tag: Option<String>,
}

/// The subset of the Maven project model this tool reads. Only direct
/// children of `<project>` are considered, so `dependencyManagement` and
/// profile sections never leak into the model.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Pom {
    pub group_id: Option<String>,
    pub artifact_id: String,
    pub version: Option<String>,
    pub name: Option<String>,
    pub packaging: Option<String>,
    pub parent: Option<ParentRef>,
    pub modules: Vec<String>,
    pub properties: BTreeMap<String, String>,
    pub dependencies: Vec<Dependency>,
    pub scm: Option<Scm>,
}

/// Model under construction plus the sections still open.
#[derive(Default)]
struct PomBuilder {
    pom: Pom,
    parent: Option<ParentRef>,
    scm: Option<Scm>,
    dependency: Option<Dependency>,
}

impl PomBuilder {
    fn open(&mut self, stack: &[String]) {
        match segments(stack).as_slice() {
            ["project", "parent"] => self.parent = Some(ParentRef::default()),
            ["project", "scm"] => self.scm = Some(Scm::default()),
            ["project", "dependencies", "dependency"] => {
                self.dependency = Some(Dependency::default())
            }
            _ => {}
        }
    }

    /// Records the text of the element on top of `stack`. Self-closing
    /// elements are closed with an empty value.
    fn close(&mut self, stack: &[String], value: String) {
        let pom = &mut self.pom;

        match segments(stack).as_slice() {
            ["project", "groupId"] => pom.group_id = Some(value),
            ["project", "artifactId"] => pom.artifact_id = value,
            ["project", "version"] => pom.version = Some(value),
            ["project", "name"] => pom.name = Some(value),
            ["project", "packaging"] => pom.packaging = Some(value),
            ["project", "modules", "module"] => pom.modules.push(value),
            ["project", "properties", key] => {
                pom.properties.insert(key.to_string(), value);
            }
            ["project", "parent", field] => {
                if let Some(parent) = self.parent.as_mut() {
                    match *field {
                        "groupId" => parent.group_id = Some(value),
                        "artifactId" => parent.artifact_id = Some(value),
                        "version" => parent.version = Some(value),
                        _ => {}
                    }
                }
            }
            ["project", "parent"] => pom.parent = self.parent.take(),
            ["project", "scm", field] => {
                if let Some(scm) = self.scm.as_mut() {
                    match *field {
                        "url" => scm.url = Some(value),
                        "connection" => scm.connection = Some(value),
                        "developerConnection" => {
                            scm.developer_connection = Some(value)
                        }
                        "tag" => scm.tag = Some(value),
                        _ => {}
                    }
                }
            }
            ["project", "scm"] => pom.scm = self.scm.take(),
            ["project", "dependencies", "dependency", field] => {
                if let Some(dep) = self.dependency.as_mut() {
                    match *field {
                        "groupId" => dep.group_id = Some(value),
                        "artifactId" => dep.artifact_id = value,
                        "version" => dep.version = Some(value),
                        "type" => dep.dep_type = Some(value),
                        "scope" => dep.scope = Some(value),
                        _ => {}
                    }
                }
            }
            ["project", "dependencies", "dependency"] => {
                if let Some(dep) = self.dependency.take() {
                    pom.dependencies.push(dep);
                }
            }
            _ => {}
        }
    }
}

impl Pom {
    /// Parse `xml`. `path` is only used for error reporting.
    pub fn parse(path: &str, xml: &str) -> Result<Self> {
        let mut reader = Reader::from_str(xml);

        let mut builder = PomBuilder::default();
        let mut stack: Vec<String> = vec![];
        let mut text = String::new();
        let mut saw_project = false;

        loop {
            let event = reader.read_event().map_err(|e| {
                StewardError::invalid_descriptor(
                    path,
                    format!(
                        "error at position {}: {e}",
                        reader.error_position()
                    ),
                )
            })?;

            let self_closing = matches!(event, Event::Empty(_));

            match event {
                Event::Start(e) | Event::Empty(e) => {
                    let name = element_name(&e)?;

                    if stack.is_empty() {
                        if name != "project" {
                            return Err(StewardError::invalid_descriptor(
                                path,
                                format!("unexpected root element <{name}>"),
                            ));
                        }
                        saw_project = true;
                    }

                    stack.push(name);
                    text.clear();
                    builder.open(&stack);

                    if self_closing {
                        builder.close(&stack, String::new());
                        stack.pop();
                    }
                }
                Event::Text(e) => text.push_str(&e.unescape()?),
                Event::CData(e) => {
                    text.push_str(&String::from_utf8(e.into_inner().to_vec())?)
                }
                Event::End(_) => {
                    let value = text.trim().to_string();
                    text.clear();
                    builder.close(&stack, value);
                    stack.pop();
                }
                Event::Eof => break,
                _ => {}
            }
        }

        let pom = builder.pom;

        if !saw_project {
            return Err(StewardError::invalid_descriptor(
                path,
                "no <project> element found",
            ));
        }

        if pom.artifact_id.is_empty() {
            return Err(StewardError::invalid_descriptor(
                path,
                "missing <artifactId>",
            ));
        }

        debug!(
            "parsed {path}: {} with {} modules and {} dependencies",
            pom.artifact_id,
            pom.modules.len(),
            pom.dependencies.len()
        );

        Ok(pom)
    }

    /// Own groupId, falling back to the parent's.
    pub fn group_id(&self) -> Option<&str> {
        non_blank(&self.group_id)
            .or_else(|| non_blank(&self.parent.as_ref()?.group_id))
    }

    /// Own version, falling back to the parent's.
    pub fn version(&self) -> Option<&str> {
        non_blank(&self.version)
            .or_else(|| non_blank(&self.parent.as_ref()?.version))
    }

    /// A module is part of the product family when it is packaged as an
    /// `iar` or depends on one.
    pub fn is_iar_module(&self) -> bool {
        self.packaging.as_deref() == Some(IAR)
            || self.dependencies.iter().any(Dependency::is_iar)
    }

    /// `iar` dependencies that share this project's groupId.
    pub fn internal_dependencies(&self) -> Vec<&Dependency> {
        let Some(group_id) = self.group_id() else {
            return vec![];
        };

        self.dependencies
            .iter()
            .filter(|d| {
                d.is_iar()
                    && d.group_id
                        .as_deref()
                        .map(|g| self.resolve(g) == group_id)
                        .unwrap_or(false)
            })
            .collect()
    }

    /// Substitute `${...}` placeholders using this project's properties.
    pub fn resolve(&self, value: &str) -> String {
        property::resolve_placeholders(self, value)
    }
}

/// Local (namespace-less) name of an element.
pub(super) fn element_name(e: &BytesStart) -> Result<String> {
    Ok(String::from_utf8(e.local_name().as_ref().to_vec())?)
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

fn segments(stack: &[String]) -> Vec<&str> {
    stack.iter().map(String::as_str).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    pub const PARENT_POM: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<project xmlns="http://maven.apache.org/POM/4.0.0">
  <modelVersion>4.0.0</modelVersion>
  <groupId>com.axonivy.connector.foo</groupId>
  <artifactId>foo-modules</artifactId>
  <version>12.0.1-SNAPSHOT</version>
  <name>Foo Connector</name>
  <packaging>pom</packaging>
  <properties>
    <module.prefix>foo</module.prefix>
  </properties>
  <modules>
    <module>${module.prefix}</module>
    <module>${module.prefix}-demo</module>
    <module>foo-test</module>
    <module>foo-product</module>
  </modules>
  <scm>
    <url>https://github.com/axonivy-market/foo-connector</url>
    <tag>HEAD</tag>
  </scm>
  <dependencyManagement>
    <dependencies>
      <dependency>
        <groupId>org.managed</groupId>
        <artifactId>managed</artifactId>
      </dependency>
    </dependencies>
  </dependencyManagement>
</project>
"#;

    #[test]
    fn parses_project_fields() {
        let pom = Pom::parse("pom.xml", PARENT_POM).unwrap();

        assert_eq!(pom.group_id(), Some("com.axonivy.connector.foo"));
        assert_eq!(pom.artifact_id, "foo-modules");
        assert_eq!(pom.version(), Some("12.0.1-SNAPSHOT"));
        assert_eq!(pom.name.as_deref(), Some("Foo Connector"));
        assert_eq!(pom.modules.len(), 4);
        assert_eq!(pom.modules[0], "${module.prefix}");
        assert_eq!(pom.properties.get("module.prefix").unwrap(), "foo");
        assert_eq!(
            pom.scm.as_ref().unwrap().url.as_deref(),
            Some("https://github.com/axonivy-market/foo-connector")
        );
        // managed dependencies are not project dependencies
        assert!(pom.dependencies.is_empty());
    }

    #[test]
    fn inherits_coordinates_from_parent() {
        let xml = r#"<project>
  <parent>
    <groupId>com.axonivy.connector.foo</groupId>
    <artifactId>foo-modules</artifactId>
    <version>12.0.1</version>
  </parent>
  <artifactId>foo-demo</artifactId>
  <packaging>iar</packaging>
  <dependencies>
    <dependency>
      <groupId>${project.groupId}</groupId>
      <artifactId>foo</artifactId>
      <version>${project.version}</version>
      <type>iar</type>
    </dependency>
    <dependency>
      <groupId>com.axonivy.utils</groupId>
      <artifactId>other</artifactId>
      <version>1.0</version>
      <type>iar</type>
    </dependency>
  </dependencies>
</project>"#;

        let pom = Pom::parse("foo-demo/pom.xml", xml).unwrap();

        assert_eq!(pom.group_id(), Some("com.axonivy.connector.foo"));
        assert_eq!(pom.version(), Some("12.0.1"));
        assert!(pom.is_iar_module());

        let internal = pom.internal_dependencies();
        assert_eq!(internal.len(), 1);
        assert_eq!(internal[0].artifact_id, "foo");
    }

    #[test]
    fn records_self_closing_elements() {
        let xml = r#"<project>
  <parent>
    <groupId>com.axonivy.connector.foo</groupId>
    <artifactId>foo-modules</artifactId>
    <version>12.0.1</version>
  </parent>
  <groupId/>
  <artifactId>foo-app</artifactId>
  <version/>
  <modules>
    <module/>
  </modules>
</project>"#;

        let pom = Pom::parse("foo-app/pom.xml", xml).unwrap();

        assert_eq!(pom.version.as_deref(), Some(""));
        assert_eq!(pom.group_id.as_deref(), Some(""));
        assert_eq!(pom.modules, vec![String::new()]);
        // blank values fall back to the parent
        assert_eq!(pom.version(), Some("12.0.1"));
        assert_eq!(pom.group_id(), Some("com.axonivy.connector.foo"));
    }

    #[test]
    fn rejects_malformed_descriptor() {
        let result = Pom::parse("pom.xml", "<project><artifactId>x</groupId>");
        assert!(matches!(
            result,
            Err(StewardError::InvalidDescriptor { .. })
        ));
    }

    #[test]
    fn rejects_non_project_root() {
        let result = Pom::parse("pom.xml", "<settings><a>1</a></settings>");
        assert!(result.is_err());
    }
}
