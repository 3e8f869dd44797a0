//! Common test helper functions shared across test modules.
//!
//! Provides fixture descriptors and product models so the scanner and
//! synthesizer suites build their inputs the same way.
use crate::{
    forge::{config::RepoName, request::FileContent},
    maven::pom::{POM, Pom},
    scan::product::ProductModel,
};

pub const GROUP_ID: &str = "com.axonivy.connector.foo";
pub const VERSION: &str = "12.0.0";

/// File as returned by the forge, with a sha derived from the path.
pub fn file(path: &str, content: &str) -> FileContent {
    FileContent {
        path: path.to_string(),
        sha: format!("sha-{path}"),
        content: content.to_string(),
    }
}

/// Parent `pom.xml` of product `foo` listing `modules`.
///
/// # Example
/// ```ignore
/// let xml = parent_pom(&["foo-core", "foo-demo"]);
/// ```
pub fn parent_pom(modules: &[&str]) -> String {
    let modules = modules
        .iter()
        .map(|m| format!("    <module>{m}</module>\n"))
        .collect::<String>();

    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<project xmlns="http://maven.apache.org/POM/4.0.0">
  <modelVersion>4.0.0</modelVersion>
  <groupId>{GROUP_ID}</groupId>
  <artifactId>foo-modules</artifactId>
  <version>{VERSION}</version>
  <name>Foo Connector</name>
  <packaging>pom</packaging>
  <modules>
{modules}  </modules>
  <scm>
    <url>https://github.com/axonivy-market/foo-connector</url>
  </scm>
</project>
"#
    )
}

/// Module `pom.xml` inheriting from the `foo` parent. `iar` switches its
/// packaging between `iar` and `jar`.
pub fn module_pom(artifact_id: &str, iar: bool) -> String {
    let packaging = if iar { "iar" } else { "jar" };

    format!(
        r#"<project>
  <parent>
    <groupId>{GROUP_ID}</groupId>
    <artifactId>foo-modules</artifactId>
    <version>{VERSION}</version>
  </parent>
  <artifactId>{artifact_id}</artifactId>
  <packaging>{packaging}</packaging>
</project>
"#
    )
}

/// Product model of `foo` with the given internal modules.
pub fn product_model(modules: &[&str]) -> ProductModel {
    let parent_xml = parent_pom(modules);

    ProductModel {
        repo: RepoName::new("axonivy-market", "foo-connector"),
        parent: Pom::parse(POM, &parent_xml).unwrap(),
        parent_xml,
        parent_sha: "sha-pom.xml".to_string(),
        modules: modules
            .iter()
            .map(|m| Pom::parse(POM, &module_pom(m, true)).unwrap())
            .collect(),
    }
}
