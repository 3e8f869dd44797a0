//! Maven project model, descriptor rewriting, published version lookup and
//! the external build.

/// External `mvn` invocation.
pub mod build;

/// Byte-preserving `pom.xml` edits.
pub mod edit;

/// `maven-metadata.xml` lookup and version unification.
pub mod metadata;

pub mod pom;

/// `${...}` placeholder resolution.
pub mod property;

/// Templates of generated app projects.
pub mod template;
