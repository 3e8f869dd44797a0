//! Bundled templates for generated app projects.
use log::*;
use quick_xml::escape::escape;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tera::{Context, Tera};

use crate::{Result, StewardError, maven::pom::POM};

pub const POM_TEMPLATE: &str = "pom.xml.tera";
pub const ASSEMBLY: &str = "assembly.xml";
pub const DEPLOY_OPTIONS: &str = "deploy.options.yaml";

const BUNDLED_POM: &str = include_str!("../../templates/app/pom.xml.tera");
const BUNDLED_ASSEMBLY: &str = include_str!("../../templates/app/assembly.xml");
const BUNDLED_DEPLOY_OPTIONS: &str =
    include_str!("../../templates/app/deploy.options.yaml");

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScmContext {
    pub url: Option<String>,
    pub connection: Option<String>,
    pub developer_connection: Option<String>,
    pub tag: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DependencyContext {
    pub group_id: String,
    pub artifact_id: String,
    pub version: Option<String>,
}

/// Values rendered into the generated app `pom.xml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AppPomContext {
    pub group_id: String,
    pub artifact_id: String,
    pub version: Option<String>,
    pub name: Option<String>,
    pub scm: Option<ScmContext>,
    pub dependencies: Vec<DependencyContext>,
}

impl AppPomContext {
    /// Copy with every value XML-escaped.
    fn escaped(&self) -> Self {
        let esc = |v: &str| escape(v).into_owned();
        let esc_opt = |v: &Option<String>| v.as_deref().map(esc);

        Self {
            group_id: esc(&self.group_id),
            artifact_id: esc(&self.artifact_id),
            version: esc_opt(&self.version),
            name: esc_opt(&self.name),
            scm: self.scm.as_ref().map(|scm| ScmContext {
                url: esc_opt(&scm.url),
                connection: esc_opt(&scm.connection),
                developer_connection: esc_opt(&scm.developer_connection),
                tag: esc_opt(&scm.tag),
            }),
            dependencies: self
                .dependencies
                .iter()
                .map(|d| DependencyContext {
                    group_id: esc(&d.group_id),
                    artifact_id: esc(&d.artifact_id),
                    version: esc_opt(&d.version),
                })
                .collect(),
        }
    }
}

/// A generated project folder and its files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppProject {
    pub folder: String,
    pub pom: String,
    pub assembly: String,
    pub deploy_options: String,
}

impl AppProject {
    /// `(path, content)` of each file, relative to the repository root.
    pub fn files(&self) -> Vec<(String, String)> {
        vec![
            (format!("{}/{POM}", self.folder), self.pom.clone()),
            (format!("{}/{ASSEMBLY}", self.folder), self.assembly.clone()),
            (
                format!("{}/{DEPLOY_OPTIONS}", self.folder),
                self.deploy_options.clone(),
            ),
        ]
    }
}

pub struct Templates {
    tera: Tera,
    assembly: String,
    deploy_options: String,
}

impl Templates {
    fn new(pom: &str, assembly: String, deploy_options: String) -> Result<Self> {
        let mut tera = Tera::default();
        tera.add_raw_template(POM_TEMPLATE, pom)?;

        Ok(Self {
            tera,
            assembly,
            deploy_options,
        })
    }

    /// Templates compiled into the binary.
    pub fn bundled() -> Result<Self> {
        Self::new(
            BUNDLED_POM,
            BUNDLED_ASSEMBLY.to_string(),
            BUNDLED_DEPLOY_OPTIONS.to_string(),
        )
    }

    /// Templates read from an override directory. Every file must exist.
    pub fn from_dir(dir: &Path) -> Result<Self> {
        let read = |name: &str| -> Result<String> {
            let path: PathBuf = dir.join(name);
            std::fs::read_to_string(&path).map_err(|err| {
                error!("failed to read template {}: {err}", path.display());
                StewardError::MissingTemplate(path.display().to_string())
            })
        };

        let pom = read(POM_TEMPLATE)?;
        Self::new(&pom, read(ASSEMBLY)?, read(DEPLOY_OPTIONS)?)
    }

    pub fn load(dir: Option<&Path>) -> Result<Self> {
        match dir {
            Some(dir) => {
                info!("loading app templates from {}", dir.display());
                Self::from_dir(dir)
            }
            None => Self::bundled(),
        }
    }

    pub fn render_pom(&self, context: &AppPomContext) -> Result<String> {
        let context = Context::from_serialize(context.escaped())?;
        Ok(self.tera.render(POM_TEMPLATE, &context)?)
    }

    /// Renders every file of a new project in `folder`.
    pub fn render_project(
        &self,
        folder: impl Into<String>,
        context: &AppPomContext,
    ) -> Result<AppProject> {
        Ok(AppProject {
            folder: folder.into(),
            pom: self.render_pom(context)?,
            assembly: self.assembly.clone(),
            deploy_options: self.deploy_options.clone(),
        })
    }
}
