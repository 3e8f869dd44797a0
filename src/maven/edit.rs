//! Event-level rewriting of `pom.xml` files. Every event an edit does not
//! touch is written back as read, so formatting and comments survive.
use log::*;
use quick_xml::{
    Reader, Writer,
    events::{BytesEnd, BytesStart, BytesText, Event},
};

use crate::{
    Result,
    maven::pom::{IAR, POM, Pom, element_name},
};

const PROJECT: &[&str] = &["project"];
const PROJECT_VERSION: &[&str] = &["project", "version"];
const PROJECT_ARTIFACT_ID: &[&str] = &["project", "artifactId"];
const MODULES: &[&str] = &["project", "modules"];
const DEPENDENCY: &[&str] = &["project", "dependencies", "dependency"];
const DEFAULT_INDENT: &str = "\n  ";

fn is_at(path: &[String], expected: &[&str]) -> bool {
    path.len() == expected.len()
        && path.iter().zip(expected).all(|(a, b)| a == b)
}

/// Name of the element directly inside a `<dependency>`, if `path` is one.
fn dependency_field(path: &[String]) -> Option<&str> {
    match path.split_last() {
        Some((field, parent)) if is_at(parent, DEPENDENCY) => Some(field.as_str()),
        _ => None,
    }
}

fn raw_text(e: &BytesText) -> Result<String> {
    Ok(String::from_utf8(e.to_vec())?)
}

/// Writes already escaped text, typically indentation.
fn write_raw(writer: &mut Writer<Vec<u8>>, text: &str) -> Result<()> {
    if !text.is_empty() {
        writer.write_event(Event::Text(BytesText::from_escaped(text)))?;
    }
    Ok(())
}

fn write_element(
    writer: &mut Writer<Vec<u8>>,
    name: &str,
    text: &str,
) -> Result<()> {
    writer.write_event(Event::Start(BytesStart::new(name)))?;
    writer.write_event(Event::Text(BytesText::new(text)))?;
    writer.write_event(Event::End(BytesEnd::new(name)))?;
    Ok(())
}

fn indent_unit(indent: &str) -> &str {
    match indent.trim_start_matches(['\r', '\n']) {
        "" => "  ",
        unit => unit,
    }
}

/// Writes `<name>version</name>` in place of a self-closing `<name/>`.
fn expand_empty(
    writer: &mut Writer<Vec<u8>>,
    e: BytesStart<'_>,
    text: &str,
) -> Result<()> {
    let end = e.to_end().into_owned();
    writer.write_event(Event::Start(e))?;
    writer.write_event(Event::Text(BytesText::new(text)))?;
    writer.write_event(Event::End(end))?;
    Ok(())
}

/// Sets the project's own `<version>`, inserting it after `<artifactId>`
/// when the project inherits its version.
///
/// The first text of `<version>` is replaced and any further text or CDATA
/// pieces are dropped, so comments inside the element survive.
pub fn set_project_version(xml: &str, version: &str) -> Result<String> {
    let has_version = Pom::parse(POM, xml)?.version.is_some();

    let mut reader = Reader::from_str(xml);
    let mut writer = Writer::new(Vec::new());
    let mut path: Vec<String> = vec![];
    let mut indent = DEFAULT_INDENT.to_string();
    let mut written = false;

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                path.push(element_name(&e)?);
                if is_at(&path, PROJECT_VERSION) {
                    written = false;
                }
                writer.write_event(Event::Start(e))?;
            }
            Event::Empty(e)
                if is_at(&path, PROJECT) && element_name(&e)? == "version" =>
            {
                expand_empty(&mut writer, e, version)?;
            }
            Event::End(e) => {
                let closes_artifact_id = is_at(&path, PROJECT_ARTIFACT_ID);

                if is_at(&path, PROJECT_VERSION) && !written {
                    writer.write_event(Event::Text(BytesText::new(version)))?;
                }

                path.pop();
                writer.write_event(Event::End(e))?;

                if closes_artifact_id && !has_version {
                    write_raw(&mut writer, &indent)?;
                    write_element(&mut writer, "version", version)?;
                }
            }
            Event::Text(_) | Event::CData(_)
                if is_at(&path, PROJECT_VERSION) =>
            {
                if !written {
                    writer.write_event(Event::Text(BytesText::new(version)))?;
                    written = true;
                }
            }
            Event::Text(e) => {
                if is_at(&path, PROJECT) {
                    indent = raw_text(&e)?;
                }
                writer.write_event(Event::Text(e))?;
            }
            Event::Eof => break,
            e => writer.write_event(e)?,
        }
    }

    debug!("set project version to {version}");

    Ok(String::from_utf8(writer.into_inner())?)
}

/// Role of a buffered dependency event in the version rewrite.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    Other,
    /// Text or CDATA inside `<version>`
    VersionText,
    /// `</version>`
    VersionEnd,
    /// `<version/>`
    VersionEmpty,
}

#[derive(Default)]
struct PendingDependency {
    group_id: String,
    dep_type: String,
    events: Vec<(Slot, Event<'static>)>,
}

fn emit(
    writer: &mut Writer<Vec<u8>>,
    pending: &mut Option<PendingDependency>,
    event: Event<'_>,
    slot: Slot,
) -> Result<()> {
    match pending {
        Some(dep) => dep.events.push((slot, event.into_owned())),
        None => writer.write_event(event)?,
    }
    Ok(())
}

/// Replays a buffered dependency, setting its `<version>` to `version`
/// when given.
fn write_dependency(
    writer: &mut Writer<Vec<u8>>,
    events: Vec<(Slot, Event<'static>)>,
    version: Option<&str>,
) -> Result<()> {
    let Some(version) = version else {
        for (_, event) in events {
            writer.write_event(event)?;
        }
        return Ok(());
    };

    let mut written = false;

    for (slot, event) in events {
        match (slot, event) {
            (Slot::VersionText, _) if written => {}
            (Slot::VersionText, _) => {
                writer.write_event(Event::Text(BytesText::new(version)))?;
                written = true;
            }
            (Slot::VersionEnd, event) => {
                if !written {
                    writer.write_event(Event::Text(BytesText::new(version)))?;
                }
                writer.write_event(event)?;
                written = false;
            }
            (Slot::VersionEmpty, Event::Empty(e)) => {
                expand_empty(writer, e, version)?;
            }
            (_, event) => writer.write_event(event)?,
        }
    }

    Ok(())
}

/// Sets the version of every `iar` dependency that shares the project's
/// groupId. Other dependencies are left alone.
pub fn set_internal_dependency_versions(
    xml: &str,
    version: &str,
) -> Result<String> {
    let pom = Pom::parse(POM, xml)?;

    let Some(group_id) = pom.group_id().map(str::to_string) else {
        warn!("{} has no groupId: skipping dependency update", pom.artifact_id);
        return Ok(xml.to_string());
    };

    let mut reader = Reader::from_str(xml);
    let mut writer = Writer::new(Vec::new());
    let mut path: Vec<String> = vec![];
    let mut pending: Option<PendingDependency> = None;
    let mut updated = 0;

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                path.push(element_name(&e)?);
                if is_at(&path, DEPENDENCY) {
                    pending = Some(PendingDependency::default());
                }
                emit(&mut writer, &mut pending, Event::Start(e), Slot::Other)?;
            }
            Event::Empty(e) => {
                let slot = if is_at(&path, DEPENDENCY)
                    && element_name(&e)? == "version"
                {
                    Slot::VersionEmpty
                } else {
                    Slot::Other
                };
                emit(&mut writer, &mut pending, Event::Empty(e), slot)?;
            }
            event @ (Event::Text(_) | Event::CData(_)) => {
                let field = dependency_field(&path);

                if let Some(dep) = pending.as_mut() {
                    let text = match &event {
                        Event::Text(e) => e.unescape()?.into_owned(),
                        Event::CData(e) => String::from_utf8(e.to_vec())?,
                        _ => String::new(),
                    };

                    match field {
                        Some("groupId") => dep.group_id.push_str(&text),
                        Some("type") => dep.dep_type.push_str(&text),
                        _ => {}
                    }
                }

                let slot = if field == Some("version") {
                    Slot::VersionText
                } else {
                    Slot::Other
                };
                emit(&mut writer, &mut pending, event, slot)?;
            }
            Event::End(e) => {
                let closes_dependency = is_at(&path, DEPENDENCY);
                let slot = if dependency_field(&path) == Some("version") {
                    Slot::VersionEnd
                } else {
                    Slot::Other
                };
                path.pop();
                emit(&mut writer, &mut pending, Event::End(e), slot)?;

                if closes_dependency && let Some(dep) = pending.take() {
                    let internal = dep.dep_type.trim() == IAR
                        && pom.resolve(dep.group_id.trim()) == group_id;

                    if internal {
                        updated += 1;
                    }

                    write_dependency(
                        &mut writer,
                        dep.events,
                        internal.then_some(version),
                    )?;
                }
            }
            Event::Eof => break,
            e => emit(&mut writer, &mut pending, e, Slot::Other)?,
        }
    }

    debug!("set {updated} internal dependency versions to {version}");

    Ok(String::from_utf8(writer.into_inner())?)
}

/// Appends `<module>` to the project's module list, creating the
/// `<modules>` section when needed. A module already listed is not added
/// twice.
pub fn append_module(xml: &str, module: &str) -> Result<String> {
    let pom = Pom::parse(POM, xml)?;

    if pom.modules.iter().any(|m| m == module) {
        info!("module {module} already declared in {}", pom.artifact_id);
        return Ok(xml.to_string());
    }

    let mut reader = Reader::from_str(xml);
    let mut writer = Writer::new(Vec::new());
    let mut path: Vec<String> = vec![];
    // whitespace directly inside <project> or <modules>, written once the
    // next event shows where it belongs
    let mut held: Option<String> = None;
    let mut child_indent = DEFAULT_INDENT.to_string();
    let mut module_indent: Option<String> = None;
    let mut inserted = false;

    loop {
        match reader.read_event()? {
            Event::Text(e) if is_at(&path, PROJECT) || is_at(&path, MODULES) => {
                held.get_or_insert_with(String::new).push_str(&raw_text(&e)?);
            }
            Event::Start(e) => {
                if let Some(ws) = held.take() {
                    write_raw(&mut writer, &ws)?;
                    if is_at(&path, PROJECT) {
                        child_indent = ws;
                    } else if is_at(&path, MODULES) {
                        module_indent = Some(ws);
                    }
                }
                path.push(element_name(&e)?);
                writer.write_event(Event::Start(e))?;
            }
            Event::Empty(e) => {
                if let Some(ws) = held.take() {
                    write_raw(&mut writer, &ws)?;
                    if is_at(&path, PROJECT) {
                        child_indent = ws;
                    }
                }

                if is_at(&path, PROJECT)
                    && element_name(&e)? == "modules"
                    && !inserted
                {
                    let nested =
                        format!("{child_indent}{}", indent_unit(&child_indent));
                    writer.write_event(Event::Start(e.clone()))?;
                    write_raw(&mut writer, &nested)?;
                    write_element(&mut writer, "module", module)?;
                    write_raw(&mut writer, &child_indent)?;
                    writer.write_event(Event::End(e.to_end()))?;
                    inserted = true;
                } else {
                    writer.write_event(Event::Empty(e))?;
                }
            }
            Event::End(e) => {
                let closing_ws = held.take().unwrap_or_default();

                if is_at(&path, MODULES) && !inserted {
                    let indent = module_indent.clone().unwrap_or_else(|| {
                        format!("{child_indent}{}", indent_unit(&child_indent))
                    });
                    write_raw(&mut writer, &indent)?;
                    write_element(&mut writer, "module", module)?;
                    if closing_ws.is_empty() {
                        write_raw(&mut writer, &child_indent)?;
                    } else {
                        write_raw(&mut writer, &closing_ws)?;
                    }
                    inserted = true;
                } else if is_at(&path, PROJECT) && !inserted {
                    let nested =
                        format!("{child_indent}{}", indent_unit(&child_indent));
                    write_raw(&mut writer, &child_indent)?;
                    writer.write_event(Event::Start(BytesStart::new("modules")))?;
                    write_raw(&mut writer, &nested)?;
                    write_element(&mut writer, "module", module)?;
                    write_raw(&mut writer, &child_indent)?;
                    writer.write_event(Event::End(BytesEnd::new("modules")))?;
                    write_raw(&mut writer, &closing_ws)?;
                    inserted = true;
                } else {
                    write_raw(&mut writer, &closing_ws)?;
                }

                path.pop();
                writer.write_event(Event::End(e))?;
            }
            Event::Eof => break,
            e => {
                if let Some(ws) = held.take() {
                    write_raw(&mut writer, &ws)?;
                }
                writer.write_event(e)?;
            }
        }
    }

    info!("appended module {module} to {}", pom.artifact_id);

    Ok(String::from_utf8(writer.into_inner())?)
}
