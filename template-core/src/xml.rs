//! XML export/import of element collections.
//!
//! Wire format:
//!
//! ```xml
//! <template>
//!   <elements>
//!     <element type="rectangle" id="r1">
//!       <properties>
//!         <position>{"x":10.0,"y":20.0}</position>
//!         <name>"Rectangle"</name>
//!       </properties>
//!     </element>
//!   </elements>
//! </template>
//! ```
//!
//! Every property value is JSON text, strings included. On import a value
//! that is not valid JSON is taken as a bare string, so documents written by
//! older exporters still load.

use quick_xml::escape::escape;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use serde_json::{Map, Value};

use crate::element::{CanvasElement, ElementId, ElementKind};
use crate::geometry::Position;
use crate::session::EditorSession;
use crate::validation::validate_element_id;
use crate::{TemplateError, TemplateResult};

/// Identity keys carried as attributes, skipped inside `<properties>`.
const IDENTITY_KEYS: [&str; 3] = ["id", "type", "family"];

/// Serialize elements to the XML wire format.
///
/// # Errors
///
/// Returns [`TemplateError::Serialization`] if a property fails to encode.
pub fn export_xml(elements: &[CanvasElement]) -> TemplateResult<String> {
    let mut xml =
        String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<template>\n  <elements>\n");
    for element in elements {
        xml.push_str(&format!(
            "    <element type=\"{}\" id=\"{}\">\n      <properties>\n",
            element.kind(),
            escape(element.id().as_str())
        ));
        let Value::Object(properties) = serde_json::to_value(element.properties())? else {
            return Err(TemplateError::InvalidProperties(format!(
                "element {} did not serialize to an object",
                element.id()
            )));
        };
        for (key, value) in &properties {
            let encoded = serde_json::to_string(value)?;
            xml.push_str(&format!("        <{key}>{}</{key}>\n", escape(&encoded)));
        }
        xml.push_str("      </properties>\n    </element>\n");
    }
    xml.push_str("  </elements>\n</template>\n");
    Ok(xml)
}

/// One `<element>` being read.
struct PendingElement {
    kind: ElementKind,
    id: ElementId,
    properties: Vec<(String, String)>,
}

/// Parse elements from the XML wire format.
///
/// All-or-nothing: any malformed element fails the whole document.
/// Elements without an `id` get a fresh one; elements without
/// `<properties>` get kind defaults at position (100, 100).
///
/// # Errors
///
/// Returns [`TemplateError::Xml`] for malformed XML, a missing `<template>`
/// root, unknown kinds or invalid ids, and
/// [`TemplateError::InvalidProperties`] for property values of the wrong shape.
pub fn import_xml(xml: &str) -> TemplateResult<Vec<CanvasElement>> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut stack: Vec<String> = Vec::new();
    let mut pending: Option<PendingElement> = None;
    let mut text = String::new();
    let mut seen_root = false;
    let mut elements = Vec::new();

    loop {
        let event = reader
            .read_event()
            .map_err(|e| TemplateError::Xml(format!("at byte {}: {e}", reader.buffer_position())))?;
        match event {
            Event::Start(start) => {
                let name = tag_name(&start)?;
                check_root(&stack, &name, &mut seen_root)?;
                match (stack.last().map(String::as_str), name.as_str()) {
                    (_, "element") if pending.is_none() => pending = Some(begin_element(&start)?),
                    (Some("properties"), _) if pending.is_some() => text.clear(),
                    (Some(parent), _)
                        if pending.is_some()
                            && stack.iter().rev().nth(1).is_some_and(|p| p == "properties") =>
                    {
                        return Err(TemplateError::Xml(format!(
                            "unexpected <{name}> inside property <{parent}>"
                        )));
                    }
                    _ => {}
                }
                stack.push(name);
            }
            Event::Empty(start) => {
                let name = tag_name(&start)?;
                check_root(&stack, &name, &mut seen_root)?;
                match (stack.last().map(String::as_str), pending.as_mut()) {
                    (_, None) if name == "element" => {
                        elements.push(build_element(begin_element(&start)?)?);
                    }
                    (Some("properties"), Some(current)) => {
                        current.properties.push((name, String::new()));
                    }
                    _ => {}
                }
            }
            Event::Text(t) => {
                let unescaped = t
                    .unescape()
                    .map_err(|e| TemplateError::Xml(e.to_string()))?;
                text.push_str(&unescaped);
            }
            Event::CData(data) => text.push_str(&String::from_utf8_lossy(&data)),
            Event::End(end) => {
                let name = std::str::from_utf8(end.name().as_ref())
                    .map_err(|e| TemplateError::Xml(e.to_string()))?
                    .to_string();
                stack.pop();
                if name == "element" {
                    if let Some(current) = pending.take() {
                        elements.push(build_element(current)?);
                    }
                } else if stack.last().is_some_and(|p| p == "properties") {
                    if let Some(current) = pending.as_mut() {
                        current.properties.push((name, std::mem::take(&mut text)));
                    }
                }
                text.clear();
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !stack.is_empty() {
        return Err(TemplateError::Xml(format!("unclosed <{}>", stack.join("> <"))));
    }
    if !seen_root {
        return Err(TemplateError::Xml("missing <template> root".to_string()));
    }
    Ok(elements)
}

fn tag_name(start: &BytesStart<'_>) -> TemplateResult<String> {
    std::str::from_utf8(start.name().as_ref())
        .map(str::to_string)
        .map_err(|e| TemplateError::Xml(e.to_string()))
}

fn check_root(stack: &[String], name: &str, seen_root: &mut bool) -> TemplateResult<()> {
    if stack.is_empty() {
        if name != "template" || *seen_root {
            return Err(TemplateError::Xml(format!("unexpected root <{name}>")));
        }
        *seen_root = true;
    }
    Ok(())
}

fn attribute(start: &BytesStart<'_>, key: &str) -> TemplateResult<Option<String>> {
    let Some(attr) = start
        .try_get_attribute(key)
        .map_err(|e| TemplateError::Xml(e.to_string()))?
    else {
        return Ok(None);
    };
    let value = attr
        .unescape_value()
        .map_err(|e| TemplateError::Xml(e.to_string()))?;
    Ok(Some(value.into_owned()))
}

fn begin_element(start: &BytesStart<'_>) -> TemplateResult<PendingElement> {
    let kind: ElementKind = attribute(start, "type")?
        .ok_or_else(|| TemplateError::Xml("<element> without type".to_string()))?
        .parse()?;
    let id = match attribute(start, "id")? {
        Some(id) => {
            validate_element_id(&id)?;
            ElementId::from(id)
        }
        None => ElementId::new(),
    };
    Ok(PendingElement {
        kind,
        id,
        properties: Vec::new(),
    })
}

fn build_element(pending: PendingElement) -> TemplateResult<CanvasElement> {
    let mut element = CanvasElement::with_id(pending.id, pending.kind, Position::new(100.0, 100.0));
    for (key, raw) in pending.properties {
        if IDENTITY_KEYS.contains(&key.as_str()) {
            continue;
        }
        apply_property(&mut element, key, &raw)?;
    }
    Ok(element)
}

/// Apply one property value, retrying as a bare string when the JSON reading
/// does not fit (e.g. a name of `123`).
fn apply_property(element: &mut CanvasElement, key: String, raw: &str) -> TemplateResult<()> {
    let parsed =
        serde_json::from_str::<Value>(raw).unwrap_or_else(|_| Value::String(raw.to_string()));
    let as_string = (!parsed.is_string()).then(|| Value::String(raw.to_string()));

    let mut single = Map::new();
    single.insert(key.clone(), parsed);
    match element.properties_mut().apply_json(&single) {
        Ok(_) => Ok(()),
        Err(first) => {
            let Some(fallback) = as_string else {
                return Err(first);
            };
            let mut single = Map::new();
            single.insert(key, fallback);
            element
                .properties_mut()
                .apply_json(&single)
                .map(|_| ())
                .map_err(|_| first)
        }
    }
}

impl EditorSession {
    /// Append every element of an XML document as one undoable action.
    ///
    /// Nothing is added if any part of the document is malformed.
    ///
    /// # Errors
    ///
    /// See [`import_xml`].
    pub fn import_xml(&mut self, xml: &str) -> TemplateResult<Vec<ElementId>> {
        let elements = import_xml(xml)?;
        tracing::info!("Importing {} element(s) from XML", elements.len());
        Ok(self.add_elements(elements))
    }

    /// Export the current elements as XML.
    ///
    /// # Errors
    ///
    /// See [`export_xml`].
    pub fn export_xml(&self) -> TemplateResult<String> {
        tracing::info!("Exporting {} element(s) to XML", self.document().len());
        export_xml(self.elements())
    }
}
