//! Minimal XML helpers for ADT payloads.
//!
//! ADT documents are namespaced (`adtcore:uri`, `chkrun:type`, ...). Every
//! helper here matches elements and attributes by local name only.

use crate::error::AdtResult;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::borrow::Cow;
use std::collections::HashMap;

/// An element matched by [`collect_elements`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct XmlElement {
    /// Attributes keyed by local name.
    pub attributes: HashMap<String, String>,
    /// Concatenated text of all descendants.
    pub text: String,
    /// First text value of each descendant element, keyed by local name.
    pub fields: HashMap<String, String>,
}

impl XmlElement {
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// Attribute value or an empty string
    pub fn attr_or_default(&self, name: &str) -> String {
        self.attr(name).unwrap_or_default().to_string()
    }

    /// Descendant field value or an empty string
    pub fn field(&self, name: &str) -> String {
        self.fields.get(name).cloned().unwrap_or_default()
    }

    fn from_start(start: &BytesStart<'_>) -> AdtResult<Self> {
        Ok(Self {
            attributes: attributes(start)?,
            ..Default::default()
        })
    }
}

struct Frame {
    name: String,
    is_match: bool,
    capture_for: Vec<usize>,
}

/// Collect every element whose local name is `local_name`, in document order.
pub fn collect_elements(xml: &str, local_name: &str) -> AdtResult<Vec<XmlElement>> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    let mut results: Vec<XmlElement> = Vec::new();
    let mut open: Vec<usize> = Vec::new();
    let mut stack: Vec<Frame> = Vec::new();

    loop {
        match reader.read_event()? {
            Event::Start(start) => {
                let name = local_str(start.local_name().as_ref());
                let is_match = name == local_name;
                let capture_for = claim_field(&mut results, &open, &name, is_match);

                if is_match {
                    results.push(XmlElement::from_start(&start)?);
                    open.push(results.len() - 1);
                }
                stack.push(Frame {
                    name,
                    is_match,
                    capture_for,
                });
            }
            Event::Empty(start) => {
                let name = local_str(start.local_name().as_ref());
                let is_match = name == local_name;
                claim_field(&mut results, &open, &name, is_match);

                if is_match {
                    results.push(XmlElement::from_start(&start)?);
                }
            }
            Event::Text(text) => {
                let text = text.unescape()?;
                append_text(&mut results, &open, stack.last(), &text);
            }
            Event::CData(data) => {
                let bytes = data.into_inner();
                let text = String::from_utf8_lossy(&bytes);
                append_text(&mut results, &open, stack.last(), &text);
            }
            Event::End(_) => {
                if let Some(frame) = stack.pop() {
                    if frame.is_match {
                        open.pop();
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(results)
}

/// Reserve `name` as a field on every open match that has not seen it yet
fn claim_field(
    results: &mut [XmlElement],
    open: &[usize],
    name: &str,
    is_match: bool,
) -> Vec<usize> {
    if is_match {
        return Vec::new();
    }

    open.iter()
        .copied()
        .filter(|&index| {
            let fields = &mut results[index].fields;
            if fields.contains_key(name) {
                false
            } else {
                fields.insert(name.to_string(), String::new());
                true
            }
        })
        .collect()
}

fn append_text(results: &mut [XmlElement], open: &[usize], frame: Option<&Frame>, text: &str) {
    for &index in open {
        results[index].text.push_str(text);
    }
    if let Some(frame) = frame {
        for &index in &frame.capture_for {
            if let Some(value) = results[index].fields.get_mut(&frame.name) {
                value.push_str(text);
            }
        }
    }
}

fn attributes(start: &BytesStart<'_>) -> AdtResult<HashMap<String, String>> {
    let mut map = HashMap::new();
    for attr in start.attributes() {
        let attr = attr?;
        let key = local_str(attr.key.local_name().as_ref());
        let value = attr.unescape_value()?.into_owned();
        map.insert(key, value);
    }
    Ok(map)
}

fn local_str(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

/// Escape text for use in element content or attribute values
pub fn escape(raw: &str) -> Cow<'_, str> {
    quick_xml::escape::escape(raw)
}

/// Parsed `exc:exception` document
#[derive(Debug, Clone, PartialEq)]
pub struct AdtException {
    pub message: String,
    pub exception_type: Option<String>,
}

/// Parse an ADT exception body, `None` when the body is something else
pub fn parse_exception(body: &str) -> Option<AdtException> {
    let exception = collect_elements(body, "exception").ok()?.into_iter().next()?;

    let message = exception.fields.get("message").cloned().unwrap_or_default();
    let exception_type = collect_elements(body, "type")
        .ok()
        .and_then(|types| types.into_iter().next())
        .and_then(|element| element.attributes.get("id").cloned());

    Some(AdtException {
        message: message.trim().to_string(),
        exception_type,
    })
}
