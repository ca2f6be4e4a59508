//! Minimal XML element tree for XML-RPC and SOAP responses
//!
//! Names are stored without their namespace prefix; the documents exchanged
//! with Magento never rely on two namespaces sharing a local name.

use crate::error::{MagentoError, Result};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Element {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<Element>,
    pub text: String,
}

impl Element {
    fn from_start(start: &BytesStart<'_>) -> Result<Self> {
        let mut attributes = Vec::new();
        for attr in start.attributes() {
            let attr = attr.map_err(quick_xml::Error::from)?;
            attributes.push((
                String::from_utf8_lossy(attr.key.local_name().as_ref()).into_owned(),
                attr.unescape_value()?.into_owned(),
            ));
        }

        Ok(Self {
            name: String::from_utf8_lossy(start.local_name().as_ref()).into_owned(),
            attributes,
            children: Vec::new(),
            text: String::new(),
        })
    }

    /// Attribute value by local name
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// First direct child with the given local name
    pub fn child(&self, name: &str) -> Option<&Element> {
        self.children.iter().find(|c| c.name == name)
    }

    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Element> + 'a {
        self.children.iter().filter(move |c| c.name == name)
    }

    /// First descendant (depth-first, self included) with the given local name
    pub fn find(&self, name: &str) -> Option<&Element> {
        if self.name == name {
            return Some(self);
        }
        self.children.iter().find_map(|c| c.find(name))
    }

    /// Child element or a malformed-response error naming what was expected
    pub fn expect_child(&self, name: &str) -> Result<&Element> {
        self.child(name).ok_or_else(|| {
            MagentoError::MalformedResponse(format!(
                "<{}> element has no <{}> child",
                self.name, name
            ))
        })
    }
}

/// Parse a document into its root element
pub fn parse(xml: &str) -> Result<Element> {
    let mut reader = Reader::from_str(xml);
    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;

    loop {
        match reader.read_event()? {
            Event::Start(start) => stack.push(Element::from_start(&start)?),
            Event::Empty(start) => {
                let element = Element::from_start(&start)?;
                attach(&mut stack, &mut root, element);
            }
            Event::End(_) => {
                let element = stack.pop().ok_or_else(|| {
                    MagentoError::MalformedResponse("unbalanced closing tag".to_string())
                })?;
                attach(&mut stack, &mut root, element);
            }
            Event::Text(text) => {
                if let Some(current) = stack.last_mut() {
                    current.text.push_str(&text.unescape()?);
                }
            }
            Event::CData(data) => {
                if let Some(current) = stack.last_mut() {
                    current
                        .text
                        .push_str(&String::from_utf8_lossy(&data.into_inner()));
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !stack.is_empty() {
        return Err(MagentoError::MalformedResponse(
            "document ended inside an open element".to_string(),
        ));
    }

    root.ok_or_else(|| MagentoError::MalformedResponse("empty XML document".to_string()))
}

fn attach(stack: &mut [Element], root: &mut Option<Element>, element: Element) {
    match stack.last_mut() {
        Some(parent) => parent.children.push(element),
        None => {
            if root.is_none() {
                *root = Some(element);
            }
        }
    }
}

/// Escape text for element content and attribute values
pub fn escape(raw: &str) -> String {
    quick_xml::escape::escape(raw).into_owned()
}
