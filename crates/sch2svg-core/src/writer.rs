//! Streaming SVG writer with attribute inheritance.
//!
//! [`SvgWriter`] serializes elements through `quick_xml` as soon as their
//! content is known. It keeps a stack of open elements so that inherited
//! attributes (`stroke`, `fill`, `stroke-width`, ...) are only written when
//! they differ from the value the nearest ancestor already carries.
//!
//! # Pending start tags
//!
//! A start tag is held back until the element receives its first child,
//! text or comment, or until it is closed. Attributes can be added while the
//! tag is pending. This is how the root `svg` element picks up its size after
//! the drawing records have started streaming, and how childless elements
//! become empty tags.
//!
//! ```
//! use sch2svg_core::writer::{SvgWriter, WriterOptions};
//!
//! let mut out = Vec::new();
//! let mut writer = SvgWriter::new(&mut out, WriterOptions::default());
//! writer.start_element("svg").unwrap();
//! writer.inherited_attribute("stroke", "red").unwrap();
//! writer.start_element("line").unwrap();
//! writer.inherited_attribute("stroke", "red").unwrap();
//! writer.attribute("x1", 10).unwrap();
//! writer.end_element("line").unwrap();
//! writer.end_element("svg").unwrap();
//! writer.finish().unwrap();
//!
//! assert_eq!(
//!     String::from_utf8(out).unwrap(),
//!     r#"<svg xmlns="http://www.w3.org/2000/svg" stroke="red"><line x1="10"/></svg>"#
//! );
//! ```

use std::{collections::HashMap, fmt, io::Write};

use log::trace;
use quick_xml::{
    Writer,
    events::{BytesEnd, BytesStart, BytesText, Event},
};
use thiserror::Error;

use crate::error::EngineError;

const SVG_NAMESPACE: &str = "http://www.w3.org/2000/svg";
const ROOT_ELEMENT: &str = "svg";

/// Errors raised while writing SVG output.
#[derive(Debug, Error)]
pub enum WriterError {
    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error("XML serialization failed: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, WriterError>;

/// Output options for [`SvgWriter`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriterOptions {
    /// Replaces an explicit `stroke-width` of zero.
    pub default_stroke_width: u32,
    /// When false every `class` attribute is dropped.
    pub css_classes: bool,
    /// Indent nested elements by two spaces.
    pub pretty: bool,
}

impl Default for WriterOptions {
    fn default() -> Self {
        Self {
            default_stroke_width: 6,
            css_classes: false,
            pretty: false,
        }
    }
}

/// A decimal printed with at most three fractional digits and no trailing
/// zeros.
///
/// ```
/// # use sch2svg_core::writer::Number;
/// assert_eq!(Number(297.0022).to_string(), "297.002");
/// assert_eq!(Number(12.5).to_string(), "12.5");
/// assert_eq!(Number(-0.0001).to_string(), "0");
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Number(pub f64);

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = format!("{:.3}", self.0);
        let text = text.trim_end_matches('0').trim_end_matches('.');
        match text {
            "-0" | "" => f.write_str("0"),
            other => f.write_str(other),
        }
    }
}

#[derive(Debug)]
struct OpenElement {
    name: String,
    /// Every attribute set on this element, written or elided.
    recorded: HashMap<String, String>,
    /// Attributes of a start tag that has not been serialized yet.
    pending: Option<Vec<(String, String)>>,
}

impl OpenElement {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            recorded: HashMap::new(),
            pending: Some(Vec::new()),
        }
    }
}

/// Streaming SVG writer. See the [module documentation](self).
pub struct SvgWriter<W: Write> {
    xml: Writer<W>,
    options: WriterOptions,
    stack: Vec<OpenElement>,
    root_started: bool,
    root_closed: bool,
    emitted: bool,
}

impl<W: Write> SvgWriter<W> {
    pub fn new(inner: W, options: WriterOptions) -> Self {
        let xml = if options.pretty {
            Writer::new_with_indent(inner, b' ', 2)
        } else {
            Writer::new(inner)
        };

        Self {
            xml,
            options,
            stack: Vec::new(),
            root_started: false,
            root_closed: false,
            emitted: false,
        }
    }

    pub fn options(&self) -> &WriterOptions {
        &self.options
    }

    /// Whether the root element has been started and not yet closed.
    pub fn is_root_open(&self) -> bool {
        self.root_started && !self.root_closed
    }

    /// Whether the root start tag is still waiting for its first content.
    pub fn is_root_pending(&self) -> bool {
        self.stack.len() == 1 && self.stack[0].pending.is_some()
    }

    /// Whether any bytes have been handed to the underlying sink.
    pub fn has_emitted(&self) -> bool {
        self.emitted
    }

    /// Number of open elements.
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// Opens a new element as a child of the current one.
    ///
    /// The first element must be `svg`, and nothing can be opened once the
    /// root element has been closed.
    pub fn start_element(&mut self, name: &str) -> Result<()> {
        if self.root_closed {
            return Err(EngineError::new(format!("cannot start <{name}> after the root element was closed")).into());
        }

        if self.stack.is_empty() {
            if self.root_started || name != ROOT_ELEMENT {
                return Err(EngineError::new(format!("<{name}> cannot be the root element")).into());
            }
            self.root_started = true;
            self.stack.push(OpenElement::new(name));
            return self.attribute("xmlns", SVG_NAMESPACE);
        }

        self.write_pending_start()?;
        self.stack.push(OpenElement::new(name));
        Ok(())
    }

    /// Sets an attribute that children inherit.
    ///
    /// The attribute is recorded on the current element but only written
    /// when the nearest ancestor carrying the same attribute has a different
    /// value, or no ancestor carries it at all.
    pub fn inherited_attribute(&mut self, name: &str, value: impl fmt::Display) -> Result<()> {
        let Some(value) = self.normalize(name, value) else {
            return Ok(());
        };

        let inherited = self.stack.iter().rev().skip(1).find_map(|element| element.recorded.get(name));
        if inherited == Some(&value) {
            trace!(name, value = value.as_str(); "Elided inherited attribute");
            let current = self.current_mut()?;
            let Some(pending) = current.pending.as_mut() else {
                return Err(attribute_after_content(name, &current.name).into());
            };
            pending.retain(|(existing, _)| existing != name);
            current.recorded.insert(name.to_string(), value);
            return Ok(());
        }

        self.push_attribute(name, value)
    }

    /// Sets an attribute that is always written.
    pub fn attribute(&mut self, name: &str, value: impl fmt::Display) -> Result<()> {
        let Some(value) = self.normalize(name, value) else {
            return Ok(());
        };
        self.push_attribute(name, value)
    }

    /// Sets the `class` attribute. Dropped unless CSS classes are enabled.
    pub fn class(&mut self, name: &str) -> Result<()> {
        self.attribute("class", name)
    }

    /// Appends a comment to the current element.
    pub fn comment(&mut self, text: &str) -> Result<()> {
        if self.stack.is_empty() {
            return Err(EngineError::new("comments need an open element").into());
        }
        self.write_pending_start()?;
        // `--` is not allowed inside XML comments.
        let text = text.replace("--", "- -");
        self.write(Event::Comment(BytesText::from_escaped(format!(" {text} "))))
    }

    /// Appends character data to the current element.
    pub fn text(&mut self, text: &str) -> Result<()> {
        if self.stack.is_empty() {
            return Err(EngineError::new("text needs an open element").into());
        }
        self.write_pending_start()?;
        self.write(Event::Text(BytesText::new(text)))
    }

    /// Closes the current element, which must be called `name`.
    pub fn end_element(&mut self, name: &str) -> Result<()> {
        let Some(element) = self.stack.pop() else {
            return Err(EngineError::new(format!("</{name}> without an open element")).into());
        };
        if element.name != name {
            let message = format!("</{name}> does not match the open <{}>", element.name);
            self.stack.push(element);
            return Err(EngineError::new(message).into());
        }

        match element.pending {
            Some(attributes) => {
                let start = start_tag(&element.name, &attributes);
                self.write(Event::Empty(start))?;
            }
            None => self.write(Event::End(BytesEnd::new(element.name.as_str())))?,
        }

        if self.stack.is_empty() {
            self.root_closed = true;
        }
        Ok(())
    }

    /// Closes every open element, innermost first.
    pub fn end_all(&mut self) -> Result<()> {
        while let Some(name) = self.stack.last().map(|element| element.name.clone()) {
            self.end_element(&name)?;
        }
        Ok(())
    }

    /// Flushes serialized bytes to the underlying sink.
    pub fn flush(&mut self) -> Result<()> {
        self.xml.get_mut().flush()?;
        Ok(())
    }

    /// Checks that the document is complete, flushes and returns the sink.
    pub fn finish(mut self) -> Result<W> {
        if !self.root_closed {
            let open = self.stack.last().map_or(ROOT_ELEMENT, |element| element.name.as_str());
            return Err(EngineError::new(format!("document finished with <{open}> still open")).into());
        }
        self.flush()?;
        Ok(self.xml.into_inner())
    }

    fn normalize(&self, name: &str, value: impl fmt::Display) -> Option<String> {
        if name == "class" && !self.options.css_classes {
            return None;
        }
        let value = value.to_string();
        if name == "stroke-width" && value == "0" {
            return Some(self.options.default_stroke_width.to_string());
        }
        Some(value)
    }

    fn current_mut(&mut self) -> Result<&mut OpenElement> {
        self.stack
            .last_mut()
            .ok_or_else(|| EngineError::new("attribute without an open element").into())
    }

    fn push_attribute(&mut self, name: &str, value: String) -> Result<()> {
        let current = self.current_mut()?;
        let Some(pending) = current.pending.as_mut() else {
            return Err(attribute_after_content(name, &current.name).into());
        };

        match pending.iter_mut().find(|(existing, _)| existing == name) {
            Some((_, existing)) => existing.clone_from(&value),
            None => pending.push((name.to_string(), value.clone())),
        }
        current.recorded.insert(name.to_string(), value);
        Ok(())
    }

    fn write_pending_start(&mut self) -> Result<()> {
        let Some(current) = self.stack.last_mut() else {
            return Ok(());
        };
        let Some(attributes) = current.pending.take() else {
            return Ok(());
        };
        let name = current.name.clone();
        self.write(Event::Start(start_tag(&name, &attributes)))
    }

    fn write(&mut self, event: Event<'_>) -> Result<()> {
        self.emitted = true;
        self.xml.write_event(event)?;
        Ok(())
    }
}

fn start_tag<'a>(name: &'a str, attributes: &'a [(String, String)]) -> BytesStart<'a> {
    let mut start = BytesStart::new(name);
    for (key, value) in attributes {
        start.push_attribute((key.as_str(), value.as_str()));
    }
    start
}

fn attribute_after_content(name: &str, element: &str) -> EngineError {
    EngineError::new(format!("attribute `{name}` set on <{element}> after its content"))
}
