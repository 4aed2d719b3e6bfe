//! SVG document parsing
//!
//! A single streaming pass over the markup builds the element tree. Style
//! inheritance and transform composition are resolved on the way down, so
//! every [`Element`] leaves the parser with its final style and
//! `resolved_transform`.

mod number;
pub mod path;
pub mod transform;

pub use path::parse_path;
pub use transform::{TransformList, parse_transform, parse_transform_list};

use crate::error::{DocumentError, ParseError, Result, Warning};
use crate::model::document::{Document, Element, ElementKind, Geometry, ViewBox, element_label};
use crate::model::geometry::{Matrix3, Point2, translation};
use crate::model::style::{STYLE_PROPERTIES, Style};
use number::{Cursor, number_list};
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use std::collections::HashMap;
use tracing::{debug, warn};

/// Font size used when a text element does not set one
pub const DEFAULT_FONT_SIZE: f64 = 16.0;

/// Parse SVG markup into a [`Document`]
///
/// Only malformed markup is fatal. Element-level problems (bad path data,
/// unreadable numbers, skipped transforms) are collected in
/// [`Document::diagnostics`].
pub fn parse(markup: &str) -> Result<Document> {
    let mut reader = Reader::from_str(markup);
    reader.config_mut().trim_text(false);

    let mut builder = DocumentBuilder::default();
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::DocType(_)) => {
                // DTD declarations are not allowed (entity expansion)
                return Err(DocumentError::DtdNotAllowed);
            }
            Ok(Event::Start(ref e)) => builder.open(e, false)?,
            Ok(Event::Empty(ref e)) => builder.open(e, true)?,
            Ok(Event::End(_)) => builder.close()?,
            Ok(Event::Text(ref e)) => builder.text(std::str::from_utf8(e)?),
            Ok(Event::CData(ref e)) => builder.text(std::str::from_utf8(e)?),
            Ok(Event::GeneralRef(ref e)) => {
                if let Some(c) = resolve_entity(std::str::from_utf8(e)?) {
                    builder.text(c.encode_utf8(&mut [0; 4]));
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(e.into()),
            _ => {}
        }
        buf.clear();
    }

    builder.finish()
}

/// Open element on the walk stack
enum Frame {
    /// The root `<svg>`
    Root,
    /// A group collecting its children
    Group(Element),
    /// A text element collecting character data
    Text { element: Element, content: String },
    /// A `<tspan>` inside text; its characters go to the enclosing text
    Span,
    /// Unknown element or shape children, ignored with their subtree
    Ignored,
}

impl Frame {
    fn tag(&self) -> &'static str {
        match self {
            Frame::Root => "svg",
            Frame::Group(_) => "g",
            Frame::Text { .. } => "text",
            Frame::Span => "tspan",
            Frame::Ignored => "element",
        }
    }
}

#[derive(Default)]
struct DocumentBuilder {
    stack: Vec<Frame>,
    root: Option<(f64, f64, Option<ViewBox>)>,
    root_style: Style,
    elements: Vec<Element>,
    diagnostics: Vec<Warning>,
    next_index: usize,
    /// Element whose attributes are being read; `None` while on the root
    current: Option<usize>,
    elements_seen: usize,
}

impl DocumentBuilder {
    fn open(&mut self, e: &BytesStart, empty: bool) -> Result<()> {
        let name = e.name();
        let name_str = std::str::from_utf8(name.as_ref())?;
        let local_name = get_local_name(name_str);

        if self.root.is_none() {
            if local_name != "svg" {
                return Err(DocumentError::UnexpectedRoot(local_name.to_string()));
            }
            let attrs = parse_attributes(e)?;
            self.open_root(&attrs);
            if !empty {
                self.stack.push(Frame::Root);
            }
            return Ok(());
        }

        let frame = match self.stack.last() {
            Some(Frame::Root | Frame::Group(_)) => {
                let attrs = parse_attributes(e)?;
                self.open_element(local_name, &attrs, empty)
            }
            Some(Frame::Text { .. } | Frame::Span) if local_name == "tspan" => Frame::Span,
            // Content after the root closed, or inside ignored subtrees
            _ => Frame::Ignored,
        };

        if !empty {
            self.stack.push(frame);
        }
        Ok(())
    }

    fn open_root(&mut self, attrs: &HashMap<String, String>) {
        let label = "svg";
        let view_box = attrs.get("viewBox").and_then(|value| {
            let parsed = ViewBox::parse(value);
            if parsed.is_none() {
                self.warn(label, ParseError::invalid_attribute("viewBox", value));
            }
            parsed
        });
        let width = attrs
            .get("width")
            .and_then(|v| parse_length(v))
            .filter(|w| *w > 0.0)
            .or(view_box.map(|vb| vb.width))
            .unwrap_or(Document::DEFAULT_WIDTH);
        let height = attrs
            .get("height")
            .and_then(|v| parse_length(v))
            .filter(|h| *h > 0.0)
            .or(view_box.map(|vb| vb.height))
            .unwrap_or(Document::DEFAULT_HEIGHT);

        self.root_style = self.element_style(attrs, &Style::default(), label);
        self.root = Some((width, height, view_box));
        debug!(width, height, has_view_box = view_box.is_some(), "read root element");
    }

    /// Build the element for a tag under a group or the root; returns the
    /// frame to push when the tag has content
    fn open_element(
        &mut self,
        local_name: &str,
        attrs: &HashMap<String, String>,
        empty: bool,
    ) -> Frame {
        // Nested viewports are flattened into groups offset by x/y
        let kind = match local_name {
            "svg" => ElementKind::Group,
            tag => match ElementKind::from_tag(tag) {
                Some(kind) => kind,
                None => {
                    debug!(tag, "ignoring unsupported element");
                    return Frame::Ignored;
                }
            },
        };

        let index = self.next_index;
        self.next_index += 1;
        self.current = Some(index);
        let id = attrs.get("id").cloned();
        let label = element_label(kind.tag(), index, id.as_deref());
        if kind != ElementKind::Group {
            self.elements_seen += 1;
        }

        let (parent_style, parent_transform) = self.parent_context();
        let style = self.element_style(attrs, &parent_style, &label);
        let mut local_transform = self.local_transform(attrs, &label);
        if local_name == "svg" {
            let x = self.length(attrs, "x", &label);
            let y = self.length(attrs, "y", &label);
            local_transform = translation(x, y) * local_transform;
        }

        let geometry = match self.geometry(kind, attrs, &label) {
            Ok(geometry) => geometry,
            Err(err) => {
                warn!(element = %label, error = %err, "skipping element");
                self.diagnostics.push(Warning::parse(&label, &err).at(index));
                return Frame::Ignored;
            }
        };

        let element = Element {
            index,
            id,
            geometry,
            style,
            local_transform,
            resolved_transform: parent_transform * local_transform,
            children: Vec::new(),
        };

        match kind {
            ElementKind::Group if !empty => Frame::Group(element),
            ElementKind::Text if !empty => Frame::Text {
                element,
                content: String::new(),
            },
            _ => {
                self.attach(element);
                Frame::Ignored
            }
        }
    }

    fn geometry(
        &mut self,
        kind: ElementKind,
        attrs: &HashMap<String, String>,
        label: &str,
    ) -> std::result::Result<Geometry, ParseError> {
        let geometry = match kind {
            ElementKind::Rect => {
                let width = self.length(attrs, "width", label);
                let height = self.length(attrs, "height", label);
                let (rx, ry) = corner_radii(
                    self.optional_length(attrs, "rx", label),
                    self.optional_length(attrs, "ry", label),
                    width,
                    height,
                );
                Geometry::Rect {
                    x: self.length(attrs, "x", label),
                    y: self.length(attrs, "y", label),
                    width,
                    height,
                    rx,
                    ry,
                }
            }
            ElementKind::Circle => Geometry::Circle {
                cx: self.length(attrs, "cx", label),
                cy: self.length(attrs, "cy", label),
                r: self.length(attrs, "r", label),
            },
            ElementKind::Ellipse => Geometry::Ellipse {
                cx: self.length(attrs, "cx", label),
                cy: self.length(attrs, "cy", label),
                rx: self.length(attrs, "rx", label),
                ry: self.length(attrs, "ry", label),
            },
            ElementKind::Line => Geometry::Line {
                start: Point2::new(
                    self.length(attrs, "x1", label),
                    self.length(attrs, "y1", label),
                ),
                end: Point2::new(
                    self.length(attrs, "x2", label),
                    self.length(attrs, "y2", label),
                ),
            },
            ElementKind::Polyline => Geometry::Polyline(self.points(attrs, label)),
            ElementKind::Polygon => Geometry::Polygon(self.points(attrs, label)),
            ElementKind::Path => {
                let d = attrs.get("d").map(String::as_str).unwrap_or("");
                Geometry::Path(parse_path(d)?)
            }
            ElementKind::Text => Geometry::Text {
                anchor: Point2::new(
                    self.first_coordinate(attrs, "x", label),
                    self.first_coordinate(attrs, "y", label),
                ),
                font_size: self.font_size(attrs, label),
                content: String::new(),
            },
            ElementKind::Group => Geometry::Group,
        };
        Ok(geometry)
    }

    fn close(&mut self) -> Result<()> {
        match self.stack.pop() {
            Some(Frame::Group(element)) => self.attach(element),
            Some(Frame::Text {
                mut element,
                content,
            }) => {
                if let Geometry::Text { content: text, .. } = &mut element.geometry {
                    *text = content.split_whitespace().collect::<Vec<_>>().join(" ");
                }
                self.attach(element);
            }
            Some(Frame::Root | Frame::Span | Frame::Ignored) => {}
            None => {
                return Err(DocumentError::Unbalanced(
                    "Closing tag without a matching opening tag".to_string(),
                ));
            }
        }
        Ok(())
    }

    fn text(&mut self, chars: &str) {
        for frame in self.stack.iter_mut().rev() {
            match frame {
                Frame::Span => continue,
                Frame::Text { content, .. } => {
                    content.push_str(chars);
                    return;
                }
                _ => return,
            }
        }
    }

    fn finish(self) -> Result<Document> {
        let Some((width, height, view_box)) = self.root else {
            return Err(DocumentError::MissingRoot);
        };
        if let Some(frame) = self.stack.last() {
            return Err(DocumentError::unclosed(frame.tag()));
        }
        debug!(
            elements = self.elements_seen,
            warnings = self.diagnostics.len(),
            "parsed document"
        );
        Ok(Document {
            width,
            height,
            view_box,
            elements: self.elements,
            diagnostics: self.diagnostics,
            elements_seen: self.elements_seen,
        })
    }

    /// Add a finished element to its enclosing group, or to the top level
    fn attach(&mut self, element: Element) {
        match self.stack.last_mut() {
            Some(Frame::Group(parent)) => parent.children.push(element),
            _ => self.elements.push(element),
        }
    }

    /// Style and resolved transform of the nearest enclosing group
    fn parent_context(&self) -> (Style, Matrix3) {
        self.stack
            .iter()
            .rev()
            .find_map(|frame| match frame {
                Frame::Group(group) => Some((group.style.clone(), group.resolved_transform)),
                _ => None,
            })
            .unwrap_or_else(|| (self.root_style.clone(), Matrix3::identity()))
    }

    fn element_style(
        &mut self,
        attrs: &HashMap<String, String>,
        parent: &Style,
        label: &str,
    ) -> Style {
        let mut style = Style::default();
        for name in STYLE_PROPERTIES {
            if let Some(value) = attrs.get(name)
                && let Err(err) = style.set_property(name, value)
            {
                self.warn(label, err);
            }
        }
        // Inline declarations win over presentation attributes
        if let Some(declarations) = attrs.get("style") {
            for err in style.apply_declarations(declarations) {
                self.warn(label, err);
            }
        }
        style.inherit_from(parent);
        style
    }

    fn local_transform(&mut self, attrs: &HashMap<String, String>, label: &str) -> Matrix3 {
        let Some(value) = attrs.get("transform") else {
            return Matrix3::identity();
        };
        let list = parse_transform_list(value);
        for err in list.skipped {
            self.warn(label, err);
        }
        list.matrix
    }

    /// Numeric geometry attribute; absent or unreadable values are 0
    fn length(&mut self, attrs: &HashMap<String, String>, name: &str, label: &str) -> f64 {
        self.optional_length(attrs, name, label).unwrap_or(0.0)
    }

    fn optional_length(
        &mut self,
        attrs: &HashMap<String, String>,
        name: &str,
        label: &str,
    ) -> Option<f64> {
        let value = attrs.get(name)?;
        let parsed = parse_length(value);
        if parsed.is_none() {
            self.warn(label, ParseError::invalid_attribute(name, value));
            return Some(0.0);
        }
        parsed
    }

    /// First entry of a coordinate list such as text `x="10 20 30"`
    fn first_coordinate(&mut self, attrs: &HashMap<String, String>, name: &str, label: &str) -> f64 {
        let Some(value) = attrs.get(name) else {
            return 0.0;
        };
        let first = value
            .split(|c: char| c.is_whitespace() || c == ',')
            .find(|part| !part.is_empty())
            .unwrap_or("");
        parse_length(first).unwrap_or_else(|| {
            self.warn(label, ParseError::invalid_attribute(name, value));
            0.0
        })
    }

    fn font_size(&mut self, attrs: &HashMap<String, String>, label: &str) -> f64 {
        let declared = attrs
            .get("style")
            .and_then(|style| declaration(style, "font-size"))
            .or_else(|| attrs.get("font-size").map(String::as_str));
        let Some(value) = declared else {
            return DEFAULT_FONT_SIZE;
        };
        match parse_length(value) {
            Some(size) if size > 0.0 => size,
            _ => {
                self.warn(label, ParseError::invalid_attribute("font-size", value));
                DEFAULT_FONT_SIZE
            }
        }
    }

    fn points(&mut self, attrs: &HashMap<String, String>, label: &str) -> Vec<Point2> {
        let Some(value) = attrs.get("points") else {
            return Vec::new();
        };
        let (mut values, err) = number_list(value);
        if let Some(err) = err {
            self.warn(label, err);
        }
        if values.len() % 2 == 1 {
            self.warn(label, ParseError::invalid_attribute("points", value));
            values.pop();
        }
        values
            .chunks_exact(2)
            .map(|pair| Point2::new(pair[0], pair[1]))
            .collect()
    }

    fn warn(&mut self, label: &str, err: ParseError) {
        warn!(element = label, error = %err, "recoverable parse problem");
        let warning = Warning::parse(label, &err);
        self.diagnostics.push(match self.current {
            Some(index) => warning.at(index),
            None => warning,
        });
    }
}

/// Rounded-corner radii with SVG auto rules: a missing radius copies the
/// other, negative values count as missing, both clamp to half the size
fn corner_radii(rx: Option<f64>, ry: Option<f64>, width: f64, height: f64) -> (f64, f64) {
    let rx = rx.filter(|r| *r >= 0.0);
    let ry = ry.filter(|r| *r >= 0.0);
    let (rx, ry) = match (rx, ry) {
        (Some(rx), Some(ry)) => (rx, ry),
        (Some(r), None) | (None, Some(r)) => (r, r),
        (None, None) => (0.0, 0.0),
    };
    (
        rx.min(width.max(0.0) / 2.0),
        ry.min(height.max(0.0) / 2.0),
    )
}

/// Value of one declaration inside an inline `style` attribute
fn declaration<'a>(style: &'a str, property: &str) -> Option<&'a str> {
    style.split(';').find_map(|decl| {
        let (name, value) = decl.split_once(':')?;
        (name.trim() == property).then(|| value.trim())
    })
}

/// Parse a length in user units; absolute units convert at 96 dpi
///
/// Percentages and font-relative units are not resolved and yield `None`.
pub fn parse_length(value: &str) -> Option<f64> {
    let value = value.trim();
    let mut cursor = Cursor::new(value);
    let number = cursor.number().ok()?;
    let unit = &value[cursor.position()..];
    let per_inch = match unit.trim() {
        "" | "px" => None,
        "pt" => Some(72.0),
        "pc" => Some(6.0),
        "mm" => Some(25.4),
        "cm" => Some(2.54),
        "in" => Some(1.0),
        _ => return None,
    };
    let length = match per_inch {
        Some(per_inch) => number * 96.0 / per_inch,
        None => number,
    };
    length.is_finite().then_some(length)
}

/// Character for a predefined or numeric entity reference
fn resolve_entity(name: &str) -> Option<char> {
    match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        _ => {
            let code = name.strip_prefix('#')?;
            let value = match code.strip_prefix(['x', 'X']) {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => code.parse().ok()?,
            };
            char::from_u32(value)
        }
    }
}

/// Get the local name of an element or attribute (strip namespace prefix)
pub(crate) fn get_local_name(name_str: &str) -> &str {
    if let Some(pos) = name_str.rfind(':') {
        &name_str[pos + 1..]
    } else {
        name_str
    }
}

/// Collect attributes keyed by local name
pub(crate) fn parse_attributes(e: &BytesStart) -> Result<HashMap<String, String>> {
    let mut attrs = HashMap::with_capacity(8);

    for attr in e.attributes() {
        let attr = attr?;
        let key = std::str::from_utf8(attr.key.as_ref())?;
        let value = std::str::from_utf8(&attr.value)?;
        attrs.insert(get_local_name(key).to_string(), value.to_string());
    }

    Ok(attrs)
}
