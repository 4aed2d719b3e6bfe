//! Presentation style of an element

use super::geometry::Rgba;
use super::scene::MaterialRole;
use crate::error::{MaterialWarning, ParseError};
use crate::material::{Paint, parse_paint};
use serde::Serialize;

/// Style as written in the markup, after inheritance from ancestor groups
///
/// Every field is optional; `None` means neither the element nor any
/// ancestor set it.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Style {
    /// Raw `fill` token
    pub fill: Option<String>,
    /// Raw `stroke` token
    pub stroke: Option<String>,
    /// `stroke-width` in user units
    pub stroke_width: Option<f64>,
    /// `opacity`
    pub opacity: Option<f64>,
    /// `fill-opacity`
    pub fill_opacity: Option<f64>,
    /// `stroke-opacity`
    pub stroke_opacity: Option<f64>,
}

/// Style property names read from attributes and `style=""` declarations
pub const STYLE_PROPERTIES: [&str; 6] = [
    "fill",
    "stroke",
    "stroke-width",
    "opacity",
    "fill-opacity",
    "stroke-opacity",
];

impl Style {
    /// Set one property from its textual value
    ///
    /// Unknown property names are ignored. Numeric properties that fail to
    /// parse leave the property unset and return an error.
    pub fn set_property(&mut self, name: &str, value: &str) -> Result<(), ParseError> {
        let value = value.trim();
        if value == "inherit" {
            self.clear_property(name);
            return Ok(());
        }
        match name {
            "fill" => self.fill = Some(value.to_string()),
            "stroke" => self.stroke = Some(value.to_string()),
            "stroke-width" => self.stroke_width = Some(parse_stroke_width(value)?),
            "opacity" => self.opacity = Some(parse_opacity(name, value)?),
            "fill-opacity" => self.fill_opacity = Some(parse_opacity(name, value)?),
            "stroke-opacity" => self.stroke_opacity = Some(parse_opacity(name, value)?),
            _ => {}
        }
        Ok(())
    }

    fn clear_property(&mut self, name: &str) {
        match name {
            "fill" => self.fill = None,
            "stroke" => self.stroke = None,
            "stroke-width" => self.stroke_width = None,
            "opacity" => self.opacity = None,
            "fill-opacity" => self.fill_opacity = None,
            "stroke-opacity" => self.stroke_opacity = None,
            _ => {}
        }
    }

    /// Apply an inline `style` attribute (`fill:#f00; stroke-width:2`)
    ///
    /// Returns the errors of declarations that could not be applied.
    pub fn apply_declarations(&mut self, declarations: &str) -> Vec<ParseError> {
        let mut errors = Vec::new();
        for declaration in declarations.split(';') {
            let Some((name, value)) = declaration.split_once(':') else {
                continue;
            };
            if let Err(err) = self.set_property(name.trim(), value) {
                errors.push(err);
            }
        }
        errors
    }

    /// Fill every unset property from the parent style
    pub fn inherit_from(&mut self, parent: &Style) {
        if self.fill.is_none() {
            self.fill.clone_from(&parent.fill);
        }
        if self.stroke.is_none() {
            self.stroke.clone_from(&parent.stroke);
        }
        self.stroke_width = self.stroke_width.or(parent.stroke_width);
        self.opacity = self.opacity.or(parent.opacity);
        self.fill_opacity = self.fill_opacity.or(parent.fill_opacity);
        self.stroke_opacity = self.stroke_opacity.or(parent.stroke_opacity);
    }

    /// Resolve paint tokens into concrete colors
    ///
    /// `default_fill` stands in for a fill that is absent everywhere in the
    /// ancestry. Unreadable colors become [`Rgba::DEFAULT_GRAY`] and are
    /// reported through the returned warnings.
    pub fn resolve(&self, default_fill: Option<&str>) -> (ResolvedStyle, Vec<MaterialWarning>) {
        let mut warnings = Vec::new();
        let opacity = self.opacity.unwrap_or(1.0);

        let fill_token = self.fill.as_deref().or(default_fill);
        let fill = resolve_role(
            fill_token,
            MaterialRole::Fill,
            opacity * self.fill_opacity.unwrap_or(1.0),
            &mut warnings,
        );

        let stroke_width = self.stroke_width.unwrap_or(1.0);
        let stroke = resolve_role(
            self.stroke.as_deref(),
            MaterialRole::Stroke,
            opacity * self.stroke_opacity.unwrap_or(1.0),
            &mut warnings,
        )
        // A zero-width stroke paints nothing
        .filter(|_| stroke_width > 0.0);

        (
            ResolvedStyle {
                fill,
                stroke,
                stroke_width,
            },
            warnings,
        )
    }
}

fn resolve_role(
    token: Option<&str>,
    role: MaterialRole,
    opacity: f64,
    warnings: &mut Vec<MaterialWarning>,
) -> Option<Rgba> {
    let color = match parse_paint(token?, role) {
        Ok(Paint::None) => return None,
        Ok(Paint::Color(color)) => color,
        Err(warning) => {
            warnings.push(warning);
            Rgba::DEFAULT_GRAY
        }
    };
    Some(color.with_alpha(opacity))
}

fn parse_stroke_width(value: &str) -> Result<f64, ParseError> {
    let number = value.strip_suffix("px").unwrap_or(value).trim();
    match number.parse::<f64>() {
        Ok(width) if width.is_finite() => Ok(width),
        _ => Err(ParseError::invalid_attribute("stroke-width", value)),
    }
}

fn parse_opacity(name: &str, value: &str) -> Result<f64, ParseError> {
    let parsed = match value.strip_suffix('%') {
        Some(percent) => percent.trim().parse::<f64>().map(|p| p / 100.0),
        None => value.parse::<f64>(),
    };
    match parsed {
        Ok(opacity) if opacity.is_finite() => Ok(opacity.clamp(0.0, 1.0)),
        _ => Err(ParseError::invalid_attribute(name, value)),
    }
}

/// Concrete paint of an element
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ResolvedStyle {
    /// Fill color with final opacity in alpha, `None` when not filled
    pub fill: Option<Rgba>,
    /// Stroke color with final opacity in alpha, `None` when not stroked
    pub stroke: Option<Rgba>,
    /// Stroke width in user units
    pub stroke_width: f64,
}
