//! Conversion settings

use crate::error::ConfigError;
use crate::tessellate::FlattenOptions;
use serde::{Deserialize, Serialize};

/// Configuration for converting SVG documents
///
/// Built with `with_*` methods on top of [`ConvertConfig::new`], or
/// deserialized by a host; missing fields take their defaults.
///
/// # Example
///
/// ```
/// use svg3d::ConvertConfig;
///
/// let config = ConvertConfig::new()
///     .with_fit_size(4.0)
///     .with_extrude_depth(0.2)
///     .with_default_fill("#000000");
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConvertConfig {
    /// World units per user unit
    pub scale: f64,
    /// When set, overrides `scale` so the larger document side spans this
    /// many world units
    pub fit_size: Option<f64>,
    /// Extrusion depth in world units
    pub extrude_depth: f64,
    /// Curve flattening tolerance in user units
    pub tolerance: f64,
    /// Fewest segments per curve
    pub min_segments: usize,
    /// Most segments per curve
    pub max_segments: usize,
    /// Paint used when no fill is set anywhere in an element's ancestry
    pub default_fill: Option<String>,
    /// Tessellate elements on a worker pool (needs the `parallel` feature)
    pub parallel: bool,
}

impl Default for ConvertConfig {
    fn default() -> Self {
        let flatten = FlattenOptions::default();
        Self {
            scale: 0.01,
            fit_size: None,
            extrude_depth: 0.1,
            tolerance: flatten.tolerance,
            min_segments: flatten.min_segments,
            max_segments: flatten.max_segments,
            default_fill: None,
            parallel: false,
        }
    }
}

impl ConvertConfig {
    /// Create a configuration with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the world scale factor
    pub fn with_scale(mut self, scale: f64) -> Self {
        self.scale = scale;
        self
    }

    /// Fit the document's larger side to `size` world units
    pub fn with_fit_size(mut self, size: f64) -> Self {
        self.fit_size = Some(size);
        self
    }

    /// Set the extrusion depth
    pub fn with_extrude_depth(mut self, depth: f64) -> Self {
        self.extrude_depth = depth;
        self
    }

    /// Set the flattening tolerance
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Set the per-curve segment bounds
    pub fn with_segment_bounds(mut self, min: usize, max: usize) -> Self {
        self.min_segments = min;
        self.max_segments = max;
        self
    }

    /// Paint unfilled elements with `paint` (SVG renders them black)
    pub fn with_default_fill(mut self, paint: impl Into<String>) -> Self {
        self.default_fill = Some(paint.into());
        self
    }

    /// Enable or disable parallel tessellation
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Check that every setting is usable
    pub fn validate(&self) -> Result<(), ConfigError> {
        positive("scale", self.scale)?;
        if let Some(size) = self.fit_size {
            positive("fit_size", size)?;
        }
        positive("extrude_depth", self.extrude_depth)?;
        positive("tolerance", self.tolerance)?;
        if self.min_segments == 0 {
            return Err(ConfigError::ZeroSegments);
        }
        if self.min_segments > self.max_segments {
            return Err(ConfigError::InvertedSegmentBounds {
                min: self.min_segments,
                max: self.max_segments,
            });
        }
        Ok(())
    }

    /// Flattening parameters for the tessellator
    pub fn flatten_options(&self) -> FlattenOptions {
        FlattenOptions {
            tolerance: self.tolerance,
            min_segments: self.min_segments,
            max_segments: self.max_segments,
        }
    }

    /// World scale for a document of the given size
    pub fn world_scale(&self, width: f64, height: f64) -> f64 {
        match self.fit_size {
            Some(size) => size / width.max(height),
            None => self.scale,
        }
    }
}

fn positive(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::NonPositive { field, value })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ConvertConfig::new();
        assert_eq!(config.scale, 0.01);
        assert_eq!(config.extrude_depth, 0.1);
        assert_eq!(config.flatten_options(), FlattenOptions::default());
        assert!(!config.parallel);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder_chain() {
        let config = ConvertConfig::new()
            .with_scale(0.5)
            .with_tolerance(0.1)
            .with_segment_bounds(2, 8)
            .with_parallel(true);
        assert_eq!(config.scale, 0.5);
        assert_eq!(config.flatten_options().max_segments, 8);
        assert!(config.parallel);
    }

    #[test]
    fn test_fit_size_overrides_scale() {
        let config = ConvertConfig::new().with_fit_size(2.0);
        assert_eq!(config.world_scale(800.0, 400.0), 0.0025);
        assert_eq!(ConvertConfig::new().world_scale(800.0, 400.0), 0.01);
    }

    #[test]
    fn test_validate_rejects_bad_settings() {
        assert!(matches!(
            ConvertConfig::new().with_scale(0.0).validate(),
            Err(ConfigError::NonPositive { field: "scale", .. })
        ));
        assert!(matches!(
            ConvertConfig::new().with_extrude_depth(f64::NAN).validate(),
            Err(ConfigError::NonPositive { .. })
        ));
        assert!(matches!(
            ConvertConfig::new().with_segment_bounds(9, 3).validate(),
            Err(ConfigError::InvertedSegmentBounds { min: 9, max: 3 })
        ));
        assert_eq!(
            ConvertConfig::new().with_segment_bounds(0, 3).validate(),
            Err(ConfigError::ZeroSegments)
        );
    }

    #[test]
    fn test_deserialize_partial_json() {
        let config: ConvertConfig =
            serde_json::from_str(r#"{ "extrude_depth": 0.5, "parallel": true }"#).unwrap();
        assert_eq!(config.extrude_depth, 0.5);
        assert!(config.parallel);
        assert_eq!(config.scale, 0.01);
    }
}
