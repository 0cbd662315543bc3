//! Mapping between raster pixel space and plotter canvas space.
//!
//! The source image is square, `image_width` pixels on a side, with y
//! pointing down. The canvas is `canvas_size` millimetres on a side with
//! y pointing up, and the export format expresses it in units of 1000
//! millimetres. A pixel coordinate `v` therefore becomes
//! `v / (1000 * c)` with `c = image_width / canvas_size`, and y is
//! flipped against the canvas height in those units.
//!
//! The mapping must be applied exactly once per path. Mapped
//! coordinates fall in `[0, canvas_size / 1000]`; applying it twice
//! shrinks them far below that.

use serde::{Deserialize, Serialize};

use crate::types::{Point, Polyline, SynthesisError};

/// Export unit normalization: canvas millimetres per export unit.
pub const UNITS_PER_CANVAS: f64 = 1000.0;

/// Scale-and-flip transform from pixel space to canvas space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CanvasMapping {
    image_width: f64,
    canvas_size: f64,
}

impl CanvasMapping {
    /// Mapping for a square source image `image_width` pixels wide onto
    /// a canvas `canvas_size` millimetres wide.
    ///
    /// # Errors
    ///
    /// Returns [`SynthesisError::InvalidConfig`] unless both values are
    /// positive and finite.
    pub fn new(image_width: f64, canvas_size: f64) -> Result<Self, SynthesisError> {
        for (name, value) in [("image_width", image_width), ("canvas_size", canvas_size)] {
            if !(value.is_finite() && value > 0.0) {
                return Err(SynthesisError::InvalidConfig(format!(
                    "{name} must be positive and finite, got {value}"
                )));
            }
        }
        Ok(Self {
            image_width,
            canvas_size,
        })
    }

    /// Pixels per canvas millimetre.
    #[must_use]
    pub fn compression(&self) -> f64 {
        self.image_width / self.canvas_size
    }

    /// Canvas edge length in export units.
    #[must_use]
    pub fn canvas_extent(&self) -> f64 {
        self.canvas_size / UNITS_PER_CANVAS
    }

    fn scale(&self) -> f64 {
        UNITS_PER_CANVAS * self.compression()
    }

    /// Map one pixel-space point onto the canvas.
    #[must_use]
    pub fn to_canvas(&self, p: Point) -> Point {
        let scale = self.scale();
        Point::new(p.x / scale, self.canvas_extent() - p.y / scale)
    }

    /// Map one canvas point back to pixel space.
    #[must_use]
    pub fn to_pixel(&self, p: Point) -> Point {
        let scale = self.scale();
        Point::new(p.x * scale, (self.canvas_extent() - p.y) * scale)
    }

    /// Map every point of a pixel-space polyline onto the canvas.
    #[must_use]
    pub fn map_polyline(&self, polyline: &Polyline) -> Polyline {
        Polyline::new(
            polyline
                .points()
                .iter()
                .map(|&p| self.to_canvas(p))
                .collect(),
        )
    }

    /// Closed pixel-space rectangle around the whole source image.
    ///
    /// Mapped onto the canvas it becomes the canvas bounds.
    #[must_use]
    pub fn border(&self) -> Polyline {
        let w = self.image_width;
        Polyline::new(vec![
            Point::new(0.0, 0.0),
            Point::new(w, 0.0),
            Point::new(w, w),
            Point::new(0.0, w),
            Point::new(0.0, 0.0),
        ])
    }
}
