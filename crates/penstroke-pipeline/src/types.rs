//! Shared types for the penstroke path synthesis pipeline.

use std::ops::{Add, Div, Mul, Sub};

use serde::{Deserialize, Serialize};

/// Re-export `GrayImage` so downstream crates can hand rasters to the
/// edge source without depending on `image` directly.
pub use image::GrayImage;

/// A 2D point.
///
/// Pixel space before coordinate mapping, canvas units after.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// Horizontal position.
    pub x: f64,
    /// Vertical position.
    pub y: f64,
}

impl Point {
    /// Create a new point.
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Squared Euclidean distance to another point.
    #[must_use]
    pub fn distance_squared(self, other: Self) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx.mul_add(dx, dy * dy)
    }

    /// Euclidean distance to another point.
    #[must_use]
    pub fn distance(self, other: Self) -> f64 {
        self.distance_squared(other).sqrt()
    }

    /// Returns `true` if both coordinates are finite.
    #[must_use]
    pub const fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl Add for Point {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Point {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f64> for Point {
    type Output = Self;

    fn mul(self, rhs: f64) -> Self {
        Self::new(self.x * rhs, self.y * rhs)
    }
}

impl Div<f64> for Point {
    type Output = Self;

    fn div(self, rhs: f64) -> Self {
        Self::new(self.x / rhs, self.y / rhs)
    }
}

/// An ordered sequence of points forming one stroke.
///
/// Point order is the drawing order. A polyline may be implicitly
/// closed (first point equal to last) depending on where it came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Polyline(Vec<Point>);

impl Polyline {
    /// Create a new polyline from a vector of points.
    #[must_use]
    pub const fn new(points: Vec<Point>) -> Self {
        Self(points)
    }

    /// Returns `true` if the polyline has no points.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the number of points in the polyline.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns the first point, if any.
    #[must_use]
    pub fn first(&self) -> Option<&Point> {
        self.0.first()
    }

    /// Returns the last point, if any.
    #[must_use]
    pub fn last(&self) -> Option<&Point> {
        self.0.last()
    }

    /// Returns a slice of all points.
    #[must_use]
    pub fn points(&self) -> &[Point] {
        &self.0
    }

    /// Total length of the open polyline.
    #[must_use]
    pub fn length(&self) -> f64 {
        self.0.windows(2).map(|w| w[0].distance(w[1])).sum()
    }

    /// Perimeter of the polyline treated as a closed curve: the open
    /// length plus the segment from the last point back to the first.
    ///
    /// This is the arc length used for edge-contour pruning.
    #[must_use]
    pub fn closed_length(&self) -> f64 {
        match (self.0.first(), self.0.last()) {
            (Some(&first), Some(&last)) => self.length() + last.distance(first),
            _ => 0.0,
        }
    }
}

/// Image dimensions in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

/// Stroke width attached to every exported point.
pub const STROKE_WIDTH: f64 = 1.0;

/// Final export unit: a canvas-space polyline with a stroke width per
/// point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trajectory {
    polyline: Polyline,
    widths: Vec<f64>,
}

impl Trajectory {
    /// Attach the same stroke width to every point of `polyline`.
    #[must_use]
    pub fn uniform(polyline: Polyline, width: f64) -> Self {
        let widths = vec![width; polyline.len()];
        Self { polyline, widths }
    }

    /// The canvas-space points of this trajectory.
    #[must_use]
    pub const fn polyline(&self) -> &Polyline {
        &self.polyline
    }

    /// Stroke width per point, parallel to [`polyline`](Self::polyline).
    #[must_use]
    pub fn widths(&self) -> &[f64] {
        &self.widths
    }

    /// Iterate `(point, width)` pairs in drawing order.
    pub fn iter(&self) -> impl Iterator<Item = (Point, f64)> + '_ {
        self.polyline
            .points()
            .iter()
            .copied()
            .zip(self.widths.iter().copied())
    }
}

/// Parameters for one synthesis run.
///
/// These are the values the analyst adjusts between runs; the raw
/// landmark and edge data they are applied to stay cached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SynthesisConfig {
    /// Minimum closed arc length, in pixels, for an edge contour to be
    /// emitted.
    pub length_threshold: f64,

    /// Points sampled on each cubic segment of a fitted landmark path.
    ///
    /// Must be at least 1.
    pub samples_per_segment: usize,

    /// Edge length of the square plotter canvas, in millimetres.
    pub canvas_size: f64,
}

impl SynthesisConfig {
    /// Default edge-contour length threshold in pixels.
    pub const DEFAULT_LENGTH_THRESHOLD: f64 = 50.0;
    /// Default samples per fitted spline segment.
    pub const DEFAULT_SAMPLES_PER_SEGMENT: usize = 10;
    /// Default canvas edge length in millimetres.
    pub const DEFAULT_CANVAS_SIZE: f64 = 400.0;

    /// Check the values that would otherwise produce meaningless output.
    ///
    /// `samples_per_segment` is checked by the spline fitter itself.
    ///
    /// # Errors
    ///
    /// Returns [`SynthesisError::InvalidConfig`] if `canvas_size` is not a
    /// positive finite number or `length_threshold` is negative or NaN.
    pub fn validate(&self) -> Result<(), SynthesisError> {
        if !(self.canvas_size.is_finite() && self.canvas_size > 0.0) {
            return Err(SynthesisError::InvalidConfig(format!(
                "canvas_size must be positive and finite, got {}",
                self.canvas_size
            )));
        }
        if self.length_threshold.is_nan() || self.length_threshold < 0.0 {
            return Err(SynthesisError::InvalidConfig(format!(
                "length_threshold must be non-negative, got {}",
                self.length_threshold
            )));
        }
        Ok(())
    }
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        Self {
            length_threshold: Self::DEFAULT_LENGTH_THRESHOLD,
            samples_per_segment: Self::DEFAULT_SAMPLES_PER_SEGMENT,
            canvas_size: Self::DEFAULT_CANVAS_SIZE,
        }
    }
}

/// Errors that can occur during path synthesis.
///
/// All of these are detected before any output is produced; a failed
/// run never yields partial trajectories.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SynthesisError {
    /// A path or sample density the spline fitter cannot work with.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A contour hierarchy reference points outside the contour set.
    #[error("malformed contour forest: {0}")]
    MalformedForest(String),

    /// The spline system had a zero pivot.
    #[error("spline system is singular at row {row}")]
    SingularSystem {
        /// Row of the elimination where the pivot vanished.
        row: usize,
    },

    /// Synthesis configuration is invalid.
    #[error("invalid synthesis configuration: {0}")]
    InvalidConfig(String),
}
