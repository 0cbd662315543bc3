//! Edge contour extraction.
//!
//! [`ContourSource`] is the seam through which synthesis receives raw
//! edge contours with their enclosure forest. [`CannyContourSource`]
//! implements it over an in-memory grayscale image: Canny edge
//! detection via [`imageproc::edges::canny`], then Suzuki-Abe border
//! following via [`imageproc::contours::find_contours`], whose parent
//! links become the [`ContourForest`].

use image::GrayImage;
use serde::{Deserialize, Serialize};

use crate::hierarchy::{ContourForest, EdgeContours};
use crate::types::{Point, Polyline, SynthesisError};

/// Minimum allowed Canny threshold.
///
/// A zero low threshold turns every pixel with any gradient into a
/// candidate edge.
pub const MIN_THRESHOLD: f32 = 1.0;
const _: () = assert!(MIN_THRESHOLD > 0.0);

/// Supplies the raw edge contours of one loaded image.
pub trait ContourSource {
    /// Extract contours and their enclosure forest from `image`.
    ///
    /// # Errors
    ///
    /// Returns [`SynthesisError::MalformedForest`] if the extractor's
    /// hierarchy is inconsistent.
    fn extract(&self, image: &GrayImage) -> Result<EdgeContours, SynthesisError>;
}

/// Canny hysteresis thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CannyConfig {
    /// Gradient magnitude below which a pixel is never an edge.
    pub low: f32,
    /// Gradient magnitude above which a pixel is always an edge.
    pub high: f32,
}

impl CannyConfig {
    /// Default low threshold.
    pub const DEFAULT_LOW: f32 = 130.0;
    /// Default high threshold.
    pub const DEFAULT_HIGH: f32 = 250.0;

    /// Thresholds clamped to at least [`MIN_THRESHOLD`] with
    /// `low <= high`.
    #[must_use]
    pub fn clamped(self) -> (f32, f32) {
        let high = self.high.max(MIN_THRESHOLD);
        let low = self.low.max(MIN_THRESHOLD).min(high);
        (low, high)
    }
}

impl Default for CannyConfig {
    fn default() -> Self {
        Self {
            low: Self::DEFAULT_LOW,
            high: Self::DEFAULT_HIGH,
        }
    }
}

/// Canny edges traced into nested contours.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CannyContourSource {
    /// Edge detection thresholds.
    pub canny: CannyConfig,
}

impl CannyContourSource {
    /// Detect edges in `image`.
    ///
    /// Returns a binary image: 255 for edge pixels, 0 for background.
    #[must_use = "returns the binary edge map"]
    pub fn edges(&self, image: &GrayImage) -> GrayImage {
        let (low, high) = self.canny.clamped();
        imageproc::edges::canny(image, low, high)
    }
}

impl ContourSource for CannyContourSource {
    fn extract(&self, image: &GrayImage) -> Result<EdgeContours, SynthesisError> {
        let edges = self.edges(image);
        trace_contours(&edges)
    }
}

/// Trace the borders of a binary edge map into contours plus forest.
///
/// Contours keep their detection order, including those with a single
/// point; pruning and synthesis decide what to emit.
///
/// # Errors
///
/// Returns [`SynthesisError::MalformedForest`] if the tracer reports an
/// out-of-range parent.
pub fn trace_contours(edges: &GrayImage) -> Result<EdgeContours, SynthesisError> {
    let traced: Vec<imageproc::contours::Contour<u32>> = imageproc::contours::find_contours(edges);

    let parents: Vec<Option<usize>> = traced.iter().map(|c| c.parent).collect();
    let forest = ContourForest::from_parents(&parents)?;

    let contours = traced
        .into_iter()
        .map(|c| {
            Polyline::new(
                c.points
                    .into_iter()
                    .map(|p| Point::new(f64::from(p.x), f64::from(p.y)))
                    .collect(),
            )
        })
        .collect();

    Ok(EdgeContours::new(contours, forest))
}
