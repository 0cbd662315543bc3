//! penstroke-pipeline: Pure vector path synthesis (sans-IO).
//!
//! Turns the raw strokes extracted from a portrait photograph into
//! plotter trajectories:
//! landmark paths -> spline fitting,
//! edge contours -> nested-contour pruning,
//! then concatenation with texture strokes and the canvas border, and
//! mapping into canvas space.
//!
//! This crate has **no I/O dependencies** -- it operates on in-memory
//! data and returns structured results. Reading scenes and writing
//! trajectory files lives in the `penstroke` binary; serialization lives
//! in `penstroke-export`.

pub mod diagnostics;
pub mod edge;
pub mod hierarchy;
pub mod landmarks;
pub mod mapping;
pub mod session;
pub mod spline;
pub mod synthesis;
pub mod types;

pub use edge::{CannyConfig, CannyContourSource, ContourSource};
pub use hierarchy::{ContourForest, EdgeContours, HierarchyNode, prune_nested};
pub use landmarks::{FaceFeature, FaceMesh, LandmarkPath, LandmarkSource};
pub use mapping::CanvasMapping;
pub use session::Session;
pub use spline::fit_cubic_spline;
pub use synthesis::{RawScene, synthesize};
pub use types::{
    Dimensions, Point, Polyline, STROKE_WIDTH, SynthesisConfig, SynthesisError, Trajectory,
};

/// Build a [`RawScene`] for one image from its collaborators.
///
/// A non-square image is first centred on a white square whose side is
/// its longer dimension, and both collaborators see the padded image.
/// Landmarks come from `landmarks`, edge contours from `contours`;
/// texture strokes are supplied as already extracted and must already
/// be in padded coordinates.
///
/// # Errors
///
/// Returns whatever the contour source reports.
pub fn extract_scene<L, C>(
    image: &image::GrayImage,
    landmarks: &L,
    contours: &C,
    texture_strokes: Vec<Polyline>,
) -> Result<RawScene, SynthesisError>
where
    L: LandmarkSource + ?Sized,
    C: ContourSource + ?Sized,
{
    let square = pad_to_square(image);
    let square = square.as_ref().unwrap_or(image);

    Ok(RawScene {
        image_width: square.width(),
        landmarks: landmarks.landmarks(square),
        texture_strokes,
        edges: contours.extract(square)?,
    })
}

/// Centre `image` on a white square of side `max(width, height)`.
///
/// Returns `None` if `image` is already square.
#[must_use = "returns the padded image"]
pub fn pad_to_square(image: &image::GrayImage) -> Option<image::GrayImage> {
    let (w, h) = image.dimensions();
    if w == h {
        return None;
    }
    let side = w.max(h);
    let mut square = image::GrayImage::from_pixel(side, side, image::Luma([255]));
    image::imageops::overlay(
        &mut square,
        image,
        i64::from((side - w) / 2),
        i64::from((side - h) / 2),
    );
    Some(square)
}
