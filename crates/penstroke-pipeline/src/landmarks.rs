//! Facial landmark paths.
//!
//! Landmark detection itself happens upstream. This module defines the
//! seam ([`LandmarkSource`]) and converts a dense face mesh, as reported
//! by a mesh tracker in normalized coordinates, into one raw pixel-space
//! polyline per named feature. The polylines are fitted with splines
//! later, during synthesis.

use serde::{Deserialize, Serialize};

use crate::types::{Dimensions, GrayImage, Point, Polyline, SynthesisError};

/// A named facial feature drawn as one stroke.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FaceFeature {
    /// Short vertical line down the bridge of the nose.
    NoseBridge,
    /// Nostrils and the underside of the nose.
    Nose,
    /// Jaw and forehead outline.
    FaceOval,
    /// Left eye outline (closed).
    LeftEye,
    /// Right eye outline (closed).
    RightEye,
    /// Inner lip outline (closed).
    InnerLip,
    /// Outer lip outline (closed).
    OuterLip,
    /// Lower edge of the left eyebrow.
    LeftEyebrow,
    /// Lower edge of the right eyebrow.
    RightEyebrow,
}

impl FaceFeature {
    /// Every feature, in stroke order.
    pub const ALL: [Self; 9] = [
        Self::NoseBridge,
        Self::Nose,
        Self::FaceOval,
        Self::LeftEye,
        Self::RightEye,
        Self::InnerLip,
        Self::OuterLip,
        Self::LeftEyebrow,
        Self::RightEyebrow,
    ];

    /// Face-mesh landmark indices tracing this feature, in drawing order.
    #[must_use]
    pub const fn mesh_indices(self) -> &'static [usize] {
        match self {
            Self::NoseBridge => &[19, 1, 4],
            Self::Nose => &[
                122, 174, 198, 49, 64, 59, 60, 20, 242, 94, 462, 250, 290, 289, 294, 279, 420, 399,
                351,
            ],
            Self::FaceOval => &[
                389, 356, 454, 323, 361, 288, 397, 365, 379, 378, 400, 377, 152, 148, 176, 149,
                150, 136, 172, 58, 132, 93, 234, 127,
            ],
            Self::LeftEye => &[
                33, 246, 161, 160, 159, 158, 157, 173, 133, 155, 154, 153, 145, 144, 163, 7, 33,
            ],
            Self::RightEye => &[
                263, 466, 388, 387, 386, 385, 384, 398, 362, 382, 381, 380, 374, 373, 390, 249,
                263,
            ],
            Self::InnerLip => &[
                78, 191, 80, 81, 82, 13, 312, 311, 310, 415, 308, 324, 318, 402, 317, 14, 87, 178,
                88, 95, 78,
            ],
            Self::OuterLip => &[
                61, 185, 40, 39, 37, 0, 267, 269, 270, 409, 291, 375, 321, 405, 314, 17, 84, 181,
                91, 146, 61,
            ],
            Self::LeftEyebrow => &[55, 65, 52, 53, 46],
            Self::RightEyebrow => &[285, 295, 282, 283, 276],
        }
    }
}

/// Raw pixel-space polyline of one facial feature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LandmarkPath {
    /// Which feature this path outlines.
    pub feature: FaceFeature,
    /// Landmark positions in drawing order.
    pub polyline: Polyline,
}

/// Supplies the landmark paths of one loaded image.
pub trait LandmarkSource {
    /// Detect landmarks in `image`. Returns no paths if no face is found.
    fn landmarks(&self, image: &GrayImage) -> Vec<LandmarkPath>;
}

/// A face mesh in normalized image coordinates (`0.0..=1.0` per axis).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FaceMesh {
    /// Mesh vertices by landmark index.
    pub points: Vec<Point>,
    /// Whether the mesh was computed on a horizontally mirrored frame.
    #[serde(default)]
    pub mirrored: bool,
}

impl FaceMesh {
    /// Pixel position of landmark `index` in an image of `dimensions`.
    ///
    /// Coordinates are floored to whole pixels and clamped to the last
    /// row/column; mirrored meshes are flipped back with `x' = width - x`.
    fn pixel(&self, index: usize, dimensions: Dimensions) -> Option<Point> {
        let p = self.points.get(index)?;
        let w = f64::from(dimensions.width);
        let h = f64::from(dimensions.height);
        let x = (p.x * w).floor().min(w - 1.0);
        let y = (p.y * h).floor().min(h - 1.0);
        let x = if self.mirrored { w - x } else { x };
        Some(Point::new(x, y))
    }

    /// One raw polyline per [`FaceFeature`], in [`FaceFeature::ALL`] order.
    ///
    /// # Errors
    ///
    /// Returns [`SynthesisError::InvalidInput`] if the mesh is missing a
    /// landmark one of the features needs.
    pub fn feature_paths(
        &self,
        dimensions: Dimensions,
    ) -> Result<Vec<LandmarkPath>, SynthesisError> {
        FaceFeature::ALL
            .iter()
            .map(|&feature| {
                let points = feature
                    .mesh_indices()
                    .iter()
                    .map(|&i| {
                        self.pixel(i, dimensions).ok_or_else(|| {
                            SynthesisError::InvalidInput(format!(
                                "face mesh has {} landmarks, {feature:?} needs index {i}",
                                self.points.len()
                            ))
                        })
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(LandmarkPath {
                    feature,
                    polyline: Polyline::new(points),
                })
            })
            .collect()
    }
}

impl LandmarkSource for FaceMesh {
    /// Feature paths of this mesh scaled to `image`.
    ///
    /// A mesh too short for the feature tables yields no paths, the same
    /// as an image with no face in it.
    fn landmarks(&self, image: &GrayImage) -> Vec<LandmarkPath> {
        let dimensions = Dimensions {
            width: image.width(),
            height: image.height(),
        };
        self.feature_paths(dimensions).unwrap_or_else(|e| {
            log::warn!("ignoring face mesh: {e}");
            Vec::new()
        })
    }
}
