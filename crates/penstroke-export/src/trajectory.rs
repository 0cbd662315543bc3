//! Trajectory JSON export serializer.
//!
//! The plotter controller reads one JSON document per portrait:
//!
//! ```json
//! {"trjs": [{"points": [{"p": [0.1, 0.2], "width": 1.0}, ...]}, ...]}
//! ```
//!
//! `trjs` lists trajectories in drawing order. Each point carries its
//! canvas-space position `p` and stroke `width`.
//!
//! This is a pure function with no I/O -- it returns a `String`.

use serde::{Deserialize, Serialize};

use penstroke_pipeline::Trajectory;

/// Top-level trajectory document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrajectoryDocument {
    /// Trajectories in drawing order.
    pub trjs: Vec<TrajectoryRecord>,
}

/// One stroke of the document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrajectoryRecord {
    /// Points in drawing order.
    pub points: Vec<PointRecord>,
}

/// One point of a stroke.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointRecord {
    /// `[x, y]` in canvas units.
    pub p: [f64; 2],
    /// Stroke width.
    pub width: f64,
}

impl From<&[Trajectory]> for TrajectoryDocument {
    fn from(trajectories: &[Trajectory]) -> Self {
        Self {
            trjs: trajectories
                .iter()
                .map(|trj| TrajectoryRecord {
                    points: trj
                        .iter()
                        .map(|(p, width)| PointRecord {
                            p: [p.x, p.y],
                            width,
                        })
                        .collect(),
                })
                .collect(),
        }
    }
}

/// Errors from export serializers.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    /// JSON encoding failed.
    #[error("failed to encode JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// A point has a NaN or infinite coordinate.
    #[error("trajectory {trajectory} point {point} is not finite")]
    NonFinite {
        /// Index of the trajectory.
        trajectory: usize,
        /// Index of the point within the trajectory.
        point: usize,
    },
}

/// Serialize trajectories into the plotter JSON document.
///
/// # Errors
///
/// Returns [`ExportError::NonFinite`] for a NaN or infinite coordinate,
/// which JSON cannot represent, and [`ExportError::Json`] if encoding
/// fails.
pub fn to_trajectory_json(trajectories: &[Trajectory]) -> Result<String, ExportError> {
    for (t, trj) in trajectories.iter().enumerate() {
        if let Some(i) = trj.polyline().points().iter().position(|p| !p.is_finite()) {
            return Err(ExportError::NonFinite {
                trajectory: t,
                point: i,
            });
        }
    }
    let document = TrajectoryDocument::from(trajectories);
    Ok(serde_json::to_string(&document)?)
}

/// File name of the trajectory document for a source image.
///
/// The base name is everything before the first `.` of the source
/// file name, so `portrait.v2.png` becomes `portrait.json`.
#[must_use]
pub fn output_file_name(source: &str) -> String {
    let file_name = source.rsplit(['/', '\\']).next().unwrap_or(source);
    let base = file_name.split('.').next().unwrap_or(file_name);
    format!("{base}.json")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use penstroke_pipeline::{Point, Polyline};

    use super::*;

    fn trajectories() -> Vec<Trajectory> {
        vec![
            Trajectory::uniform(
                Polyline::new(vec![Point::new(0.1, 0.2), Point::new(0.3, 0.4)]),
                1.0,
            ),
            Trajectory::uniform(
                Polyline::new(vec![Point::new(0.0, 0.0), Point::new(0.4, 0.0)]),
                1.0,
            ),
        ]
    }

    #[test]
    fn document_has_the_expected_shape() {
        let json = to_trajectory_json(&trajectories()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        let trjs = value["trjs"].as_array().unwrap();
        assert_eq!(trjs.len(), 2);
        let first = &trjs[0]["points"][0];
        assert_eq!(first["p"], serde_json::json!([0.1, 0.2]));
        assert_eq!(first["width"], serde_json::json!(1.0));
        assert_eq!(value.as_object().unwrap().len(), 1);
    }

    #[test]
    fn empty_list_is_an_empty_document() {
        assert_eq!(to_trajectory_json(&[]).unwrap(), r#"{"trjs":[]}"#);
    }

    #[test]
    fn non_finite_coordinates_fail() {
        let trj = Trajectory::uniform(
            Polyline::new(vec![Point::new(0.0, 0.0), Point::new(f64::NAN, 0.0)]),
            1.0,
        );
        let err = to_trajectory_json(&[trj]).unwrap_err();
        assert!(matches!(
            err,
            ExportError::NonFinite {
                trajectory: 0,
                point: 1
            }
        ));
    }

    #[test]
    fn document_parses_back() {
        let json = to_trajectory_json(&trajectories()).unwrap();
        let document: TrajectoryDocument = serde_json::from_str(&json).unwrap();
        assert_eq!(document, TrajectoryDocument::from(trajectories().as_slice()));
    }

    #[test]
    fn output_name_uses_text_before_first_dot() {
        assert_eq!(output_file_name("face.png"), "face.json");
        assert_eq!(output_file_name("portrait.v2.jpeg"), "portrait.json");
        assert_eq!(output_file_name("/home/me/photos/ana.jpg"), "ana.json");
        assert_eq!(output_file_name("noext"), "noext.json");
    }
}
