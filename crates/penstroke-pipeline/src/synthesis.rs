//! Path synthesis: raw scene data in, canvas trajectories out.
//!
//! A [`RawScene`] holds everything extracted once per loaded image.
//! [`synthesize`] derives the trajectory list from it for one
//! [`SynthesisConfig`] without touching the scene, so it can be re-run
//! on every parameter change.
//!
//! Stroke order is: fitted landmark paths, texture strokes, pruned edge
//! contours, canvas border.

use serde::{Deserialize, Serialize};

use crate::hierarchy::{EdgeContours, prune_nested};
use crate::landmarks::LandmarkPath;
use crate::mapping::CanvasMapping;
use crate::spline::fit_cubic_spline;
use crate::types::{Polyline, STROKE_WIDTH, SynthesisConfig, SynthesisError, Trajectory};

/// Raw strokes extracted from one square source image, in pixel space.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawScene {
    /// Side length of the square source image in pixels.
    pub image_width: u32,
    /// Facial feature polylines, fitted with splines during synthesis.
    #[serde(default)]
    pub landmarks: Vec<LandmarkPath>,
    /// Directional texture contours, emitted as they are.
    #[serde(default)]
    pub texture_strokes: Vec<Polyline>,
    /// Edge contours and their forest, pruned during synthesis.
    #[serde(default)]
    pub edges: EdgeContours,
}

impl RawScene {
    /// A scene with no strokes at all.
    #[must_use]
    pub fn empty(image_width: u32) -> Self {
        Self {
            image_width,
            landmarks: Vec::new(),
            texture_strokes: Vec::new(),
            edges: EdgeContours::default(),
        }
    }
}

/// Run synthesis over `scene` with the parameters in `config`.
///
/// # Errors
///
/// Returns the first [`SynthesisError`] hit: an invalid config or image
/// width, a non-finite texture or edge coordinate, a landmark path the
/// spline fitter rejects, or a malformed contour forest. No trajectories are returned on failure.
pub fn synthesize(
    scene: &RawScene,
    config: &SynthesisConfig,
) -> Result<Vec<Trajectory>, SynthesisError> {
    let mapping = prepare(scene, config)?;
    let fitted = smooth_landmarks(&scene.landmarks, config.samples_per_segment)?;
    let kept = filter_edges(&scene.edges, config.length_threshold)?;
    let strokes = assemble(fitted, &scene.texture_strokes, kept, &mapping);
    Ok(to_trajectories(&strokes, &mapping))
}

/// Validate `config` and build the pixel-to-canvas mapping for `scene`.
pub(crate) fn prepare(
    scene: &RawScene,
    config: &SynthesisConfig,
) -> Result<CanvasMapping, SynthesisError> {
    config.validate()?;
    check_finite("texture stroke", &scene.texture_strokes)?;
    check_finite("edge contour", &scene.edges.contours)?;
    CanvasMapping::new(f64::from(scene.image_width), config.canvas_size)
}

/// Reject strokes with a NaN or infinite coordinate. Their lengths are
/// NaN, which no length threshold filters out.
fn check_finite(kind: &str, strokes: &[Polyline]) -> Result<(), SynthesisError> {
    for (i, stroke) in strokes.iter().enumerate() {
        if let Some(j) = stroke.points().iter().position(|p| !p.is_finite()) {
            return Err(SynthesisError::InvalidInput(format!(
                "{kind} {i} point {j} has a non-finite coordinate"
            )));
        }
    }
    Ok(())
}

/// Fit a spline through every landmark path.
pub(crate) fn smooth_landmarks(
    landmarks: &[LandmarkPath],
    samples_per_segment: usize,
) -> Result<Vec<Polyline>, SynthesisError> {
    landmarks
        .iter()
        .map(|lm| {
            fit_cubic_spline(lm.polyline.points(), samples_per_segment).map_err(|e| match e {
                SynthesisError::InvalidInput(msg) => {
                    SynthesisError::InvalidInput(format!("{:?}: {msg}", lm.feature))
                }
                other => other,
            })
        })
        .collect()
}

/// Edge contours that survive pruning, in detection order.
pub(crate) fn filter_edges(
    edges: &EdgeContours,
    length_threshold: f64,
) -> Result<Vec<Polyline>, SynthesisError> {
    let kept = prune_nested(edges, length_threshold)?;
    log::debug!(
        "pruning kept {} of {} edge contours at threshold {length_threshold}",
        kept.len(),
        edges.contours.len()
    );
    Ok(kept
        .into_iter()
        .map(|i| edges.contours[i].clone())
        .collect())
}

/// Concatenate all pixel-space strokes in output order, dropping
/// texture and edge strokes too short to draw, and close with the
/// border.
pub(crate) fn assemble(
    fitted: Vec<Polyline>,
    texture_strokes: &[Polyline],
    kept_edges: Vec<Polyline>,
    mapping: &CanvasMapping,
) -> Vec<Polyline> {
    let mut strokes = fitted;
    strokes.extend(drawable(texture_strokes.iter().cloned(), "texture"));
    strokes.extend(drawable(kept_edges, "edge"));
    strokes.push(mapping.border());
    strokes
}

fn drawable(
    strokes: impl IntoIterator<Item = Polyline>,
    kind: &'static str,
) -> impl Iterator<Item = Polyline> {
    strokes.into_iter().enumerate().filter_map(move |(i, pl)| {
        if pl.len() < 2 {
            log::debug!("dropping {kind} stroke {i} with {} point(s)", pl.len());
            None
        } else {
            Some(pl)
        }
    })
}

/// Map every pixel-space stroke onto the canvas, exactly once.
pub(crate) fn to_trajectories(strokes: &[Polyline], mapping: &CanvasMapping) -> Vec<Trajectory> {
    strokes
        .iter()
        .map(|pl| Trajectory::uniform(mapping.map_polyline(pl), STROKE_WIDTH))
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::hierarchy::{ContourForest, HierarchyNode};
    use crate::landmarks::FaceFeature;
    use crate::types::Point;

    /// Axis-aligned square contour with side `side` at (`x`, `y`).
    fn square(x: f64, y: f64, side: f64) -> Polyline {
        Polyline::new(vec![
            Point::new(x, y),
            Point::new(x + side, y),
            Point::new(x + side, y + side),
            Point::new(x, y + side),
        ])
    }

    fn eye() -> LandmarkPath {
        LandmarkPath {
            feature: FaceFeature::LeftEye,
            polyline: Polyline::new(vec![
                Point::new(100.0, 100.0),
                Point::new(120.0, 90.0),
                Point::new(140.0, 100.0),
                Point::new(120.0, 110.0),
                Point::new(100.0, 100.0),
            ]),
        }
    }

    fn scene() -> RawScene {
        // Contour 0 (perimeter 160) encloses 1 (perimeter 8), whose
        // sibling 2 has perimeter 400. Contour 3 is a separate root.
        let forest = ContourForest::new(vec![
            HierarchyNode {
                next_sibling: Some(3),
                first_child: Some(1),
                ..HierarchyNode::default()
            },
            HierarchyNode {
                next_sibling: Some(2),
                parent: Some(0),
                ..HierarchyNode::default()
            },
            HierarchyNode {
                prev_sibling: Some(1),
                parent: Some(0),
                ..HierarchyNode::default()
            },
            HierarchyNode {
                prev_sibling: Some(0),
                ..HierarchyNode::default()
            },
        ]);
        RawScene {
            image_width: 800,
            landmarks: vec![eye()],
            texture_strokes: vec![square(300.0, 300.0, 5.0)],
            edges: EdgeContours::new(
                vec![
                    square(10.0, 10.0, 40.0),
                    square(20.0, 20.0, 2.0),
                    square(500.0, 500.0, 100.0),
                    square(600.0, 50.0, 30.0),
                ],
                forest,
            ),
        }
    }

    #[test]
    fn empty_scene_yields_only_the_border() {
        let trajectories = synthesize(&RawScene::empty(640), &SynthesisConfig::default()).unwrap();
        assert_eq!(trajectories.len(), 1);
        assert_eq!(trajectories[0].polyline().len(), 5);
    }

    #[test]
    fn strokes_come_out_in_order() {
        let config = SynthesisConfig::default();
        let trajectories = synthesize(&scene(), &config).unwrap();
        // eye, texture square, edge 0, edge 3, border
        assert_eq!(trajectories.len(), 5);
        assert_eq!(
            trajectories[0].polyline().len(),
            4 * config.samples_per_segment
        );
        assert_eq!(trajectories[1].polyline().len(), 4);
        assert_eq!(trajectories[4].polyline().len(), 5);

        let mapping = CanvasMapping::new(800.0, config.canvas_size).unwrap();
        assert_eq!(
            trajectories[2].polyline(),
            &mapping.map_polyline(&square(10.0, 10.0, 40.0))
        );
        assert_eq!(
            trajectories[3].polyline(),
            &mapping.map_polyline(&square(600.0, 50.0, 30.0))
        );
    }

    #[test]
    fn raising_the_threshold_drops_short_edges() {
        let config = SynthesisConfig {
            length_threshold: 150.0,
            ..SynthesisConfig::default()
        };
        // Edge 0 (160) survives and still discards 2; edge 3 (120) goes.
        assert_eq!(synthesize(&scene(), &config).unwrap().len(), 4);

        let config = SynthesisConfig {
            length_threshold: 1000.0,
            ..SynthesisConfig::default()
        };
        assert_eq!(synthesize(&scene(), &config).unwrap().len(), 3);
    }

    #[test]
    fn every_point_lies_on_the_canvas() {
        let config = SynthesisConfig::default();
        let extent = config.canvas_size / 1000.0;
        for trj in synthesize(&scene(), &config).unwrap() {
            assert_eq!(trj.widths().len(), trj.polyline().len());
            for (p, width) in trj.iter() {
                assert!((-1e-12..=extent + 1e-12).contains(&p.x));
                assert!((-1e-12..=extent + 1e-12).contains(&p.y));
                assert!((width - STROKE_WIDTH).abs() < f64::EPSILON);
            }
        }
    }

    #[test]
    fn fitted_landmark_keeps_its_endpoints() {
        let config = SynthesisConfig::default();
        let mapping = CanvasMapping::new(800.0, config.canvas_size).unwrap();
        let trajectories = synthesize(&scene(), &config).unwrap();
        let start = mapping.to_canvas(Point::new(100.0, 100.0));
        assert_eq!(trajectories[0].polyline().first(), Some(&start));
        assert_eq!(trajectories[0].polyline().last(), Some(&start));
    }

    #[test]
    fn resynthesis_is_repeatable_and_leaves_the_scene_alone() {
        let scene = scene();
        let before = scene.clone();
        let config = SynthesisConfig::default();
        let first = synthesize(&scene, &config).unwrap();
        let second = synthesize(&scene, &config).unwrap();
        assert_eq!(first, second);
        assert_eq!(scene, before);
    }

    #[test]
    fn degenerate_texture_and_edge_strokes_are_dropped() {
        let mut scene = RawScene::empty(100);
        scene.texture_strokes = vec![Polyline::new(vec![Point::new(1.0, 1.0)])];
        scene.edges = EdgeContours::unnested(vec![Polyline::new(vec![Point::new(5.0, 5.0)])]);
        let config = SynthesisConfig {
            length_threshold: 0.0,
            ..SynthesisConfig::default()
        };
        assert_eq!(synthesize(&scene, &config).unwrap().len(), 1);
    }

    #[test]
    fn single_point_landmark_fails_the_run() {
        let mut scene = scene();
        scene.landmarks[0].polyline = Polyline::new(vec![Point::new(1.0, 1.0)]);
        let err = synthesize(&scene, &SynthesisConfig::default()).unwrap_err();
        assert!(
            matches!(err, SynthesisError::InvalidInput(ref msg) if msg.starts_with("LeftEye")),
            "{err}"
        );
    }

    #[test]
    fn zero_sample_density_fails_the_run() {
        let config = SynthesisConfig {
            samples_per_segment: 0,
            ..SynthesisConfig::default()
        };
        assert!(matches!(
            synthesize(&scene(), &config),
            Err(SynthesisError::InvalidInput(_))
        ));
    }

    #[test]
    fn malformed_forest_fails_the_run() {
        let mut scene = scene();
        scene.edges.forest = ContourForest::flat(2);
        assert!(matches!(
            synthesize(&scene, &SynthesisConfig::default()),
            Err(SynthesisError::MalformedForest(_))
        ));
    }

    #[test]
    fn zero_image_width_is_invalid_config() {
        assert!(matches!(
            synthesize(&RawScene::empty(0), &SynthesisConfig::default()),
            Err(SynthesisError::InvalidConfig(_))
        ));
    }

    fn nan_edge_scene() -> RawScene {
        let mut scene = RawScene::empty(100);
        scene.edges = EdgeContours::unnested(vec![Polyline::new(vec![
            Point::new(1.0, 1.0),
            Point::new(f64::NAN, 2.0),
        ])]);
        scene
    }

    #[test]
    fn non_finite_edge_fails_at_any_threshold() {
        let config = SynthesisConfig {
            length_threshold: 1e9,
            ..SynthesisConfig::default()
        };
        let err = synthesize(&nan_edge_scene(), &config).unwrap_err();
        assert!(
            matches!(&err, SynthesisError::InvalidInput(msg) if msg.contains("edge contour 0")),
            "{err}"
        );
    }

    #[test]
    fn non_finite_texture_stroke_fails_the_run() {
        let mut scene = RawScene::empty(100);
        scene.texture_strokes = vec![Polyline::new(vec![
            Point::new(f64::INFINITY, 1.0),
            Point::new(2.0, 2.0),
        ])];
        assert!(matches!(
            synthesize(&scene, &SynthesisConfig::default()),
            Err(SynthesisError::InvalidInput(_))
        ));
    }

    #[test]
    fn scene_deserializes_with_missing_sections() {
        let scene: RawScene = serde_json::from_str(r#"{"image_width": 512}"#).unwrap();
        assert_eq!(scene, RawScene::empty(512));
    }
}
