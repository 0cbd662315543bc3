//! Synthesis diagnostics: timing and counts for each stage.
//!
//! Timing goes through the [`Clock`] trait so this crate stays free of
//! any platform clock; callers supply one (the CLI uses
//! `std::time::Instant`).
//!
//! Durations are serialized as fractional seconds (`f64`), since
//! `std::time::Duration` has no serde representation of its own.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::synthesis::{RawScene, assemble, filter_edges, prepare, smooth_landmarks, to_trajectories};
use crate::types::{Polyline, SynthesisConfig, SynthesisError, Trajectory};

/// Serde support for `std::time::Duration` as fractional seconds.
mod duration_serde {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    /// Serialize a `Duration` as fractional seconds (`f64`).
    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        duration.as_secs_f64().serialize(serializer)
    }

    /// Deserialize a `Duration` from fractional seconds (`f64`).
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs).map_err(|_| {
            serde::de::Error::custom(
                "duration seconds must be finite, non-negative, and representable as a Duration",
            )
        })
    }
}

/// Source of timestamps for stage timing.
pub trait Clock {
    /// Opaque timestamp type.
    type Instant;

    /// Current timestamp.
    fn now(&self) -> Self::Instant;

    /// Time elapsed since `since`.
    fn elapsed(&self, since: &Self::Instant) -> Duration;
}

/// Diagnostics collected from a single synthesis run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SynthesisDiagnostics {
    /// Spline fitting of landmark paths.
    pub smoothing: StageDiagnostics,
    /// Nested-contour pruning of edge contours.
    pub pruning: StageDiagnostics,
    /// Concatenation of all strokes plus the border.
    pub assembly: StageDiagnostics,
    /// Pixel-to-canvas mapping.
    pub mapping: StageDiagnostics,
    /// Total wall-clock duration of the run (seconds).
    #[serde(with = "duration_serde")]
    pub total_duration: Duration,
    /// Summary counts across all stages.
    pub summary: SynthesisSummary,
}

/// Diagnostics for a single stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageDiagnostics {
    /// Wall-clock duration of this stage (seconds).
    #[serde(with = "duration_serde")]
    pub duration: Duration,
    /// Stage-specific metrics.
    pub metrics: StageMetrics,
}

/// Stage-specific metrics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum StageMetrics {
    /// Spline fitting metrics.
    Smoothing {
        /// Number of landmark paths fitted.
        path_count: usize,
        /// Landmark points going in.
        points_before: usize,
        /// Sampled curve points coming out.
        points_after: usize,
        /// Samples per cubic segment.
        samples_per_segment: usize,
    },
    /// Pruning metrics.
    Pruning {
        /// Minimum closed arc length in pixels.
        length_threshold: f64,
        /// Raw contours considered.
        contours_before: usize,
        /// Contours kept.
        contours_after: usize,
    },
    /// Assembly metrics.
    Assembly {
        /// Texture strokes passed through.
        texture_count: usize,
        /// Texture and edge strokes dropped for having fewer than 2 points.
        dropped_count: usize,
        /// Strokes in the final list, border included.
        stroke_count: usize,
    },
    /// Mapping metrics.
    Mapping {
        /// Pixels per canvas millimetre.
        compression: f64,
        /// Points mapped.
        point_count: usize,
    },
}

/// High-level summary counts for the run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SynthesisSummary {
    /// Source image side length in pixels.
    pub image_width: u32,
    /// Trajectories produced.
    pub trajectory_count: usize,
    /// Points across all trajectories.
    pub point_count: usize,
}

/// Run [`synthesize`](crate::synthesize) while timing every stage.
///
/// Produces exactly the trajectories `synthesize` would.
///
/// # Errors
///
/// Same as [`synthesize`](crate::synthesize).
pub fn synthesize_with_diagnostics<C: Clock>(
    scene: &RawScene,
    config: &SynthesisConfig,
    clock: &C,
) -> Result<(Vec<Trajectory>, SynthesisDiagnostics), SynthesisError> {
    let run_start = clock.now();
    let mapping = prepare(scene, config)?;

    let start = clock.now();
    let fitted = smooth_landmarks(&scene.landmarks, config.samples_per_segment)?;
    let smoothing = StageDiagnostics {
        duration: clock.elapsed(&start),
        metrics: StageMetrics::Smoothing {
            path_count: fitted.len(),
            points_before: scene.landmarks.iter().map(|lm| lm.polyline.len()).sum(),
            points_after: point_count(&fitted),
            samples_per_segment: config.samples_per_segment,
        },
    };

    let start = clock.now();
    let kept = filter_edges(&scene.edges, config.length_threshold)?;
    let pruning = StageDiagnostics {
        duration: clock.elapsed(&start),
        metrics: StageMetrics::Pruning {
            length_threshold: config.length_threshold,
            contours_before: scene.edges.contours.len(),
            contours_after: kept.len(),
        },
    };

    let start = clock.now();
    let candidates = fitted.len() + scene.texture_strokes.len() + kept.len() + 1;
    let strokes = assemble(fitted, &scene.texture_strokes, kept, &mapping);
    let assembly = StageDiagnostics {
        duration: clock.elapsed(&start),
        metrics: StageMetrics::Assembly {
            texture_count: scene.texture_strokes.len(),
            dropped_count: candidates - strokes.len(),
            stroke_count: strokes.len(),
        },
    };

    let start = clock.now();
    let trajectories = to_trajectories(&strokes, &mapping);
    let mapping_diag = StageDiagnostics {
        duration: clock.elapsed(&start),
        metrics: StageMetrics::Mapping {
            compression: mapping.compression(),
            point_count: point_count(&strokes),
        },
    };

    let diagnostics = SynthesisDiagnostics {
        smoothing,
        pruning,
        assembly,
        mapping: mapping_diag,
        total_duration: clock.elapsed(&run_start),
        summary: SynthesisSummary {
            image_width: scene.image_width,
            trajectory_count: trajectories.len(),
            point_count: point_count(&strokes),
        },
    };

    Ok((trajectories, diagnostics))
}

fn point_count(polylines: &[Polyline]) -> usize {
    polylines.iter().map(Polyline::len).sum()
}

impl SynthesisDiagnostics {
    /// Format diagnostics as a human-readable report.
    #[must_use]
    pub fn report(&self) -> String {
        let mut lines = Vec::new();

        lines.push(format!("Synthesis Diagnostics Report\n{}", "=".repeat(60)));
        lines.push(format!("Image: {0}x{0} pixels", self.summary.image_width));
        lines.push(format!(
            "Total duration: {:.3}ms",
            duration_ms(self.total_duration),
        ));
        lines.push(String::new());

        lines.push(format!(
            "{:<16} {:>10} {:>10}  {}",
            "Stage", "Duration", "% Total", "Details"
        ));
        lines.push("-".repeat(80));

        let total_ms = duration_ms(self.total_duration);
        let stages = [
            ("Smoothing", &self.smoothing),
            ("Pruning", &self.pruning),
            ("Assembly", &self.assembly),
            ("Mapping", &self.mapping),
        ];

        for (name, diag) in stages {
            let ms = duration_ms(diag.duration);
            let pct = if total_ms > 0.0 {
                ms / total_ms * 100.0
            } else {
                0.0
            };
            let details = format_metrics(&diag.metrics);
            lines.push(format!("{name:<16} {ms:>8.3}ms {pct:>9.1}%  {details}"));
        }

        lines.push(String::new());
        lines.push(format!(
            "Trajectories: {}  |  Points: {}",
            self.summary.trajectory_count, self.summary.point_count,
        ));

        lines.join("\n")
    }
}

/// Convert a `Duration` to milliseconds as `f64`.
fn duration_ms(d: Duration) -> f64 {
    d.as_secs_f64() * 1000.0
}

/// Format stage metrics into a compact detail string.
fn format_metrics(metrics: &StageMetrics) -> String {
    match metrics {
        StageMetrics::Smoothing {
            path_count,
            points_before,
            points_after,
            samples_per_segment,
        } => format!(
            "{path_count} paths, {points_before}->{points_after} pts (s={samples_per_segment})"
        ),
        StageMetrics::Pruning {
            length_threshold,
            contours_before,
            contours_after,
        } => format!("len>={length_threshold:.1} {contours_before}->{contours_after} contours"),
        StageMetrics::Assembly {
            texture_count,
            dropped_count,
            stroke_count,
        } => format!("{texture_count} texture, {dropped_count} dropped, {stroke_count} strokes"),
        StageMetrics::Mapping {
            compression,
            point_count,
        } => format!("c={compression:.3} px/mm, {point_count} pts"),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::cell::Cell;

    use super::*;
    use crate::hierarchy::EdgeContours;
    use crate::types::Point;

    /// Clock that advances one millisecond per reading.
    struct TickClock(Cell<u64>);

    impl Clock for TickClock {
        type Instant = u64;

        fn now(&self) -> u64 {
            let t = self.0.get();
            self.0.set(t + 1);
            t
        }

        fn elapsed(&self, since: &u64) -> Duration {
            Duration::from_millis(self.now() - since)
        }
    }

    fn scene() -> RawScene {
        let mut scene = RawScene::empty(400);
        scene.edges = EdgeContours::unnested(vec![
            Polyline::new(vec![Point::new(0.0, 0.0), Point::new(100.0, 0.0)]),
            Polyline::new(vec![Point::new(0.0, 0.0), Point::new(1.0, 0.0)]),
        ]);
        scene
    }

    #[test]
    fn diagnostics_match_plain_synthesis() {
        let config = SynthesisConfig::default();
        let clock = TickClock(Cell::new(0));
        let (trajectories, diagnostics) =
            synthesize_with_diagnostics(&scene(), &config, &clock).unwrap();
        assert_eq!(trajectories, crate::synthesize(&scene(), &config).unwrap());
        assert_eq!(diagnostics.summary.trajectory_count, 2);
        assert_eq!(diagnostics.summary.point_count, 7);
        assert!(matches!(
            diagnostics.pruning.metrics,
            StageMetrics::Pruning {
                contours_before: 2,
                contours_after: 1,
                ..
            }
        ));
        assert!(diagnostics.total_duration > diagnostics.mapping.duration);
    }

    #[test]
    fn report_lists_every_stage() {
        let clock = TickClock(Cell::new(0));
        let (_, diagnostics) =
            synthesize_with_diagnostics(&scene(), &SynthesisConfig::default(), &clock).unwrap();
        let report = diagnostics.report();
        for stage in ["Smoothing", "Pruning", "Assembly", "Mapping"] {
            assert!(report.contains(stage), "missing {stage}");
        }
        assert!(report.contains("Trajectories: 2"));
    }

    #[test]
    fn diagnostics_serialize_durations_as_seconds() {
        let clock = TickClock(Cell::new(0));
        let (_, diagnostics) =
            synthesize_with_diagnostics(&scene(), &SynthesisConfig::default(), &clock).unwrap();
        let json = serde_json::to_value(&diagnostics).unwrap();
        assert!(json["smoothing"]["duration"].is_f64());
        let back: SynthesisDiagnostics = serde_json::from_value(json).unwrap();
        assert_eq!(back.summary.trajectory_count, 2);
    }

    #[test]
    fn errors_propagate() {
        let config = SynthesisConfig {
            canvas_size: -5.0,
            ..SynthesisConfig::default()
        };
        let clock = TickClock(Cell::new(0));
        assert!(synthesize_with_diagnostics(&scene(), &config, &clock).is_err());
    }
}
