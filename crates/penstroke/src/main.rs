//! penstroke: command-line driver for plotter path synthesis.
//!
//! Reads a captured scene document (the landmark, texture and edge
//! strokes extracted once from a portrait), synthesizes plotter
//! trajectories for it, and writes the trajectory JSON document the
//! plotter controller consumes. Useful for:
//!
//! - Re-running synthesis for several edge-length thresholds against
//!   the same cached scene
//! - Previewing the canvas as SVG before sending it to the robot
//! - Measuring per-stage durations and stroke counts
//!
//! # Usage
//!
//! ```text
//! cargo run --release --bin penstroke -- [OPTIONS] <SCENE_PATH>
//! ```
//!
//! The scene document is a JSON object with the source image name and
//! the raw scene:
//!
//! ```text
//! {"source": "ana.png", "image_width": 512, "landmarks": [...],
//!  "texture_strokes": [...], "edges": {"contours": [...], "forest": [...]}}
//! ```

#![allow(clippy::print_stdout, clippy::print_stderr)]

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::{Duration, Instant};

use clap::Parser;
use serde::Deserialize;

use penstroke_pipeline::diagnostics::{Clock, synthesize_with_diagnostics};
use penstroke_pipeline::{RawScene, Session, SynthesisConfig};

/// Plotter path synthesis for captured portrait scenes.
///
/// Synthesizes trajectories from a scene document and writes
/// `<source base name>.json` into the output directory.
#[derive(Parser)]
#[command(name = "penstroke", version)]
struct Cli {
    /// Path to the scene document (JSON).
    scene_path: PathBuf,

    /// Directory the trajectory document is written to.
    #[arg(long, default_value = "Result")]
    output_dir: PathBuf,

    /// Minimum closed arc length, in pixels, for an edge contour.
    ///
    /// May be given several times; each value re-synthesizes the cached
    /// scene and the last one is exported.
    #[arg(long, default_values_t = [SynthesisConfig::DEFAULT_LENGTH_THRESHOLD])]
    length_threshold: Vec<f64>,

    /// Points sampled on each cubic segment of a landmark spline.
    #[arg(long, default_value_t = SynthesisConfig::DEFAULT_SAMPLES_PER_SEGMENT, value_parser = clap::builder::RangedU64ValueParser::<usize>::new().range(1..))]
    samples_per_segment: usize,

    /// Canvas edge length in millimetres.
    #[arg(long, default_value_t = SynthesisConfig::DEFAULT_CANVAS_SIZE)]
    canvas_size: f64,

    /// Full synthesis config as a JSON string.
    ///
    /// When provided, all other synthesis parameter flags are ignored.
    /// The JSON must be a valid `SynthesisConfig` serialization.
    #[arg(long)]
    config_json: Option<String>,

    /// Write an SVG preview of the canvas to this file.
    #[arg(long)]
    svg: Option<PathBuf>,

    /// Output diagnostics as JSON instead of a human-readable report.
    #[arg(long)]
    json: bool,
}

/// On-disk scene document: the source image name plus its raw scene.
#[derive(Deserialize)]
struct SceneFile {
    /// File name of the portrait the scene was extracted from.
    source: String,
    #[serde(flatten)]
    scene: RawScene,
}

/// Build the synthesis configs to run, in order, from CLI arguments.
///
/// If `--config-json` is provided, the JSON is parsed directly and all
/// individual parameter flags are ignored. Otherwise one config is
/// assembled per `--length-threshold` value.
fn configs_from_cli(cli: &Cli) -> Result<Vec<SynthesisConfig>, String> {
    if let Some(ref json) = cli.config_json {
        let config =
            serde_json::from_str(json).map_err(|e| format!("Error parsing --config-json: {e}"))?;
        return Ok(vec![config]);
    }

    Ok(cli
        .length_threshold
        .iter()
        .map(|&length_threshold| SynthesisConfig {
            length_threshold,
            samples_per_segment: cli.samples_per_segment,
            canvas_size: cli.canvas_size,
        })
        .collect())
}

fn read_scene(path: &Path) -> Result<SceneFile, String> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| format!("Error reading {}: {e}", path.display()))?;
    serde_json::from_str(&text).map_err(|e| format!("Error parsing {}: {e}", path.display()))
}

fn main() -> ExitCode {
    match run(&Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(msg) => {
            eprintln!("{msg}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<(), String> {
    let configs = configs_from_cli(cli)?;
    let SceneFile { source, scene } = read_scene(&cli.scene_path)?;

    eprintln!(
        "Scene: {} ({source}, {}x{} px, {} landmark paths, {} texture strokes, {} edge contours)",
        cli.scene_path.display(),
        scene.image_width,
        scene.image_width,
        scene.landmarks.len(),
        scene.texture_strokes.len(),
        scene.edges.contours.len(),
    );

    let mut configs = configs.into_iter();
    let first = configs
        .next()
        .ok_or_else(|| "No synthesis parameters given".to_owned())?;
    eprintln!("Config: {first:?}");
    let mut session =
        Session::load(scene, first).map_err(|e| format!("Synthesis error: {e}"))?;
    eprintln!("  -> {} trajectories", session.trajectories().len());

    for config in configs {
        eprintln!("Config: {config:?}");
        match session.update(config) {
            Ok(trajectories) => eprintln!("  -> {} trajectories", trajectories.len()),
            Err(e) => eprintln!("  -> synthesis error, keeping previous result: {e}"),
        }
    }

    let config = session.config().clone();
    let trajectories = session.trajectories();
    // Timed run of the exported config, for the report only.
    let (_, diagnostics) = synthesize_with_diagnostics(session.scene(), &config, &StdClock)
        .map_err(|e| format!("Synthesis error: {e}"))?;

    if cli.json {
        let json = serde_json::to_string_pretty(&diagnostics)
            .map_err(|e| format!("Error serializing diagnostics: {e}"))?;
        println!("{json}");
    } else {
        println!("{}", diagnostics.report());
    }

    let document = penstroke_export::to_trajectory_json(trajectories)
        .map_err(|e| format!("Export error: {e}"))?;
    std::fs::create_dir_all(&cli.output_dir)
        .map_err(|e| format!("Error creating {}: {e}", cli.output_dir.display()))?;
    let output_path = cli
        .output_dir
        .join(penstroke_export::output_file_name(&source));
    std::fs::write(&output_path, &document)
        .map_err(|e| format!("Error writing {}: {e}", output_path.display()))?;
    eprintln!(
        "Trajectories written to {} ({} bytes)",
        output_path.display(),
        document.len(),
    );

    if let Some(ref svg_path) = cli.svg {
        let config_json = serde_json::to_string(&config)
            .map_err(|e| format!("Error serializing config: {e}"))?;
        let desc = format!("{config:?}");
        let metadata = penstroke_export::SvgMetadata {
            title: Some(&source),
            description: Some(&desc),
            config_json: Some(&config_json),
        };
        let svg = penstroke_export::to_svg(trajectories, config.canvas_size, &metadata);
        match std::fs::write(svg_path, &svg) {
            Ok(()) => eprintln!("SVG written to {} ({} bytes)", svg_path.display(), svg.len()),
            Err(e) => eprintln!("Error writing SVG to {}: {e}", svg_path.display()),
        }
    }

    Ok(())
}

/// [`Clock`] implementation backed by [`std::time::Instant`].
struct StdClock;

impl Clock for StdClock {
    type Instant = Instant;

    fn now(&self) -> Instant {
        Instant::now()
    }

    fn elapsed(&self, since: &Instant) -> Duration {
        since.elapsed()
    }
}
