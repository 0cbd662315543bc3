//! SVG preview serializer.
//!
//! Renders a trajectory list as an SVG document sized like the physical
//! canvas, using the [`svg`] crate for document construction, XML
//! escaping, and path data formatting.
//!
//! Trajectories are in canvas space: export units of 1000 mm with y
//! pointing up. The preview converts them back to millimetres and flips
//! y so the drawing appears the way the plotter will draw it.
//!
//! Each trajectory becomes a separate `<path>` element using `M` (move
//! to) and `L` (line to) commands.
//!
//! Optional [`SvgMetadata`] embeds `<title>` and `<desc>` elements, and
//! the synthesis parameters as JSON inside `<metadata>`.
//!
//! This is a pure function with no I/O -- it returns a `String`.

use svg::Document;
use svg::node::element::path::Data;
use svg::node::element::{Description, Element, Path, Title};
use svg::node::{Node, Text, Value};

use penstroke_pipeline::mapping::UNITS_PER_CANVAS;
use penstroke_pipeline::{Point, Polyline, STROKE_WIDTH, Trajectory};

/// Metadata to embed in the SVG document.
///
/// All fields are optional. Text values are XML-escaped automatically by
/// the `svg` crate.
#[derive(Debug, Clone, Default)]
pub struct SvgMetadata<'a> {
    /// Document title, emitted as `<title>`.
    ///
    /// Typically the source image file name.
    pub title: Option<&'a str>,

    /// Document description, emitted as `<desc>`.
    pub description: Option<&'a str>,

    /// Serialized [`SynthesisConfig`](penstroke_pipeline::SynthesisConfig),
    /// emitted inside `<metadata>` so a preview records the parameters
    /// that produced it.
    pub config_json: Option<&'a str>,
}

/// Build an SVG path `d` attribute string from a polyline.
///
/// Uses `M` for the first point and `L` for subsequent points.
/// Returns an empty string for polylines with fewer than 2 points.
///
/// # Examples
///
/// ```
/// use penstroke_pipeline::{Point, Polyline};
/// use penstroke_export::svg::build_path_data;
///
/// let polyline = Polyline::new(vec![
///     Point::new(10.0, 20.0),
///     Point::new(30.0, 40.0),
/// ]);
/// assert_eq!(build_path_data(&polyline), "M10,20 L30,40");
/// ```
#[must_use]
pub fn build_path_data(polyline: &Polyline) -> String {
    path_data(polyline.points(), |p| (p.x, p.y))
}

fn path_data(points: &[Point], tx: impl Fn(&Point) -> (f64, f64)) -> String {
    let Some((first, rest)) = points.split_first() else {
        return String::new();
    };
    if rest.is_empty() {
        return String::new();
    }

    let mut data = Data::new().move_to(tx(first));
    for p in rest {
        data = data.line_to(tx(p));
    }
    String::from(Value::from(data))
}

/// Serialize canvas-space trajectories into an SVG preview.
///
/// `canvas_size` is the canvas edge length in millimetres; the document
/// is that many millimetres wide and high, with a matching `viewBox`.
/// Stroke widths are read from each trajectory's first point.
#[must_use]
pub fn to_svg(trajectories: &[Trajectory], canvas_size: f64, metadata: &SvgMetadata<'_>) -> String {
    let mut doc = Document::new()
        .set("width", format!("{canvas_size}mm"))
        .set("height", format!("{canvas_size}mm"))
        .set("viewBox", (0, 0, canvas_size, canvas_size));

    if let Some(title) = metadata.title {
        doc = doc.add(Title::new(title));
    }

    if let Some(description) = metadata.description {
        doc = doc.add(Description::new().add(Text::new(description)));
    }

    if let Some(config_json) = metadata.config_json {
        let mut synthesis_el = Element::new("penstroke:synthesis");
        synthesis_el.assign("xmlns:penstroke", "urn:penstroke:synthesis:1");
        synthesis_el.append(Text::new(config_json));
        let mut metadata_el = Element::new("metadata");
        metadata_el.append(synthesis_el);
        doc = doc.add(metadata_el);
    }

    let to_mm = |p: &Point| (p.x * UNITS_PER_CANVAS, canvas_size - p.y * UNITS_PER_CANVAS);

    for trajectory in trajectories {
        let d = path_data(trajectory.polyline().points(), to_mm);
        if d.is_empty() {
            continue;
        }
        let width = trajectory.widths().first().copied().unwrap_or(STROKE_WIDTH);

        let path = Path::new()
            .set("d", d)
            .set("fill", "none")
            .set("stroke", "black")
            .set("stroke-width", width)
            .set("stroke-linecap", "round")
            .set("stroke-linejoin", "round");
        doc = doc.add(path);
    }

    // The svg crate omits the XML declaration, so we prepend it.
    format!("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n{doc}\n")
}
