//! penstroke-export: Pure format serializers (sans-IO)
//!
//! Converts synthesized trajectories into output formats: the plotter's
//! trajectory JSON document and an SVG preview.

pub mod svg;
pub mod trajectory;

pub use svg::{SvgMetadata, to_svg};
pub use trajectory::{
    ExportError, PointRecord, TrajectoryDocument, TrajectoryRecord, output_file_name,
    to_trajectory_json,
};
