//! biostack command-line front end.
//!
//! Runs the slice extractor and the measurement matrix on synthetic
//! stacks and prints the results as JSON.
#![allow(
    clippy::uninlined_format_args,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss,
    clippy::too_many_lines
)]

use clap::{Parser, Subcommand, ValueEnum};

use biostack_core::{GeometryError, Interpolation, Point, StackDomain, Volume};
use biostack_measure::{Dimension, GroupId, MatrixConfig, MeasureError, MeasurementMatrix, Rgb};
use biostack_slice::{
    intersect_box, outline_mesh, BoxBounds, SamplingQuad, SliceConfig, SliceError, SliceExtractor,
};
use log::{debug, info, LevelFilter};
use serde_json::json;
use std::time::Instant;
use thiserror::Error;

/// Result type for CLI operations.
type Result<T> = std::result::Result<T, CliError>;

/// CLI error types.
#[derive(Error, Debug)]
enum CliError {
    #[error("Shape error: {0}")]
    Shape(#[from] biostack_core::ShapeError),

    #[error("Geometry error: {0}")]
    Geometry(#[from] GeometryError),

    #[error("Measurement error: {0}")]
    Measure(#[from] MeasureError),

    #[error("Slice error: {0}")]
    Slice(#[from] SliceError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Interpolation selection.
#[derive(Debug, Clone, Copy, ValueEnum)]
enum Sampling {
    /// Nearest sample
    Nearest,
    /// Trilinear blend of the eight surrounding samples
    Trilinear,
}

impl From<Sampling> for Interpolation {
    fn from(s: Sampling) -> Self {
        match s {
            Sampling::Nearest => Interpolation::Nearest,
            Sampling::Trilinear => Interpolation::Trilinear,
        }
    }
}

/// Measurement and oblique-slice tooling for image stacks.
#[derive(Parser)]
#[command(name = "biostack")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Verbose logging (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the outline and mesh of a plane cut through a box
    Outline {
        /// Far box corner as x,y,z (the near corner is the origin)
        #[arg(long, value_parser = parse_point, default_value = "10,10,10")]
        size: Point,

        /// Control points as x,y,z (exactly three)
        #[arg(short, long = "point", value_parser = parse_point, num_args = 3, required = true)]
        points: Vec<Point>,
    },

    /// Resample a synthetic gradient stack on a plane
    Extract {
        /// Stack shape as time,slice,height,width
        #[arg(long, value_delimiter = ',', default_value = "2,16,64,64")]
        shape: Vec<usize>,

        /// Timestep to sample
        #[arg(short, long, default_value = "0")]
        timestep: usize,

        /// Control points as x,y,z (defaults to the middle slice)
        #[arg(short, long = "point", value_parser = parse_point, num_args = 3)]
        points: Option<Vec<Point>>,

        /// Output resolution (columns, rows)
        #[arg(long, value_delimiter = ',', default_value = "64,64")]
        resolution: Vec<usize>,

        /// Interpolation mode
        #[arg(long, value_enum, default_value = "trilinear")]
        sampling: Sampling,
    },

    /// Run a scripted measurement session on an empty stack
    Measure {
        /// Stack shape as time,slice,height,width
        #[arg(long, value_delimiter = ',', default_value = "2,5,100,100")]
        shape: Vec<usize>,
    },
}

fn parse_point(s: &str) -> std::result::Result<Point, String> {
    let parts: Vec<f64> = s
        .split(',')
        .map(|v| v.trim().parse::<f64>().map_err(|e| format!("'{v}': {e}")))
        .collect::<std::result::Result<_, _>>()?;
    match parts.as_slice() {
        [x, y, z] => Ok(Point::new(*x, *y, *z)),
        _ => Err(format!("expected x,y,z, got '{s}'")),
    }
}

fn control_points(points: &[Point]) -> Option<[Point; 3]> {
    match points {
        [a, b, c] => Some([*a, *b, *c]),
        _ => None,
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    };
    env_logger::Builder::new()
        .filter_level(default_level)
        .parse_default_env()
        .init();

    match cli.command {
        Commands::Outline { size, points } => {
            let bounds = BoxBounds::new(Point::ORIGIN, size);
            let control =
                control_points(&points).ok_or(GeometryError::ControlPoint(points.len()))?;
            let hull = intersect_box(&bounds, &control)?;
            let mesh = outline_mesh(&hull);
            let quad = SamplingQuad::from_hull(&hull);

            let report = json!({
                "vertices": hull.vertices(),
                "normal": hull.normal(),
                "area": hull.area(),
                "mesh": mesh.map(|m| json!({
                    "columns": m.columns,
                    "rows": m.rows,
                    "samples": m.samples,
                })),
                "quad": quad,
                "quad_corners": quad.as_ref().map(SamplingQuad::corners),
            });
            println!("{}", serde_json::to_string_pretty(&report)?);
        }

        Commands::Extract {
            shape,
            timestep,
            points,
            resolution,
            sampling,
        } => {
            let domain = StackDomain::from_shape(&shape)?;
            info!("building synthetic {:?} stack", domain.shape());
            let volume = Volume::from_fn(domain, |t, z, y, x| (t * 1000 + z * 100 + y + x) as f32);

            let (rx, ry) = match resolution.as_slice() {
                [x, y] => (*x, *y),
                [n] => (*n, *n),
                _ => (64, 64),
            };
            let config = SliceConfig::default()
                .with_resolution(rx, ry)
                .with_interpolation(sampling.into());
            let mut extractor = SliceExtractor::for_volume(&volume, config);
            if let Some(points) = points {
                let control = control_points(&points)
                    .ok_or(GeometryError::ControlPoint(points.len()))?;
                extractor.set_control_points(control)?;
            }

            let start = Instant::now();
            let image = extractor.extract(&volume, timestep)?;
            debug!("extracted in {:.2?}", start.elapsed());

            let (width, height) = image.extent();
            let report = json!({
                "control_points": extractor.selector().control_points(),
                "outline": extractor.selector().outline(),
                "resolution": image.resolution(),
                "extent": { "width": width, "height": height },
                "quad": image.quad,
                "stats": image.stats(),
            });
            println!("{}", serde_json::to_string_pretty(&report)?);
        }

        Commands::Measure { shape } => {
            let domain = StackDomain::from_shape(&shape)?;
            let mut matrix = MeasurementMatrix::new(MatrixConfig::default());
            matrix.init(&shape)?;

            let cells = matrix.groups_mut().create("cells", Rgb::YELLOW);
            let (w, h) = (domain.width as f64, domain.height as f64);
            let line = matrix.add_line(0, 0, (0.1 * w, 0.1 * h), (0.6 * w, 0.5 * h), cells)?;
            let marker = matrix.add_point(0, domain.slices / 2, 0.5 * w, 0.5 * h, GroupId::NONE)?;

            let standard = matrix.promote_to_standard(marker)?;
            let after_promote = matrix.store().len();
            let drawn = matrix.lines(Dimension::Two).map_or(0, |l| l.lines.len() + l.points.len());

            let mut lists = Vec::new();
            for t in 0..domain.timesteps {
                for s in 0..domain.slices {
                    if let Some(list) = matrix.list(t, s) {
                        lists.push(json!({ "timestep": t, "slice": s, "count": list.len() }));
                    }
                }
            }

            let length = matrix.measurement(line).and_then(|m| m.length([1.0, 1.0, 1.0]));
            let removed = matrix.demote(marker)?;

            let report = json!({
                "groups": matrix.groups().iter().map(|g| &g.name).collect::<Vec<_>>(),
                "line_length": length,
                "standard": standard.raw(),
                "measurements_after_promote": after_promote,
                "drawn_on_active_slice": drawn,
                "lists": lists,
                "removed_by_demote": removed,
                "measurements_remaining": matrix.store().len(),
            });
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }

    Ok(())
}
