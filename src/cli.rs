use crate::bundle::{BundleEvent, Bundler, spawn_bundler};
use crate::bundle_dump::{write_bundle_dump, write_bundle_dump_to};
use crate::config::{Config, load_config};
use crate::input::{RawGraph, load_graph_file, load_json};
use crate::projection::CanvasRect;
use crate::render::{render_svg, write_output_svg};
use crate::theme::Theme;
use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "edgebundle",
    version,
    about = "Force-directed edge bundling of fixed-position graphs"
)]
pub struct Args {
    /// Input graph (.graphml/.xml or .json), '-' for JSON on stdin
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,

    /// Output file. Defaults to stdout for SVG and JSON.
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,

    /// Output format
    #[arg(short = 'e', long = "outputFormat", value_enum, default_value = "svg")]
    pub output_format: OutputFormat,

    /// Config JSON file
    #[arg(short = 'c', long = "configFile")]
    pub config: Option<PathBuf>,

    /// Theme preset (classic, night)
    #[arg(short = 't', long = "theme")]
    pub theme: Option<String>,

    /// Compatibility threshold [0, 1]
    #[arg(long = "compatibility")]
    pub compatibility: Option<f64>,

    /// Step size [0, 3]
    #[arg(long = "step-size")]
    pub step_size: Option<f64>,

    /// Edge stiffness [0, 1]
    #[arg(long = "stiffness")]
    pub stiffness: Option<f64>,

    /// Iterations in the first cycle [0, 400]
    #[arg(long = "iterations")]
    pub iterations: Option<usize>,

    /// Number of cycles [0, 20]
    #[arg(long = "cycles")]
    pub cycles: Option<usize>,

    /// Interior points per edge in the first cycle
    #[arg(long = "subdivisions")]
    pub subdivisions: Option<usize>,

    /// Canvas width
    #[arg(short = 'w', long = "width")]
    pub width: Option<f32>,

    /// Canvas height
    #[arg(short = 'H', long = "height")]
    pub height: Option<f32>,

    /// Also write the bundled polylines as JSON to this path
    #[arg(long = "dump")]
    pub dump: Option<PathBuf>,

    /// More log output (-v info, -vv debug)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    pub verbose: u8,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Svg,
    Png,
    Json,
}

pub fn run() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    let config = resolve_config(&args)?;
    for note in config.bundling.advisories() {
        warn!("{note}");
    }

    let raw = read_graph(&args.input)?;
    let canvas = CanvasRect::padded(
        config.render.width as f64,
        config.render.height as f64,
        config.render.padding as f64,
    );
    let graph = raw.into_graph(canvas)?;

    let (tx, rx) = mpsc::channel();
    let bundler = Bundler::new(config.bundling);
    let handle = spawn_bundler(graph, bundler, tx);

    let mut current_cycle = None;
    for event in rx {
        match event {
            BundleEvent::Progress { cycle, .. } => {
                if current_cycle != Some(cycle) {
                    info!(cycle, "processing");
                    current_cycle = Some(cycle);
                }
            }
            BundleEvent::Finished { edges, .. } => {
                info!(edges = edges.len(), "bundling finished");
            }
        }
    }

    let (graph, stats) = handle
        .join()
        .map_err(|_| anyhow::anyhow!("bundling worker panicked"))??;

    match args.output_format {
        OutputFormat::Svg => {
            let svg = render_svg(&graph, &config.theme, &config.render);
            write_output_svg(&svg, args.output.as_deref())?;
        }
        OutputFormat::Png => {
            let output = ensure_output(&args.output, "png")?;
            write_png(&graph, &config, &output)?;
        }
        OutputFormat::Json => match args.output.as_deref() {
            Some(path) => write_bundle_dump(path, &graph, &config.bundling, Some(&stats))?,
            None => write_bundle_dump_to(
                io::stdout().lock(),
                &graph,
                &config.bundling,
                Some(&stats),
            )?,
        },
    }

    if let Some(path) = args.dump.as_deref() {
        write_bundle_dump(path, &graph, &config.bundling, Some(&stats))
            .with_context(|| format!("failed to write dump to {}", path.display()))?;
    }

    Ok(())
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

/// Config file first, then command-line overrides, then range checks.
fn resolve_config(args: &Args) -> Result<Config> {
    let mut config = load_config(args.config.as_deref())
        .with_context(|| "failed to load config file".to_string())?;

    if let Some(name) = args.theme.as_deref() {
        config.theme =
            Theme::from_name(name).ok_or_else(|| anyhow::anyhow!("unknown theme '{name}'"))?;
        config.render.background = config.theme.background.clone();
    }
    if let Some(v) = args.compatibility {
        config.bundling.compatibility_threshold = v;
    }
    if let Some(v) = args.step_size {
        config.bundling.step_size = v;
    }
    if let Some(v) = args.stiffness {
        config.bundling.edge_stiffness = v;
    }
    if let Some(v) = args.iterations {
        config.bundling.iterations_count = v;
    }
    if let Some(v) = args.cycles {
        config.bundling.cycles_count = v;
    }
    if let Some(v) = args.subdivisions {
        config.bundling.initial_subdivision_points = v;
    }
    if let Some(v) = args.width {
        config.render.width = v;
    }
    if let Some(v) = args.height {
        config.render.height = v;
    }

    config.bundling.validate()?;
    Ok(config)
}

fn read_graph(path: &Path) -> Result<RawGraph> {
    if path == Path::new("-") {
        let mut buf = String::new();
        io::stdin().read_to_string(&mut buf)?;
        return Ok(load_json(&buf)?);
    }
    load_graph_file(path).with_context(|| format!("failed to read graph from {}", path.display()))
}

fn ensure_output(output: &Option<PathBuf>, ext: &str) -> Result<PathBuf> {
    if let Some(path) = output {
        return Ok(path.clone());
    }
    Err(anyhow::anyhow!("Output path required for {} output", ext))
}

#[cfg(feature = "png")]
fn write_png(graph: &crate::ir::Graph, config: &Config, output: &Path) -> Result<()> {
    let svg = render_svg(graph, &config.theme, &config.render);
    crate::render::write_output_png(&svg, output, &config.render)
}

#[cfg(not(feature = "png"))]
fn write_png(_graph: &crate::ir::Graph, _config: &Config, _output: &Path) -> Result<()> {
    Err(anyhow::anyhow!("PNG output requires the 'png' feature"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(extra: &[&str]) -> Args {
        let mut argv = vec!["edgebundle", "-i", "graph.json"];
        argv.extend_from_slice(extra);
        Args::parse_from(argv)
    }

    #[test]
    fn flags_override_defaults() {
        let argv = args(&["--cycles", "3", "--step-size", "0.5", "-w", "900"]);
        let config = resolve_config(&argv).unwrap();
        assert_eq!(config.bundling.cycles_count, 3);
        assert_eq!(config.bundling.step_size, 0.5);
        assert_eq!(config.bundling.iterations_count, 90);
        assert_eq!(config.render.width, 900.0);
    }

    #[test]
    fn out_of_range_flags_are_rejected() {
        let err = resolve_config(&args(&["--compatibility", "1.5"])).unwrap_err();
        assert!(err.to_string().contains("compatibility threshold"));
    }

    #[test]
    fn theme_flag_switches_background() {
        let config = resolve_config(&args(&["-t", "night"])).unwrap();
        assert_eq!(config.render.background, Theme::night().background);
        assert!(resolve_config(&args(&["-t", "sepia"])).is_err());
    }

    #[test]
    fn output_format_parses_json() {
        let parsed = args(&["-e", "json", "--dump", "out.json"]);
        assert_eq!(parsed.output_format, OutputFormat::Json);
        assert_eq!(parsed.dump, Some(PathBuf::from("out.json")));
        assert!(ensure_output(&None, "png").is_err());
    }
}
