pub mod bundle;
pub mod bundle_dump;
#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod geometry;
pub mod input;
pub mod ir;
pub mod projection;
pub mod render;
pub mod theme;

pub use bundle::{BundleError, BundleEvent, Bundler, CancelToken, RunStats, bundle, spawn_bundler};
#[cfg(feature = "cli")]
pub use cli::run;
pub use config::{BundlingConfig, Config, RenderConfig};
pub use ir::{Edge, Graph, Point};
pub use render::render_svg;
pub use theme::Theme;

/// Loads a JSON graph, bundles it and renders the result as SVG.
pub fn bundle_json_to_svg(input: &str, config: &Config) -> anyhow::Result<String> {
    config.bundling.validate()?;
    let raw = input::load_json(input)?;
    let canvas = projection::CanvasRect::padded(
        config.render.width as f64,
        config.render.height as f64,
        config.render.padding as f64,
    );
    let mut graph = raw.into_graph(canvas)?;
    bundle(&mut graph, &config.bundling)?;
    Ok(render_svg(&graph, &config.theme, &config.render))
}
