use crate::theme::Theme;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

pub const DEFAULT_COMPATIBILITY_THRESHOLD: f64 = 0.6;
pub const DEFAULT_STEP_SIZE: f64 = 0.1;
pub const DEFAULT_EDGE_STIFFNESS: f64 = 0.9;
pub const DEFAULT_ITERATIONS_COUNT: usize = 90;
pub const DEFAULT_CYCLES_COUNT: usize = 6;
pub const DEFAULT_SUBDIVISION_POINTS: usize = 1;
pub const DEFAULT_ITERATIONS_DECAY_RATE: f64 = 0.666;
pub const DEFAULT_SUBDIVISION_GROWTH_RATE: f64 = 2.0;

pub const COMPATIBILITY_RANGE: (f64, f64) = (0.0, 1.0);
pub const STEP_SIZE_RANGE: (f64, f64) = (0.0, 3.0);
pub const EDGE_STIFFNESS_RANGE: (f64, f64) = (0.0, 1.0);
pub const MAX_ITERATIONS_COUNT: usize = 400;
pub const MAX_CYCLES_COUNT: usize = 20;

// Thresholds past which a run is expected to take noticeably long.
const SLOW_COMPATIBILITY_THRESHOLD: f64 = 0.3;
const SLOW_CYCLES_COUNT: usize = 10;
const SLOW_ITERATIONS_COUNT: usize = 250;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("compatibility threshold {0} is outside [0, 1]")]
    CompatibilityThreshold(f64),
    #[error("step size {0} is outside [0, 3]")]
    StepSize(f64),
    #[error("edge stiffness {0} is outside [0, 1]")]
    EdgeStiffness(f64),
    #[error("iterations count {0} exceeds {MAX_ITERATIONS_COUNT}")]
    IterationsCount(usize),
    #[error("cycles count {0} exceeds {MAX_CYCLES_COUNT}")]
    CyclesCount(usize),
    #[error("initial subdivision points must be at least 1")]
    InitialSubdivisionPoints,
    #[error("iterations decay rate {0} is outside (0, 1]")]
    IterationsDecayRate(f64),
    #[error("subdivision growth rate {0} must be at least 1")]
    SubdivisionGrowthRate(f64),
}

/// Parameters of one bundling run. Immutable once the run starts.
///
/// The core does not check ranges. Out-of-range values still run: a negative
/// step size pushes points away from their bundles, zero cycles leaves the
/// initial subdivision untouched. Callers wanting strict input use
/// [`BundlingConfig::validate`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BundlingConfig {
    pub compatibility_threshold: f64,
    pub step_size: f64,
    pub edge_stiffness: f64,
    pub iterations_count: usize,
    pub cycles_count: usize,
    pub initial_subdivision_points: usize,
    pub iterations_decay_rate: f64,
    pub subdivision_growth_rate: f64,
}

impl Default for BundlingConfig {
    fn default() -> Self {
        Self {
            compatibility_threshold: DEFAULT_COMPATIBILITY_THRESHOLD,
            step_size: DEFAULT_STEP_SIZE,
            edge_stiffness: DEFAULT_EDGE_STIFFNESS,
            iterations_count: DEFAULT_ITERATIONS_COUNT,
            cycles_count: DEFAULT_CYCLES_COUNT,
            initial_subdivision_points: DEFAULT_SUBDIVISION_POINTS,
            iterations_decay_rate: DEFAULT_ITERATIONS_DECAY_RATE,
            subdivision_growth_rate: DEFAULT_SUBDIVISION_GROWTH_RATE,
        }
    }
}

impl BundlingConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !in_range(self.compatibility_threshold, COMPATIBILITY_RANGE) {
            return Err(ConfigError::CompatibilityThreshold(self.compatibility_threshold));
        }
        if !in_range(self.step_size, STEP_SIZE_RANGE) {
            return Err(ConfigError::StepSize(self.step_size));
        }
        if !in_range(self.edge_stiffness, EDGE_STIFFNESS_RANGE) {
            return Err(ConfigError::EdgeStiffness(self.edge_stiffness));
        }
        if self.iterations_count > MAX_ITERATIONS_COUNT {
            return Err(ConfigError::IterationsCount(self.iterations_count));
        }
        if self.cycles_count > MAX_CYCLES_COUNT {
            return Err(ConfigError::CyclesCount(self.cycles_count));
        }
        if self.initial_subdivision_points == 0 {
            return Err(ConfigError::InitialSubdivisionPoints);
        }
        let decay = self.iterations_decay_rate;
        if decay.is_nan() || decay <= 0.0 || decay > 1.0 {
            return Err(ConfigError::IterationsDecayRate(decay));
        }
        let growth = self.subdivision_growth_rate;
        if growth.is_nan() || growth < 1.0 {
            return Err(ConfigError::SubdivisionGrowthRate(growth));
        }
        Ok(())
    }

    /// Human-readable notes for settings that make a run slow.
    pub fn advisories(&self) -> Vec<String> {
        let mut notes = Vec::new();
        if self.compatibility_threshold < SLOW_COMPATIBILITY_THRESHOLD {
            notes.push(format!(
                "compatibility threshold ({:.2}) is low, computation might take some time",
                self.compatibility_threshold
            ));
        }
        if self.cycles_count > SLOW_CYCLES_COUNT {
            notes.push(format!(
                "number of cycles ({}) is high, computation might take some time",
                self.cycles_count
            ));
        }
        if self.iterations_count > SLOW_ITERATIONS_COUNT {
            notes.push(format!(
                "number of iterations ({}) is high, computation might take some time",
                self.iterations_count
            ));
        }
        notes
    }
}

fn in_range(value: f64, (lo, hi): (f64, f64)) -> bool {
    value >= lo && value <= hi
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderConfig {
    pub width: f32,
    pub height: f32,
    pub padding: f32,
    pub background: String,
    pub show_nodes: bool,
    pub show_labels: bool,
    pub smooth: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            width: 1600.0,
            height: 700.0,
            padding: 20.0,
            background: "#FFFFFF".to_string(),
            show_nodes: true,
            show_labels: false,
            smooth: true,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub theme: Theme,
    pub bundling: BundlingConfig,
    pub render: RenderConfig,
}

impl Default for Config {
    fn default() -> Self {
        let theme = Theme::classic();
        let render = RenderConfig {
            background: theme.background.clone(),
            ..Default::default()
        };
        Self {
            theme,
            bundling: BundlingConfig::default(),
            render,
        }
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct BundlingConfigFile {
    compatibility_threshold: Option<f64>,
    step_size: Option<f64>,
    edge_stiffness: Option<f64>,
    iterations_count: Option<usize>,
    cycles_count: Option<usize>,
    initial_subdivision_points: Option<usize>,
    iterations_decay_rate: Option<f64>,
    subdivision_growth_rate: Option<f64>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct RenderConfigFile {
    width: Option<f32>,
    height: Option<f32>,
    padding: Option<f32>,
    show_nodes: Option<bool>,
    show_labels: Option<bool>,
    smooth: Option<bool>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct ThemeVariables {
    background: Option<String>,
    edge_color: Option<String>,
    edge_opacity: Option<f32>,
    edge_width: Option<f32>,
    node_color: Option<String>,
    node_radius: Option<f32>,
    font_family: Option<String>,
    font_size: Option<f32>,
    label_color: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct ConfigFile {
    theme: Option<String>,
    theme_variables: Option<ThemeVariables>,
    bundling: Option<BundlingConfigFile>,
    render: Option<RenderConfigFile>,
}

pub fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    let Some(path) = path else {
        return Ok(Config::default());
    };
    let contents = std::fs::read_to_string(path)?;
    parse_config(&contents)
}

/// Parses a config document. Strict JSON is tried first, JSON5 (comments,
/// trailing commas) second.
pub fn parse_config(contents: &str) -> anyhow::Result<Config> {
    let parsed: ConfigFile = match serde_json::from_str(contents) {
        Ok(parsed) => parsed,
        Err(json_err) => json5::from_str(contents)
            .map_err(|_| anyhow::anyhow!("invalid config file: {json_err}"))?,
    };

    let mut config = Config::default();

    if let Some(theme_name) = parsed.theme.as_deref() {
        config.theme = Theme::from_name(theme_name)
            .ok_or_else(|| anyhow::anyhow!("unknown theme '{theme_name}'"))?;
    }

    if let Some(vars) = parsed.theme_variables {
        if let Some(v) = vars.background {
            config.theme.background = v;
        }
        if let Some(v) = vars.edge_color {
            config.theme.edge_color = v;
        }
        if let Some(v) = vars.edge_opacity {
            config.theme.edge_opacity = v;
        }
        if let Some(v) = vars.edge_width {
            config.theme.edge_width = v;
        }
        if let Some(v) = vars.node_color {
            config.theme.node_color = v;
        }
        if let Some(v) = vars.node_radius {
            config.theme.node_radius = v;
        }
        if let Some(v) = vars.font_family {
            config.theme.font_family = v;
        }
        if let Some(v) = vars.font_size {
            config.theme.font_size = v;
        }
        if let Some(v) = vars.label_color {
            config.theme.label_color = v;
        }
    }

    if let Some(bundling) = parsed.bundling {
        if let Some(v) = bundling.compatibility_threshold {
            config.bundling.compatibility_threshold = v;
        }
        if let Some(v) = bundling.step_size {
            config.bundling.step_size = v;
        }
        if let Some(v) = bundling.edge_stiffness {
            config.bundling.edge_stiffness = v;
        }
        if let Some(v) = bundling.iterations_count {
            config.bundling.iterations_count = v;
        }
        if let Some(v) = bundling.cycles_count {
            config.bundling.cycles_count = v;
        }
        if let Some(v) = bundling.initial_subdivision_points {
            config.bundling.initial_subdivision_points = v;
        }
        if let Some(v) = bundling.iterations_decay_rate {
            config.bundling.iterations_decay_rate = v;
        }
        if let Some(v) = bundling.subdivision_growth_rate {
            config.bundling.subdivision_growth_rate = v;
        }
    }

    if let Some(render) = parsed.render {
        if let Some(v) = render.width {
            config.render.width = v;
        }
        if let Some(v) = render.height {
            config.render.height = v;
        }
        if let Some(v) = render.padding {
            config.render.padding = v;
        }
        if let Some(v) = render.show_nodes {
            config.render.show_nodes = v;
        }
        if let Some(v) = render.show_labels {
            config.render.show_labels = v;
        }
        if let Some(v) = render.smooth {
            config.render.smooth = v;
        }
    }

    config.render.background = config.theme.background.clone();

    Ok(config)
}
