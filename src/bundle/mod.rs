//! Force-directed edge bundling.
//!
//! A run scores every pair of straight edges once, then relaxes the edges in
//! cycles. Each cycle runs a number of force iterations, after which the step
//! size is halved, the iteration count decays and every polyline is
//! resampled at a higher resolution.

pub mod compatibility;
pub mod error;
pub mod events;
pub mod forces;
pub mod subdivision;

use std::thread::{self, JoinHandle};

use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::config::BundlingConfig;
use crate::ir::Graph;

pub use error::BundleError;
pub use events::{BundleEvent, CancelToken, EventSink, FnSink, NoopSink};

// Settings past which the run is logged as potentially slow.
const LONG_RUN_CYCLES: usize = 15;
const LONG_RUN_ITERATIONS: usize = 300;

/// Summary of a finished run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStats {
    pub cycles: usize,
    pub iterations: usize,
    pub compatible_pairs: usize,
    pub subdivision_points: usize,
}

/// Runs the bundling schedule over a graph. One run per call, nothing is
/// shared between runs.
#[derive(Debug, Clone, Default)]
pub struct Bundler {
    config: BundlingConfig,
    cancel: CancelToken,
}

impl Bundler {
    pub fn new(config: BundlingConfig) -> Self {
        Self {
            config,
            cancel: CancelToken::new(),
        }
    }

    pub fn with_cancel_token(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn config(&self) -> &BundlingConfig {
        &self.config
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Bundles `graph` in place and reports progress to `sink`.
    ///
    /// On success every edge holds its final polyline and `sink` has seen
    /// exactly one [`BundleEvent::Finished`]. A cancelled run stops between
    /// iterations, leaves the polylines mid-relaxation and never reports
    /// `Finished`.
    pub fn run(&self, graph: &mut Graph, sink: &dyn EventSink) -> Result<RunStats, BundleError> {
        if let Some((edge, node)) = graph.dangling_endpoint() {
            return Err(BundleError::InvalidEdge { edge, node });
        }

        let cfg = &self.config;
        info!(
            nodes = graph.nodes.len(),
            edges = graph.edges.len(),
            step_size = cfg.step_size,
            stiffness = cfg.edge_stiffness,
            compatibility = cfg.compatibility_threshold,
            subdivision_points = cfg.initial_subdivision_points,
            iterations = cfg.iterations_count,
            cycles = cfg.cycles_count,
            "starting edge bundling"
        );
        if cfg.cycles_count > LONG_RUN_CYCLES || cfg.iterations_count > LONG_RUN_ITERATIONS {
            warn!("high number of iterations or cycles, bundling might run for a long time");
        }

        let segments = graph.segments();
        let edge_lengths: Vec<f64> = segments.iter().map(|segment| segment.length()).collect();

        let mut step_size = cfg.step_size;
        let mut iterations_count = cfg.iterations_count as f64;
        let mut subdivision_target = cfg.initial_subdivision_points as f64;
        let mut subdivision_points = cfg.initial_subdivision_points;

        graph
            .edges
            .par_iter_mut()
            .zip(segments.par_iter())
            .for_each(|(edge, segment)| {
                edge.subdivision_points =
                    subdivision::resample(&[segment.from, segment.to], subdivision_points);
            });

        let adjacency =
            compatibility::compute_compatibility(&segments, cfg.compatibility_threshold);
        let compatible_pairs = adjacency.iter().map(Vec::len).sum::<usize>() / 2;
        for (edge, compatible) in graph.edges.iter_mut().zip(adjacency) {
            edge.compatible_edges = compatible;
        }
        info!(compatible_pairs, "compatibility computed");

        let mut stats = RunStats {
            compatible_pairs,
            subdivision_points,
            ..Default::default()
        };

        for cycle in 0..cfg.cycles_count {
            info!(cycle, step_size, subdivision_points, "cycle started");

            let mut iteration = 0usize;
            while (iteration as f64) < iterations_count {
                if self.cancel.is_cancelled() {
                    info!(cycle, iteration, "bundling cancelled");
                    return Err(BundleError::Cancelled);
                }
                if iteration % 10 == 0 {
                    debug!(cycle, iteration, "iteration");
                }
                forces::iterate(&mut graph.edges, &edge_lengths, cfg.edge_stiffness, step_size);
                sink.emit(BundleEvent::Progress { iteration, cycle });
                iteration += 1;
                stats.iterations += 1;
            }

            step_size /= 2.0;
            iterations_count *= cfg.iterations_decay_rate;
            subdivision_target *= cfg.subdivision_growth_rate;
            subdivision_points = subdivision_target.round().max(0.0) as usize;
            subdivision::subdivide_all(&mut graph.edges, subdivision_points);

            stats.cycles += 1;
            stats.subdivision_points = subdivision_points;
        }

        if self.cancel.is_cancelled() {
            return Err(BundleError::Cancelled);
        }

        info!(
            cycles = stats.cycles,
            iterations = stats.iterations,
            subdivision_points = stats.subdivision_points,
            "edge bundling finished"
        );
        sink.emit(BundleEvent::Finished {
            nodes: graph.nodes.clone(),
            edges: graph.edges.clone(),
        });
        Ok(stats)
    }
}

/// Bundles `graph` with `config`, without progress reporting.
pub fn bundle(graph: &mut Graph, config: &BundlingConfig) -> Result<RunStats, BundleError> {
    Bundler::new(*config).run(graph, &NoopSink)
}

/// Runs a bundler on a dedicated worker thread. The bundled graph is
/// returned through the join handle; progress goes to `sink`.
pub fn spawn_bundler<S>(
    mut graph: Graph,
    bundler: Bundler,
    sink: S,
) -> JoinHandle<Result<(Graph, RunStats), BundleError>>
where
    S: EventSink + Send + 'static,
{
    thread::spawn(move || {
        let stats = bundler.run(&mut graph, &sink)?;
        Ok((graph, stats))
    })
}
