use crate::bundle::RunStats;
use crate::config::BundlingConfig;
use crate::ir::Graph;
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

#[derive(Debug, Serialize)]
pub struct BundleDump {
    pub config: BundlingConfig,
    pub stats: Option<StatsDump>,
    pub nodes: Vec<NodeDump>,
    pub edges: Vec<EdgeDump>,
}

#[derive(Debug, Serialize)]
pub struct StatsDump {
    pub cycles: usize,
    pub iterations: usize,
    pub compatible_pairs: usize,
    pub subdivision_points: usize,
}

#[derive(Debug, Serialize)]
pub struct NodeDump {
    pub id: i64,
    pub name: String,
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Serialize)]
pub struct EdgeDump {
    pub id: i64,
    pub from: i64,
    pub to: i64,
    pub compatible: Vec<i64>,
    pub points: Vec<[f64; 2]>,
}

impl BundleDump {
    pub fn from_graph(graph: &Graph, config: &BundlingConfig, stats: Option<&RunStats>) -> Self {
        let nodes = graph
            .nodes
            .iter()
            .map(|node| NodeDump {
                id: node.id,
                name: node.name.clone(),
                x: node.position.x,
                y: node.position.y,
            })
            .collect();

        let edges = graph
            .edges
            .iter()
            .map(|edge| EdgeDump {
                id: edge.id,
                from: graph.nodes[edge.from].id,
                to: graph.nodes[edge.to].id,
                compatible: edge
                    .compatible_edges
                    .iter()
                    .map(|&idx| graph.edges[idx].id)
                    .collect(),
                points: edge.subdivision_points.iter().map(|p| [p.x, p.y]).collect(),
            })
            .collect();

        BundleDump {
            config: *config,
            stats: stats.map(|stats| StatsDump {
                cycles: stats.cycles,
                iterations: stats.iterations,
                compatible_pairs: stats.compatible_pairs,
                subdivision_points: stats.subdivision_points,
            }),
            nodes,
            edges,
        }
    }
}

pub fn write_bundle_dump_to<W: Write>(
    writer: W,
    graph: &Graph,
    config: &BundlingConfig,
    stats: Option<&RunStats>,
) -> anyhow::Result<()> {
    let dump = BundleDump::from_graph(graph, config, stats);
    serde_json::to_writer_pretty(writer, &dump)?;
    Ok(())
}

pub fn write_bundle_dump(
    path: &Path,
    graph: &Graph,
    config: &BundlingConfig,
    stats: Option<&RunStats>,
) -> anyhow::Result<()> {
    let file = File::create(path)?;
    write_bundle_dump_to(BufWriter::new(file), graph, config, stats)
}
