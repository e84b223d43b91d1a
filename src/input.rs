//! Graph loaders for the GraphML subset used by flight/migration datasets and
//! for a plain JSON node/edge list.

use std::collections::HashMap;
use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info};

use crate::geometry::Vector2;
use crate::ir::Graph;
use crate::projection::{CanvasProjection, CanvasRect, LatLng};

static KEY_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"<key\b([^>]*?)/?>").unwrap());
static NODE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)<node\b([^>]*?)(?:/>|>(.*?)</node>)").unwrap());
static EDGE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)<edge\b([^>]*?)(?:/>|>(.*?)</edge>)").unwrap());
static DATA_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)<data\b([^>]*?)>(.*?)</data>").unwrap());
static ATTR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"([\w.:-]+)\s*=\s*(?:"([^"]*)"|'([^']*)')"#).unwrap());
static AIRPORT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r"^\s*(?P<name>[^(]*?)\s*\(",
        r"\s*lngx\s*=\s*(?P<lng>[-+0-9.eE]+)\s*,",
        r"\s*laty\s*=\s*(?P<lat>[-+0-9.eE]+)\s*\)",
    ))
    .unwrap()
});

const MIGRATION_SCALE: f64 = 10.0;

#[derive(Debug, Error)]
pub enum InputError {
    #[error("invalid JSON graph: {0}")]
    Json(#[from] serde_json::Error),
    #[error("<{element}> is missing the '{attribute}' attribute")]
    MissingAttribute {
        element: &'static str,
        attribute: &'static str,
    },
    #[error("{element} id '{value}' is not a non-negative integer")]
    InvalidId { element: &'static str, value: String },
    #[error("'{value}' is not a number")]
    InvalidNumber { value: String },
    #[error("node {node} has no usable coordinates")]
    MissingCoordinates { node: usize },
    #[error("{element} ids must be contiguous from 0: expected {expected}, found {found}")]
    NonContiguousIds {
        element: &'static str,
        expected: usize,
        found: usize,
    },
    #[error("edge {edge} references unknown node {node}")]
    UnknownNode { edge: usize, node: usize },
    #[error("graph mixes geographic and planar node coordinates")]
    MixedCoordinates,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Coordinates {
    Planar(Vector2),
    Geographic(LatLng),
}

#[derive(Debug, Clone, PartialEq)]
pub struct RawNode {
    pub id: usize,
    pub name: String,
    pub coordinates: Coordinates,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawEdge {
    pub id: usize,
    pub source: usize,
    pub target: usize,
}

/// Loaded graph before projection, nodes and edges sorted by id.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawGraph {
    pub nodes: Vec<RawNode>,
    pub edges: Vec<RawEdge>,
}

impl RawGraph {
    pub fn is_geographic(&self) -> bool {
        self.nodes
            .iter()
            .any(|node| matches!(node.coordinates, Coordinates::Geographic(_)))
    }

    /// Builds the node arena. Geographic coordinates are fitted into
    /// `canvas`; planar ones are taken as canvas units already. Fails on an
    /// edge whose endpoint is not in the node list.
    pub fn into_graph(self, canvas: CanvasRect) -> Result<Graph, InputError> {
        let geo: Vec<LatLng> = self
            .nodes
            .iter()
            .filter_map(|node| match node.coordinates {
                Coordinates::Geographic(c) => Some(c),
                Coordinates::Planar(_) => None,
            })
            .collect();
        let projection = CanvasProjection::fit(canvas, &geo);

        let mut graph = Graph::new();
        for node in self.nodes {
            let position = match (node.coordinates, projection.as_ref()) {
                (Coordinates::Planar(p), _) => p,
                (Coordinates::Geographic(c), Some(projection)) => projection.project(c),
                (Coordinates::Geographic(_), None) => Vector2::ZERO,
            };
            graph.add_node(node.name, position);
        }
        for edge in self.edges {
            for node in [edge.source, edge.target] {
                if node >= graph.nodes.len() {
                    return Err(InputError::UnknownNode {
                        edge: edge.id,
                        node,
                    });
                }
            }
            graph.add_edge(edge.source, edge.target);
        }
        Ok(graph)
    }
}

/// Picks the loader from the file extension: `.graphml`/`.xml` are GraphML,
/// anything else is JSON.
pub fn load_graph_file(path: &Path) -> anyhow::Result<RawGraph> {
    let contents = std::fs::read_to_string(path)?;
    let is_graphml = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|ext| matches!(ext.to_ascii_lowercase().as_str(), "graphml" | "xml"))
        .unwrap_or(false);
    let raw = if is_graphml {
        load_graphml(&contents)?
    } else {
        load_json(&contents)?
    };
    info!(
        path = %path.display(),
        nodes = raw.nodes.len(),
        edges = raw.edges.len(),
        geographic = raw.is_geographic(),
        "graph loaded"
    );
    Ok(raw)
}

pub fn load_graphml(input: &str) -> Result<RawGraph, InputError> {
    let mut key_names = HashMap::new();
    for caps in KEY_RE.captures_iter(input) {
        let attrs = parse_attrs(&caps[1]);
        if let (Some(id), Some(name)) = (attrs.get("id"), attrs.get("attr.name")) {
            key_names.insert(id.clone(), name.clone());
        }
    }

    let mut nodes = Vec::new();
    for caps in NODE_RE.captures_iter(input) {
        let attrs = parse_attrs(&caps[1]);
        let raw_id = attrs.get("id").ok_or(InputError::MissingAttribute {
            element: "node",
            attribute: "id",
        })?;
        let id = parse_id("node", raw_id)?;
        let body = caps.get(2).map(|m| m.as_str()).unwrap_or("");
        let data = parse_data(body, &key_names);
        nodes.push(node_from_data(id, &data)?);
    }

    let mut edges = Vec::new();
    for (order, caps) in EDGE_RE.captures_iter(input).enumerate() {
        let attrs = parse_attrs(&caps[1]);
        let id = match attrs.get("id") {
            Some(raw) => parse_id("edge", raw)?,
            None => order,
        };
        let source = attrs.get("source").ok_or(InputError::MissingAttribute {
            element: "edge",
            attribute: "source",
        })?;
        let target = attrs.get("target").ok_or(InputError::MissingAttribute {
            element: "edge",
            attribute: "target",
        })?;
        edges.push(RawEdge {
            id,
            source: parse_id("node", source)?,
            target: parse_id("node", target)?,
        });
    }

    debug!(keys = key_names.len(), nodes = nodes.len(), edges = edges.len(), "graphml parsed");
    finish(nodes, edges)
}

#[derive(Debug, Deserialize)]
struct JsonGraph {
    #[serde(default)]
    nodes: Vec<JsonNode>,
    #[serde(default)]
    edges: Vec<JsonEdge>,
}

#[derive(Debug, Deserialize)]
struct JsonNode {
    id: Option<usize>,
    name: Option<String>,
    x: Option<f64>,
    y: Option<f64>,
    lat: Option<f64>,
    lng: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct JsonEdge {
    id: Option<usize>,
    #[serde(alias = "source")]
    from: usize,
    #[serde(alias = "target")]
    to: usize,
}

pub fn load_json(input: &str) -> Result<RawGraph, InputError> {
    let parsed: JsonGraph = serde_json::from_str(input)?;
    let mut nodes = Vec::with_capacity(parsed.nodes.len());
    for (order, node) in parsed.nodes.into_iter().enumerate() {
        let id = node.id.unwrap_or(order);
        let coordinates = match (node.x, node.y, node.lat, node.lng) {
            (Some(x), Some(y), _, _) => Coordinates::Planar(Vector2::new(x, y)),
            (_, _, Some(lat), Some(lng)) => Coordinates::Geographic(LatLng::new(lat, lng)),
            _ => return Err(InputError::MissingCoordinates { node: id }),
        };
        nodes.push(RawNode {
            id,
            name: node.name.unwrap_or_else(|| id.to_string()),
            coordinates,
        });
    }
    let edges = parsed
        .edges
        .into_iter()
        .enumerate()
        .map(|(order, edge)| RawEdge {
            id: edge.id.unwrap_or(order),
            source: edge.from,
            target: edge.to,
        })
        .collect();
    finish(nodes, edges)
}

fn finish(mut nodes: Vec<RawNode>, mut edges: Vec<RawEdge>) -> Result<RawGraph, InputError> {
    nodes.sort_by_key(|node| node.id);
    edges.sort_by_key(|edge| edge.id);
    check_contiguous("node", nodes.iter().map(|node| node.id))?;
    check_contiguous("edge", edges.iter().map(|edge| edge.id))?;

    for edge in &edges {
        for node in [edge.source, edge.target] {
            if node >= nodes.len() {
                return Err(InputError::UnknownNode {
                    edge: edge.id,
                    node,
                });
            }
        }
    }

    let geographic = nodes
        .iter()
        .filter(|node| matches!(node.coordinates, Coordinates::Geographic(_)))
        .count();
    if geographic != 0 && geographic != nodes.len() {
        return Err(InputError::MixedCoordinates);
    }

    Ok(RawGraph { nodes, edges })
}

fn check_contiguous(
    element: &'static str,
    sorted_ids: impl Iterator<Item = usize>,
) -> Result<(), InputError> {
    for (expected, found) in sorted_ids.enumerate() {
        if expected != found {
            return Err(InputError::NonContiguousIds {
                element,
                expected,
                found,
            });
        }
    }
    Ok(())
}

fn node_from_data(id: usize, data: &HashMap<String, String>) -> Result<RawNode, InputError> {
    if let Some(tooltip) = data.get("tooltip") {
        if let Some(caps) = AIRPORT_RE.captures(tooltip) {
            let lng = parse_number(&caps["lng"])?;
            let lat = parse_number(&caps["lat"])?;
            return Ok(RawNode {
                id,
                name: caps["name"].to_string(),
                coordinates: Coordinates::Geographic(LatLng::new(lat, lng)),
            });
        }
    }

    let (Some(x), Some(y)) = (data.get("x"), data.get("y")) else {
        return Err(InputError::MissingCoordinates { node: id });
    };
    let name = data
        .get("tooltip")
        .or_else(|| data.get("name"))
        .or_else(|| data.get("label"))
        .cloned()
        .unwrap_or_else(|| id.to_string());
    Ok(RawNode {
        id,
        name,
        coordinates: Coordinates::Geographic(migration_coordinates(
            parse_number(x)?,
            parse_number(y)?,
        )),
    })
}

/// Migration datasets store map-like x/y with y growing southwards, at ten
/// times the degree scale. They are read as latitude/longitude so they get
/// fitted into the canvas like airline data.
fn migration_coordinates(x: f64, y: f64) -> LatLng {
    LatLng::new(-y / MIGRATION_SCALE, x / MIGRATION_SCALE)
}

fn parse_attrs(raw: &str) -> HashMap<String, String> {
    ATTR_RE
        .captures_iter(raw)
        .map(|caps| {
            let value = caps.get(2).or_else(|| caps.get(3)).map(|m| m.as_str()).unwrap_or("");
            (caps[1].to_string(), unescape_xml(value))
        })
        .collect()
}

fn parse_data(body: &str, key_names: &HashMap<String, String>) -> HashMap<String, String> {
    let mut data = HashMap::new();
    for caps in DATA_RE.captures_iter(body) {
        let attrs = parse_attrs(&caps[1]);
        let Some(key) = attrs.get("key") else {
            continue;
        };
        let name = key_names.get(key).unwrap_or(key).clone();
        data.insert(name, unescape_xml(caps[2].trim()));
    }
    data
}

fn parse_id(element: &'static str, raw: &str) -> Result<usize, InputError> {
    raw.trim().parse::<usize>().map_err(|_| InputError::InvalidId {
        element,
        value: raw.to_string(),
    })
}

fn parse_number(raw: &str) -> Result<f64, InputError> {
    raw.trim().parse::<f64>().map_err(|_| InputError::InvalidNumber {
        value: raw.to_string(),
    })
}

fn unescape_xml(input: &str) -> String {
    input
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use super::*;

    const AIRLINES: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<graphml xmlns="http://graphml.graphdrawing.org/xmlns">
  <key attr.name="tooltip" attr.type="string" for="node" id="tooltip"/>
  <graph edgedefault="directed">
    <node id="1">
      <data key="tooltip">JFK(lngx=-73.778925,laty=40.639751)</data>
    </node>
    <node id="0">
      <data key="tooltip">SEA(lngx=-122.311778,laty=47.449889)</data>
    </node>
    <edge id="0" source="1" target="0"/>
    <edge source="0" target="1" id="1"></edge>
  </graph>
</graphml>"#;

    #[test]
    fn parses_airline_tooltips() {
        let raw = load_graphml(AIRLINES).unwrap();
        assert_eq!(raw.nodes.len(), 2);
        assert_eq!(raw.nodes[0].name, "SEA");
        assert_eq!(
            raw.nodes[0].coordinates,
            Coordinates::Geographic(LatLng::new(47.449889, -122.311778))
        );
        assert_eq!(raw.edges[0], RawEdge { id: 0, source: 1, target: 0 });
        assert_eq!(raw.edges[1], RawEdge { id: 1, source: 0, target: 1 });
        assert!(raw.is_geographic());
    }

    #[test]
    fn resolves_data_keys_for_planar_nodes() {
        let input = r#"<graphml>
  <key id="d0" for="node" attr.name="x"/>
  <key id="d1" for="node" attr.name="y"/>
  <key id="d2" for="node" attr.name="tooltip"/>
  <graph>
    <node id="0">
      <data key="d0">10.5</data><data key="d1">-3</data><data key="d2">A &amp; B</data>
    </node>
    <node id="1"><data key="d0">20</data><data key="d1">4</data></node>
    <edge source="0" target="1"/>
  </graph>
</graphml>"#;
        let raw = load_graphml(input).unwrap();
        assert_eq!(raw.nodes[0].name, "A & B");
        assert_eq!(
            raw.nodes[0].coordinates,
            Coordinates::Geographic(LatLng::new(0.3, 1.05))
        );
        assert_eq!(raw.nodes[1].name, "1");
        assert_eq!(raw.edges, vec![RawEdge { id: 0, source: 0, target: 1 }]);
        assert!(raw.is_geographic());
    }

    #[test]
    fn migration_nodes_are_fitted_into_the_canvas() {
        let input = r#"<graphml>
  <key id="x" for="node" attr.name="x"/>
  <key id="y" for="node" attr.name="y"/>
  <graph>
    <node id="0"><data key="x">-9000</data><data key="y">-4000</data></node>
    <node id="1"><data key="x">12000</data><data key="y">6000</data></node>
    <node id="2"><data key="x">500</data><data key="y">100</data></node>
    <edge source="0" target="1"/>
  </graph>
</graphml>"#;
        let canvas = CanvasRect::default();
        let graph = load_graphml(input).unwrap().into_graph(canvas).unwrap();
        for node in &graph.nodes {
            let p = node.position;
            assert!(p.x >= canvas.top_left.x - 1e-9 && p.x <= canvas.bottom_right.x + 1e-9);
            assert!(p.y >= canvas.top_left.y - 1e-9 && p.y <= canvas.bottom_right.y + 1e-9);
        }
        // y grows downwards in the file and on the canvas
        let (a, b) = (graph.nodes[0].position, graph.nodes[1].position);
        assert!((a.x - 100.0).abs() < 1e-9 && (a.y - 50.0).abs() < 1e-9);
        assert!((b.x - 1500.0).abs() < 1e-9 && (b.y - 610.0).abs() < 1e-9);
    }

    #[test]
    fn hand_built_edge_to_missing_node_is_rejected() {
        let raw = RawGraph {
            nodes: vec![RawNode {
                id: 0,
                name: "only".to_string(),
                coordinates: Coordinates::Planar(Vector2::new(1.0, 2.0)),
            }],
            edges: vec![RawEdge { id: 4, source: 0, target: 1 }],
        };
        assert!(matches!(
            raw.into_graph(CanvasRect::default()),
            Err(InputError::UnknownNode { edge: 4, node: 1 })
        ));
    }

    #[test]
    fn rejects_gaps_in_node_ids() {
        let input = r#"<graphml><graph>
    <node id="0"><data key="x">0</data><data key="y">0</data></node>
    <node id="2"><data key="x">1</data><data key="y">1</data></node>
  </graph></graphml>"#;
        let err = load_graphml(input).unwrap_err();
        assert!(matches!(
            err,
            InputError::NonContiguousIds { element: "node", expected: 1, found: 2 }
        ));
    }

    #[test]
    fn rejects_edges_to_unknown_nodes() {
        let input = r#"{"nodes": [{"x": 0, "y": 0}], "edges": [{"from": 0, "to": 3}]}"#;
        assert!(matches!(
            load_json(input).unwrap_err(),
            InputError::UnknownNode { edge: 0, node: 3 }
        ));
    }

    #[test]
    fn json_accepts_source_target_aliases() {
        let input = r#"{
            "nodes": [
                {"id": 0, "name": "LAX", "lat": 33.94, "lng": -118.41},
                {"id": 1, "name": "ORD", "lat": 41.98, "lng": -87.90}
            ],
            "edges": [{"source": 0, "target": 1}]
        }"#;
        let raw = load_json(input).unwrap();
        assert!(raw.is_geographic());
        assert_eq!(raw.edges[0].target, 1);
        let graph = raw.into_graph(CanvasRect::default()).unwrap();
        assert_eq!(graph.nodes[0].name, "LAX");
        assert_eq!(graph.edges.len(), 1);
        // west coast lands left, the northern airport lands higher
        assert!(graph.nodes[0].position.x < graph.nodes[1].position.x);
        assert!(graph.nodes[0].position.y > graph.nodes[1].position.y);
    }

    #[test]
    fn mixed_coordinates_are_rejected() {
        let input = r#"{"nodes": [{"x": 0, "y": 0}, {"lat": 1, "lng": 2}], "edges": []}"#;
        assert!(matches!(load_json(input).unwrap_err(), InputError::MixedCoordinates));
    }

    #[test]
    fn missing_coordinates_are_reported() {
        let input = r#"{"nodes": [{"name": "nowhere"}]}"#;
        assert!(matches!(
            load_json(input).unwrap_err(),
            InputError::MissingCoordinates { node: 0 }
        ));
    }
}
