use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BundleError {
    #[error("bundling run was cancelled")]
    Cancelled,
    #[error("edge {edge} references missing node {node}")]
    InvalidEdge { edge: usize, node: usize },
}
