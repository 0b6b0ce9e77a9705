use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
  #[error("duplicate node id: {0}")]
  DuplicateNode(String),

  #[error("duplicate edge id: {0}")]
  DuplicateEdge(String),

  #[error("edge '{edge_id}' references unknown node: source={source_id}, target={target_id}")]
  InvalidEdge {
    edge_id: String,
    source_id: String,
    target_id: String,
  },

  #[error("no entry points found (all nodes have incoming edges)")]
  NoEntryPoints,
}
