use thiserror::Error;

/// Authoring defects found when checking a script against its graph.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScriptError {
  #[error("step {step} references unknown node '{node_id}'")]
  UnknownNode { step: usize, node_id: String },

  #[error("step {step} references unknown edge '{edge_id}'")]
  UnknownEdge { step: usize, edge_id: String },

  #[error("tick {tick} writes contradictory values to {target}")]
  ConflictingWrites { tick: usize, target: String },
}
