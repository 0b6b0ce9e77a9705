use std::fmt;

use loanflow_graph::{Graph, NodeStatus};
use serde::{Deserialize, Serialize};

/// A single change applied to a graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Mutation {
  /// Set a node's status.
  NodeStatus { node_id: String, status: NodeStatus },
  /// Raise or clear an edge's in-flight marker.
  EdgeActive { edge_id: String, active: bool },
}

/// What a mutation writes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Target<'a> {
  Node(&'a str),
  Edge(&'a str),
}

impl fmt::Display for Target<'_> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Target::Node(id) => write!(f, "node '{}'", id),
      Target::Edge(id) => write!(f, "edge '{}'", id),
    }
  }
}

impl Mutation {
  pub fn node(node_id: impl Into<String>, status: NodeStatus) -> Self {
    Mutation::NodeStatus {
      node_id: node_id.into(),
      status,
    }
  }

  pub fn edge(edge_id: impl Into<String>, active: bool) -> Self {
    Mutation::EdgeActive {
      edge_id: edge_id.into(),
      active,
    }
  }

  pub fn target(&self) -> Target<'_> {
    match self {
      Mutation::NodeStatus { node_id, .. } => Target::Node(node_id),
      Mutation::EdgeActive { edge_id, .. } => Target::Edge(edge_id),
    }
  }

  /// Apply to `graph` in place. Returns whether the target existed.
  pub fn apply(&self, graph: &mut Graph) -> bool {
    match self {
      Mutation::NodeStatus { node_id, status } => graph.set_node_status(node_id, *status),
      Mutation::EdgeActive { edge_id, active } => graph.set_edge_active(edge_id, *active),
    }
  }

  /// Whether two mutations write different values to the same target.
  pub fn contradicts(&self, other: &Mutation) -> bool {
    self.target() == other.target() && self != other
  }
}

impl fmt::Display for Mutation {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Mutation::NodeStatus { node_id, status } => {
        write!(f, "node {} -> {}", node_id, status.as_str())
      }
      Mutation::EdgeActive { edge_id, active } => {
        write!(f, "edge {} {}", edge_id, if *active { "on" } else { "off" })
      }
    }
  }
}
