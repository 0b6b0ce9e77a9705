use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::edge::Edge;
use crate::error::GraphError;
use crate::node::{Node, NodeStatus};
use crate::topology::Topology;

/// A workflow graph: nodes in z-order plus the edges between them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Graph {
  pub nodes: Vec<Node>,
  pub edges: Vec<Edge>,
}

impl Graph {
  pub fn new(nodes: Vec<Node>, edges: Vec<Edge>) -> Self {
    Self { nodes, edges }
  }

  /// Get a node by ID.
  pub fn node(&self, node_id: &str) -> Option<&Node> {
    self.nodes.iter().find(|n| n.id == node_id)
  }

  /// Get an edge by ID.
  pub fn edge(&self, edge_id: &str) -> Option<&Edge> {
    self.edges.iter().find(|e| e.id == edge_id)
  }

  pub fn contains_node(&self, node_id: &str) -> bool {
    self.node(node_id).is_some()
  }

  pub fn contains_edge(&self, edge_id: &str) -> bool {
    self.edge(edge_id).is_some()
  }

  /// Replace the status of the matching node.
  ///
  /// Returns `false` and leaves the graph untouched when no node matches.
  pub fn set_node_status(&mut self, node_id: &str, status: NodeStatus) -> bool {
    match self.nodes.iter_mut().find(|n| n.id == node_id) {
      Some(node) => {
        node.status = status;
        true
      }
      None => {
        report_unknown("node", node_id);
        false
      }
    }
  }

  /// Replace the active flag of the matching edge.
  ///
  /// Returns `false` and leaves the graph untouched when no edge matches.
  pub fn set_edge_active(&mut self, edge_id: &str, active: bool) -> bool {
    match self.edges.iter_mut().find(|e| e.id == edge_id) {
      Some(edge) => {
        edge.active = active;
        true
      }
      None => {
        report_unknown("edge", edge_id);
        false
      }
    }
  }

  /// Copy of this graph with one node's status replaced.
  pub fn with_node_status(&self, node_id: &str, status: NodeStatus) -> Graph {
    let mut next = self.clone();
    next.set_node_status(node_id, status);
    next
  }

  /// Copy of this graph with one edge's active flag replaced.
  pub fn with_edge_active(&self, edge_id: &str, active: bool) -> Graph {
    let mut next = self.clone();
    next.set_edge_active(edge_id, active);
    next
  }

  /// Edges currently conducting a transition, in declaration order.
  pub fn active_edges(&self) -> impl Iterator<Item = &Edge> {
    self.edges.iter().filter(|e| e.active)
  }

  pub fn nodes_with_status(&self, status: NodeStatus) -> impl Iterator<Item = &Node> {
    self.nodes.iter().filter(move |n| n.status == status)
  }

  /// Build the adjacency view for traversal.
  pub fn topology(&self) -> Topology {
    Topology::new(self)
  }

  /// Check structural consistency: unique ids, edges between known nodes,
  /// and at least one entry point.
  pub fn validate(&self) -> Result<(), GraphError> {
    let mut node_ids = HashSet::new();
    for node in &self.nodes {
      if !node_ids.insert(node.id.as_str()) {
        return Err(GraphError::DuplicateNode(node.id.clone()));
      }
    }

    let mut edge_ids = HashSet::new();
    for edge in &self.edges {
      if !edge_ids.insert(edge.id.as_str()) {
        return Err(GraphError::DuplicateEdge(edge.id.clone()));
      }
      if !node_ids.contains(edge.source.as_str()) || !node_ids.contains(edge.target.as_str()) {
        return Err(GraphError::InvalidEdge {
          edge_id: edge.id.clone(),
          source_id: edge.source.clone(),
          target_id: edge.target.clone(),
        });
      }
    }

    if !self.nodes.is_empty() && self.topology().entry_points().is_empty() {
      return Err(GraphError::NoEntryPoints);
    }

    Ok(())
  }
}

fn report_unknown(target: &str, id: &str) {
  if cfg!(debug_assertions) {
    warn!(target_kind = target, id = id, "mutation references unknown id");
  }
}
