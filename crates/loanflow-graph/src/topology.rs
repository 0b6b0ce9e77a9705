use std::collections::{HashMap, HashSet, VecDeque};

use crate::graph::Graph;

/// Adjacency view of a [`Graph`] for traversal and layout.
///
/// Lists preserve the graph's declaration order so that anything derived
/// from a topology (entry points, layers) is deterministic.
#[derive(Debug, Clone)]
pub struct Topology {
  /// Node ids in declaration order.
  order: Vec<String>,
  /// Adjacency list: node_id -> list of downstream node_ids.
  adjacency: HashMap<String, Vec<String>>,
  /// Reverse adjacency: node_id -> list of upstream node_ids.
  reverse_adjacency: HashMap<String, Vec<String>>,
  /// Nodes with no incoming edges.
  entry_points: Vec<String>,
  /// Nodes with multiple incoming edges (join points).
  join_points: HashSet<String>,
  /// Longest distance from an entry point. Nodes on a cycle are absent.
  depths: HashMap<String, usize>,
}

impl Topology {
  /// Build a topology from a graph's nodes and edges.
  ///
  /// Edges that reference unknown nodes are ignored here; `Graph::validate`
  /// reports them.
  pub fn new(graph: &Graph) -> Self {
    let order: Vec<String> = graph.nodes.iter().map(|n| n.id.clone()).collect();
    let mut adjacency: HashMap<String, Vec<String>> = HashMap::new();
    let mut reverse_adjacency: HashMap<String, Vec<String>> = HashMap::new();

    // Initialize all nodes
    for node_id in &order {
      adjacency.entry(node_id.clone()).or_default();
      reverse_adjacency.entry(node_id.clone()).or_default();
    }

    // Build adjacency lists
    for edge in &graph.edges {
      if !adjacency.contains_key(&edge.source) || !adjacency.contains_key(&edge.target) {
        continue;
      }
      adjacency
        .entry(edge.source.clone())
        .or_default()
        .push(edge.target.clone());
      reverse_adjacency
        .entry(edge.target.clone())
        .or_default()
        .push(edge.source.clone());
    }

    let entry_points: Vec<String> = order
      .iter()
      .filter(|id| reverse_adjacency.get(*id).is_none_or(|v| v.is_empty()))
      .cloned()
      .collect();

    let join_points: HashSet<String> = reverse_adjacency
      .iter()
      .filter(|(_, incoming)| incoming.len() > 1)
      .map(|(id, _)| id.clone())
      .collect();

    let depths = longest_path_depths(&order, &adjacency, &reverse_adjacency);

    Self {
      order,
      adjacency,
      reverse_adjacency,
      entry_points,
      join_points,
      depths,
    }
  }

  /// Get entry points (nodes with no incoming edges).
  pub fn entry_points(&self) -> &[String] {
    &self.entry_points
  }

  /// Get downstream nodes for a given node.
  pub fn downstream(&self, node_id: &str) -> &[String] {
    self
      .adjacency
      .get(node_id)
      .map(|v| v.as_slice())
      .unwrap_or(&[])
  }

  /// Get upstream nodes for a given node.
  pub fn upstream(&self, node_id: &str) -> &[String] {
    self
      .reverse_adjacency
      .get(node_id)
      .map(|v| v.as_slice())
      .unwrap_or(&[])
  }

  /// Check if a node is a join point (has multiple incoming edges).
  pub fn is_join_point(&self, node_id: &str) -> bool {
    self.join_points.contains(node_id)
  }

  /// Longest path length from any entry point, or `None` for unknown nodes
  /// and nodes that sit on a cycle.
  pub fn depth(&self, node_id: &str) -> Option<usize> {
    self.depths.get(node_id).copied()
  }

  /// Group nodes into stage columns by depth, keeping declaration order
  /// within each column. Nodes without a depth are left out.
  pub fn layers(&self) -> Vec<Vec<String>> {
    let width = self.depths.values().max().map(|d| d + 1).unwrap_or(0);
    let mut layers: Vec<Vec<String>> = vec![Vec::new(); width];
    for node_id in &self.order {
      if let Some(depth) = self.depths.get(node_id) {
        layers[*depth].push(node_id.clone());
      }
    }
    layers
  }
}

/// Kahn's algorithm, relaxing each node's depth to the maximum over its
/// upstream nodes.
fn longest_path_depths(
  order: &[String],
  adjacency: &HashMap<String, Vec<String>>,
  reverse_adjacency: &HashMap<String, Vec<String>>,
) -> HashMap<String, usize> {
  let mut remaining: HashMap<&str, usize> = order
    .iter()
    .map(|id| (id.as_str(), reverse_adjacency.get(id).map_or(0, |v| v.len())))
    .collect();
  let mut depths: HashMap<String, usize> = HashMap::new();
  let mut queue: VecDeque<&str> = order
    .iter()
    .filter(|id| remaining.get(id.as_str()) == Some(&0))
    .map(|id| id.as_str())
    .collect();

  for id in &queue {
    depths.insert(id.to_string(), 0);
  }

  while let Some(id) = queue.pop_front() {
    let depth = depths.get(id).copied().unwrap_or(0);
    for next in adjacency.get(id).map(|v| v.as_slice()).unwrap_or(&[]) {
      let entry = depths.entry(next.clone()).or_insert(0);
      *entry = (*entry).max(depth + 1);
      if let Some(count) = remaining.get_mut(next.as_str()) {
        *count -= 1;
        if *count == 0 {
          queue.push_back(next.as_str());
        }
      }
    }
  }

  // Anything still waiting on an upstream node is part of a cycle.
  depths.retain(|id, _| remaining.get(id.as_str()) == Some(&0));
  depths
}
