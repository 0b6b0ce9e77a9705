//! Authoring-time checks for scripts.
//!
//! These run in tests and from the CLI's `validate` command. At run time a
//! mutation with an unknown id is a no-op instead.

use loanflow_graph::Graph;

use crate::error::ScriptError;
use crate::mutation::Mutation;
use crate::script::Script;

/// Check that every id in `script` exists in `graph` and that no tick writes
/// two different values to the same node or edge.
pub fn validate(graph: &Graph, script: &Script) -> Result<(), ScriptError> {
  for (step, s) in script.steps().iter().enumerate() {
    match &s.mutation {
      Mutation::NodeStatus { node_id, .. } if !graph.contains_node(node_id) => {
        return Err(ScriptError::UnknownNode {
          step,
          node_id: node_id.clone(),
        });
      }
      Mutation::EdgeActive { edge_id, .. } if !graph.contains_edge(edge_id) => {
        return Err(ScriptError::UnknownEdge {
          step,
          edge_id: edge_id.clone(),
        });
      }
      _ => {}
    }
  }

  for tick in script.ticks() {
    let mutations: Vec<&Mutation> = tick.mutations().collect();
    for (i, first) in mutations.iter().enumerate() {
      if let Some(second) = mutations[i + 1..].iter().find(|m| first.contradicts(m)) {
        return Err(ScriptError::ConflictingWrites {
          tick: tick.index,
          target: second.target().to_string(),
        });
      }
    }
  }

  Ok(())
}

/// Whether edges `a` and `b` are ever active in the same published graph,
/// including the initial one.
pub fn edge_overlaps(graph: &Graph, script: &Script, a: &str, b: &str) -> bool {
  let both_active = |g: &Graph| {
    g.edge(a).is_some_and(|e| e.active) && g.edge(b).is_some_and(|e| e.active)
  };
  both_active(graph) || script.replay(graph).iter().any(both_active)
}
