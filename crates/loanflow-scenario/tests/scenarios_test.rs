//! End-to-end checks of the built-in scenarios, replayed synchronously.

use loanflow_graph::{Graph, NodeStatus};
use loanflow_scenario::{ScenarioCatalog, main_workflow, validation_subflow};
use loanflow_timeline::edge_overlaps;

fn status(graph: &Graph, node_id: &str) -> NodeStatus {
  graph.node(node_id).expect("node exists").status
}

fn active(graph: &Graph, edge_id: &str) -> bool {
  graph.edge(edge_id).expect("edge exists").active
}

#[test]
fn test_builtin_catalog_is_valid() {
  ScenarioCatalog::builtin()
    .validate()
    .expect("built-in scenarios validate");
}

#[test]
fn test_main_graph_shape() {
  let scenario = main_workflow();
  assert_eq!(scenario.graph.nodes.len(), 6);
  assert_eq!(scenario.graph.edges.len(), 6);
  assert!(
    scenario
      .graph
      .nodes
      .iter()
      .all(|n| n.status == NodeStatus::Idle)
  );
  assert_eq!(
    scenario.graph.edge("e2-3").unwrap().label.as_deref(),
    Some("Validation Failed")
  );
}

#[test]
fn test_main_final_state() {
  let end = main_workflow().final_graph();

  assert_eq!(status(&end, "1"), NodeStatus::Success);
  assert_eq!(status(&end, "2"), NodeStatus::Error);
  assert_eq!(status(&end, "3"), NodeStatus::Success);
  assert_eq!(status(&end, "4"), NodeStatus::Success);
  assert_eq!(status(&end, "5"), NodeStatus::Success);
  assert_eq!(status(&end, "6"), NodeStatus::Success);
  assert_eq!(end.active_edges().count(), 0);
}

#[test]
fn test_main_timing() {
  let scenario = main_workflow();
  assert_eq!(scenario.script.len(), 22);
  assert_eq!(scenario.script.ticks().len(), 12);
  assert_eq!(scenario.script.total_delay_ms(), 19_500);
}

#[test]
fn test_failure_edge_window() {
  let scenario = main_workflow();
  let snapshots = scenario.script.replay(&scenario.graph);

  let e23: Vec<usize> = snapshots
    .iter()
    .enumerate()
    .filter(|(_, g)| active(g, "e2-3"))
    .map(|(i, _)| i)
    .collect();
  // Raised with the validation error, cleared when review starts.
  assert_eq!(e23, vec![3]);
  assert_eq!(status(&snapshots[3], "2"), NodeStatus::Error);
  assert_eq!(status(&snapshots[4], "3"), NodeStatus::Active);

  let e34: Vec<usize> = snapshots
    .iter()
    .enumerate()
    .filter(|(_, g)| active(g, "e3-4"))
    .map(|(i, _)| i)
    .collect();
  assert_eq!(e34, vec![5]);
}

#[test]
fn test_failure_and_correction_edges_never_overlap() {
  let scenario = main_workflow();
  assert!(!edge_overlaps(
    &scenario.graph,
    &scenario.script,
    "e2-3",
    "e3-4"
  ));
}

#[test]
fn test_direct_path_stays_dark() {
  let scenario = main_workflow();
  assert!(
    scenario
      .script
      .replay(&scenario.graph)
      .iter()
      .all(|g| !active(g, "e2-4"))
  );
}

#[test]
fn test_at_most_one_main_edge_in_flight() {
  let scenario = main_workflow();
  for graph in scenario.script.replay(&scenario.graph) {
    assert!(graph.active_edges().count() <= 1);
  }
}

#[test]
fn test_subflow_seeded_start() {
  let scenario = validation_subflow();
  assert_eq!(scenario.graph.nodes.len(), 5);
  assert_eq!(scenario.graph.edges.len(), 6);
  assert_eq!(status(&scenario.graph, "start"), NodeStatus::Success);
  assert_eq!(status(&scenario.graph, "aggregator"), NodeStatus::Idle);
}

#[test]
fn test_subflow_final_state() {
  let end = validation_subflow().final_graph();

  assert_eq!(status(&end, "start"), NodeStatus::Success);
  assert_eq!(status(&end, "v-email"), NodeStatus::Error);
  assert_eq!(status(&end, "v-aadhar"), NodeStatus::Success);
  assert_eq!(status(&end, "v-pan"), NodeStatus::Success);
  assert_eq!(status(&end, "aggregator"), NodeStatus::Error);
  assert_eq!(end.active_edges().count(), 0);
}

#[test]
fn test_subflow_fan_out_is_one_tick() {
  let scenario = validation_subflow();
  let ticks = scenario.script.ticks();
  assert_eq!(ticks.len(), 7);
  assert_eq!(ticks[0].delay_ms, 0);
  assert_eq!(ticks[0].steps.len(), 3);

  let snapshots = scenario.script.replay(&scenario.graph);
  assert_eq!(snapshots[0].active_edges().count(), 3);
  for validator in ["v-email", "v-aadhar", "v-pan"] {
    assert_eq!(status(&snapshots[1], validator), NodeStatus::Active);
  }
  assert_eq!(snapshots[1].active_edges().count(), 0);
}

#[test]
fn test_subflow_results_arrive_in_order() {
  let scenario = validation_subflow();
  let snapshots = scenario.script.replay(&scenario.graph);

  assert_eq!(status(&snapshots[2], "v-email"), NodeStatus::Error);
  assert_eq!(status(&snapshots[2], "v-aadhar"), NodeStatus::Active);
  assert_eq!(status(&snapshots[3], "v-aadhar"), NodeStatus::Success);
  assert_eq!(status(&snapshots[3], "v-pan"), NodeStatus::Active);
  assert_eq!(status(&snapshots[4], "v-pan"), NodeStatus::Success);
  assert_eq!(snapshots[4].active_edges().count(), 3);
}
