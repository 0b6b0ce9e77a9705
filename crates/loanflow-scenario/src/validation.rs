use loanflow_graph::{Edge, Graph, Node, NodeKind, NodeStatus};
use loanflow_timeline::Script;

use crate::scenario::Scenario;

pub const VALIDATION_SCENARIO: &str = "validation";

/// Main-graph node the validation sub-flow drills down from.
pub const VALIDATION_PARENT: &str = "2";

/// Inside the validation agent.
///
/// The three validators are started in the same tick, so they only look
/// parallel. The email check fails, which fails the aggregate.
pub fn validation_subflow() -> Scenario {
  Scenario::new(
    VALIDATION_SCENARIO,
    "Validation Agent Internals",
    validation_graph(),
    validation_script(),
  )
}

fn validation_graph() -> Graph {
  Graph::new(
    vec![
      // Seeded as done: it stands for the upstream intake.
      Node::new("start", NodeKind::Trigger, "Input Data")
        .with_sub_label("from Loan App")
        .with_status(NodeStatus::Success),
      Node::new("v-email", NodeKind::Validator, "Email Validator").with_sub_label("SMTP Check"),
      Node::new("v-aadhar", NodeKind::Validator, "Aadhar API").with_sub_label("UIDAI Verify"),
      Node::new("v-pan", NodeKind::Validator, "PAN NSDL").with_sub_label("Tax Status"),
      Node::new("aggregator", NodeKind::Approval, "Aggregation").with_sub_label("Combine Results"),
    ],
    vec![
      Edge::new("e-s-email", "start", "v-email"),
      Edge::new("e-s-aadhar", "start", "v-aadhar"),
      Edge::new("e-s-pan", "start", "v-pan"),
      Edge::new("e-email-agg", "v-email", "aggregator"),
      Edge::new("e-aadhar-agg", "v-aadhar", "aggregator"),
      Edge::new("e-pan-agg", "v-pan", "aggregator"),
    ],
  )
}

fn validation_script() -> Script {
  use NodeStatus::*;

  Script::builder()
    // Fan out
    .edge("e-s-email", true)
    .edge("e-s-aadhar", true)
    .edge("e-s-pan", true)
    .after(800)
    .node("v-email", Active)
    .node("v-aadhar", Active)
    .node("v-pan", Active)
    .edge("e-s-email", false)
    .edge("e-s-aadhar", false)
    .edge("e-s-pan", false)
    // Results arrive one by one
    .after(1500)
    .node("v-email", Error)
    .edge("e-email-agg", true)
    .after(500)
    .node("v-aadhar", Success)
    .edge("e-aadhar-agg", true)
    .after(500)
    .node("v-pan", Success)
    .edge("e-pan-agg", true)
    // Converge
    .after(1000)
    .node("aggregator", Active)
    .edge("e-email-agg", false)
    .edge("e-aadhar-agg", false)
    .edge("e-pan-agg", false)
    .after(1500)
    .node("aggregator", Error)
    .build()
}
