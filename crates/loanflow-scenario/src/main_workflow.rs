use loanflow_graph::{Edge, Graph, Node, NodeKind, NodeStatus};
use loanflow_timeline::Script;

use crate::scenario::Scenario;

pub const MAIN_SCENARIO: &str = "main";

/// The loan approval workflow.
///
/// Validation fails on the email check, so the run detours through human
/// review before risk analysis. `e2-4`, the direct path, stays dark.
pub fn main_workflow() -> Scenario {
  Scenario::new(
    MAIN_SCENARIO,
    "Loan Approval Workflow",
    main_graph(),
    main_script(),
  )
}

fn main_graph() -> Graph {
  Graph::new(
    vec![
      Node::new("1", NodeKind::Trigger, "Loan Application").with_sub_label("Upload & OCR"),
      Node::new("2", NodeKind::Validator, "Validation Agent")
        .with_sub_label("Aadhar / PAN / Email"),
      Node::new("3", NodeKind::Human, "Human Review").with_sub_label("Manual Correction"),
      Node::new("4", NodeKind::Risk, "Risk Analysis").with_sub_label("Credit Verification"),
      Node::new("5", NodeKind::Approval, "Multi-Approval").with_sub_label("Loan Officer (<1M)"),
      Node::new("6", NodeKind::Comm, "Communication").with_sub_label("Notify Decision"),
    ],
    vec![
      Edge::new("e1-2", "1", "2"),
      Edge::new("e2-4", "2", "4"),
      Edge::new("e2-3", "2", "3").with_label("Validation Failed"),
      Edge::new("e3-4", "3", "4").with_label("Corrected"),
      Edge::new("e4-5", "4", "5"),
      Edge::new("e5-6", "5", "6"),
    ],
  )
}

fn main_script() -> Script {
  use NodeStatus::*;

  Script::builder()
    // Upload
    .after(1000)
    .node("1", Active)
    .after(2000)
    .node("1", Success)
    .edge("e1-2", true)
    // Validation, failing on email
    .after(1500)
    .node("2", Active)
    .edge("e1-2", false)
    .after(2500)
    .node("2", Error)
    .edge("e2-3", true)
    // Human review corrects it
    .after(1000)
    .node("3", Active)
    .edge("e2-3", false)
    .after(3000)
    .node("3", Success)
    .edge("e3-4", true)
    // Risk analysis
    .after(1000)
    .node("4", Active)
    .edge("e3-4", false)
    .after(2000)
    .node("4", Success)
    .edge("e4-5", true)
    // Approval
    .after(1000)
    .node("5", Active)
    .edge("e4-5", false)
    .after(2000)
    .node("5", Success)
    .edge("e5-6", true)
    // Notification
    .after(1000)
    .node("6", Active)
    .edge("e5-6", false)
    .after(1500)
    .node("6", Success)
    .build()
}
