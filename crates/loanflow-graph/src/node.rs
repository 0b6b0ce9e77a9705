use serde::{Deserialize, Serialize};

/// The role a node plays in the workflow.
///
/// Renderers map a kind to an icon; the engine only uses it to decide which
/// nodes can be drilled into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
  Trigger,
  Validator,
  Human,
  Risk,
  Comm,
  Approval,
  Error,
}

impl NodeKind {
  pub fn as_str(&self) -> &'static str {
    match self {
      NodeKind::Trigger => "trigger",
      NodeKind::Validator => "validator",
      NodeKind::Human => "human",
      NodeKind::Risk => "risk",
      NodeKind::Comm => "comm",
      NodeKind::Approval => "approval",
      NodeKind::Error => "error",
    }
  }
}

/// Lifecycle stage of a node.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeStatus {
  #[default]
  Idle,
  Active,
  Success,
  Error,
}

impl NodeStatus {
  pub fn as_str(&self) -> &'static str {
    match self {
      NodeStatus::Idle => "idle",
      NodeStatus::Active => "active",
      NodeStatus::Success => "success",
      NodeStatus::Error => "error",
    }
  }

  /// Whether the node has reached `success` or `error`.
  pub fn is_terminal(&self) -> bool {
    matches!(self, NodeStatus::Success | NodeStatus::Error)
  }
}

/// A workflow stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
  pub id: String,
  pub kind: NodeKind,
  pub label: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub sub_label: Option<String>,
  #[serde(default)]
  pub status: NodeStatus,
}

impl Node {
  /// Create an idle node without a sub-label.
  pub fn new(id: impl Into<String>, kind: NodeKind, label: impl Into<String>) -> Self {
    Self {
      id: id.into(),
      kind,
      label: label.into(),
      sub_label: None,
      status: NodeStatus::Idle,
    }
  }

  pub fn with_sub_label(mut self, sub_label: impl Into<String>) -> Self {
    self.sub_label = Some(sub_label.into());
    self
  }

  /// Seed the node with a status other than `idle`.
  pub fn with_status(mut self, status: NodeStatus) -> Self {
    self.status = status;
    self
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_node_defaults_to_idle() {
    let node = Node::new("1", NodeKind::Trigger, "Loan Application");
    assert_eq!(node.status, NodeStatus::Idle);
    assert!(node.sub_label.is_none());
  }

  #[test]
  fn test_node_serializes_snake_case() {
    let node = Node::new("2", NodeKind::Validator, "Validation Agent")
      .with_sub_label("Aadhar / PAN / Email")
      .with_status(NodeStatus::Active);

    let json = serde_json::to_value(&node).unwrap();
    assert_eq!(json["kind"], "validator");
    assert_eq!(json["status"], "active");
    assert_eq!(json["sub_label"], "Aadhar / PAN / Email");
  }

  #[test]
  fn test_missing_status_deserializes_idle() {
    let node: Node =
      serde_json::from_str(r#"{"id":"x","kind":"risk","label":"Risk"}"#).unwrap();
    assert_eq!(node.status, NodeStatus::Idle);
  }

  #[test]
  fn test_terminal_statuses() {
    assert!(!NodeStatus::Idle.is_terminal());
    assert!(!NodeStatus::Active.is_terminal());
    assert!(NodeStatus::Success.is_terminal());
    assert!(NodeStatus::Error.is_terminal());
  }
}
