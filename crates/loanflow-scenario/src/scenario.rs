use loanflow_graph::Graph;
use loanflow_timeline::Script;
use serde::{Deserialize, Serialize};

use crate::error::ScenarioError;

/// A named initial graph together with the script that animates it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
  /// Short identifier, e.g. `main`.
  pub name: String,
  /// Human-readable title shown above the canvas.
  pub title: String,
  pub graph: Graph,
  pub script: Script,
}

impl Scenario {
  pub fn new(
    name: impl Into<String>,
    title: impl Into<String>,
    graph: Graph,
    script: Script,
  ) -> Self {
    Self {
      name: name.into(),
      title: title.into(),
      graph,
      script,
    }
  }

  /// Check the graph's structure and the script against it.
  pub fn validate(&self) -> Result<(), ScenarioError> {
    self.graph.validate().map_err(|source| ScenarioError::Graph {
      scenario: self.name.clone(),
      source,
    })?;

    loanflow_timeline::validate(&self.graph, &self.script).map_err(|source| {
      ScenarioError::Script {
        scenario: self.name.clone(),
        source,
      }
    })
  }

  /// Where the scenario ends up once the script has fully played.
  pub fn final_graph(&self) -> Graph {
    self.script.final_state(&self.graph)
  }
}
