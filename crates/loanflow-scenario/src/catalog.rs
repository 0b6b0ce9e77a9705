use crate::error::ScenarioError;
use crate::main_workflow::main_workflow;
use crate::scenario::Scenario;
use crate::validation::{VALIDATION_PARENT, validation_subflow};

/// The main scenario plus the sub-flows reachable from its nodes.
#[derive(Debug, Clone)]
pub struct ScenarioCatalog {
  main: Scenario,
  /// (parent node id in the main graph, sub-flow scenario)
  subflows: Vec<(String, Scenario)>,
}

impl ScenarioCatalog {
  /// A catalog with no drill-downs.
  pub fn new(main: Scenario) -> Self {
    Self {
      main,
      subflows: Vec::new(),
    }
  }

  /// Register `scenario` as the drill-down of main node `parent`.
  ///
  /// A later registration for the same parent replaces the earlier one.
  pub fn with_subflow(mut self, parent: impl Into<String>, scenario: Scenario) -> Self {
    let parent = parent.into();
    self.subflows.retain(|(p, _)| *p != parent);
    self.subflows.push((parent, scenario));
    self
  }

  /// The loan approval workflow with its validation drill-down.
  pub fn builtin() -> Self {
    Self::new(main_workflow()).with_subflow(VALIDATION_PARENT, validation_subflow())
  }

  pub fn main(&self) -> &Scenario {
    &self.main
  }

  /// The sub-flow registered for a main-graph node, if any.
  pub fn subflow_for(&self, node_id: &str) -> Option<&Scenario> {
    self
      .subflows
      .iter()
      .find(|(parent, _)| parent == node_id)
      .map(|(_, scenario)| scenario)
  }

  /// Iterate over `(parent node id, sub-flow)` pairs in registration order.
  pub fn subflows(&self) -> impl Iterator<Item = (&str, &Scenario)> {
    self.subflows.iter().map(|(p, s)| (p.as_str(), s))
  }

  /// All scenarios, main first.
  pub fn scenarios(&self) -> impl Iterator<Item = &Scenario> {
    std::iter::once(&self.main).chain(self.subflows.iter().map(|(_, s)| s))
  }

  /// Look a scenario up by name.
  pub fn get(&self, name: &str) -> Option<&Scenario> {
    self.scenarios().find(|s| s.name == name)
  }

  /// Validate every scenario and check that each sub-flow's parent exists
  /// in the main graph.
  pub fn validate(&self) -> Result<(), ScenarioError> {
    for scenario in self.scenarios() {
      scenario.validate()?;
    }

    for (parent, scenario) in &self.subflows {
      if !self.main.graph.contains_node(parent) {
        return Err(ScenarioError::UnknownParent {
          scenario: scenario.name.clone(),
          parent: parent.clone(),
        });
      }
    }

    Ok(())
  }
}

impl Default for ScenarioCatalog {
  fn default() -> Self {
    Self::builtin()
  }
}
