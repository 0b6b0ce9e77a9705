use loanflow_graph::GraphError;
use loanflow_timeline::ScriptError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScenarioError {
  #[error("scenario '{scenario}' has an invalid graph")]
  Graph {
    scenario: String,
    #[source]
    source: GraphError,
  },

  #[error("scenario '{scenario}' has an invalid script")]
  Script {
    scenario: String,
    #[source]
    source: ScriptError,
  },

  #[error("sub-flow '{scenario}' hangs off unknown main node '{parent}'")]
  UnknownParent { scenario: String, parent: String },
}
