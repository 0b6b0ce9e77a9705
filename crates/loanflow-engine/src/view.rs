//! Which graph is on screen: the main workflow or one node's sub-flow.

use loanflow_graph::{Graph, NodeKind};
use loanflow_scenario::{Scenario, ScenarioCatalog};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::engine::{RunHandle, StatusEngine};
use crate::error::EngineError;
use crate::events::{EngineEvent, NoopNotifier, SnapshotNotifier};

/// The active view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum View {
  Main,
  /// Drilled down into the sub-flow of main node `parent`.
  Subflow { parent: String },
}

/// Two-state machine over [`View`].
///
/// Entering a view always starts its scenario from the declared initial
/// state; leaving a view cancels its run and discards its graph. Nothing
/// carries over between visits.
pub struct ViewSelector<N: SnapshotNotifier = NoopNotifier> {
  engine: StatusEngine<N>,
  catalog: ScenarioCatalog,
  view: View,
  run: Option<RunHandle>,
}

impl<N: SnapshotNotifier> ViewSelector<N> {
  /// Create a selector in the `Main` view. Nothing runs until
  /// [`enter_main`](Self::enter_main) is called.
  pub fn new(engine: StatusEngine<N>, catalog: ScenarioCatalog) -> Self {
    Self {
      engine,
      catalog,
      view: View::Main,
      run: None,
    }
  }

  pub fn view(&self) -> &View {
    &self.view
  }

  /// Handle of the run driving the current view.
  pub fn current_run(&self) -> Option<&RunHandle> {
    self.run.as_ref()
  }

  /// The graph of the current view as it stands right now.
  pub fn graph(&self) -> Graph {
    self.engine.current_graph()
  }

  pub fn engine(&self) -> &StatusEngine<N> {
    &self.engine
  }

  pub fn catalog(&self) -> &ScenarioCatalog {
    &self.catalog
  }

  /// (Re)start the main scenario in the `Main` view.
  pub fn enter_main(&mut self) -> Result<&RunHandle, EngineError> {
    let scenario = self.catalog.main().clone();
    self.switch_to(View::Main, &scenario)
  }

  /// Handle a node activation.
  ///
  /// Drills down only from `Main`, only for `validator` nodes, and only when
  /// the catalog has a sub-flow for the node. Anything else leaves the
  /// selector where it is and returns `Ok(false)`.
  pub fn activate(&mut self, node_id: &str) -> Result<bool, EngineError> {
    if self.view != View::Main {
      debug!(node_id, "activation ignored outside the main view");
      return Ok(false);
    }

    let is_validator = self
      .catalog
      .main()
      .graph
      .node(node_id)
      .is_some_and(|n| n.kind == NodeKind::Validator);
    let subflow = match self.catalog.subflow_for(node_id) {
      Some(scenario) if is_validator => scenario.clone(),
      _ => {
        debug!(node_id, "node has no sub-flow");
        return Ok(false);
      }
    };

    self.switch_to(
      View::Subflow {
        parent: node_id.to_string(),
      },
      &subflow,
    )?;
    Ok(true)
  }

  /// Return from a sub-flow to `Main`. A no-op in `Main`.
  pub fn back(&mut self) -> Result<bool, EngineError> {
    if self.view == View::Main {
      return Ok(false);
    }
    self.enter_main()?;
    Ok(true)
  }

  /// Cancel the current run and stop the engine.
  pub fn shutdown(&mut self) {
    self.run = None;
    self.engine.shutdown();
  }

  fn switch_to(&mut self, view: View, scenario: &Scenario) -> Result<&RunHandle, EngineError> {
    // A switch that cannot start leaves the current view and run untouched.
    self.engine.ensure_startable()?;

    if let Some(run) = self.run.take() {
      self.engine.cancel(&run);
    }

    // Observers see the view change ahead of the new run's first snapshot.
    self.engine.notify(EngineEvent::ViewChanged { view: view.clone() });
    let handle = self.engine.start_scenario(scenario)?;

    info!(
      view = ?view,
      scenario = %scenario.name,
      run_id = %handle.run_id(),
      "view_changed"
    );
    self.view = view;

    let handle: &RunHandle = self.run.insert(handle);
    Ok(handle)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::config::EngineConfig;

  fn create_selector() -> ViewSelector {
    let engine = StatusEngine::new(EngineConfig::default()).unwrap();
    ViewSelector::new(engine, ScenarioCatalog::builtin())
  }

  #[tokio::test(start_paused = true)]
  async fn test_starts_in_main() {
    let mut selector = create_selector();
    assert_eq!(selector.view(), &View::Main);
    selector.enter_main().unwrap();
    assert_eq!(selector.graph(), selector.catalog().main().graph);
  }

  #[tokio::test(start_paused = true)]
  async fn test_activate_validator_drills_down() {
    let mut selector = create_selector();
    selector.enter_main().unwrap();

    assert!(selector.activate("2").unwrap());
    assert_eq!(
      selector.view(),
      &View::Subflow {
        parent: "2".to_string()
      }
    );
    assert!(selector.graph().contains_node("aggregator"));
  }

  #[tokio::test(start_paused = true)]
  async fn test_activate_other_nodes_is_ignored() {
    let mut selector = create_selector();
    selector.enter_main().unwrap();
    let run_id = selector.current_run().unwrap().run_id().to_string();

    for node_id in ["1", "3", "4", "missing"] {
      assert!(!selector.activate(node_id).unwrap());
    }
    assert_eq!(selector.view(), &View::Main);
    assert_eq!(selector.current_run().unwrap().run_id(), run_id);
  }

  #[tokio::test(start_paused = true)]
  async fn test_activate_inside_subflow_is_ignored() {
    let mut selector = create_selector();
    selector.enter_main().unwrap();
    selector.activate("2").unwrap();

    // v-email is a validator, but sub-flows do not nest.
    assert!(!selector.activate("v-email").unwrap());
    assert!(!selector.activate("2").unwrap());
  }

  #[tokio::test(start_paused = true)]
  async fn test_back() {
    let mut selector = create_selector();
    selector.enter_main().unwrap();
    assert!(!selector.back().unwrap());

    selector.activate("2").unwrap();
    assert!(selector.back().unwrap());
    assert_eq!(selector.view(), &View::Main);
    assert_eq!(selector.graph(), selector.catalog().main().graph);
  }

  #[tokio::test(start_paused = true)]
  async fn test_failed_switch_announces_nothing() {
    let (notifier, mut events) = crate::ChannelNotifier::channel();
    let engine = StatusEngine::with_notifier(EngineConfig::default(), notifier).unwrap();
    let mut selector = ViewSelector::new(engine, ScenarioCatalog::builtin());
    selector.enter_main().unwrap();
    selector.shutdown();
    while events.try_recv().is_ok() {}

    assert!(matches!(selector.activate("2"), Err(EngineError::ShutDown)));
    assert_eq!(selector.view(), &View::Main);
    assert!(selector.current_run().is_none());
    assert!(events.try_recv().is_err());
  }

  #[tokio::test(start_paused = true)]
  async fn test_leaving_cancels_run() {
    let mut selector = create_selector();
    let main_run = selector.enter_main().unwrap().clone();
    selector.activate("2").unwrap();

    assert!(matches!(
      main_run.wait().await,
      crate::RunOutcome::Cancelled { .. }
    ));
  }
}
