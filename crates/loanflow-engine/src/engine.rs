//! The status engine and its timeline runner.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use loanflow_graph::Graph;
use loanflow_scenario::Scenario;
use loanflow_timeline::Script;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument};

use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::events::{EngineEvent, NoopNotifier, Snapshot, SnapshotNotifier};

/// How a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RunOutcome {
  /// Every tick was applied and published.
  Completed { ticks: usize },
  /// The run was cancelled after `applied_ticks` ticks.
  Cancelled { applied_ticks: usize },
  /// The runner task went away without reporting, e.g. runtime shutdown.
  Aborted,
}

/// Handle to a started run.
///
/// Handles are cheap to clone. Pass one to [`StatusEngine::cancel`] to stop
/// the run, or await [`RunHandle::wait`] for its outcome.
#[derive(Debug, Clone)]
pub struct RunHandle {
  run_id: String,
  generation: u64,
  outcome: watch::Receiver<Option<RunOutcome>>,
}

impl RunHandle {
  pub fn run_id(&self) -> &str {
    &self.run_id
  }

  pub fn generation(&self) -> u64 {
    self.generation
  }

  /// Whether the runner has stopped, for whatever reason.
  pub fn is_finished(&self) -> bool {
    self.outcome.borrow().is_some()
  }

  /// Wait for the runner to stop.
  pub async fn wait(&self) -> RunOutcome {
    let mut outcome = self.outcome.clone();
    match outcome.wait_for(|o| o.is_some()).await {
      Ok(value) => value.unwrap_or(RunOutcome::Aborted),
      Err(_) => RunOutcome::Aborted,
    }
  }
}

/// Bookkeeping for the run that currently owns the graph.
struct ActiveRun {
  run_id: String,
  generation: u64,
  cancel: CancellationToken,
  applied_ticks: usize,
}

/// State shared between the engine and its runner task.
///
/// Apply-and-publish and generation bumps both happen under this lock, which
/// is what makes cancellation exact.
struct EngineState {
  generation: u64,
  graph: Graph,
  run: Option<ActiveRun>,
  shut_down: bool,
}

/// The status engine.
///
/// Owns one graph instance at a time and replays a timeline script against
/// it. Each tick is applied and then published through the notifier, in
/// authored order. Generic over `N: SnapshotNotifier`; use
/// `StatusEngine::new()` to discard events or `StatusEngine::with_notifier()`
/// to observe them.
pub struct StatusEngine<N: SnapshotNotifier = NoopNotifier> {
  config: EngineConfig,
  notifier: Arc<N>,
  state: Arc<Mutex<EngineState>>,
  root: CancellationToken,
}

impl StatusEngine<NoopNotifier> {
  /// Create an engine whose events are discarded.
  pub fn new(config: EngineConfig) -> Result<Self, EngineError> {
    Self::with_notifier(config, NoopNotifier)
  }
}

impl<N: SnapshotNotifier> StatusEngine<N> {
  /// Create an engine with a custom notifier.
  pub fn with_notifier(config: EngineConfig, notifier: N) -> Result<Self, EngineError> {
    config.validate()?;

    Ok(Self {
      config,
      notifier: Arc::new(notifier),
      state: Arc::new(Mutex::new(EngineState {
        generation: 0,
        graph: Graph::default(),
        run: None,
        shut_down: false,
      })),
      root: CancellationToken::new(),
    })
  }

  pub fn config(&self) -> &EngineConfig {
    &self.config
  }

  /// Install `graph` and start replaying `script` against it.
  ///
  /// Any run still owned by the engine is cancelled first. The initial
  /// graph is published as snapshot 0 before this returns. Must be called
  /// from within a Tokio runtime.
  pub fn start(&self, graph: Graph, script: Script) -> Result<RunHandle, EngineError> {
    self.launch(None, graph, script)
  }

  /// Start a scenario from its declared initial state.
  pub fn start_scenario(&self, scenario: &Scenario) -> Result<RunHandle, EngineError> {
    self.launch(
      Some(scenario.name.clone()),
      scenario.graph.clone(),
      scenario.script.clone(),
    )
  }

  /// Stop the run behind `handle`.
  ///
  /// Applied ticks stay applied. Once this returns, no further tick of that
  /// run is applied or published. Returns `false` if the run had already
  /// finished or been replaced.
  pub fn cancel(&self, handle: &RunHandle) -> bool {
    let mut state = self.lock_state();
    let owns_graph = state
      .run
      .as_ref()
      .is_some_and(|run| run.generation == handle.generation);
    if !owns_graph {
      return false;
    }
    self.cancel_locked(&mut state);
    true
  }

  /// Cancel the current run and refuse new ones.
  pub fn shutdown(&self) {
    let mut state = self.lock_state();
    self.cancel_locked(&mut state);
    state.shut_down = true;
    self.root.cancel();
    info!("engine_shutdown");
  }

  /// Read-only copy of the owned graph.
  pub fn current_graph(&self) -> Graph {
    self.lock_state().graph.clone()
  }

  /// Whether a run currently owns the graph.
  pub fn is_running(&self) -> bool {
    self.lock_state().run.is_some()
  }

  /// Whether `start` would get past its runtime and shutdown checks.
  pub(crate) fn ensure_startable(&self) -> Result<(), EngineError> {
    tokio::runtime::Handle::try_current().map_err(|_| EngineError::NoRuntime)?;
    if self.lock_state().shut_down {
      return Err(EngineError::ShutDown);
    }
    Ok(())
  }

  pub(crate) fn notify(&self, event: EngineEvent) {
    self.notifier.notify(event);
  }

  fn launch(
    &self,
    scenario: Option<String>,
    graph: Graph,
    script: Script,
  ) -> Result<RunHandle, EngineError> {
    let runtime = tokio::runtime::Handle::try_current().map_err(|_| EngineError::NoRuntime)?;

    let mut state = self.lock_state();
    if state.shut_down {
      return Err(EngineError::ShutDown);
    }
    self.cancel_locked(&mut state);

    state.generation += 1;
    let generation = state.generation;
    let run_id = uuid::Uuid::new_v4().to_string();
    let cancel = self.root.child_token();
    let ticks = script.ticks().len();

    state.graph = graph;
    state.run = Some(ActiveRun {
      run_id: run_id.clone(),
      generation,
      cancel: cancel.clone(),
      applied_ticks: 0,
    });

    info!(
      run_id = %run_id,
      generation,
      scenario = scenario.as_deref().unwrap_or("-"),
      ticks,
      "run_started"
    );
    self.notifier.notify(EngineEvent::RunStarted {
      run_id: run_id.clone(),
      scenario,
      ticks,
    });
    self.notifier.notify(EngineEvent::Snapshot(Snapshot {
      run_id: run_id.clone(),
      generation,
      sequence: 0,
      at_ms: 0,
      applied: Vec::new(),
      graph: state.graph.clone(),
    }));
    drop(state);

    let (outcome_tx, outcome_rx) = watch::channel(None);
    let runner = TimelineRunner {
      run_id: run_id.clone(),
      generation,
      cancel,
      config: self.config,
      state: self.state.clone(),
      notifier: self.notifier.clone(),
    };
    runtime.spawn(async move {
      let outcome = runner.run(script).await;
      outcome_tx.send_replace(Some(outcome));
    });

    Ok(RunHandle {
      run_id,
      generation,
      outcome: outcome_rx,
    })
  }

  /// Detach the current run, if any. Caller holds the state lock.
  fn cancel_locked(&self, state: &mut EngineState) {
    if let Some(run) = state.run.take() {
      state.generation += 1;
      run.cancel.cancel();
      info!(
        run_id = %run.run_id,
        applied_ticks = run.applied_ticks,
        "run_cancelled"
      );
      self.notifier.notify(EngineEvent::RunCancelled {
        run_id: run.run_id,
        applied_ticks: run.applied_ticks,
      });
    }
  }

  fn lock_state(&self) -> MutexGuard<'_, EngineState> {
    lock(&self.state)
  }
}

impl<N: SnapshotNotifier> Drop for StatusEngine<N> {
  fn drop(&mut self) {
    self.root.cancel();
  }
}

fn lock(state: &Mutex<EngineState>) -> MutexGuard<'_, EngineState> {
  // The state stays consistent across a panic in a notifier, so a
  // poisoned lock is still usable.
  state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Replays one script for one generation.
struct TimelineRunner<N: SnapshotNotifier> {
  run_id: String,
  generation: u64,
  cancel: CancellationToken,
  config: EngineConfig,
  state: Arc<Mutex<EngineState>>,
  notifier: Arc<N>,
}

impl<N: SnapshotNotifier> TimelineRunner<N> {
  #[instrument(
    name = "timeline_run",
    skip(self, script),
    fields(run_id = %self.run_id, generation = self.generation)
  )]
  async fn run(self, script: Script) -> RunOutcome {
    let ticks = script.ticks();
    let mut at_ms = 0u64;

    for tick in &ticks {
      at_ms += tick.delay_ms;

      let delay = self.config.scale(tick.delay());
      if !delay.is_zero() {
        tokio::select! {
          biased;
          _ = self.cancel.cancelled() => {
            return RunOutcome::Cancelled { applied_ticks: tick.index };
          }
          _ = tokio::time::sleep(delay) => {}
        }
      }

      let mut state = lock(&self.state);
      if state.generation != self.generation {
        debug!(tick = tick.index, "stale tick dropped");
        return RunOutcome::Cancelled {
          applied_ticks: tick.index,
        };
      }

      tick.apply(&mut state.graph);
      if let Some(run) = state.run.as_mut() {
        run.applied_ticks = tick.index + 1;
      }

      debug!(tick = tick.index, at_ms, steps = tick.steps.len(), "tick_applied");
      self.notifier.notify(EngineEvent::Snapshot(Snapshot {
        run_id: self.run_id.clone(),
        generation: self.generation,
        sequence: tick.index as u64 + 1,
        at_ms,
        applied: tick.mutations().cloned().collect(),
        graph: state.graph.clone(),
      }));
    }

    let mut state = lock(&self.state);
    if state.generation != self.generation {
      return RunOutcome::Cancelled {
        applied_ticks: ticks.len(),
      };
    }
    // The graph stays installed; only the run is done with it.
    state.run = None;
    info!(ticks = ticks.len(), "run_completed");
    self.notifier.notify(EngineEvent::RunCompleted {
      run_id: self.run_id.clone(),
      ticks: ticks.len(),
    });

    RunOutcome::Completed { ticks: ticks.len() }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use loanflow_graph::{Edge, Node, NodeKind, NodeStatus};

  fn create_test_graph() -> Graph {
    Graph::new(
      vec![
        Node::new("a", NodeKind::Trigger, "A"),
        Node::new("b", NodeKind::Approval, "B"),
      ],
      vec![Edge::new("e-a-b", "a", "b")],
    )
  }

  fn create_test_script() -> Script {
    Script::builder()
      .after(100)
      .node("a", NodeStatus::Success)
      .edge("e-a-b", true)
      .after(100)
      .node("b", NodeStatus::Active)
      .edge("e-a-b", false)
      .after(100)
      .node("b", NodeStatus::Success)
      .build()
  }

  #[test]
  fn test_start_outside_runtime() {
    let engine = StatusEngine::new(EngineConfig::default()).unwrap();
    assert!(matches!(
      engine.start(create_test_graph(), create_test_script()),
      Err(EngineError::NoRuntime)
    ));
  }

  #[test]
  fn test_invalid_config_rejected() {
    let result = StatusEngine::new(EngineConfig { delay_scale: f64::INFINITY });
    assert!(matches!(result, Err(EngineError::InvalidConfig { .. })));
  }

  #[tokio::test(start_paused = true)]
  async fn test_run_completes() {
    let engine = StatusEngine::new(EngineConfig::default()).unwrap();
    let handle = engine
      .start(create_test_graph(), create_test_script())
      .unwrap();

    assert_eq!(handle.wait().await, RunOutcome::Completed { ticks: 3 });
    assert!(handle.is_finished());
    assert!(!engine.is_running());

    let graph = engine.current_graph();
    assert_eq!(graph.node("b").unwrap().status, NodeStatus::Success);
    assert!(!engine.cancel(&handle));
  }

  #[tokio::test(start_paused = true)]
  async fn test_initial_graph_installed_synchronously() {
    let engine = StatusEngine::new(EngineConfig::default()).unwrap();
    let _handle = engine
      .start(create_test_graph(), create_test_script())
      .unwrap();
    assert_eq!(engine.current_graph(), create_test_graph());
    assert!(engine.is_running());
  }

  #[tokio::test(start_paused = true)]
  async fn test_start_replaces_previous_run() {
    let engine = StatusEngine::new(EngineConfig::default()).unwrap();
    let first = engine
      .start(create_test_graph(), create_test_script())
      .unwrap();
    let second = engine
      .start(create_test_graph(), create_test_script())
      .unwrap();

    assert!(second.generation() > first.generation());
    assert_eq!(first.wait().await, RunOutcome::Cancelled { applied_ticks: 0 });
    assert_eq!(second.wait().await, RunOutcome::Completed { ticks: 3 });
  }

  #[tokio::test(start_paused = true)]
  async fn test_extreme_slowdown_keeps_runner_alive() {
    let engine = StatusEngine::new(EngineConfig::with_speed(1e-300).unwrap()).unwrap();
    let handle = engine
      .start(create_test_graph(), create_test_script())
      .unwrap();

    tokio::time::sleep(std::time::Duration::from_secs(3600)).await;
    assert!(!handle.is_finished());
    assert!(engine.cancel(&handle));
    assert_eq!(handle.wait().await, RunOutcome::Cancelled { applied_ticks: 0 });
  }

  #[test]
  fn test_ensure_startable() {
    let engine = StatusEngine::new(EngineConfig::default()).unwrap();
    assert!(matches!(engine.ensure_startable(), Err(EngineError::NoRuntime)));
  }

  #[tokio::test(start_paused = true)]
  async fn test_shutdown_refuses_new_runs() {
    let engine = StatusEngine::new(EngineConfig::default()).unwrap();
    let handle = engine
      .start(create_test_graph(), create_test_script())
      .unwrap();
    engine.shutdown();

    assert!(matches!(handle.wait().await, RunOutcome::Cancelled { .. }));
    assert!(matches!(
      engine.start(create_test_graph(), create_test_script()),
      Err(EngineError::ShutDown)
    ));
    assert!(matches!(engine.ensure_startable(), Err(EngineError::ShutDown)));
  }
}
