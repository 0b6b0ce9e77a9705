//! Engine events and notifiers.
//!
//! Every graph change leaves the engine as an [`EngineEvent::Snapshot`]. A
//! rendering adapter subscribes through a [`SnapshotNotifier`] and redraws on
//! each snapshot; it never writes back into the engine.

use std::sync::Arc;

use loanflow_graph::Graph;
use loanflow_timeline::Mutation;
use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, watch};

use crate::view::View;

/// The graph as published after a tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
  pub run_id: String,
  /// Generation of the run that produced this snapshot.
  pub generation: u64,
  /// 0 for the initial graph, then one per tick.
  pub sequence: u64,
  /// Authored (unscaled) time of the tick, from the start of the run.
  pub at_ms: u64,
  /// Mutations applied in this tick, in authored order.
  pub applied: Vec<Mutation>,
  pub graph: Graph,
}

/// Events emitted by the engine and the view selector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum EngineEvent {
  /// A run has been installed and is about to replay its script.
  RunStarted {
    run_id: String,
    scenario: Option<String>,
    ticks: usize,
  },

  /// The owned graph changed (or was installed).
  Snapshot(Snapshot),

  /// The final tick has been applied.
  RunCompleted { run_id: String, ticks: usize },

  /// The run was cancelled; `applied_ticks` stay applied.
  RunCancelled { run_id: String, applied_ticks: usize },

  /// The view selector switched views.
  ViewChanged { view: View },
}

impl EngineEvent {
  pub fn run_id(&self) -> Option<&str> {
    match self {
      EngineEvent::RunStarted { run_id, .. }
      | EngineEvent::RunCompleted { run_id, .. }
      | EngineEvent::RunCancelled { run_id, .. } => Some(run_id),
      EngineEvent::Snapshot(snapshot) => Some(&snapshot.run_id),
      EngineEvent::ViewChanged { .. } => None,
    }
  }
}

/// Trait for receiving engine events.
///
/// The engine calls `notify` while holding its state lock, which is what
/// keeps publication in authored order. Implementations must not block and
/// must not call back into the engine.
pub trait SnapshotNotifier: Send + Sync + 'static {
  /// Called when an engine event occurs.
  fn notify(&self, event: EngineEvent);
}

impl<N: SnapshotNotifier> SnapshotNotifier for Arc<N> {
  fn notify(&self, event: EngineEvent) {
    (**self).notify(event)
  }
}

/// A no-op notifier that discards all events.
#[derive(Debug, Clone, Default)]
pub struct NoopNotifier;

impl SnapshotNotifier for NoopNotifier {
  fn notify(&self, _event: EngineEvent) {}
}

/// Queues every event on an unbounded channel.
///
/// Nothing is dropped or merged: a slow consumer sees every snapshot, late.
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
  sender: mpsc::UnboundedSender<EngineEvent>,
}

impl ChannelNotifier {
  pub fn new(sender: mpsc::UnboundedSender<EngineEvent>) -> Self {
    Self { sender }
  }

  /// Create a notifier together with its receiving end.
  pub fn channel() -> (Self, mpsc::UnboundedReceiver<EngineEvent>) {
    let (sender, receiver) = mpsc::unbounded_channel();
    (Self::new(sender), receiver)
  }
}

impl SnapshotNotifier for ChannelNotifier {
  fn notify(&self, event: EngineEvent) {
    // Ignore send errors - receiver may have been dropped
    let _ = self.sender.send(event);
  }
}

/// Keeps only the latest snapshot.
///
/// For renderers that only ever draw the newest graph: older snapshots are
/// overwritten at this boundary instead of queueing up.
#[derive(Debug, Clone)]
pub struct WatchNotifier {
  sender: watch::Sender<Option<Snapshot>>,
}

impl WatchNotifier {
  pub fn new() -> (Self, watch::Receiver<Option<Snapshot>>) {
    let (sender, receiver) = watch::channel(None);
    (Self { sender }, receiver)
  }
}

impl SnapshotNotifier for WatchNotifier {
  fn notify(&self, event: EngineEvent) {
    if let EngineEvent::Snapshot(snapshot) = event {
      self.sender.send_replace(Some(snapshot));
    }
  }
}
