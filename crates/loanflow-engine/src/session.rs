//! Gesture-driven session.
//!
//! The `Session` owns an mpsc channel for user gestures coming from the
//! rendering side and routes them to a [`ViewSelector`].

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::config::SessionConfig;
use crate::error::EngineError;
use crate::events::SnapshotNotifier;
use crate::view::{View, ViewSelector};

/// What a rendering adapter can report back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "gesture", rename_all = "snake_case")]
pub enum Gesture {
  /// The user clicked a node.
  ActivateNode { node_id: String },
  /// The user pressed the "back" affordance.
  Back,
  /// The user dragged the canvas. Never changes engine state.
  Pan { dx: f64, dy: f64 },
}

/// Routes gestures to a view selector until cancelled.
///
/// # Usage
///
/// ```ignore
/// let session = Session::new(selector, SessionConfig::default())?;
///
/// // Hand a sender to the rendering adapter
/// let gestures = session.sender();
///
/// // Mount the main view and process gestures
/// let cancel = CancellationToken::new();
/// let last_view = session.run(cancel).await?;
/// ```
pub struct Session<N: SnapshotNotifier> {
  sender: mpsc::Sender<Gesture>,
  receiver: mpsc::Receiver<Gesture>,
  selector: ViewSelector<N>,
}

impl<N: SnapshotNotifier> Session<N> {
  pub fn new(selector: ViewSelector<N>, config: SessionConfig) -> Result<Self, EngineError> {
    config.validate()?;
    let (sender, receiver) = mpsc::channel(config.gesture_buffer);
    Ok(Self {
      sender,
      receiver,
      selector,
    })
  }

  /// Get a sender handle for reporting gestures.
  pub fn sender(&self) -> mpsc::Sender<Gesture> {
    self.sender.clone()
  }

  pub fn selector(&self) -> &ViewSelector<N> {
    &self.selector
  }

  /// Mount the main view, then process gestures until the cancellation
  /// token is triggered or every sender is gone.
  ///
  /// The engine is shut down on the way out. Returns the view that was
  /// active at that point.
  pub async fn run(self, cancel: CancellationToken) -> Result<View, EngineError> {
    let Session {
      sender,
      mut receiver,
      mut selector,
    } = self;
    // Only external senders keep the session alive.
    drop(sender);

    selector.enter_main()?;
    info!("session_started");

    loop {
      tokio::select! {
        _ = cancel.cancelled() => {
          info!("session cancelled");
          break;
        }
        gesture = receiver.recv() => {
          match gesture {
            Some(gesture) => {
              if let Err(e) = handle_gesture(&mut selector, gesture) {
                error!(error = %e, "gesture handling failed");
                selector.shutdown();
                return Err(e);
              }
            }
            None => {
              info!("session channel closed");
              break;
            }
          }
        }
      }
    }

    let view = selector.view().clone();
    selector.shutdown();
    Ok(view)
  }
}

fn handle_gesture<N: SnapshotNotifier>(
  selector: &mut ViewSelector<N>,
  gesture: Gesture,
) -> Result<(), EngineError> {
  match gesture {
    Gesture::ActivateNode { node_id } => {
      let switched = selector.activate(&node_id)?;
      debug!(node_id = %node_id, switched, "node activated");
    }
    Gesture::Back => {
      let switched = selector.back()?;
      debug!(switched, "back pressed");
    }
    Gesture::Pan { dx, dy } => {
      debug!(dx, dy, "pan");
    }
  }
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::config::EngineConfig;
  use crate::engine::StatusEngine;
  use loanflow_scenario::ScenarioCatalog;
  use std::time::Duration;

  fn create_session() -> Session<crate::NoopNotifier> {
    let engine = StatusEngine::new(EngineConfig::default()).unwrap();
    let selector = ViewSelector::new(engine, ScenarioCatalog::builtin());
    Session::new(selector, SessionConfig::default()).unwrap()
  }

  #[test]
  fn test_zero_buffer_rejected() {
    let engine = StatusEngine::new(EngineConfig::default()).unwrap();
    let selector = ViewSelector::new(engine, ScenarioCatalog::builtin());
    let result = Session::new(selector, SessionConfig { gesture_buffer: 0 });
    assert!(matches!(result, Err(EngineError::InvalidConfig { .. })));
  }

  #[tokio::test]
  async fn test_sender_cloning() {
    let session = create_session();
    let sender1 = session.sender();
    let sender2 = session.sender();
    assert!(!sender1.is_closed());
    assert!(!sender2.is_closed());
  }

  #[tokio::test(start_paused = true)]
  async fn test_exits_when_senders_dropped() {
    let session = create_session();
    let sender = session.sender();
    sender
      .send(Gesture::ActivateNode {
        node_id: "2".to_string(),
      })
      .await
      .unwrap();
    drop(sender);

    let view = session.run(CancellationToken::new()).await.unwrap();
    assert_eq!(
      view,
      View::Subflow {
        parent: "2".to_string()
      }
    );
  }

  #[tokio::test(start_paused = true)]
  async fn test_pan_leaves_view_and_run_alone() {
    let engine = StatusEngine::new(EngineConfig::default()).unwrap();
    let mut selector = ViewSelector::new(engine, ScenarioCatalog::builtin());
    selector.enter_main().unwrap();
    let main_run = selector.current_run().unwrap().run_id().to_string();

    handle_gesture(&mut selector, Gesture::Pan { dx: 12.0, dy: -4.5 }).unwrap();
    assert_eq!(selector.view(), &View::Main);
    assert_eq!(selector.current_run().unwrap().run_id(), main_run);

    handle_gesture(
      &mut selector,
      Gesture::ActivateNode {
        node_id: "2".to_string(),
      },
    )
    .unwrap();
    let subflow_run = selector.current_run().unwrap().run_id().to_string();
    let graph = selector.graph();

    handle_gesture(&mut selector, Gesture::Pan { dx: -3.0, dy: 8.0 }).unwrap();
    assert_eq!(
      selector.view(),
      &View::Subflow {
        parent: "2".to_string()
      }
    );
    assert_eq!(selector.current_run().unwrap().run_id(), subflow_run);
    assert_eq!(selector.graph(), graph);
    assert!(selector.engine().is_running());
  }

  #[tokio::test(start_paused = true)]
  async fn test_cancellation() {
    let session = create_session();
    let _sender = session.sender();

    let cancel = CancellationToken::new();
    let cancel_clone = cancel.clone();
    let handle = tokio::spawn(async move { session.run(cancel_clone).await });

    tokio::time::sleep(Duration::from_millis(10)).await;
    cancel.cancel();

    let result = handle.await.unwrap();
    assert_eq!(result.unwrap(), View::Main);
  }
}
