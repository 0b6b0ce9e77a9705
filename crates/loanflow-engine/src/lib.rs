//! Loanflow Engine
//!
//! This crate provides the timeline-driven status engine: it owns the graph
//! of the active view, replays that view's script against it, and publishes
//! a snapshot after every tick.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                          Session                            │
//! │  - owns mpsc channel of gestures from the renderer          │
//! │  - run(cancel) mounts Main, routes gestures until cancelled │
//! └─────────────────────────────────────────────────────────────┘
//!                               │
//!                               ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        ViewSelector                         │
//! │  - Main | Subflow(parent)                                   │
//! │  - activate(node) / back() restart the target scenario      │
//! └─────────────────────────────────────────────────────────────┘
//!                               │
//!                               ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        StatusEngine                         │
//! │  - start(graph, script) -> RunHandle                        │
//! │  - cancel(handle): generation bump under the state lock     │
//! │  - runner: sleep, check generation, apply tick, publish     │
//! └─────────────────────────────────────────────────────────────┘
//!                               │
//!                               ▼
//!                 SnapshotNotifier (renderer side)
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use loanflow_engine::{ChannelNotifier, EngineConfig, StatusEngine};
//! use loanflow_scenario::main_workflow;
//!
//! let (notifier, mut events) = ChannelNotifier::channel();
//! let engine = StatusEngine::with_notifier(EngineConfig::default(), notifier)?;
//!
//! let handle = engine.start_scenario(&main_workflow())?;
//! while let Some(event) = events.recv().await {
//!     // redraw
//! }
//! ```

mod config;
mod engine;
mod error;
mod events;
mod session;
mod view;

pub use config::{EngineConfig, SessionConfig};
pub use engine::{RunHandle, RunOutcome, StatusEngine};
pub use error::EngineError;
pub use events::{
  ChannelNotifier, EngineEvent, NoopNotifier, Snapshot, SnapshotNotifier, WatchNotifier,
};
pub use session::{Gesture, Session};
pub use view::{View, ViewSelector};
