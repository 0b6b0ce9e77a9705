//! Loanflow Timeline
//!
//! A timeline script is an authored, ordered list of `(delay, mutation)`
//! steps. Each delay is relative to the previous step, so a script reads as a
//! narrative: "one second later, node 1 becomes active; two seconds after
//! that it succeeds and its outgoing edge lights up".
//!
//! Steps that follow each other with a zero delay form a single [`Tick`].
//! Ticks are what the engine applies and publishes as a unit, and what
//! [`Script::replay`] yields when a script is run synchronously in tests.
//!
//! ```ignore
//! use loanflow_graph::NodeStatus;
//! use loanflow_timeline::Script;
//!
//! let script = Script::builder()
//!   .after(1000)
//!   .node("1", NodeStatus::Active)
//!   .after(2000)
//!   .node("1", NodeStatus::Success)
//!   .edge("e1-2", true)
//!   .build();
//!
//! loanflow_timeline::validate(&graph, &script)?;
//! let final_graph = script.final_state(&graph);
//! ```

mod error;
mod mutation;
mod script;
mod validate;

pub use error::ScriptError;
pub use mutation::{Mutation, Target};
pub use script::{Script, ScriptBuilder, Step, Tick};
pub use validate::{edge_overlaps, validate};
