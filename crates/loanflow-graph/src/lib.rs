//! Loanflow Graph
//!
//! This crate provides the graph model shared by every other loanflow crate:
//! typed nodes, directed edges and the two mutations the status engine is
//! allowed to perform on them.
//!
//! A [`Graph`] is plain data. Nodes keep their insertion order, which the
//! rendering side uses as z-order. Mutations that reference an id the graph
//! does not contain are silent no-ops: scripts are authored against known
//! graphs and are validated ahead of time, so a miss at run time is a
//! script/model mismatch rather than something to recover from.

mod edge;
mod error;
mod graph;
mod node;
mod topology;

pub use edge::Edge;
pub use error::GraphError;
pub use graph::Graph;
pub use node::{Node, NodeKind, NodeStatus};
pub use topology::Topology;
