use std::time::Duration;

use loanflow_graph::{Graph, NodeStatus};
use serde::{Deserialize, Serialize};

use crate::mutation::Mutation;

/// One authored step: wait `delay_ms` after the previous step, then apply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
  pub delay_ms: u64,
  pub mutation: Mutation,
}

impl Step {
  pub fn new(delay_ms: u64, mutation: Mutation) -> Self {
    Self { delay_ms, mutation }
  }
}

/// A run of steps applied together: the first step's delay followed by any
/// number of zero-delay steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tick<'a> {
  /// Position of this tick in the script, starting at 0.
  pub index: usize,
  /// Position of the tick's first step in the script.
  pub first_step: usize,
  pub delay_ms: u64,
  pub steps: &'a [Step],
}

impl<'a> Tick<'a> {
  pub fn delay(&self) -> Duration {
    Duration::from_millis(self.delay_ms)
  }

  pub fn mutations(&self) -> impl Iterator<Item = &'a Mutation> + 'a {
    let steps: &'a [Step] = self.steps;
    steps.iter().map(|s| &s.mutation)
  }

  /// Apply every mutation in authored order.
  pub fn apply(&self, graph: &mut Graph) {
    for mutation in self.mutations() {
      mutation.apply(graph);
    }
  }
}

/// An authored timeline, totally ordered by step position.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Script {
  steps: Vec<Step>,
}

impl Script {
  pub fn new(steps: Vec<Step>) -> Self {
    Self { steps }
  }

  pub fn builder() -> ScriptBuilder {
    ScriptBuilder::default()
  }

  pub fn steps(&self) -> &[Step] {
    &self.steps
  }

  pub fn len(&self) -> usize {
    self.steps.len()
  }

  pub fn is_empty(&self) -> bool {
    self.steps.is_empty()
  }

  /// Group steps into ticks. A step with a non-zero delay always opens a new
  /// tick, and so does the first step.
  pub fn ticks(&self) -> Vec<Tick<'_>> {
    let mut ticks = Vec::new();
    let mut start = 0;

    while start < self.steps.len() {
      let mut end = start + 1;
      while end < self.steps.len() && self.steps[end].delay_ms == 0 {
        end += 1;
      }
      ticks.push(Tick {
        index: ticks.len(),
        first_step: start,
        delay_ms: self.steps[start].delay_ms,
        steps: &self.steps[start..end],
      });
      start = end;
    }

    ticks
  }

  /// Sum of all delays: how long an unscaled run takes.
  pub fn total_delay_ms(&self) -> u64 {
    self.steps.iter().map(|s| s.delay_ms).sum()
  }

  /// Replay synchronously, ignoring delays. Yields the graph after each
  /// tick, in order.
  pub fn replay(&self, initial: &Graph) -> Vec<Graph> {
    let mut graph = initial.clone();
    self
      .ticks()
      .iter()
      .map(|tick| {
        tick.apply(&mut graph);
        graph.clone()
      })
      .collect()
  }

  /// The graph after every step has been applied.
  pub fn final_state(&self, initial: &Graph) -> Graph {
    let mut graph = initial.clone();
    for step in &self.steps {
      step.mutation.apply(&mut graph);
    }
    graph
  }
}

/// Fluent script authoring.
///
/// `after(ms)` sets the delay of the next step only; steps added without a
/// preceding `after` have zero delay and join the current tick.
#[derive(Debug, Default)]
pub struct ScriptBuilder {
  steps: Vec<Step>,
  pending_delay_ms: u64,
}

impl ScriptBuilder {
  pub fn after(mut self, delay_ms: u64) -> Self {
    self.pending_delay_ms += delay_ms;
    self
  }

  pub fn node(self, node_id: impl Into<String>, status: NodeStatus) -> Self {
    self.push(Mutation::node(node_id, status))
  }

  pub fn edge(self, edge_id: impl Into<String>, active: bool) -> Self {
    self.push(Mutation::edge(edge_id, active))
  }

  pub fn push(mut self, mutation: Mutation) -> Self {
    let delay_ms = std::mem::take(&mut self.pending_delay_ms);
    self.steps.push(Step::new(delay_ms, mutation));
    self
  }

  pub fn build(self) -> Script {
    Script::new(self.steps)
  }
}
