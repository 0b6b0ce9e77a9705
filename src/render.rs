//! Terminal rendering adapter.
//!
//! Draws each published snapshot as a row of stage columns. Reads engine
//! events only; the sole way back into the engine is the gesture channel
//! owned by the caller.

use std::io::Write;

use anyhow::Result;
use loanflow_engine::{EngineEvent, Snapshot, View};
use loanflow_graph::{Graph, Node, NodeStatus};
use loanflow_scenario::ScenarioCatalog;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
  Text,
  /// One JSON event per line.
  Json,
}

pub struct Renderer<W: Write> {
  out: W,
  format: OutputFormat,
  catalog: ScenarioCatalog,
}

impl<W: Write> Renderer<W> {
  pub fn new(out: W, format: OutputFormat, catalog: ScenarioCatalog) -> Self {
    Self {
      out,
      format,
      catalog,
    }
  }

  pub fn render(&mut self, event: &EngineEvent) -> Result<()> {
    match self.format {
      OutputFormat::Json => {
        writeln!(self.out, "{}", serde_json::to_string(event)?)?;
      }
      OutputFormat::Text => self.render_text(event)?,
    }
    self.out.flush()?;
    Ok(())
  }

  fn render_text(&mut self, event: &EngineEvent) -> Result<()> {
    match event {
      EngineEvent::ViewChanged { view } => {
        let title = match view {
          View::Main => self.catalog.main().title.clone(),
          View::Subflow { parent } => self
            .catalog
            .subflow_for(parent)
            .map(|s| format!("{} (back to return)", s.title))
            .unwrap_or_else(|| format!("sub-flow of {}", parent)),
        };
        writeln!(self.out, "\n== {} ==", title)?;
      }
      EngineEvent::Snapshot(snapshot) => self.render_snapshot(snapshot)?,
      EngineEvent::RunCompleted { ticks, .. } => {
        writeln!(self.out, "-- finished after {} steps", ticks)?;
      }
      EngineEvent::RunCancelled { applied_ticks, .. } => {
        writeln!(self.out, "-- left after {} steps", applied_ticks)?;
      }
      EngineEvent::RunStarted { .. } => {}
    }
    Ok(())
  }

  fn render_snapshot(&mut self, snapshot: &Snapshot) -> Result<()> {
    let changes = if snapshot.applied.is_empty() {
      "initial".to_string()
    } else {
      snapshot
        .applied
        .iter()
        .map(|m| m.to_string())
        .collect::<Vec<_>>()
        .join(", ")
    };
    let settled = snapshot
      .graph
      .nodes
      .iter()
      .filter(|n| n.status.is_terminal())
      .count();
    writeln!(
      self.out,
      "[{:>6.1}s] #{:<2} {}/{} settled  {}",
      snapshot.at_ms as f64 / 1000.0,
      snapshot.sequence,
      settled,
      snapshot.graph.nodes.len(),
      changes
    )?;
    for line in draw_graph(&snapshot.graph) {
      writeln!(self.out, "           {}", line)?;
    }
    Ok(())
  }
}

/// One line per stage column, plus one for edges in flight.
pub fn draw_graph(graph: &Graph) -> Vec<String> {
  let mut lines: Vec<String> = graph
    .topology()
    .layers()
    .iter()
    .map(|layer| {
      layer
        .iter()
        .filter_map(|id| graph.node(id))
        .map(draw_node)
        .collect::<Vec<_>>()
        .join("  ")
    })
    .collect();

  let in_flight: Vec<String> = graph
    .active_edges()
    .map(|e| match &e.label {
      Some(label) => format!("{} -> {} ({})", e.source, e.target, label),
      None => format!("{} -> {}", e.source, e.target),
    })
    .collect();
  if !in_flight.is_empty() {
    lines.push(format!("~ {}", in_flight.join(", ")));
  }

  lines
}

fn draw_node(node: &Node) -> String {
  let marker = match node.status {
    NodeStatus::Idle => " ",
    NodeStatus::Active => "*",
    NodeStatus::Success => "+",
    NodeStatus::Error => "!",
  };
  format!("[{}] {} ({})", marker, node.label, node.kind.as_str())
}

#[cfg(test)]
mod tests {
  use super::*;
  use loanflow_scenario::main_workflow;

  #[test]
  fn test_draw_main_graph_columns() {
    let graph = main_workflow().graph;
    let lines = draw_graph(&graph);
    // intake, validation, review, risk, approval, notification
    assert_eq!(lines.len(), 6);
    assert_eq!(lines[0], "[ ] Loan Application (trigger)");
    assert_eq!(lines[2], "[ ] Human Review (human)");
  }

  #[test]
  fn test_draw_in_flight_edge() {
    let graph = main_workflow()
      .graph
      .with_node_status("2", NodeStatus::Error)
      .with_edge_active("e2-3", true);
    let lines = draw_graph(&graph);
    assert_eq!(lines[1], "[!] Validation Agent (validator)");
    assert_eq!(lines.last().unwrap(), "~ 2 -> 3 (Validation Failed)");
  }

  #[test]
  fn test_json_output_is_one_line_per_event() {
    let mut out = Vec::new();
    {
      let mut renderer = Renderer::new(&mut out, OutputFormat::Json, ScenarioCatalog::builtin());
      renderer
        .render(&EngineEvent::ViewChanged { view: View::Main })
        .unwrap();
      renderer
        .render(&EngineEvent::RunCompleted {
          run_id: "r".to_string(),
          ticks: 12,
        })
        .unwrap();
    }

    let text = String::from_utf8(out).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 2);
    let first: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
    assert_eq!(first["event"], "view_changed");
    assert_eq!(first["view"]["kind"], "main");
  }

  #[test]
  fn test_text_snapshot_header_counts_settled_nodes() {
    let scenario = main_workflow();
    let graph = scenario.final_graph();
    let mut out = Vec::new();
    {
      let mut renderer = Renderer::new(&mut out, OutputFormat::Text, ScenarioCatalog::builtin());
      renderer
        .render(&EngineEvent::Snapshot(Snapshot {
          run_id: "r".to_string(),
          generation: 1,
          sequence: 12,
          at_ms: 19_500,
          applied: vec![],
          graph,
        }))
        .unwrap();
    }
    let text = String::from_utf8(out).unwrap();
    let header = text.lines().next().unwrap();
    assert_eq!(header, "[  19.5s] #12 6/6 settled  initial");
  }

  #[test]
  fn test_text_view_title() {
    let mut out = Vec::new();
    {
      let mut renderer = Renderer::new(&mut out, OutputFormat::Text, ScenarioCatalog::builtin());
      renderer
        .render(&EngineEvent::ViewChanged {
          view: View::Subflow {
            parent: "2".to_string(),
          },
        })
        .unwrap();
    }
    let text = String::from_utf8(out).unwrap();
    assert!(text.contains("== Validation Agent Internals (back to return) =="));
  }
}
