use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::info;

use loanflow_engine::{
  ChannelNotifier, EngineConfig, EngineEvent, Gesture, Session, SessionConfig, StatusEngine,
  ViewSelector,
};
use loanflow_scenario::{MAIN_SCENARIO, ScenarioCatalog, VALIDATION_PARENT};

mod render;

use render::{OutputFormat, Renderer};

/// Loanflow - replays a loan approval workflow as a live status trace
#[derive(Parser)]
#[command(name = "loanflow")]
#[command(version, about, long_about = None)]
struct Cli {
  /// Log filter to use when RUST_LOG is not set
  #[arg(long, global = true, default_value = "warn")]
  log_level: String,

  /// Print one JSON object per line instead of text
  #[arg(long, global = true)]
  json: bool,

  #[command(subcommand)]
  command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
  /// Play a scenario
  Run {
    /// Scenario to play (see `loanflow scenarios`)
    #[arg(long, default_value = MAIN_SCENARIO)]
    scenario: String,

    /// Playback speed relative to the authored timeline
    #[arg(long, default_value_t = 1.0)]
    speed: f64,

    /// Open the validation agent this many authored ms into the main run
    #[arg(long)]
    drill_down: Option<u64>,

    /// Go back to the main workflow this many authored ms after drilling down
    #[arg(long, requires = "drill_down")]
    back_after: Option<u64>,
  },

  /// List the built-in scenarios
  Scenarios,

  /// Check every built-in script against its graph
  Validate,
}

fn main() -> Result<()> {
  let cli = Cli::parse();

  tracing_subscriber::fmt()
    .with_env_filter(
      tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cli.log_level)),
    )
    .with_writer(std::io::stderr)
    .init();

  let format = if cli.json {
    OutputFormat::Json
  } else {
    OutputFormat::Text
  };

  match cli.command {
    Some(Commands::Run {
      scenario,
      speed,
      drill_down,
      back_after,
    }) => {
      let plan = RunPlan {
        scenario,
        speed,
        drill_down,
        back_after,
        format,
      };
      let rt = tokio::runtime::Runtime::new()?;
      rt.block_on(run_scenario(plan))?;
    }
    Some(Commands::Scenarios) => list_scenarios(format)?,
    Some(Commands::Validate) => validate_scenarios()?,
    None => {
      println!("loanflow - use --help to see available commands");
    }
  }

  Ok(())
}

struct RunPlan {
  scenario: String,
  speed: f64,
  drill_down: Option<u64>,
  back_after: Option<u64>,
  format: OutputFormat,
}

async fn run_scenario(plan: RunPlan) -> Result<()> {
  let catalog = ScenarioCatalog::builtin();
  let config = EngineConfig::with_speed(plan.speed).context("invalid --speed")?;
  let (notifier, mut events) = ChannelNotifier::channel();
  let engine =
    StatusEngine::with_notifier(config, notifier).context("failed to create status engine")?;
  let mut renderer = Renderer::new(std::io::stdout(), plan.format, catalog.clone());

  if plan.scenario != MAIN_SCENARIO {
    if plan.drill_down.is_some() {
      bail!("--drill-down only applies to the '{}' scenario", MAIN_SCENARIO);
    }
    let scenario = catalog
      .get(&plan.scenario)
      .with_context(|| format!("unknown scenario '{}'", plan.scenario))?;

    let handle = engine.start_scenario(scenario)?;
    while let Some(event) = events.recv().await {
      renderer.render(&event)?;
      if matches!(event, EngineEvent::RunCompleted { .. }) {
        break;
      }
    }
    engine.cancel(&handle);
    return Ok(());
  }

  let selector = ViewSelector::new(engine, catalog);
  let session = Session::new(selector, SessionConfig::default())?;
  let gestures_done = spawn_gesture_script(session.sender(), &plan, config);

  let cancel = CancellationToken::new();
  let session_task = tokio::spawn(session.run(cancel.clone()));

  loop {
    tokio::select! {
      _ = tokio::signal::ctrl_c() => {
        info!("interrupted");
        break;
      }
      event = events.recv() => {
        let Some(event) = event else { break };
        renderer.render(&event)?;
        if matches!(event, EngineEvent::RunCompleted { .. }) && gestures_done.is_cancelled() {
          break;
        }
      }
    }
  }

  cancel.cancel();
  let view = session_task.await.context("session task failed")??;
  info!(view = ?view, "session finished");
  Ok(())
}

/// Send the requested drill-down and back gestures at their scaled times.
///
/// The returned token is cancelled once every gesture has been sent.
fn spawn_gesture_script(
  sender: mpsc::Sender<Gesture>,
  plan: &RunPlan,
  config: EngineConfig,
) -> CancellationToken {
  let done = CancellationToken::new();
  let scale = |ms: u64| config.scale(Duration::from_millis(ms));
  let drill_down = plan.drill_down.map(scale);
  let back_after = plan.back_after.map(scale);

  let token = done.clone();
  tokio::spawn(async move {
    if let Some(delay) = drill_down {
      tokio::time::sleep(delay).await;
      let _ = sender
        .send(Gesture::ActivateNode {
          node_id: VALIDATION_PARENT.to_string(),
        })
        .await;
    }
    if let Some(delay) = back_after {
      tokio::time::sleep(delay).await;
      let _ = sender.send(Gesture::Back).await;
    }
    token.cancel();
  });

  done
}

fn list_scenarios(format: OutputFormat) -> Result<()> {
  let catalog = ScenarioCatalog::builtin();

  let parent_of = |name: &str| {
    catalog
      .subflows()
      .find(|(_, s)| s.name == name)
      .map(|(parent, _)| parent.to_string())
  };

  for scenario in catalog.scenarios() {
    let parent = parent_of(&scenario.name);
    match format {
      OutputFormat::Json => {
        let entry = serde_json::json!({
          "name": scenario.name,
          "title": scenario.title,
          "parent": parent,
          "nodes": scenario.graph.nodes.len(),
          "edges": scenario.graph.edges.len(),
          "steps": scenario.script.len(),
          "duration_ms": scenario.script.total_delay_ms(),
        });
        println!("{}", entry);
      }
      OutputFormat::Text => {
        let origin = parent
          .map(|p| format!("drill-down from node {}", p))
          .unwrap_or_else(|| "entry view".to_string());
        println!(
          "{:<12} {:<28} {} nodes, {} edges, {} steps, {:.1}s, {}",
          scenario.name,
          scenario.title,
          scenario.graph.nodes.len(),
          scenario.graph.edges.len(),
          scenario.script.len(),
          scenario.script.total_delay_ms() as f64 / 1000.0,
          origin
        );
      }
    }
  }

  Ok(())
}

fn validate_scenarios() -> Result<()> {
  let catalog = ScenarioCatalog::builtin();

  for scenario in catalog.scenarios() {
    scenario
      .validate()
      .with_context(|| format!("scenario '{}' failed validation", scenario.name))?;
    eprintln!("ok  {} ({} steps)", scenario.name, scenario.script.len());
  }
  catalog.validate().context("scenario catalog failed validation")?;

  Ok(())
}
