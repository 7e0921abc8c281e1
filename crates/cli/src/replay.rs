use anyhow::{bail, Result};
use clap::Args;
use tokio::sync::{mpsc, oneshot};

use trajview_api::TrajectoryStore;
use trajview_replay::{
    Command, DeadlineTimer, Effect, Engine, Location, ManualTimer, MemoryLocation, Projector,
    ReplayError, ReplayHost, Timer,
};
use trajview_runtime_config::{PlaybackSettings, ToolPresentation, ViewerConfig};

use crate::input::{self, Input, HELP};
use crate::render::Output;
use crate::store::{Store, StoreArgs};

#[derive(Debug, Clone, Args)]
pub struct ReplayArgs {
    /// Location to open: `/`, `/<model>` or `/<model>_<task>`
    pub route: Option<String>,

    #[command(flatten)]
    pub store: StoreArgs,

    #[command(flatten)]
    pub playback: PlaybackArgs,

    /// Start playing as soon as the trajectory loads
    #[arg(long)]
    pub autoplay: bool,

    /// Exit once playback reaches the last message
    #[arg(long)]
    pub exit_on_finish: bool,
}

#[derive(Debug, Clone, Default, Args)]
pub struct PlaybackArgs {
    /// Pause between auto-played messages, in milliseconds
    #[arg(long)]
    pub delay_ms: Option<u64>,

    /// How tool calls of one message are grouped: joint or individual
    #[arg(long)]
    pub tools: Option<ToolPresentation>,

    /// Print render events as JSON lines
    #[arg(long)]
    pub json: bool,
}

impl PlaybackArgs {
    /// Flags layered over the configured playback settings.
    pub fn settings(&self, config: &PlaybackSettings) -> PlaybackSettings {
        let mut settings = config.clone();
        if let Some(delay_ms) = self.delay_ms {
            settings.message_delay_ms = delay_ms;
        }
        if let Some(tools) = self.tools {
            settings.tool_presentation = tools;
        }
        settings
    }
}

/// `/` prefixed, whatever the operator typed.
pub fn location_for(route: Option<&str>) -> MemoryLocation {
    let route = route.unwrap_or("/").trim();
    if route.starts_with('/') {
        MemoryLocation::new(route)
    } else {
        MemoryLocation::new(format!("/{route}"))
    }
}

pub async fn run_replay(args: ReplayArgs, config: ViewerConfig) -> Result<()> {
    let mut settings = args.playback.settings(&config.playback);
    settings.autoplay |= args.autoplay;
    let store = Store::open(&args.store, &config.store)?;
    tracing::info!("replaying from {}", store.describe());

    let projector = Output::new(std::io::stdout(), args.playback.json, true);
    let engine = Engine::new(
        DeadlineTimer::new(),
        projector,
        location_for(args.route.as_deref()),
        &settings,
    );

    if !args.playback.json {
        eprintln!("{HELP}");
    }
    let (tx, rx) = mpsc::unbounded_channel();
    let (quit_tx, quit_rx) = oneshot::channel();
    // Interactive stdin reads block, so they get a thread of their own.
    std::thread::spawn(move || read_commands(tx, quit_tx));

    let host = ReplayHost::new(store, engine).exit_on_finish(args.exit_on_finish);
    tokio::select! {
        engine = host.run(rx) => {
            if engine.session().is_none() {
                if let Some(err) = engine.last_error() {
                    bail!("{err}");
                }
            }
        }
        Ok(()) = quit_rx => tracing::debug!("quit requested"),
    }
    Ok(())
}

fn read_commands(tx: mpsc::UnboundedSender<Command>, quit: oneshot::Sender<()>) {
    for line in std::io::stdin().lines() {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                tracing::warn!("failed to read stdin: {e}");
                break;
            }
        };
        match input::parse_line(&line) {
            Ok(Some(Input::Command(command))) => {
                if tx.send(command).is_err() {
                    return;
                }
            }
            Ok(Some(Input::Help)) => eprintln!("{HELP}"),
            Ok(Some(Input::Quit)) => {
                let _ = quit.send(());
                return;
            }
            Ok(None) => {}
            Err(message) => eprintln!("{message}"),
        }
    }
}

/// Run the engine's effects to completion without a timer loop.
pub async fn settle<S, T, P, L>(store: &S, engine: &mut Engine<T, P, L>) -> Result<(), ReplayError>
where
    S: TrajectoryStore,
    T: Timer,
    P: Projector,
    L: Location,
{
    let mut next = Some(engine.start());
    while let Some(effect) = next.take() {
        next = match effect {
            Effect::FetchCatalog => engine.on_catalog_loaded(store.catalog().await),
            Effect::FetchTrajectory(ticket) => {
                let result = store.fetch(ticket.filename()).await;
                engine.on_trajectory_loaded(ticket, result);
                None
            }
        };
    }
    match engine.last_error() {
        Some(err) if engine.session().is_none() => Err(err.clone()),
        _ => Ok(()),
    }
}

#[derive(Debug, Clone, Args)]
pub struct ShowArgs {
    /// Trajectory to print: `/<model>_<task>` or `<model>_<task>`
    pub route: String,

    #[command(flatten)]
    pub store: StoreArgs,

    #[command(flatten)]
    pub playback: PlaybackArgs,
}

/// `trajview show`: load one trajectory and print every message.
pub async fn run_show(args: ShowArgs, config: ViewerConfig) -> Result<()> {
    let settings = args.playback.settings(&config.playback);
    let store = Store::open(&args.store, &config.store)?;
    let projector = Output::new(std::io::stdout(), args.playback.json, false);
    let mut engine = Engine::new(
        ManualTimer::new(),
        projector,
        location_for(Some(&args.route)),
        &settings,
    );
    settle(&store, &mut engine).await?;
    if engine.session().is_none() {
        bail!("no trajectory selected for {}", args.route);
    }
    engine.handle(Command::ShowAll);
    Ok(())
}

/// `trajview list`: print the catalog.
pub async fn run_list(args: StoreArgs, config: ViewerConfig) -> Result<()> {
    let store = Store::open(&args, &config.store)?;
    let catalog = store
        .catalog()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to list {}: {e}", store.describe()))?;
    if catalog.is_empty() {
        println!("no trajectories in {}", store.describe());
        return Ok(());
    }
    for model in catalog.models() {
        println!("{model}");
        for entry in catalog.tasks(model).unwrap_or_default() {
            println!("  {:<40} {}", entry.task_id, entry.filename);
        }
    }
    Ok(())
}
