//! Async host: performs the engine's effects against a store and delivers
//! timer ticks, operator commands and fetch results one at a time.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio::time::Instant;

use trajview_api::{StoreError, TrajectoryStore};
use trajview_core::Catalog;

use crate::engine::{Command, Effect, Engine, LoadTicket};
use crate::player::PlaybackState;
use crate::projector::Projector;
use crate::sync::Location;
use crate::timer::DeadlineTimer;

enum Fetched {
    Catalog(Result<Catalog, StoreError>),
    Trajectory(LoadTicket, Result<Vec<u8>, StoreError>),
}

pub struct ReplayHost<S, P, L> {
    store: Arc<S>,
    engine: Engine<DeadlineTimer, P, L>,
    exit_on_finish: bool,
    fetches: JoinSet<Fetched>,
}

impl<S, P, L> ReplayHost<S, P, L>
where
    S: TrajectoryStore,
    P: Projector,
    L: Location,
{
    pub fn new(store: S, engine: Engine<DeadlineTimer, P, L>) -> Self {
        Self {
            store: Arc::new(store),
            engine,
            exit_on_finish: false,
            fetches: JoinSet::new(),
        }
    }

    /// Stop as soon as playback reaches the end.
    pub fn exit_on_finish(mut self, exit: bool) -> Self {
        self.exit_on_finish = exit;
        self
    }

    /// Run until the command channel closes and nothing is left to do, or
    /// until playback finishes when `exit_on_finish` is set. Returns the
    /// engine so callers can inspect the final state.
    pub async fn run(
        mut self,
        mut commands: mpsc::UnboundedReceiver<Command>,
    ) -> Engine<DeadlineTimer, P, L> {
        let effect = self.engine.start();
        self.perform(effect);

        let mut commands_open = true;
        loop {
            let deadline = self.engine.player().timer().deadline();
            tokio::select! {
                command = commands.recv(), if commands_open => match command {
                    Some(command) => {
                        tracing::debug!("command: {command:?}");
                        if let Some(effect) = self.engine.handle(command) {
                            self.perform(effect);
                        }
                    }
                    None => commands_open = false,
                },
                Some(joined) = self.fetches.join_next(), if !self.fetches.is_empty() => match joined {
                    Ok(Fetched::Catalog(result)) => {
                        if let Some(effect) = self.engine.on_catalog_loaded(result) {
                            self.perform(effect);
                        }
                    }
                    Ok(Fetched::Trajectory(ticket, result)) => {
                        self.engine.on_trajectory_loaded(ticket, result);
                    }
                    Err(e) => tracing::error!("fetch task failed: {e}"),
                },
                _ = sleep_until(deadline), if deadline.is_some() => {
                    if let Some(ticket) = self.engine.timer_mut().take_due(Instant::now()) {
                        self.engine.on_tick(ticket);
                    }
                }
            }

            if self.exit_on_finish && self.engine.state() == PlaybackState::Finished {
                tracing::debug!("playback finished, exiting");
                break;
            }
            let idle = self.fetches.is_empty() && self.engine.player().timer().deadline().is_none();
            if !commands_open && idle {
                break;
            }
        }
        self.fetches.abort_all();
        self.engine
    }

    fn perform(&mut self, effect: Effect) {
        let store = Arc::clone(&self.store);
        match effect {
            Effect::FetchCatalog => {
                self.fetches
                    .spawn(async move { Fetched::Catalog(store.catalog().await) });
            }
            Effect::FetchTrajectory(ticket) => {
                self.fetches.spawn(async move {
                    let result = store.fetch(ticket.filename()).await;
                    Fetched::Trajectory(ticket, result)
                });
            }
        }
    }
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}
