//! The replay engine: selection, loading and playback behind one command API.
//!
//! The engine is synchronous. Anything that needs I/O is returned as an
//! [`Effect`] for the host to perform; the host feeds the outcome back with
//! [`Engine::on_catalog_loaded`] or [`Engine::on_trajectory_loaded`].

use trajview_api::StoreError;
use trajview_core::{Catalog, Route, Transcript};
use trajview_runtime_config::PlaybackSettings;

use crate::error::{ReplayError, Unresolved};
use crate::player::{Direction, PlaybackState, Player, Session};
use crate::projector::{EmptyState, Projector, RenderEvent};
use crate::sync::{resolve, Location, Target};
use crate::timer::{Timer, TimerTicket};

/// Operator input, whatever the front end.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Play,
    Pause,
    Step(Direction),
    ShowAll,
    SelectModel(String),
    /// A task of the currently selected model.
    SelectTask(String),
    Select { model: String, task: String },
}

/// I/O the host must perform on the engine's behalf.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    FetchCatalog,
    FetchTrajectory(LoadTicket),
}

/// Identifies one trajectory fetch. A response is applied only while its
/// ticket is still the engine's pending load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadTicket {
    generation: u64,
    target: Target,
}

impl LoadTicket {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn filename(&self) -> &str {
        &self.target.filename
    }

    pub fn target(&self) -> &Target {
        &self.target
    }
}

pub struct Engine<T, P, L> {
    player: Player<T>,
    projector: P,
    location: L,
    autoplay: bool,
    catalog: Option<Catalog>,
    selected_model: Option<String>,
    selected_task: Option<String>,
    generation: u64,
    pending_load: Option<LoadTicket>,
    last_error: Option<ReplayError>,
}

impl<T: Timer, P: Projector, L: Location> Engine<T, P, L> {
    pub fn new(timer: T, projector: P, location: L, settings: &PlaybackSettings) -> Self {
        Self {
            player: Player::new(timer, settings.message_delay(), settings.tool_presentation),
            projector,
            location,
            autoplay: settings.autoplay,
            catalog: None,
            selected_model: None,
            selected_task: None,
            generation: 0,
            pending_load: None,
            last_error: None,
        }
    }

    pub fn state(&self) -> PlaybackState {
        self.player.state()
    }

    pub fn session(&self) -> Option<&Session> {
        self.player.session()
    }

    pub fn player(&self) -> &Player<T> {
        &self.player
    }

    pub fn timer_mut(&mut self) -> &mut T {
        self.player.timer_mut()
    }

    pub fn projector(&self) -> &P {
        &self.projector
    }

    pub fn projector_mut(&mut self) -> &mut P {
        &mut self.projector
    }

    pub fn location(&self) -> &L {
        &self.location
    }

    pub fn catalog(&self) -> Option<&Catalog> {
        self.catalog.as_ref()
    }

    pub fn selected_model(&self) -> Option<&str> {
        self.selected_model.as_deref()
    }

    pub fn selected_task(&self) -> Option<&str> {
        self.selected_task.as_deref()
    }

    pub fn pending_load(&self) -> Option<&LoadTicket> {
        self.pending_load.as_ref()
    }

    /// The most recent failure, cleared by the next successful load.
    pub fn last_error(&self) -> Option<&ReplayError> {
        self.last_error.as_ref()
    }

    pub fn into_parts(self) -> (Player<T>, P, L) {
        (self.player, self.projector, self.location)
    }

    /// First effect of every run: fetch the catalog.
    pub fn start(&mut self) -> Effect {
        self.status("Loading models...");
        Effect::FetchCatalog
    }

    pub fn handle(&mut self, command: Command) -> Option<Effect> {
        match command {
            Command::Play => self.player.play(&mut self.projector),
            Command::Pause => self.player.pause(&mut self.projector),
            Command::Step(direction) => self.player.step(direction, &mut self.projector),
            Command::ShowAll => self.player.show_all(&mut self.projector),
            Command::SelectModel(model) => self.select_model(&model),
            Command::SelectTask(task) => match self.selected_model.clone() {
                Some(model) => return self.select(&model, &task),
                None => self.status("Select a model first"),
            },
            Command::Select { model, task } => return self.select(&model, &task),
        }
        None
    }

    pub fn on_tick(&mut self, ticket: TimerTicket) -> bool {
        self.player.on_tick(ticket, &mut self.projector)
    }

    pub fn on_catalog_loaded(&mut self, result: Result<Catalog, StoreError>) -> Option<Effect> {
        let catalog = match result {
            Ok(catalog) => catalog,
            Err(err) => {
                tracing::warn!("failed to load catalog: {err}");
                self.status("Load models failed");
                self.player.unload(&mut self.projector);
                self.projector.project(RenderEvent::EmptyState(EmptyState {
                    filename: None,
                    reason: err.to_string(),
                    top_level_fields: Vec::new(),
                }));
                self.last_error = Some(ReplayError::network("catalog", err));
                return None;
            }
        };

        tracing::info!("catalog loaded: {} models", catalog.len());
        self.status("Models loaded");
        let route = Route::parse(&self.location.current());
        let resolution = resolve(&catalog, &route);
        self.catalog = Some(catalog);

        if let Some(unresolved) = resolution.unresolved {
            self.report_unresolved(unresolved);
        }
        self.selected_model = resolution.model;
        self.selected_task = resolution.task;
        self.emit_catalog();
        self.emit_tasks();
        resolution.load.map(|target| self.begin_load(target))
    }

    pub fn on_trajectory_loaded(&mut self, ticket: LoadTicket, result: Result<Vec<u8>, StoreError>) {
        if self.pending_load.as_ref() != Some(&ticket) {
            tracing::debug!(
                "dropping stale response for {} (generation {})",
                ticket.filename(),
                ticket.generation()
            );
            return;
        }
        self.pending_load = None;
        let target = ticket.target;

        let bytes = match result {
            Ok(bytes) => bytes,
            Err(err) => {
                tracing::warn!("failed to load {}: {err}", target.filename);
                self.status("Trajectory load failed");
                self.projector.project(RenderEvent::EmptyState(EmptyState {
                    filename: Some(target.filename.clone()),
                    reason: err.to_string(),
                    top_level_fields: Vec::new(),
                }));
                self.last_error = Some(ReplayError::network(&target.filename, err));
                return;
            }
        };

        let session = match serde_json::from_slice::<serde_json::Value>(&bytes) {
            Ok(raw) => Session::new(
                target.trajectory_ref(),
                &target.filename,
                Transcript::from_record(&raw),
            ),
            Err(err) => {
                tracing::warn!("malformed trajectory {}: {err}", target.filename);
                let error = ReplayError::MalformedPayload {
                    filename: target.filename.clone(),
                    message: err.to_string(),
                };
                let reason = error.to_string();
                self.player.load(
                    Session::new(target.trajectory_ref(), &target.filename, Transcript::default()),
                    &mut self.projector,
                );
                self.status("Trajectory load failed");
                self.projector.project(RenderEvent::EmptyState(EmptyState {
                    filename: Some(target.filename.clone()),
                    reason,
                    top_level_fields: Vec::new(),
                }));
                self.last_error = Some(error);
                self.location.replace(&target.trajectory_ref().path());
                return;
            }
        };

        let count = session.len();
        tracing::info!("loaded {} ({count} messages)", target.filename);
        if session.is_empty() {
            let fields = session.top_level_fields().to_vec();
            tracing::warn!(
                "{} has no recognizable message container; top-level fields: {}",
                target.filename,
                fields.join(", ")
            );
        }
        let empty_state = session.is_empty().then(|| EmptyState {
            filename: Some(target.filename.clone()),
            reason: "no messages found".to_string(),
            top_level_fields: session.top_level_fields().to_vec(),
        });

        self.player.load(session, &mut self.projector);
        self.last_error = None;
        self.status(format!("Loaded: {} ({count} msgs)", target.filename));
        if let Some(empty_state) = empty_state {
            self.projector.project(RenderEvent::EmptyState(empty_state));
        }
        self.location.replace(&target.trajectory_ref().path());
        if self.autoplay {
            self.player.play(&mut self.projector);
        }
    }

    /// Lists the model's tasks and rewrites the location to `/<model>`.
    /// The current session is left alone and keeps playing until a task
    /// is picked.
    fn select_model(&mut self, model: &str) {
        let known = self
            .catalog
            .as_ref()
            .is_some_and(|catalog| catalog.contains_model(model));
        if !known {
            self.report_unresolved(Unresolved::Model(model.to_string()));
            return;
        }
        self.pending_load = None;
        tracing::debug!(
            "model {model} selected; current session stays {:?}",
            self.player.state()
        );
        self.selected_model = Some(model.to_string());
        self.selected_task = None;
        self.emit_tasks();
        self.location.replace(&Route::Model(model.to_string()).path());
    }

    fn select(&mut self, model: &str, task: &str) -> Option<Effect> {
        let Some(catalog) = self.catalog.as_ref() else {
            tracing::debug!("selection before catalog load ignored");
            return None;
        };
        if !catalog.contains_model(model) {
            self.report_unresolved(Unresolved::Model(model.to_string()));
            return None;
        }
        let Some(entry) = catalog.find_task(model, task) else {
            self.report_unresolved(Unresolved::Task {
                model: model.to_string(),
                task: task.to_string(),
            });
            return None;
        };
        let target = Target::new(model, entry);
        let model_changed = self.selected_model.as_deref() != Some(model);
        self.selected_model = Some(model.to_string());
        self.selected_task = Some(target.task.clone());
        if model_changed {
            self.emit_tasks();
        }
        Some(self.begin_load(target))
    }

    // The old session is discarded as soon as a new load starts.
    fn begin_load(&mut self, target: Target) -> Effect {
        self.generation += 1;
        tracing::debug!("loading {} (generation {})", target.filename, self.generation);
        self.player.unload(&mut self.projector);
        let ticket = LoadTicket {
            generation: self.generation,
            target,
        };
        self.pending_load = Some(ticket.clone());
        Effect::FetchTrajectory(ticket)
    }

    fn report_unresolved(&mut self, unresolved: Unresolved) {
        tracing::warn!("{unresolved}");
        self.status(unresolved.to_string());
        self.last_error = Some(ReplayError::UnresolvedSelection(unresolved));
    }

    fn status(&mut self, text: impl Into<String>) {
        self.projector.project(RenderEvent::Status { text: text.into() });
    }

    fn emit_catalog(&mut self) {
        let models = self
            .catalog
            .as_ref()
            .map(|catalog| catalog.models().map(str::to_string).collect())
            .unwrap_or_default();
        self.projector.project(RenderEvent::Catalog {
            models,
            selected: self.selected_model.clone(),
        });
    }

    fn emit_tasks(&mut self) {
        let (Some(catalog), Some(model)) = (self.catalog.as_ref(), self.selected_model.as_ref()) else {
            return;
        };
        let tasks = catalog
            .tasks(model)
            .map(|tasks| tasks.iter().map(|entry| entry.task_id.clone()).collect())
            .unwrap_or_default();
        self.projector.project(RenderEvent::Tasks {
            model: model.clone(),
            tasks,
            selected: self.selected_task.clone(),
        });
    }
}
