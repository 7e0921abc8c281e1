//! Playback scheduler.
//!
//! Owns the loaded [`Session`] and its cursor. Every operation emits the
//! render events for what changed followed by the resulting [`Controls`].

use std::time::Duration;

use serde::Serialize;

use trajview_core::{Message, ToolResults, Transcript, TrajectoryRef};
use trajview_runtime_config::{ToolPresentation, DEFAULT_MESSAGE_DELAY_MS};

use crate::projector::{Controls, ProjectedMessage, Projector, RenderEvent};
use crate::timer::{Timer, TimerTicket};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaybackState {
    /// No session.
    Idle,
    /// Session loaded, nothing shown yet.
    Ready,
    Playing,
    Paused,
    /// Every message is shown.
    Finished,
}

impl PlaybackState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Ready => "ready",
            Self::Playing => "playing",
            Self::Paused => "paused",
            Self::Finished => "finished",
        }
    }
}

impl std::fmt::Display for PlaybackState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Back,
}

/// One loaded trajectory. Replaced wholesale on every load.
#[derive(Debug, Clone)]
pub struct Session {
    trajectory: TrajectoryRef,
    filename: String,
    transcript: Transcript,
    cursor: usize,
}

impl Session {
    pub fn new(trajectory: TrajectoryRef, filename: impl Into<String>, transcript: Transcript) -> Self {
        Self {
            trajectory,
            filename: filename.into(),
            transcript,
            cursor: 0,
        }
    }

    pub fn model_id(&self) -> &str {
        &self.trajectory.model
    }

    pub fn task_id(&self) -> &str {
        &self.trajectory.task
    }

    pub fn trajectory(&self) -> &TrajectoryRef {
        &self.trajectory
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn messages(&self) -> &[Message] {
        &self.transcript.messages
    }

    pub fn tool_results(&self) -> &ToolResults {
        &self.transcript.tool_results
    }

    pub fn top_level_fields(&self) -> &[String] {
        &self.transcript.top_level_fields
    }

    /// Number of messages currently shown.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn len(&self) -> usize {
        self.transcript.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transcript.is_empty()
    }

    fn at_end(&self) -> bool {
        self.cursor >= self.len()
    }
}

/// Cursor-driven state machine over one session with a single pending timer.
#[derive(Debug)]
pub struct Player<T> {
    timer: T,
    delay: Duration,
    presentation: ToolPresentation,
    state: PlaybackState,
    session: Option<Session>,
    pending: Option<TimerTicket>,
    next_ticket: u64,
}

impl<T: Timer> Player<T> {
    pub fn new(timer: T, delay: Duration, presentation: ToolPresentation) -> Self {
        let delay = if delay.is_zero() {
            Duration::from_millis(DEFAULT_MESSAGE_DELAY_MS)
        } else {
            delay
        };
        Self {
            timer,
            delay,
            presentation,
            state: PlaybackState::Idle,
            session: None,
            pending: None,
            next_ticket: 0,
        }
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn cursor(&self) -> usize {
        self.session.as_ref().map_or(0, Session::cursor)
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub fn presentation(&self) -> ToolPresentation {
        self.presentation
    }

    /// The ticket the player is waiting for, if auto-play is armed.
    pub fn pending_ticket(&self) -> Option<TimerTicket> {
        self.pending
    }

    pub fn timer(&self) -> &T {
        &self.timer
    }

    pub fn timer_mut(&mut self) -> &mut T {
        &mut self.timer
    }

    /// Replace the current session. Any pending tick is canceled first.
    pub fn load(&mut self, session: Session, out: &mut impl Projector) {
        self.disarm();
        self.session = Some(session);
        self.state = PlaybackState::Ready;
        out.project(RenderEvent::Clear);
        self.emit_controls(out);
    }

    /// Drop the session, returning to `Idle`.
    pub fn unload(&mut self, out: &mut impl Projector) {
        self.disarm();
        self.session = None;
        self.state = PlaybackState::Idle;
        out.project(RenderEvent::Clear);
        self.emit_controls(out);
    }

    pub fn step(&mut self, direction: Direction, out: &mut impl Projector) {
        if !self.has_messages() {
            return;
        }
        self.pause_silently();
        match direction {
            Direction::Forward => {
                self.advance(out);
            }
            Direction::Back => self.retreat(out),
        }
        self.settle();
        self.emit_controls(out);
    }

    /// Show every remaining message. Equivalent to stepping forward until the end.
    pub fn show_all(&mut self, out: &mut impl Projector) {
        if !self.has_messages() {
            return;
        }
        self.pause_silently();
        while self.advance(out) {}
        self.settle();
        self.emit_controls(out);
    }

    /// Start auto-play. From the end, playback restarts from an empty view.
    /// The first message appears one delay after this call.
    pub fn play(&mut self, out: &mut impl Projector) {
        if !self.has_messages() || self.state == PlaybackState::Playing {
            return;
        }
        if let Some(session) = self.session.as_mut().filter(|s| s.at_end()) {
            session.cursor = 0;
            out.project(RenderEvent::Clear);
        }
        self.state = PlaybackState::Playing;
        self.arm();
        self.emit_controls(out);
    }

    pub fn pause(&mut self, out: &mut impl Projector) {
        if self.state != PlaybackState::Playing {
            return;
        }
        self.pause_silently();
        self.emit_controls(out);
    }

    /// Handle a timer tick. Returns true when the tick advanced playback.
    pub fn on_tick(&mut self, ticket: TimerTicket, out: &mut impl Projector) -> bool {
        if self.pending != Some(ticket) {
            tracing::debug!("ignoring stale timer tick {}", ticket.id());
            return false;
        }
        self.pending = None;
        if self.state != PlaybackState::Playing {
            return false;
        }
        self.advance(out);
        let finished = self.session.as_ref().is_none_or(Session::at_end);
        if finished {
            self.state = PlaybackState::Finished;
        } else {
            self.arm();
        }
        self.emit_controls(out);
        true
    }

    fn has_messages(&self) -> bool {
        self.session.as_ref().is_some_and(|s| !s.is_empty())
    }

    // Project the message at the cursor. False when already at the end.
    fn advance(&mut self, out: &mut impl Projector) -> bool {
        let Some(session) = self.session.as_mut() else {
            return false;
        };
        let Some(message) = session.transcript.messages.get(session.cursor) else {
            return false;
        };
        let projected = ProjectedMessage::new(message, &session.transcript.tool_results, self.presentation);
        session.cursor += 1;
        out.project(RenderEvent::Append(projected));
        true
    }

    fn retreat(&mut self, out: &mut impl Projector) {
        if let Some(session) = self.session.as_mut().filter(|s| s.cursor > 0) {
            session.cursor -= 1;
            out.project(RenderEvent::RemoveLast);
        }
    }

    fn pause_silently(&mut self) {
        if self.state == PlaybackState::Playing {
            self.disarm();
            self.state = PlaybackState::Paused;
        }
    }

    // State after a manual operation.
    fn settle(&mut self) {
        let Some(session) = self.session.as_ref() else {
            self.state = PlaybackState::Idle;
            return;
        };
        self.state = if session.is_empty() || session.cursor == 0 {
            PlaybackState::Ready
        } else if session.at_end() {
            PlaybackState::Finished
        } else {
            PlaybackState::Paused
        };
    }

    fn arm(&mut self) {
        self.disarm();
        self.next_ticket += 1;
        let ticket = TimerTicket(self.next_ticket);
        self.pending = Some(ticket);
        self.timer.schedule(ticket, self.delay);
    }

    fn disarm(&mut self) {
        if let Some(ticket) = self.pending.take() {
            self.timer.cancel(ticket);
        }
    }

    fn emit_controls(&self, out: &mut impl Projector) {
        let (cursor, total) = self
            .session
            .as_ref()
            .map_or((0, 0), |s| (s.cursor, s.len()));
        out.project(RenderEvent::Controls(Controls::new(self.state, cursor, total)));
    }
}
