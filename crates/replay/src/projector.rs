//! Render events and the sink that consumes them.
//!
//! The engine only ever writes to a [`Projector`]; it never reads back what
//! was shown. Replaying the same events into a fresh projector reproduces
//! the same view.

use serde::Serialize;

use trajview_core::{Message, ToolCallRef, ToolResult, ToolResults, ToolStatus};
use trajview_runtime_config::ToolPresentation;

use crate::player::PlaybackState;

/// A tool call with its correlated result and derived status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProjectedTool {
    pub call: ToolCallRef,
    pub result: Option<ToolResult>,
    pub status: ToolStatus,
}

/// One block of tool calls. Joint presentation puts every call of a message
/// in a single group, individual presentation gives each call its own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ToolGroup {
    pub tools: Vec<ProjectedTool>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProjectedMessage {
    pub message: Message,
    pub tool_groups: Vec<ToolGroup>,
}

impl ProjectedMessage {
    pub fn new(message: &Message, results: &ToolResults, presentation: ToolPresentation) -> Self {
        let tools = message.tool_calls.iter().map(|call| ProjectedTool {
            call: call.clone(),
            result: results.get(&call.id).cloned(),
            status: results.status_of(call),
        });
        let tool_groups = match presentation {
            ToolPresentation::Individual => tools.map(|tool| ToolGroup { tools: vec![tool] }).collect(),
            ToolPresentation::Joint | ToolPresentation::Unknown => {
                let tools: Vec<_> = tools.collect();
                if tools.is_empty() {
                    Vec::new()
                } else {
                    vec![ToolGroup { tools }]
                }
            }
        };
        Self {
            message: message.clone(),
            tool_groups,
        }
    }

    pub fn tools(&self) -> impl Iterator<Item = &ProjectedTool> {
        self.tool_groups.iter().flat_map(|group| group.tools.iter())
    }
}

/// Progress and which controls may be used right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Controls {
    pub state: PlaybackState,
    pub cursor: usize,
    pub total: usize,
    pub percent: u8,
    pub play: bool,
    pub pause: bool,
    pub prev: bool,
    pub next: bool,
    pub show_all: bool,
}

impl Controls {
    pub fn new(state: PlaybackState, cursor: usize, total: usize) -> Self {
        let percent = if total == 0 {
            0
        } else {
            (cursor.min(total) * 100 / total) as u8
        };
        let playing = state == PlaybackState::Playing;
        let at_end = cursor >= total;
        Self {
            state,
            cursor,
            total,
            percent,
            play: total > 0 && !playing,
            pause: playing,
            prev: cursor > 0,
            next: total > 0 && !at_end,
            show_all: total > 0 && !at_end,
        }
    }
}

/// Shown in place of messages when there is nothing to play.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmptyState {
    pub filename: Option<String>,
    pub reason: String,
    /// Top-level field names of a parseable record that held no messages.
    pub top_level_fields: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum RenderEvent {
    /// Drop every projected message.
    Clear,
    Append(ProjectedMessage),
    /// Undo the most recent `Append`.
    RemoveLast,
    Controls(Controls),
    Status { text: String },
    EmptyState(EmptyState),
    Catalog {
        models: Vec<String>,
        selected: Option<String>,
    },
    Tasks {
        model: String,
        tasks: Vec<String>,
        selected: Option<String>,
    },
}

/// External sink for render events.
pub trait Projector {
    fn project(&mut self, event: RenderEvent);
}

impl Projector for Vec<RenderEvent> {
    fn project(&mut self, event: RenderEvent) {
        self.push(event);
    }
}

impl<P: Projector + ?Sized> Projector for &mut P {
    fn project(&mut self, event: RenderEvent) {
        (**self).project(event);
    }
}

/// Rebuild the visible message list from an event stream.
pub fn visible_messages<'a>(events: impl IntoIterator<Item = &'a RenderEvent>) -> Vec<&'a ProjectedMessage> {
    let mut shown = Vec::new();
    for event in events {
        match event {
            RenderEvent::Clear => shown.clear(),
            RenderEvent::Append(message) => shown.push(message),
            RenderEvent::RemoveLast => {
                shown.pop();
            }
            _ => {}
        }
    }
    shown
}
