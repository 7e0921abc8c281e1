use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::correlate::{self, ToolResults};
use crate::normalize;

/// Canonical speaker of a message, independent of the source JSON shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
    Unknown,
}

impl Role {
    /// Map a raw `role`/`type` label onto a canonical role.
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "system" | "developer" => Self::System,
            "user" | "human" => Self::User,
            "assistant" | "agent" | "model" | "ai" => Self::Assistant,
            "tool" | "function" => Self::Tool,
            _ => Self::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::System => "system",
            Self::User => "user",
            Self::Assistant => "assistant",
            Self::Tool => "tool",
            Self::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A tool invocation issued by an assistant message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCallRef {
    pub id: String,
    pub name: String,
    /// Arguments as JSON text, kept verbatim when the source already had a string.
    pub arguments_json: String,
}

/// The recorded outcome of a tool call, keyed by the call id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolResult {
    pub tool_call_id: String,
    pub name: String,
    pub content: String,
}

/// Derived status of a tool call. Never stored, always recomputed from the result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolStatus {
    Normal,
    Overlong,
    Error,
    NameNotFound,
    Pending,
}

impl ToolStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Overlong => "overlong",
            Self::Error => "error",
            Self::NameNotFound => "name_not_found",
            Self::Pending => "pending",
        }
    }
}

impl std::fmt::Display for ToolStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One turn of a trajectory in canonical form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    /// The label found in the source (`"message"` when it had none).
    pub raw_role: String,
    pub content: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCallRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    /// Position in the displayed sequence.
    pub index: usize,
    /// Set on messages fabricated by the engine rather than read from the record.
    #[serde(default)]
    pub is_synthetic: bool,
}

impl Message {
    /// An engine-authored system message. The index is assigned by the caller.
    pub fn synthetic_system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            raw_role: Role::System.as_str().to_string(),
            content: content.into(),
            tool_calls: Vec::new(),
            timestamp: None,
            index: 0,
            is_synthetic: true,
        }
    }
}

/// Everything the player needs from one trajectory record: the displayed
/// messages, the tool results they refer to, and the record's top-level
/// fields for diagnostics when nothing could be displayed.
#[derive(Debug, Clone, Default)]
pub struct Transcript {
    pub messages: Vec<Message>,
    pub tool_results: ToolResults,
    pub top_level_fields: Vec<String>,
}

impl Transcript {
    pub fn from_record(raw: &Value) -> Self {
        let messages = normalize::display_messages(raw, normalize::normalize(raw));
        let tool_results = correlate::correlate(normalize::entries(raw));
        Self {
            messages,
            tool_results,
            top_level_fields: normalize::top_level_fields(raw),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }
}
