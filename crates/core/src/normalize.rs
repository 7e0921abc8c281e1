//! Normalization of trajectory records into canonical [`Message`]s.
//!
//! Records arrive in many shapes: a bare array of turns, or an object that
//! keeps its turns under one of several historical field names. Each turn can
//! carry its text as a string, as typed content parts, or under ad hoc fields.
//! Everything here is total: an unrecognized record yields no messages and an
//! unrecognized turn is kept as its serialized JSON.

use serde_json::{Map, Value};

use crate::trajectory::{Message, Role, ToolCallRef};

/// Role label used when an entry has neither `role` nor `type`.
pub const DEFAULT_ROLE_LABEL: &str = "message";

/// Diagnostics never list more top-level fields than this.
pub const MAX_REPORTED_FIELDS: usize = 20;

const TIMESTAMP_FIELDS: &[&str] = &["timestamp", "created_at", "time"];
const FAILURE_REASON_FIELDS: &[&str] = &["failure_reason", "fail_reason", "error", "reason"];
const FAILURE_STATUSES: &[&str] = &["failed", "failure", "error"];

/// Where the turn array of a record may live.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntrySource {
    /// The record itself is the array.
    Root,
    /// A top-level field.
    Field(&'static str),
    /// A field of a top-level object.
    Nested(&'static str, &'static str),
}

/// Probe order. The first source that holds an array wins.
pub const ENTRY_SOURCES: &[EntrySource] = &[
    EntrySource::Root,
    EntrySource::Field("messages"),
    EntrySource::Nested("data", "messages"),
    EntrySource::Field("trajectory"),
    EntrySource::Field("turns"),
    EntrySource::Field("conversation"),
    EntrySource::Field("chat"),
    EntrySource::Field("steps"),
    EntrySource::Field("logs"),
    EntrySource::Field("events"),
];

impl EntrySource {
    /// Return the array at this source, or `None` when absent or not an array.
    pub fn probe<'a>(&self, raw: &'a Value) -> Option<&'a [Value]> {
        let found = match self {
            Self::Root => raw,
            Self::Field(field) => raw.get(*field)?,
            Self::Nested(outer, inner) => raw.get(*outer)?.get(*inner)?,
        };
        found.as_array().map(Vec::as_slice)
    }
}

/// Locate the raw turn entries of a record.
pub fn entries(raw: &Value) -> &[Value] {
    ENTRY_SOURCES
        .iter()
        .find_map(|source| source.probe(raw))
        .unwrap_or(&[])
}

/// The source that [`entries`] would read from, if any.
pub fn entry_source(raw: &Value) -> Option<EntrySource> {
    ENTRY_SOURCES
        .iter()
        .copied()
        .find(|source| source.probe(raw).is_some())
}

/// Convert every entry of a record into a canonical message, in source order.
pub fn normalize(raw: &Value) -> Vec<Message> {
    entries(raw)
        .iter()
        .enumerate()
        .map(|(index, entry)| message_from_entry(entry, index))
        .collect()
}

pub fn message_from_entry(entry: &Value, index: usize) -> Message {
    let raw_role = role_label(entry);
    let tool_calls = tool_calls(entry);
    let content = content_of(entry, !tool_calls.is_empty());
    Message {
        role: Role::from_label(&raw_role),
        raw_role,
        content,
        tool_calls,
        timestamp: timestamp(entry),
        index,
        is_synthetic: false,
    }
}

/// Apply the display policy: hide tool-role turns, inject the failure reason
/// after the last assistant turn, and renumber.
pub fn display_messages(raw: &Value, messages: Vec<Message>) -> Vec<Message> {
    let mut shown: Vec<Message> = messages
        .into_iter()
        .filter(|message| message.role != Role::Tool)
        .collect();

    if let Some(reason) = failure_reason(raw) {
        let at = shown
            .iter()
            .rposition(|message| message.role == Role::Assistant)
            .map_or(shown.len(), |last| last + 1);
        shown.insert(at, Message::synthetic_system(format!("Failure reason: {reason}")));
    }

    for (index, message) in shown.iter_mut().enumerate() {
        message.index = index;
    }
    shown
}

/// The explanation a record gives for failing, when it says it failed.
pub fn failure_reason(raw: &Value) -> Option<&str> {
    let obj = raw.as_object()?;
    let failed = obj.get("success").and_then(Value::as_bool) == Some(false)
        || obj.get("failed").and_then(Value::as_bool) == Some(true)
        || obj
            .get("status")
            .and_then(Value::as_str)
            .is_some_and(|status| {
                FAILURE_STATUSES.contains(&status.trim().to_ascii_lowercase().as_str())
            });
    if !failed {
        return None;
    }
    FAILURE_REASON_FIELDS
        .iter()
        .find_map(|field| non_empty_str(obj.get(*field)))
        .map(str::trim)
}

/// Top-level field names of an object record, for empty-state diagnostics.
pub fn top_level_fields(raw: &Value) -> Vec<String> {
    raw.as_object()
        .map(|obj| obj.keys().take(MAX_REPORTED_FIELDS).cloned().collect())
        .unwrap_or_default()
}

pub(crate) fn role_label(entry: &Value) -> String {
    non_empty_str(entry.get("role"))
        .or_else(|| non_empty_str(entry.get("type")))
        .unwrap_or(DEFAULT_ROLE_LABEL)
        .to_string()
}

pub(crate) fn content_of(entry: &Value, has_tool_calls: bool) -> String {
    match entry.get("content") {
        Some(Value::String(text)) => return text.clone(),
        Some(Value::Array(parts)) => return text_parts(parts),
        Some(Value::Object(obj)) => return object_content(entry, obj),
        _ => {}
    }

    if let Some(text) = non_empty_str(entry.get("text"))
        .or_else(|| non_empty_str(entry.get("message")))
        .or_else(|| entry.get("delta").and_then(Value::as_str))
    {
        return text.to_string();
    }

    if has_tool_calls {
        return String::new();
    }
    entry.to_string()
}

fn object_content(entry: &Value, obj: &Map<String, Value>) -> String {
    non_empty_str(obj.get("text"))
        .or_else(|| non_empty_str(obj.get("message")))
        .or_else(|| non_empty_str(entry.get("text")))
        .or_else(|| non_empty_str(entry.get("message")))
        .map(str::to_string)
        .unwrap_or_else(|| serde_json::to_string(obj).unwrap_or_default())
}

fn text_parts(parts: &[Value]) -> String {
    parts
        .iter()
        .filter(|part| part_type(part) == Some("text"))
        .filter_map(|part| {
            non_empty_str(part.get("text")).or_else(|| non_empty_str(part.get("content")))
        })
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

pub(crate) fn tool_calls(entry: &Value) -> Vec<ToolCallRef> {
    let mut calls: Vec<ToolCallRef> = entry
        .get("tool_calls")
        .and_then(Value::as_array)
        .map(|list| list.iter().filter_map(function_call).collect())
        .unwrap_or_default();

    if let Some(parts) = entry.get("content").and_then(Value::as_array) {
        calls.extend(
            parts
                .iter()
                .filter(|part| part_type(part) == Some("tool_use"))
                .filter_map(tool_use_part),
        );
    }
    calls
}

// {"id", "type": "function", "function": {"name", "arguments"}}
fn function_call(call: &Value) -> Option<ToolCallRef> {
    let id = non_empty_str(call.get("id"))?;
    let function = call.get("function");
    let name = function
        .and_then(|f| f.get("name"))
        .or_else(|| call.get("name"))
        .and_then(Value::as_str)
        .unwrap_or_default();
    let arguments = function
        .and_then(|f| f.get("arguments"))
        .or_else(|| call.get("arguments"));
    Some(ToolCallRef {
        id: id.to_string(),
        name: name.to_string(),
        arguments_json: arguments_json(arguments),
    })
}

// {"type": "tool_use", "id", "name", "input"}
fn tool_use_part(part: &Value) -> Option<ToolCallRef> {
    let id = non_empty_str(part.get("id"))?;
    Some(ToolCallRef {
        id: id.to_string(),
        name: part
            .get("name")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        arguments_json: arguments_json(part.get("input")),
    })
}

fn arguments_json(arguments: Option<&Value>) -> String {
    match arguments {
        Some(Value::String(text)) => text.clone(),
        None | Some(Value::Null) => "{}".to_string(),
        Some(other) => other.to_string(),
    }
}

fn timestamp(entry: &Value) -> Option<String> {
    TIMESTAMP_FIELDS
        .iter()
        .find_map(|field| match entry.get(*field)? {
            Value::String(text) if !text.is_empty() => Some(text.clone()),
            Value::Number(number) => Some(number.to_string()),
            _ => None,
        })
}

fn part_type(part: &Value) -> Option<&str> {
    part.get("type").and_then(Value::as_str)
}

fn non_empty_str(value: Option<&Value>) -> Option<&str> {
    value.and_then(Value::as_str).filter(|text| !text.is_empty())
}
