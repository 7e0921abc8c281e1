//! Tool-call correlation: index tool results by call id and classify them.

use regex::Regex;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::LazyLock;
use tracing::{debug, warn};

use crate::normalize;
use crate::trajectory::{Role, ToolCallRef, ToolResult, ToolStatus};

/// Prefix written by the agent harness when a tool raised.
pub const ERROR_MARKER: &str = "Error running tool";

static TRUNCATION_NOTICE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(\[[^\]\n]*truncated[^\]\n]*\]|\(truncated\)|\.\.\.\s*truncated\.?)\s*$")
        .unwrap()
});

static NAME_NOT_FOUND_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^Tool\s+\S+\s+not found").unwrap());

/// Tool results of one trajectory, keyed by tool-call id.
#[derive(Debug, Clone, Default)]
pub struct ToolResults {
    by_id: HashMap<String, ToolResult>,
}

impl ToolResults {
    pub fn get(&self, tool_call_id: &str) -> Option<&ToolResult> {
        self.by_id.get(tool_call_id)
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    /// Status of a call: `Pending` until a result with its id exists.
    pub fn status_of(&self, call: &ToolCallRef) -> ToolStatus {
        match self.get(&call.id) {
            Some(result) => classify(&call.name, &result.content),
            None => ToolStatus::Pending,
        }
    }

    fn insert(&mut self, result: ToolResult) {
        if let Some(previous) = self.by_id.insert(result.tool_call_id.clone(), result) {
            warn!(
                tool_call_id = %previous.tool_call_id,
                "duplicate tool result for call id; keeping the later one"
            );
        }
    }
}

/// Index every tool-role entry that names a `tool_call_id`.
///
/// `entries` are the raw turns before display filtering. A result without a
/// `name` borrows the name of the call it answers.
pub fn correlate(entries: &[Value]) -> ToolResults {
    let call_names: HashMap<String, String> = entries
        .iter()
        .flat_map(normalize::tool_calls)
        .map(|call| (call.id, call.name))
        .collect();

    let mut results = ToolResults::default();
    for entry in entries {
        if Role::from_label(&normalize::role_label(entry)) != Role::Tool {
            continue;
        }
        let Some(id) = entry
            .get("tool_call_id")
            .and_then(Value::as_str)
            .filter(|id| !id.is_empty())
        else {
            continue;
        };
        let name = entry
            .get("name")
            .and_then(Value::as_str)
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .or_else(|| call_names.get(id).cloned())
            .unwrap_or_default();
        results.insert(ToolResult {
            tool_call_id: id.to_string(),
            name,
            content: normalize::content_of(entry, false),
        });
    }
    results
}

/// Classify a tool result by its content. First matching rule wins:
/// error marker, truncation notice, unknown-tool notice, else normal.
pub fn classify(tool_name: &str, content: &str) -> ToolStatus {
    let matched: Vec<ToolStatus> = [
        (ToolStatus::Error, content.starts_with(ERROR_MARKER)),
        (ToolStatus::Overlong, TRUNCATION_NOTICE_RE.is_match(content)),
        (ToolStatus::NameNotFound, names_missing_tool(tool_name, content)),
    ]
    .into_iter()
    .filter_map(|(status, hit)| hit.then_some(status))
    .collect();

    if matched.len() > 1 {
        debug!(tool = tool_name, ?matched, "conflicting tool status markers");
    }
    matched.first().copied().unwrap_or(ToolStatus::Normal)
}

fn names_missing_tool(tool_name: &str, content: &str) -> bool {
    (!tool_name.is_empty() && content.starts_with(&format!("Tool {tool_name} not found")))
        || NAME_NOT_FOUND_RE.is_match(content)
}
