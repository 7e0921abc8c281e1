use serde_json::{json, Value};

use crate::{Message, Transcript};

/// `{"role": "user", "content": text}`
pub fn user(text: &str) -> Value {
    json!({"role": "user", "content": text})
}

/// `{"role": "assistant", "content": text}`
pub fn assistant(text: &str) -> Value {
    json!({"role": "assistant", "content": text})
}

/// `{"role": "system", "content": text}`
pub fn system(text: &str) -> Value {
    json!({"role": "system", "content": text})
}

/// Assistant turn issuing one OpenAI-style tool call.
pub fn assistant_calling(text: &str, call_id: &str, tool: &str, arguments: &str) -> Value {
    json!({
        "role": "assistant",
        "content": text,
        "tool_calls": [{
            "id": call_id,
            "type": "function",
            "function": {"name": tool, "arguments": arguments}
        }]
    })
}

/// Tool-role turn answering `call_id`.
pub fn tool_result(call_id: &str, content: &str) -> Value {
    json!({"role": "tool", "tool_call_id": call_id, "content": content})
}

/// Array record of `n` alternating user/assistant turns.
pub fn conversation(n: usize) -> Value {
    Value::Array(
        (0..n)
            .map(|i| {
                if i % 2 == 0 {
                    user(&format!("user turn {i}"))
                } else {
                    assistant(&format!("assistant turn {i}"))
                }
            })
            .collect(),
    )
}

/// Transcript of `n` alternating turns.
pub fn transcript(n: usize) -> Transcript {
    Transcript::from_record(&conversation(n))
}

/// Contents of a message slice, for compact assertions.
pub fn contents(messages: &[Message]) -> Vec<&str> {
    messages.iter().map(|m| m.content.as_str()).collect()
}
