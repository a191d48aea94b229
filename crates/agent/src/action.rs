//! Parsing model replies into actions.
//!
//! The protocol is text-level: a reply that is (or contains) a JSON object
//! with a `tool_call` or `delegate` key is an action request; anything else
//! is the final answer. Parsing fails open: a malformed or unparseable reply
//! is returned to the caller verbatim as the final answer rather than being
//! dropped, so partial progress is never silently lost.

use serde_json::Value;

/// What the model asked for in one reply.
#[derive(Debug, Clone, PartialEq)]
pub enum ModelAction {
    /// A final natural-language answer, verbatim
    Final(String),

    /// Invoke a tool by name
    ToolCall { name: String, arguments: Value },

    /// Forward a sub-task to a peer agent
    Delegate { peer: String, task: String },
}

/// Parse one model reply.
///
/// At most one action per reply. When a reply carries both a `tool_call`
/// and a `delegate` payload, the tool call wins and the delegation is
/// ignored for that step; this tie-break is part of the protocol, not an
/// accident of evaluation order.
pub fn parse_action(raw: &str) -> ModelAction {
    let Some(object) = extract_object(raw) else {
        return ModelAction::Final(raw.to_string());
    };

    if let Some(call) = object.get("tool_call") {
        if let Some(name) = call.get("name").and_then(Value::as_str) {
            if !name.is_empty() {
                return ModelAction::ToolCall {
                    name: name.to_string(),
                    arguments: call
                        .get("arguments")
                        .cloned()
                        .unwrap_or_else(|| Value::Object(serde_json::Map::new())),
                };
            }
        }
    }

    if let Some(delegate) = object.get("delegate") {
        let peer = delegate.get("agent").and_then(Value::as_str).unwrap_or("");
        let task = delegate.get("task").and_then(Value::as_str).unwrap_or("");
        if !peer.is_empty() && !task.is_empty() {
            return ModelAction::Delegate {
                peer: peer.to_string(),
                task: task.to_string(),
            };
        }
    }

    ModelAction::Final(raw.to_string())
}

/// Find a JSON object in the reply: the whole trimmed text, the body of a
/// ``` fence, or the first `{`..last `}` span. Models wrap JSON in prose and
/// fences often enough that trying only the exact text would fail closed.
fn extract_object(raw: &str) -> Option<Value> {
    let trimmed = raw.trim();

    for candidate in [Some(trimmed), strip_fence(trimmed), brace_span(trimmed)]
        .into_iter()
        .flatten()
    {
        if let Ok(value @ Value::Object(_)) = serde_json::from_str::<Value>(candidate) {
            return Some(value);
        }
    }
    None
}

fn strip_fence(text: &str) -> Option<&str> {
    let rest = text.strip_prefix("```")?;
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    let end = rest.rfind("```")?;
    Some(rest[..end].trim())
}

fn brace_span(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_is_final() {
        let action = parse_action("The answer is 42.");
        assert_eq!(action, ModelAction::Final("The answer is 42.".into()));
    }

    #[test]
    fn bare_tool_call_object() {
        let action =
            parse_action(r#"{"tool_call": {"name": "math.add", "arguments": {"a": 2, "b": 3}}}"#);
        match action {
            ModelAction::ToolCall { name, arguments } => {
                assert_eq!(name, "math.add");
                assert_eq!(arguments["a"], 2);
            }
            other => panic!("expected ToolCall, got {other:?}"),
        }
    }

    #[test]
    fn fenced_tool_call_object() {
        let raw = "```json\n{\"tool_call\": {\"name\": \"echo\", \"arguments\": {}}}\n```";
        assert!(matches!(parse_action(raw), ModelAction::ToolCall { name, .. } if name == "echo"));
    }

    #[test]
    fn object_embedded_in_prose() {
        let raw = "I will use a tool.\n{\"tool_call\": {\"name\": \"echo\"}}\nStand by.";
        assert!(matches!(parse_action(raw), ModelAction::ToolCall { name, .. } if name == "echo"));
    }

    #[test]
    fn missing_arguments_default_to_empty_object() {
        match parse_action(r#"{"tool_call": {"name": "echo"}}"#) {
            ModelAction::ToolCall { arguments, .. } => {
                assert_eq!(arguments, serde_json::json!({}));
            }
            other => panic!("expected ToolCall, got {other:?}"),
        }
    }

    #[test]
    fn delegate_object() {
        let action =
            parse_action(r#"{"delegate": {"agent": "worker-1", "task": "sum the numbers"}}"#);
        assert_eq!(
            action,
            ModelAction::Delegate { peer: "worker-1".into(), task: "sum the numbers".into() }
        );
    }

    #[test]
    fn tool_call_wins_over_delegate() {
        let raw = r#"{
            "tool_call": {"name": "math.add", "arguments": {"a": 1, "b": 2}},
            "delegate": {"agent": "worker-1", "task": "do it instead"}
        }"#;
        assert!(matches!(parse_action(raw), ModelAction::ToolCall { name, .. } if name == "math.add"));
    }

    #[test]
    fn malformed_json_is_final_verbatim() {
        let raw = r#"{"tool_call": {"name": "math.add", "#;
        assert_eq!(parse_action(raw), ModelAction::Final(raw.into()));
    }

    #[test]
    fn tool_call_without_name_is_final() {
        let raw = r#"{"tool_call": {"arguments": {"a": 1}}}"#;
        assert_eq!(parse_action(raw), ModelAction::Final(raw.into()));
    }

    #[test]
    fn delegate_without_task_is_final() {
        let raw = r#"{"delegate": {"agent": "worker-1"}}"#;
        assert_eq!(parse_action(raw), ModelAction::Final(raw.into()));
    }

    #[test]
    fn unrelated_json_object_is_final() {
        let raw = r#"{"answer": 42}"#;
        assert_eq!(parse_action(raw), ModelAction::Final(raw.into()));
    }
}
