//! Prompt assembly for one inference step.

use agentry_core::message::ChatMessage;
use agentry_core::peer::PeerSummary;
use agentry_core::tool::ToolDescriptor;

/// The action-protocol instructions appended to every system prompt.
const PROTOCOL: &str = "\
When you need to act, reply with exactly one JSON object and nothing else:
- to call a tool: {\"tool_call\": {\"name\": \"<tool name>\", \"arguments\": {...}}}
- to delegate to a peer agent: {\"delegate\": {\"agent\": \"<peer name>\", \"task\": \"<task>\"}}
One action per reply. When you have the answer, reply with plain text.";

/// Assemble the messages for one inference step.
///
/// `conversation` is the bounded transcript from the session store;
/// `action_log` is this invocation's own tool/delegation history, so the
/// model sees the results (and failures) of its previous steps.
pub fn build_messages(
    instructions: &str,
    tools: &[ToolDescriptor],
    peers: &[PeerSummary],
    conversation: &str,
    action_log: &[String],
    task: &str,
) -> Vec<ChatMessage> {
    let mut system = String::from(instructions);

    if !tools.is_empty() {
        system.push_str("\n\nAvailable tools:\n");
        for tool in tools {
            system.push_str(&format!("- {}: {}\n", tool.name, tool.description));
            if !tool.parameters.is_null() {
                system.push_str(&format!("  arguments schema: {}\n", tool.parameters));
            }
        }
    }

    if !peers.is_empty() {
        system.push_str("\nPeer agents you can delegate to:\n");
        for peer in peers {
            if peer.description.is_empty() {
                system.push_str(&format!("- {}\n", peer.name));
            } else {
                system.push_str(&format!("- {}: {}\n", peer.name, peer.description));
            }
        }
    }

    system.push_str("\n\n");
    system.push_str(PROTOCOL);

    let mut messages = vec![ChatMessage::system(system)];

    if !conversation.is_empty() {
        messages.push(ChatMessage::user(format!(
            "Conversation so far:\n{conversation}"
        )));
    }

    if !action_log.is_empty() {
        messages.push(ChatMessage::user(format!(
            "Actions taken for the current task:\n{}",
            action_log.join("\n")
        )));
    }

    messages.push(ChatMessage::user(task.to_string()));
    messages
}
