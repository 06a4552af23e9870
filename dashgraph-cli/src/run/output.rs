//! Plain-text rendering of a turn's output.

use std::fmt::Write;

use dashgraph::{Message, TurnOutput};

/// Renders the new messages of the turn, then pending calls and rejected actions.
pub fn render_output(out: &TurnOutput) -> String {
    let mut s = String::new();
    for m in &out.messages {
        let _ = match m {
            Message::User { content } => writeln!(s, "[User] {}", content),
            Message::Assistant {
                content,
                tool_calls,
            } => {
                if !content.is_empty() {
                    let _ = writeln!(s, "[Assistant] {}", content);
                }
                tool_calls.iter().try_for_each(|c| {
                    writeln!(s, "[Tool call] {} {} {}", c.id, c.name, c.arguments)
                })
            }
            Message::Tool {
                name,
                content,
                is_error,
                ..
            } => {
                let label = if *is_error { "Tool error" } else { "Tool" };
                writeln!(s, "[{}] {}: {}", label, name, content)
            }
        };
    }
    if !out.pending_calls.is_empty() {
        let _ = writeln!(s, "---");
        let _ = writeln!(s, "Pending calls (answer with --tool-result CALL_ID=JSON):");
        for c in &out.pending_calls {
            let _ = writeln!(s, "  {} {} {}", c.id, c.name, c.arguments);
        }
    }
    for r in &out.rejected_actions {
        let _ = writeln!(s, "[Rejected action] {}", r);
    }
    let _ = writeln!(s, "(checkpoint {})", out.checkpoint_seq);
    s
}
