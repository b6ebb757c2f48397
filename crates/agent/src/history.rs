//! Conversation history management.
//!
//! Two pure functions over message sequences: `ensure_system_message`
//! guarantees the canonical system prompt leads the conversation, and
//! `trim_history` compacts a finished turn into a minimal, replayable
//! transcript — system, then alternating user/assistant content turns,
//! with all tool and sentinel scaffolding erased.
//!
//! Both take their input by value/reference and produce a new sequence;
//! the caller's copy is never mutated in place.

use crate::prompts::Prompts;
use wayfarer_core::message::{Message, Role};

/// Ensure the conversation history starts with the system prompt.
///
/// Idempotent: if the first message already has the system role, the
/// history is returned unchanged.
pub fn ensure_system_message(history: Vec<Message>, prompts: &Prompts) -> Vec<Message> {
    if history.first().is_some_and(|m| m.role == Role::System) {
        return history;
    }
    let mut messages = Vec::with_capacity(history.len() + 1);
    messages.push(Message::system(&prompts.system));
    messages.extend(history);
    messages
}

/// Compact a finished turn for reuse as the seed of the next one.
///
/// Drops: tool-result messages; the plan-request/execute-request sentinel
/// user messages; the assistant plan that immediately follows a
/// plan-request sentinel; and assistant messages that only carried tool
/// calls. Keeps exactly one leading system message (first wins), or
/// synthesizes the canonical one if the input had none.
pub fn trim_history(messages: &[Message], prompts: &Prompts) -> Vec<Message> {
    let mut trimmed: Vec<Message> = Vec::new();
    let mut saw_system = false;
    // One-shot: set when a plan-request sentinel is dropped, consumed by
    // the next assistant message, cleared by any ordinary user message.
    let mut skip_next_assistant_plan = false;

    for m in messages {
        match m.role {
            Role::System => {
                if !saw_system {
                    trimmed.push(Message::system(&m.content));
                    saw_system = true;
                }
            }
            Role::Tool => {}
            Role::User => {
                if m.content == prompts.plan_request || m.content == prompts.execute_request {
                    if m.content == prompts.plan_request {
                        skip_next_assistant_plan = true;
                    }
                    continue;
                }
                skip_next_assistant_plan = false;
                trimmed.push(Message::user(&m.content));
            }
            Role::Assistant => {
                if !m.tool_calls.is_empty() {
                    continue;
                }
                if skip_next_assistant_plan {
                    skip_next_assistant_plan = false;
                    continue;
                }
                trimmed.push(Message::assistant(&m.content));
            }
        }
    }

    if !saw_system {
        let mut with_system = Vec::with_capacity(trimmed.len() + 1);
        with_system.push(Message::system(&prompts.system));
        with_system.extend(trimmed);
        return with_system;
    }
    trimmed
}

#[cfg(test)]
mod tests {
    use super::*;
    use wayfarer_core::message::ToolCallRequest;

    fn prompts() -> Prompts {
        Prompts {
            system: "system prompt".into(),
            plan_request: "PLAN".into(),
            execute_request: "EXECUTE".into(),
            preferences_header: "\nprefs:\n".into(),
        }
    }

    fn roles(messages: &[Message]) -> Vec<Role> {
        messages.iter().map(|m| m.role.clone()).collect()
    }

    #[test]
    fn ensure_prepends_when_missing() {
        let p = prompts();
        let out = ensure_system_message(vec![Message::user("hi")], &p);
        assert_eq!(roles(&out), vec![Role::System, Role::User]);
        assert_eq!(out[0].content, "system prompt");
    }

    #[test]
    fn ensure_is_idempotent() {
        let p = prompts();
        let once = ensure_system_message(vec![Message::user("hi")], &p);
        let twice = ensure_system_message(once.clone(), &p);
        assert_eq!(once.len(), twice.len());
        assert_eq!(roles(&once), roles(&twice));
    }

    #[test]
    fn trim_removes_tool_scaffolding() {
        let p = prompts();
        let call = ToolCallRequest {
            id: "call_1".into(),
            index: 0,
            name: "get_current_temperature".into(),
            arguments: "{}".into(),
        };
        let messages = vec![
            Message::system("system prompt"),
            Message::user("weather in Paris"),
            Message::assistant_with_tool_calls("", vec![call]),
            Message::tool_result("call_1", "21°C"),
            Message::assistant("It's 21°C in Paris."),
        ];
        let trimmed = trim_history(&messages, &p);
        assert_eq!(roles(&trimmed), vec![Role::System, Role::User, Role::Assistant]);
        assert_eq!(trimmed[2].content, "It's 21°C in Paris.");
    }

    #[test]
    fn trim_removes_plan_scaffolding() {
        let p = prompts();
        let messages = vec![
            Message::system("system prompt"),
            Message::user("plan a trip to Rome"),
            Message::user("PLAN"),
            Message::assistant("1. check weather 2. find museums"),
            Message::user("EXECUTE"),
            Message::assistant("Here is your Rome itinerary."),
        ];
        let trimmed = trim_history(&messages, &p);
        assert_eq!(roles(&trimmed), vec![Role::System, Role::User, Role::Assistant]);
        assert_eq!(trimmed[1].content, "plan a trip to Rome");
        assert_eq!(trimmed[2].content, "Here is your Rome itinerary.");
    }

    #[test]
    fn ordinary_user_message_clears_plan_skip_flag() {
        let p = prompts();
        let messages = vec![
            Message::system("system prompt"),
            Message::user("PLAN"),
            Message::user("actually, never mind"),
            Message::assistant("Okay!"),
        ];
        let trimmed = trim_history(&messages, &p);
        // The assistant reply follows an ordinary user message, so the
        // one-shot skip must not eat it.
        assert_eq!(roles(&trimmed), vec![Role::System, Role::User, Role::Assistant]);
        assert_eq!(trimmed[2].content, "Okay!");
    }

    #[test]
    fn trim_keeps_first_system_only() {
        let p = prompts();
        let messages = vec![
            Message::system("first"),
            Message::user("hi"),
            Message::system("second"),
            Message::assistant("hello"),
        ];
        let trimmed = trim_history(&messages, &p);
        let systems: Vec<_> = trimmed.iter().filter(|m| m.role == Role::System).collect();
        assert_eq!(systems.len(), 1);
        assert_eq!(systems[0].content, "first");
    }

    #[test]
    fn trim_synthesizes_system_when_absent() {
        let p = prompts();
        let messages = vec![Message::user("hi"), Message::assistant("hello")];
        let trimmed = trim_history(&messages, &p);
        assert_eq!(trimmed[0].role, Role::System);
        assert_eq!(trimmed[0].content, "system prompt");
    }

    #[test]
    fn trim_is_idempotent_after_ensure() {
        let p = prompts();
        let messages = ensure_system_message(
            vec![
                Message::user("plan a trip to Rome"),
                Message::user("PLAN".to_string()),
                Message::assistant("the plan"),
                Message::user("EXECUTE".to_string()),
                Message::tool_result("call_1", "data"),
                Message::assistant("final answer"),
            ],
            &p,
        );
        let once = trim_history(&messages, &p);
        let twice = trim_history(&once, &p);
        assert_eq!(roles(&once), roles(&twice));
        let contents =
            |v: &[Message]| v.iter().map(|m| m.content.clone()).collect::<Vec<_>>();
        assert_eq!(contents(&once), contents(&twice));
    }
}
