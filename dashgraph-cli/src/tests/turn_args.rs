//! Unit tests for turn argument parsing: actions file, tool results, turn input.

use std::io::Write;

use dashgraph::{ConversationState, Message, ToolCall};
use serde_json::json;

use super::config_from;
use crate::run::{build_turn_input, load_actions, parse_tool_result, TurnArgs};

fn actions_file(content: &str) -> tempfile::NamedTempFile {
    let mut f = tempfile::NamedTempFile::new().unwrap();
    f.write_all(content.as_bytes()).unwrap();
    f
}

/// **Scenario**: Actions load from a bare array or an `actions` object; anything else fails.
#[test]
fn load_actions_accepts_array_and_object() {
    let f = actions_file(r#"[{ "name": "addModule", "parameters": [] }]"#);
    assert_eq!(load_actions(f.path()).unwrap().len(), 1);

    let f = actions_file(r#"{ "actions": [{ "name": "a" }, { "name": "b" }] }"#);
    assert_eq!(load_actions(f.path()).unwrap().len(), 2);

    let f = actions_file(r#"{ "name": "addModule" }"#);
    assert!(load_actions(f.path()).is_err());

    let f = actions_file("not json");
    assert!(load_actions(f.path()).is_err());
}

/// **Scenario**: CALL_ID=JSON splits at the first '='; non-JSON payloads stay strings.
#[test]
fn parse_tool_result_splits_once() {
    let (id, v) = parse_tool_result(r#"c1={"id":"m1","expr":"a=b"}"#).unwrap();
    assert_eq!(id, "c1");
    assert_eq!(v, json!({ "id": "m1", "expr": "a=b" }));

    let (_, v) = parse_tool_result("c2=module added").unwrap();
    assert_eq!(v, json!("module added"));

    assert!(parse_tool_result("no-separator").is_err());
    assert!(parse_tool_result("={}").is_err());
}

/// **Scenario**: Tool results are matched to the thread's pending calls by id.
///
/// Given: a thread whose last assistant message requested addModule as c7  
/// When: build_turn_input is called with `c7={"id":"m1"}`  
/// Then: the input carries a tool message for c7 named addModule
#[test]
fn build_turn_input_matches_pending_call() {
    let config = config_from(&[("OPENAI_API_KEY", "k"), ("THREAD_ID", "t1")]);
    let prior = ConversationState {
        messages: vec![
            Message::user("add a chart"),
            Message::assistant_with_calls("", vec![ToolCall::new("c7", "addModule", json!({}))]),
        ],
        ..Default::default()
    };
    let args = TurnArgs {
        tool_results: vec![r#"c7={"id":"m1"}"#.into()],
        ..Default::default()
    };
    let input = build_turn_input(&config, &args, Some(&prior)).unwrap();
    assert_eq!(input.thread_id, "t1");
    assert_eq!(
        input.tool_results,
        vec![Message::tool_result("c7", "addModule", r#"{"id":"m1"}"#)]
    );
    assert!(input.new_message.is_none());
}

/// **Scenario**: Unknown call ids and empty turns are rejected before anything runs.
#[test]
fn build_turn_input_rejects_bad_input() {
    let config = config_from(&[("OPENAI_API_KEY", "k")]);
    let args = TurnArgs {
        tool_results: vec!["c9=1".into()],
        ..Default::default()
    };
    let err = build_turn_input(&config, &args, None).unwrap_err();
    assert!(err.to_string().contains("c9"));

    let err = build_turn_input(&config, &TurnArgs::default(), None).unwrap_err();
    assert!(err.to_string().contains("nothing to send"));
}
