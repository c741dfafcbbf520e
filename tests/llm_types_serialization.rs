use mediascout::llm::types::{ChatCompletion, Message, ToolCall};
use serde_json::json;

#[test]
fn serializes_user_message_with_text_content() {
    let msg = Message::user("hi");
    let value = serde_json::to_value(msg).unwrap();
    assert_eq!(value, json!({ "role": "user", "content": "hi" }));
}

#[test]
fn serializes_assistant_message_with_text_content() {
    let msg = Message::assistant("ok");
    let value = serde_json::to_value(msg).unwrap();
    assert_eq!(value, json!({ "role": "assistant", "content": "ok" }));
}

#[test]
fn serializes_assistant_tool_calls_without_content() {
    let msg = Message::assistant_with_tool_calls(
        None,
        vec![ToolCall::function("call_1", "web_search", r#"{"query":"dune"}"#)],
    );
    let value = serde_json::to_value(msg).unwrap();
    assert_eq!(
        value,
        json!({
            "role": "assistant",
            "tool_calls": [
                {
                    "id": "call_1",
                    "type": "function",
                    "function": { "name": "web_search", "arguments": "{\"query\":\"dune\"}" }
                }
            ]
        })
    );
}

#[test]
fn serializes_tool_result_message() {
    let msg = Message::tool_result("call_1", "web_search", "Search disabled");
    let value = serde_json::to_value(msg).unwrap();
    assert_eq!(
        value,
        json!({
            "role": "tool",
            "content": "Search disabled",
            "tool_call_id": "call_1",
            "name": "web_search"
        })
    );
}

#[test]
fn deserializes_completion_with_tool_calls() {
    let body = json!({
        "id": "chatcmpl-1",
        "choices": [{
            "index": 0,
            "finish_reason": "tool_calls",
            "message": {
                "role": "assistant",
                "content": null,
                "tool_calls": [{
                    "id": "call_9",
                    "type": "function",
                    "function": { "name": "google_search", "arguments": "{\"query\":\"arcane\"}" }
                }]
            }
        }]
    });
    let completion: ChatCompletion = serde_json::from_value(body).unwrap();
    let message = &completion.choices[0].message;
    assert_eq!(message.text(), "");
    assert_eq!(message.requested_tool_calls()[0].function.name, "google_search");
    assert_eq!(completion.choices[0].finish_reason.as_deref(), Some("tool_calls"));
}

#[test]
fn deserializes_builtin_tool_call_type() {
    let call: ToolCall = serde_json::from_value(json!({
        "id": "call_2",
        "type": "builtin_function",
        "function": { "name": "$web_search", "arguments": "{}" }
    }))
    .unwrap();
    assert_eq!(call.call_type, "builtin_function");
}
