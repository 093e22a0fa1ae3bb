use super::*;

#[test]
fn test_reexports_compose() {
    let request = ChatRequest::new("mistral")
        .with_messages(vec![Message::system("Be terse"), Message::user("Hi")])
        .stream();

    assert_eq!(request.messages.len(), 2);
    assert!(request.options.stream);
    assert_eq!(request.messages[1].role, Role::User);
}

#[test]
fn test_response_roundtrip_keeps_usage() {
    let response = LLMResponse::new("ok").with_usage(TokenUsage::new(2, 3));
    let json = serde_json::to_string(&response).unwrap();
    let parsed: LLMResponse = serde_json::from_str(&json).unwrap();

    assert_eq!(parsed.usage, Some(TokenUsage::new(2, 3)));
    assert!(parsed.model.is_none());
}

#[test]
fn test_response_without_usage_deserializes() {
    let parsed: LLMResponse = serde_json::from_str(r#"{"content":"hi"}"#).unwrap();
    assert_eq!(parsed.content, "hi");
    assert!(parsed.usage.is_none());
}
