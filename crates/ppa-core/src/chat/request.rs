use serde::{Deserialize, Serialize};
use crate::types::Message;

/// Chat completion request
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<Message>,
    #[serde(default)]
    pub options: ChatOptions,
}

impl ChatRequest {
    /// Create a new chat request
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            messages: Vec::new(),
            options: ChatOptions::default(),
        }
    }

    /// Add a message to the request
    pub fn with_message(mut self, message: Message) -> Self {
        self.messages.push(message);
        self
    }

    /// Add multiple messages
    pub fn with_messages(mut self, messages: Vec<Message>) -> Self {
        self.messages.extend(messages);
        self
    }

    /// Set options
    pub fn with_options(mut self, options: ChatOptions) -> Self {
        self.options = options;
        self
    }

    /// Enable streaming
    pub fn stream(mut self) -> Self {
        self.options.stream = true;
        self
    }

    /// Set temperature
    pub fn temperature(mut self, temp: f32) -> Self {
        self.options.temperature = Some(temp);
        self
    }

    /// Set max tokens
    pub fn max_tokens(mut self, max: u32) -> Self {
        self.options.max_tokens = Some(max);
        self
    }

    pub fn has_system_prompt(&self) -> bool {
        self.messages.iter().any(Message::is_system)
    }
}

/// Single-prompt completion request
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionRequest {
    pub model: String,
    pub prompt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,
    #[serde(default)]
    pub options: ChatOptions,
}

impl CompletionRequest {
    pub fn new(model: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            prompt: prompt.into(),
            system_prompt: None,
            options: ChatOptions::default(),
        }
    }

    /// Set the system prompt
    pub fn with_system_prompt(mut self, system_prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(system_prompt.into());
        self
    }

    /// Set options
    pub fn with_options(mut self, options: ChatOptions) -> Self {
        self.options = options;
        self
    }
}

/// Options for chat and completion requests
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,
    #[serde(default)]
    pub stream: bool,
}

impl ChatOptions {
    /// Create default options
    pub fn new() -> Self {
        Self::default()
    }

    /// Set temperature (0.0 - 2.0)
    pub fn with_temperature(mut self, temp: f32) -> Self {
        self.temperature = Some(temp);
        self
    }

    /// Set max tokens
    pub fn with_max_tokens(mut self, max: u32) -> Self {
        self.max_tokens = Some(max);
        self
    }

    /// Set top_p (0.0 - 1.0)
    pub fn with_top_p(mut self, top_p: f32) -> Self {
        self.top_p = Some(top_p);
        self
    }

    /// Enable streaming
    pub fn with_streaming(mut self) -> Self {
        self.stream = true;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Message;

    #[test]
    fn test_chat_request_builder() {
        let request = ChatRequest::new("llama3")
            .with_message(Message::system("Be brief"))
            .with_message(Message::user("Hello"))
            .temperature(0.7)
            .max_tokens(100);

        assert_eq!(request.model, "llama3");
        assert_eq!(request.messages.len(), 2);
        assert!(request.has_system_prompt());
        assert_eq!(request.options.temperature, Some(0.7));
        assert_eq!(request.options.max_tokens, Some(100));
    }

    #[test]
    fn test_completion_request() {
        let request = CompletionRequest::new("codellama", "fn main() {")
            .with_system_prompt("Complete the Rust code")
            .with_options(ChatOptions::new().with_max_tokens(64).with_streaming());

        assert_eq!(request.system_prompt.as_deref(), Some("Complete the Rust code"));
        assert!(request.options.stream);

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["systemPrompt"], "Complete the Rust code");
        assert_eq!(json["options"]["maxTokens"], 64);
    }
}
