use serde::{Deserialize, Serialize};

/// Completion response returned by a provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LLMResponse {
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<TokenUsage>,
}

impl LLMResponse {
    /// Create a new response
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            model: None,
            usage: None,
        }
    }

    /// Set the model that produced the response
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Set usage
    pub fn with_usage(mut self, usage: TokenUsage) -> Self {
        self.usage = Some(usage);
        self
    }
}

/// Token usage information
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenUsage {
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    pub total_tokens: u64,
}

impl TokenUsage {
    /// Create new usage info, total is derived
    pub fn new(prompt: u64, completion: u64) -> Self {
        Self {
            prompt_tokens: prompt,
            completion_tokens: completion,
            total_tokens: prompt.saturating_add(completion),
        }
    }

    /// Add another usage to this one
    pub fn add(&mut self, other: &TokenUsage) {
        self.prompt_tokens = self.prompt_tokens.saturating_add(other.prompt_tokens);
        self.completion_tokens = self.completion_tokens.saturating_add(other.completion_tokens);
        self.total_tokens = self.total_tokens.saturating_add(other.total_tokens);
    }

    /// Whether `total_tokens` is exactly prompt + completion
    pub fn is_consistent(&self) -> bool {
        self.prompt_tokens.checked_add(self.completion_tokens) == Some(self.total_tokens)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_llm_response() {
        let response = LLMResponse::new("Hello!")
            .with_model("llama3")
            .with_usage(TokenUsage::new(10, 5));

        assert_eq!(response.content, "Hello!");
        assert_eq!(response.model.as_deref(), Some("llama3"));
        assert_eq!(response.usage.unwrap().total_tokens, 15);
    }

    #[test]
    fn test_token_usage() {
        let mut usage = TokenUsage::new(10, 20);
        assert_eq!(usage.total_tokens, 30);
        assert!(usage.is_consistent());

        usage.add(&TokenUsage::new(1, 2));
        assert_eq!(usage.total_tokens, 33);

        let broken = TokenUsage { prompt_tokens: 1, completion_tokens: 1, total_tokens: 3 };
        assert!(!broken.is_consistent());
    }

    #[test]
    fn test_token_usage_saturates() {
        let usage = TokenUsage::new(u64::MAX, 1);
        assert_eq!(usage.total_tokens, u64::MAX);
        assert!(!usage.is_consistent());

        let mut total = TokenUsage::new(u64::MAX - 1, 0);
        total.add(&TokenUsage::new(5, 5));
        assert_eq!(total.prompt_tokens, u64::MAX);
        assert_eq!(total.completion_tokens, 5);
        assert_eq!(total.total_tokens, u64::MAX);
    }

    #[test]
    fn test_usage_wire_names() {
        let json = serde_json::to_value(TokenUsage::new(3, 4)).unwrap();
        assert_eq!(json["promptTokens"], 3);
        assert_eq!(json["completionTokens"], 4);
        assert_eq!(json["totalTokens"], 7);
    }
}
