pub mod types;
pub mod chat;

pub use types::{Message, MessageId, Role};

pub use chat::{
    ChatChunk,
    ChatOptions,
    ChatRequest,
    CompletionRequest,
    FinishReason,
    LLMResponse,
    TokenUsage,
};

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
