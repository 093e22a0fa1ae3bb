pub mod request;
pub mod response;
pub mod chunk;

pub use request::{ChatRequest, ChatOptions, CompletionRequest};
pub use response::{LLMResponse, TokenUsage};
pub use chunk::{ChatChunk, FinishReason};
