use crate::chat::TokenUsage;

/// Chat stream chunk
#[derive(Debug, Clone)]
pub enum ChatChunk {
    /// Stream start
    Start { model: String },
    /// Text content delta
    Content { text: String },
    /// Usage information
    Usage(TokenUsage),
    /// Stream finished
    Finish { reason: FinishReason },
    /// Error occurred
    Error { message: String },
}

impl ChatChunk {
    /// Create a content chunk
    pub fn content(text: impl Into<String>) -> Self {
        Self::Content { text: text.into() }
    }

    /// Create an error chunk
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error { message: message.into() }
    }

    /// Create a finish chunk
    pub fn finish(reason: FinishReason) -> Self {
        Self::Finish { reason }
    }

    /// Create a start chunk
    pub fn start(model: impl Into<String>) -> Self {
        Self::Start { model: model.into() }
    }

    /// Check if this is an error chunk
    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error { .. })
    }

    /// Check if this is a finish chunk
    pub fn is_finish(&self) -> bool {
        matches!(self, Self::Finish { .. })
    }
}

/// Reason for finishing the generation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinishReason {
    /// Completed naturally
    Stop,
    /// Hit token limit
    Length,
    /// Content was filtered
    ContentFilter,
    /// User cancelled
    Cancelled,
    /// Error occurred
    Error,
}

impl FinishReason {
    /// Convert from string
    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "length" => Self::Length,
            "content_filter" => Self::ContentFilter,
            "cancelled" => Self::Cancelled,
            "error" => Self::Error,
            _ => Self::Stop,
        }
    }

    /// Convert to string
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Stop => "stop",
            Self::Length => "length",
            Self::ContentFilter => "content_filter",
            Self::Cancelled => "cancelled",
            Self::Error => "error",
        }
    }
}

impl std::fmt::Display for FinishReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
