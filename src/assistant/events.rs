use serde::{Deserialize, Serialize};

/// Lifecycle events emitted by the voice assistant engine
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AssistantEvent {
    StartFinished,
    ConversationTurnStarted,
    RecognizingSpeechFinished {
        #[serde(default)]
        text: Option<String>,
    },
    EndOfUtterance,
    ConversationTurnFinished,
    ConversationTurnTimeout,
    NoResponse,
    AssistantError {
        #[serde(default)]
        is_fatal: bool,
    },
    #[serde(other)]
    Unknown,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ConversationStatus {
    Ready,
    Listening,
    Thinking,
}

impl ConversationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConversationStatus::Ready => "ready",
            ConversationStatus::Listening => "listening",
            ConversationStatus::Thinking => "thinking",
        }
    }
}
