//! Voice assistant side of the dispatcher.
//!
//! The engine, the speaker and the status light are external collaborators
//! reached through the traits below.

mod events;
mod router;

pub use events::{AssistantEvent, ConversationStatus};
pub use router::{
    AssistantEventRouter, Collaborators, RouterExit, FATAL_ERROR_EXIT_CODE, TERMINATE_EXIT_CODE,
};

use async_trait::async_trait;

/// Controls exposed by the assistant engine
#[async_trait]
pub trait AssistantControl: Send + Sync {
    /// Ask the engine to end the current conversation turn.
    /// The engine acknowledges with a terminal turn event.
    async fn stop_conversation(&self) -> anyhow::Result<()>;
}

#[async_trait]
pub trait StatusIndicator: Send + Sync {
    async fn set_status(&self, status: ConversationStatus) -> anyhow::Result<()>;
}

#[async_trait]
pub trait AudioOutput: Send + Sync {
    async fn say(&self, text: &str) -> anyhow::Result<()>;
    async fn play_sound(&self, sound_name: &str) -> anyhow::Result<()>;
}

/// Host operating system
#[async_trait]
pub trait SystemControl: Send + Sync {
    async fn shutdown(&self) -> anyhow::Result<()>;
    async fn reboot(&self) -> anyhow::Result<()>;
    async fn primary_ip_address(&self) -> anyhow::Result<String>;
}
