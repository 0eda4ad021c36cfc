//! Zenoh transport for the assistant engine, speech service and status light.

use crate::{
    assistant::{AssistantControl, AssistantEvent, AudioOutput, ConversationStatus, StatusIndicator},
    error::DispatcherError,
};
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::mpsc::{channel, Receiver};
use tracing::*;
use zenoh::prelude::r#async::*;
use zenoh::Session;

const EVENT_CHANNEL_SIZE: usize = 32;

pub fn assistant_event_topic(topic_prefix: &str) -> String {
    format!("{topic_prefix}/event")
}

pub fn stop_conversation_topic(topic_prefix: &str) -> String {
    format!("{topic_prefix}/command/stop_conversation")
}

pub fn speech_say_topic(topic_prefix: &str) -> String {
    format!("{topic_prefix}/command/speech/say")
}

pub fn speech_play_sound_topic(topic_prefix: &str) -> String {
    format!("{topic_prefix}/command/speech/play_sound")
}

/// Forward assistant events into a channel in the order they arrive
///
/// The channel closes when the subscriber fails.
pub async fn start_event_listener(
    zenoh_session: Arc<Session>,
    topic_prefix: &str,
) -> anyhow::Result<Receiver<AssistantEvent>> {
    let topic = assistant_event_topic(topic_prefix);
    info!("Listening for assistant events on {}", topic);
    let event_subscriber = zenoh_session
        .declare_subscriber(topic)
        .res()
        .await
        .map_err(DispatcherError::ZenohError)?;

    let (sender, receiver) = channel(EVENT_CHANNEL_SIZE);

    tokio::spawn(async move {
        loop {
            let sample = match event_subscriber.recv_async().await {
                Ok(sample) => sample,
                Err(err) => {
                    error!("Assistant event subscriber failed {:?}", err);
                    break;
                }
            };
            let payload: String = match sample.value.try_into() {
                Ok(payload) => payload,
                Err(err) => {
                    warn!("Assistant event is not text {:?}", err);
                    continue;
                }
            };
            match serde_json::from_str::<AssistantEvent>(&payload) {
                Ok(event) => {
                    if sender.send(event).await.is_err() {
                        warn!("Assistant event receiver dropped");
                        break;
                    }
                }
                Err(err) => warn!("Failed to decode assistant event {:?}: {}", payload, err),
            }
        }
    });

    Ok(receiver)
}

pub struct ZenohAssistantControl {
    zenoh_session: Arc<Session>,
    stop_topic: String,
}

impl ZenohAssistantControl {
    pub fn new(zenoh_session: Arc<Session>, topic_prefix: &str) -> Self {
        Self {
            zenoh_session,
            stop_topic: stop_conversation_topic(topic_prefix),
        }
    }
}

#[async_trait]
impl AssistantControl for ZenohAssistantControl {
    async fn stop_conversation(&self) -> anyhow::Result<()> {
        info!("Stopping conversation");
        self.zenoh_session
            .put(self.stop_topic.as_str(), "stop")
            .res()
            .await
            .map_err(DispatcherError::ZenohError)?;
        Ok(())
    }
}

pub struct ZenohStatusIndicator {
    zenoh_session: Arc<Session>,
    topic: String,
}

impl ZenohStatusIndicator {
    pub fn new(zenoh_session: Arc<Session>, topic: &str) -> Self {
        Self {
            zenoh_session,
            topic: topic.to_owned(),
        }
    }
}

#[async_trait]
impl StatusIndicator for ZenohStatusIndicator {
    async fn set_status(&self, status: ConversationStatus) -> anyhow::Result<()> {
        debug!("Status {}", status.as_str());
        self.zenoh_session
            .put(self.topic.as_str(), status.as_str())
            .res()
            .await
            .map_err(DispatcherError::ZenohError)?;
        Ok(())
    }
}

/// Speech service reached over the say and play sound command topics
pub struct ZenohAudioOutput {
    zenoh_session: Arc<Session>,
    say_topic: String,
    play_sound_topic: String,
}

impl ZenohAudioOutput {
    pub fn new(zenoh_session: Arc<Session>, topic_prefix: &str) -> Self {
        Self {
            zenoh_session,
            say_topic: speech_say_topic(topic_prefix),
            play_sound_topic: speech_play_sound_topic(topic_prefix),
        }
    }
}

#[async_trait]
impl AudioOutput for ZenohAudioOutput {
    async fn say(&self, text: &str) -> anyhow::Result<()> {
        info!("Saying {:?}", text);
        self.zenoh_session
            .put(self.say_topic.as_str(), text)
            .res()
            .await
            .map_err(DispatcherError::ZenohError)?;
        Ok(())
    }

    async fn play_sound(&self, sound_name: &str) -> anyhow::Result<()> {
        info!("Playing sound {}", sound_name);
        self.zenoh_session
            .put(self.play_sound_topic.as_str(), sound_name)
            .res()
            .await
            .map_err(DispatcherError::ZenohError)?;
        Ok(())
    }
}
