use super::{
    AssistantControl, AssistantEvent, AudioOutput, ConversationStatus, StatusIndicator,
    SystemControl,
};
use crate::{
    dispatcher::ActuationDispatcher,
    matcher::{BuiltinCommand, MatchOutcome, UtteranceMatcher},
    registry::DeviceRegistry,
};
use std::sync::Arc;
use tokio::sync::mpsc::Receiver;
use tracing::*;

pub const FATAL_ERROR_EXIT_CODE: i32 = 1;
pub const TERMINATE_EXIT_CODE: i32 = 255;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouterExit {
    /// Engine stopped sending events
    EventStreamClosed,
    /// Process should exit with this code
    Exit(i32),
}

/// External collaborators driven by the router
#[derive(Clone)]
pub struct Collaborators {
    pub assistant: Arc<dyn AssistantControl>,
    pub status_indicator: Arc<dyn StatusIndicator>,
    pub audio: Arc<dyn AudioOutput>,
    pub system: Arc<dyn SystemControl>,
    pub dispatcher: Arc<dyn ActuationDispatcher>,
}

/// Consumes engine events strictly in order and runs the resulting commands
pub struct AssistantEventRouter<'a> {
    matcher: UtteranceMatcher<'a>,
    collaborators: Collaborators,
    negative_acknowledgment_sound: String,
    status: Option<ConversationStatus>,
}

impl<'a> AssistantEventRouter<'a> {
    pub fn new(
        registry: &'a DeviceRegistry,
        collaborators: Collaborators,
        negative_acknowledgment_sound: &str,
    ) -> Self {
        Self {
            matcher: UtteranceMatcher::new(registry),
            collaborators,
            negative_acknowledgment_sound: negative_acknowledgment_sound.to_owned(),
            status: None,
        }
    }

    /// Undefined until the engine reports start finished
    pub fn status(&self) -> Option<ConversationStatus> {
        self.status
    }

    pub async fn run(mut self, mut events: Receiver<AssistantEvent>) -> RouterExit {
        while let Some(event) = events.recv().await {
            if let Some(exit) = self.handle_event(event).await {
                return exit;
            }
        }
        warn!("Assistant event stream closed");
        RouterExit::EventStreamClosed
    }

    /// Fully processes one event. Returns an exit decision when the process should end.
    pub async fn handle_event(&mut self, event: AssistantEvent) -> Option<RouterExit> {
        debug!("Assistant event {:?}", event);
        match event {
            AssistantEvent::StartFinished => {
                self.set_status(ConversationStatus::Ready).await;
                info!("Say the hotword then speak, or press Ctrl+C to quit...");
            }
            AssistantEvent::ConversationTurnStarted => {
                self.set_status(ConversationStatus::Listening).await;
            }
            AssistantEvent::RecognizingSpeechFinished { text: Some(text) } => {
                return self.handle_utterance(&text).await;
            }
            AssistantEvent::RecognizingSpeechFinished { text: None } => {
                debug!("Recognition finished without text");
            }
            AssistantEvent::EndOfUtterance => {
                self.set_status(ConversationStatus::Thinking).await;
            }
            AssistantEvent::ConversationTurnFinished
            | AssistantEvent::ConversationTurnTimeout
            | AssistantEvent::NoResponse => {
                self.set_status(ConversationStatus::Ready).await;
            }
            AssistantEvent::AssistantError { is_fatal: true } => {
                error!("Fatal assistant error");
                return Some(RouterExit::Exit(FATAL_ERROR_EXIT_CODE));
            }
            AssistantEvent::AssistantError { is_fatal: false } => {
                warn!("Assistant reported non fatal error");
            }
            AssistantEvent::Unknown => {
                trace!("Ignoring unhandled assistant event");
            }
        }
        None
    }

    async fn handle_utterance(&mut self, text: &str) -> Option<RouterExit> {
        info!("You said: {:?}", text);
        match self.matcher.resolve(text) {
            MatchOutcome::Builtin(command) => {
                self.stop_conversation().await;
                return self.run_builtin(command).await;
            }
            MatchOutcome::Device { device_id, action } => {
                self.stop_conversation().await;
                self.collaborators.dispatcher.dispatch(&device_id, action);
            }
            outcome if outcome.is_device_syntax() => {
                info!("No device matched {:?}: {:?}", text, outcome);
                self.stop_conversation().await;
                self.play_negative_acknowledgment().await;
            }
            _ => {
                debug!("Utterance is not a command, leaving it to the assistant");
            }
        }
        None
    }

    async fn run_builtin(&mut self, command: BuiltinCommand) -> Option<RouterExit> {
        info!("Running built-in command {:?}", command);
        match command {
            BuiltinCommand::PowerOff => {
                self.say("Good bye!").await;
                if let Err(err) = self.collaborators.system.shutdown().await {
                    error!("Failed to shut down {:?}", err);
                }
            }
            BuiltinCommand::Reboot => {
                self.say("See you in a bit!").await;
                if let Err(err) = self.collaborators.system.reboot().await {
                    error!("Failed to reboot {:?}", err);
                }
            }
            BuiltinCommand::IpAddress => {
                match self.collaborators.system.primary_ip_address().await {
                    Ok(address) => self.say(&format!("My IP address is {}", address)).await,
                    Err(err) => error!("Failed to read IP address {:?}", err),
                }
            }
            BuiltinCommand::Terminate => {
                self.say("See you").await;
                return Some(RouterExit::Exit(TERMINATE_EXIT_CODE));
            }
        }
        None
    }

    async fn set_status(&mut self, status: ConversationStatus) {
        self.status = Some(status);
        if let Err(err) = self.collaborators.status_indicator.set_status(status).await {
            error!("Failed to set status {}: {:?}", status.as_str(), err);
        }
    }

    async fn stop_conversation(&self) {
        if let Err(err) = self.collaborators.assistant.stop_conversation().await {
            error!("Failed to stop conversation {:?}", err);
        }
    }

    async fn say(&self, text: &str) {
        if let Err(err) = self.collaborators.audio.say(text).await {
            error!("Failed to say {:?}: {:?}", text, err);
        }
    }

    async fn play_negative_acknowledgment(&self) {
        if let Err(err) = self
            .collaborators
            .audio
            .play_sound(&self.negative_acknowledgment_sound)
            .await
        {
            error!("Failed to play negative acknowledgment {:?}", err);
        }
    }
}
