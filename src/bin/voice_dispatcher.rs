use anyhow::Result;
use clap::Parser;
use std::{path::PathBuf, sync::Arc};
use tracing::*;
use voice_dispatcher::{
    app_config::get_configuration,
    assistant::{AssistantEventRouter, Collaborators, RouterExit},
    dispatcher::HttpActuationDispatcher,
    error::DispatcherError,
    logging,
    registry::DeviceRegistry,
    system::{machine_architecture, LinuxSystemControl},
    zenoh_bridge::{
        start_event_listener, ZenohAssistantControl, ZenohAudioOutput, ZenohStatusIndicator,
    },
};
use zenoh::prelude::r#async::*;

const UNSUPPORTED_PLATFORM_EXIT_CODE: i32 = 255;

/// Voice command dispatcher
/// Turns recognized speech into device toggles and system commands
#[derive(Parser)]
#[command(author, version)]
struct Args {
    /// application configuration
    #[arg(long)]
    config: Option<PathBuf>,
    /// Sets the level of verbosity
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args: Args = Args::parse();
    logging::setup_tracing(args.verbose);
    info!("Started voice dispatcher");

    let app_config = get_configuration(&args.config)?;

    match machine_architecture().await {
        Ok(machine) if app_config.assistant.unsupported_machines.contains(&machine) => {
            error!("Cannot run voice dispatcher on {}", machine);
            std::process::exit(UNSUPPORTED_PLATFORM_EXIT_CODE);
        }
        Ok(machine) => info!("Running on {}", machine),
        Err(err) => warn!("Failed to detect machine architecture {:?}", err),
    }

    let http_client = reqwest::Client::new();
    let registry =
        DeviceRegistry::load(&http_client, &app_config.remote_service.catalog_url()).await;

    let zenoh_config = app_config.zenoh.get_zenoh_config()?;
    let zenoh_session = zenoh::open(zenoh_config)
        .res()
        .await
        .map_err(DispatcherError::ZenohError)?
        .into_arc();

    let events =
        start_event_listener(zenoh_session.clone(), &app_config.assistant.topic_prefix).await?;

    let collaborators = Collaborators {
        assistant: Arc::new(ZenohAssistantControl::new(
            zenoh_session.clone(),
            &app_config.assistant.topic_prefix,
        )),
        status_indicator: Arc::new(ZenohStatusIndicator::new(
            zenoh_session.clone(),
            &app_config.status.topic,
        )),
        audio: Arc::new(ZenohAudioOutput::new(
            zenoh_session.clone(),
            &app_config.speech.topic_prefix,
        )),
        system: Arc::new(LinuxSystemControl),
        dispatcher: Arc::new(HttpActuationDispatcher::new(
            http_client.clone(),
            app_config.remote_service.toggle_url(),
        )),
    };

    let router = AssistantEventRouter::new(
        &registry,
        collaborators,
        &app_config.speech.negative_acknowledgment_sound,
    );

    let exit = tokio::select! {
        exit = router.run(events) => exit,
        _ = tokio::signal::ctrl_c() => {
            info!("Got ctrl-c");
            return Ok(());
        }
    };

    match exit {
        RouterExit::Exit(code) => {
            warn!("Exiting with code {}", code);
            std::process::exit(code);
        }
        RouterExit::EventStreamClosed => {
            error!("Assistant event stream ended");
            Ok(())
        }
    }
}
