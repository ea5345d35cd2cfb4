//! Engine binary for the Palaver chat-room simulation.
//!
//! This is the entry point that wires everything together: the in-process
//! post office, the room's log distributor, the LLM provider, the
//! automated participants, and optionally an interactive console
//! participant. It runs until Ctrl-C, or until the person at the console
//! leaves.
//!
//! # Startup Sequence
//!
//! 1. Initialize structured logging (tracing)
//! 2. Load engine configuration from arguments and environment
//! 3. Build the LLM backend from `PALAVER_LLM_*` variables
//! 4. Start the post office and the room's log distributor
//! 5. Start the LLM provider task
//! 6. Spawn the automated participants
//! 7. Optionally start the console provider and its participant
//! 8. Wait for a termination condition, then drain everything

mod config;
mod error;
mod spawner;

use rand::SeedableRng;
use rand::rngs::SmallRng;
use tokio::sync::watch;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use palaver_participant::{ParticipantConfig, ParticipantController};
use palaver_post::PostOffice;
use palaver_provider::{ConsoleProvider, LlmBackend, LlmConfig, LlmProviderService};
use palaver_room::LogDistributor;
use palaver_types::Address;

use crate::config::EngineConfig;
use crate::error::EngineError;

/// Application entry point for the chat-room engine.
///
/// # Errors
///
/// Returns an error if any startup step fails.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Initialize structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    info!("palaver-engine starting");

    // 2. Load engine configuration.
    let engine_config = EngineConfig::load()?;
    info!(
        participants = engine_config.participants,
        interactive = engine_config.interactive,
        room = %engine_config.room,
        "Configuration loaded"
    );

    // 3. Build the LLM backend.
    let llm_config = LlmConfig::from_env().map_err(EngineError::from)?;
    let backend = LlmBackend::from_config(&llm_config);
    info!(
        backend = backend.name(),
        api_url = llm_config.api_url,
        model = llm_config.model,
        "LLM backend configured"
    );

    // 4. Start the post office and the room.
    let post = PostOffice::new();
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let distributor = LogDistributor::register(&post, engine_config.room.clone()).await;
    let room_handle = tokio::spawn(distributor.run(shutdown_rx.clone()));
    info!(room = %engine_config.room, "Log distributor started");

    // 5. Start the LLM provider.
    let llm_address = Address::from("provider-llm");
    let service = LlmProviderService::register(&post, llm_address.clone(), backend).await;
    let provider_handle = tokio::spawn(service.run(shutdown_rx.clone()));
    info!(provider = %llm_address, "LLM provider started");

    // 6. Spawn the automated participants.
    let mut participant_handles = spawner::spawn_automated(
        &post,
        &engine_config.room,
        &llm_address,
        engine_config.participants,
        &shutdown_rx,
    )
    .await;
    info!(count = participant_handles.len(), "Automated participants spawned");

    // 7. Optionally start the console participant.
    let console_handle = if engine_config.interactive {
        println!("Welcome to the village chat room.");
        println!("Commands: /help, /vote, /bye (also /exit, /quit).");
        println!("An empty line passes your turn.");
        let console_address = Address::from("provider-console");
        let console = ConsoleProvider::register(&post, console_address.clone()).await;
        let handle = tokio::spawn(console.run(shutdown_rx.clone()));

        let participant_config =
            ParticipantConfig::interactive(engine_config.room.clone(), console_address);
        let controller = ParticipantController::register(
            &post,
            Address::from("participant-you"),
            participant_config,
            SmallRng::from_os_rng(),
        )
        .await;
        participant_handles.push(tokio::spawn(controller.run(shutdown_rx.clone())));
        info!("Console participant started");
        Some(handle)
    } else {
        None
    };
    drop(shutdown_rx);

    // 8. Wait for a termination condition.
    match console_handle {
        Some(console) => {
            tokio::select! {
                result = tokio::signal::ctrl_c() => {
                    result.map_err(EngineError::from)?;
                    info!("Ctrl-C received, shutting down");
                }
                outcome = console => {
                    match outcome {
                        Ok(Ok(())) => info!("Console participant left, shutting down"),
                        Ok(Err(e)) => warn!(error = %e, "Console provider failed, shutting down"),
                        Err(e) => warn!(error = %e, "Console task panicked, shutting down"),
                    }
                }
            }
        }
        None => {
            tokio::signal::ctrl_c().await.map_err(EngineError::from)?;
            info!("Ctrl-C received, shutting down");
        }
    }

    // Broadcast shutdown and drain every task.
    shutdown_tx.send(true).unwrap_or_default();
    for handle in participant_handles {
        match handle.await {
            Ok(Ok(reason)) => info!(reason = ?reason, "participant drained"),
            Ok(Err(e)) => warn!(error = %e, "participant ended with error"),
            Err(e) => warn!(error = %e, "participant task panicked"),
        }
    }
    if let Err(e) = provider_handle.await {
        warn!(error = %e, "provider task panicked");
    }
    match room_handle.await {
        Ok(log) => info!(entries = log.len(), "final chat log"),
        Err(e) => warn!(error = %e, "room task panicked"),
    }

    info!("palaver-engine stopped");
    Ok(())
}
