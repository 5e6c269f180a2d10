mod config;
mod consumer;
mod directory;
mod error;
mod feed;
mod http;
mod publisher;
mod scheduler;

use anyhow::{Context, Result};
use std::sync::Arc;
use tokio::signal;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::PollingConfig;
use crate::publisher::NatsEventPublisher;
use crate::scheduler::PollingScheduler;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "polling_services=debug,shared=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting calendar feed scheduler");

    // Load configuration
    dotenv::dotenv().ok();
    let config = PollingConfig::from_env()?;

    // One bus connection for the whole process; failing here is fatal
    let client = async_nats::connect(&config.nats_url)
        .await
        .with_context(|| format!("Failed to connect to NATS at {}", config.nats_url))?;
    tracing::info!("Connected to NATS at {}", config.nats_url);

    let publisher = Arc::new(NatsEventPublisher::new(
        client.clone(),
        &config.events_subject,
    ));
    let scheduler = PollingScheduler::new(&config, publisher.clone())?;

    let scheduler_handle = tokio::spawn(async move {
        if let Err(e) = scheduler.run().await {
            tracing::error!("Scheduler error: {:?}", e);
        }
    });

    let echo_handle = if config.echo_subscriber {
        let subject = config.events_subject.clone();
        let echo_client = client.clone();
        Some(tokio::spawn(async move {
            if let Err(e) = consumer::run_echo_subscriber(echo_client, subject).await {
                tracing::error!("Echo subscriber error: {:?}", e);
            }
        }))
    } else {
        None
    };

    // Wait for shutdown signal
    tracing::info!("Scheduler running. Press Ctrl+C to stop.");
    signal::ctrl_c().await?;
    tracing::info!("Shutdown signal received, stopping...");

    // Graceful shutdown
    scheduler_handle.abort();
    if let Some(handle) = echo_handle {
        handle.abort();
    }
    publisher.close().await;

    tracing::info!("Scheduler stopped");
    Ok(())
}
