use anyhow::{Context, Result};
use futures::StreamExt;

/// Log every message published on `subject` until the subscription ends
pub async fn run_echo_subscriber(client: async_nats::Client, subject: String) -> Result<()> {
    let mut subscriber = client
        .subscribe(subject.clone())
        .await
        .with_context(|| format!("Failed to subscribe to {}", subject))?;

    tracing::info!("Echo subscriber listening on {}", subject);

    while let Some(message) = subscriber.next().await {
        tracing::info!(
            subject = %message.subject,
            "Received: {}",
            String::from_utf8_lossy(&message.payload)
        );
    }

    tracing::warn!("Echo subscription on {} closed", subject);
    Ok(())
}
