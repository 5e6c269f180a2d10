//! Publishing of extracted events onto the message bus.
//!
//! The scheduler only sees the [`EventPublisher`] trait so the bus can be
//! swapped for [`RecordingPublisher`] in tests.

use async_trait::async_trait;
use bytes::Bytes;
use shared::Event;

use crate::error::{PollError, PollResult};

#[async_trait]
pub trait EventPublisher: Send + Sync {
    /// Publish one event as a single JSON message
    async fn publish(&self, event: &Event) -> PollResult<()>;
}

/// JSON payload of one event
pub fn encode_event(event: &Event) -> PollResult<Bytes> {
    serde_json::to_vec(event)
        .map(Bytes::from)
        .map_err(|source| PollError::Encode {
            uid: event.uid.clone(),
            source,
        })
}

/// Publisher backed by one long-lived NATS connection
pub struct NatsEventPublisher {
    client: async_nats::Client,
    subject: String,
}

impl NatsEventPublisher {
    pub fn new(client: async_nats::Client, subject: impl Into<String>) -> Self {
        Self {
            client,
            subject: subject.into(),
        }
    }

    /// Subject and payload sent for `event`
    pub fn message(&self, event: &Event) -> PollResult<PublishedMessage> {
        Ok(PublishedMessage {
            subject: self.subject.clone(),
            payload: encode_event(event)?,
        })
    }

    /// Flush buffered messages before shutdown
    pub async fn close(&self) {
        if let Err(e) = self.client.flush().await {
            tracing::warn!("Failed to flush NATS connection: {}", e);
        }
    }
}

#[async_trait]
impl EventPublisher for NatsEventPublisher {
    async fn publish(&self, event: &Event) -> PollResult<()> {
        let message = self.message(event)?;

        self.client
            .publish(message.subject, message.payload)
            .await
            .map_err(|e| PollError::Publish {
                subject: self.subject.clone(),
                message: e.to_string(),
            })?;

        tracing::debug!(subject = %self.subject, uid = %event.uid, "event published");
        Ok(())
    }
}

/// One message as it goes onto the bus
#[derive(Debug, Clone)]
pub struct PublishedMessage {
    pub subject: String,
    pub payload: Bytes,
}

/// Publisher that keeps messages in memory, optionally failing on a given uid
#[cfg(test)]
#[derive(Default)]
pub struct RecordingPublisher {
    subject: String,
    published: std::sync::RwLock<Vec<PublishedMessage>>,
    fail_on_uid: Option<String>,
}

#[cfg(test)]
impl RecordingPublisher {
    pub fn new(subject: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            ..Default::default()
        }
    }

    pub fn failing_on(subject: impl Into<String>, uid: impl Into<String>) -> Self {
        Self {
            fail_on_uid: Some(uid.into()),
            ..Self::new(subject)
        }
    }

    pub fn published_messages(&self) -> Vec<PublishedMessage> {
        self.published
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn published_events(&self) -> Vec<Event> {
        self.published_messages()
            .iter()
            .map(|m| serde_json::from_slice(&m.payload).expect("payload should be an event"))
            .collect()
    }
}

#[cfg(test)]
#[async_trait]
impl EventPublisher for RecordingPublisher {
    async fn publish(&self, event: &Event) -> PollResult<()> {
        if self.fail_on_uid.as_deref() == Some(event.uid.as_str()) {
            return Err(PollError::Publish {
                subject: self.subject.clone(),
                message: "connection closed".to_string(),
            });
        }

        let payload = encode_event(event)?;
        self.published
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .push(PublishedMessage {
                subject: self.subject.clone(),
                payload,
            });
        Ok(())
    }
}
