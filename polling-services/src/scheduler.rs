use anyhow::Result;
use reqwest::Client;
use shared::{EndOfBlock, Resource};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{self, Instant, MissedTickBehavior};

use crate::config::PollingConfig;
use crate::directory::ResourceDirectory;
use crate::error::{PollError, PollResult};
use crate::feed::FeedFetcher;
use crate::publisher::EventPublisher;

/// Outcome of one poll tick
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TickSummary {
    pub resources: usize,
    pub failed_resources: usize,
    pub events_published: usize,
}

pub struct PollingScheduler {
    interval: Duration,
    directory: ResourceDirectory,
    feeds: FeedFetcher,
    publisher: Arc<dyn EventPublisher>,
    end_of_block: EndOfBlock,
}

impl PollingScheduler {
    pub fn new(config: &PollingConfig, publisher: Arc<dyn EventPublisher>) -> Result<Self> {
        let client = Client::new();
        let end_of_block = if config.flush_pending_on_end {
            EndOfBlock::FlushPending
        } else {
            EndOfBlock::DropPending
        };

        Ok(Self {
            interval: Duration::from_secs(config.poll_interval_seconds),
            directory: ResourceDirectory::new(client.clone(), &config.resource_directory_url),
            feeds: FeedFetcher::new(client, config.feed_template()?),
            publisher,
            end_of_block,
        })
    }

    pub async fn run(&self) -> Result<()> {
        // First tick fires after one full interval
        let mut ticker = time::interval_at(Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        tracing::info!("Calendar poller started (interval: {:?})", self.interval);

        loop {
            ticker.tick().await;
            tracing::debug!("Running calendar poll cycle");

            match self.poll_once().await {
                Ok(summary) => tracing::info!(
                    resources = summary.resources,
                    failed = summary.failed_resources,
                    published = summary.events_published,
                    "Poll cycle finished"
                ),
                Err(e) => {
                    tracing::error!("Failed to list resources, skipping this cycle: {}", e);
                    // Continue polling even on error
                }
            }
        }
    }

    /// One tick: list resources, then fetch, extract and publish each one in turn
    pub async fn poll_once(&self) -> PollResult<TickSummary> {
        let resources = self.directory.list().await?;
        tracing::info!("Found {} resources to poll", resources.len());

        let mut summary = TickSummary {
            resources: resources.len(),
            ..Default::default()
        };

        for resource in &resources {
            match self.poll_resource(resource).await {
                Ok(published) => summary.events_published += published,
                Err(e) => {
                    tracing::error!(
                        resource_id = %resource.id,
                        resource = %resource.name,
                        uca_id = resource.uca_id,
                        operation = failed_operation(&e),
                        "Skipping resource: {}",
                        e
                    );
                    summary.failed_resources += 1;
                }
            }
        }

        Ok(summary)
    }

    async fn poll_resource(&self, resource: &Resource) -> PollResult<usize> {
        let resource_id = resource
            .uuid()
            .map_err(|source| PollError::InvalidResourceId {
                resource: resource.name.clone(),
                id: resource.id.clone(),
                source,
            })?;

        let raw = self.feeds.fetch(resource.uca_id).await?;
        let events = shared::extract_with(&raw, self.end_of_block);

        tracing::debug!(
            resource = %resource.name,
            "Extracted {} events",
            events.len()
        );

        let mut published = 0;
        for event in events {
            let event = event.tag(resource_id);
            self.publisher.publish(&event).await?;
            published += 1;
        }

        Ok(published)
    }
}

fn failed_operation(error: &PollError) -> &'static str {
    match error {
        PollError::InvalidResourceId { .. } => "parse resource id",
        PollError::Transport { .. } | PollError::Status { .. } | PollError::Decode { .. } => {
            "fetch feed"
        }
        PollError::Encode { .. } | PollError::Publish { .. } => "publish event",
    }
}
