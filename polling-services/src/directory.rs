use reqwest::Client;
use shared::Resource;

use crate::error::{PollError, PollResult};
use crate::http::get_body;

/// Client for the service listing the resources to poll
#[derive(Debug, Clone)]
pub struct ResourceDirectory {
    client: Client,
    url: String,
}

impl ResourceDirectory {
    pub fn new(client: Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }

    pub async fn list(&self) -> PollResult<Vec<Resource>> {
        let body = get_body(&self.client, &self.url).await?;

        serde_json::from_slice(&body).map_err(|source| PollError::Decode {
            url: self.url.clone(),
            source,
        })
    }
}
