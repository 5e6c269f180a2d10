use bytes::Bytes;
use reqwest::{Client, StatusCode};

use crate::error::{PollError, PollResult};

/// GET `url` and return the body of a 200 response
pub async fn get_body(client: &Client, url: &str) -> PollResult<Bytes> {
    tracing::debug!(%url, "sending HTTP request");

    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| PollError::transport(url, e))?;

    let status = response.status();
    tracing::debug!(%url, %status, "received HTTP response");

    if status != StatusCode::OK {
        return Err(PollError::Status {
            url: url.to_string(),
            status,
        });
    }

    response
        .bytes()
        .await
        .map_err(|e| PollError::transport(url, e))
}
