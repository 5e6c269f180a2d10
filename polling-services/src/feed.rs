use bytes::Bytes;
use reqwest::{Client, Url};

use crate::config::FeedTemplate;
use crate::error::PollResult;
use crate::http::get_body;

/// Downloads the raw calendar export of a resource
#[derive(Debug, Clone)]
pub struct FeedFetcher {
    client: Client,
    template: FeedTemplate,
}

impl FeedFetcher {
    pub fn new(client: Client, template: FeedTemplate) -> Self {
        Self { client, template }
    }

    pub fn feed_url(&self, uca_id: i64) -> Url {
        self.template.url_for(uca_id)
    }

    pub async fn fetch(&self, uca_id: i64) -> PollResult<Bytes> {
        let url = self.feed_url(uca_id);
        tracing::debug!(uca_id, %url, "fetching calendar feed");

        get_body(&self.client, url.as_str()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PollingConfig;
    use crate::error::PollError;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn fetcher_for(server: &MockServer) -> FeedFetcher {
        let builder = config::Config::builder()
            .set_override("feed_base_url", format!("{}/cal.jsp", server.uri()))
            .unwrap();
        let config = PollingConfig::from_builder(builder).unwrap();
        FeedFetcher::new(Client::new(), config.feed_template().unwrap())
    }

    #[tokio::test]
    async fn test_fetch_feed() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/cal.jsp"))
            .and(query_param("resources", "4242"))
            .and(query_param("calType", "ical"))
            .and(query_param("nbWeeks", "1"))
            .respond_with(ResponseTemplate::new(200).set_body_string("BEGIN:VCALENDAR\r\nEND:VCALENDAR\r\n"))
            .expect(1)
            .mount(&server)
            .await;

        let body = fetcher_for(&server).fetch(4242).await.expect("should fetch feed");

        assert!(body.starts_with(b"BEGIN:VCALENDAR"));
    }

    #[tokio::test]
    async fn test_fetch_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let result = fetcher_for(&server).fetch(1).await;

        assert!(matches!(result, Err(PollError::Status { .. })));
    }
}
