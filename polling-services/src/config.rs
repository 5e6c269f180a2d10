use anyhow::{bail, Context, Result};
use config::builder::DefaultState;
use config::{Config, ConfigBuilder, Environment, File};
use reqwest::Url;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct PollingConfig {
    /// Seconds between two poll ticks
    #[serde(default = "default_poll_interval")]
    pub poll_interval_seconds: u64,

    /// Message bus endpoint
    #[serde(default = "default_nats_url")]
    pub nats_url: String,

    /// Topic every extracted event is published to
    #[serde(default = "default_events_subject")]
    pub events_subject: String,

    /// Endpoint listing the resources this process polls
    #[serde(default = "default_resource_directory_url")]
    pub resource_directory_url: String,

    /// Calendar export endpoint, without query string
    #[serde(default = "default_feed_base_url")]
    pub feed_base_url: String,

    #[serde(default = "default_feed_project_id")]
    pub feed_project_id: u32,

    /// Look-ahead window of the feed, in weeks
    #[serde(default = "default_feed_weeks")]
    pub feed_weeks: u32,

    #[serde(default = "default_feed_display_config_id")]
    pub feed_display_config_id: u32,

    /// Keep the property right before `END:VEVENT` instead of dropping it
    #[serde(default)]
    pub flush_pending_on_end: bool,

    /// Log every message seen on the events topic
    #[serde(default = "default_echo_subscriber")]
    pub echo_subscriber: bool,
}

fn default_poll_interval() -> u64 {
    300 // 5 minutes
}

fn default_nats_url() -> String {
    "nats://127.0.0.1:4222".to_string()
}

fn default_events_subject() -> String {
    "USERS.events".to_string()
}

fn default_resource_directory_url() -> String {
    "http://localhost:8080/resources".to_string()
}

fn default_feed_base_url() -> String {
    "https://edt.uca.fr/jsp/custom/modules/plannings/anonymous_cal.jsp".to_string()
}

fn default_feed_project_id() -> u32 {
    2
}

fn default_feed_weeks() -> u32 {
    1
}

fn default_feed_display_config_id() -> u32 {
    128
}

fn default_echo_subscriber() -> bool {
    true
}

impl PollingConfig {
    /// Load from `scheduler.toml` (optional) and `SCHEDULER_*` environment variables
    pub fn from_env() -> Result<Self> {
        let builder = Config::builder()
            .add_source(File::with_name("scheduler").required(false))
            .add_source(Environment::with_prefix("SCHEDULER").try_parsing(true));

        Self::from_builder(builder)
    }

    pub fn from_builder(builder: ConfigBuilder<DefaultState>) -> Result<Self> {
        let config: PollingConfig = builder
            .build()
            .context("Failed to read configuration")?
            .try_deserialize()
            .context("Invalid configuration")?;

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.poll_interval_seconds == 0 {
            bail!("poll_interval_seconds must be greater than zero");
        }
        Url::parse(&self.resource_directory_url)
            .context("resource_directory_url must be a valid URL")?;
        self.feed_template()?;
        Ok(())
    }

    pub fn feed_template(&self) -> Result<FeedTemplate> {
        let base_url = Url::parse(&self.feed_base_url).context("feed_base_url must be a valid URL")?;

        Ok(FeedTemplate {
            base_url,
            project_id: self.feed_project_id,
            weeks: self.feed_weeks,
            display_config_id: self.feed_display_config_id,
        })
    }
}

/// Builds the calendar export URL of one resource
#[derive(Debug, Clone)]
pub struct FeedTemplate {
    base_url: Url,
    project_id: u32,
    weeks: u32,
    display_config_id: u32,
}

impl FeedTemplate {
    pub fn url_for(&self, uca_id: i64) -> Url {
        let mut url = self.base_url.clone();
        url.query_pairs_mut()
            .append_pair("resources", &uca_id.to_string())
            .append_pair("projectId", &self.project_id.to_string())
            .append_pair("calType", "ical")
            .append_pair("nbWeeks", &self.weeks.to_string())
            .append_pair("displayConfigId", &self.display_config_id.to_string());
        url
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = PollingConfig::from_builder(Config::builder()).expect("should load defaults");

        assert_eq!(config.poll_interval_seconds, 300);
        assert_eq!(config.events_subject, "USERS.events");
        assert_eq!(config.resource_directory_url, "http://localhost:8080/resources");
        assert!(!config.flush_pending_on_end);
        assert!(config.echo_subscriber);
    }

    #[test]
    fn test_overrides() {
        let builder = Config::builder()
            .set_override("poll_interval_seconds", 30)
            .unwrap()
            .set_override("nats_url", "nats://bus:4222")
            .unwrap()
            .set_override("flush_pending_on_end", true)
            .unwrap();
        let config = PollingConfig::from_builder(builder).expect("should load overrides");

        assert_eq!(config.poll_interval_seconds, 30);
        assert_eq!(config.nats_url, "nats://bus:4222");
        assert!(config.flush_pending_on_end);
    }

    #[test]
    fn test_zero_interval_rejected() {
        let builder = Config::builder()
            .set_override("poll_interval_seconds", 0)
            .unwrap();

        assert!(PollingConfig::from_builder(builder).is_err());
    }

    #[test]
    fn test_invalid_feed_url_rejected() {
        let builder = Config::builder()
            .set_override("feed_base_url", "not a url")
            .unwrap();

        assert!(PollingConfig::from_builder(builder).is_err());
    }

    #[test]
    fn test_feed_url() {
        let config = PollingConfig::from_builder(Config::builder()).unwrap();
        let url = config.feed_template().unwrap().url_for(5231);

        assert_eq!(
            url.as_str(),
            "https://edt.uca.fr/jsp/custom/modules/plannings/anonymous_cal.jsp?resources=5231&projectId=2&calType=ical&nbWeeks=1&displayConfigId=128"
        );
    }
}
