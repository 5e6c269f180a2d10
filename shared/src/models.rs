use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Schedulable entity (room, group, ...) whose calendar feed is polled
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
    /// Internal identifier, kept raw so one bad entry doesn't fail the whole list
    pub id: String,
    pub name: String,
    /// Identifier used by the feed source
    pub uca_id: i64,
}

impl Resource {
    /// Parse the internal identifier into a UUID
    pub fn uuid(&self) -> Result<Uuid, uuid::Error> {
        Uuid::parse_str(&self.id)
    }
}

/// One calendar entry extracted from a feed
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub summary: String,
    pub description: String,
    pub location: String,
    /// Opaque date-time string as it appeared in the feed
    #[serde(rename = "dtstart")]
    pub start: String,
    #[serde(rename = "dtend")]
    pub end: String,
    pub uid: String,
    #[serde(rename = "resource_id")]
    pub resource_ids: BTreeSet<Uuid>,
}

impl Event {
    /// Replace the owning identity with exactly one resource
    pub fn tag(mut self, resource_id: Uuid) -> Self {
        self.resource_ids.clear();
        self.resource_ids.insert(resource_id);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resource_deserialize() {
        let json = r#"[{"id":"6f1c2a3e-8b7d-4c1f-9a2e-3d4b5c6d7e8f","name":"Room A","uca_id":4242}]"#;
        let resources: Vec<Resource> = serde_json::from_str(json).unwrap();

        assert_eq!(resources.len(), 1);
        assert_eq!(resources[0].name, "Room A");
        assert_eq!(resources[0].uca_id, 4242);
        assert!(resources[0].uuid().is_ok());
    }

    #[test]
    fn test_resource_invalid_uuid() {
        let resource = Resource {
            id: "not-a-uuid".to_string(),
            name: "Broken".to_string(),
            uca_id: 1,
        };
        assert!(resource.uuid().is_err());
    }

    #[test]
    fn test_tag_keeps_exactly_one_resource() {
        let first = Uuid::new_v4();
        let second = Uuid::new_v4();

        let event = Event::default().tag(first).tag(second);

        assert_eq!(event.resource_ids.len(), 1);
        assert!(event.resource_ids.contains(&second));
    }

    #[test]
    fn test_event_wire_names() {
        let id = Uuid::parse_str("6f1c2a3e-8b7d-4c1f-9a2e-3d4b5c6d7e8f").unwrap();
        let event = Event {
            summary: "Math".to_string(),
            start: "20240101T090000".to_string(),
            uid: "abc123".to_string(),
            ..Default::default()
        }
        .tag(id);

        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["summary"], "Math");
        assert_eq!(value["dtstart"], "20240101T090000");
        assert_eq!(value["dtend"], "");
        assert_eq!(value["uid"], "abc123");
        assert_eq!(
            value["resource_id"],
            serde_json::json!(["6f1c2a3e-8b7d-4c1f-9a2e-3d4b5c6d7e8f"])
        );
    }
}
