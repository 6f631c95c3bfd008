pub mod errors;
pub mod store;
pub mod utils;
pub mod validation;

use std::collections::HashMap;

use aws_sdk_dynamodb::types::AttributeValue;
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const TABLE_NAME_DEFAULT: &str = "Clients";

pub const UUID_ATTRIBUTE: &str = "Uuid";
pub const PATH_ATTRIBUTE: &str = "Path";
pub const IP_ATTRIBUTE: &str = "IP";
pub const TIME_ATTRIBUTE: &str = "Time";

/// A single recorded request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ping {
    #[serde(rename = "Uuid")]
    pub id: String,
    #[serde(rename = "Path")]
    pub path: String,
    #[serde(rename = "IP")]
    pub source_ip: String,
    #[serde(rename = "Time")]
    pub timestamp: String,
}

impl Ping {
    /// Stamps a new ping with a fresh id and the current server time.
    pub fn new(path: impl Into<String>, source_ip: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            path: path.into(),
            source_ip: source_ip.into(),
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Nanos, false),
        }
    }

    /// Decodes a scanned item. Missing or non-string attributes come back empty.
    pub fn from_item(item: &HashMap<String, AttributeValue>) -> Self {
        let read = |name: &str| {
            item.get(name)
                .and_then(|value| value.as_s().ok())
                .cloned()
                .unwrap_or_default()
        };

        Self {
            id: read(UUID_ATTRIBUTE),
            path: read(PATH_ATTRIBUTE),
            source_ip: read(IP_ATTRIBUTE),
            timestamp: read(TIME_ATTRIBUTE),
        }
    }

    /// Whether every attribute decoded from a well-formed string.
    pub fn is_complete_item(item: &HashMap<String, AttributeValue>) -> bool {
        [UUID_ATTRIBUTE, PATH_ATTRIBUTE, IP_ATTRIBUTE, TIME_ATTRIBUTE]
            .iter()
            .all(|name| matches!(item.get(*name), Some(AttributeValue::S(_))))
    }
}

impl From<Ping> for HashMap<String, AttributeValue> {
    fn from(value: Ping) -> Self {
        HashMap::from([
            (UUID_ATTRIBUTE.to_string(), AttributeValue::S(value.id)),
            (PATH_ATTRIBUTE.to_string(), AttributeValue::S(value.path)),
            (IP_ATTRIBUTE.to_string(), AttributeValue::S(value.source_ip)),
            (TIME_ATTRIBUTE.to_string(), AttributeValue::S(value.timestamp)),
        ])
    }
}

/// Startup configuration read from the function's environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub region: Option<String>,
    pub table_name: String,
    pub endpoint_url: Option<String>,
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        Self {
            region: non_empty("REGION").or_else(|| non_empty("region")),
            table_name: non_empty("TABLE_NAME").unwrap_or(TABLE_NAME_DEFAULT.into()),
            endpoint_url: non_empty("DYNAMODB_ENDPOINT"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_ping_has_id_and_parseable_time() {
        let ping = Ping::new("/a1", "10.0.0.1");

        assert!(!ping.id.is_empty());
        assert!(Uuid::parse_str(&ping.id).is_ok());
        assert_eq!(ping.path, "/a1");
        assert_eq!(ping.source_ip, "10.0.0.1");
        assert!(chrono::DateTime::parse_from_rfc3339(&ping.timestamp).is_ok());
    }

    #[test]
    fn ping_ids_are_not_reused() {
        assert_ne!(Ping::new("/a", "").id, Ping::new("/a", "").id);
    }

    #[test]
    fn ping_serializes_with_wire_names() {
        let ping = Ping {
            id: "id-1".into(),
            path: "/a1".into(),
            source_ip: "1.2.3.4".into(),
            timestamp: "2024-01-01T00:00:00Z".into(),
        };

        let value = serde_json::to_value(&ping).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "Uuid": "id-1",
                "Path": "/a1",
                "IP": "1.2.3.4",
                "Time": "2024-01-01T00:00:00Z",
            })
        );
    }

    #[test]
    fn item_decoding_is_lenient() {
        let item = HashMap::from([
            (UUID_ATTRIBUTE.to_string(), AttributeValue::S("id-2".into())),
            (PATH_ATTRIBUTE.to_string(), AttributeValue::N("42".into())),
        ]);

        let ping = Ping::from_item(&item);
        assert_eq!(
            ping,
            Ping {
                id: "id-2".into(),
                ..Default::default()
            }
        );
        assert!(!Ping::is_complete_item(&item));
        assert_eq!(Ping::from_item(&HashMap::new()), Ping::default());
    }

    #[test]
    fn item_written_for_a_ping_reads_back_complete() {
        let ping = Ping::new("/b2", "::1");
        let item: HashMap<String, AttributeValue> = ping.clone().into();

        assert!(Ping::is_complete_item(&item));
        assert_eq!(Ping::from_item(&item), ping);
    }

    #[test]
    fn config_defaults() {
        let config = Config::from_lookup(|_| None);
        assert_eq!(
            config,
            Config {
                region: None,
                table_name: TABLE_NAME_DEFAULT.into(),
                endpoint_url: None,
            }
        );
    }

    #[test]
    fn config_accepts_legacy_region_key() {
        let config = Config::from_lookup(|key| match key {
            "region" => Some("eu-west-1".into()),
            "TABLE_NAME" => Some("pings".into()),
            "DYNAMODB_ENDPOINT" => Some("  ".into()),
            _ => None,
        });

        assert_eq!(config.region.as_deref(), Some("eu-west-1"));
        assert_eq!(config.table_name, "pings");
        assert_eq!(config.endpoint_url, None);
    }
}
