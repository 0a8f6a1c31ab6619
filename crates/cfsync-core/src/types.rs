//! Provider-facing data types
//!
//! These are transient: parsed from (or serialized into) provider JSON for
//! the duration of one operation and never persisted as-is.

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{Error, Result};

/// TTL value the provider interprets as "automatic"
pub const AUTO_TTL: u32 = 1;

fn default_ttl() -> u32 {
    AUTO_TTL
}

/// Treat an explicit JSON `null` like a missing field
fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn null_as_auto_ttl<'de, D>(deserializer: D) -> std::result::Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<u32>::deserialize(deserializer)?.unwrap_or(AUTO_TTL))
}

/// A zone as listed by the provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Zone {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

/// A DNS record as returned by the provider
///
/// `content`, `proxied` and `ttl` are optional in provider answers. Missing
/// or `null` values fall back to defaults instead of failing the parse.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteRecord {
    pub id: String,
    #[serde(rename = "type", default, deserialize_with = "null_as_default")]
    pub record_type: String,
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub content: String,
    #[serde(default = "default_ttl", deserialize_with = "null_as_auto_ttl")]
    pub ttl: u32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub proxied: bool,
}

/// Query filter for listing records
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordFilter {
    pub record_type: Option<String>,
    pub name: Option<String>,
}

impl RecordFilter {
    /// Filter on both type and name
    pub fn exact(record_type: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            record_type: Some(record_type.into()),
            name: Some(name.into()),
        }
    }
}

/// Payload for `POST /zones/{zone_id}/dns_records`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewRecord {
    #[serde(rename = "type")]
    pub record_type: String,
    pub name: String,
    pub content: String,
    pub ttl: u32,
    pub proxied: bool,
}

/// The record state a caller wants to exist remotely
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DesiredRecord {
    pub zone_id: String,
    pub record_type: String,
    pub name: String,
    pub content: String,
    pub ttl: u32,
    pub proxied: bool,
}

impl DesiredRecord {
    /// Build a desired record, normalising the type to upper case
    ///
    /// Zone, name and content must be non-empty. Zone-map persistence has
    /// no escaping, so name and content must also be free of whitespace.
    pub fn new(
        zone_id: impl Into<String>,
        record_type: impl Into<String>,
        name: impl Into<String>,
        content: impl Into<String>,
        ttl: u32,
        proxied: bool,
    ) -> Result<Self> {
        let desired = Self {
            zone_id: zone_id.into(),
            record_type: record_type.into().to_ascii_uppercase(),
            name: name.into(),
            content: content.into(),
            ttl,
            proxied,
        };

        for (field, value) in [
            ("zone_id", &desired.zone_id),
            ("type", &desired.record_type),
            ("name", &desired.name),
            ("content", &desired.content),
        ] {
            if value.is_empty() {
                return Err(Error::invalid_input(format!("{field} cannot be empty")));
            }
            if value.chars().any(char::is_whitespace) {
                return Err(Error::invalid_input(format!(
                    "{field} cannot contain whitespace: '{value}'"
                )));
            }
        }

        Ok(desired)
    }

    /// True if `record` is the same (type, name) as this desired record
    pub fn matches(&self, record: &RemoteRecord) -> bool {
        record.name == self.name
            && (record.record_type.is_empty()
                || record.record_type.eq_ignore_ascii_case(&self.record_type))
    }

    /// True if `record` already carries the desired content and proxy flag
    pub fn is_satisfied_by(&self, record: &RemoteRecord) -> bool {
        record.content == self.content && record.proxied == self.proxied
    }

    /// Create payload for this desired state
    pub fn to_new_record(&self) -> NewRecord {
        NewRecord {
            record_type: self.record_type.clone(),
            name: self.name.clone(),
            content: self.content.clone(),
            ttl: self.ttl,
            proxied: self.proxied,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remote_record_missing_optional_fields_uses_defaults() {
        let record: RemoteRecord =
            serde_json::from_str(r#"{"id":"r1","name":"a.example.com"}"#).unwrap();
        assert_eq!(record.content, "");
        assert!(!record.proxied);
        assert_eq!(record.ttl, AUTO_TTL);
        assert_eq!(record.record_type, "");
    }

    #[test]
    fn remote_record_null_optional_fields_use_defaults() {
        let record: RemoteRecord = serde_json::from_str(
            r#"{"id":"r1","type":null,"name":"a.example.com","content":null,"ttl":null,"proxied":null}"#,
        )
        .unwrap();
        assert_eq!(record.content, "");
        assert!(!record.proxied);
        assert_eq!(record.ttl, AUTO_TTL);
        assert_eq!(record.record_type, "");
    }

    #[test]
    fn remote_record_without_id_fails_to_parse() {
        let parsed = serde_json::from_str::<RemoteRecord>(r#"{"name":"a.example.com"}"#);
        assert!(parsed.is_err());
    }

    #[test]
    fn new_record_serializes_type_field() {
        let payload = NewRecord {
            record_type: "A".to_string(),
            name: "example.com".to_string(),
            content: "1.1.1.1".to_string(),
            ttl: 300,
            proxied: true,
        };
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "type": "A",
                "name": "example.com",
                "content": "1.1.1.1",
                "ttl": 300,
                "proxied": true,
            })
        );
    }

    #[test]
    fn special_characters_survive_serialization() {
        let payload = NewRecord {
            record_type: "TXT".to_string(),
            name: "_dmarc.example.com".to_string(),
            content: r#""v=DMARC1;p=none""#.to_string(),
            ttl: AUTO_TTL,
            proxied: false,
        };
        let json = serde_json::to_string(&payload).unwrap();
        let back: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(back["content"], r#""v=DMARC1;p=none""#);
    }

    #[test]
    fn desired_record_rejects_whitespace_and_empty_fields() {
        assert!(DesiredRecord::new("z", "A", "example.com", "1.1.1.1", 1, false).is_ok());
        assert!(DesiredRecord::new("z", "A", "bad name", "1.1.1.1", 1, false).is_err());
        assert!(DesiredRecord::new("z", "A", "example.com", "", 1, false).is_err());
        assert!(DesiredRecord::new("", "A", "example.com", "1.1.1.1", 1, false).is_err());
    }

    #[test]
    fn desired_record_matching_is_exact_on_name() {
        let desired = DesiredRecord::new("z", "a", "example.com", "1.1.1.1", 1, false).unwrap();
        assert_eq!(desired.record_type, "A");

        let mut record = RemoteRecord {
            id: "r".to_string(),
            record_type: "A".to_string(),
            name: "example.com".to_string(),
            content: "1.1.1.1".to_string(),
            ttl: 1,
            proxied: false,
        };
        assert!(desired.matches(&record));
        assert!(desired.is_satisfied_by(&record));

        record.name = "www.example.com".to_string();
        assert!(!desired.matches(&record));

        record.name = "example.com".to_string();
        record.record_type = "AAAA".to_string();
        assert!(!desired.matches(&record));

        record.record_type = "A".to_string();
        record.proxied = true;
        assert!(!desired.is_satisfied_by(&record));
    }
}
