//! Typed payloads for the write operations.
//!
//! # Design
//! Every client operation accepts any `Serialize` value, so these are a
//! convenience rather than a requirement: they spell out the camelCase
//! shape the v3 API expects and keep `None` fields out of the JSON so a
//! partial update does not blank remote values.

use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;

use crate::config::Config;
use crate::error::ApiError;

/// Contact attributes for create, sync and update calls.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ContactInput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub field_values: Vec<FieldValue>,
}

impl ContactInput {
    pub fn with_email(email: &str) -> Self {
        Self {
            email: Some(email.to_string()),
            ..Self::default()
        }
    }
}

/// A custom field value attached to a contact.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FieldValue {
    pub field: String,
    pub value: String,
}

impl FieldValue {
    /// Resolve `label` through the `"fields"` dictionary of `config`.
    pub fn labeled(config: &Config, label: &str, value: &str) -> Result<Self, ApiError> {
        let field = id_string(config.dictionary_value("fields", label)?);
        Ok(Self {
            field,
            value: value.to_string(),
        })
    }
}

/// Payload for `add_tag_to_contact`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ContactTagInput {
    pub contact: String,
    pub tag: String,
}

impl ContactTagInput {
    /// Resolve `label` through the `"tags"` dictionary of `config`.
    pub fn labeled(config: &Config, contact: &str, label: &str) -> Result<Self, ApiError> {
        Ok(Self {
            contact: contact.to_string(),
            tag: id_string(config.dictionary_value("tags", label)?),
        })
    }
}

/// Subscription status of a contact on a list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListStatus {
    Subscribed,
    Unsubscribed,
}

impl Serialize for ListStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(match self {
            ListStatus::Subscribed => 1,
            ListStatus::Unsubscribed => 2,
        })
    }
}

/// Payload for `add_contact_to_list`.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ContactListInput {
    pub list: String,
    pub contact: String,
    pub status: ListStatus,
}

impl ContactListInput {
    pub fn subscribe(list: &str, contact: &str) -> Self {
        Self {
            list: list.to_string(),
            contact: contact.to_string(),
            status: ListStatus::Subscribed,
        }
    }

    /// Resolve `label` through the `"lists"` dictionary of `config`.
    pub fn labeled(config: &Config, label: &str, contact: &str) -> Result<Self, ApiError> {
        let list = id_string(config.dictionary_value("lists", label)?);
        Ok(Self::subscribe(&list, contact))
    }
}

fn id_string(id: &Value) -> String {
    match id {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
