//! Connection settings shared by every client instance.
//!
//! # Design
//! A `Config` is filled in once at startup and then wrapped in an `Arc` so
//! any number of `ActiveCampaign` clients can borrow the same base URL,
//! default token, API version and label dictionary. Nothing is validated
//! here; emptiness checks happen when a client is constructed.

use std::collections::HashMap;

use serde_json::Value;

use crate::dictionary::Dictionary;
use crate::error::ApiError;

pub const DEFAULT_API_VERSION: &str = "3";

/// Base URL, credentials, API version and label dictionary.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    base_url: String,
    api_token: Option<String>,
    api_version: String,
    dictionary: Dictionary,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            api_token: None,
            api_version: DEFAULT_API_VERSION.to_string(),
            dictionary: Dictionary::new(),
        }
    }
}

impl Config {
    pub fn new(base_url: &str, api_token: Option<&str>) -> Self {
        let mut config = Self::default();
        config.set_credentials(base_url, api_token);
        config
    }

    /// Store the base URL and default token. `None` clears the token.
    pub fn set_credentials(&mut self, base_url: &str, api_token: Option<&str>) {
        self.base_url = base_url.to_string();
        self.api_token = api_token.map(str::to_string);
    }

    pub fn with_api_version(mut self, api_version: impl ToString) -> Self {
        self.api_version = api_version.to_string();
        self
    }

    /// Register the label mapping for `category`, replacing any earlier one.
    pub fn set_dictionary<I, K, V>(&mut self, category: &str, mapping: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        self.dictionary.set(category, mapping);
    }

    /// Builder form of `set_dictionary`.
    pub fn with_dictionary<I, K, V>(mut self, category: &str, mapping: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        self.set_dictionary(category, mapping);
        self
    }

    /// Every label registered for `category`.
    pub fn dictionary_of(&self, category: &str) -> Result<&HashMap<String, Value>, ApiError> {
        self.dictionary.of(category)
    }

    /// The identifier behind `label` in `category`.
    pub fn dictionary_value(&self, category: &str, label: &str) -> Result<&Value, ApiError> {
        self.dictionary.value(category, label)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn api_token(&self) -> Option<&str> {
        self.api_token.as_deref()
    }

    pub fn api_version(&self) -> &str {
        &self.api_version
    }
}
