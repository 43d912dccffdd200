//! Friendly labels for provider identifiers.
//!
//! Custom fields, tags and lists are addressed by numeric ids on the remote
//! side. A `Dictionary` maps labels such as `"FirstName"` or `"VIP"` to
//! those ids, grouped by category (`"fields"`, `"tags"`, `"lists"`, ...).

use std::collections::HashMap;

use serde_json::Value;

use crate::error::ApiError;

/// Label → identifier mappings grouped by category.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dictionary {
    categories: HashMap<String, HashMap<String, Value>>,
}

impl Dictionary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store the mapping for `category`, replacing whatever was there.
    pub fn set<C, I, K, V>(&mut self, category: C, mapping: I)
    where
        C: Into<String>,
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        let mapping = mapping
            .into_iter()
            .map(|(label, id)| (label.into(), id.into()))
            .collect();
        self.categories.insert(category.into(), mapping);
    }

    /// The whole mapping registered for `category`.
    pub fn of(&self, category: &str) -> Result<&HashMap<String, Value>, ApiError> {
        self.categories
            .get(category)
            .ok_or_else(|| ApiError::Lookup(format!("unknown dictionary '{category}'")))
    }

    /// The identifier registered under `label` in `category`.
    pub fn value(&self, category: &str, label: &str) -> Result<&Value, ApiError> {
        self.of(category)?.get(label).ok_or_else(|| {
            ApiError::Lookup(format!("unknown label '{label}' in dictionary '{category}'"))
        })
    }
}
