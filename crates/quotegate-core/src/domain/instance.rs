use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const APPLICATION_NAME: &str = "applicationName";
pub const INSTANCE_INDEX: &str = "instanceIndex";
pub const INSTANCE_ADDR: &str = "instanceAddr";
pub const CONTAINER_ADDR: &str = "containerAddr";

/// Metadata describing the downstream instance that served a request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InstanceInfo(BTreeMap<String, Value>);

impl InstanceInfo {
    pub fn new(entries: BTreeMap<String, Value>) -> Self {
        Self(entries)
    }

    /// Placeholder describing no reachable instance. Always carries all four
    /// well-known keys.
    pub fn placeholder() -> Self {
        let entries = [
            (APPLICATION_NAME, ""),
            (INSTANCE_INDEX, "0"),
            (INSTANCE_ADDR, "0.0.0.0"),
            (CONTAINER_ADDR, "0.0.0.0"),
        ]
        .into_iter()
        .map(|(key, value)| (key.to_owned(), Value::from(value)))
        .collect();
        Self(entries)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn into_inner(self) -> BTreeMap<String, Value> {
        self.0
    }
}
