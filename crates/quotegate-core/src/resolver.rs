use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

/// Maps a logical service name to a `host[:port]` address.
///
/// Load balancing and discovery live behind this trait.
pub trait ServiceResolver: Send + Sync {
    fn resolve(&self, service: &str) -> Option<String>;
}

/// Treats the service name itself as the address.
#[derive(Debug, Default, Clone, Copy)]
pub struct DirectResolver;

impl ServiceResolver for DirectResolver {
    fn resolve(&self, service: &str) -> Option<String> {
        Some(service.to_owned())
    }
}

/// Fixed name to address table that can be updated between requests.
#[derive(Debug, Default)]
pub struct StaticResolver {
    table: RwLock<HashMap<String, String>>,
}

impl StaticResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entry(self, service: impl Into<String>, address: impl Into<String>) -> Self {
        self.insert(service, address);
        self
    }

    pub fn insert(&self, service: impl Into<String>, address: impl Into<String>) {
        self.table
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(service.into(), address.into());
    }

    pub fn remove(&self, service: &str) -> Option<String> {
        self.table
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(service)
    }
}

impl ServiceResolver for StaticResolver {
    fn resolve(&self, service: &str) -> Option<String> {
        self.table
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(service)
            .cloned()
    }
}
