use std::sync::Arc;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tracing::info;

use crate::config::{ConfigError, ScopeConfig};

/// Scope configuration per record type, fixed at registration.
pub struct Registry {
    types: DashMap<String, Arc<ScopeConfig>>,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl Registry {
    pub fn new() -> Self {
        Self {
            types: DashMap::new(),
        }
    }

    /// Register `record_type` once. Registering it again is an error:
    /// configuration does not change after registration.
    pub fn register(&self, record_type: &str, config: ScopeConfig) -> Result<Arc<ScopeConfig>, ConfigError> {
        match self.types.entry(record_type.to_string()) {
            Entry::Occupied(_) => Err(ConfigError::AlreadyRegistered(record_type.to_string())),
            Entry::Vacant(slot) => {
                info!(
                    record_type,
                    parent = %config.parent_accessor,
                    start = config.start_field.as_deref().unwrap_or("-"),
                    finish = config.finish_field.as_deref().unwrap_or("-"),
                    unique = config.unique,
                    ignore_empty = config.ignore_empty,
                    precision = ?config.precision,
                    "registered record type"
                );
                let config = Arc::new(config);
                slot.insert(config.clone());
                Ok(config)
            }
        }
    }

    /// Register from a JSON document (see [`ScopeConfig::from_json`]).
    pub fn register_json(&self, record_type: &str, json: &str) -> Result<Arc<ScopeConfig>, ConfigError> {
        self.register(record_type, ScopeConfig::from_json(json)?)
    }

    pub fn get(&self, record_type: &str) -> Option<Arc<ScopeConfig>> {
        self.types.get(record_type).map(|e| e.value().clone())
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}
