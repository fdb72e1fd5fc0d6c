use serde::{Deserialize, Serialize};

use crate::time::Precision;

/// How a record type takes part in temporal validation.
///
/// Built once when the type is registered and shared read-only afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScopeConfig {
    /// Field holding the start of the active period.
    #[serde(default)]
    pub start_field: Option<String>,
    /// Field holding the (exclusive) end of the active period.
    #[serde(default)]
    pub finish_field: Option<String>,
    /// Accessor locating the owning parent.
    pub parent_accessor: String,
    /// At most one sibling active at any instant.
    #[serde(default)]
    pub unique: bool,
    /// Zero-length periods never count as active.
    #[serde(default)]
    pub ignore_empty: bool,
    #[serde(default)]
    pub precision: Precision,
}

/// On-disk shape: `backend` may stand in for `precision`.
#[derive(Deserialize)]
struct RawScopeConfig {
    #[serde(flatten)]
    config: ScopeConfig,
    #[serde(default)]
    backend: Option<String>,
}

impl ScopeConfig {
    pub fn new(parent_accessor: impl Into<String>) -> Self {
        Self {
            start_field: None,
            finish_field: None,
            parent_accessor: parent_accessor.into(),
            unique: false,
            ignore_empty: false,
            precision: Precision::Native,
        }
    }

    pub fn active_from(mut self, start_field: impl Into<String>) -> Self {
        self.start_field = Some(start_field.into());
        self
    }

    pub fn until(mut self, finish_field: impl Into<String>) -> Self {
        self.finish_field = Some(finish_field.into());
        self
    }

    pub fn uniquely_active(mut self) -> Self {
        self.unique = true;
        self
    }

    pub fn ignoring_empty(mut self) -> Self {
        self.ignore_empty = true;
        self
    }

    pub fn with_precision(mut self, precision: Precision) -> Self {
        self.precision = precision;
        self
    }

    /// Load from JSON. A `backend` name, when given, decides the precision.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let raw: RawScopeConfig =
            serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))?;
        let mut config = raw.config;
        if let Some(backend) = raw.backend {
            config.precision = Precision::for_backend(&backend);
        }
        Ok(config)
    }

    /// The first undeclared field needed for collision checks, if any.
    pub fn missing_field(&self) -> Option<&'static str> {
        if self.start_field.as_deref().is_none_or(str::is_empty) {
            Some("start_field")
        } else if self.finish_field.as_deref().is_none_or(str::is_empty) {
            Some("finish_field")
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    Parse(String),
    AlreadyRegistered(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Parse(e) => write!(f, "invalid scope config: {e}"),
            ConfigError::AlreadyRegistered(name) => {
                write!(f, "record type already registered: {name}")
            }
        }
    }
}

impl std::error::Error for ConfigError {}
