//! Console configuration.
//!
//! Configuration is stored in `.ticketdesk/config.yaml` and includes:
//! - Filter panel policy (active filter cap, pinned field)
//! - List page size
//! - Backend location, timeout, credentials and route overrides

use std::env;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Result, TicketDeskError};
use crate::filter::{DEFAULT_MAX_ACTIVE_FILTERS, FilterPolicy};
use crate::query::DEFAULT_PAGE_SIZE;

/// Environment variable that overrides the config file location
pub const CONFIG_PATH_ENV: &str = "TICKETDESK_CONFIG";

/// Environment variable that overrides the configured API token
pub const API_TOKEN_ENV: &str = "TICKETDESK_API_TOKEN";

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub filters: FilterConfig,

    #[serde(default)]
    pub list: ListConfig,

    #[serde(default)]
    pub backend: BackendConfig,
}

/// Filter panel policy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterConfig {
    /// Maximum number of non-pinned active filters (default: 4)
    #[serde(default = "default_max_active")]
    pub max_active: usize,

    /// Field that is always shown and exempt from the cap
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pinned_field: Option<String>,
}

fn default_max_active() -> usize {
    DEFAULT_MAX_ACTIVE_FILTERS
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            max_active: default_max_active(),
            pinned_field: None,
        }
    }
}

/// Ticket list settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListConfig {
    /// Tickets per page (default: 10)
    #[serde(default = "default_page_size")]
    pub page_size: u32,
}

fn default_page_size() -> u32 {
    DEFAULT_PAGE_SIZE
}

impl Default for ListConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
        }
    }
}

/// Backend connection settings
#[derive(Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Base URL of the ticket API, e.g. `https://desk.example.com/api`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    /// Request timeout in seconds (default: 30)
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_token: Option<String>,

    #[serde(default)]
    pub routes: RouteConfig,
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            timeout_secs: default_timeout_secs(),
            api_token: None,
            routes: RouteConfig::default(),
        }
    }
}

impl fmt::Debug for BackendConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackendConfig")
            .field("base_url", &self.base_url)
            .field("timeout_secs", &self.timeout_secs)
            .field(
                "api_token",
                &self.api_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("routes", &self.routes)
            .finish()
    }
}

/// Endpoint paths relative to the base URL. `{id}` is replaced by the
/// ticket number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RouteConfig {
    pub filter_schema: String,
    pub list: String,
    pub sorted_list: String,
    pub update: String,
    pub bulk_update: String,
}

impl Default for RouteConfig {
    fn default() -> Self {
        Self {
            filter_schema: "/tickets/filter-fields".to_string(),
            list: "/tickets".to_string(),
            sorted_list: "/tickets/sorted".to_string(),
            update: "/tickets/{id}".to_string(),
            bulk_update: "/tickets/bulk".to_string(),
        }
    }
}

impl Config {
    /// Get the path to the config file
    pub fn config_path() -> PathBuf {
        if let Ok(path) = env::var(CONFIG_PATH_ENV)
            && !path.is_empty()
        {
            return PathBuf::from(path);
        }
        PathBuf::from(".ticketdesk").join("config.yaml")
    }

    /// Load configuration from file, or return default if not found
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path())
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Config::default());
        }

        let content = fs::read_to_string(path).map_err(|e| {
            TicketDeskError::Io(std::io::Error::new(
                e.kind(),
                format!("Failed to read config at {}: {}", path.display(), e),
            ))
        })?;
        let config: Config = serde_yaml_ng::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to file
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }
        let content = serde_yaml_ng::to_string(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.filters.max_active == 0 {
            return Err(TicketDeskError::Config(
                "filters.max_active must be at least 1".to_string(),
            ));
        }
        if self.list.page_size == 0 {
            return Err(TicketDeskError::Config(
                "list.page_size must be at least 1".to_string(),
            ));
        }
        if self.backend.timeout_secs == 0 {
            return Err(TicketDeskError::Config(
                "backend.timeout_secs must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    pub fn filter_policy(&self) -> FilterPolicy {
        FilterPolicy {
            max_active: self.filters.max_active,
            pinned_field: self.filters.pinned_field.clone(),
        }
    }

    /// Get API token from environment variable or config
    pub fn api_token(&self) -> Option<String> {
        if let Ok(token) = env::var(API_TOKEN_ENV)
            && !token.is_empty()
        {
            return Some(token);
        }

        self.backend.api_token.clone()
    }

    /// Get the backend request timeout
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.backend.timeout_secs)
    }
}
