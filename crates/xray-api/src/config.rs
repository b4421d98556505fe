//! Server configuration, read from the environment once at startup
use std::env;

pub const DEFAULT_ADDR: &str = "0.0.0.0:8787";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    /// Listen address (`XRAY_ADDR`)
    pub addr: String,
    /// Page size when a listing gives no `limit` (`XRAY_LIST_LIMIT`)
    pub default_list_limit: usize,
    /// Upper bound applied to any requested `limit` (`XRAY_MAX_LIST_LIMIT`)
    pub max_list_limit: usize,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            addr: DEFAULT_ADDR.to_string(),
            default_list_limit: xray_store::DEFAULT_LIST_LIMIT,
            max_list_limit: 500,
        }
    }
}

impl ApiConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key lookup. Unset or unparseable values fall back to
    /// the defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let number = |key: &str, fallback: usize| {
            lookup(key)
                .and_then(|v| v.trim().parse::<usize>().ok())
                .unwrap_or(fallback)
        };

        let max_list_limit = number("XRAY_MAX_LIST_LIMIT", defaults.max_list_limit).max(1);
        Self {
            addr: lookup("XRAY_ADDR").unwrap_or(defaults.addr),
            default_list_limit: number("XRAY_LIST_LIMIT", defaults.default_list_limit)
                .min(max_list_limit),
            max_list_limit,
        }
    }

    /// Effective limit for a listing request
    pub fn clamp_limit(&self, requested: Option<usize>) -> usize {
        requested
            .unwrap_or(self.default_list_limit)
            .min(self.max_list_limit)
    }
}
