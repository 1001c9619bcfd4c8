//! deagrid.toml configuration parser.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::advertisement::ADVERTISEMENT_TTL;
use crate::error::{AdvertError, AdvertResult};

/// Default config file name looked up by the CLI.
pub const DEFAULT_CONFIG_FILE: &str = "deagrid.toml";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeagridConfig {
    #[serde(default)]
    pub advertisement: AdvertisementConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AdvertisementConfig {
    /// Freshness threshold, e.g. "10s", "500ms", "1m".
    pub ttl: Option<String>,
}

impl DeagridConfig {
    pub fn from_file(path: &Path) -> AdvertResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> AdvertResult<Self> {
        toml::from_str(content).map_err(|e| AdvertError::Config(e.to_string()))
    }

    pub fn to_toml_string(&self) -> AdvertResult<String> {
        toml::to_string_pretty(self).map_err(|e| AdvertError::Config(e.to_string()))
    }
}

impl AdvertisementConfig {
    /// Configured TTL, or [`ADVERTISEMENT_TTL`] when unset.
    pub fn ttl(&self) -> AdvertResult<Duration> {
        match &self.ttl {
            None => Ok(ADVERTISEMENT_TTL),
            Some(raw) => parse_duration(raw)
                .ok_or_else(|| AdvertError::Config(format!("invalid ttl: {raw:?}"))),
        }
    }
}

/// Parse a duration string like "5s", "500ms", "1m".
pub fn parse_duration(s: &str) -> Option<Duration> {
    let s = s.trim();
    if let Some(secs) = s.strip_suffix('s') {
        if let Some(ms) = secs.strip_suffix('m') {
            ms.parse::<u64>().ok().map(Duration::from_millis)
        } else {
            secs.parse::<u64>().ok().map(Duration::from_secs)
        }
    } else if let Some(mins) = s.strip_suffix('m') {
        mins.parse::<u64>()
            .ok()
            .and_then(|m| m.checked_mul(60))
            .map(Duration::from_secs)
    } else {
        s.parse::<u64>().ok().map(Duration::from_secs)
    }
}
