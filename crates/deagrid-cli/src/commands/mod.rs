pub mod check;
pub mod inspect;
pub mod simulate;

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use deagrid_advert::{Advertisement, Clock, DeagridConfig};

/// Load the config file if one was given, otherwise fall back to defaults.
pub fn load_config(path: Option<&str>) -> anyhow::Result<DeagridConfig> {
    match path {
        Some(p) => DeagridConfig::from_file(Path::new(p))
            .with_context(|| format!("failed to load config {p}")),
        None => Ok(DeagridConfig::default()),
    }
}

/// Read a payload file and build an advertisement on `clock`.
pub fn read_advertisement(path: &str, clock: Arc<dyn Clock>) -> anyhow::Result<Advertisement> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {path}"))?;
    let ad = Advertisement::from_json_with_clock(&json, clock)
        .with_context(|| format!("failed to decode {path}"))?;
    Ok(ad)
}
