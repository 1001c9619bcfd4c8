use std::sync::Arc;
use std::time::SystemTime;

use anyhow::Context;
use deagrid_advert::config::parse_duration;
use deagrid_advert::{DeagridConfig, ManualClock};

use super::read_advertisement;

/// Build the advertisement on a manual clock, advance it by `elapsed`,
/// and report whether it would still be usable.
pub fn simulate(path: &str, elapsed: &str, config: &DeagridConfig) -> anyhow::Result<String> {
    let elapsed = parse_duration(elapsed)
        .with_context(|| format!("invalid duration: {elapsed:?}"))?;
    let ttl = config.advertisement.ttl()?;

    let clock = Arc::new(ManualClock::new(SystemTime::now()));
    let ad = read_advertisement(path, clock.clone())?.with_ttl(ttl);
    if !clock.advance(elapsed) {
        anyhow::bail!("elapsed duration {elapsed:?} is out of range");
    }

    let state = if ad.is_expired() { "expired" } else { "fresh" };
    Ok(format!(
        "{}: {state} after {:?} (ttl {:?})",
        ad.node_id(),
        elapsed,
        ad.ttl()
    ))
}
