use std::fmt::Write;
use std::sync::Arc;

use deagrid_advert::SystemClock;

use super::read_advertisement;

pub fn inspect(path: &str, format: &str) -> anyhow::Result<String> {
    let ad = read_advertisement(path, Arc::new(SystemClock))?;

    if format == "json" {
        return Ok(serde_json::to_string_pretty(ad.raw_stats())?);
    }

    let mut out = String::new();
    writeln!(out, "node:      {}", ad.node_id())?;
    writeln!(out, "memory:    {} MB", ad.available_memory())?;
    writeln!(out, "stacks:    {}", ad.stacks().collect::<Vec<_>>().join(", "))?;

    let mut counts: Vec<_> = ad.instance_counts().into_iter().collect();
    counts.sort();
    if counts.is_empty() {
        write!(out, "instances: none")?;
    } else {
        write!(out, "instances:")?;
        for (app, count) in counts {
            write!(out, "\n  {app}: {count}")?;
        }
    }

    Ok(out)
}
