use std::sync::Arc;

use deagrid_advert::SystemClock;
use tracing::info;

use super::read_advertisement;

pub fn check(path: &str, memory_mb: u64, stack: &str, app: Option<&str>) -> anyhow::Result<String> {
    let ad = read_advertisement(path, Arc::new(SystemClock))?;

    let memory_ok = ad.has_sufficient_memory(memory_mb);
    let stack_ok = ad.has_stack(stack);
    let eligible = ad.meets_needs(memory_mb, stack);
    info!(node_id = %ad.node_id(), memory_mb, %stack, eligible, "evaluated advertisement");

    let mut lines = vec![
        format!(
            "memory:   {} ({} MB requested, {} MB available)",
            verdict(memory_ok),
            memory_mb,
            ad.available_memory()
        ),
        format!("stack:    {} ({stack})", verdict(stack_ok)),
        format!("eligible: {}", if eligible { "yes" } else { "no" }),
    ];
    if let Some(app_id) = app {
        lines.push(format!("instances of {app_id}: {}", ad.instance_count_of(app_id)));
    }

    Ok(lines.join("\n"))
}

fn verdict(ok: bool) -> &'static str {
    if ok { "ok" } else { "insufficient" }
}
