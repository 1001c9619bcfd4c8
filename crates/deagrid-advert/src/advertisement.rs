//! Node capacity advertisement.
//!
//! One [`Advertisement`] is built per broadcast received from a node. The
//! scheduler asks it whether the node can take a new instance (memory and
//! stack) and whether the snapshot is still fresh, and bumps the local
//! instance count when it places work there ahead of the next broadcast.

use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::{Duration, SystemTime};

use serde_json::Value;
use tracing::{debug, trace};

use crate::clock::{Clock, SystemClock};
use crate::error::AdvertResult;
use crate::message::{AdvertisementMessage, parse_json};

/// How long an advertisement stays usable after receipt.
///
/// Nodes re-broadcast every few seconds; this is that interval plus slack.
pub const ADVERTISEMENT_TTL: Duration = Duration::from_secs(10);

/// Snapshot of one node's capacity as of a single broadcast.
///
/// Memory, stacks and the receipt time are fixed at construction. Only the
/// per-application instance counts change afterwards, through
/// [`increment_instance_count`](Self::increment_instance_count).
#[derive(Debug)]
pub struct Advertisement {
    node_id: String,
    stacks: BTreeSet<String>,
    available_memory: u64,
    /// Guarded so concurrent placements against one snapshot never lose an update.
    instance_counts: RwLock<HashMap<String, u64>>,
    /// Payload exactly as received, for diagnostics only.
    raw: Value,
    received_at: SystemTime,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl Advertisement {
    /// Build an advertisement stamped with the system clock.
    pub fn new(raw: Value) -> AdvertResult<Self> {
        Self::with_clock(raw, Arc::new(SystemClock))
    }

    /// Build an advertisement that reads time from `clock`.
    ///
    /// Fails with [`AdvertError::MalformedAdvertisement`](crate::AdvertError::MalformedAdvertisement)
    /// if the payload lacks a required field or has one of the wrong type.
    pub fn with_clock(raw: Value, clock: Arc<dyn Clock>) -> AdvertResult<Self> {
        let message = AdvertisementMessage::from_value(&raw)?;
        let received_at = clock.now();

        let AdvertisementMessage {
            id,
            stacks,
            available_memory,
            app_id_to_count,
        } = message;
        let stacks: BTreeSet<String> = stacks.into_iter().collect();

        debug!(
            node_id = %id,
            available_memory,
            stacks = stacks.len(),
            apps = app_id_to_count.len(),
            "advertisement received"
        );

        Ok(Self {
            node_id: id,
            stacks,
            available_memory,
            instance_counts: RwLock::new(app_id_to_count),
            raw,
            received_at,
            ttl: ADVERTISEMENT_TTL,
            clock,
        })
    }

    /// Parse a JSON payload and build an advertisement on the system clock.
    pub fn from_json(json: &str) -> AdvertResult<Self> {
        Self::from_json_with_clock(json, Arc::new(SystemClock))
    }

    /// Parse a JSON payload and build an advertisement on `clock`.
    pub fn from_json_with_clock(json: &str, clock: Arc<dyn Clock>) -> AdvertResult<Self> {
        let raw = parse_json(json.as_bytes())?;
        Self::with_clock(raw, clock)
    }

    /// Override the freshness threshold (defaults to [`ADVERTISEMENT_TTL`]).
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn node_id(&self) -> &str {
        &self.node_id
    }

    /// The payload this advertisement was built from, unmodified.
    ///
    /// Local instance count increments are not reflected here.
    pub fn raw_stats(&self) -> &Value {
        &self.raw
    }

    /// Free memory in MB as reported by the node.
    pub fn available_memory(&self) -> u64 {
        self.available_memory
    }

    /// Supported stacks in sorted order.
    pub fn stacks(&self) -> impl Iterator<Item = &str> {
        self.stacks.iter().map(String::as_str)
    }

    pub fn received_at(&self) -> SystemTime {
        self.received_at
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// True if the node reports at least `requested_mb` free.
    pub fn has_sufficient_memory(&self, requested_mb: u64) -> bool {
        self.available_memory >= requested_mb
    }

    /// Exact, case-sensitive stack membership.
    pub fn has_stack(&self, name: &str) -> bool {
        self.stacks.contains(name)
    }

    /// Memory and stack both satisfied.
    pub fn meets_needs(&self, requested_mb: u64, stack: &str) -> bool {
        self.has_sufficient_memory(requested_mb) && self.has_stack(stack)
    }

    /// Known instances of `app_id` on this node; zero when never seen.
    pub fn instance_count_of(&self, app_id: &str) -> u64 {
        self.counts_read().get(app_id).copied().unwrap_or(0)
    }

    /// Record one more instance of `app_id` placed on this node.
    pub fn increment_instance_count(&self, app_id: &str) {
        let mut counts = self
            .instance_counts
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let count = counts.entry(app_id.to_string()).or_insert(0);
        *count = count.saturating_add(1);
        trace!(node_id = %self.node_id, %app_id, count = *count, "instance count incremented");
    }

    /// Copy of the current per-application instance counts.
    pub fn instance_counts(&self) -> HashMap<String, u64> {
        self.counts_read().clone()
    }

    /// Time elapsed between receipt and `now`. Zero if `now` is earlier.
    pub fn age_at(&self, now: SystemTime) -> Duration {
        now.duration_since(self.received_at).unwrap_or(Duration::ZERO)
    }

    /// Whether the snapshot is too old to place against, per the injected clock.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(self.clock.now())
    }

    /// Whether the snapshot is older than its TTL at `now`.
    ///
    /// An age of exactly the TTL is still fresh.
    pub fn is_expired_at(&self, now: SystemTime) -> bool {
        self.age_at(now) > self.ttl
    }

    fn counts_read(&self) -> std::sync::RwLockReadGuard<'_, HashMap<String, u64>> {
        self.instance_counts
            .read()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::error::AdvertError;
    use serde_json::json;

    fn message() -> Value {
        json!({
            "id": "staging-id",
            "stacks": ["stack-name"],
            "available_memory": 1024,
            "app_id_to_count": { "app_id": 2, "app_id_2": 1 }
        })
    }

    fn start() -> SystemTime {
        SystemTime::UNIX_EPOCH + Duration::from_secs(1_700_000_000)
    }

    fn ad_at(clock: &Arc<ManualClock>) -> Advertisement {
        Advertisement::with_clock(message(), clock.clone()).unwrap()
    }

    #[test]
    fn node_id_comes_from_payload() {
        let ad = Advertisement::new(message()).unwrap();
        assert_eq!(ad.node_id(), "staging-id");
    }

    #[test]
    fn raw_stats_is_verbatim() {
        let ad = Advertisement::new(message()).unwrap();
        assert_eq!(ad.raw_stats(), &message());
    }

    #[test]
    fn raw_stats_unchanged_by_increment() {
        let ad = Advertisement::new(message()).unwrap();
        ad.increment_instance_count("app_id");
        assert_eq!(ad.raw_stats()["app_id_to_count"]["app_id"], json!(2));
    }

    #[test]
    fn available_memory_from_payload() {
        let ad = Advertisement::new(message()).unwrap();
        assert_eq!(ad.available_memory(), 1024);
    }

    #[test]
    fn sufficient_memory_is_boundary_inclusive() {
        let ad = Advertisement::new(message()).unwrap();
        assert!(ad.has_sufficient_memory(512));
        assert!(ad.has_sufficient_memory(1024));
        assert!(!ad.has_sufficient_memory(1025));
        assert!(!ad.has_sufficient_memory(2048));
    }

    #[test]
    fn has_stack_is_exact_match() {
        let ad = Advertisement::new(message()).unwrap();
        assert!(ad.has_stack("stack-name"));
        assert!(!ad.has_stack("not-a-stack-name"));
        assert!(!ad.has_stack("Stack-Name"));
        assert!(!ad.has_stack(""));
    }

    #[test]
    fn meets_needs_requires_memory_and_stack() {
        let ad = Advertisement::new(message()).unwrap();
        assert!(ad.meets_needs(512, "stack-name"));
        assert!(!ad.meets_needs(512, "not-a-stack-name"));
        assert!(!ad.meets_needs(2048, "stack-name"));
        assert!(!ad.meets_needs(2048, "not-a-stack-name"));
    }

    #[test]
    fn meets_needs_is_conjunction() {
        let ad = Advertisement::new(message()).unwrap();
        for mb in [0, 1, 512, 1023, 1024, 1025, 4096] {
            for stack in ["stack-name", "other", ""] {
                assert_eq!(
                    ad.meets_needs(mb, stack),
                    ad.has_sufficient_memory(mb) && ad.has_stack(stack),
                    "mb={mb} stack={stack}"
                );
            }
        }
    }

    #[test]
    fn instance_count_of_known_and_unknown_apps() {
        let ad = Advertisement::new(message()).unwrap();
        assert_eq!(ad.instance_count_of("app_id"), 2);
        assert_eq!(ad.instance_count_of("app_id_2"), 1);
        assert_eq!(ad.instance_count_of("not_on_dea"), 0);
    }

    #[test]
    fn increment_existing_app() {
        let ad = Advertisement::new(message()).unwrap();
        ad.increment_instance_count("app_id");
        assert_eq!(ad.instance_count_of("app_id"), 3);
        assert_eq!(ad.instance_count_of("app_id_2"), 1);
    }

    #[test]
    fn increment_unknown_app_starts_at_one() {
        let ad = Advertisement::new(message()).unwrap();
        ad.increment_instance_count("new_app");
        assert_eq!(ad.instance_count_of("new_app"), 1);
    }

    #[test]
    fn repeated_increments_add_up() {
        let ad = Advertisement::new(message()).unwrap();
        for _ in 0..5 {
            ad.increment_instance_count("app_id_2");
        }
        assert_eq!(ad.instance_count_of("app_id_2"), 6);
        assert_eq!(ad.instance_counts().get("app_id_2"), Some(&6));
    }

    #[test]
    fn increment_past_u32_range() {
        let mut raw = message();
        raw["app_id_to_count"] = json!({ "big_app": 4_294_967_295u64 });
        let ad = Advertisement::new(raw).unwrap();
        ad.increment_instance_count("big_app");
        assert_eq!(ad.instance_count_of("big_app"), 4_294_967_296);
    }

    #[test]
    fn duplicate_stacks_collapse() {
        let mut raw = message();
        raw["stacks"] = json!(["b", "a", "b"]);
        let ad = Advertisement::new(raw).unwrap();
        assert_eq!(ad.stacks().collect::<Vec<_>>(), vec!["a", "b"]);
    }

    #[test]
    fn malformed_payload_fails_construction() {
        let err = Advertisement::new(json!({ "id": "n1" })).unwrap_err();
        assert!(matches!(err, AdvertError::MalformedAdvertisement(_)));
    }

    #[test]
    fn received_at_comes_from_clock() {
        let clock = Arc::new(ManualClock::new(start()));
        let ad = ad_at(&clock);
        clock.advance(Duration::from_secs(3));
        assert_eq!(ad.received_at(), start());
    }

    #[test]
    fn fresh_at_exactly_ttl() {
        let clock = Arc::new(ManualClock::new(start()));
        let ad = ad_at(&clock);
        clock.advance(ADVERTISEMENT_TTL);
        assert!(!ad.is_expired());
        assert!(!ad.is_expired_at(start() + Duration::from_secs(10)));
    }

    #[test]
    fn expired_just_past_ttl() {
        let clock = Arc::new(ManualClock::new(start()));
        let ad = ad_at(&clock);
        clock.advance(ADVERTISEMENT_TTL + Duration::from_nanos(1));
        assert!(ad.is_expired());
        assert!(ad.is_expired_at(start() + Duration::from_secs(11)));
    }

    #[test]
    fn clock_before_receipt_is_fresh() {
        let clock = Arc::new(ManualClock::new(start()));
        let ad = ad_at(&clock);
        let earlier = start() - Duration::from_secs(60);
        assert_eq!(ad.age_at(earlier), Duration::ZERO);
        assert!(!ad.is_expired_at(earlier));
    }

    #[test]
    fn custom_ttl() {
        let clock = Arc::new(ManualClock::new(start()));
        let ad = ad_at(&clock).with_ttl(Duration::from_secs(2));
        assert_eq!(ad.ttl(), Duration::from_secs(2));
        clock.advance(Duration::from_secs(2));
        assert!(!ad.is_expired());
        clock.advance(Duration::from_millis(1));
        assert!(ad.is_expired());
    }

    #[test]
    fn newly_built_advertisement_is_fresh() {
        let ad = Advertisement::new(message()).unwrap();
        assert!(!ad.is_expired());
    }

    #[test]
    fn from_json_rejects_garbage() {
        let err = Advertisement::from_json("not json").unwrap_err();
        assert!(matches!(err, AdvertError::MalformedAdvertisement(_)));
    }
}
