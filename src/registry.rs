//! The ban registry: membership lookup, lazy expiration, add/remove.
//!
//! The registry owns no state of its own; every operation reads through
//! the store so that concurrent writers (admin commands, join checks)
//! always see the durable truth. Storage failures are logged and degrade
//! to "no bans found / operation failed" rather than propagating.

use crate::ban::{BanRecord, BanState};
use crate::cidr;
use crate::clock::Clock;
use crate::store::BanStore;
use std::sync::Arc;
use tracing::{debug, error, warn};

/// Registry of banned CIDR ranges over a pluggable store.
#[derive(Clone)]
pub struct BanRegistry {
    store: Arc<dyn BanStore>,
    clock: Arc<dyn Clock>,
}

impl BanRegistry {
    /// Create a registry over the given store and clock.
    pub fn new(store: Arc<dyn BanStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Find the first stored ban whose range contains `address`.
    ///
    /// Records are scanned in storage order, so when ranges overlap the
    /// earliest-stored ban wins; this is deliberately not longest-prefix
    /// matching. An expired record encountered during the scan is removed
    /// as a side effect and never returned; scanning continues in case a
    /// later record also contains the address.
    pub async fn find_by_address(&self, address: &str) -> Option<BanRecord> {
        let records = match self.store.list().await {
            Ok(records) => records,
            Err(e) => {
                error!(error = %e, "Failed to list bans");
                return None;
            }
        };

        let now = self.clock.now();
        for record in records {
            if !cidr::matches(address, &record.network).unwrap_or(false) {
                continue;
            }

            match record.state(now) {
                BanState::Expired => {
                    // Lazy eviction. A failed delete is non-fatal: the
                    // stale row stays for the next lookup to retry.
                    match self.store.delete(&record.network).await {
                        Ok(_) => {
                            debug!(network = %record.network, "Evicted expired ban");
                        }
                        Err(e) => {
                            warn!(network = %record.network, error = %e, "Failed to evict expired ban");
                        }
                    }
                }
                BanState::Permanent | BanState::Active => return Some(record),
            }
        }

        None
    }

    /// All stored records in storage order.
    ///
    /// Expired entries are not filtered here; expiration is enforced at
    /// lookup time, and listing a stale ban is harmless because removal
    /// by range is idempotent.
    pub async fn list(&self) -> Vec<BanRecord> {
        match self.store.list().await {
            Ok(records) => records,
            Err(e) => {
                error!(error = %e, "Failed to list bans");
                Vec::new()
            }
        }
    }

    /// Append one record. The network key must already be validated by
    /// the caller. Returns false if the key already exists or storage
    /// failed.
    pub async fn add(&self, record: BanRecord) -> bool {
        match self.store.create(&record).await {
            Ok(rows) => rows > 0,
            Err(e) => {
                error!(network = %record.network, error = %e, "Failed to add ban");
                false
            }
        }
    }

    /// Remove the record whose network key equals `network` exactly.
    pub async fn remove_by_network(&self, network: &str) -> bool {
        match self.store.delete(network).await {
            Ok(rows) => rows > 0,
            Err(e) => {
                error!(network = %network, error = %e, "Failed to remove ban");
                false
            }
        }
    }

    /// Remove every stored range containing `address`; returns the
    /// removed network strings.
    ///
    /// The candidate set is computed in full before any deletion so the
    /// scan never observes its own mutations. A delete hitting an
    /// already-removed row (racing caller) is a silent no-op.
    pub async fn remove_by_address(&self, address: &str) -> Vec<String> {
        let records = match self.store.list().await {
            Ok(records) => records,
            Err(e) => {
                error!(error = %e, "Failed to list bans");
                return Vec::new();
            }
        };

        let doomed: Vec<String> = records
            .into_iter()
            .filter(|r| cidr::matches(address, &r.network).unwrap_or(false))
            .map(|r| r.network)
            .collect();

        for network in &doomed {
            if let Err(e) = self.store.delete(network).await {
                error!(network = %network, error = %e, "Failed to remove ban");
            }
        }

        doomed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ban::parse_timestamp;
    use crate::clock::ManualClock;
    use crate::store::MemoryStore;
    use chrono::{DateTime, Duration, Utc};

    fn at(s: &str) -> DateTime<Utc> {
        parse_timestamp(s).unwrap()
    }

    fn fixture() -> (BanRegistry, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(at("2024-06-01T00:00:00")));
        let registry = BanRegistry::new(Arc::new(MemoryStore::new()), clock.clone());
        (registry, clock)
    }

    #[tokio::test]
    async fn duplicate_add_leaves_registry_unchanged() {
        let (registry, clock) = fixture();
        let record = BanRecord::permanent("10.0.0.0/8", "first", "", clock.now());

        assert!(registry.add(record.clone()).await);
        let mut dup = record;
        dup.reason = "second".to_string();
        assert!(!registry.add(dup).await);

        let records = registry.list().await;
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].reason, "first");
    }

    #[tokio::test]
    async fn first_stored_match_wins_on_overlap() {
        let (registry, clock) = fixture();
        let now = clock.now();
        registry
            .add(BanRecord::permanent("10.0.0.0/8", "wide", "", now))
            .await;
        registry
            .add(BanRecord::permanent("10.1.0.0/16", "narrow", "", now))
            .await;

        // Not longest-prefix: the /8 was stored first, so it wins.
        let hit = registry.find_by_address("10.1.2.3").await.unwrap();
        assert_eq!(hit.network, "10.0.0.0/8");
    }

    #[tokio::test]
    async fn remove_by_address_removes_all_containing_ranges() {
        let (registry, clock) = fixture();
        let now = clock.now();
        for network in ["10.0.0.0/8", "10.1.0.0/16", "10.1.2.0/24", "192.168.0.0/16"] {
            registry
                .add(BanRecord::permanent(network, "", "", now))
                .await;
        }

        let removed = registry.remove_by_address("10.1.2.3").await;
        assert_eq!(removed, ["10.0.0.0/8", "10.1.0.0/16", "10.1.2.0/24"]);

        let left: Vec<String> = registry.list().await.into_iter().map(|r| r.network).collect();
        assert_eq!(left, ["192.168.0.0/16"]);
    }

    #[tokio::test]
    async fn remove_by_address_without_match_is_empty() {
        let (registry, clock) = fixture();
        registry
            .add(BanRecord::permanent("10.0.0.0/8", "", "", clock.now()))
            .await;

        assert!(registry.remove_by_address("11.0.0.0").await.is_empty());
        assert_eq!(registry.list().await.len(), 1);
    }

    #[tokio::test]
    async fn expired_ban_is_evicted_by_lookup() {
        let (registry, clock) = fixture();
        let now = clock.now();
        registry
            .add(BanRecord::temporary(
                "10.0.0.0/8",
                "",
                "",
                now,
                now + Duration::hours(1),
            ))
            .await;

        // Listing does not enforce expiry, so the stale row still shows...
        clock.advance(Duration::hours(2));
        assert_eq!(registry.list().await.len(), 1);

        // ...and the first lookup that observes it removes it.
        assert!(registry.find_by_address("10.1.2.3").await.is_none());
        assert!(registry.list().await.is_empty());
    }

    #[tokio::test]
    async fn eviction_continues_to_later_match() {
        let (registry, clock) = fixture();
        let now = clock.now();
        registry
            .add(BanRecord::temporary(
                "10.0.0.0/8",
                "temp",
                "",
                now,
                now + Duration::minutes(1),
            ))
            .await;
        registry
            .add(BanRecord::permanent("10.1.0.0/16", "perm", "", now))
            .await;

        clock.advance(Duration::minutes(5));
        let hit = registry.find_by_address("10.1.2.3").await.unwrap();
        assert_eq!(hit.network, "10.1.0.0/16");

        // Only the expired record was evicted.
        let left: Vec<String> = registry.list().await.into_iter().map(|r| r.network).collect();
        assert_eq!(left, ["10.1.0.0/16"]);
    }

    #[tokio::test]
    async fn unparsable_expiration_is_permanent() {
        let (registry, clock) = fixture();
        let mut record = BanRecord::permanent("10.0.0.0/8", "", "", clock.now());
        record.expires_at = "garbage".to_string();
        registry.add(record).await;

        clock.advance(Duration::days(365));
        assert!(registry.find_by_address("10.1.2.3").await.is_some());
    }

    #[tokio::test]
    async fn ban_expiring_one_second_ago_no_longer_matches() {
        let (registry, clock) = fixture();
        let now = clock.now();
        registry
            .add(BanRecord::temporary(
                "10.0.0.0/8",
                "",
                "",
                now - Duration::hours(1),
                now - Duration::seconds(1),
            ))
            .await;

        assert!(registry.find_by_address("10.1.2.3").await.is_none());
        assert!(registry.list().await.is_empty());
    }
}
