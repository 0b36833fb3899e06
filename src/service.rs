//! Command-style API for the host shell.
//!
//! This is the surface the embedding server calls: a join-time address
//! check plus ban/unban/list operations. Format validation happens here,
//! before anything reaches the registry, so callers can tell "malformed
//! input" apart from "no ban" without control-flow tricks.

use crate::ban::BanRecord;
use crate::cidr::{self, CidrError};
use crate::clock::{Clock, SystemClock};
use crate::registry::BanRegistry;
use crate::store::BanStore;
use chrono::Duration;
use std::sync::Arc;
use tracing::info;

/// Ban service facade over the registry.
#[derive(Clone)]
pub struct BanService {
    registry: BanRegistry,
    clock: Arc<dyn Clock>,
}

impl BanService {
    /// Create a service over the given store and clock.
    pub fn new(store: Arc<dyn BanStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            registry: BanRegistry::new(store, clock.clone()),
            clock,
        }
    }

    /// Create a service on the wall clock.
    pub fn with_system_clock(store: Arc<dyn BanStore>) -> Self {
        Self::new(store, Arc::new(SystemClock))
    }

    /// Access the underlying registry.
    pub fn registry(&self) -> &BanRegistry {
        &self.registry
    }

    /// Join-time check: is `address` under an active ban?
    ///
    /// Returns the first matching record, evicting expired ones along the
    /// way. A malformed address is an error, not a miss.
    pub async fn check_address(&self, address: &str) -> Result<Option<BanRecord>, CidrError> {
        cidr::parse_address(address)?;
        Ok(self.registry.find_by_address(address).await)
    }

    /// Ban a CIDR range, permanently or for `duration_secs` seconds.
    ///
    /// Returns false when the range is already banned (or storage
    /// failed); the existing record is left untouched.
    pub async fn ban(
        &self,
        network: &str,
        reason: &str,
        issued_by: &str,
        duration_secs: Option<i64>,
    ) -> Result<bool, CidrError> {
        cidr::parse_network(network)?;

        let now = self.clock.now();
        let record = match duration_secs {
            Some(secs) => BanRecord::temporary(
                network,
                reason,
                issued_by,
                now,
                now + Duration::seconds(secs),
            ),
            None => BanRecord::permanent(network, reason, issued_by, now),
        };

        let added = self.registry.add(record).await;
        if added {
            info!(network = %network, issued_by = %issued_by, reason = %reason, "Ban added");
        }
        Ok(added)
    }

    /// Unban by exact range or by member address.
    ///
    /// A target containing `/` must be a well-formed CIDR range and is
    /// removed by exact key; a plain address removes every range that
    /// contains it. Returns the removed network strings.
    pub async fn unban(&self, target: &str) -> Result<Vec<String>, CidrError> {
        let removed = if target.contains('/') {
            cidr::parse_network(target)?;
            if self.registry.remove_by_network(target).await {
                vec![target.to_string()]
            } else {
                Vec::new()
            }
        } else {
            cidr::parse_address(target)?;
            self.registry.remove_by_address(target).await
        };

        if !removed.is_empty() {
            info!(target = %target, removed = removed.len(), "Bans removed");
        }
        Ok(removed)
    }

    /// All banned network strings, in storage order.
    pub async fn list_bans(&self) -> Vec<String> {
        self.registry
            .list()
            .await
            .into_iter()
            .map(|r| r.network)
            .collect()
    }

    /// The disconnect line for a record returned by [`check_address`],
    /// rendered against this service's clock.
    ///
    /// [`check_address`]: BanService::check_address
    pub fn rejection_message(&self, record: &BanRecord) -> String {
        record.rejection_message(self.clock.now())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ban::parse_timestamp;
    use crate::clock::ManualClock;
    use crate::store::MemoryStore;
    use chrono::{DateTime, Utc};

    fn at(s: &str) -> DateTime<Utc> {
        parse_timestamp(s).unwrap()
    }

    fn fixture() -> (BanService, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(at("2024-06-01T00:00:00")));
        let service = BanService::new(Arc::new(MemoryStore::new()), clock.clone());
        (service, clock)
    }

    #[tokio::test]
    async fn ban_check_unban_round_trip() {
        let (service, _clock) = fixture();

        assert!(service.ban("10.0.0.0/8", "spam", "admin", None).await.unwrap());

        let hit = service.check_address("10.1.2.3").await.unwrap().unwrap();
        assert_eq!(hit.network, "10.0.0.0/8");
        assert_eq!(hit.reason, "spam");
        assert_eq!(hit.issued_by, "admin");
        assert!(service.check_address("11.0.0.0").await.unwrap().is_none());

        assert_eq!(service.unban("10.0.0.0/8").await.unwrap(), ["10.0.0.0/8"]);
        assert!(service.check_address("10.1.2.3").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn malformed_input_is_an_error_not_a_miss() {
        let (service, _clock) = fixture();

        assert!(matches!(
            service.check_address("256.0.0.1").await,
            Err(CidrError::InvalidAddress(_))
        ));
        assert!(matches!(
            service.ban("10.0.0.0/33", "", "", None).await,
            Err(CidrError::InvalidNetwork(_))
        ));
        assert!(matches!(
            service.unban("10.0.0.0/33").await,
            Err(CidrError::InvalidNetwork(_))
        ));
        assert!(matches!(
            service.unban("10.0.0").await,
            Err(CidrError::InvalidAddress(_))
        ));
    }

    #[tokio::test]
    async fn duplicate_ban_reports_failure() {
        let (service, _clock) = fixture();

        assert!(service.ban("10.0.0.0/8", "", "", None).await.unwrap());
        assert!(!service.ban("10.0.0.0/8", "again", "", None).await.unwrap());
        assert_eq!(service.list_bans().await, ["10.0.0.0/8"]);
    }

    #[tokio::test]
    async fn temporary_ban_expires() {
        let (service, clock) = fixture();

        service
            .ban("10.0.0.0/8", "cooldown", "admin", Some(3600))
            .await
            .unwrap();
        assert!(service.check_address("10.1.2.3").await.unwrap().is_some());

        clock.advance(Duration::seconds(3601));
        assert!(service.check_address("10.1.2.3").await.unwrap().is_none());
        assert!(service.list_bans().await.is_empty());
    }

    #[tokio::test]
    async fn unban_by_address_removes_overlapping_ranges() {
        let (service, _clock) = fixture();

        for network in ["10.0.0.0/8", "10.1.0.0/16", "10.1.2.0/24", "172.16.0.0/12"] {
            service.ban(network, "", "", None).await.unwrap();
        }

        let removed = service.unban("10.1.2.3").await.unwrap();
        assert_eq!(removed, ["10.0.0.0/8", "10.1.0.0/16", "10.1.2.0/24"]);
        assert_eq!(service.list_bans().await, ["172.16.0.0/12"]);

        // Removing by range when nothing matches reports an empty set.
        assert!(service.unban("10.0.0.0/8").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn rejection_messages_render_against_service_clock() {
        let (service, clock) = fixture();

        service.ban("10.0.0.0/8", "spam", "admin", None).await.unwrap();
        let permanent = service.check_address("10.1.2.3").await.unwrap().unwrap();
        assert_eq!(
            service.rejection_message(&permanent),
            "You are banned forever: spam"
        );

        service
            .ban("192.168.0.0/16", "flooding", "admin", Some(26 * 3600))
            .await
            .unwrap();
        let temp = service.check_address("192.168.1.1").await.unwrap().unwrap();
        assert_eq!(
            service.rejection_message(&temp),
            "You are banned for 1 day and 2 hours: flooding"
        );

        clock.advance(Duration::hours(25));
        let temp = service.check_address("192.168.1.1").await.unwrap().unwrap();
        assert_eq!(
            service.rejection_message(&temp),
            "You are banned for 1 hour and 0 minutes: flooding"
        );
    }
}
