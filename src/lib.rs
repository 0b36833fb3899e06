//! # cidrbans
//!
//! A registry of banned IPv4 CIDR ranges with temporal expiration.
//!
//! The crate decides, for an incoming address, whether it falls under an
//! active ban and for how long. It is built as the core of a game-server
//! ban plugin: the host owns the join hooks and admin commands and calls
//! in through [`BanService`]; persistence sits behind the [`BanStore`]
//! seam with SQLite and in-memory backends.
//!
//! ```no_run
//! use cidrbans::{BanService, store::MemoryStore};
//! use std::sync::Arc;
//!
//! # async fn demo() -> Result<(), cidrbans::CidrError> {
//! let service = BanService::with_system_clock(Arc::new(MemoryStore::new()));
//!
//! service.ban("10.0.0.0/8", "spam wave", "admin", Some(3600)).await?;
//! if let Some(ban) = service.check_address("10.1.2.3").await? {
//!     println!("{}", service.rejection_message(&ban));
//! }
//! # Ok(())
//! # }
//! ```
//!
//! Expiration is lazy: an expired record is evicted by the next lookup
//! that observes it, not by a background sweep. Overlapping ranges
//! resolve first-match-wins in storage order, not longest-prefix.

pub mod ban;
pub mod cidr;
pub mod clock;
pub mod config;
pub mod registry;
pub mod service;
pub mod store;

pub use ban::{BanRecord, BanState};
pub use cidr::CidrError;
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{Config, ConfigError, StorageBackend, StorageConfig};
pub use registry::BanRegistry;
pub use service::BanService;
pub use store::{BanStore, StoreError};
