//! Async GCRA rate limiting for Rust.
//!
//! `freqlimit` paces operations with the Generic Cell Rate Algorithm:
//!
//! - **Delay, not deny**: acquisition waits exactly long enough to conform,
//!   there is no rejected outcome
//! - **Pluggable backends**: in-process with idle eviction, or Redis with an
//!   atomic server-side script for limits shared between processes
//! - **Per-key schedules**: every key paces independently; a null key and a
//!   limiter-wide global slot are first-class
//! - **Pure core**: the GCRA step is a clock-free function, identical across
//!   backends
//!
//! # Quick Start
//!
//! ```ignore
//! use freqlimit::{FreqLimit, FreqLimitParams, MemoryBackend};
//!
//! #[tokio::main]
//! async fn main() -> freqlimit::Result<()> {
//!     // 2 operations per second, up to 3 back to back
//!     let params = FreqLimitParams::new(2, 1.0)?.with_burst(3)?;
//!     let limiter = FreqLimit::new(params, MemoryBackend::new());
//!
//!     let _slot = limiter.acquire("chat:42").await?;
//!     // rate-limited region
//!     Ok(())
//! }
//! ```
//!
//! # Backends
//!
//! | Backend | Scope | Clock | Feature Flag |
//! |---------|-------|-------|--------------|
//! | [`MemoryBackend`] | One process | Caller-supplied monotonic | `memory` (default) |
//! | [`RedisBackend`] | Shared | Redis server `TIME` | `redis` |
//!
//! # Feature Flags
//!
//! - `memory` (default): in-process backend with idle-slot eviction
//! - `redis`: Redis backend over a `deadpool-redis` pool
//! - `full`: everything above

pub mod backend;
pub mod error;
pub mod gcra;
pub mod key;
pub mod limiter;
pub mod params;

// Re-export main types
pub use backend::Backend;
pub use error::{ConfigError, ConnectionError, FreqLimitError, Result, StorageError};
pub use gcra::gcra_step;
pub use key::Key;
pub use limiter::{FreqLimit, Permit};
pub use params::FreqLimitParams;

// Re-export backends
#[cfg(feature = "memory")]
pub use backend::{EvictionConfig, MemoryBackend};

#[cfg(feature = "redis")]
pub use backend::{RedisBackend, RedisConfig};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::backend::Backend;
    pub use crate::error::{FreqLimitError, Result};
    pub use crate::key::Key;
    pub use crate::limiter::FreqLimit;
    pub use crate::params::FreqLimitParams;

    #[cfg(feature = "memory")]
    pub use crate::backend::{EvictionConfig, MemoryBackend};

    #[cfg(feature = "redis")]
    pub use crate::backend::{RedisBackend, RedisConfig};
}
