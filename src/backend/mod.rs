//! Backend trait and implementations.
//!
//! A backend owns TAT storage and applies the GCRA step to it atomically.
//! Two implementations ship with the crate: in-process storage behind the
//! `memory` feature (default) and Redis behind the `redis` feature.

#[cfg(feature = "memory")]
mod memory;
#[cfg(feature = "redis")]
mod redis;

#[cfg(feature = "memory")]
pub use memory::{EvictionConfig, MemoryBackend};

#[cfg(feature = "redis")]
pub use redis::{RedisBackend, RedisConfig, GCRA_LUA};

use std::future::Future;
use std::sync::OnceLock;

use crate::error::Result;
use crate::key::Key;
use crate::params::FreqLimitParams;

/// Backend trait for rate limiting state.
///
/// All operations are async to cover both local and distributed backends.
/// Implementations must be thread-safe (`Send + Sync`).
///
/// # Contract
///
/// `reserve` atomically reads the key's TAT, advances it through the GCRA
/// step, writes it back, and returns the non-negative delay the caller must
/// wait from `now`. Concurrent reservations on one key must serialize so the
/// resulting schedule is no weaker than some serial order of those calls;
/// distinct keys are independent.
///
/// # Example
///
/// ```ignore
/// use freqlimit::{Backend, FreqLimitParams, Key, MemoryBackend};
/// use freqlimit::backend::monotonic_now;
///
/// async fn example(backend: &MemoryBackend, params: &FreqLimitParams) {
///     let delay = backend.reserve(&Key::from("user:1"), monotonic_now(), params).await?;
///     tokio::time::sleep(std::time::Duration::from_secs_f64(delay)).await;
/// }
/// ```
pub trait Backend: Send + Sync + 'static {
    /// Reserve a slot for `key` at moment `now`.
    ///
    /// Returns the delay in seconds until the reservation is conforming
    /// (`0.0` means run now).
    fn reserve(
        &self,
        key: &Key,
        now: f64,
        params: &FreqLimitParams,
    ) -> impl Future<Output = Result<f64>> + Send;

    /// Reset all state this backend owns.
    ///
    /// Backends without a meaningful reset keep the default no-op.
    fn clear(&self) -> impl Future<Output = Result<()>> + Send {
        async { Ok(()) }
    }
}

impl<B: Backend> Backend for std::sync::Arc<B> {
    async fn reserve(&self, key: &Key, now: f64, params: &FreqLimitParams) -> Result<f64> {
        (**self).reserve(key, now, params).await
    }

    async fn clear(&self) -> Result<()> {
        (**self).clear().await
    }
}

impl<B: Backend> Backend for Box<B> {
    async fn reserve(&self, key: &Key, now: f64, params: &FreqLimitParams) -> Result<f64> {
        (**self).reserve(key, now, params).await
    }

    async fn clear(&self) -> Result<()> {
        (**self).clear().await
    }
}

/// Seconds elapsed on a process-wide monotonic clock.
///
/// The anchor is fixed on first use, so values are comparable across the
/// limiter, the in-process sweeper, and callers driving a backend directly.
/// Uses tokio's clock, which honors `tokio::time::pause` in tests.
pub fn monotonic_now() -> f64 {
    static ANCHOR: OnceLock<tokio::time::Instant> = OnceLock::new();
    let anchor = *ANCHOR.get_or_init(tokio::time::Instant::now);
    let now = tokio::time::Instant::now();
    match now.checked_duration_since(anchor) {
        Some(elapsed) => elapsed.as_secs_f64(),
        // a paused test clock can sit behind the anchor; deltas stay exact
        None => -anchor.duration_since(now).as_secs_f64(),
    }
}
