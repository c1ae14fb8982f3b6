//! Limiter façade: fixed parameters bound to one backend.

use std::time::Duration;

use crate::backend::{monotonic_now, Backend};
use crate::error::Result;
use crate::key::Key;
use crate::params::FreqLimitParams;

/// Sentinel key used when the caller does not name one.
const GLOBAL_KEY: &str = "_global";

/// Async rate limiter built on the Generic Cell Rate Algorithm.
///
/// Holds one set of [`FreqLimitParams`] and one [`Backend`]; neither is
/// replaced during the limiter's lifetime. There is no denied outcome:
/// acquisition waits exactly long enough for the operation to conform.
///
/// # Example
///
/// ```ignore
/// use freqlimit::{FreqLimit, FreqLimitParams, MemoryBackend};
///
/// let params = FreqLimitParams::per_second(1)?;
/// let limiter = FreqLimit::new(params, MemoryBackend::new());
///
/// let _slot = limiter.acquire("chat:42").await?;
/// send_message().await?;
/// ```
#[derive(Debug)]
pub struct FreqLimit<B> {
    params: FreqLimitParams,
    backend: B,
}

/// Admission token for one critical region.
///
/// Holding the permit means the rate limiter has admitted the caller; the
/// region ends when it drops. GCRA admissions are not released, so dropping
/// early (or being cancelled after acquisition) leaves the schedule slot
/// consumed.
#[must_use = "the permit delimits the rate-limited region"]
#[derive(Debug)]
pub struct Permit<'a, B> {
    _limiter: &'a FreqLimit<B>,
}

impl<B: Backend> FreqLimit<B> {
    /// Create a limiter from parameters and a backend.
    pub fn new(params: FreqLimitParams, backend: B) -> Self {
        Self { params, backend }
    }

    /// The limit parameters.
    pub fn params(&self) -> &FreqLimitParams {
        &self.params
    }

    /// The backend.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Acquire an admission for `key`, waiting as long as the schedule
    /// requires.
    ///
    /// Cancelling the returned future during the wait abandons the turn but
    /// not the reservation: the slot stays consumed, so cancellation cannot
    /// be used to sidestep the limit.
    pub async fn acquire(&self, key: impl Into<Key>) -> Result<Permit<'_, B>> {
        self.acquire_key(key.into()).await
    }

    /// Acquire an admission on the limiter-wide `"_global"` slot.
    pub async fn acquire_global(&self) -> Result<Permit<'_, B>> {
        self.acquire_key(Key::from(GLOBAL_KEY)).await
    }

    async fn acquire_key(&self, key: Key) -> Result<Permit<'_, B>> {
        let now = monotonic_now();
        let delay = self.backend.reserve(&key, now, &self.params).await?;
        if delay > 0.0 {
            tokio::time::sleep(Duration::from_secs_f64(delay)).await;
        }
        Ok(Permit { _limiter: self })
    }

    /// Reset backend state, for backends that support it.
    pub async fn clear(&self) -> Result<()> {
        self.backend.clear().await
    }
}
