//! In-process backend with idle-slot eviction.
//!
//! Keeps one slot per key in a `DashMap`; a per-slot async mutex serializes
//! reservations on the same key while distinct keys proceed in parallel.
//! Idle slots are reclaimed opportunistically on `reserve` and, optionally,
//! by a background sweeper task.

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use parking_lot::Mutex;
use tokio::sync::Mutex as AsyncMutex;
use tokio::task::JoinHandle;
use tracing::{debug, trace};

use crate::backend::{monotonic_now, Backend};
use crate::error::{ConfigError, Result};
use crate::gcra::gcra_step;
use crate::key::Key;
use crate::params::FreqLimitParams;

/// Idle-slot eviction configuration.
///
/// Both knobs are independent: `idle_ttl` alone evicts lazily from inside
/// `reserve`, adding a sweeper also reclaims slots while the backend is
/// otherwise quiet.
///
/// # Example
///
/// ```ignore
/// use freqlimit::{EvictionConfig, MemoryBackend};
/// use std::time::Duration;
///
/// let backend = MemoryBackend::with_eviction(
///     EvictionConfig::after_idle(Duration::from_secs(300))
///         .with_sweeper(Duration::from_secs(60)),
/// )?;
/// ```
#[derive(Debug, Clone, Default)]
pub struct EvictionConfig {
    /// Evict a slot once it has gone unused this long.
    pub idle_ttl: Option<Duration>,
    /// Run a background eviction pass at this interval.
    pub sweeper_interval: Option<Duration>,
}

impl EvictionConfig {
    /// Evict slots unused for `ttl`.
    pub fn after_idle(ttl: Duration) -> Self {
        Self {
            idle_ttl: Some(ttl),
            sweeper_interval: None,
        }
    }

    /// Also sweep in the background at `interval`.
    pub fn with_sweeper(mut self, interval: Duration) -> Self {
        self.sweeper_interval = Some(interval);
        self
    }
}

/// Per-key slot state, guarded by the slot's async mutex.
#[derive(Debug)]
struct SlotState {
    tat: Option<f64>,
    last_seen: f64,
    /// Set under the map shard lock when the slot is removed. A reserver
    /// that locked a stale handle sees it and retries on a fresh slot.
    evicted: bool,
}

struct Shared {
    slots: DashMap<Key, Arc<AsyncMutex<SlotState>>>,
    idle_ttl: Option<f64>,
}

impl Shared {
    /// Remove slots idle past the TTL. A slot whose mutex is held is never
    /// touched: a held lock means a reserver currently owns the TAT.
    fn evict_expired(&self, now: f64) {
        let Some(ttl) = self.idle_ttl else { return };

        let mut evicted = 0usize;
        self.slots.retain(|_, slot| {
            let Ok(mut state) = slot.try_lock() else {
                return true;
            };
            if now - state.last_seen > ttl {
                state.evicted = true;
                evicted += 1;
                false
            } else {
                true
            }
        });

        if evicted > 0 {
            trace!(evicted, "evicted idle rate-limit slots");
        }
    }
}

/// In-process backend: per-key TAT map with optional idle eviction.
///
/// Suits a single process; state does not survive restarts. For limits
/// shared between processes use [`RedisBackend`](crate::RedisBackend).
///
/// # Example
///
/// ```ignore
/// use freqlimit::{FreqLimit, FreqLimitParams, MemoryBackend};
///
/// let params = FreqLimitParams::per_second(10)?;
/// let limiter = FreqLimit::new(params, MemoryBackend::new());
/// ```
pub struct MemoryBackend {
    shared: Arc<Shared>,
    sweeper_interval: Option<Duration>,
    sweeper: Mutex<Option<JoinHandle<()>>>,
}

impl std::fmt::Debug for MemoryBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryBackend")
            .field("slots", &self.shared.slots.len())
            .field("idle_ttl", &self.shared.idle_ttl)
            .field("sweeper_interval", &self.sweeper_interval)
            .finish()
    }
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryBackend {
    /// Create a backend that never evicts.
    pub fn new() -> Self {
        Self {
            shared: Arc::new(Shared {
                slots: DashMap::new(),
                idle_ttl: None,
            }),
            sweeper_interval: None,
            sweeper: Mutex::new(None),
        }
    }

    /// Create a backend with idle-slot eviction.
    ///
    /// # Errors
    ///
    /// `ConfigError::InvalidBackend` if either duration is zero.
    pub fn with_eviction(config: EvictionConfig) -> Result<Self> {
        if config.idle_ttl.is_some_and(|ttl| ttl.is_zero()) {
            return Err(ConfigError::InvalidBackend("idle_ttl must be positive".into()).into());
        }
        if config.sweeper_interval.is_some_and(|interval| interval.is_zero()) {
            return Err(
                ConfigError::InvalidBackend("sweeper_interval must be positive".into()).into(),
            );
        }
        Ok(Self {
            shared: Arc::new(Shared {
                slots: DashMap::new(),
                idle_ttl: config.idle_ttl.map(|ttl| ttl.as_secs_f64()),
            }),
            sweeper_interval: config.sweeper_interval,
            sweeper: Mutex::new(None),
        })
    }

    /// Number of live slots.
    pub fn len(&self) -> usize {
        self.shared.slots.len()
    }

    /// Check if no slots are live.
    pub fn is_empty(&self) -> bool {
        self.shared.slots.is_empty()
    }

    /// Check whether `key` currently has a slot.
    pub fn contains(&self, key: &Key) -> bool {
        self.shared.slots.contains_key(key)
    }

    /// Spawn the sweeper if configured and not already running.
    fn ensure_sweeper(&self) {
        let Some(interval) = self.sweeper_interval else {
            return;
        };
        let mut guard = self.sweeper.lock();
        if guard.as_ref().is_some_and(|task| !task.is_finished()) {
            return;
        }
        debug!(interval_secs = interval.as_secs_f64(), "starting idle sweeper");
        let shared = Arc::clone(&self.shared);
        *guard = Some(tokio::spawn(async move {
            loop {
                tokio::time::sleep(interval).await;
                shared.evict_expired(monotonic_now());
            }
        }));
    }
}

impl Backend for MemoryBackend {
    async fn reserve(&self, key: &Key, now: f64, params: &FreqLimitParams) -> Result<f64> {
        if self.shared.idle_ttl.is_some() {
            self.shared.evict_expired(now);
        }
        self.ensure_sweeper();

        loop {
            let slot = self
                .shared
                .slots
                .entry(key.clone())
                .or_insert_with(|| {
                    Arc::new(AsyncMutex::new(SlotState {
                        tat: None,
                        last_seen: now,
                        evicted: false,
                    }))
                })
                .clone();

            let mut state = slot.lock().await;
            if state.evicted {
                continue;
            }

            let (new_tat, delay) = gcra_step(now, state.tat, params);
            state.tat = Some(new_tat);
            state.last_seen = now;
            return Ok(delay);
        }
    }

    async fn clear(&self) -> Result<()> {
        self.shared.slots.clear();
        let task = self.sweeper.lock().take();
        if let Some(task) = task {
            task.abort();
            // cancellation is the sweeper's normal exit
            let _ = task.await;
            debug!("stopped idle sweeper");
        }
        Ok(())
    }
}

impl Drop for MemoryBackend {
    fn drop(&mut self) {
        if let Some(task) = self.sweeper.lock().take() {
            task.abort();
        }
    }
}
