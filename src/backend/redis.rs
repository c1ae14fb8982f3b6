//! Redis backend for limits shared between processes.
//!
//! The GCRA step runs inside a Lua script on the Redis server, using server
//! time (`TIME`) so every client shares a single clock. The client side only
//! passes parameters and parses the resulting delay. Uses connection pooling
//! via `deadpool-redis`.

use std::time::Duration;

use deadpool_redis::{
    redis::{cmd, RedisError, Script},
    Config, Connection, Pool, PoolConfig, Runtime,
};
use tracing::debug;

use crate::backend::Backend;
use crate::error::{ConfigError, ConnectionError, FreqLimitError, Result, StorageError};
use crate::key::Key;
use crate::params::FreqLimitParams;

/// GCRA step as an atomic Redis script.
///
/// - `KEYS[1]` - key holding the TAT
/// - `ARGV[1]` - interval (T), seconds
/// - `ARGV[2]` - tau, seconds
/// - `ARGV[3]` - extra TTL buffer, seconds
///
/// Returns the delay in seconds as a decimal string. The arithmetic must
/// stay in lockstep with [`gcra_step`](crate::gcra::gcra_step).
pub const GCRA_LUA: &str = r#"
redis.replicate_commands()

local key = KEYS[1]
local interval = tonumber(ARGV[1])
local tau = tonumber(ARGV[2])
local extra_ttl = tonumber(ARGV[3])

-- Server clock: seconds + microseconds as one real number
local now_time = redis.call("TIME")
local now = tonumber(now_time[1]) + tonumber(now_time[2]) / 1000000.0

local tat_str = redis.call("GET", key)
local tat
if not tat_str then
  tat = now
else
  tat = tonumber(tat_str)
end

-- Earliest conforming moment
local allowed_time = tat - tau
local delay = 0.0
local effective_now = now

if effective_now < allowed_time then
  delay = allowed_time - effective_now
  effective_now = allowed_time
end

-- Virtual scheduling
if effective_now >= tat then
  tat = effective_now + interval
else
  tat = tat + interval
end

-- Keep the key while there is debt, plus the buffer; tau is an
-- admissibility window for future arrivals, not debt, and never
-- extends the TTL
local ttl = (tat - now) + extra_ttl
if ttl < 1.0 then
  ttl = 1.0
end

redis.call("SET", key, tat, "EX", math.ceil(ttl))

return tostring(delay)
"#;

/// Redis backend configuration.
#[derive(Debug, Clone)]
pub struct RedisConfig {
    /// Redis connection URL (e.g. "redis://localhost:6379")
    pub url: String,
    /// Connection pool size
    pub pool_size: usize,
    /// Key prefix for TAT keys
    pub prefix: String,
    /// Extra TTL buffer in seconds, applied after the debt horizon
    pub extra_ttl: f64,
    /// Bound on the connectivity probe run at construction
    pub connection_timeout: Duration,
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            url: "redis://localhost:6379".to_string(),
            pool_size: 10,
            prefix: "freqlimit:gcra:".to_string(),
            extra_ttl: 0.0,
            connection_timeout: Duration::from_secs(5),
        }
    }
}

impl RedisConfig {
    /// Create a new Redis configuration.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    /// Set the key prefix.
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Set the extra TTL buffer.
    pub fn with_extra_ttl(mut self, extra_ttl: f64) -> Self {
        self.extra_ttl = extra_ttl;
        self
    }

    /// Set the pool size.
    pub fn with_pool_size(mut self, size: usize) -> Self {
        self.pool_size = size;
        self
    }

    /// Set the connection timeout.
    pub fn with_connection_timeout(mut self, timeout: Duration) -> Self {
        self.connection_timeout = timeout;
        self
    }
}

/// Redis backend: the GCRA step runs server-side, on server time.
///
/// # Example
///
/// ```ignore
/// use freqlimit::{RedisBackend, RedisConfig};
///
/// let config = RedisConfig::new("redis://localhost:6379")
///     .with_prefix("myapp:limits:")
///     .with_extra_ttl(1.0);
///
/// let backend = RedisBackend::new(config).await?;
/// ```
pub struct RedisBackend {
    pool: Pool,
    prefix: String,
    extra_ttl: f64,
    /// Caches the script SHA and falls back from EVALSHA to EVAL as needed.
    script: Script,
}

impl std::fmt::Debug for RedisBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisBackend")
            .field("prefix", &self.prefix)
            .field("extra_ttl", &self.extra_ttl)
            .finish()
    }
}

impl RedisBackend {
    /// Create a Redis backend from configuration, verifying connectivity.
    ///
    /// The probe is bounded by `config.connection_timeout`; an unreachable
    /// server yields `ConnectionError::Timeout` instead of hanging.
    pub async fn new(config: RedisConfig) -> Result<Self> {
        let mut cfg = Config::from_url(&config.url);
        cfg.pool = Some(PoolConfig::new(config.pool_size));
        let pool = cfg
            .create_pool(Some(Runtime::Tokio1))
            .map_err(|e| ConnectionError::ConnectionFailed(e.to_string()))?;

        let probe = async {
            let mut conn = pool
                .get()
                .await
                .map_err(|e| ConnectionError::ConnectionFailed(e.to_string()))?;
            let _: () = cmd("PING")
                .query_async(&mut *conn)
                .await
                .map_err(|e| ConnectionError::ConnectionFailed(e.to_string()))?;
            Ok::<(), FreqLimitError>(())
        };
        tokio::time::timeout(config.connection_timeout, probe)
            .await
            .map_err(|_| ConnectionError::Timeout(config.connection_timeout))??;

        Self::with_pool(pool, config)
    }

    /// Create a Redis backend from a URL with default configuration.
    pub async fn from_url(url: impl Into<String>) -> Result<Self> {
        Self::new(RedisConfig::new(url)).await
    }

    /// Create a Redis backend over a caller-supplied pool.
    ///
    /// `config.url`, `config.pool_size`, and `config.connection_timeout`
    /// are ignored; the pool is taken as-is and no probe runs.
    pub fn with_pool(pool: Pool, config: RedisConfig) -> Result<Self> {
        if !config.extra_ttl.is_finite() || config.extra_ttl < 0.0 {
            return Err(
                ConfigError::InvalidBackend("extra_ttl must be non-negative".into()).into(),
            );
        }
        Ok(Self {
            pool,
            prefix: config.prefix,
            extra_ttl: config.extra_ttl,
            script: Script::new(GCRA_LUA),
        })
    }

    /// Get the full key with prefix.
    fn full_key(&self, key: &Key) -> String {
        format!("{}{}", self.prefix, key)
    }

    /// Get a connection from the pool.
    async fn get_conn(&self) -> Result<Connection> {
        self.pool
            .get()
            .await
            .map_err(|_| StorageError::PoolExhausted.into())
    }
}

fn map_script_error(err: RedisError) -> FreqLimitError {
    if err.is_io_error() || err.is_timeout() || err.is_connection_dropped() {
        StorageError::operation_failed(err.to_string(), true).into()
    } else {
        debug!(error = %err, "GCRA script invocation failed");
        StorageError::Script(err.to_string()).into()
    }
}

impl Backend for RedisBackend {
    // `_now` stays for backend symmetry; the script reads TIME on the
    // server so all clients share one clock.
    async fn reserve(&self, key: &Key, _now: f64, params: &FreqLimitParams) -> Result<f64> {
        let mut conn = self.get_conn().await?;
        let full_key = self.full_key(key);

        let delay: String = self
            .script
            .key(&full_key)
            .arg(params.interval())
            .arg(params.tau())
            .arg(self.extra_ttl)
            .invoke_async(&mut *conn)
            .await
            .map_err(map_script_error)?;

        delay
            .parse::<f64>()
            .map_err(|e| StorageError::Decode(format!("delay {delay:?}: {e}")).into())
    }

    async fn clear(&self) -> Result<()> {
        let mut conn = self.get_conn().await?;
        let pattern = format!("{}*", self.prefix);
        let mut cursor: u64 = 0;

        loop {
            let (next, keys): (u64, Vec<String>) = cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(&pattern)
                .arg("COUNT")
                .arg(100)
                .query_async(&mut *conn)
                .await
                .map_err(|e| StorageError::operation_failed(e.to_string(), true))?;

            for key in keys {
                let _: () = cmd("DEL")
                    .arg(&key)
                    .query_async(&mut *conn)
                    .await
                    .map_err(|e| StorageError::operation_failed(e.to_string(), true))?;
            }

            if next == 0 {
                break;
            }
            cursor = next;
        }

        Ok(())
    }
}
