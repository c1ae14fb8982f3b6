//! Limit parameters for GCRA rate limiting.
//!
//! `FreqLimitParams` defines the limit contract: how many events are allowed
//! per period, and how many may be squeezed in almost at once (burst).
//!
//! # Examples
//!
//! ```ignore
//! use freqlimit::FreqLimitParams;
//!
//! // 10 events per second, strict spacing
//! let params = FreqLimitParams::per_second(10)?;
//!
//! // 100 events per minute, up to 5 back to back
//! let params = FreqLimitParams::new(100, 60.0)?.with_burst(5)?;
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Result};

/// GCRA limit parameters.
///
/// Immutable after construction. The derived quantities are recomputed on
/// access, never stored:
///
/// - `interval` (T) = `period / limit` - mean spacing between conformant
///   events, in seconds
/// - `tau` = `(burst - 1) * interval` - how far ahead of schedule an early
///   arrival is forgiven
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FreqLimitParams {
    /// Events allowed per period.
    limit: u32,

    /// Window length in seconds.
    period: f64,

    /// Events that may arrive almost at once.
    burst: u32,
}

impl FreqLimitParams {
    /// Create parameters allowing `limit` events per `period` seconds,
    /// with a burst of 1 (strict spacing).
    ///
    /// # Errors
    ///
    /// `ConfigError::InvalidParams` if `limit` is zero or `period` is not
    /// strictly positive and finite.
    pub fn new(limit: u32, period: f64) -> Result<Self> {
        if limit == 0 {
            return Err(ConfigError::InvalidParams("limit must be greater than 0".into()).into());
        }
        if !period.is_finite() || period <= 0.0 {
            return Err(ConfigError::InvalidParams("period must be greater than 0".into()).into());
        }
        Ok(Self {
            limit,
            period,
            burst: 1,
        })
    }

    /// Create parameters allowing `limit` events per second.
    pub fn per_second(limit: u32) -> Result<Self> {
        Self::new(limit, 1.0)
    }

    /// Create parameters allowing `limit` events per minute.
    pub fn per_minute(limit: u32) -> Result<Self> {
        Self::new(limit, 60.0)
    }

    /// Set the burst size: how many events may arrive almost at once
    /// before pacing kicks in.
    ///
    /// # Errors
    ///
    /// `ConfigError::InvalidParams` if `burst` is zero.
    pub fn with_burst(mut self, burst: u32) -> Result<Self> {
        if burst == 0 {
            return Err(ConfigError::InvalidParams("burst must be greater than 0".into()).into());
        }
        self.burst = burst;
        Ok(self)
    }

    /// Events allowed per period.
    pub fn limit(&self) -> u32 {
        self.limit
    }

    /// Window length in seconds.
    pub fn period(&self) -> f64 {
        self.period
    }

    /// Burst size.
    pub fn burst(&self) -> u32 {
        self.burst
    }

    /// Mean spacing between conformant events in seconds: `period / limit`.
    pub fn interval(&self) -> f64 {
        self.period / f64::from(self.limit)
    }

    /// Burst tolerance in seconds: `(burst - 1) * interval`.
    pub fn tau(&self) -> f64 {
        self.interval() * f64::from(self.burst - 1)
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn test_interval_and_tau() {
        let params = FreqLimitParams::new(20, 60.0).unwrap().with_burst(3).unwrap();
        // interval = 60 / 20 = 3
        assert_eq!(params.interval(), 3.0);
        // tau = (burst - 1) * interval = 2 * 3 = 6
        assert_eq!(params.tau(), 6.0);
    }

    #[test]
    fn test_per_second() {
        let params = FreqLimitParams::per_second(10).unwrap();
        assert_eq!(params.limit(), 10);
        assert_eq!(params.period(), 1.0);
        assert_eq!(params.burst(), 1);
        assert_eq!(params.interval(), 0.1);
        assert_eq!(params.tau(), 0.0);
    }

    #[test]
    fn test_per_minute() {
        let params = FreqLimitParams::per_minute(60).unwrap();
        assert_eq!(params.interval(), 1.0);
    }

    #[test]
    fn test_exact_division() {
        // interval == period / limit exactly under IEEE-754
        let params = FreqLimitParams::new(2, 1.0).unwrap();
        assert_eq!(params.interval(), 0.5);

        let params = FreqLimitParams::new(4, 1.0).unwrap().with_burst(3).unwrap();
        assert_eq!(params.interval(), 0.25);
        assert_eq!(params.tau(), 0.5);
    }

    #[test]
    fn test_invalid_inputs_rejected() {
        assert!(FreqLimitParams::new(0, 1.0).is_err());
        assert!(FreqLimitParams::new(1, 0.0).is_err());
        assert!(FreqLimitParams::new(1, -1.0).is_err());
        assert!(FreqLimitParams::new(1, f64::NAN).is_err());
        assert!(FreqLimitParams::new(1, f64::INFINITY).is_err());
        assert!(FreqLimitParams::new(1, 1.0).unwrap().with_burst(0).is_err());
    }

    proptest! {
        #[test]
        fn valid_params_have_positive_interval(
            limit in 1u32..=100,
            period in 0.001f64..=1000.0,
            burst in 1u32..=50,
        ) {
            let params = FreqLimitParams::new(limit, period)
                .unwrap()
                .with_burst(burst)
                .unwrap();
            prop_assert_eq!(params.limit(), limit);
            prop_assert_eq!(params.period(), period);
            prop_assert_eq!(params.burst(), burst);
            prop_assert!(params.interval() > 0.0);
            prop_assert!(params.tau() >= 0.0);
        }
    }
}
