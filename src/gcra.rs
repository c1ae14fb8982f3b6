//! GCRA (Generic Cell Rate Algorithm) state transition.
//!
//! GCRA in virtual scheduling form tracks a single Theoretical Arrival Time
//! (TAT) per key instead of counters. The TAT is the earliest moment the next
//! event is on-schedule; `tau` forgives arrivals up to `(burst - 1)` intervals
//! early.
//!
//! ```text
//! interval = 0.5s, burst = 1 (tau = 0)
//!
//! t=0.0  first event:  TAT absent -> TAT = 0.5, delay 0
//! t=0.0  second event: allowed at TAT - tau = 0.5 -> delay 0.5, TAT = 1.0
//! t=1.5  third event:  arrived past TAT -> TAT = 2.0, delay 0
//! ```
//!
//! The transition is pure: no clock, no I/O, no suspension. Both backends
//! must reproduce it bit for bit (the Redis backend carries the same
//! arithmetic in Lua).

use crate::params::FreqLimitParams;

/// Single GCRA step.
///
/// `now` and `tat` share one timebase; `tat` is `None` for a key never seen.
/// Returns `(new_tat, delay)`: the updated TAT and how long the caller must
/// wait from `now` to be conforming (`0.0` means run now).
///
/// Monotone in `now` for fixed `tat`, and in `tat` for fixed `now`.
pub fn gcra_step(now: f64, tat: Option<f64>, params: &FreqLimitParams) -> (f64, f64) {
    let tat = tat.unwrap_or(now);

    let interval = params.interval();
    let tau = params.tau();

    // Earliest moment the event would be conforming
    let allowed_time = tat - tau;

    let mut delay = 0.0;
    let mut effective_now = now;

    if effective_now < allowed_time {
        delay = allowed_time - effective_now;
        effective_now = allowed_time;
    }

    // Virtual scheduling:
    // - arrived at or past schedule -> anchor to the arrival
    // - early but within burst      -> extend the schedule
    let new_tat = if effective_now >= tat {
        effective_now + interval
    } else {
        tat + interval
    };

    (new_tat, delay)
}
