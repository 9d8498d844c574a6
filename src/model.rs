//! Depletion model for a single tracked product
//!
//! ProductState converts raw point-in-time counts into an exponentially
//! smoothed depletion rate and a time-to-exhaustion forecast. Smoothing damps
//! single noisy samples; a product whose signal vanishes is modeled as having
//! drained to zero rather than frozen at its last count.

use serde::{Deserialize, Serialize};

use crate::core::config::MonitorConfig;
use crate::core::types::Tick;
use crate::probe::Reading;

/// Smoothed depletion state for one (probe, product) pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductState {
    /// Last observed quantity
    pub amount: f64,
    /// Quantity at first observation; never changes afterwards
    pub initial_amount: f64,
    /// Tick at which `amount` was last set
    pub last_update: Tick,
    /// Smoothed rate of change per minute; positive means depleting
    pub delta_per_minute: f64,
    /// Forecast until exhaustion; None while the rate is non-positive
    pub minutes_to_deplete: Option<f64>,
}

impl ProductState {
    /// State for a product observed for the first time
    ///
    /// No history exists to derive a rate from, so the rate starts at zero
    /// and no forecast is made.
    pub fn first_observation(count: f64, now: Tick) -> Self {
        Self {
            amount: count,
            initial_amount: count,
            last_update: now,
            delta_per_minute: 0.0,
            minutes_to_deplete: None,
        }
    }

    /// Fold one new reading into this state
    ///
    /// An absent reading means the product signal vanished and is treated as
    /// a count of zero. If no time has passed since the last update (or the
    /// clock regressed) the state is returned unchanged, so refreshing twice
    /// within one cycle is harmless.
    pub fn advance(&self, reading: Option<&Reading>, now: Tick, config: &MonitorConfig) -> Self {
        if now <= self.last_update {
            return self.clone();
        }
        let elapsed = (now - self.last_update) as f64;
        let count = reading.map(|r| r.count).unwrap_or(0.0);

        let instant_rate = (self.amount - count) * (config.ticks_per_minute / elapsed);
        let new_rate =
            self.delta_per_minute + config.smoothing_factor * (instant_rate - self.delta_per_minute);

        let minutes_to_deplete = if new_rate > 0.0 {
            Some(count / new_rate)
        } else {
            None
        };

        Self {
            amount: count,
            initial_amount: self.initial_amount,
            last_update: now,
            delta_per_minute: new_rate,
            minutes_to_deplete,
        }
    }
}

/// Transition function over optional previous state and optional reading
///
/// Returns None only when both inputs are absent; the scheduler's merged key
/// set never produces that case.
pub fn advance(
    previous: Option<&ProductState>,
    reading: Option<&Reading>,
    now: Tick,
    config: &MonitorConfig,
) -> Option<ProductState> {
    match (previous, reading) {
        (None, Some(r)) => Some(ProductState::first_observation(r.count, now)),
        (Some(prev), r) => Some(prev.advance(r, now, config)),
        (None, None) => None,
    }
}
