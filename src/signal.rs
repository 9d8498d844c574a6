//! Signal adapter boundary - supplies raw per-product readings
//!
//! The host simulation owns the actual extraction wiring; the monitor only
//! sees a synchronous query returning the probe's validity and its current
//! readings.

use ahash::AHashMap;

use crate::core::types::EntityId;
use crate::probe::Reading;

/// Result of querying a probe's signal source
#[derive(Debug, Clone, Default)]
pub struct SignalReport {
    /// False once the underlying probe has become invalid; readings must
    /// then be ignored and the record soft-deleted
    pub valid: bool,
    pub readings: AHashMap<String, Reading>,
}

impl SignalReport {
    pub fn invalid() -> Self {
        Self {
            valid: false,
            readings: AHashMap::new(),
        }
    }

    pub fn valid(readings: AHashMap<String, Reading>) -> Self {
        Self {
            valid: true,
            readings,
        }
    }
}

/// Source of raw readings for probes
///
/// Queries are synchronous and must return within the cycle budget; the
/// scheduler never retries or defers a query.
pub trait SignalAdapter {
    fn get_readings(&self, probe_id: EntityId) -> SignalReport;
}
