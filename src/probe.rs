//! Probe records - one per tracked resource probe
//!
//! A ProbeRecord aggregates a monitored entity's identity, placement
//! metadata snapshotted at creation, and the per-product depletion states
//! maintained by the refresh scheduler.

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

use crate::core::types::{EntityId, Tick, Vec2};
use crate::model::ProductState;

/// A point-in-time observation of one product's quantity
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    pub count: f64,
}

/// Placement metadata captured when a probe is registered
///
/// Used only for display and grouping by external consumers; never mutated
/// by the monitor.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Placement {
    pub owner: String,
    pub location_region: String,
    pub position: Vec2,
}

/// One tracked probe and its per-product depletion states
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProbeRecord {
    /// Stable external identity of the probed entity
    pub probe_id: EntityId,
    /// Auxiliary entity enabling signal extraction; held by association
    /// only, never dereferenced here
    pub coupling_handle: EntityId,
    /// Tick at which the record was created
    pub created_at: Tick,
    /// Placement snapshot from registration time
    pub placement: Placement,
    /// Free-form grouping label, writable by external collaborators
    pub site_label: String,
    /// Depletion state per product key, maintained by the scheduler
    pub products: AHashMap<String, ProductState>,
    /// Soft-delete flag; a dead record is inert but keeps its registry slot
    pub alive: bool,
}

impl ProbeRecord {
    pub fn new(
        probe_id: EntityId,
        coupling_handle: EntityId,
        placement: Placement,
        created_at: Tick,
    ) -> Self {
        Self {
            probe_id,
            coupling_handle,
            created_at,
            placement,
            site_label: String::new(),
            products: AHashMap::new(),
            alive: true,
        }
    }
}
