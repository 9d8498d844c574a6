//! Probe registry - authoritative append-only collection of probe records
//!
//! Records are never physically removed while the process runs; removal is a
//! soft-delete flag. Positions are therefore stable, which lets the derived
//! probe-id index and the scheduler's cursor hold plain positions. The index
//! is pure cache and is rebuilt from the records on every process restart.

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

use crate::core::types::{EntityId, Tick};
use crate::probe::{Placement, ProbeRecord};
use crate::signal::SignalAdapter;

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ProbeRegistry {
    records: Vec<ProbeRecord>,
    /// Derived probe_id -> position cache; never persisted
    #[serde(skip)]
    index: AHashMap<EntityId, usize>,
}

impl ProbeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new probe, returning its registry position
    ///
    /// Append-only: positions are never reassigned, so an in-progress sweep
    /// is unaffected by additions.
    pub fn add(
        &mut self,
        probe_id: EntityId,
        coupling_handle: EntityId,
        placement: Placement,
        now: Tick,
    ) -> usize {
        let position = self.records.len();
        let record = ProbeRecord::new(probe_id, coupling_handle, placement, now);
        self.records.push(record);
        self.index.insert(probe_id, position);
        tracing::debug!(?probe_id, position, "probe registered");
        position
    }

    /// Soft-delete the record at `position`; the slot stays occupied
    pub fn remove(&mut self, position: usize) {
        if let Some(record) = self.records.get_mut(position) {
            record.alive = false;
            tracing::debug!(probe_id = ?record.probe_id, position, "probe removed");
        }
    }

    /// O(1) lookup via the derived index
    ///
    /// Returns None for probes never registered or skipped during the last
    /// index rebuild; callers treat that as "not currently tracked".
    pub fn lookup(&self, probe_id: EntityId) -> Option<&ProbeRecord> {
        self.index
            .get(&probe_id)
            .and_then(|&position| self.records.get(position))
    }

    pub fn lookup_mut(&mut self, probe_id: EntityId) -> Option<&mut ProbeRecord> {
        let position = *self.index.get(&probe_id)?;
        self.records.get_mut(position)
    }

    pub fn position_of(&self, probe_id: EntityId) -> Option<usize> {
        self.index.get(&probe_id).copied()
    }

    /// Recompute the probe-id index by a full scan of the records
    ///
    /// Called once at process (re)start. Records whose probe fails the
    /// validity check at scan time are skipped; their `alive` flag is not
    /// authoritative until the next refresh touches them, so lookups against
    /// a skipped record simply miss.
    pub fn rebuild_index(&mut self, adapter: &dyn SignalAdapter) {
        self.index.clear();
        for (position, record) in self.records.iter().enumerate() {
            if !record.alive {
                continue;
            }
            if !adapter.get_readings(record.probe_id).valid {
                tracing::debug!(probe_id = ?record.probe_id, position, "skipping invalid probe during index rebuild");
                continue;
            }
            self.index.insert(record.probe_id, position);
        }
        tracing::debug!(indexed = self.index.len(), total = self.records.len(), "index rebuilt");
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, position: usize) -> Option<&ProbeRecord> {
        self.records.get(position)
    }

    pub fn get_mut(&mut self, position: usize) -> Option<&mut ProbeRecord> {
        self.records.get_mut(position)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ProbeRecord> {
        self.records.iter()
    }

    #[cfg(test)]
    pub(crate) fn index_snapshot(&self) -> AHashMap<EntityId, usize> {
        self.index.clone()
    }
}
