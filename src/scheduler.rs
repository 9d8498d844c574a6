//! Refresh scheduler - amortized round-robin with priority preemption
//!
//! Each cycle the scheduler first drains a priority queue of records that
//! must be refreshed immediately (newly added probes, explicitly flagged
//! stale), then resumes a wrap-around cursor sweep over the registry. The
//! sweep budget is sized so one full pass completes every
//! `sweep_window_cycles` cycles regardless of registry size; no record is
//! ever refreshed twice within the same cycle.

use std::collections::VecDeque;

use ahash::AHashSet;
use serde::{Deserialize, Serialize};

use crate::core::config::MonitorConfig;
use crate::core::types::Tick;
use crate::model;
use crate::registry::ProbeRegistry;
use crate::signal::SignalAdapter;

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct RefreshScheduler {
    /// Registry positions requiring refresh on the very next cycle
    priority: VecDeque<usize>,
    /// Where the round-robin sweep last left off
    cursor: Option<usize>,
    /// Cycle at which the current sweep window began
    window_start: Tick,
}

impl RefreshScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a record for refresh on the next cycle, ahead of its
    /// round-robin turn
    pub fn flag_stale(&mut self, position: usize) {
        if !self.priority.contains(&position) {
            self.priority.push_back(position);
        }
    }

    /// Run one refresh cycle
    ///
    /// Priority items always drain first and are unbounded per cycle
    /// (freshness for new probes wins over a strict budget); the cursor
    /// sweep then refreshes up to the amortized budget of live records,
    /// stopping early if it would wrap back to where it started. Returns
    /// the number of records refreshed.
    pub fn tick(
        &mut self,
        registry: &mut ProbeRegistry,
        adapter: &dyn SignalAdapter,
        config: &MonitorConfig,
        now: Tick,
    ) -> usize {
        let mut refreshed: AHashSet<usize> = AHashSet::new();

        while let Some(position) = self.priority.pop_front() {
            if refreshed.contains(&position) {
                continue;
            }
            if refresh_record(registry, adapter, config, position, now) {
                refreshed.insert(position);
            }
        }

        let len = registry.len();
        if len == 0 {
            // Idle: nothing to sweep, nothing to budget
            return refreshed.len();
        }

        let budget = self.next_budget(len, config.sweep_window_cycles, now);
        let start = self.cursor.unwrap_or(0) % len;
        let mut position = start;
        let mut spent = 0usize;

        for _ in 0..len {
            if spent >= budget {
                break;
            }
            let is_live = registry.get(position).map(|r| r.alive).unwrap_or(false);
            if is_live && !refreshed.contains(&position) {
                if refresh_record(registry, adapter, config, position, now) {
                    refreshed.insert(position);
                    spent += 1;
                }
            }
            // Dead and already-refreshed records advance the cursor for free
            position = (position + 1) % len;
        }
        self.cursor = Some(position);

        refreshed.len()
    }

    /// Amortized budget for this cycle: ceil(len / remaining cycles in the
    /// current sweep window), with the window restarted once exhausted and
    /// the divisor clamped to at least 1.
    fn next_budget(&mut self, len: usize, window: u64, now: Tick) -> usize {
        let window = window.max(1);
        let mut elapsed = now.saturating_sub(self.window_start);
        if elapsed >= window {
            tracing::debug!(now, "sweep window restarted");
            self.window_start = now;
            elapsed = 0;
        }
        let remaining = (window - elapsed).max(1) as usize;
        (len + remaining - 1) / remaining
    }
}

/// Refresh a single record through the depletion model
///
/// Queries the adapter, merges the record's known product keys with the
/// reported ones (so vanished products are still visited with an absent
/// reading), and stores each advanced state back. An adapter-reported
/// invalid probe is soft-deleted with no product updates. Returns true if
/// the record was live and a refresh was attempted.
pub fn refresh_record(
    registry: &mut ProbeRegistry,
    adapter: &dyn SignalAdapter,
    config: &MonitorConfig,
    position: usize,
    now: Tick,
) -> bool {
    let Some(record) = registry.get_mut(position) else {
        return false;
    };
    if !record.alive {
        return false;
    }

    let report = adapter.get_readings(record.probe_id);
    if !report.valid {
        tracing::debug!(probe_id = ?record.probe_id, position, "probe invalid, soft-deleting");
        record.alive = false;
        return true;
    }

    let mut keys: Vec<String> = record.products.keys().cloned().collect();
    for key in report.readings.keys() {
        if !record.products.contains_key(key) {
            keys.push(key.clone());
        }
    }

    for key in keys {
        let next = model::advance(
            record.products.get(&key),
            report.readings.get(&key),
            now,
            config,
        );
        if let Some(state) = next {
            record.products.insert(key, state);
        }
    }
    true
}
