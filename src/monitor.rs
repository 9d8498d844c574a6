//! Monitor facade - owns the registry, the scheduler, and the config
//!
//! This is the surface the host simulation talks to: probe registration and
//! decommissioning, the per-cycle tick, process lifecycle (restart, snapshot
//! save/load), and read access for display collaborators.

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

use crate::core::config::MonitorConfig;
use crate::core::types::{EntityId, Tick};
use crate::probe::{Placement, ProbeRecord};
use crate::registry::ProbeRegistry;
use crate::scheduler::RefreshScheduler;
use crate::signal::SignalAdapter;
use crate::{Result, SentinelError};

pub struct Monitor {
    config: MonitorConfig,
    registry: ProbeRegistry,
    scheduler: RefreshScheduler,
}

/// Persisted state: registry contents plus schedule state. The derived
/// probe-id index is never persisted; it is rebuilt on restart.
#[derive(Deserialize)]
struct MonitorSnapshot {
    registry: ProbeRegistry,
    scheduler: RefreshScheduler,
}

/// Borrowed counterpart of MonitorSnapshot for writing
#[derive(Serialize)]
struct MonitorSnapshotRef<'a> {
    registry: &'a ProbeRegistry,
    scheduler: &'a RefreshScheduler,
}

/// Aggregated view of one site for display consumers
#[derive(Debug, Clone, PartialEq)]
pub struct SiteSummary {
    pub site_label: String,
    pub live_probes: usize,
    /// Per-product total amount and the most pessimistic finite forecast
    pub products: AHashMap<String, ProductTotal>,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ProductTotal {
    pub amount: f64,
    pub minutes_to_deplete: Option<f64>,
}

impl Monitor {
    pub fn new(config: MonitorConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            registry: ProbeRegistry::new(),
            scheduler: RefreshScheduler::new(),
        })
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    pub fn registry(&self) -> &ProbeRegistry {
        &self.registry
    }

    /// Register a newly placed probe
    ///
    /// The record lands on the priority queue so its first readings arrive
    /// on the very next cycle instead of waiting for its round-robin turn.
    pub fn add_probe(
        &mut self,
        probe_id: EntityId,
        coupling_handle: EntityId,
        placement: Placement,
        now: Tick,
    ) -> usize {
        let position = self.registry.add(probe_id, coupling_handle, placement, now);
        self.scheduler.flag_stale(position);
        position
    }

    /// Decommission a probe: soft delete, the slot stays occupied
    pub fn remove_probe(&mut self, probe_id: EntityId) -> Result<()> {
        let position = self
            .registry
            .position_of(probe_id)
            .ok_or(SentinelError::ProbeNotFound(probe_id))?;
        self.registry.remove(position);
        Ok(())
    }

    /// Not currently tracked probes yield None, never an error
    pub fn lookup(&self, probe_id: EntityId) -> Option<&ProbeRecord> {
        self.registry.lookup(probe_id)
    }

    pub fn set_site_label(&mut self, probe_id: EntityId, label: impl Into<String>) -> Result<()> {
        let record = self
            .registry
            .lookup_mut(probe_id)
            .ok_or(SentinelError::ProbeNotFound(probe_id))?;
        record.site_label = label.into();
        Ok(())
    }

    /// Flag a probe for out-of-band refresh on the next cycle
    pub fn force_refresh(&mut self, probe_id: EntityId) -> Result<()> {
        let position = self
            .registry
            .position_of(probe_id)
            .ok_or(SentinelError::ProbeNotFound(probe_id))?;
        self.scheduler.flag_stale(position);
        Ok(())
    }

    /// Per-cycle entry point; returns the number of records refreshed
    pub fn on_cycle(&mut self, adapter: &dyn SignalAdapter, now: Tick) -> usize {
        self.scheduler
            .tick(&mut self.registry, adapter, &self.config, now)
    }

    /// Process (re)start: rebuild the derived index from the records
    pub fn on_restart(&mut self, adapter: &dyn SignalAdapter) {
        self.registry.rebuild_index(adapter);
    }

    /// Blueprint-copy hook: inert passthrough, log and nothing else
    pub fn on_blueprint_copied(&self, source: EntityId, copy: EntityId) {
        tracing::debug!(?source, ?copy, "blueprint copied");
    }

    /// Aggregate live records by site label for display collaborators
    ///
    /// Amounts sum across a site's probes; the forecast per product is the
    /// most pessimistic finite one.
    pub fn site_summary(&self) -> Vec<SiteSummary> {
        let mut sites: AHashMap<String, SiteSummary> = AHashMap::new();
        for record in self.registry.iter().filter(|r| r.alive) {
            let site = sites
                .entry(record.site_label.clone())
                .or_insert_with(|| SiteSummary {
                    site_label: record.site_label.clone(),
                    live_probes: 0,
                    products: AHashMap::new(),
                });
            site.live_probes += 1;
            for (key, state) in &record.products {
                let total = site.products.entry(key.clone()).or_default();
                total.amount += state.amount;
                total.minutes_to_deplete = match (total.minutes_to_deplete, state.minutes_to_deplete)
                {
                    (Some(a), Some(b)) => Some(a.min(b)),
                    (a, b) => a.or(b),
                };
            }
        }
        let mut summaries: Vec<SiteSummary> = sites.into_values().collect();
        summaries.sort_by(|a, b| a.site_label.cmp(&b.site_label));
        summaries
    }

    /// Serialize the persisted state surface to JSON
    pub fn snapshot_to_string(&self) -> Result<String> {
        let snapshot = MonitorSnapshotRef {
            registry: &self.registry,
            scheduler: &self.scheduler,
        };
        Ok(serde_json::to_string(&snapshot)?)
    }

    pub fn save_snapshot(&self, path: &std::path::Path) -> Result<()> {
        std::fs::write(path, self.snapshot_to_string()?)?;
        tracing::debug!(?path, probes = self.registry.len(), "snapshot saved");
        Ok(())
    }

    /// Restore a monitor from a snapshot
    ///
    /// The index is rebuilt from the records (skipping probes the adapter
    /// reports invalid); it is never trusted from disk.
    pub fn from_snapshot_str(
        json: &str,
        config: MonitorConfig,
        adapter: &dyn SignalAdapter,
    ) -> Result<Self> {
        config.validate()?;
        let snapshot: MonitorSnapshot = serde_json::from_str(json)?;
        let mut monitor = Self {
            config,
            registry: snapshot.registry,
            scheduler: snapshot.scheduler,
        };
        monitor.on_restart(adapter);
        Ok(monitor)
    }

    pub fn load_snapshot(
        path: &std::path::Path,
        config: MonitorConfig,
        adapter: &dyn SignalAdapter,
    ) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let monitor = Self::from_snapshot_str(&contents, config, adapter)?;
        tracing::debug!(?path, probes = monitor.registry.len(), "snapshot loaded");
        Ok(monitor)
    }
}
