//! Latest published snapshot.
//!
//! Readers get an `Arc` to an immutable [`MetricSnapshot`] and never wait on
//! the writer. Every update builds a complete new snapshot from the current one
//! and swaps the pointer, so a reader sees either the old value or the new one.

use std::path::Path;
use std::sync::Arc;

use arc_swap::ArcSwap;
use chrono::Utc;

use crate::collector::hardware::HardwareInfo;
use crate::collector::record::Reading;
use crate::model::{MetricSnapshot, Status};

/// Shared handle to the published snapshot. Cloning is cheap.
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    inner: Arc<ArcSwap<MetricSnapshot>>,
}

impl SnapshotStore {
    /// Store holding the initial `starting` snapshot.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(ArcSwap::from_pointee(MetricSnapshot::default())),
        }
    }

    pub fn read(&self) -> Arc<MetricSnapshot> {
        self.inner.load_full()
    }

    /// Publishes the metrics of one parsed row and marks the store `live`.
    ///
    /// `ram.total_gb` and `info.ram_type` keep their previous values when the
    /// row does not allow computing them.
    pub fn write(&self, reading: &Reading) {
        let updated_at = Utc::now().timestamp();
        self.update(|snap| {
            snap.cpu = reading.cpu;
            snap.gpu = reading.gpu;
            snap.ram.usage_percent = reading.ram.usage_percent;
            snap.ram.used_gb = reading.ram.used_gb;
            if reading.ram.total_gb.is_some() {
                snap.ram.total_gb = reading.ram.total_gb;
            }
            if let Some(speed) = reading.ram_speed {
                snap.info.ram_type = speed.to_string();
            }
            snap.raw.status = Status::Live;
            snap.raw.updated_at = Some(updated_at);
            snap.raw.message = None;
        });
    }

    /// Sets the status. `message` is kept only for [`Status::Error`].
    pub fn set_status(&self, status: Status, message: Option<String>) {
        self.update(|snap| {
            snap.raw.status = status;
            snap.raw.message = match status {
                Status::Error => message.clone(),
                _ => None,
            };
        });
    }

    /// Records the log file currently tracked.
    pub fn set_source(&self, path: &Path) {
        let source = path.display().to_string();
        self.update(|snap| snap.raw.source = Some(source.clone()));
    }

    pub fn set_hardware(&self, info: &HardwareInfo) {
        self.update(|snap| {
            snap.info.cpu_name = info.cpu_name.clone();
            snap.info.gpu_name = info.gpu_name.clone();
        });
    }

    /// Copy-modify-swap. The closure may run more than once under contention.
    fn update(&self, mut f: impl FnMut(&mut MetricSnapshot)) {
        self.inner.rcu(|current| {
            let mut next = MetricSnapshot::clone(current);
            f(&mut next);
            Arc::new(next)
        });
    }
}

impl Default for SnapshotStore {
    fn default() -> Self {
        Self::new()
    }
}
