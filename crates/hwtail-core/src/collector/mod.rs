//! Log collector: from a CSV file on disk to published snapshots.
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────┐
//! │                           Monitor                             │
//! │  ┌──────────────┐   ┌──────────────┐   ┌──────────────────┐   │
//! │  │  LogLocator  │──▶│  LogLayout   │──▶│    FileTailer    │   │
//! │  │  newest .csv │   │  delimiter   │   │  trailing window │   │
//! │  └──────┬───────┘   │  column map  │   │  rotation checks │   │
//! │         │           └──────────────┘   └────────┬─────────┘   │
//! │  ┌──────▼──────┐                                │ last line   │
//! │  │ FileSystem  │ (trait)               ┌────────▼─────────┐   │
//! │  └─────────────┘                       │     Reading      │   │
//! │                                        │ normalize+derive │   │
//! │                                        └────────┬─────────┘   │
//! └─────────────────────────────────────────────────┼─────────────┘
//!                                                   │ write
//!                                          ┌────────▼─────────┐
//!                                          │  SnapshotStore   │◀── readers
//!                                          └──────────────────┘
//! ```
//!
//! # Usage
//!
//! ```no_run
//! use hwtail_core::collector::{Monitor, RealFs};
//! use hwtail_core::{LogSource, MonitorConfig, SnapshotStore};
//!
//! let store = SnapshotStore::new();
//! let config = MonitorConfig::new(LogSource::directory("log-here"));
//! let handle = Monitor::new(RealFs::new(), config, store.clone())
//!     .spawn()
//!     .unwrap();
//! println!("{:?}", store.read().raw.status);
//! handle.shutdown();
//! ```

pub mod derived;
pub mod hardware;
pub mod header;
pub mod locator;
pub mod mock;
pub mod monitor;
pub mod normalize;
pub mod record;
pub mod tailer;
pub mod traits;

pub use derived::{DdrGeneration, RamSpeed};
pub use hardware::{FixedProbe, HardwareInfo, HardwareProbe, SystemProbe};
pub use header::{ColumnIndexMap, Field, LogLayout};
pub use locator::LogLocator;
pub use mock::MockFs;
pub use monitor::{Monitor, MonitorHandle, Phase};
pub use normalize::normalize_value;
pub use record::Reading;
pub use tailer::FileTailer;
pub use traits::{FileSystem, RealFs};
