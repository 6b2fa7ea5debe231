//! Shared application state and the global allocator.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

use axum::extract::State;

use hwtail_core::SnapshotStore;

/// Handlers only read the store; the monitor thread is its single writer.
pub(crate) type AppState = State<SnapshotStore>;
