//! Runtime orchestration and lifecycle management.
//!
//! This module contains the infrastructure for running the allocation engine:
//!
//! - **Task lifecycle**: Starting, wiring, and shutting down the store and compactor
//! - **Compaction**: Periodic removal of lapsed claims
//! - **Observability setup**: Initializing tracing and logging
//!
//! # Main Components
//!
//! - [`AllocationSystem`] - Owns the running tasks and exposes the repository
//! - [`spawn_compactor`] / [`sweep_all`] - Background and one-shot sweeps
//! - [`setup_tracing`] - Initializes the tracing/logging infrastructure

pub mod allocation_system;
pub mod compactor;
pub mod tracing;

pub use allocation_system::*;
pub use compactor::*;
pub use self::tracing::*;
