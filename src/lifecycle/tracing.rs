//! # Observability & Tracing
//!
//! [`setup_tracing`] initializes structured logging for the binary. Library code only
//! emits events; it never installs a subscriber.
//!
//! ## Configuration
//!
//! Compact format with the module prefix hidden (`with_target(false)`). Levels come from
//! `RUST_LOG`.
//!
//! ```bash
//! # Lifecycle, grants and sweeps
//! RUST_LOG=info cargo run
//!
//! # Every request the store receives
//! RUST_LOG=debug cargo run
//! ```
//!
//! ## What Gets Traced
//!
//! - **Store lifecycle**: startup with the expiry window, shutdown with the stock count
//! - **Reservations**: `resource_id`, `holder_id`, `outcome`, `held`, `total`, `version`
//! - **Sweeps**: records removed per stock and per compaction pass
//! - **Retries**: each unknown-outcome retry at `warn`
//!
//! ## Trace Example
//!
//! **With `RUST_LOG=info`**:
//!
//! ```text
//! INFO Store started window_secs=600
//! INFO Stock created resource_id=item-999 total=1 size=1
//! INFO Reserve resource_id=item-999 holder_id=user-A outcome=granted held=1 total=1 version=2
//! INFO Reserve resource_id=item-999 holder_id=user-B outcome=out_of_capacity held=1 total=1 version=2
//! ```
//!
//! Client calls run inside `#[instrument]` spans, so at `debug` each store event is
//! prefixed with the span of the repository call that caused it.
pub fn setup_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .compact()
        .init();
}
