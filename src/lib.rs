#![doc(html_logo_url = "https://www.rust-lang.org/logos/rust-logo-128x128.png")]
#![doc(html_favicon_url = "https://www.rust-lang.org/favicon.ico")]
//! # Stock Allocation
//!
//! > **Limited-capacity stock allocation with time-bounded claims.**
//!
//! A stock has `total` slots. Holders claim a slot; a claim counts against capacity for a
//! fixed window (ten minutes by default) and then lapses. Many callers may race for the
//! last slot of the same stock, and at most `total` of them ever win.
//!
//! ## 🏗️ Design Philosophy
//!
//! ### Read models and one atomic write
//!
//! The [`SalesStock`](model::SalesStock) aggregate is an immutable snapshot. It answers
//! questions ("how many slots are free?", "does this holder have a live claim?") but is
//! never saved back. The only write is the gateway's atomic `try_reserve`, which checks
//! and records a claim in one indivisible step.
//!
//! ### Why an actor for the store?
//!
//! The reference [`ReservationStore`](gateway::ReservationStore) runs in its own Tokio task
//! and processes requests sequentially (no locks needed for internal state!). That
//! sequential loop is exactly the indivisibility the reservation contract needs.
//!
//! ## 👩‍💻 Architecture Notes
//!
//! ### 1. Outcomes vs Errors
//! Losing the race (`OutOfCapacity`) or retrying a claim you already hold
//! (`AlreadyReserved`) are normal results, returned as a
//! [`ReservationOutcome`](gateway::ReservationOutcome). Errors are for failures: an unknown
//! stock, a store that stopped answering, or a snapshot that breaks the capacity invariant.
//!
//! ### 2. Unknown Outcomes
//! A reservation that times out may still have been applied. Retrying with the same holder
//! is safe: the store answers `AlreadyReserved` instead of granting twice. See
//! [`PoolRepository::reserve_with_retry`](repository::PoolRepository::reserve_with_retry).
//!
//! ### 3. Time is an Argument
//! Expiry is always evaluated against an explicit `now`. The repository reads it from an
//! injected [`Clock`](clock::Clock), so tests can cross the window without sleeping.
//!
//! ## 🗺️ Module Tour
//!
//! ### 1. The Domain ([`model`])
//! Identifiers, [`Allocation`](model::Allocation) and the [`SalesStock`](model::SalesStock)
//! aggregate. Pure values, no I/O.
//!
//! ### 2. The Engine ([`gateway`])
//! The [`ReservationGateway`](gateway::ReservationGateway) contract, the actor-backed store
//! that implements it, and a [`MockStore`](gateway::mock::MockStore) for tests.
//!
//! ### 3. The Interface ([`repository`])
//! [`PoolRepository`](repository::PoolRepository): load snapshots, forward reservations.
//!
//! ### 4. The Orchestrator ([`lifecycle`])
//! [`AllocationSystem`](lifecycle::AllocationSystem) spins up the store and the optional
//! compactor and shuts them down cleanly. Settings come from [`config`].
//!
//! ## 🚀 Quick Start
//!
//! ```bash
//! # Run the demo with info logs
//! RUST_LOG=info cargo run
//!
//! # Run the tests
//! cargo test
//! ```

pub mod clock;
pub mod config;
pub mod gateway;
pub mod lifecycle;
pub mod model;
pub mod repository;
