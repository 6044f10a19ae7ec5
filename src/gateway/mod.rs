//! # Atomic Reservation Gateway
//!
//! The shared store of per-stock holder records and the one operation that is allowed to
//! change them: an indivisible check-and-reserve.
//!
//! - [`ReservationGateway`] is the capability contract.
//! - [`ReservationStore`] / [`StoreClient`] are the in-process actor that fulfils it.
//! - [`mock`] scripts gateway answers for tests.

pub mod actor;
pub mod client;
pub mod contract;
pub mod error;
pub mod message;
pub mod mock;
pub mod record;

pub use actor::ReservationStore;
pub use client::*;
pub use contract::*;
pub use error::GatewayError;
pub use message::{Response, StoreRequest};
pub use record::StockRecord;
