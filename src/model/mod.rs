//! Pure domain values: identifiers, allocations and the [`SalesStock`] aggregate.
//!
//! Nothing in this module performs I/O or holds shared state.

pub mod allocation;
pub mod error;
pub mod ids;
pub mod stock;

pub use allocation::*;
pub use error::*;
pub use ids::*;
pub use stock::*;
