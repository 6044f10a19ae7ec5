//! # Store Messages
//!
//! The requests a [`StoreClient`](super::StoreClient) sends to the
//! [`ReservationStore`](super::ReservationStore), each carrying the one-shot channel the
//! answer goes back on.

use super::{GatewayError, ReservationOutcome, StockSnapshot};
use crate::model::{HolderId, ResourceId};
use chrono::{DateTime, Utc};
use tokio::sync::oneshot;

/// Type alias for the one-shot response channel used by the store.
pub type Response<T> = oneshot::Sender<Result<T, GatewayError>>;

/// Internal message type sent to the store actor.
///
/// Every variant is handled to completion before the next message is read, so the
/// store never sees two of them interleaved.
#[derive(Debug)]
pub enum StoreRequest {
    CreateStock {
        resource_id: ResourceId,
        total: u32,
        respond_to: Response<()>,
    },
    TryReserve {
        resource_id: ResourceId,
        holder_id: HolderId,
        now: DateTime<Utc>,
        respond_to: Response<ReservationOutcome>,
    },
    Snapshot {
        resource_id: ResourceId,
        respond_to: Response<Option<StockSnapshot>>,
    },
    SweepExpired {
        resource_id: ResourceId,
        now: DateTime<Utc>,
        respond_to: Response<usize>,
    },
    ListResources {
        respond_to: Response<Vec<ResourceId>>,
    },
}
