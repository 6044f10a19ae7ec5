//! # Store Client
//!
//! The `StoreClient` is the caller side of the [`ReservationStore`](super::ReservationStore).
//! It forwards requests over a Tokio mpsc channel and waits for the answer on a oneshot
//! channel, bounded by a request timeout.
//!
//! * **Cloneable** – holds only a sender, so cloning is inexpensive.
//! * **Bounded** – a call that gets no answer within the timeout fails with
//!   [`GatewayError::Timeout`]; the store may still have applied it.

use super::{
    GatewayError, ReservationGateway, ReservationOutcome, Response, StockSnapshot, StoreRequest,
};
use crate::model::{HolderId, ResourceId};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, instrument};

/// Round-trip limit used when none is configured.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(1);

/// Client for the reservation store.
#[derive(Clone)]
pub struct StoreClient {
    sender: mpsc::Sender<StoreRequest>,
    request_timeout: Duration,
}

impl StoreClient {
    pub fn new(sender: mpsc::Sender<StoreRequest>) -> Self {
        Self {
            sender,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, request_timeout: Duration) -> Self {
        self.request_timeout = request_timeout;
        self
    }

    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    async fn request<T>(
        &self,
        build: impl FnOnce(Response<T>) -> StoreRequest,
    ) -> Result<T, GatewayError> {
        let (respond_to, response) = oneshot::channel();
        let round_trip = async {
            self.sender
                .send(build(respond_to))
                .await
                .map_err(|_| GatewayError::ActorClosed)?;
            response.await.map_err(|_| GatewayError::ActorDropped)?
        };
        tokio::time::timeout(self.request_timeout, round_trip)
            .await
            .map_err(|_| GatewayError::Timeout)?
    }
}

#[async_trait]
impl ReservationGateway for StoreClient {
    #[instrument(skip(self))]
    async fn create_stock(&self, resource_id: &ResourceId, total: u32) -> Result<(), GatewayError> {
        debug!("Sending request");
        let resource_id = resource_id.clone();
        self.request(|respond_to| StoreRequest::CreateStock {
            resource_id,
            total,
            respond_to,
        })
        .await
    }

    #[instrument(skip(self))]
    async fn try_reserve(
        &self,
        resource_id: &ResourceId,
        holder_id: &HolderId,
        now: DateTime<Utc>,
    ) -> Result<ReservationOutcome, GatewayError> {
        debug!("Sending request");
        let resource_id = resource_id.clone();
        let holder_id = holder_id.clone();
        self.request(|respond_to| StoreRequest::TryReserve {
            resource_id,
            holder_id,
            now,
            respond_to,
        })
        .await
    }

    #[instrument(skip(self))]
    async fn list_reservations(
        &self,
        resource_id: &ResourceId,
    ) -> Result<Option<StockSnapshot>, GatewayError> {
        debug!("Sending request");
        let resource_id = resource_id.clone();
        self.request(|respond_to| StoreRequest::Snapshot {
            resource_id,
            respond_to,
        })
        .await
    }

    #[instrument(skip(self))]
    async fn sweep_expired(
        &self,
        resource_id: &ResourceId,
        now: DateTime<Utc>,
    ) -> Result<usize, GatewayError> {
        debug!("Sending request");
        let resource_id = resource_id.clone();
        self.request(|respond_to| StoreRequest::SweepExpired {
            resource_id,
            now,
            respond_to,
        })
        .await
    }

    #[instrument(skip(self))]
    async fn list_resources(&self) -> Result<Vec<ResourceId>, GatewayError> {
        debug!("Sending request");
        self.request(|respond_to| StoreRequest::ListResources { respond_to })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::mock::{create_mock_client, expect_try_reserve};
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn test_try_reserve_sends_request() {
        let (client, mut receiver) = create_mock_client(10);

        let reserve_task = tokio::spawn(async move {
            client
                .try_reserve(&"item-1".into(), &"user-A".into(), t0())
                .await
        });

        let (resource_id, holder_id, now, responder) = expect_try_reserve(&mut receiver)
            .await
            .expect("Expected TryReserve request");
        assert_eq!(resource_id, ResourceId::from("item-1"));
        assert_eq!(holder_id, HolderId::from("user-A"));
        assert_eq!(now, t0());

        responder.send(Ok(ReservationOutcome::Granted)).unwrap();
        assert_eq!(reserve_task.await.unwrap(), Ok(ReservationOutcome::Granted));
    }

    #[tokio::test]
    async fn test_unanswered_request_times_out() {
        let (client, mut receiver) = create_mock_client(10);
        let client = client.with_timeout(Duration::from_millis(20));
        assert_eq!(client.request_timeout(), Duration::from_millis(20));

        let reserve_task = tokio::spawn(async move {
            client
                .try_reserve(&"item-1".into(), &"user-A".into(), Utc::now())
                .await
        });

        // Hold the responder without answering until the client gives up.
        let (_, _, _, responder) = expect_try_reserve(&mut receiver).await.unwrap();
        let result = reserve_task.await.unwrap();
        drop(responder);

        assert_eq!(result, Err(GatewayError::Timeout));
        assert!(GatewayError::Timeout.is_unknown_outcome());
    }

    #[tokio::test]
    async fn test_closed_store() {
        let (client, receiver) = create_mock_client(10);
        drop(receiver);

        let result = client.list_resources().await;
        assert_eq!(result, Err(GatewayError::ActorClosed));
    }

    #[tokio::test]
    async fn test_dropped_responder() {
        let (client, mut receiver) = create_mock_client(10);

        let task = tokio::spawn(async move { client.list_reservations(&"item-1".into()).await });
        let request = receiver.recv().await.unwrap();
        drop(request);

        assert_eq!(task.await.unwrap(), Err(GatewayError::ActorDropped));
    }
}
