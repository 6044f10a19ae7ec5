//! # Mock Store & Testing Guide
//!
//! [`MockStore`] hands out a real [`StoreClient`] whose requests are answered from a queue
//! of scripted expectations instead of by a [`ReservationStore`](super::ReservationStore).
//! It makes the repository testable against answers that are hard to produce with a real
//! store, such as a reservation whose response is lost to a timeout.
//!
//! ## When to use Mocks vs the Real Store
//!
//! | Feature | MockStore | ReservationStore |
//! |---------|-----------|------------------|
//! | **State** | None (scripted answers) | Real records |
//! | **Determinism** | Fully deterministic | Subject to scheduler |
//! | **Error Injection** | Easy (`return_err`) | Only by shutting the store down |
//! | **Use Case** | Repository and retry logic | Atomicity and full-system tests |
//!
//! ## Example
//!
//! ```rust,ignore
//! let mut mock = MockStore::new();
//! mock.expect_try_reserve().return_err(GatewayError::Timeout);
//! mock.expect_try_reserve().return_ok(ReservationOutcome::AlreadyReserved);
//!
//! let repository = PoolRepository::new(mock.client(), ExpiryWindow::default());
//! let outcome = repository.reserve_with_retry(&stock, &holder, now).await?;
//! assert!(outcome.is_held());
//!
//! mock.verify();
//! ```
//!
//! For lower-level tests use [`create_mock_client`] and the `expect_*` helpers to receive
//! the raw [`StoreRequest`] and answer it by hand.

use super::{GatewayError, ReservationOutcome, Response, StockSnapshot, StoreClient, StoreRequest};
use crate::model::{HolderId, ResourceId};
use chrono::{DateTime, Utc};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

// =============================================================================
// EXPECTATION BUILDER API
// =============================================================================

/// A scripted answer for the next request of one kind.
enum Expectation {
    CreateStock(Result<(), GatewayError>),
    TryReserve(Result<ReservationOutcome, GatewayError>),
    Snapshot(Result<Option<StockSnapshot>, GatewayError>),
    SweepExpired(Result<usize, GatewayError>),
    ListResources(Result<Vec<ResourceId>, GatewayError>),
}

type Expectations = Arc<Mutex<VecDeque<Expectation>>>;

fn answer<T>(respond_to: Response<T>, response: Result<T, GatewayError>) {
    let _ = respond_to.send(response);
}

/// A store double with expectation tracking.
///
/// Requests must arrive in the order the expectations were queued; a mismatch panics the
/// background task, which surfaces in the test as [`GatewayError::ActorDropped`] and a
/// failed [`MockStore::verify`].
pub struct MockStore {
    client: StoreClient,
    expectations: Expectations,
    _handle: tokio::task::JoinHandle<()>,
}

impl Default for MockStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MockStore {
    /// Creates a mock with no expectations. Must be called inside a Tokio runtime.
    pub fn new() -> Self {
        let (sender, mut receiver) = mpsc::channel::<StoreRequest>(100);
        let expectations: Expectations = Arc::new(Mutex::new(VecDeque::new()));
        let queued = expectations.clone();

        let handle = tokio::spawn(async move {
            while let Some(request) = receiver.recv().await {
                let expectation = queued
                    .lock()
                    .expect("mock expectations poisoned")
                    .pop_front();

                match (request, expectation) {
                    (
                        StoreRequest::CreateStock { respond_to, .. },
                        Some(Expectation::CreateStock(response)),
                    ) => answer(respond_to, response),
                    (
                        StoreRequest::TryReserve { respond_to, .. },
                        Some(Expectation::TryReserve(response)),
                    ) => answer(respond_to, response),
                    (
                        StoreRequest::Snapshot { respond_to, .. },
                        Some(Expectation::Snapshot(response)),
                    ) => answer(respond_to, response),
                    (
                        StoreRequest::SweepExpired { respond_to, .. },
                        Some(Expectation::SweepExpired(response)),
                    ) => answer(respond_to, response),
                    (
                        StoreRequest::ListResources { respond_to },
                        Some(Expectation::ListResources(response)),
                    ) => answer(respond_to, response),
                    (request, _) => panic!("Unexpected request or expectation mismatch: {request:?}"),
                }
            }
        });

        Self {
            client: StoreClient::new(sender),
            expectations,
            _handle: handle,
        }
    }

    /// Returns a client wired to this mock.
    pub fn client(&self) -> StoreClient {
        self.client.clone()
    }

    pub fn expect_create_stock(&mut self) -> ExpectationBuilder<()> {
        self.builder(Expectation::CreateStock)
    }

    pub fn expect_try_reserve(&mut self) -> ExpectationBuilder<ReservationOutcome> {
        self.builder(Expectation::TryReserve)
    }

    pub fn expect_snapshot(&mut self) -> ExpectationBuilder<Option<StockSnapshot>> {
        self.builder(Expectation::Snapshot)
    }

    pub fn expect_sweep(&mut self) -> ExpectationBuilder<usize> {
        self.builder(Expectation::SweepExpired)
    }

    pub fn expect_list_resources(&mut self) -> ExpectationBuilder<Vec<ResourceId>> {
        self.builder(Expectation::ListResources)
    }

    fn builder<T>(
        &mut self,
        wrap: fn(Result<T, GatewayError>) -> Expectation,
    ) -> ExpectationBuilder<T> {
        ExpectationBuilder {
            wrap,
            expectations: self.expectations.clone(),
        }
    }

    /// Panics if any queued expectation was not consumed.
    pub fn verify(&self) {
        let remaining = self.expectations.lock().expect("mock expectations poisoned").len();
        if remaining > 0 {
            panic!("Not all expectations were met. {} remaining", remaining);
        }
    }
}

/// Builder that queues the answer for one expected request.
pub struct ExpectationBuilder<T> {
    wrap: fn(Result<T, GatewayError>) -> Expectation,
    expectations: Expectations,
}

impl<T> ExpectationBuilder<T> {
    /// Answers the request successfully.
    pub fn return_ok(self, value: T) {
        self.push(Ok(value));
    }

    /// Answers the request with an error.
    pub fn return_err(self, error: GatewayError) {
        self.push(Err(error));
    }

    fn push(self, response: Result<T, GatewayError>) {
        self.expectations
            .lock()
            .expect("mock expectations poisoned")
            .push_back((self.wrap)(response));
    }
}

// =============================================================================
// RAW CHANNEL HELPERS
// =============================================================================

/// Creates a client and the receiver its requests arrive on.
pub fn create_mock_client(buffer_size: usize) -> (StoreClient, mpsc::Receiver<StoreRequest>) {
    let (sender, receiver) = mpsc::channel(buffer_size);
    (StoreClient::new(sender), receiver)
}

/// Helper to verify that the next message is a TryReserve request
pub async fn expect_try_reserve(
    receiver: &mut mpsc::Receiver<StoreRequest>,
) -> Option<(ResourceId, HolderId, DateTime<Utc>, Response<ReservationOutcome>)> {
    match receiver.recv().await {
        Some(StoreRequest::TryReserve {
            resource_id,
            holder_id,
            now,
            respond_to,
        }) => Some((resource_id, holder_id, now, respond_to)),
        _ => None,
    }
}

/// Helper to verify that the next message is a Snapshot request
pub async fn expect_snapshot(
    receiver: &mut mpsc::Receiver<StoreRequest>,
) -> Option<(ResourceId, Response<Option<StockSnapshot>>)> {
    match receiver.recv().await {
        Some(StoreRequest::Snapshot {
            resource_id,
            respond_to,
        }) => Some((resource_id, respond_to)),
        _ => None,
    }
}
