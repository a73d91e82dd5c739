// Copyright 2021-2022 System76 <info@system76.com>
// SPDX-License-Identifier: MPL-2.0

use crate::state::{Lifecycle, LifecycleOwner};
use crate::utils::cancellable;
use crate::*;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::task::JoinHandle;

/// Coordinates the single-flight request lifecycle of an embedding component.
///
/// At most one request is live at a time. Triggering a request cancels the one it
/// supersedes, and only the outcome of the live request is ever committed to state.
/// The embedding component calls [`Coordinator::on_mount`] and
/// [`Coordinator::on_unmount`] from its own lifecycle; requests are ignored while
/// unmounted. Dropping the coordinator unmounts it.
#[derive(new, Setters)]
pub struct Coordinator<T> {
    /// Performs the network operation of each request.
    #[setters(skip)]
    transport: Arc<T>,

    /// How successful response bodies are decoded.
    /// # Note
    /// Defaults to JSON.
    #[new(value = "BodyFormat::Json")]
    format: BodyFormat,

    /// Whether a cancelled request is recorded with the `Aborted` status and the
    /// aborted sentinel outcome. When disabled, cancellation restores the status held
    /// before the request began and keeps the previous result.
    /// # Note
    /// Defaults to `true`.
    #[new(value = "true")]
    distinct_cancelled_status: bool,

    #[new(default)]
    #[setters(skip)]
    generation: AtomicU64,

    #[new(default)]
    #[setters(skip)]
    lifecycle: LifecycleOwner,
}

impl<T: Transport> Coordinator<T> {
    /// Marks the embedding component as mounted, allowing requests to be triggered.
    pub fn on_mount(&self) {
        self.lifecycle.mark_initialized();
    }

    /// Marks the embedding component as unmounted, cancelling the live request.
    ///
    /// Nothing about a request issued before unmounting will be committed afterwards.
    pub fn on_unmount(&self) {
        self.lifecycle.mark_uninitialized();
    }

    /// Starts a new request, superseding the live one.
    ///
    /// The request is spawned on the current tokio runtime, and its progress is
    /// observed through the state. Returns `None` without contacting the transport
    /// when the coordinator is not mounted.
    pub fn trigger(&self, request: impl Into<FetchRequest>) -> Option<JoinHandle<()>> {
        let request = request.into();
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let handle = CancellationHandle::new(generation);

        if !self.lifecycle.begin_request(handle.clone()) {
            debug!("ignoring request for {}: not mounted", request.uri);
            return None;
        }

        debug!("request {} started for {}", generation, request.uri);

        let attempt = Attempt {
            lifecycle: Arc::clone(&*self.lifecycle),
            format: self.format,
            distinct_cancelled_status: self.distinct_cancelled_status,
            handle,
        };

        let response = self.transport.perform(request, attempt.handle.clone());

        Some(tokio::spawn(attempt.run(response)))
    }

    /// Cancels the live request, if any.
    ///
    /// The status is updated once the request observes its cancellation.
    pub fn cancel(&self) {
        self.lifecycle.cancel_live();
    }

    /// A read-only view of the state which can be awaited for changes.
    pub fn state(&self) -> FetchState {
        self.lifecycle.subscribe()
    }

    pub fn snapshot(&self) -> Snapshot {
        self.lifecycle.snapshot()
    }

    pub fn initialized(&self) -> bool {
        self.snapshot().initialized
    }

    pub fn status(&self) -> Status {
        self.snapshot().status
    }

    pub fn result(&self) -> Option<RequestOutcome> {
        self.snapshot().result
    }
}

/// One spawned request, routing its outcome into the lifecycle.
struct Attempt {
    lifecycle: Arc<Lifecycle>,
    format: BodyFormat,
    distinct_cancelled_status: bool,
    handle: CancellationHandle,
}

impl Attempt {
    async fn run(
        self,
        response: impl std::future::Future<Output = Result<RawResponse, TransportError>>,
    ) {
        let response = match cancellable(&self.handle, response).await {
            Some(Ok(response)) => response,
            None => return self.cancelled(),
            Some(Err(TransportError::Canceled)) if self.handle.is_cancelled() => {
                return self.cancelled()
            }
            Some(Err(why)) => return self.network_error(why),
        };

        let RawResponse {
            status,
            status_text,
            body,
        } = response;

        if !status.is_success() {
            let outcome = RequestOutcome::new(None, status.as_u16(), status_text);
            if self.lifecycle.complete_http_error(&self.handle, outcome) {
                info!(
                    "request {} failed with {}",
                    self.handle.generation(),
                    status
                );
            }

            return;
        }

        match cancellable(&self.handle, decode(body, self.format)).await {
            Some(Ok(data)) => {
                let outcome = RequestOutcome::new(Some(data), status.as_u16(), status_text);
                if self.lifecycle.complete_success(&self.handle, outcome) {
                    info!(
                        "request {} completed with {}",
                        self.handle.generation(),
                        status
                    );
                }
            }
            Some(Err(why)) => self.network_error(why),
            None => self.cancelled(),
        }
    }

    fn cancelled(&self) {
        if self
            .lifecycle
            .complete_cancelled(&self.handle, self.distinct_cancelled_status)
        {
            info!("request {} was aborted", self.handle.generation());
        }
    }

    fn network_error(&self, why: impl std::error::Error) {
        let outcome = RequestOutcome::network_error(&why);
        if self.lifecycle.complete_network_error(&self.handle, outcome) {
            warn!("request {} failed: {}", self.handle.generation(), why);
        }
    }
}
