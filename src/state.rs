// Copyright 2021-2022 System76 <info@system76.com>
// SPDX-License-Identifier: MPL-2.0

//! The lifecycle state of a coordinator, and the transitions applied to it.

use crate::{CancellationHandle, RequestOutcome, Status};
use std::ops::Deref;
use std::sync::Arc;
use tokio::sync::watch;

/// The observable state of a coordinator at one point in time.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Snapshot {
    /// Whether the embedding component is mounted.
    pub initialized: bool,
    pub status: Status,
    /// The last committed outcome.
    pub result: Option<RequestOutcome>,
}

#[derive(Debug, Default)]
struct State {
    view: Snapshot,
    live: Option<CancellationHandle>,
    /// Status to fall back to when a request ends without committing an outcome.
    resume: Status,
}

/// Single source of truth for a coordinator's state.
///
/// Every transition is applied under the channel's lock and published as a whole,
/// so observers never see a partially-applied transition. Transitions which do not
/// apply leave the state untouched and do not notify observers.
#[derive(Debug)]
pub(crate) struct Lifecycle {
    state: watch::Sender<State>,
}

impl Default for Lifecycle {
    fn default() -> Self {
        let (state, _) = watch::channel(State::default());
        Self { state }
    }
}

impl Lifecycle {
    pub fn subscribe(&self) -> FetchState {
        FetchState {
            receiver: self.state.subscribe(),
        }
    }

    pub fn snapshot(&self) -> Snapshot {
        self.state.borrow().view.clone()
    }

    pub fn mark_initialized(&self) {
        let applied = self.state.send_if_modified(|state| {
            if state.view.initialized {
                return false;
            }

            state.view.initialized = true;
            true
        });

        if applied {
            debug!("coordinator mounted");
        }
    }

    /// Invalidates the live request, if any, and marks the coordinator as unmounted.
    pub fn mark_uninitialized(&self) {
        let applied = self.state.send_if_modified(|state| {
            let mut modified = false;

            if let Some(live) = state.live.take() {
                debug!("cancelling request {} on unmount", live.generation());
                live.cancel();

                if state.view.status.is_busy() {
                    state.view.status = state.resume;
                }

                modified = true;
            }

            if state.view.initialized {
                state.view.initialized = false;
                modified = true;
            }

            modified
        });

        if applied {
            debug!("coordinator unmounted");
        }
    }

    /// Makes `handle` the live request, cancelling the one it supersedes.
    ///
    /// Returns `false` without modifying anything if the coordinator is not mounted.
    pub fn begin_request(&self, handle: CancellationHandle) -> bool {
        self.state.send_if_modified(|state| {
            if !state.view.initialized {
                return false;
            }

            match state.live.replace(handle) {
                Some(prior) => {
                    debug!("request {} superseded", prior.generation());
                    prior.cancel();
                }
                None => state.resume = state.view.status,
            }

            state.view.status = Status::Busy;
            true
        })
    }

    /// Signals cancellation to the live request without changing the status.
    pub fn cancel_live(&self) {
        if let Some(live) = self.state.borrow().live.as_ref() {
            if live.cancel() {
                debug!("request {} cancelled", live.generation());
            }
        }
    }

    pub fn complete_success(&self, handle: &CancellationHandle, outcome: RequestOutcome) -> bool {
        self.complete(handle, |state| {
            state.view.result = Some(outcome);
            state.view.status = Status::Idle;
        })
    }

    pub fn complete_http_error(
        &self,
        handle: &CancellationHandle,
        outcome: RequestOutcome,
    ) -> bool {
        self.complete(handle, |state| {
            state.view.result = Some(outcome);
            state.view.status = Status::Error;
        })
    }

    pub fn complete_network_error(
        &self,
        handle: &CancellationHandle,
        outcome: RequestOutcome,
    ) -> bool {
        self.complete(handle, |state| {
            state.view.result = Some(outcome);
            state.view.status = Status::Error;
        })
    }

    /// Records the cancellation of the live request.
    ///
    /// With `distinct` set, the status becomes `Aborted` and the result is replaced by
    /// the aborted sentinel. Otherwise the status returns to what it was before the
    /// request began and the previous result is kept.
    pub fn complete_cancelled(&self, handle: &CancellationHandle, distinct: bool) -> bool {
        if !handle.is_cancelled() {
            return false;
        }

        self.complete(handle, |state| {
            if distinct {
                state.view.result = Some(RequestOutcome::aborted());
                state.view.status = Status::Aborted;
            } else {
                state.view.status = state.resume;
            }
        })
    }

    fn complete(&self, handle: &CancellationHandle, apply: impl FnOnce(&mut State)) -> bool {
        let applied = self.state.send_if_modified(|state| {
            if state.live.as_ref() != Some(handle) {
                return false;
            }

            state.live = None;
            apply(state);
            true
        });

        if !applied {
            debug!("discarding stale completion of request {}", handle.generation());
        }

        applied
    }
}

/// The owning reference to a lifecycle. Dropping it unmounts the lifecycle.
#[derive(Debug, Default)]
pub(crate) struct LifecycleOwner(Arc<Lifecycle>);

impl Deref for LifecycleOwner {
    type Target = Arc<Lifecycle>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl Drop for LifecycleOwner {
    fn drop(&mut self) {
        self.0.mark_uninitialized();
    }
}

/// A read-only view of a coordinator's state, for the embedding component.
#[derive(Clone, Debug)]
pub struct FetchState {
    receiver: watch::Receiver<State>,
}

impl FetchState {
    pub fn initialized(&self) -> bool {
        self.receiver.borrow().view.initialized
    }

    pub fn status(&self) -> Status {
        self.receiver.borrow().view.status
    }

    pub fn result(&self) -> Option<RequestOutcome> {
        self.receiver.borrow().view.result.clone()
    }

    pub fn snapshot(&self) -> Snapshot {
        self.receiver.borrow().view.clone()
    }

    /// Waits for the next published transition.
    ///
    /// Returns `None` once the coordinator and all of its requests are gone.
    pub async fn changed(&mut self) -> Option<Snapshot> {
        self.receiver.changed().await.ok()?;
        Some(self.receiver.borrow_and_update().view.clone())
    }

    /// Waits until the status satisfies `predicate`, which may already be the case.
    pub async fn wait_for_status(
        &mut self,
        mut predicate: impl FnMut(Status) -> bool,
    ) -> Option<Snapshot> {
        self.receiver
            .wait_for(|state| predicate(state.view.status))
            .await
            .ok()
            .map(|state| state.view.clone())
    }
}
