// Copyright 2021-2022 System76 <info@system76.com>
// SPDX-License-Identifier: MPL-2.0

use async_shutdown::ShutdownManager;
use std::fmt;
use std::future::Future;

/// Identifies one in-flight request of a coordinator.
///
/// Handles compare equal only to clones of themselves. Cancelling a handle signals
/// every clone; the request observing it is expected to stop at its next
/// suspension point.
#[derive(Clone)]
pub struct CancellationHandle {
    generation: u64,
    signal: ShutdownManager<()>,
}

impl CancellationHandle {
    pub(crate) fn new(generation: u64) -> Self {
        Self {
            generation,
            signal: ShutdownManager::new(),
        }
    }

    /// Position of this request in the order that requests were triggered.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Signals cancellation. Returns `false` if it was already cancelled.
    pub fn cancel(&self) -> bool {
        self.signal.trigger_shutdown(()).is_ok()
    }

    pub fn is_cancelled(&self) -> bool {
        self.signal.is_shutdown_triggered()
    }

    /// Resolves once the handle has been cancelled.
    pub fn cancelled(&self) -> impl Future<Output = ()> + Send + 'static {
        self.signal.wait_shutdown_triggered()
    }
}

impl PartialEq for CancellationHandle {
    fn eq(&self, other: &Self) -> bool {
        self.generation == other.generation
    }
}

impl Eq for CancellationHandle {}

impl fmt::Debug for CancellationHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CancellationHandle")
            .field("generation", &self.generation)
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}
