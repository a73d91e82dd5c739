// Copyright 2021-2022 System76 <info@system76.com>
// SPDX-License-Identifier: MPL-2.0

use crate::CancellationHandle;
use futures::future::{select, FutureExt};
use std::future::Future;

/// Runs `future` until it completes or `handle` is cancelled, whichever is first.
///
/// Returns `None` on cancellation. Cancellation wins when both are ready.
pub async fn cancellable<F: Future>(handle: &CancellationHandle, future: F) -> Option<F::Output> {
    let cancelled = handle.cancelled().map(|()| None::<F::Output>);
    let future = future.map(Some);

    futures::pin_mut!(cancelled);
    futures::pin_mut!(future);

    select(cancelled, future).await.factor_first().0
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::executor::block_on;

    #[test]
    fn completes_when_not_cancelled() {
        let handle = CancellationHandle::new(1);
        assert_eq!(block_on(cancellable(&handle, async { 5 })), Some(5));
    }

    #[test]
    fn cancellation_wins() {
        let handle = CancellationHandle::new(1);
        handle.cancel();
        assert_eq!(block_on(cancellable(&handle, async { 5 })), None);
        assert_eq!(
            block_on(cancellable(&handle, futures::future::pending::<()>())),
            None
        );
    }
}
