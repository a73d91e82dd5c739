// Copyright 2021-2022 System76 <info@system76.com>
// SPDX-License-Identifier: MPL-2.0

//! Single-flight asynchronous fetching for reactive components
//!
//! - Trigger a request and observe it through a small status state machine.
//! - Newer requests supersede and cancel older ones; stale outcomes are discarded.
//! - Cancel the in-flight request at any time.
//! - Unmounting cancels the in-flight request and freezes the state.
//! - Await state changes to re-render when something is committed.
//!
//! ```no_run
//! use fetch_coordinator::{BodyFormat, Client, Coordinator, Status};
//! use std::sync::Arc;
//!
//! # async fn run() {
//! let coordinator = Coordinator::new(Arc::new(Client::default()))
//!     // Decode successful response bodies as JSON.
//!     .format(BodyFormat::Json)
//!     // Record cancellations with the `Aborted` status.
//!     .distinct_cancelled_status(true);
//!
//! let mut state = coordinator.state();
//!
//! // Called by the embedding component when it mounts.
//! coordinator.on_mount();
//!
//! // Spawns the request on the current runtime.
//! coordinator.trigger("https://example.com/api/items");
//!
//! if let Some(snapshot) = state.wait_for_status(|status| !status.is_busy()).await {
//!     println!("{:?}: {:?}", snapshot.status, snapshot.result);
//! }
//!
//! // Called by the embedding component when it unmounts.
//! coordinator.on_unmount();
//! # }
//! ```

#[macro_use]
extern crate derive_new;
#[macro_use]
extern crate derive_setters;
#[macro_use]
extern crate log;
#[macro_use]
extern crate thiserror;

mod client;
mod coordinator;
mod decode;
mod handle;
mod outcome;
mod state;
mod transport;
mod utils;

pub use self::client::*;
pub use self::coordinator::*;
pub use self::decode::*;
pub use self::handle::*;
pub use self::outcome::*;
pub use self::state::{FetchState, Snapshot};
pub use self::transport::*;
