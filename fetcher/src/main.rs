// Copyright 2021-2022 System76 <info@system76.com>
// SPDX-License-Identifier: MPL-2.0

//! Drives a fetch coordinator from RON commands on stdin, one per line:
//! `Fetch("https://...")`, `Cancel`, `Mount`, `Unmount`. Every published state
//! is written to stdout as a line of RON.

#[macro_use]
extern crate log;
#[macro_use]
extern crate thiserror;

mod inputs;
mod machine;
mod session;

use fetch_coordinator::{Client, Coordinator};
use std::io;
use std::sync::Arc;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    better_panic::install();
    env_logger::init();

    let coordinator = Coordinator::new(Arc::new(Client::default()));
    let commands = inputs::stream(tokio::io::stdin());

    session::run(coordinator, commands, io::stdout()).await;
}
