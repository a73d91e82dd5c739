// Copyright 2021-2022 System76 <info@system76.com>
// SPDX-License-Identifier: MPL-2.0

use crate::inputs::Command;
use crate::machine;
use fetch_coordinator::{Coordinator, Transport};
use futures::prelude::*;
use std::io::Write;

/// Mounts `coordinator`, applies `commands` in order, and writes every published
/// state to `output`. Returns `output` once the coordinator has been torn down.
pub async fn run<T, W>(
    coordinator: Coordinator<T>,
    mut commands: impl Stream<Item = Command> + Unpin,
    output: W,
) -> W
where
    T: Transport,
    W: Write + Send + 'static,
{
    let mut state = coordinator.state();
    let mut settled = coordinator.state();

    let printer = tokio::spawn(async move {
        let mut output = output;

        while let Some(snapshot) = state.changed().await {
            if let Err(why) = machine::write(&mut output, &snapshot) {
                error!("failed to write output: {}", why);
                break;
            }
        }

        output
    });

    coordinator.on_mount();

    // The state channel only holds the latest value, so the printer must run
    // between commands for each transition to be written.
    tokio::task::yield_now().await;

    while let Some(command) = commands.next().await {
        debug!("received {:?}", command);

        match command {
            Command::Fetch(uri) => {
                let _ = coordinator.trigger(uri);
            }
            Command::Cancel => coordinator.cancel(),
            Command::Mount => coordinator.on_mount(),
            Command::Unmount => coordinator.on_unmount(),
        }

        tokio::task::yield_now().await;
    }

    // Let the last request settle before tearing down.
    let _ = settled.wait_for_status(|status| !status.is_busy()).await;
    drop(coordinator);

    match printer.await {
        Ok(output) => output,
        Err(why) => std::panic::resume_unwind(why.into_panic()),
    }
}
