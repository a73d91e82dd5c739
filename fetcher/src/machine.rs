// Copyright 2021-2022 System76 <info@system76.com>
// SPDX-License-Identifier: MPL-2.0

use fetch_coordinator::{Data, Snapshot, Status};
use serde::Serialize;
use std::io::{self, Write};

/// A machine-readable line describing a published state.
#[derive(Serialize)]
pub struct Output<'a> {
    initialized: bool,
    status: Status,
    status_code: Option<u16>,
    status_text: Option<&'a str>,
    data: Option<&'a Data>,
}

impl<'a> From<&'a Snapshot> for Output<'a> {
    fn from(snapshot: &'a Snapshot) -> Self {
        let result = snapshot.result.as_ref();

        Output {
            initialized: snapshot.initialized,
            status: snapshot.status,
            status_code: result.map(|result| result.status_code),
            status_text: result.map(|result| &*result.status_text),
            data: result.and_then(|result| result.data.as_ref()),
        }
    }
}

pub fn write(output: &mut impl Write, snapshot: &Snapshot) -> io::Result<()> {
    match ron::ser::to_string(&Output::from(snapshot)) {
        Ok(line) => {
            output.write_all(line.as_bytes())?;
            output.write_all(b"\n")?;
            output.flush()
        }
        Err(why) => {
            error!("failed to serialize: {}", why);
            Ok(())
        }
    }
}
