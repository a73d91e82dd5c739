// Copyright 2021-2022 System76 <info@system76.com>
// SPDX-License-Identifier: MPL-2.0

use bytes::BytesMut;
use futures::prelude::*;
use serde::Deserialize;
use std::io;
use tokio::io::AsyncRead;
use tokio_util::codec::{Decoder, FramedRead};

#[derive(Debug, Error)]
pub enum InputError {
    #[error("decoder error")]
    Decoder {
        input: Box<str>,
        source: ron::error::SpannedError,
    },
    #[error("read error")]
    Read(#[from] io::Error),
}

/// A command from the embedding component, one per line.
#[derive(Debug, Deserialize, PartialEq)]
pub enum Command {
    Fetch(String),
    Cancel,
    Mount,
    Unmount,
}

#[derive(Default)]
struct Commands;

impl Commands {
    fn parse(line: &[u8]) -> Result<Command, InputError> {
        ron::de::from_bytes::<Command>(line).map_err(|source| InputError::Decoder {
            input: String::from_utf8_lossy(line).into_owned().into(),
            source,
        })
    }
}

impl Decoder for Commands {
    type Error = InputError;
    type Item = Command;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        while let Some(newline) = src.iter().position(|&byte| byte == b'\n') {
            let line = src.split_to(newline + 1);
            let line = &line[..newline];

            if line.iter().all(u8::is_ascii_whitespace) {
                continue;
            }

            return Self::parse(line).map(Some);
        }

        Ok(None)
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if let Some(command) = self.decode(src)? {
            return Ok(Some(command));
        }

        let line = src.split();

        if line.iter().all(u8::is_ascii_whitespace) {
            return Ok(None);
        }

        Self::parse(&line).map(Some)
    }
}

/// Commands parsed from `input`. Lines which fail to parse are reported and skipped.
pub fn stream(
    input: impl AsyncRead + Send + Unpin + 'static,
) -> impl Stream<Item = Command> + Send + Unpin {
    FramedRead::new(input, Commands::default())
        .filter_map(|result| async move {
            match result {
                Ok(command) => Some(command),
                Err(InputError::Read(why)) => {
                    error!("read error: {}", why);
                    None
                }
                Err(InputError::Decoder { input, source }) => {
                    error!("parsing error: {}\n    caused by input: {}", source, input);
                    None
                }
            }
        })
        .boxed()
}
