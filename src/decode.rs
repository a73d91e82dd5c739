// Copyright 2021-2022 System76 <info@system76.com>
// SPDX-License-Identifier: MPL-2.0

use crate::{Body, Data};
use bytes::BytesMut;
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use std::io;

/// How a coordinator decodes the bodies of successful responses.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum BodyFormat {
    Json,
    Text,
    Blob,
}

impl Default for BodyFormat {
    fn default() -> Self {
        BodyFormat::Json
    }
}

/// An error from reading or decoding a response body.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("network input error: {}", _0)]
    Read(#[source] io::Error),
    #[error("invalid JSON body: {}", _0)]
    Json(#[from] serde_json::Error),
}

/// Reads the whole body and decodes it as `format`.
pub async fn decode(body: Body, format: BodyFormat) -> Result<Data, DecodeError> {
    let bytes = read_body(body).await?;

    let data = match format {
        BodyFormat::Json => Data::Json(serde_json::from_slice(&bytes)?),
        BodyFormat::Text => Data::Text(String::from_utf8_lossy(&bytes).into_owned()),
        BodyFormat::Blob => Data::Blob(bytes.freeze()),
    };

    Ok(data)
}

async fn read_body(mut body: Body) -> Result<BytesMut, DecodeError> {
    let mut buffer = BytesMut::new();

    while let Some(chunk) = body.next().await {
        buffer.extend_from_slice(&chunk.map_err(DecodeError::Read)?);
    }

    Ok(buffer)
}
