// Copyright 2021-2022 System76 <info@system76.com>
// SPDX-License-Identifier: MPL-2.0

use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// Status code of the outcome recorded when a request is aborted by the client.
pub const ABORTED_STATUS_CODE: u16 = 230;

/// Status text of the outcome recorded when a request is aborted by the client.
pub const ABORTED_STATUS_TEXT: &str = "Client aborted the request.";

/// Status code recorded when a request fails before a response could be read.
pub const NETWORK_ERROR_STATUS_CODE: u16 = 500;

/// The position of a coordinator in its request lifecycle.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub enum Status {
    /// No request is in flight.
    Idle,
    /// Exactly one request is in flight.
    Busy,
    /// The last request failed, either with an HTTP error or a network error.
    Error,
    /// The last request was aborted by the client.
    Aborted,
}

impl Status {
    pub fn is_busy(self) -> bool {
        self == Status::Busy
    }
}

impl Default for Status {
    fn default() -> Self {
        Status::Idle
    }
}

/// A response body, decoded according to the coordinator's `BodyFormat`.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub enum Data {
    Json(serde_json::Value),
    Text(String),
    Blob(Bytes),
}

/// The result of a completed, failed, or aborted request.
///
/// Outcomes are never merged: each committed outcome replaces the previous one.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct RequestOutcome {
    /// The decoded body. Only present for successful responses.
    pub data: Option<Data>,
    pub status_code: u16,
    pub status_text: Box<str>,
}

impl RequestOutcome {
    pub fn new(data: Option<Data>, status_code: u16, status_text: impl Into<Box<str>>) -> Self {
        Self {
            data,
            status_code,
            status_text: status_text.into(),
        }
    }

    /// The sentinel outcome recorded for a request aborted by the client.
    pub fn aborted() -> Self {
        Self::new(None, ABORTED_STATUS_CODE, ABORTED_STATUS_TEXT)
    }

    /// An outcome for a request which failed without a usable response.
    pub fn network_error(why: impl Display) -> Self {
        Self::new(None, NETWORK_ERROR_STATUS_CODE, why.to_string())
    }

    /// Deserializes the body into `T`.
    ///
    /// Text and blob bodies are parsed as JSON. Returns `None` when there is no body.
    pub fn json<T: DeserializeOwned>(&self) -> Option<Result<T, serde_json::Error>> {
        let result = match self.data.as_ref()? {
            Data::Json(value) => T::deserialize(value),
            Data::Text(text) => serde_json::from_str(text),
            Data::Blob(blob) => serde_json::from_slice(blob),
        };

        Some(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Point {
        x: i32,
    }

    #[test]
    fn aborted_sentinel() {
        let outcome = RequestOutcome::aborted();
        assert_eq!(outcome.data, None);
        assert_eq!(outcome.status_code, 230);
        assert_eq!(&*outcome.status_text, "Client aborted the request.");
    }

    #[test]
    fn typed_json_access() {
        let outcome = RequestOutcome::new(
            Some(Data::Json(serde_json::json!({ "x": 1 }))),
            200,
            "OK",
        );

        assert_eq!(outcome.json::<Point>().unwrap().unwrap(), Point { x: 1 });

        let text = RequestOutcome::new(Some(Data::Text("{\"x\":7}".into())), 200, "OK");
        assert_eq!(text.json::<Point>().unwrap().unwrap(), Point { x: 7 });

        assert!(RequestOutcome::aborted().json::<Point>().is_none());
    }
}
