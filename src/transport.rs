// Copyright 2021-2022 System76 <info@system76.com>
// SPDX-License-Identifier: MPL-2.0

use crate::CancellationHandle;
use bytes::Bytes;
use futures::future::{self, BoxFuture};
use futures::stream::{self, Stream, StreamExt};
use http::{Method, StatusCode};
use std::fmt;
use std::io;
use std::pin::Pin;

/// A stream of chunks from a response body.
pub type Body = Pin<Box<dyn Stream<Item = io::Result<Bytes>> + Send + 'static>>;

/// An error from the transport performing a request.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("task was canceled")]
    Canceled,
    #[cfg(feature = "isahc")]
    #[error("http client error: {}", _0)]
    IsahcClient(#[source] isahc::Error),
    #[cfg(feature = "reqwest")]
    #[error("http client error: {}", _0)]
    ReqwestClient(#[source] reqwest::Error),
    #[error("invalid request: {}", _0)]
    InvalidRequest(#[source] http::Error),
    #[error("{}", _0)]
    Other(Box<str>),
}

#[cfg(feature = "isahc")]
impl From<isahc::Error> for TransportError {
    fn from(e: isahc::Error) -> Self {
        Self::IsahcClient(e)
    }
}

#[cfg(feature = "reqwest")]
impl From<reqwest::Error> for TransportError {
    fn from(e: reqwest::Error) -> Self {
        Self::ReqwestClient(e)
    }
}

/// A request to be issued by a coordinator.
#[derive(Clone, Debug, Setters)]
pub struct FetchRequest {
    /// The URI of the resource.
    #[setters(skip)]
    pub uri: Box<str>,

    /// Defaults to `GET`.
    pub method: Method,

    /// Payload sent with the request.
    #[setters(into)]
    #[setters(strip_option)]
    pub body: Option<Bytes>,
}

impl FetchRequest {
    pub fn new(uri: impl Into<Box<str>>) -> Self {
        Self {
            uri: uri.into(),
            method: Method::GET,
            body: None,
        }
    }
}

impl From<&str> for FetchRequest {
    fn from(uri: &str) -> Self {
        Self::new(uri)
    }
}

impl From<String> for FetchRequest {
    fn from(uri: String) -> Self {
        Self::new(uri)
    }
}

/// A response whose body has not been read yet.
pub struct RawResponse {
    pub status: StatusCode,
    pub status_text: Box<str>,
    pub body: Body,
}

impl RawResponse {
    /// Creates a response described by the canonical reason of its status code.
    pub fn new(status: StatusCode, body: Body) -> Self {
        Self {
            status,
            status_text: status.canonical_reason().unwrap_or("").into(),
            body,
        }
    }

    /// Creates a response whose body is already in memory.
    pub fn from_bytes(status: StatusCode, body: impl Into<Bytes>) -> Self {
        let body = stream::once(future::ready(Ok(body.into()))).boxed();
        Self::new(status, body)
    }
}

impl fmt::Debug for RawResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RawResponse")
            .field("status", &self.status)
            .field("status_text", &self.status_text)
            .finish()
    }
}

/// Performs the network operation of a request.
///
/// The handle is cancelled when the request is superseded, cancelled, or its
/// coordinator unmounts. Implementations may watch it to stop early; the coordinator
/// stops waiting on the returned future once it is cancelled either way.
pub trait Transport: Send + Sync + 'static {
    fn perform(
        &self,
        request: FetchRequest,
        handle: CancellationHandle,
    ) -> BoxFuture<'static, Result<RawResponse, TransportError>>;
}
