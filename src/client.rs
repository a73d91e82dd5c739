// Copyright 2021-2022 System76 <info@system76.com>
// SPDX-License-Identifier: MPL-2.0

use crate::{CancellationHandle, FetchRequest, RawResponse, Transport, TransportError};
use futures::future::{BoxFuture, FutureExt};
use futures::stream::StreamExt;
use std::io;

#[cfg(feature = "isahc")]
use isahc::{AsyncBody, HttpClient as IsahcClient};
#[cfg(feature = "reqwest")]
use reqwest::Client as ReqwestClient;

/// The HTTP client used to perform requests.
///
/// Each request is sent exactly once. Cloning shares the underlying connection pool.
#[derive(Clone)]
pub enum Client {
    #[cfg(feature = "isahc")]
    Isahc(IsahcClient),
    #[cfg(feature = "reqwest")]
    Reqwest(ReqwestClient),
}

#[cfg(feature = "reqwest")]
impl Default for Client {
    fn default() -> Self {
        Client::Reqwest(ReqwestClient::new())
    }
}

impl Transport for Client {
    fn perform(
        &self,
        request: FetchRequest,
        handle: CancellationHandle,
    ) -> BoxFuture<'static, Result<RawResponse, TransportError>> {
        if handle.is_cancelled() {
            return futures::future::ready(Err(TransportError::Canceled)).boxed();
        }

        match self {
            #[cfg(feature = "isahc")]
            Client::Isahc(client) => perform_isahc(client.clone(), request).boxed(),
            #[cfg(feature = "reqwest")]
            Client::Reqwest(client) => perform_reqwest(client.clone(), request).boxed(),
        }
    }
}

#[cfg(feature = "reqwest")]
async fn perform_reqwest(
    client: ReqwestClient,
    request: FetchRequest,
) -> Result<RawResponse, TransportError> {
    let FetchRequest { uri, method, body } = request;

    let mut builder = client.request(method, &*uri);

    if let Some(body) = body {
        builder = builder.body(body);
    }

    let response = builder.send().await?;
    let status = response.status();
    let reason = reason_phrase(&response);

    debug!("{} responded with {}", uri, status);

    let body = response
        .bytes_stream()
        .map(|chunk| chunk.map_err(|why| io::Error::new(io::ErrorKind::Other, why)))
        .boxed();

    let mut response = RawResponse::new(status, body);

    if let Some(reason) = reason {
        response.status_text = reason;
    }

    Ok(response)
}

/// The reason phrase sent by the server, when it differs from the canonical one.
#[cfg(feature = "reqwest")]
fn reason_phrase(response: &reqwest::Response) -> Option<Box<str>> {
    let reason = response.extensions().get::<hyper::ext::ReasonPhrase>()?;
    Some(String::from_utf8_lossy(reason.as_bytes()).into())
}

#[cfg(feature = "isahc")]
async fn perform_isahc(
    client: IsahcClient,
    request: FetchRequest,
) -> Result<RawResponse, TransportError> {
    use futures::io::AsyncReadExt;

    let FetchRequest { uri, method, body } = request;

    let body = match body {
        Some(body) => AsyncBody::from(body.to_vec()),
        None => AsyncBody::empty(),
    };

    let request = http::Request::builder()
        .method(method)
        .uri(&*uri)
        .body(body)
        .map_err(TransportError::InvalidRequest)?;

    let response = client.send_async(request).await?;
    let status = response.status();

    debug!("{} responded with {}", uri, status);

    let body = futures::stream::try_unfold(response.into_body(), |mut body| async move {
        let mut buffer = vec![0u8; 8 * 1024];
        let read = body.read(&mut buffer).await?;

        if read == 0 {
            return Ok::<_, io::Error>(None);
        }

        buffer.truncate(read);
        Ok(Some((bytes::Bytes::from(buffer), body)))
    })
    .boxed();

    Ok(RawResponse::new(status, body))
}
