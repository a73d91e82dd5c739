use bytes::Bytes;
use fetch_coordinator::{
    Body, CancellationHandle, FetchRequest, RawResponse, Transport, TransportError,
};
use futures::future::{BoxFuture, FutureExt};
use futures::stream::{self, StreamExt};
use http::StatusCode;
use std::collections::HashMap;
use std::io;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::oneshot;

pub type Reply = Result<RawResponse, TransportError>;

/// A transport whose replies are scripted per URI by the test.
#[derive(Default)]
pub struct ScriptedTransport {
    pending: Mutex<HashMap<Box<str>, oneshot::Receiver<Reply>>>,
    calls: AtomicUsize,
}

impl ScriptedTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Registers the next request for `uri`, returning the sender that resolves it.
    pub fn expect(&self, uri: &str) -> Responder {
        let (tx, rx) = oneshot::channel();
        self.pending.lock().unwrap().insert(uri.into(), rx);
        Responder(tx)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Transport for ScriptedTransport {
    fn perform(
        &self,
        request: FetchRequest,
        _handle: CancellationHandle,
    ) -> BoxFuture<'static, Reply> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let reply = self.pending.lock().unwrap().remove(&request.uri);

        async move {
            match reply {
                Some(reply) => match reply.await {
                    Ok(reply) => reply,
                    Err(_) => Err(TransportError::Other("reply dropped".into())),
                },
                None => Err(TransportError::Other("unexpected request".into())),
            }
        }
        .boxed()
    }
}

pub struct Responder(oneshot::Sender<Reply>);

impl Responder {
    pub fn respond(self, status: StatusCode, body: &'static str) {
        let _ = self.0.send(Ok(RawResponse::from_bytes(status, body)));
    }

    pub fn respond_with(self, response: RawResponse) {
        let _ = self.0.send(Ok(response));
    }

    pub fn fail(self, error: TransportError) {
        let _ = self.0.send(Err(error));
    }
}

/// A body whose single chunk is held back until released.
///
/// The receiver resolves once the body is first polled. Dropping the sender ends
/// the body with a read error.
pub fn gated_body() -> (Body, oneshot::Receiver<()>, oneshot::Sender<Bytes>) {
    let (polled_tx, polled_rx) = oneshot::channel();
    let (chunk_tx, chunk_rx) = oneshot::channel::<Bytes>();

    let body = stream::once(async move {
        let _ = polled_tx.send(());
        chunk_rx
            .await
            .map_err(|_| io::Error::new(io::ErrorKind::UnexpectedEof, "body released"))
    })
    .boxed();

    (body, polled_rx, chunk_tx)
}

/// Canned responses served by `launch_server`, by path.
pub const ROUTES: &[(&str, &str, &str)] = &[
    ("/item", "200 OK", r#"{"x":1}"#),
    ("/missing", "404 Not Found", r#"{"error":"missing"}"#),
    ("/fishing", "404 Gone Fishing", ""),
];

/// Serves `ROUTES` over HTTP/1.1 on a local port, one response per connection.
pub async fn launch_server() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("failed to bind test server");
    let address = listener.local_addr().expect("test server has no address");

    tokio::spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            tokio::spawn(serve(stream));
        }
    });

    address
}

async fn serve(mut stream: TcpStream) {
    let mut request = Vec::new();
    let mut buffer = [0u8; 1024];

    while !request.windows(4).any(|window| window == b"\r\n\r\n") {
        match stream.read(&mut buffer).await {
            Ok(0) | Err(_) => return,
            Ok(read) => request.extend_from_slice(&buffer[..read]),
        }
    }

    let request = String::from_utf8_lossy(&request);
    let path = request.split_whitespace().nth(1).unwrap_or("/");

    let (status, body) = ROUTES
        .iter()
        .find(|(route, _, _)| *route == path)
        .map(|(_, status, body)| (*status, *body))
        .unwrap_or(("404 Not Found", ""));

    let response = format!(
        "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status,
        body.len(),
        body
    );

    let _ = stream.write_all(response.as_bytes()).await;
    let _ = stream.shutdown().await;
}
