//! Test utilities for running a local stand-in for the PagerDuty API.
//!
//! The server hands every request, with its body collected, to a shared
//! handler so tests can script responses and record what the client sent.

use assert_cmd::prelude::*;
use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::{Request, Response, StatusCode, body::Incoming, service::service_fn};
use hyper_util::{rt::TokioExecutor, server::conn::auto};
use std::io::ErrorKind;
use std::{
    collections::VecDeque,
    net::SocketAddr,
    path::Path,
    process::Command,
    sync::{Arc, Mutex},
};
use tokio::{net::TcpListener, sync::oneshot, task::JoinHandle};

/// Shared handler invoked for each incoming request.
pub type Handler = Arc<Mutex<Box<dyn FnMut(&Request<Bytes>) -> Response<Full<Bytes>> + Send>>>;

/// What the server saw of one request.
#[derive(Debug, Clone)]
pub struct Seen {
    pub method: String,
    pub path: String,
    pub query: String,
    pub headers: hyper::HeaderMap,
    pub body: Bytes,
}

#[allow(dead_code, reason = "used only in some tests")]
impl Seen {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn json(&self) -> serde_json::Value {
        serde_json::from_slice(&self.body).expect("request body is JSON")
    }
}

/// Handle returned by [`start_mitm`] for shutting down the server.
pub struct ShutdownHandle {
    join: JoinHandle<()>,
    stop: oneshot::Sender<()>,
}

impl ShutdownHandle {
    /// Signal the server to stop and await shutdown.
    pub async fn shutdown(self) {
        let _ = self.stop.send(());
        let _ = self.join.await;
    }
}

/// Start an HTTP server forwarding requests to a shared handler.
///
/// # Errors
///
/// Returns an error if the server fails to bind to a local port.
///
/// # Panics
///
/// Panics if the default response cannot be constructed.
#[expect(
    clippy::integer_division_remainder_used,
    reason = "tokio::select! uses % internally"
)]
pub async fn start_mitm() -> Result<(SocketAddr, Handler, ShutdownHandle), std::io::Error> {
    let handler: Handler = Arc::new(Mutex::new(Box::new(|_req| {
        Response::builder()
            .status(404)
            .body(Full::from("No handler"))
            .expect("failed to create default response")
    })));
    let handler_clone = handler.clone();

    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let (tx, mut rx) = oneshot::channel();

    let join = tokio::spawn(async move {
        let builder = auto::Builder::new(TokioExecutor::new());
        loop {
            tokio::select! {
                res = listener.accept() => match res {
                    Ok((stream, _)) => {
                        let io = hyper_util::rt::TokioIo::new(stream);
                        let h = handler_clone.clone();
                        let service = service_fn(move |req: Request<Incoming>| {
                            let h = h.clone();
                            async move {
                                let (parts, body) = req.into_parts();
                                let bytes = body.collect().await.map(|b| b.to_bytes()).unwrap_or_default();
                                let req = Request::from_parts(parts, bytes);
                                let mut f = h.lock().expect("lock handler in service");
                                let resp = (f)(&req);
                                Ok::<_, std::convert::Infallible>(resp)
                            }
                        });
                        let builder = builder.clone();
                        tokio::spawn(async move {
                            let _ = builder.serve_connection(io, service).await;
                        });
                    }
                    Err(e) => {
                        eprintln!("accept error: {e}");
                        match e.kind() {
                            ErrorKind::ConnectionAborted
                            | ErrorKind::ConnectionReset
                            | ErrorKind::Interrupted
                            | ErrorKind::WouldBlock => {}
                            _ => break,
                        }
                    }
                },
                _ = &mut rx => break,
            }
        }
    });

    Ok((addr, handler, ShutdownHandle { join, stop: tx }))
}

/// Build a JSON response with `status`.
///
/// # Panics
///
/// Panics if the response cannot be built.
#[must_use]
pub fn json_response(status: u16, body: impl Into<Bytes>) -> Response<Full<Bytes>> {
    Response::builder()
        .status(StatusCode::from_u16(status).expect("valid status"))
        .header("Content-Type", "application/json")
        .body(Full::new(body.into()))
        .expect("build response")
}

/// Reply with `replies` in order, recording every request in the returned
/// log. The last reply repeats once the queue is drained.
///
/// # Panics
///
/// Panics if `replies` is empty.
#[allow(dead_code, reason = "helper used in some tests only")]
pub fn set_sequential_responder(
    handler: &Handler,
    replies: Vec<(u16, String)>,
) -> Arc<Mutex<Vec<Seen>>> {
    assert!(!replies.is_empty(), "at least one reply");
    let seen = Arc::new(Mutex::new(Vec::new()));
    let log = Arc::clone(&seen);
    let mut queue = VecDeque::from(replies);
    *handler.lock().expect("lock handler") = Box::new(move |req: &Request<Bytes>| {
        log.lock().expect("lock seen").push(Seen {
            method: req.method().to_string(),
            path: req.uri().path().to_string(),
            query: req.uri().query().unwrap_or_default().to_string(),
            headers: req.headers().clone(),
            body: req.body().clone(),
        });
        let (status, body) = if queue.len() > 1 {
            queue.pop_front().expect("reply")
        } else {
            queue.front().cloned().expect("reply")
        };
        json_response(status, body)
    });
    seen
}

/// Create a `pagerduty` command pointed at the local server.
///
/// `config_home` isolates XDG lookups from the developer's own files.
#[allow(
    clippy::missing_panics_doc,
    clippy::must_use_candidate,
    dead_code,
    reason = "helper for integration tests"
)]
pub fn pagerduty_cmd(addr: SocketAddr, config_home: &Path) -> Command {
    let mut cmd = Command::cargo_bin("pagerduty").expect("binary");
    cmd.env("PAGERDUTY_BASE_URL", format!("http://{addr}"))
        .env("PAGERDUTY_TOKEN", "dummy")
        .env("PAGERDUTY_RETRY_DELAY", "0")
        .env("XDG_CONFIG_HOME", config_home)
        .env_remove("PAGERDUTY_PROFILE")
        .env_remove("PAGERDUTY_DEBUG_LOG");
    cmd
}
