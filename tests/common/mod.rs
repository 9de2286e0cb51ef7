//! Shared utilities for integration testing.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::time::Duration;

use axum::{
    body::Bytes,
    extract::Path,
    http::{header, HeaderMap, Method, StatusCode, Uri},
    routing::{any, get},
    Json, Router,
};
use serde_json::{json, Value};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use ajax_dispatch::config::{DispatcherSettings, TransportKind};
use ajax_dispatch::Dispatcher;

/// Settings using only `kind`, bypassing any system proxy.
pub fn settings(kind: TransportKind) -> DispatcherSettings {
    let mut settings = DispatcherSettings::default();
    settings.transports = vec![kind];
    settings.http.use_system_proxy = false;
    settings.http.request_timeout_secs = Some(10);
    settings
}

pub fn dispatcher(kind: TransportKind) -> Dispatcher {
    Dispatcher::new(settings(kind)).unwrap()
}

/// Start a backend that echoes requests back as JSON.
///
/// Routes:
/// - `/echo`: method, query, body and selected headers
/// - `/status/{code}`: replies with `code`
/// - `/text-json`: JSON text served as text/plain
/// - `/login`: sets a `session` cookie
pub async fn start_echo_backend() -> SocketAddr {
    let app = Router::new()
        .route("/echo", any(echo))
        .route("/status/{code}", any(status))
        .route("/text-json", get(|| async { ([(header::CONTENT_TYPE, "text/plain")], "{\"ok\":true}") }))
        .route(
            "/login",
            get(|| async { ([(header::SET_COOKIE, "session=abc; Path=/")], "logged in") }),
        );

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    addr
}

async fn echo(method: Method, uri: Uri, headers: HeaderMap, body: Bytes) -> Json<Value> {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string)
    };
    Json(json!({
        "method": method.as_str(),
        "query": uri.query(),
        "body": String::from_utf8_lossy(&body),
        "content_type": header("content-type"),
        "authorization": header("authorization"),
        "x_trace": header("x-trace"),
        "cookie": header("cookie"),
    }))
}

async fn status(Path(code): Path<u16>) -> (StatusCode, &'static str) {
    let status = StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, "status reply")
}

/// Start a raw backend replying with a fixed status line and body.
pub async fn start_raw_backend(status_line: &'static str, body: &'static str) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    tokio::spawn(async move {
                        let mut buf = [0u8; 4096];
                        let _ = socket.read(&mut buf).await;
                        let response = format!(
                            "HTTP/1.1 {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                            status_line,
                            body.len(),
                            body
                        );
                        let _ = socket.write_all(response.as_bytes()).await;
                        let _ = socket.shutdown().await;
                        tokio::time::sleep(Duration::from_millis(10)).await;
                    });
                }
                Err(_) => break,
            }
        }
    });
    addr
}
