//! HTTP server glue.
//!
//! Binds a TCP listener and serves http1 connections, one tokio task per
//! connection. Each request body is collected into memory and handed to
//! `CacheProxy::handle`; the engine itself never streams.

use bytes::Bytes;
use http::{Request, Response, StatusCode};
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;

use crate::error::ProxyError;
use crate::proxy::CacheProxy;

/// Bind the listener and serve connections until the process is stopped.
pub async fn run(addr: SocketAddr, proxy: Arc<CacheProxy>) -> Result<(), ProxyError> {
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|err| ProxyError::Config(format!("failed to bind {}: {}", addr, err)))?;

    tracing::info!(address = %addr, "listening");

    loop {
        let (stream, peer) = match listener.accept().await {
            Ok(accepted) => accepted,
            Err(err) => {
                tracing::warn!(error = %err, "failed to accept connection");
                continue;
            }
        };

        let proxy = proxy.clone();
        tokio::spawn(async move {
            let io = TokioIo::new(stream);
            let service = service_fn(move |req: Request<Incoming>| {
                let proxy = proxy.clone();
                async move { Ok::<_, Infallible>(serve_request(&proxy, req).await.map(Full::new)) }
            });

            if let Err(err) = http1::Builder::new().serve_connection(io, service).await {
                tracing::debug!(peer = %peer, error = %err, "connection closed with error");
            }
        });
    }
}

/// Collect the inbound body and delegate to the proxy.
async fn serve_request(proxy: &CacheProxy, req: Request<Incoming>) -> Response<Bytes> {
    let (parts, body) = req.into_parts();
    let body = match body.collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(err) => {
            tracing::warn!(error = %err, "failed to read request body");
            let mut response = Response::new(Bytes::from_static(b"Failed to read request body"));
            *response.status_mut() = StatusCode::BAD_REQUEST;
            return response;
        }
    };

    proxy.handle(Request::from_parts(parts, body)).await
}
