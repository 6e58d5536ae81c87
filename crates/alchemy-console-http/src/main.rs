use std::convert::Infallible;
use std::io;
use std::pin::pin;
use std::sync::Arc;
use std::time::Duration;

use alchemy_console::{ConsoleConfig, ConsoleHttp, GraphqlSubmitter};
use http_body_util::{BodyExt, Full, LengthLimitError, Limited};
use hyper::body::{Body, Bytes, Incoming};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use hyper_util::server::graceful::GracefulShutdown;
use tokio::signal::unix::{SignalKind, signal};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

type Handler = ConsoleHttp<GraphqlSubmitter>;

/// Largest request body accepted; events and drafts are far smaller.
const MAX_BODY_BYTES: usize = 64 * 1024;

/// Pause after a failed accept so a full fd table does not spin the loop.
const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

async fn handle(
    req: Request<Incoming>,
    handler: Arc<Handler>,
) -> Result<Response<Full<Bytes>>, Infallible> {
    let (parts, body) = req.into_parts();
    let body_bytes = match read_body(body).await {
        Ok(bytes) => bytes,
        Err(status) => return Ok(error_response(status)),
    };
    let http_req = Request::from_parts(parts, body_bytes);

    // Submits block on the backend call, keep them off the reactor.
    let http_resp = match tokio::task::spawn_blocking(move || handler.handle(http_req)).await {
        Ok(resp) => resp,
        Err(e) => {
            error!(error = %e, "request handler panicked");
            return Ok(error_response(StatusCode::INTERNAL_SERVER_ERROR));
        }
    };

    let (parts, body_bytes) = http_resp.into_parts();
    Ok(Response::from_parts(
        parts,
        Full::new(Bytes::from(body_bytes)),
    ))
}

async fn read_body<B>(body: B) -> Result<Vec<u8>, StatusCode>
where
    B: Body,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    match Limited::new(body, MAX_BODY_BYTES).collect().await {
        Ok(collected) => Ok(collected.to_bytes().to_vec()),
        Err(e) if e.is::<LengthLimitError>() => Err(StatusCode::PAYLOAD_TOO_LARGE),
        Err(e) => {
            warn!(error = %e, "failed to read request body");
            Err(StatusCode::BAD_REQUEST)
        }
    }
}

fn error_response(status: StatusCode) -> Response<Full<Bytes>> {
    let message = status.canonical_reason().unwrap_or("error").to_ascii_lowercase();
    let body = format!(r#"{{"error":"{message}"}}"#);
    let mut resp = Response::new(Full::new(Bytes::from(body)));
    *resp.status_mut() = status;
    resp.headers_mut().insert(
        hyper::header::CONTENT_TYPE,
        hyper::header::HeaderValue::from_static("application/json"),
    );
    resp
}

/// The stream of a successful accept. Failures such as EMFILE are logged and
/// the listener keeps going.
fn accepted<S, A>(result: io::Result<(S, A)>) -> Option<S> {
    match result {
        Ok((stream, _)) => Some(stream),
        Err(e) => {
            warn!(error = %e, "failed to accept connection");
            None
        }
    }
}

async fn shutdown_signal() {
    let mut sigterm = signal(SignalKind::terminate()).expect("failed to register SIGTERM handler");
    tokio::select! {
        _ = sigterm.recv() => {}
        _ = tokio::signal::ctrl_c() => {}
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = ConsoleConfig::from_env().unwrap_or_else(|e| {
        error!("{e}");
        std::process::exit(1);
    });

    info!(
        graphql_url = %config.graphql_url,
        level = %config.collection_level,
        timeout_secs = config.submit_timeout_secs,
        "starting alchemy-console"
    );

    let submitter = GraphqlSubmitter::new(config.graphql_url.clone(), config.submit_timeout());
    let handler = Arc::new(ConsoleHttp::new(submitter, config.collection_level));

    let bind_addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .unwrap_or_else(|e| {
            error!("failed to bind {bind_addr}: {e}");
            std::process::exit(1);
        });

    info!("listening on {bind_addr}");

    let http = http1::Builder::new();
    let graceful = GracefulShutdown::new();
    let mut signal = pin!(shutdown_signal());

    loop {
        tokio::select! {
            result = listener.accept() => {
                let Some(stream) = accepted(result) else {
                    tokio::time::sleep(ACCEPT_BACKOFF).await;
                    continue;
                };
                let io = TokioIo::new(stream);
                let handler = Arc::clone(&handler);
                let conn = http.serve_connection(io, service_fn(move |req| {
                    let handler = Arc::clone(&handler);
                    handle(req, handler)
                }));
                let fut = graceful.watch(conn);
                tokio::spawn(async move {
                    if let Err(e) = fut.await {
                        warn!(error = %e, "connection error");
                    }
                });
            }
            _ = &mut signal => {
                info!("shutdown signal received");
                drop(listener);
                break;
            }
        }
    }

    tokio::select! {
        _ = graceful.shutdown() => {
            info!("shutdown complete");
        }
        _ = tokio::time::sleep(Duration::from_secs(10)) => {
            warn!("shutdown timed out after 10s");
        }
    }
}
