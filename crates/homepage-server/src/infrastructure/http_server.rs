//! HTTP server: accept loop and request router.
//!
//! This module is responsible for:
//!
//! 1. Binding a TCP listener on the configured address.
//! 2. Accepting incoming connections and serving each one with hyper's
//!    HTTP/1 connection driver in its own Tokio task.
//! 3. Running every request through the gate, then dispatching it to the
//!    matching [`SiteService`] use case.
//! 4. Gracefully shutting down when the `running` flag is cleared.
//!
//! # Routes
//!
//! | Method | Path          | Gated | Response                               |
//! |--------|---------------|-------|----------------------------------------|
//! | GET    | `/`           | no    | home view                              |
//! | GET    | `/config`     | yes   | settings view, or verification view    |
//! | POST   | `/api/verify` | no    | envelope + `Set-Cookie` on success     |
//! | POST   | `/api/config` | yes   | envelope; document written wholesale   |
//! | GET    | `/api/file`   | yes   | raw document as a JSON attachment      |
//!
//! Anything else is a 404 envelope (405 for a known path with the wrong
//! method).

use std::convert::Infallible;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::Duration;

use anyhow::Context;
use http_body_util::{BodyExt, Full, LengthLimitError, Limited};
use hyper::body::{Body, Bytes};
use hyper::header::{HeaderValue, CONTENT_DISPOSITION, CONTENT_TYPE, COOKIE, LOCATION, SET_COOKIE};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use serde::Serialize;
use tokio::net::TcpListener;
use tokio::time::timeout;
use tracing::{debug, error, info, info_span, Instrument};
use uuid::Uuid;

use homepage_core::gate::policy::{ACCESS_COOKIE, VERIFY_PATH, VERIFY_QUERY};
use homepage_core::GateDecision;

use crate::application::{unix_now, ConfigRepository, ServiceError, SiteService, StoreError};
use crate::domain::messages::{MSG_METHOD_NOT_ALLOWED, MSG_NOT_FOUND, MSG_UNAUTHORIZED};
use crate::domain::{ApiResponse, ServerConfig};
use crate::infrastructure::cookies::{access_cookie, read_cookie};
use crate::infrastructure::store::FileConfigStore;

/// Largest request body accepted (1 MiB).
pub const MAX_BODY_BYTES: usize = 1024 * 1024;

/// How often the accept loop wakes up to check the shutdown flag.
const ACCEPT_POLL: Duration = Duration::from_millis(200);

const HOME_PATH: &str = "/";
const VERIFY_API_PATH: &str = "/api/verify";
const CONFIG_API_PATH: &str = "/api/config";
const FILE_API_PATH: &str = "/api/file";

const JSON: &str = "application/json";
const DOWNLOAD_DISPOSITION: &str = "attachment; filename=\"config.json\"";

// ── Public API ────────────────────────────────────────────────────────────────

/// Binds `config.bind_addr` and serves requests until `running` is cleared.
///
/// # Errors
///
/// Returns an error if the listener cannot be bound (port in use, missing
/// permission).
pub async fn run_server(config: ServerConfig, running: Arc<AtomicBool>) -> anyhow::Result<()> {
    let listener = TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind HTTP listener on {}", config.bind_addr))?;

    info!(
        "homepage server listening on http://{} (config: {}, gate: {}, password {})",
        config.bind_addr,
        config.config_path().display(),
        config.gate_mode,
        if config.password.is_some() { "set" } else { "not set" },
    );

    let store = FileConfigStore::from_config(&config);
    let service = Arc::new(SiteService::from_config(store, &config));

    serve(listener, service, running).await
}

/// Runs the accept loop on an already-bound listener.
///
/// Split out of [`run_server`] so tests can bind port 0 and inject their own
/// repository.
pub async fn serve<R>(
    listener: TcpListener,
    service: Arc<SiteService<R>>,
    running: Arc<AtomicBool>,
) -> anyhow::Result<()>
where
    R: ConfigRepository + 'static,
{
    loop {
        if !running.load(Ordering::Relaxed) {
            info!("shutdown flag set; stopping accept loop");
            break;
        }

        // Short timeout so the flag is re-checked even when nobody connects.
        match timeout(ACCEPT_POLL, listener.accept()).await {
            Ok(Ok((stream, peer_addr))) => {
                debug!("connection from {peer_addr}");
                let service = Arc::clone(&service);

                tokio::spawn(async move {
                    let io = TokioIo::new(stream);
                    let handler = service_fn(move |req| {
                        let service = Arc::clone(&service);
                        async move { Ok::<_, Infallible>(route(&service, req).await) }
                    });

                    if let Err(e) = http1::Builder::new().serve_connection(io, handler).await {
                        debug!("connection {peer_addr} closed with error: {e}");
                    }
                });
            }
            Ok(Err(e)) => {
                // Transient (e.g. too many open files); keep serving.
                error!("accept error: {e}");
            }
            Err(_) => {}
        }
    }

    Ok(())
}

/// Handles one request end to end: gate, dispatch, response.
///
/// Never fails; every error becomes an envelope with `success: false`.
pub async fn route<R, B>(service: &SiteService<R>, req: Request<B>) -> Response<Full<Bytes>>
where
    R: ConfigRepository,
    B: Body,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let span = info_span!(
        "request",
        id = %Uuid::new_v4(),
        method = %req.method(),
        path = %req.uri().path(),
    );
    dispatch(service, req).instrument(span).await
}

// ── Dispatch ──────────────────────────────────────────────────────────────────

async fn dispatch<R, B>(service: &SiteService<R>, req: Request<B>) -> Response<Full<Bytes>>
where
    R: ConfigRepository,
    B: Body,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let (parts, body) = req.into_parts();
    let path = parts.uri.path();
    let now = unix_now();
    debug!("handling request");

    let token = parts
        .headers
        .get(COOKIE)
        .and_then(|value| value.to_str().ok())
        .and_then(|header| read_cookie(header, ACCESS_COOKIE));

    match service.authorize(path, token, now) {
        GateDecision::Pass => {}
        GateDecision::RedirectHome => return redirect(HOME_PATH),
        GateDecision::Deny => {
            return envelope(
                StatusCode::UNAUTHORIZED,
                &ApiResponse::<()>::fail(MSG_UNAUTHORIZED),
            )
        }
        GateDecision::RewriteToVerify => return config_page(service, true),
    }

    match (&parts.method, path) {
        (&Method::GET, HOME_PATH) => match service.home_view() {
            Ok(view) => envelope(StatusCode::OK, &ApiResponse::ok(view)),
            Err(e) => service_error(e),
        },

        (&Method::GET, VERIFY_PATH) => {
            config_page(service, has_query_flag(parts.uri.query(), VERIFY_QUERY))
        }

        (&Method::POST, VERIFY_API_PATH) => {
            let bytes = match read_body(body).await {
                Ok(bytes) => bytes,
                Err(resp) => return resp,
            };
            match service.verify_body(&bytes, now) {
                Ok(outcome) => {
                    let mut resp = envelope(StatusCode::OK, &outcome.response);
                    if let Some(token) = outcome.token {
                        let cookie = access_cookie(&token, service.gate().max_age());
                        match HeaderValue::from_str(&cookie) {
                            Ok(value) => {
                                resp.headers_mut().insert(SET_COOKIE, value);
                            }
                            Err(e) => {
                                error!("access token is not a valid header value: {e}");
                                return envelope(
                                    StatusCode::INTERNAL_SERVER_ERROR,
                                    &ApiResponse::<()>::fail("fail"),
                                );
                            }
                        }
                    }
                    resp
                }
                Err(e) => service_error(e),
            }
        }

        (&Method::POST, CONFIG_API_PATH) => {
            let bytes = match read_body(body).await {
                Ok(bytes) => bytes,
                Err(resp) => return resp,
            };
            match service.save_config(&bytes) {
                Ok(()) => envelope(StatusCode::OK, &ApiResponse::ok(true)),
                Err(e) => service_error(e),
            }
        }

        (&Method::GET, FILE_API_PATH) => match service.download() {
            Ok(raw) => {
                let mut resp = respond(StatusCode::OK, JSON, Bytes::from(raw));
                resp.headers_mut().insert(
                    CONTENT_DISPOSITION,
                    HeaderValue::from_static(DOWNLOAD_DISPOSITION),
                );
                resp
            }
            Err(e) => service_error(e),
        },

        (_, HOME_PATH | VERIFY_PATH | VERIFY_API_PATH | CONFIG_API_PATH | FILE_API_PATH) => {
            envelope(
                StatusCode::METHOD_NOT_ALLOWED,
                &ApiResponse::<()>::fail(MSG_METHOD_NOT_ALLOWED),
            )
        }

        _ => envelope(StatusCode::NOT_FOUND, &ApiResponse::<()>::fail(MSG_NOT_FOUND)),
    }
}

fn config_page<R: ConfigRepository>(service: &SiteService<R>, verify: bool) -> Response<Full<Bytes>> {
    match service.config_page(verify) {
        Ok(page) => envelope(StatusCode::OK, &ApiResponse::ok(page)),
        Err(e) => service_error(e),
    }
}

/// `true` when `flag` appears in the query string, with or without a value.
fn has_query_flag(query: Option<&str>, flag: &str) -> bool {
    query.is_some_and(|q| {
        q.split('&')
            .any(|pair| pair.split('=').next() == Some(flag))
    })
}

/// Collects the request body, capped at [`MAX_BODY_BYTES`].
async fn read_body<B>(body: B) -> Result<Bytes, Response<Full<Bytes>>>
where
    B: Body,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    match Limited::new(body, MAX_BODY_BYTES).collect().await {
        Ok(collected) => Ok(collected.to_bytes()),
        Err(e) if e.downcast_ref::<LengthLimitError>().is_some() => Err(envelope(
            StatusCode::PAYLOAD_TOO_LARGE,
            &ApiResponse::<()>::fail("request body too large"),
        )),
        Err(e) => {
            debug!("failed to read request body: {e}");
            Err(envelope(
                StatusCode::BAD_REQUEST,
                &ApiResponse::<()>::fail(format!("failed to read request body: {e}")),
            ))
        }
    }
}

// ── Response builders ─────────────────────────────────────────────────────────

fn respond(status: StatusCode, content_type: &'static str, body: Bytes) -> Response<Full<Bytes>> {
    let mut resp = Response::new(Full::new(body));
    *resp.status_mut() = status;
    resp.headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
    resp
}

fn envelope<T: Serialize>(status: StatusCode, body: &ApiResponse<T>) -> Response<Full<Bytes>> {
    match serde_json::to_vec(body) {
        Ok(bytes) => respond(status, JSON, Bytes::from(bytes)),
        Err(e) => {
            error!("failed to serialize response: {e}");
            respond(
                StatusCode::INTERNAL_SERVER_ERROR,
                JSON,
                Bytes::from_static(br#"{"data":null,"message":"internal error","success":false}"#),
            )
        }
    }
}

fn redirect(location: &'static str) -> Response<Full<Bytes>> {
    let mut resp = Response::new(Full::new(Bytes::new()));
    *resp.status_mut() = StatusCode::TEMPORARY_REDIRECT;
    resp.headers_mut()
        .insert(LOCATION, HeaderValue::from_static(location));
    resp
}

fn service_error(e: ServiceError) -> Response<Full<Bytes>> {
    let status = match &e {
        ServiceError::InvalidBody(_) => StatusCode::BAD_REQUEST,
        ServiceError::Store(StoreError::NotFound { .. }) => StatusCode::NOT_FOUND,
        ServiceError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    if status.is_server_error() {
        error!("request failed: {e}");
    } else {
        debug!("request rejected: {e}");
    }
    envelope(status, &ApiResponse::<()>::fail(e.to_string()))
}

// ── Tests ─────────────────────────────────────────────────────────────────────
