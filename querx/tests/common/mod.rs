//! Local stand-in for a Querx device.
//!
//! Serves the login form and the current values document on 127.0.0.1.
//! The document is only served to requests carrying the session cookie;
//! everyone else gets the login page, as the real device does.
#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Form, RawQuery, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use querx::{ClientConfig, DeviceClient, CURRENT_VALUES_PATH, LOGIN_PATH};
use serde::Deserialize;
use tokio::net::TcpListener;

pub const FIXTURE: &[u8] = include_bytes!("../fixtures/current.xml");
pub const USER: &str = "admin";
pub const PASSWORD: &str = "querx-secret";
pub const SESSION_COOKIE: &str = "QUERXSESSION=4f2a9c";
pub const LOGIN_PAGE: &str =
    "<html><head><title>Querx Login</title></head><body><form action=\"/login.cgi\"></form></body></html>";

#[derive(Default)]
pub struct DeviceState {
    pub body: Mutex<Vec<u8>>,
    pub logins: AtomicUsize,
    pub fetches: AtomicUsize,
}

impl DeviceState {
    pub fn serve(&self, body: &[u8]) {
        *self.body.lock().unwrap() = body.to_vec();
    }

    pub fn requests(&self) -> usize {
        self.logins.load(Ordering::SeqCst) + self.fetches.load(Ordering::SeqCst)
    }
}

#[derive(Deserialize)]
struct LoginForm {
    login_user: String,
    login_pass: String,
}

async fn login(State(state): State<Arc<DeviceState>>, Form(form): Form<LoginForm>) -> Response {
    state.logins.fetch_add(1, Ordering::SeqCst);
    if form.login_user == USER && form.login_pass == PASSWORD {
        let cookie = format!("{}; Path=/", SESSION_COOKIE);
        ([(header::SET_COOKIE, cookie)], "OK").into_response()
    } else {
        (StatusCode::FORBIDDEN, Html(LOGIN_PAGE)).into_response()
    }
}

async fn current_values(
    State(state): State<Arc<DeviceState>>,
    RawQuery(query): RawQuery,
    headers: HeaderMap,
) -> Response {
    state.fetches.fetch_add(1, Ordering::SeqCst);
    if query.as_deref() != current_values_route().1 {
        return StatusCode::NOT_FOUND.into_response();
    }

    let has_session = headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .any(|value| value.split(';').any(|c| c.trim() == SESSION_COOKIE));
    if !has_session {
        return Html(LOGIN_PAGE).into_response();
    }

    let body = state.body.lock().unwrap().clone();
    ([(header::CONTENT_TYPE, "text/xml")], body).into_response()
}

/// Path and query of the current values endpoint.
fn current_values_route() -> (&'static str, Option<&'static str>) {
    match CURRENT_VALUES_PATH.split_once('?') {
        Some((path, query)) => (path, Some(query)),
        None => (CURRENT_VALUES_PATH, None),
    }
}

/// A mock device that shuts down when dropped
pub struct MockDevice {
    pub addr: SocketAddr,
    pub state: Arc<DeviceState>,
    shutdown_tx: Option<tokio::sync::oneshot::Sender<()>>,
    handle: Option<tokio::task::JoinHandle<()>>,
}

impl MockDevice {
    pub async fn start() -> anyhow::Result<Self> {
        let state = Arc::new(DeviceState::default());
        state.serve(FIXTURE);

        let router = Router::new()
            .route(LOGIN_PATH, post(login))
            .route(current_values_route().0, get(current_values))
            .with_state(Arc::clone(&state));

        // Bind to any available port
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();

        let handle = tokio::spawn(async move {
            axum::serve(listener, router)
                .with_graceful_shutdown(async {
                    let _ = shutdown_rx.await;
                })
                .await
                .ok();
        });

        // Give server a moment to start
        tokio::time::sleep(Duration::from_millis(10)).await;

        Ok(MockDevice {
            addr,
            state,
            shutdown_tx: Some(shutdown_tx),
            handle: Some(handle),
        })
    }

    pub fn config(&self) -> ClientConfig {
        ClientConfig::new(self.addr.ip().to_string(), self.addr.port(), false)
            .with_timeout(Some(Duration::from_secs(5)))
    }

    pub fn client(&self) -> DeviceClient {
        DeviceClient::from_config(self.config()).expect("valid mock device config")
    }
}

impl Drop for MockDevice {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
