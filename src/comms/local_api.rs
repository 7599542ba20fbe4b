use anyhow::{Context, Result};
use axum::{
    extract::rejection::JsonRejection,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use serde_json::{Map, Value};
use std::any::Any;
use std::panic;
use std::future::IntoFuture;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info};

use crate::auth::error::ErrorBody;
use crate::auth::{authenticate, Authenticator, Credential, LoginError, RemoteAuthenticator};
use crate::config::Config;
use crate::security::audit_log::AuditLogger;
use crate::storage::StateLog;
use crate::utils::logging::panic_message;

pub const USAGE_MESSAGE: &str =
    "Please put your email and password to get appstate and check your code.";

type SharedState = Arc<ApiState>;

#[derive(Clone)]
pub struct ApiState {
    pub config: Arc<Config>,
    pub authenticator: Arc<dyn Authenticator>,
    pub state_log: StateLog,
    pub audit: AuditLogger,
}

impl ApiState {
    pub fn new(config: Arc<Config>, authenticator: Arc<dyn Authenticator>) -> Self {
        let state_log = StateLog::new(config.states_dir.clone());
        Self {
            config,
            authenticator,
            state_log,
            audit: AuditLogger::new(),
        }
    }
}

/// Credential fields read from a JSON request body. Only a JSON object
/// carries credentials; any other shape counts as an empty request.
#[derive(Debug, Default)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

impl LoginRequest {
    pub fn from_body(body: Value) -> Self {
        match body {
            Value::Object(mut map) => Self {
                email: take_string(&mut map, "email"),
                password: take_string(&mut map, "password"),
            },
            _ => Self::default(),
        }
    }

    fn into_credential(self) -> Result<Credential, LoginError> {
        match (self.email, self.password) {
            (Some(email), Some(password)) if !email.is_empty() && !password.is_empty() => {
                Ok(Credential::new(email, password))
            }
            _ => Err(LoginError::Validation),
        }
    }
}

fn take_string(map: &mut Map<String, Value>, key: &str) -> Option<String> {
    match map.remove(key) {
        Some(Value::String(s)) => Some(s),
        _ => None,
    }
}

#[derive(Debug, Serialize)]
pub struct AppStateResponse {
    pub success: bool,
    pub appstate: Value,
}

// Exchange credentials for an app state (POST)
async fn get_appstate(
    State(state): State<SharedState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<AppStateResponse>, LoginError> {
    let req = match body {
        Ok(Json(body)) => LoginRequest::from_body(body),
        // non-JSON bodies carry no credentials
        Err(JsonRejection::MissingJsonContentType(_)) => LoginRequest::default(),
        Err(rejection) => {
            let err = LoginError::MalformedBody(rejection.body_text());
            state.audit.validation_failed(err.reason());
            return Err(err);
        }
    };

    let credential = req.into_credential().inspect_err(|err| {
        state.audit.validation_failed(err.reason());
    })?;

    // login and record run detached so a client disconnect cannot cut them short
    let task = tokio::spawn(login_and_record(state, credential));
    let appstate = match task.await {
        Ok(outcome) => outcome?,
        Err(e) if e.is_panic() => panic::resume_unwind(e.into_panic()),
        Err(_) => return Err(LoginError::Interrupted),
    };

    Ok(Json(AppStateResponse {
        success: true,
        appstate,
    }))
}

async fn login_and_record(state: SharedState, credential: Credential) -> Result<Value, LoginError> {
    let email = credential.email.clone();

    debug!("authenticating {}", email);
    let appstate = authenticate(state.authenticator.as_ref(), credential)
        .await
        .inspect_err(|err| {
            state.audit.login_failure(&email, err.reason(), &err.to_string());
        })?;
    state.audit.login_success(&email);

    match state.state_log.persist(&appstate).await {
        Ok(path) => state.audit.state_persisted(&email, &path),
        Err(e) => {
            error!("Failed to log appstate: {:#}", e);
            state.audit.persistence_failed(&email, &format!("{:#}", e));
        }
    }

    Ok(appstate)
}

// Browser navigation to the API path (GET)
async fn appstate_usage() -> impl IntoResponse {
    (StatusCode::BAD_REQUEST, Json(ErrorBody::new(USAGE_MESSAGE)))
}

fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    error!("request handler panicked: {}", panic_message(err.as_ref()));
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorBody::new("Internal server error")),
    )
        .into_response()
}

pub fn create_router(state: SharedState) -> Router {
    let public_dir = state.config.public_dir.clone();
    let index = public_dir.join("index.html");

    Router::new()
        .route("/get-appstate", get(appstate_usage).post(get_appstate))
        .route_service("/", ServeFile::new(index))
        .fallback_service(ServeDir::new(public_dir))
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn serve(config: Config) -> Result<()> {
    let authenticator = RemoteAuthenticator::new(config.auth_url.clone())?;
    let port = config.port;
    info!(
        "Static assets from {}, app states to {}, authenticating against {}",
        config.public_dir.display(),
        config.states_dir.display(),
        authenticator.endpoint()
    );

    let state = Arc::new(ApiState::new(Arc::new(config), Arc::new(authenticator)));
    let app = create_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {}", addr))?;
    info!("Server running on port {}", port);
    axum::serve(listener, app).into_future().await?;
    Ok(())
}
