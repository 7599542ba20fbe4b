use anyhow::{Context, Result};
use reqwest::Client;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::debug;

use super::{Authenticator, Credential, LoginCallback, SessionHandle};

/// Authenticator that relays credentials to an HTTP login endpoint.
///
/// The endpoint receives `POST {"email": ..., "password": ...}`. A 2xx JSON
/// body is the app state (or carries it under `appstate`); any other status
/// forwards its JSON body as the error value.
#[derive(Debug, Clone)]
pub struct RemoteAuthenticator {
    endpoint: String,
    http_client: Client,
}

struct RemoteSession {
    state: Value,
}

impl SessionHandle for RemoteSession {
    fn app_state(&self) -> Value {
        self.state.clone()
    }
}

impl RemoteAuthenticator {
    pub fn new(endpoint: impl Into<String>) -> Result<Self> {
        let endpoint = endpoint.into();
        // no overall request timeout: approval flows upstream can take a while
        let http_client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()
            .context("creating HTTP client")?;

        debug!("Remote authenticator initialized with endpoint={}", endpoint);

        Ok(Self {
            endpoint,
            http_client,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn exchange(&self, credential: &Credential) -> Result<Value, Value> {
        let response = self
            .http_client
            .post(&self.endpoint)
            .json(credential)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        let body = response.text().await.map_err(transport_error)?;
        let parsed = serde_json::from_str::<Value>(&body).ok();

        if status.is_success() {
            match parsed {
                Some(Value::Object(mut map)) if map.contains_key("appstate") => {
                    Ok(map.remove("appstate").unwrap_or(Value::Null))
                }
                Some(state) => Ok(state),
                None => Err(Value::String(format!(
                    "upstream returned {} with a non-JSON body",
                    status
                ))),
            }
        } else {
            match parsed {
                Some(err) => Err(err),
                None => Err(Value::String(format!("upstream returned {}: {}", status, body))),
            }
        }
    }
}

fn transport_error(e: reqwest::Error) -> Value {
    json!({"error": "transport", "message": e.to_string()})
}

impl Authenticator for RemoteAuthenticator {
    fn login(&self, credential: Credential, callback: LoginCallback) {
        let client = self.clone();
        // detached so a disconnecting client does not abort the upstream call
        tokio::spawn(async move {
            debug!("Relaying login for {} to {}", credential.email, client.endpoint);
            let outcome = client
                .exchange(&credential)
                .await
                .map(|state| Box::new(RemoteSession { state }) as Box<dyn SessionHandle>);
            callback(outcome);
        });
    }
}
