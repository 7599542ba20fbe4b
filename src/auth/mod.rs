pub mod error;
pub mod remote;

use serde::Serialize;
use serde_json::Value;
use std::fmt;
use tokio::sync::oneshot;

pub use error::LoginError;
pub use remote::RemoteAuthenticator;

/// Account credentials for a single login attempt. Never persisted.
#[derive(Clone, Serialize)]
pub struct Credential {
    pub email: String,
    pub password: String,
}

impl Credential {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Authenticated session returned by an [`Authenticator`].
pub trait SessionHandle: Send {
    /// Serializable session state that can resume the session later.
    fn app_state(&self) -> Value;
}

/// Outcome delivered to a login callback: an opaque error value or a session.
pub type LoginOutcome = Result<Box<dyn SessionHandle>, Value>;

/// Completion handler for [`Authenticator::login`].
pub type LoginCallback = Box<dyn FnOnce(LoginOutcome) + Send + 'static>;

/// Callback-style login backend.
///
/// Implementations invoke `callback` at most once, from any thread, whenever
/// the attempt completes. Errors are opaque JSON values; the HTTP layer
/// classifies them with [`LoginError::classify`].
pub trait Authenticator: Send + Sync + 'static {
    fn login(&self, credential: Credential, callback: LoginCallback);
}

/// Run one login attempt and wait for its completion.
pub async fn authenticate(
    authenticator: &dyn Authenticator,
    credential: Credential,
) -> Result<Value, LoginError> {
    let (tx, rx) = oneshot::channel::<LoginOutcome>();
    authenticator.login(
        credential,
        Box::new(move |outcome| {
            // receiver is gone if the request was dropped
            let _ = tx.send(outcome);
        }),
    );

    match rx.await {
        Ok(Ok(session)) => Ok(session.app_state()),
        Ok(Err(err)) => Err(LoginError::classify(err)),
        Err(_) => Err(LoginError::CallbackDropped),
    }
}
