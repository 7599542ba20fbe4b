use std::path::Path;

use tracing::{error, info, warn};

/// Structured login events on the `audit` target. Passwords never pass
/// through here.
#[derive(Debug, Clone, Default)]
pub struct AuditLogger;

impl AuditLogger {
    pub fn new() -> Self {
        Self
    }

    pub fn login_success(&self, email: &str) {
        info!(target: "audit", event = "login_success", email);
    }

    pub fn login_failure(&self, email: &str, reason: &str, detail: &str) {
        warn!(target: "audit", event = "login_failure", email, reason, detail);
    }

    pub fn validation_failed(&self, reason: &str) {
        warn!(target: "audit", event = "validation_failed", reason);
    }

    pub fn state_persisted(&self, email: &str, path: &Path) {
        info!(target: "audit", event = "state_persisted", email, path = %path.display());
    }

    pub fn persistence_failed(&self, email: &str, error_msg: &str) {
        error!(target: "audit", event = "persistence_failed", email, error = error_msg);
    }
}
