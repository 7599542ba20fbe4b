use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_AUTH_URL: &str = "http://127.0.0.1:8085/login";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub port: u16,
    /// Directory served as static assets; `index.html` answers `/`.
    pub public_dir: PathBuf,
    /// Where `appstate_<millis>.json` records are written.
    pub states_dir: PathBuf,
    /// Login endpoint of the remote authenticator.
    pub auth_url: String,
    /// Exit the process after logging a panic instead of continuing.
    pub fail_fast: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            public_dir: PathBuf::from("public"),
            states_dir: PathBuf::from("states"),
            auth_url: DEFAULT_AUTH_URL.to_string(),
            fail_fast: false,
        }
    }
}

impl Config {
    pub fn from_file(path: &str) -> Result<Self> {
        let raw = fs::read_to_string(path).context("reading config file")?;
        let cfg: Config = serde_json::from_str(&raw).context("parsing JSON")?;
        Ok(cfg)
    }

    pub fn apply(&mut self, overrides: ConfigOverrides) {
        if let Some(port) = overrides.port {
            self.port = port;
        }
        if let Some(dir) = overrides.public_dir {
            self.public_dir = dir;
        }
        if let Some(dir) = overrides.states_dir {
            self.states_dir = dir;
        }
        if let Some(url) = overrides.auth_url {
            self.auth_url = url;
        }
        if overrides.fail_fast {
            self.fail_fast = true;
        }
    }
}

/// Values given explicitly on the command line or through the environment.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub port: Option<u16>,
    pub public_dir: Option<PathBuf>,
    pub states_dir: Option<PathBuf>,
    pub auth_url: Option<String>,
    pub fail_fast: bool,
}
