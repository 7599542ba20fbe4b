use anyhow::{bail, Context, Result};
use chrono::Utc;
use serde_json::Value;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs::{self, OpenOptions};
use tokio::io::{AsyncWrite, AsyncWriteExt};

pub const RECORD_PREFIX: &str = "appstate_";

// Upper bound on same-millisecond suffixes before giving up.
const MAX_SUFFIX: u32 = 1000;

/// Write-only log of app states captured on successful logins.
///
/// Each record is a new file `appstate_<unix-millis>.json`. A record created
/// in the same millisecond as an existing one gets a `_<n>` suffix instead
/// of overwriting it.
#[derive(Debug, Clone)]
pub struct StateLog {
    dir: PathBuf,
}

impl StateLog {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Persist `state`, returning the path of the new record.
    pub async fn persist(&self, state: &Value) -> Result<PathBuf> {
        fs::create_dir_all(&self.dir)
            .await
            .with_context(|| format!("creating state directory {}", self.dir.display()))?;

        let body = serde_json::to_vec(state).context("serializing app state")?;
        let stamp = Utc::now().timestamp_millis();

        for attempt in 0..MAX_SUFFIX {
            let path = self.dir.join(record_name(stamp, attempt));
            match OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&path)
                .await
            {
                Ok(file) => {
                    write_or_remove(file, &path, &body).await?;
                    return Ok(path);
                }
                Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
                Err(e) => {
                    return Err(e).with_context(|| format!("creating {}", path.display()));
                }
            }
        }

        bail!("no free record name for timestamp {}", stamp)
    }
}

// Leaves no empty or partial record behind when the write fails.
async fn write_or_remove<W: AsyncWrite + Unpin>(mut writer: W, path: &Path, body: &[u8]) -> Result<()> {
    let written = match writer.write_all(body).await {
        Ok(()) => writer.flush().await,
        Err(e) => Err(e),
    };
    if let Err(e) = written {
        drop(writer);
        let _ = fs::remove_file(path).await;
        return Err(e).with_context(|| format!("writing {}", path.display()));
    }
    Ok(())
}

pub fn record_name(stamp: i64, attempt: u32) -> String {
    if attempt == 0 {
        format!("{}{}.json", RECORD_PREFIX, stamp)
    } else {
        format!("{}{}_{}.json", RECORD_PREFIX, stamp, attempt)
    }
}

/// Millisecond timestamp encoded in a record file name.
pub fn record_timestamp(file_name: &str) -> Option<i64> {
    let stem = file_name.strip_prefix(RECORD_PREFIX)?.strip_suffix(".json")?;
    let millis = stem.split('_').next()?;
    millis.parse().ok()
}
