//! Outbound trigger call — the HTTP request fired when a schedule is due.

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use buildgate_core::config::TriggerMethod;

/// Failure modes of a trigger call. The rendered message is what ends up
/// (truncated) in the scheduling record's `last_error`.
#[derive(Debug, Error)]
pub enum TriggerError {
    /// The target answered with a non-success status.
    #[error("target responded with HTTP {status}")]
    Status { status: u16 },

    /// The call exceeded the configured timeout.
    #[error("request timed out after {secs}s")]
    Timeout { secs: u64 },

    /// Connection, DNS, TLS or other transport-level failure.
    #[error("transport error: {0}")]
    Transport(String),
}

/// Seam between the engine and the outbound HTTP client, mockable in tests.
#[async_trait]
pub trait TriggerClient: Send + Sync {
    /// Perform the trigger call. `Ok` means the target returned a success
    /// status; everything else is an error carrying its description.
    async fn fire(&self, method: TriggerMethod, url: &str) -> Result<(), TriggerError>;
}

/// Production client: reqwest with a hard per-request timeout.
pub struct HttpTrigger {
    client: reqwest::Client,
    timeout_secs: u64,
}

impl HttpTrigger {
    pub fn new(timeout_secs: u64) -> Result<Self, TriggerError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| TriggerError::Transport(e.to_string()))?;
        Ok(Self {
            client,
            timeout_secs,
        })
    }
}

#[async_trait]
impl TriggerClient for HttpTrigger {
    async fn fire(&self, method: TriggerMethod, url: &str) -> Result<(), TriggerError> {
        let request = match method {
            TriggerMethod::Post => self.client.post(url),
            TriggerMethod::Get => self.client.get(url),
        };

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                TriggerError::Timeout {
                    secs: self.timeout_secs,
                }
            } else {
                TriggerError::Transport(e.to_string())
            }
        })?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(TriggerError::Status {
                status: status.as_u16(),
            })
        }
    }
}
