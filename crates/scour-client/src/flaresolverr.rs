//! Automated CAPTCHA stage backed by a FlareSolverr-compatible service.

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};

use scour_core::error::AppError;
use scour_core::traits::CaptchaSolver;

#[derive(Debug, Clone)]
pub struct FlareSolverrConfig {
    pub endpoint: String,
    /// Service-side solve budget.
    pub max_timeout: Duration,
    /// Client-side budget for the whole HTTP exchange.
    pub transport_timeout: Duration,
    pub session: String,
}

impl Default for FlareSolverrConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:8191/v1".into(),
            max_timeout: Duration::from_secs(60),
            transport_timeout: Duration::from_secs(120),
            session: "global_session".into(),
        }
    }
}

impl FlareSolverrConfig {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            ..Self::default()
        }
    }

    pub fn with_session(mut self, session: impl Into<String>) -> Self {
        self.session = session.into();
        self
    }

    pub fn with_transport_timeout(mut self, timeout: Duration) -> Self {
        self.transport_timeout = timeout;
        self
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SolveCommand<'a> {
    cmd: &'a str,
    url: &'a str,
    max_timeout: u64,
    session: &'a str,
}

#[derive(Deserialize)]
struct SolveResponse {
    status: String,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    solution: Option<Solution>,
}

#[derive(Deserialize)]
struct Solution {
    #[serde(default)]
    response: Option<String>,
}

#[derive(Clone)]
pub struct FlareSolverr {
    client: Client,
    config: FlareSolverrConfig,
}

impl FlareSolverr {
    pub fn new(config: FlareSolverrConfig) -> Result<Self, AppError> {
        let client = Client::builder()
            .timeout(config.transport_timeout)
            .build()
            .map_err(|e| AppError::CaptchaError(format!("Failed to build solver client: {e}")))?;
        Ok(Self { client, config })
    }
}

impl CaptchaSolver for FlareSolverr {
    async fn solve(&self, url: &str) -> Result<String, AppError> {
        tracing::info!(url = %url, endpoint = %self.config.endpoint, "Solving CAPTCHA via FlareSolverr");

        let command = SolveCommand {
            cmd: "request.get",
            url,
            max_timeout: self.config.max_timeout.as_millis() as u64,
            session: &self.config.session,
        };

        let response = self
            .client
            .post(&self.config.endpoint)
            .json(&command)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    AppError::Timeout(self.config.transport_timeout.as_secs())
                } else {
                    AppError::CaptchaError(format!("FlareSolverr unreachable: {e}"))
                }
            })?;

        let result: SolveResponse = response
            .json()
            .await
            .map_err(|e| AppError::CaptchaError(format!("Malformed FlareSolverr response: {e}")))?;

        if result.status != "ok" {
            return Err(AppError::CaptchaError(format!(
                "FlareSolverr failed: {}",
                result.message.unwrap_or_else(|| result.status.clone())
            )));
        }

        match result.solution.and_then(|s| s.response) {
            Some(html) if !html.is_empty() => Ok(html),
            _ => Err(AppError::CaptchaError(
                "FlareSolverr returned no solution body".into(),
            )),
        }
    }
}
