use std::future::Future;

use crate::error::AppError;
use crate::models::Provenance;

/// Fetches raw HTML content from a URL.
pub trait Fetcher: Send + Sync + Clone {
    fn fetch(&self, url: &str) -> impl Future<Output = Result<String, AppError>> + Send;
}

/// One CAPTCHA resolution stage (remote service, interactive browser, ...).
///
/// Returns the unblocked document HTML, or an error if this stage could not
/// get past the challenge.
pub trait CaptchaSolver: Send + Sync + Clone {
    fn solve(&self, url: &str) -> impl Future<Output = Result<String, AppError>> + Send;
}

/// HTML recovered from behind a challenge, tagged with the stage that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub html: String,
    pub provenance: Provenance,
}

/// Escalates a blocked URL through one or more solving stages.
///
/// Never fails: `None` means every stage gave up and the caller decides
/// whether the unsolved content is usable.
pub trait CaptchaResolver: Send + Sync + Clone {
    fn resolve(&self, url: &str) -> impl Future<Output = Option<Resolution>> + Send;
}

/// Remote source of candidate proxy endpoints (`host:port` strings).
pub trait ProxySource: Send + Sync {
    fn fetch_proxies(&self) -> impl Future<Output = Result<Vec<String>, AppError>> + Send;
}

/// A solver stage that is switched off.
///
/// Fails with a non-retryable error so the chain moves on without backoff.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSolver;

impl CaptchaSolver for NullSolver {
    async fn solve(&self, _url: &str) -> Result<String, AppError> {
        Err(AppError::ConfigError("solver stage disabled".into()))
    }
}

/// A resolver for pipelines with CAPTCHA escalation disabled.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullResolver;

impl CaptchaResolver for NullResolver {
    async fn resolve(&self, _url: &str) -> Option<Resolution> {
        None
    }
}

/// A proxy source that never yields anything (direct connections only).
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProxies;

impl ProxySource for NoProxies {
    async fn fetch_proxies(&self) -> Result<Vec<String>, AppError> {
        Ok(Vec::new())
    }
}
