//! Test utilities: mock implementations of all core traits.
//!
//! Handwritten mocks for dependency injection in unit tests.
//! All mocks use `Arc<Mutex<_>>` for interior mutability, allowing
//! test assertions on recorded calls.

use std::sync::{Arc, Mutex};

use crate::error::AppError;
use crate::traits::{CaptchaResolver, CaptchaSolver, Fetcher, ProxySource, Resolution};

/// Rebuild an equivalent error (AppError is not Clone).
pub fn clone_error(error: &AppError) -> AppError {
    match error {
        AppError::HttpError(m) => AppError::HttpError(m.clone()),
        AppError::NetworkError(m) => AppError::NetworkError(m.clone()),
        AppError::Timeout(s) => AppError::Timeout(*s),
        AppError::InvalidUrl(m) => AppError::InvalidUrl(m.clone()),
        AppError::CaptchaError(m) => AppError::CaptchaError(m.clone()),
        AppError::ProxyError(m) => AppError::ProxyError(m.clone()),
        AppError::ParseError(m) => AppError::ParseError(m.clone()),
        AppError::SerializationError(e) => AppError::Generic(e.to_string()),
        AppError::ConfigError(m) => AppError::ConfigError(m.clone()),
        AppError::Generic(m) => AppError::Generic(m.clone()),
    }
}

// ---------------------------------------------------------------------------
// MockFetcher
// ---------------------------------------------------------------------------

/// Mock fetcher that returns a configurable response.
#[derive(Clone)]
pub struct MockFetcher {
    /// Queue of responses. Each call pops the first element.
    /// If empty, returns a default HTML string.
    responses: Arc<Mutex<Vec<Result<String, AppError>>>>,
    /// URLs requested, in call order.
    pub requested: Arc<Mutex<Vec<String>>>,
}

impl MockFetcher {
    pub fn new(html: &str) -> Self {
        Self::with_responses(vec![Ok(html.to_string())])
    }

    pub fn with_error(error: AppError) -> Self {
        Self::with_responses(vec![Err(error)])
    }

    pub fn with_responses(responses: Vec<Result<String, AppError>>) -> Self {
        Self {
            responses: Arc::new(Mutex::new(responses)),
            requested: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn call_count(&self) -> usize {
        self.requested.lock().unwrap().len()
    }
}

impl Fetcher for MockFetcher {
    async fn fetch(&self, url: &str) -> Result<String, AppError> {
        self.requested.lock().unwrap().push(url.to_string());
        let mut responses = self.responses.lock().unwrap();
        if responses.is_empty() {
            Ok("<html><body>default</body></html>".to_string())
        } else {
            responses.remove(0)
        }
    }
}

// ---------------------------------------------------------------------------
// MockSolver
// ---------------------------------------------------------------------------

/// Mock CAPTCHA solver stage.
///
/// Pops queued results; once the queue is empty it repeats the configured
/// failure (or a generic CaptchaError).
#[derive(Clone)]
pub struct MockSolver {
    responses: Arc<Mutex<Vec<Result<String, AppError>>>>,
    failure: Arc<Mutex<Option<AppError>>>,
    calls: Arc<Mutex<usize>>,
}

impl MockSolver {
    pub fn new(responses: Vec<Result<String, AppError>>) -> Self {
        Self {
            responses: Arc::new(Mutex::new(responses)),
            failure: Arc::new(Mutex::new(None)),
            calls: Arc::new(Mutex::new(0)),
        }
    }

    pub fn always_failing(error: AppError) -> Self {
        let solver = Self::new(Vec::new());
        *solver.failure.lock().unwrap() = Some(error);
        solver
    }

    pub fn call_count(&self) -> usize {
        *self.calls.lock().unwrap()
    }
}

impl CaptchaSolver for MockSolver {
    async fn solve(&self, _url: &str) -> Result<String, AppError> {
        *self.calls.lock().unwrap() += 1;
        let mut responses = self.responses.lock().unwrap();
        if !responses.is_empty() {
            return responses.remove(0);
        }
        match self.failure.lock().unwrap().as_ref() {
            Some(e) => Err(clone_error(e)),
            None => Err(AppError::CaptchaError("mock solver exhausted".into())),
        }
    }
}

// ---------------------------------------------------------------------------
// MockResolver
// ---------------------------------------------------------------------------

/// Mock resolver returning queued outcomes, then `None`.
#[derive(Clone)]
pub struct MockResolver {
    outcomes: Arc<Mutex<Vec<Option<Resolution>>>>,
    pub resolved: Arc<Mutex<Vec<String>>>,
}

impl MockResolver {
    pub fn new(outcomes: Vec<Option<Resolution>>) -> Self {
        Self {
            outcomes: Arc::new(Mutex::new(outcomes)),
            resolved: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn call_count(&self) -> usize {
        self.resolved.lock().unwrap().len()
    }
}

impl CaptchaResolver for MockResolver {
    async fn resolve(&self, url: &str) -> Option<Resolution> {
        self.resolved.lock().unwrap().push(url.to_string());
        let mut outcomes = self.outcomes.lock().unwrap();
        if outcomes.is_empty() {
            None
        } else {
            outcomes.remove(0)
        }
    }
}

// ---------------------------------------------------------------------------
// MockProxySource
// ---------------------------------------------------------------------------

/// Mock proxy list source. Pops queued lists; an empty queue yields an empty list.
#[derive(Clone)]
pub struct MockProxySource {
    lists: Arc<Mutex<Vec<Result<Vec<String>, AppError>>>>,
    calls: Arc<Mutex<usize>>,
}

impl MockProxySource {
    pub fn new(lists: Vec<Result<Vec<String>, AppError>>) -> Self {
        Self {
            lists: Arc::new(Mutex::new(lists)),
            calls: Arc::new(Mutex::new(0)),
        }
    }

    pub fn call_count(&self) -> usize {
        *self.calls.lock().unwrap()
    }
}

impl ProxySource for MockProxySource {
    async fn fetch_proxies(&self) -> Result<Vec<String>, AppError> {
        *self.calls.lock().unwrap() += 1;
        let mut lists = self.lists.lock().unwrap();
        if lists.is_empty() {
            Ok(Vec::new())
        } else {
            lists.remove(0)
        }
    }
}
