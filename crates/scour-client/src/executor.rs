use std::time::Duration;

use moka::future::Cache;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Method};
use url::Url;

use scour_core::cache::{CacheKey, CacheLookup, ResponseCache};
use scour_core::config::Settings;
use scour_core::error::AppError;
use scour_core::models::{FetchRequest, FetchResponse, HttpMethod};
use scour_core::proxy::ProxyPool;
use scour_core::retry::RetryPolicy;
use scour_core::throttle::{RateLimiter, ThrottleConfig};
use scour_core::traits::{Fetcher, NoProxies, ProxySource};

use crate::user_agent::{Device, browser_headers};

/// Settings for one [`RequestExecutor`] lane.
#[derive(Debug, Clone)]
pub struct ExecutorConfig {
    pub timeout: Duration,
    pub retry: RetryPolicy,
    pub throttle: ThrottleConfig,
    pub device: Device,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            retry: RetryPolicy::default(),
            throttle: ThrottleConfig::default(),
            device: Device::Desktop,
        }
    }
}

impl ExecutorConfig {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            timeout: settings.request_timeout,
            retry: RetryPolicy::new(settings.max_retries),
            throttle: ThrottleConfig::new(settings.rate_limit_delay)
                .with_jitter(Duration::from_millis(1500)),
            device: Device::Desktop,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_throttle(mut self, throttle: ThrottleConfig) -> Self {
        self.throttle = throttle;
        self
    }

    pub fn with_device(mut self, device: Device) -> Self {
        self.device = device;
        self
    }
}

/// HTTP fetch lane: pacing, identity headers, proxy routing, retries and caching.
///
/// One executor is one lane; its rate limiter serializes the requests issued
/// through it (and its clones). The response cache may be shared between
/// lanes. Non-2xx responses are returned, not raised: only transport failures
/// that survive every retry become errors.
pub struct RequestExecutor<S: ProxySource = NoProxies> {
    direct: Client,
    /// reqwest binds proxies at build time, so one client per proxy URL.
    proxied: Cache<String, Client>,
    limiter: RateLimiter,
    proxies: Option<ProxyPool<S>>,
    cache: Option<ResponseCache>,
    config: ExecutorConfig,
}

impl<S: ProxySource> Clone for RequestExecutor<S> {
    fn clone(&self) -> Self {
        Self {
            direct: self.direct.clone(),
            proxied: self.proxied.clone(),
            limiter: self.limiter.clone(),
            proxies: self.proxies.clone(),
            cache: self.cache.clone(),
            config: self.config.clone(),
        }
    }
}

impl RequestExecutor<NoProxies> {
    pub fn new(config: ExecutorConfig) -> Result<Self, AppError> {
        let direct = build_client(config.timeout, None)?;
        Ok(Self {
            direct,
            proxied: Cache::builder()
                .max_capacity(64)
                .time_to_idle(Duration::from_secs(3600))
                .build(),
            limiter: RateLimiter::new(config.throttle.clone()),
            proxies: None,
            cache: None,
            config,
        })
    }
}

impl<S: ProxySource> RequestExecutor<S> {
    /// Route requests through proxies drawn from `pool`.
    pub fn with_proxy_pool<T: ProxySource>(self, pool: ProxyPool<T>) -> RequestExecutor<T> {
        RequestExecutor {
            direct: self.direct,
            proxied: self.proxied,
            limiter: self.limiter,
            proxies: Some(pool),
            cache: self.cache,
            config: self.config,
        }
    }

    pub fn with_cache(mut self, cache: ResponseCache) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn config(&self) -> &ExecutorConfig {
        &self.config
    }

    pub async fn get(&self, url: &str) -> Result<FetchResponse, AppError> {
        self.execute(FetchRequest::get(url)).await
    }

    pub async fn post(&self, url: &str, body: impl Into<String>) -> Result<FetchResponse, AppError> {
        self.execute(FetchRequest::post(url, body)).await
    }

    /// Run one request through the lane.
    pub async fn execute(&self, request: FetchRequest) -> Result<FetchResponse, AppError> {
        validate_url(&request.url)?;
        let extra_headers = parse_headers(&request.headers)?;

        let key = CacheKey::from_request(&request);
        let mut stale = None;
        if let Some(cache) = &self.cache {
            match cache.lookup(&key).await {
                CacheLookup::Fresh(hit) => {
                    tracing::debug!(url = %request.url, status = hit.status, "Cache hit");
                    return Ok(hit);
                }
                CacheLookup::Stale(old) => stale = Some(old),
                CacheLookup::Miss => {}
            }
        }

        self.limiter.await_turn().await;

        let mut headers = browser_headers(self.config.device);
        headers.extend(extra_headers);

        let proxy = match &self.proxies {
            Some(pool) => pool.next_proxy().await,
            None => None,
        };
        let client = match &proxy {
            Some(entry) => self.client_for(&entry.url()).await,
            None => self.direct.clone(),
        };

        tracing::info!(
            method = %request.method,
            url = %request.url,
            proxy = proxy.as_ref().map(|p| p.endpoint.as_str()).unwrap_or("none"),
            "Requesting"
        );

        let result = self
            .config
            .retry
            .execute(|| send_once(&client, &request, &headers, self.config.timeout))
            .await;

        match result {
            Ok(response) => {
                tracing::debug!(url = %request.url, status = response.status, "Response");
                if let Some(cache) = &self.cache {
                    cache.store(key, &response).await;
                }
                Ok(response)
            }
            Err(e) => match stale {
                Some(old) => {
                    tracing::warn!(url = %request.url, error = %e, "Serving stale cached response");
                    Ok(old)
                }
                None => {
                    tracing::error!(url = %request.url, error = %e, "Request failed");
                    Err(e)
                }
            },
        }
    }

    /// Client bound to `proxy_url`, falling back to the direct client if it
    /// cannot be built.
    async fn client_for(&self, proxy_url: &str) -> Client {
        if let Some(client) = self.proxied.get(proxy_url).await {
            return client;
        }
        match build_client(self.config.timeout, Some(proxy_url)) {
            Ok(client) => {
                self.proxied
                    .insert(proxy_url.to_string(), client.clone())
                    .await;
                client
            }
            Err(e) => {
                tracing::warn!(proxy = %proxy_url, error = %e, "Unusable proxy, going direct");
                self.direct.clone()
            }
        }
    }
}

impl<S: ProxySource> Fetcher for RequestExecutor<S> {
    async fn fetch(&self, url: &str) -> Result<String, AppError> {
        let response = self.get(url).await?;
        if !response.is_success() {
            tracing::warn!(url = %url, status = response.status, "Non-success status");
        }
        Ok(response.body)
    }
}

fn build_client(timeout: Duration, proxy: Option<&str>) -> Result<Client, AppError> {
    let mut builder = Client::builder().timeout(timeout);
    if let Some(proxy_url) = proxy {
        let proxy = reqwest::Proxy::all(proxy_url)
            .map_err(|e| AppError::ProxyError(format!("Invalid proxy {proxy_url}: {e}")))?;
        builder = builder.proxy(proxy);
    }
    builder
        .build()
        .map_err(|e| AppError::HttpError(e.to_string()))
}

fn validate_url(raw: &str) -> Result<Url, AppError> {
    let parsed = Url::parse(raw).map_err(|e| AppError::InvalidUrl(format!("{raw}: {e}")))?;
    match parsed.scheme() {
        "http" | "https" => Ok(parsed),
        scheme => Err(AppError::InvalidUrl(format!(
            "{raw}: scheme '{scheme}' is not allowed (only http/https)"
        ))),
    }
}

fn parse_headers(pairs: &[(String, String)]) -> Result<HeaderMap, AppError> {
    let mut headers = HeaderMap::new();
    for (name, value) in pairs {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| AppError::ConfigError(format!("Invalid header name '{name}': {e}")))?;
        let value = HeaderValue::from_str(value)
            .map_err(|e| AppError::ConfigError(format!("Invalid header value for {name}: {e}")))?;
        headers.insert(name, value);
    }
    Ok(headers)
}

async fn send_once(
    client: &Client,
    request: &FetchRequest,
    headers: &HeaderMap,
    timeout: Duration,
) -> Result<FetchResponse, AppError> {
    let method = match request.method {
        HttpMethod::Get => Method::GET,
        HttpMethod::Post => Method::POST,
    };
    let mut builder = client
        .request(method, &request.url)
        .headers(headers.clone())
        .timeout(timeout);
    if let Some(body) = &request.body {
        builder = builder.body(body.clone());
    }

    let response = builder.send().await.map_err(|e| {
        if e.is_timeout() {
            AppError::Timeout(timeout.as_secs())
        } else if e.is_connect() {
            AppError::NetworkError(format!("Connection failed: {e}"))
        } else {
            AppError::HttpError(e.to_string())
        }
    })?;

    let status = response.status().as_u16();
    let url = response.url().to_string();
    let body = response.text().await.map_err(|e| {
        if e.is_timeout() {
            AppError::Timeout(timeout.as_secs())
        } else {
            AppError::HttpError(format!("Failed to read response body: {e}"))
        }
    })?;

    Ok(FetchResponse {
        url,
        status,
        body,
        from_cache: false,
        stale: false,
    })
}

#[cfg(test)]
mod tests {
    use httpmock::prelude::*;
    use scour_core::cache::CacheConfig;
    use scour_core::proxy::ProxyPoolConfig;
    use scour_core::testutil::MockProxySource;

    use super::*;

    fn fast_config() -> ExecutorConfig {
        ExecutorConfig::default()
            .with_timeout(Duration::from_secs(5))
            .with_throttle(ThrottleConfig::new(Duration::ZERO))
            .with_retry(RetryPolicy::new(0).with_backoff_base(Duration::from_millis(10)))
    }

    #[tokio::test]
    async fn get_returns_body_and_status() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET).path("/page").header_exists("user-agent");
                then.status(200).body("<html><body>hello</body></html>");
            })
            .await;

        let executor = RequestExecutor::new(fast_config()).unwrap();
        let response = executor.get(&server.url("/page")).await.unwrap();

        mock.assert_async().await;
        assert_eq!(response.status, 200);
        assert_eq!(response.body, "<html><body>hello</body></html>");
        assert!(!response.from_cache);
    }

    #[tokio::test]
    async fn non_success_status_is_a_response() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/blocked");
                then.status(403).body("Attention Required! | Cloudflare");
            })
            .await;

        let executor = RequestExecutor::new(fast_config()).unwrap();
        let response = executor.get(&server.url("/blocked")).await.unwrap();
        assert_eq!(response.status, 403);
        assert!(!response.is_success());

        let html = executor.fetch(&server.url("/blocked")).await.unwrap();
        assert!(html.contains("Cloudflare"));
    }

    #[tokio::test]
    async fn post_sends_body() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST).path("/search").body("q=rust");
                then.status(200).body("results");
            })
            .await;

        let executor = RequestExecutor::new(fast_config()).unwrap();
        let response = executor.post(&server.url("/search"), "q=rust").await.unwrap();
        mock.assert_async().await;
        assert_eq!(response.body, "results");
    }

    #[tokio::test]
    async fn fresh_cache_hit_skips_network() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET).path("/cached");
                then.status(200).body("once");
            })
            .await;

        let executor = RequestExecutor::new(fast_config())
            .unwrap()
            .with_cache(ResponseCache::default());
        let first = executor.get(&server.url("/cached")).await.unwrap();
        let second = executor.get(&server.url("/cached")).await.unwrap();

        // exactly one request reached the server
        mock.assert_async().await;
        assert!(!first.from_cache);
        assert!(second.from_cache);
        assert_eq!(second.body, "once");
    }

    #[tokio::test]
    async fn stale_entry_served_when_network_fails() {
        let server = MockServer::start_async().await;
        let mut ok = server
            .mock_async(|when, then| {
                when.method(GET).path("/flaky");
                then.status(200).body("good copy");
            })
            .await;

        let cache = ResponseCache::new(CacheConfig::default().with_ttl(Duration::ZERO));
        let executor = RequestExecutor::new(fast_config().with_timeout(Duration::from_millis(200)))
            .unwrap()
            .with_cache(cache);
        executor.get(&server.url("/flaky")).await.unwrap();

        ok.delete_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/flaky");
                then.status(200).delay(Duration::from_secs(2)).body("too late");
            })
            .await;

        let response = executor.get(&server.url("/flaky")).await.unwrap();
        assert!(response.stale);
        assert_eq!(response.body, "good copy");
    }

    #[tokio::test]
    async fn timeout_is_retried_then_surfaced() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/slow");
                then.status(200).delay(Duration::from_secs(2));
            })
            .await;

        let executor = RequestExecutor::new(
            fast_config()
                .with_timeout(Duration::from_millis(100))
                .with_retry(RetryPolicy::new(1).with_backoff_base(Duration::from_millis(10))),
        )
        .unwrap();
        let err = executor.get(&server.url("/slow")).await.unwrap_err();
        assert!(matches!(err, AppError::Timeout(_)), "got {err:?}");
    }

    #[tokio::test]
    async fn malformed_url_is_rejected_without_retry() {
        let executor = RequestExecutor::new(
            fast_config().with_retry(RetryPolicy::new(5).with_backoff_base(Duration::from_secs(10))),
        )
        .unwrap();
        let start = std::time::Instant::now();
        assert!(matches!(
            executor.get("not a url").await,
            Err(AppError::InvalidUrl(_))
        ));
        assert!(matches!(
            executor.get("ftp://example.com/file").await,
            Err(AppError::InvalidUrl(_))
        ));
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test]
    async fn empty_proxy_pool_goes_direct() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET).path("/direct");
                then.status(200).body("ok");
            })
            .await;

        let pool = ProxyPool::new(MockProxySource::new(vec![Ok(vec![])]), ProxyPoolConfig::default());
        let executor = RequestExecutor::new(fast_config())
            .unwrap()
            .with_proxy_pool(pool);
        let response = executor.get(&server.url("/direct")).await.unwrap();
        mock.assert_async().await;
        assert_eq!(response.body, "ok");
    }

    #[test]
    fn invalid_header_is_config_error() {
        let err = parse_headers(&[("bad header".into(), "x".into())]).unwrap_err();
        assert!(matches!(err, AppError::ConfigError(_)));
    }
}
