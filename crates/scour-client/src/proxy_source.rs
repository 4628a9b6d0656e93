use std::time::Duration;

use reqwest::Client;
use scour_core::config::DEFAULT_PROXY_LIST_URL;
use scour_core::error::AppError;
use scour_core::traits::ProxySource;

/// Proxy list fetched from a URL returning one `host:port` per line.
#[derive(Clone)]
pub struct HttpProxySource {
    client: Client,
    url: String,
}

impl HttpProxySource {
    pub fn new(url: impl Into<String>) -> Result<Self, AppError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| AppError::ProxyError(e.to_string()))?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }

    /// The public proxyscrape HTTP list.
    pub fn proxyscrape() -> Result<Self, AppError> {
        Self::new(DEFAULT_PROXY_LIST_URL)
    }
}

impl ProxySource for HttpProxySource {
    async fn fetch_proxies(&self) -> Result<Vec<String>, AppError> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| AppError::ProxyError(format!("Proxy list fetch failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::ProxyError(format!(
                "Proxy list returned HTTP {}",
                status.as_u16()
            )));
        }

        let text = response
            .text()
            .await
            .map_err(|e| AppError::ProxyError(format!("Failed to read proxy list: {e}")))?;

        Ok(parse_proxy_list(&text))
    }
}

fn parse_proxy_list(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(String::from)
        .collect()
}
