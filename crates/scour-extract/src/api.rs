use serde::Serialize;
use url::Url;

use scour_core::content::ContentFetcher;
use scour_core::error::AppError;
use scour_core::models::RawDocument;
use scour_core::traits::{CaptchaResolver, Fetcher, NullResolver};

use crate::adapters::{ContentAdapter, adapter_for};
use crate::document::{Document, attr_in, text_in};
use crate::registry::{AdapterKind, AdapterRegistry};
use crate::result::ExtractionResult;

const SEARCH_ENDPOINT: &str = "https://www.google.com/search";

/// One organic search hit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchHit {
    pub title: String,
    pub url: String,
    pub snippet: String,
}

/// Fetch-and-extract entry point: URL in, [`ExtractionResult`] out.
///
/// Fetch failures that survive retries are returned as errors; anything that
/// goes wrong after the HTML is in hand is reported inside the result.
#[derive(Clone)]
pub struct ScraperApi<F, R = NullResolver>
where
    F: Fetcher,
    R: CaptchaResolver,
{
    content: ContentFetcher<F, R>,
    registry: AdapterRegistry,
}

impl<F, R> ScraperApi<F, R>
where
    F: Fetcher,
    R: CaptchaResolver,
{
    /// An API routing URLs through the built-in adapter table.
    pub fn new(content: ContentFetcher<F, R>) -> Result<Self, AppError> {
        Ok(Self {
            content,
            registry: AdapterRegistry::builtin()?,
        })
    }

    pub fn with_registry(mut self, registry: AdapterRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn registry(&self) -> &AdapterRegistry {
        &self.registry
    }

    pub fn select_adapter(&self, url: &str) -> AdapterKind {
        self.registry.select(url)
    }

    pub async fn get_content(&self, url: &str, force_captcha: bool) -> Result<RawDocument, AppError> {
        self.content.get_content(url, force_captcha).await
    }

    /// Extract `url` with the adapter its pattern selects.
    ///
    /// With non-blank `html` given the fetch pipeline is skipped entirely.
    pub async fn extract_data(&self, url: &str, html: Option<&str>) -> Result<ExtractionResult, AppError> {
        self.extract_with(self.select_adapter(url), url, html, false).await
    }

    /// Like [`extract_data`](Self::extract_data), optionally forcing CAPTCHA
    /// escalation on the fetch.
    pub async fn scrape(&self, url: &str, force_captcha: bool) -> Result<ExtractionResult, AppError> {
        self.extract_with(self.select_adapter(url), url, None, force_captcha).await
    }

    /// Fetch and extract with the e-commerce adapter, whatever the URL.
    pub async fn extract_products(&self, url: &str) -> Result<ExtractionResult, AppError> {
        self.extract_with(AdapterKind::Ecommerce, url, None, false).await
    }

    /// Fetch and extract with the news adapter, whatever the URL.
    pub async fn extract_article(&self, url: &str) -> Result<ExtractionResult, AppError> {
        self.extract_with(AdapterKind::News, url, None, false).await
    }

    /// Extract every URL in order. A URL whose fetch fails yields a failure
    /// record of its adapter's type; the batch always runs to the end.
    pub async fn extract_batch<S: AsRef<str>>(&self, urls: &[S]) -> Vec<ExtractionResult> {
        let mut results = Vec::with_capacity(urls.len());
        for url in urls {
            let url = url.as_ref();
            let kind = self.select_adapter(url);
            let result = match self.extract_with(kind, url, None, false).await {
                Ok(result) => result,
                Err(e) => {
                    tracing::error!(url = %url, error = %e, "Batch fetch failed");
                    ExtractionResult::failure(kind.as_str(), e.to_string())
                }
            };
            results.push(result);
        }
        tracing::info!(
            total = results.len(),
            failed = results.iter().filter(|r| r.is_error()).count(),
            "Batch complete"
        );
        results
    }

    /// Scrape a search-results page for `query`, optionally restricted to
    /// `site`, returning at most `limit` hits.
    pub async fn search(
        &self,
        query: &str,
        site: Option<&str>,
        limit: usize,
    ) -> Result<Vec<SearchHit>, AppError> {
        let url = search_url(query, site)?;
        let doc = self.get_content(&url, false).await?;
        parse_search_results(&doc.html, limit)
    }

    async fn extract_with(
        &self,
        kind: AdapterKind,
        url: &str,
        html: Option<&str>,
        force_captcha: bool,
    ) -> Result<ExtractionResult, AppError> {
        let adapter = adapter_for(kind);
        let result = match html.filter(|h| !h.trim().is_empty()) {
            Some(html) => adapter.extract(html, url),
            None => {
                let doc = self.get_content(url, force_captcha).await?;
                tracing::info!(
                    url = %url,
                    adapter = %kind,
                    provenance = %doc.provenance,
                    bytes = doc.html.len(),
                    "Extracting"
                );
                adapter.extract(&doc.html, url)
            }
        };
        Ok(result)
    }
}

fn search_url(query: &str, site: Option<&str>) -> Result<String, AppError> {
    let q = match site {
        Some(site) => format!("{query} site:{site}"),
        None => query.to_string(),
    };
    Url::parse_with_params(SEARCH_ENDPOINT, &[("q", q)])
        .map(String::from)
        .map_err(|e| AppError::InvalidUrl(e.to_string()))
}

fn parse_search_results(html: &str, limit: usize) -> Result<Vec<SearchHit>, AppError> {
    let doc = Document::parse(html)?;
    let mut hits = Vec::new();
    for result in doc.select(".tF2Cxc")? {
        if hits.len() >= limit {
            break;
        }
        let (Some(title), Some(url)) = (text_in(result, "h3")?, attr_in(result, "a[href]", "href")?)
        else {
            continue;
        };
        hits.push(SearchHit {
            title,
            url,
            snippet: text_in(result, ".IsZvec")?.unwrap_or_default(),
        });
    }
    Ok(hits)
}
