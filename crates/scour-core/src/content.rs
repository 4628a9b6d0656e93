use crate::captcha::detect_captcha;
use crate::error::AppError;
use crate::models::{Provenance, RawDocument};
use crate::traits::{CaptchaResolver, Fetcher, NullResolver};

/// Fetches a page and escalates through CAPTCHA resolution when it looks blocked.
///
/// Generic over the transport and the resolver so tests can run without
/// network or browser. Without a resolver, challenge pages are returned as-is.
#[derive(Clone)]
pub struct ContentFetcher<F, R = NullResolver>
where
    F: Fetcher,
    R: CaptchaResolver,
{
    fetcher: F,
    resolver: Option<R>,
}

impl<F: Fetcher> ContentFetcher<F, NullResolver> {
    /// A fetcher with CAPTCHA escalation disabled.
    pub fn without_resolver(fetcher: F) -> Self {
        Self {
            fetcher,
            resolver: None,
        }
    }
}

impl<F, R> ContentFetcher<F, R>
where
    F: Fetcher,
    R: CaptchaResolver,
{
    pub fn new(fetcher: F, resolver: R) -> Self {
        Self {
            fetcher,
            resolver: Some(resolver),
        }
    }

    /// Fetch `url` and return usable content.
    ///
    /// Escalates when the challenge heuristic fires or `force_escalate` is set.
    /// If every resolution stage fails the original HTML is returned, so callers
    /// must inspect the content rather than rely on an error.
    pub async fn get_content(
        &self,
        url: &str,
        force_escalate: bool,
    ) -> Result<RawDocument, AppError> {
        let html = self.fetcher.fetch(url).await?;
        let blocked = detect_captcha(&html);

        if (blocked || force_escalate)
            && let Some(resolver) = &self.resolver
        {
            tracing::warn!(url = %url, blocked, force_escalate, "CAPTCHA escalation");
            match resolver.resolve(url).await {
                Some(resolution) => {
                    tracing::info!(
                        url = %url,
                        provenance = %resolution.provenance,
                        bytes = resolution.html.len(),
                        "CAPTCHA resolved"
                    );
                    return Ok(RawDocument::new(url, resolution.html, resolution.provenance));
                }
                None => {
                    tracing::warn!(url = %url, "Resolution failed, returning unsolved content");
                }
            }
        }

        Ok(RawDocument::new(url, html, Provenance::Direct))
    }
}

impl<F, R> Fetcher for ContentFetcher<F, R>
where
    F: Fetcher,
    R: CaptchaResolver,
{
    async fn fetch(&self, url: &str) -> Result<String, AppError> {
        Ok(self.get_content(url, false).await?.html)
    }
}
