//! Bot-challenge detection and two-stage resolution.
//!
//! ```text
//! blocked URL --> automated stage (retry x2) --ok--> Resolution { automated }
//!                        |
//!                       fail
//!                        v
//!                 interactive stage (retry x2) --ok--> Resolution { interactive }
//!                        |
//!                       fail --> None
//! ```

use std::time::Duration;

use crate::models::Provenance;
use crate::retry::RetryPolicy;
use crate::traits::{CaptchaResolver, CaptchaSolver, Resolution};

/// Substrings that suggest a challenge page. Matched case-insensitively.
pub const CAPTCHA_INDICATORS: &[&str] = &[
    "captcha",
    "cloudflare",
    "challenge",
    "are you human",
    "recaptcha",
    "hcaptcha",
    "turnstile",
    "security check",
];

/// Keyword scan for challenge pages.
///
/// Imprecise on purpose: a page that merely mentions "security check" is
/// flagged too.
pub fn detect_captcha(html: &str) -> bool {
    let lowered = html.to_lowercase();
    CAPTCHA_INDICATORS
        .iter()
        .any(|indicator| lowered.contains(indicator))
}

/// Automated service first, interactive browser second.
#[derive(Clone)]
pub struct CaptchaResolutionChain<A, I>
where
    A: CaptchaSolver,
    I: CaptchaSolver,
{
    automated: A,
    interactive: I,
    retry: RetryPolicy,
}

impl<A, I> CaptchaResolutionChain<A, I>
where
    A: CaptchaSolver,
    I: CaptchaSolver,
{
    /// Each stage gets two retries with a 1 second backoff base.
    pub fn new(automated: A, interactive: I) -> Self {
        Self {
            automated,
            interactive,
            retry: RetryPolicy::new(2).with_backoff_base(Duration::from_secs(1)),
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }
}

impl<A, I> CaptchaResolver for CaptchaResolutionChain<A, I>
where
    A: CaptchaSolver,
    I: CaptchaSolver,
{
    async fn resolve(&self, url: &str) -> Option<Resolution> {
        tracing::info!(url = %url, "Solving CAPTCHA via automated service");
        match self.retry.execute(|| self.automated.solve(url)).await {
            Ok(html) => {
                return Some(Resolution {
                    html,
                    provenance: Provenance::CaptchaSolvedAutomated,
                });
            }
            Err(e) => tracing::warn!(url = %url, error = %e, "Automated stage failed"),
        }

        tracing::warn!(url = %url, "Falling back to interactive browser");
        match self.retry.execute(|| self.interactive.solve(url)).await {
            Ok(html) => Some(Resolution {
                html,
                provenance: Provenance::CaptchaSolvedInteractive,
            }),
            Err(e) => {
                tracing::error!(url = %url, error = %e, "All CAPTCHA stages failed");
                None
            }
        }
    }
}
