pub mod cache;
pub mod captcha;
pub mod config;
pub mod content;
pub mod error;
pub mod models;
pub mod proxy;
pub mod retry;
pub mod throttle;
pub mod traits;

#[cfg(any(test, feature = "testutil"))]
pub mod testutil;

pub use cache::{CacheConfig, CacheKey, ResponseCache};
pub use captcha::{CaptchaResolutionChain, detect_captcha};
pub use config::Settings;
pub use content::ContentFetcher;
pub use error::AppError;
pub use models::{FetchRequest, FetchResponse, HttpMethod, Provenance, RawDocument, compute_hash};
pub use proxy::{ProxyPool, ProxyPoolConfig, SelectionPolicy};
pub use retry::RetryPolicy;
pub use throttle::{RateLimiter, ThrottleConfig};
pub use traits::{CaptchaResolver, CaptchaSolver, Fetcher, ProxySource};
