//! Rotating browser identity strings and browser-like request headers.

use rand::Rng;
use rand::seq::SliceRandom;
use reqwest::header::{self, HeaderMap, HeaderValue};

const DESKTOP_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/{version} Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/{version} Safari/605.1.15",
];

const MOBILE_AGENTS: &[&str] = &[
    "Mozilla/5.0 (iPhone; CPU iPhone OS 16_0 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/{version} Mobile/15E148 Safari/604.1",
];

/// Which family of identity strings to draw from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Device {
    #[default]
    Desktop,
    Mobile,
}

/// A user agent from the device's template set with a randomized version
/// token (`{100-125}.0.{1000-9999}.{1-200}`).
pub fn random_agent(device: Device) -> String {
    let mut rng = rand::thread_rng();
    let templates = match device {
        Device::Desktop => DESKTOP_AGENTS,
        Device::Mobile => MOBILE_AGENTS,
    };
    let template = templates.choose(&mut rng).copied().unwrap_or(DESKTOP_AGENTS[0]);
    let version = format!(
        "{}.0.{}.{}",
        rng.gen_range(100..=125),
        rng.gen_range(1000..=9999),
        rng.gen_range(1..=200)
    );
    template.replace("{version}", &version)
}

/// Headers sent with every outbound page request.
pub fn browser_headers(device: Device) -> HeaderMap {
    let mut headers = HeaderMap::new();
    if let Ok(agent) = HeaderValue::from_str(&random_agent(device)) {
        headers.insert(header::USER_AGENT, agent);
    }
    headers.insert(
        header::ACCEPT,
        HeaderValue::from_static("text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8"),
    );
    headers.insert(
        header::ACCEPT_LANGUAGE,
        HeaderValue::from_static("en-US,en;q=0.5"),
    );
    headers.insert(header::CONNECTION, HeaderValue::from_static("keep-alive"));
    headers.insert(
        header::UPGRADE_INSECURE_REQUESTS,
        HeaderValue::from_static("1"),
    );
    headers.insert(header::DNT, HeaderValue::from_static("1"));
    headers
}
