use std::fmt;

use regex::{Regex, RegexBuilder};
use serde::Serialize;
use url::Url;

use scour_core::error::AppError;

/// Site family an adapter is specialized for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AdapterKind {
    Ecommerce,
    SocialMedia,
    Forum,
    JobBoard,
    RealEstate,
    Financial,
    Government,
    Academic,
    Travel,
    News,
    Generic,
}

impl AdapterKind {
    pub const ALL: [AdapterKind; 11] = [
        AdapterKind::Ecommerce,
        AdapterKind::SocialMedia,
        AdapterKind::Forum,
        AdapterKind::JobBoard,
        AdapterKind::RealEstate,
        AdapterKind::Financial,
        AdapterKind::Government,
        AdapterKind::Academic,
        AdapterKind::Travel,
        AdapterKind::News,
        AdapterKind::Generic,
    ];

    /// The `type` an adapter of this kind reports on failure.
    pub fn as_str(&self) -> &'static str {
        match self {
            AdapterKind::Ecommerce => "ecommerce",
            AdapterKind::SocialMedia => "social_media",
            AdapterKind::Forum => "forum",
            AdapterKind::JobBoard => "job_board",
            AdapterKind::RealEstate => "real_estate",
            AdapterKind::Financial => "financial",
            AdapterKind::Government => "government",
            AdapterKind::Academic => "academic",
            AdapterKind::Travel => "travel",
            AdapterKind::News => "news",
            AdapterKind::Generic => "generic",
        }
    }
}

impl fmt::Display for AdapterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Built-in routing table, in precedence order.
const BUILTIN_PATTERNS: &[(&str, AdapterKind)] = &[
    (
        r"amazon\.|ebay\.|shopify\.|etsy\.|alibaba\.|walmart\.",
        AdapterKind::Ecommerce,
    ),
    (
        r"twitter\.|facebook\.|instagram\.|reddit\.|pinterest\.|tiktok\.",
        AdapterKind::SocialMedia,
    ),
    (
        r"reddit\./r/|stackexchange\.|forum\.|discourse\.|phpbb\.",
        AdapterKind::Forum,
    ),
    (
        r"indeed\.|linkedin\./jobs|glassdoor\.|monster\.|careerbuilder\.",
        AdapterKind::JobBoard,
    ),
    (
        r"zillow\.|realtor\.|redfin\.|trulia\.|century21\.|remax\.",
        AdapterKind::RealEstate,
    ),
    (
        r"finance\.yahoo\.|sec\.gov|bloomberg\.|marketwatch\.|investing\.",
        AdapterKind::Financial,
    ),
    (r"\.gov$|wikipedia\.|data\.gov|usa\.gov", AdapterKind::Government),
    (
        r"arxiv\.|researchgate\.|jstor\.|springer\.|sciencedirect\.",
        AdapterKind::Academic,
    ),
    (
        r"booking\.|tripadvisor\.|expedia\.|airbnb\.|kayak\.",
        AdapterKind::Travel,
    ),
    (
        r"nytimes\.|bbc\.|cnn\.|medium\.|reuters\.|theguardian\.",
        AdapterKind::News,
    ),
];

#[derive(Debug, Clone)]
pub struct PatternEntry {
    pattern: Regex,
    kind: AdapterKind,
}

impl PatternEntry {
    /// Compile a case-insensitive pattern over `domain + path`.
    pub fn new(pattern: &str, kind: AdapterKind) -> Result<Self, AppError> {
        let pattern = RegexBuilder::new(pattern)
            .case_insensitive(true)
            .build()
            .map_err(|e| AppError::ConfigError(format!("Invalid adapter pattern: {e}")))?;
        Ok(Self { pattern, kind })
    }

    pub fn pattern(&self) -> &str {
        self.pattern.as_str()
    }

    pub fn kind(&self) -> AdapterKind {
        self.kind
    }
}

/// Ordered (pattern, kind) table. First match wins; no match means generic.
#[derive(Debug, Clone, Default)]
pub struct AdapterRegistry {
    entries: Vec<PatternEntry>,
}

impl AdapterRegistry {
    pub fn builtin() -> Result<Self, AppError> {
        let entries = BUILTIN_PATTERNS
            .iter()
            .map(|(pattern, kind)| PatternEntry::new(pattern, *kind))
            .collect::<Result<_, _>>()?;
        Ok(Self { entries })
    }

    /// Append an entry after the existing ones.
    pub fn with_entry(mut self, pattern: &str, kind: AdapterKind) -> Result<Self, AppError> {
        self.entries.push(PatternEntry::new(pattern, kind)?);
        Ok(self)
    }

    pub fn entries(&self) -> &[PatternEntry] {
        &self.entries
    }

    pub fn select(&self, url: &str) -> AdapterKind {
        let target = match_target(url);
        self.entries
            .iter()
            .find(|entry| entry.pattern.is_match(&target))
            .map(|entry| entry.kind)
            .unwrap_or(AdapterKind::Generic)
    }
}

/// `host[:port]` followed by the path, as written.
///
/// A URL without an explicit path contributes none, so `https://irs.gov`
/// reads as `irs.gov` and `\.gov$` matches it. Unparseable input is matched
/// as-is.
fn match_target(raw: &str) -> String {
    let raw = raw.trim();
    let Ok(parsed) = Url::parse(raw) else {
        return raw.to_string();
    };

    let mut target = parsed.host_str().unwrap_or_default().to_string();
    if let Some(port) = parsed.port() {
        target.push_str(&format!(":{port}"));
    }

    let after_scheme = raw.split_once("://").map(|(_, rest)| rest).unwrap_or(raw);
    let explicit_path = after_scheme
        .split(['?', '#'])
        .next()
        .unwrap_or_default()
        .contains('/');
    if explicit_path {
        target.push_str(parsed.path());
    }
    target
}
