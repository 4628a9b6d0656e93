use scour_core::content::ContentFetcher;
use scour_core::testutil::{MockFetcher, MockResolver};
use scour_extract::ScraperApi;

/// One minimal page per site family, with a URL its adapter accepts.
pub const FIXTURES: &[(&str, &str, &str)] = &[
    (
        "ecommerce",
        "https://shop.com/product/1",
        r#"<div class="product"><span class="product-name">Test Product</span><span class="price">$19.99</span></div>"#,
    ),
    (
        "news",
        "https://news.com/article/1",
        r#"<article><h1 class="headline">Test News</h1><div class="article-content">Content</div></article>"#,
    ),
    (
        "social_media",
        "https://twitter.com/test/status/1",
        r#"<div data-testid="tweetText">Hello Twitter!</div>"#,
    ),
    (
        "forum",
        "https://forum.com/thread/1",
        r#"<h1 class="title">Test Thread</h1><div class="post-content">First post</div>"#,
    ),
    (
        "job_board",
        "https://jobs.com/listing/1",
        r#"<div class="job"><span class="title">Engineer</span><span class="company">Acme</span></div>"#,
    ),
    (
        "real_estate",
        "https://realestate.com/listing/1",
        r#"<div class="property"><span class="address">123 Main</span><span class="price">$500K</span></div>"#,
    ),
    (
        "financial",
        "https://finance.com/income-statement",
        r#"<table><tr><th>Revenue</th></tr><tr><td>2023</td><td>$1M</td></tr></table>"#,
    ),
    (
        "government",
        "https://gov.com/page/1",
        r#"<h1 class="page-title">Gov Page</h1>"#,
    ),
    (
        "academic",
        "https://journals.com/paper/1",
        r#"<h1 class="article-title">Research Paper</h1><div class="abstract">Abstract</div>"#,
    ),
    (
        "travel",
        "https://travel.com/hotel/1",
        r#"<h1 class="hotel-name">Hotel Test</h1>"#,
    ),
    (
        "generic",
        "https://generic.com/page/1",
        r#"<h1>Generic Page</h1>"#,
    ),
];

/// Inputs no adapter can read as a document.
pub const UNPARSEABLE: &[&str] = &["", "   \n", "plain words only", "\u{0}\u{1}PK binary"];

pub fn api_serving(pages: Vec<&str>) -> (ScraperApi<MockFetcher>, MockFetcher) {
    let fetcher = MockFetcher::with_responses(pages.into_iter().map(|p| Ok(p.to_string())).collect());
    let api = ScraperApi::new(ContentFetcher::without_resolver(fetcher.clone())).unwrap();
    (api, fetcher)
}

pub fn api_with_resolver(
    page: &str,
    resolver: MockResolver,
) -> ScraperApi<MockFetcher, MockResolver> {
    ScraperApi::new(ContentFetcher::new(MockFetcher::new(page), resolver)).unwrap()
}
