use scour_core::models::Provenance;
use scour_core::testutil::MockResolver;
use scour_core::traits::Resolution;

use crate::integration::common::{api_serving, api_with_resolver};

const CHALLENGE: &str = r#"<html><head><title>Just a moment...</title></head>
    <body><div class="cf-browser-verification">Checking your browser (Cloudflare)</div></body></html>"#;
const PRODUCT: &str = r#"<div class="product"><span class="product-name">Lamp</span><span class="price">$30</span></div>"#;

#[tokio::test]
async fn resolved_challenge_is_extracted() {
    let resolver = MockResolver::new(vec![Some(Resolution {
        html: PRODUCT.into(),
        provenance: Provenance::CaptchaSolvedAutomated,
    })]);
    let api = api_with_resolver(CHALLENGE, resolver.clone());

    let result = api.extract_products("https://shop.example/lamp").await.unwrap();
    assert_eq!(resolver.call_count(), 1);
    assert_eq!(result.get("products").unwrap()[0]["name"], "Lamp");
}

#[tokio::test]
async fn unresolved_challenge_falls_back_to_original_page() {
    let resolver = MockResolver::new(vec![None]);
    let api = api_with_resolver(CHALLENGE, resolver.clone());

    let doc = api.get_content("https://shop.example/lamp", false).await.unwrap();
    assert_eq!(doc.html, CHALLENGE);
    assert_eq!(doc.provenance, Provenance::Direct);
    assert_eq!(resolver.call_count(), 1);
}

#[tokio::test]
async fn forced_escalation_on_clean_page() {
    let resolver = MockResolver::new(vec![Some(Resolution {
        html: PRODUCT.into(),
        provenance: Provenance::CaptchaSolvedInteractive,
    })]);
    let api = api_with_resolver("<p>clean</p>", resolver.clone());

    let result = api.scrape("https://www.amazon.com/dp/1", true).await.unwrap();
    assert_eq!(resolver.call_count(), 1);
    assert_eq!(result.get("products").unwrap()[0]["price"].as_f64(), Some(30.0));
}

#[tokio::test]
async fn batch_records_every_url() {
    let (api, fetcher) = api_serving(vec![PRODUCT, "", "<h1>Plain</h1>"]);
    let urls = vec![
        "https://www.walmart.com/ip/1".to_string(),
        "https://www.nytimes.com/2024/x.html".to_string(),
        "https://example.org/".to_string(),
    ];

    let results = api.extract_batch(&urls).await;
    assert_eq!(fetcher.call_count(), 3);
    assert_eq!(results.len(), 3);
    assert!(!results[0].is_error());
    assert_eq!(results[1].result_type(), "news");
    assert!(results[1].is_error());
    assert_eq!(results[2].result_type(), "generic");
}
