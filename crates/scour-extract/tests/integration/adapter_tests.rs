use serde_json::{Value, json};

use scour_extract::{AdapterKind, AdapterRegistry, ContentAdapter, ExtractionResult, adapter_for};

use crate::integration::common::{FIXTURES, UNPARSEABLE};

fn kind_named(name: &str) -> AdapterKind {
    AdapterKind::ALL
        .into_iter()
        .find(|k| k.as_str() == name)
        .unwrap()
}

#[test]
fn every_family_extracts_its_minimal_page() {
    for (family, url, html) in FIXTURES {
        let result = adapter_for(kind_named(family)).extract(html, url);
        assert!(!result.is_error(), "{family}: {:?}", result.error());

        let result_type = result.result_type();
        match *family {
            "financial" => assert_eq!(result_type, "income-statement"),
            "government" => assert_eq!(result_type, "government_page"),
            "travel" => assert_eq!(result_type, "travel_hotel"),
            other => assert_eq!(result_type, other),
        }
    }
}

#[test]
fn product_card_has_name_and_numeric_price() {
    let (_, url, html) = FIXTURES[0];
    let result = adapter_for(AdapterKind::Ecommerce).extract(html, url);
    let product = &result.get("products").unwrap()[0];
    assert_eq!(product["name"], "Test Product");
    assert_eq!(product["price"].as_f64(), Some(19.99));
}

#[test]
fn unparseable_input_is_a_type_and_error_record() {
    for kind in AdapterKind::ALL {
        for input in UNPARSEABLE {
            let result = adapter_for(kind).extract(input, "https://example.com/x");
            let value = serde_json::to_value(&result).unwrap();
            let object = value.as_object().unwrap();

            assert_eq!(object.len(), 2, "{kind}: {value}");
            assert_eq!(object["type"], kind.as_str());
            assert!(!object["error"].as_str().unwrap().is_empty());
        }
    }
}

#[test]
fn serialized_type_comes_first() {
    for (family, url, html) in FIXTURES {
        let result = adapter_for(kind_named(family)).extract(html, url);
        let text = serde_json::to_string(&result).unwrap();
        assert!(text.starts_with(r#"{"type":""#), "{text}");
    }
}

/// The metadata path and the markup path feed the same payload shape, and a
/// page carrying both is read from its metadata alone.
#[test]
fn structured_metadata_takes_precedence_over_markup() {
    let jsonld = r#"<script type="application/ld+json">{"@context":"https://schema.org","@type":"Product",
        "name":"Structured Widget","description":"From metadata",
        "offers":{"@type":"Offer","price":"42.00","priceCurrency":"GBP"}}</script>"#;
    let markup = r#"<div class="product"><span class="product-name">Markup Widget</span><span class="price">$5.00</span></div>"#;
    let url = "https://shop.com/product/1";
    let ecommerce = adapter_for(AdapterKind::Ecommerce);

    let both = ecommerce.extract(&format!("{jsonld}{markup}"), url);
    let expected = json!([{
        "name": "Structured Widget",
        "price": 42.0,
        "currency": "GBP",
        "description": "From metadata",
        "category": "general"
    }]);
    assert_eq!(both.get("products"), Some(&expected));

    let markup_only = ecommerce.extract(markup, url);
    let fallback = markup_only.get("products").unwrap();
    assert_ne!(fallback, &expected);
    assert_eq!(
        fallback,
        &json!([{"name": "Markup Widget", "price": 5.0, "currency": "USD"}])
    );
}

#[test]
fn news_metadata_takes_precedence_over_markup() {
    let html = r#"<script type="application/ld+json">{"@type":"Article","headline":"From metadata","author":"Jo"}</script>
        <article><h1 class="headline">From markup</h1></article>"#;
    let result = adapter_for(AdapterKind::News).extract(html, "https://news.com/a");
    let data = result.get("data").unwrap();
    assert_eq!(data["headline"], "From metadata");
    assert_eq!(data["author"], "Jo");
    assert!(data.get("content_html").is_none());
}

#[test]
fn registry_routes_to_adapters_end_to_end() {
    let registry = AdapterRegistry::builtin().unwrap();
    let url = "https://www.etsy.com/listing/1";
    let kind = registry.select(url);
    assert_eq!(kind, AdapterKind::Ecommerce);

    let (_, _, html) = FIXTURES[0];
    let result: ExtractionResult = adapter_for(kind).extract(html, url);
    assert_eq!(result.result_type(), "ecommerce");
}

#[test]
fn empty_families_still_report_their_shape() {
    // a page with nothing a family recognizes is a success with empty fields
    let html = "<p>nothing relevant</p>";
    let jobs = adapter_for(AdapterKind::JobBoard).extract(html, "https://jobs.com/");
    assert_eq!(jobs.get("jobs"), Some(&json!([])));

    let social = adapter_for(AdapterKind::SocialMedia).extract(html, "https://twitter.com/x");
    assert_eq!(social.get("content"), Some(&Value::Null));
}

struct PrecedenceCase {
    kind: AdapterKind,
    url: &'static str,
    metadata: &'static str,
    markup: &'static str,
    /// JSON pointer into the serialized record.
    field: &'static str,
    from_metadata: Value,
    from_markup: Value,
}

fn jsonld(body: &str) -> String {
    format!(r#"<script type="application/ld+json">{body}</script>"#)
}

fn field_of(kind: AdapterKind, html: &str, url: &str, pointer: &str) -> Value {
    let record = serde_json::to_value(adapter_for(kind).extract(html, url)).unwrap();
    record.pointer(pointer).cloned().unwrap_or(Value::Null)
}

fn precedence_cases() -> Vec<PrecedenceCase> {
    vec![
        PrecedenceCase {
            kind: AdapterKind::SocialMedia,
            url: "https://twitter.com/alice/status/1",
            metadata: r#"{"@type":"SocialMediaPosting","author":{"name":"Alice"},"articleBody":"Meta post"}"#,
            markup: r#"<div data-testid="tweetText">Markup post</div>"#,
            field: "/content",
            from_metadata: json!("Meta post"),
            from_markup: json!("Markup post"),
        },
        PrecedenceCase {
            kind: AdapterKind::Forum,
            url: "https://forum.com/thread/1",
            metadata: r#"{"@type":"DiscussionForumPosting","headline":"Meta thread","text":"Meta body"}"#,
            markup: r#"<h1 class="title">Markup thread</h1><div class="post-content">Markup body</div>"#,
            field: "/data/title",
            from_metadata: json!("Meta thread"),
            from_markup: json!("Markup thread"),
        },
        PrecedenceCase {
            kind: AdapterKind::JobBoard,
            url: "https://jobs.com/search",
            metadata: r#"{"@type":"JobPosting","title":"Meta Engineer","hiringOrganization":{"name":"Acme"}}"#,
            markup: r#"<div class="job"><span class="title">Markup Engineer</span></div>"#,
            field: "/jobs/0/title",
            from_metadata: json!("Meta Engineer"),
            from_markup: json!("Markup Engineer"),
        },
        PrecedenceCase {
            kind: AdapterKind::RealEstate,
            url: "https://realestate.com/listing/1",
            metadata: r#"{"@type":"House","address":{"streetAddress":"1 Meta St"},"offers":{"price":"350000"}}"#,
            markup: r#"<div class="property"><span class="address">9 Markup Rd</span><span class="price">$200,000</span></div>"#,
            field: "/properties/0/address",
            from_metadata: json!("1 Meta St"),
            from_markup: json!("9 Markup Rd"),
        },
        PrecedenceCase {
            kind: AdapterKind::Financial,
            url: "https://finance.com/quote/META",
            metadata: r#"{"@type":"Corporation","name":"Meta Corp","tickerSymbol":"META"}"#,
            markup: r#"<span data-symbol="MKUP">MKUP</span>"#,
            field: "/symbol",
            from_metadata: json!("META"),
            from_markup: json!("MKUP"),
        },
        PrecedenceCase {
            kind: AdapterKind::Government,
            url: "https://data.gov/catalog",
            metadata: r#"{"@type":"Dataset","name":"Meta dataset"}"#,
            markup: r#"<div class="dataset"><h3 class="dataset-title">Markup dataset</h3></div>"#,
            field: "/datasets/0/title",
            from_metadata: json!("Meta dataset"),
            from_markup: json!("Markup dataset"),
        },
        PrecedenceCase {
            kind: AdapterKind::Academic,
            url: "https://journal.org/article/1",
            metadata: r#"{"@type":"ScholarlyArticle","headline":"Meta paper"}"#,
            markup: r#"<h1 class="article-title">Markup paper</h1>"#,
            field: "/paper/title",
            from_metadata: json!("Meta paper"),
            from_markup: json!("Markup paper"),
        },
        PrecedenceCase {
            kind: AdapterKind::Travel,
            url: "https://travel.com/hotel/1",
            metadata: r#"{"@type":"Hotel","name":"Meta Inn"}"#,
            markup: r#"<h1 class="hotel-name">Markup Inn</h1>"#,
            field: "/name",
            from_metadata: json!("Meta Inn"),
            from_markup: json!("Markup Inn"),
        },
        PrecedenceCase {
            kind: AdapterKind::Travel,
            url: "https://travel.com/flights/NYC-LON",
            metadata: r#"{"@type":"Flight","airline":{"@type":"Airline","name":"Meta Air"}}"#,
            markup: r#"<span class="airline-name">Markup Air</span>"#,
            field: "/airlines",
            from_metadata: json!("Meta Air"),
            from_markup: json!("Markup Air"),
        },
        PrecedenceCase {
            kind: AdapterKind::Travel,
            url: "https://travel.com/reviews/1",
            metadata: r#"{"@type":"Review","reviewBody":"Meta review"}"#,
            markup: r#"<div class="review"><p class="partial_entry">Markup review</p></div>"#,
            field: "/reviews/0/content",
            from_metadata: json!("Meta review"),
            from_markup: json!("Markup review"),
        },
        PrecedenceCase {
            kind: AdapterKind::Generic,
            url: "https://example.com/page",
            metadata: r#"{"@type":"Recipe","name":"Meta soup"}"#,
            markup: r#"<p>Markup soup</p>"#,
            field: "/content",
            from_metadata: json!({"name": "Meta soup", "@type": "Recipe"}),
            from_markup: json!("Markup soup"),
        },
    ]
}

/// Each family reads a page carrying both sources from its metadata, and
/// falls back to a different, non-empty markup reading without it.
#[test]
fn every_family_prefers_metadata_over_markup() {
    for case in precedence_cases() {
        let script = jsonld(case.metadata);
        let label = format!("{} at {}", case.kind, case.url);

        let both = field_of(case.kind, &format!("{script}{}", case.markup), case.url, case.field);
        let metadata_only = field_of(case.kind, &script, case.url, case.field);
        let markup_only = field_of(case.kind, case.markup, case.url, case.field);

        assert_eq!(both, case.from_metadata, "{label}: page with both sources");
        assert_eq!(metadata_only, case.from_metadata, "{label}: metadata only");
        assert_eq!(markup_only, case.from_markup, "{label}: markup only");
        assert_ne!(markup_only, both, "{label}: fallback should differ");
    }
}

/// Items of one type come back in page order whatever source carried them.
#[test]
fn mixed_sources_keep_page_order() {
    let html = r#"<div itemscope itemtype="https://schema.org/JobPosting"><span itemprop="title">FIRST</span></div>
        <script type="application/ld+json">{"@type":"JobPosting","title":"SECOND"}</script>
        <div itemscope itemtype="https://schema.org/JobPosting"><span itemprop="title">THIRD</span></div>"#;
    let result = adapter_for(AdapterKind::JobBoard).extract(html, "https://jobs.com/search");

    let titles: Vec<&str> = result
        .get("jobs")
        .and_then(Value::as_array)
        .unwrap()
        .iter()
        .filter_map(|job| job["title"].as_str())
        .collect();
    assert_eq!(titles, ["FIRST", "SECOND", "THIRD"]);
}
