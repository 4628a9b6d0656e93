use scraper::ElementRef;
use serde_json::{Map, Value, json};

use scour_core::error::AppError;

use super::ContentAdapter;
use crate::document::{Document, first_in, text_in, text_of};
use crate::registry::AdapterKind;
use crate::result::ExtractionResult;
use crate::structured::{StructuredData, StructuredItem};
use crate::values::opt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Page {
    Hotel,
    Flight,
    Restaurant,
    Attraction,
    Reviews,
    Other,
}

impl Page {
    fn from_url(url: &str) -> Self {
        let url = url.to_lowercase();
        if url.contains("/hotel/") {
            Page::Hotel
        } else if url.contains("/flights/") || url.contains("/airlines/") {
            Page::Flight
        } else if url.contains("/restaurant/") {
            Page::Restaurant
        } else if url.contains("/attraction/") {
            Page::Attraction
        } else if url.contains("/reviews") {
            Page::Reviews
        } else {
            Page::Other
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TravelAdapter;

impl ContentAdapter for TravelAdapter {
    fn kind(&self) -> AdapterKind {
        AdapterKind::Travel
    }

    fn extract_document(&self, doc: &Document, url: &str) -> Result<ExtractionResult, AppError> {
        let data = StructuredData::extract(doc);
        let (result_type, payload) = match Page::from_url(url) {
            Page::Hotel => ("travel_hotel", hotel(doc, &data)?),
            Page::Flight => ("travel_flight", flight(doc, &data)?),
            Page::Restaurant => ("travel_restaurant", restaurant(doc, &data)?),
            Page::Attraction => ("travel_attraction", attraction(doc, &data)?),
            Page::Reviews => ("travel_reviews", reviews(doc, &data)?),
            Page::Other => ("travel_generic", generic(doc)?),
        };
        Ok(ExtractionResult::success(result_type, Value::Object(payload)))
    }
}

/// Build a payload from `(field, structured value, fallback selector)`
/// triples; the structured value wins when present.
fn merge(
    doc: &Document,
    item: Option<&StructuredItem>,
    fields: &[(&str, &[&str], &str)],
) -> Result<Map<String, Value>, AppError> {
    let mut out = Map::new();
    for (field, path, css) in fields {
        let value = match item.and_then(|i| i.text(path)) {
            Some(v) => Some(v),
            None => doc.first_text(css)?,
        };
        out.insert((*field).to_string(), opt(value));
    }
    Ok(out)
}

fn hotel(doc: &Document, data: &StructuredData) -> Result<Map<String, Value>, AppError> {
    let item = data.first_of(&["Hotel", "LodgingBusiness", "Resort"]);
    let mut out = merge(
        doc,
        item,
        &[
            ("name", &["name"], r#"h1.hotel-name, [data-testid="hotel-name"]"#),
            ("rating", &["aggregateRating", "ratingValue"], r#"[itemprop="ratingValue"], .rating-value"#),
            ("review_count", &["aggregateRating", "reviewCount"], r#"[itemprop="reviewCount"], .review-count"#),
            ("price", &["priceRange"], ".price, .prco-valign-middle-helper"),
        ],
    )?;
    let amenities: Vec<String> = match item.and_then(|i| i.get(&["amenityFeature"])) {
        Some(Value::Array(features)) => features
            .iter()
            .filter_map(|f| f.get("name").and_then(Value::as_str).map(str::to_string))
            .collect(),
        _ => doc
            .select(".amenity, .hotel-facilities li")?
            .into_iter()
            .map(text_of)
            .collect(),
    };
    out.insert("amenities".into(), json!(amenities));
    let location = match item.and_then(|i| i.text(&["address", "streetAddress"])) {
        Some(street) => Some(street),
        None => doc.first_text(r#".address, [data-testid="address"]"#)?,
    };
    out.insert("location".into(), opt(location));
    Ok(out)
}

fn flight(doc: &Document, data: &StructuredData) -> Result<Map<String, Value>, AppError> {
    let item = data.first_of(&["Flight"]);
    let mut out = merge(
        doc,
        item,
        &[
            ("route", &[], r#".route, [data-testid="route"]"#),
            ("price", &["offers", "price"], ".price-text, .f8F1-price-text"),
            ("duration", &["estimatedFlightDuration"], ".duration, .durationTime"),
            ("stops", &[], ".stops, .stopsText"),
            ("airlines", &["airline", "name"], ".airline-name, .airlineText"),
        ],
    )?;
    if let Some(route) = item.and_then(route_of) {
        out.insert("route".into(), json!(route));
    }
    Ok(out)
}

/// `"JFK - LHR"` from the departure and arrival airports (IATA code or name).
fn route_of(item: &StructuredItem) -> Option<String> {
    let airport = |key: &str| item.text(&[key, "iataCode"]).or_else(|| item.text(&[key, "name"]));
    Some(format!("{} - {}", airport("departureAirport")?, airport("arrivalAirport")?))
}

fn restaurant(doc: &Document, data: &StructuredData) -> Result<Map<String, Value>, AppError> {
    merge(
        doc,
        data.first_of(&["Restaurant", "FoodEstablishment"]),
        &[
            ("name", &["name"], r#"h1.restaurant-name, [data-testid="restaurant-detail-name"]"#),
            ("cuisine", &["servesCuisine"], ".cuisine, .restaurant-detail-overview-cuisines"),
            ("rating", &["aggregateRating", "ratingValue"], r#".rating, [data-testid="review-rating"]"#),
            ("price_range", &["priceRange"], ".price-range, .restaurant-details-info-price"),
            ("address", &["address", "streetAddress"], r#".address, [data-testid="restaurant-detail-address"]"#),
        ],
    )
}

fn attraction(doc: &Document, data: &StructuredData) -> Result<Map<String, Value>, AppError> {
    merge(
        doc,
        data.first_of(&["TouristAttraction", "LandmarksOrHistoricalBuildings"]),
        &[
            ("name", &["name"], r#"h1.attraction-name, [data-testid="heading-title"]"#),
            ("rating", &["aggregateRating", "ratingValue"], ".rating, .reviewCountAndRating"),
            ("description", &["description"], ".description, .attraction-overview-description"),
            ("duration", &[], ".duration, .recommended-duration"),
        ],
    )
}

fn reviews(doc: &Document, data: &StructuredData) -> Result<Map<String, Value>, AppError> {
    let mut reviews: Vec<Value> = data.all_of(&["Review"]).into_iter().map(review_from_item).collect();
    if reviews.is_empty() {
        reviews = reviews_from_markup(doc)?;
    }
    let mut out = Map::new();
    out.insert("count".into(), json!(reviews.len()));
    out.insert("reviews".into(), Value::Array(reviews));
    Ok(out)
}

fn review_from_item(item: &StructuredItem) -> Value {
    json!({
        "title": opt(item.text(&["name"]).or_else(|| item.text(&["headline"]))),
        "rating": item.get(&["reviewRating", "ratingValue"]).cloned().unwrap_or(Value::Null),
        "date": opt(item.text(&["datePublished"])),
        "content": opt(item.text(&["reviewBody"])),
        "author": opt(item.name("author")),
    })
}

fn reviews_from_markup(doc: &Document) -> Result<Vec<Value>, AppError> {
    let mut reviews = Vec::new();
    for review in doc.select(".review, .review-container")? {
        let rating = first_in(review, ".rating, .ui_bubble_rating")?;
        reviews.push(json!({
            "title": opt(text_in(review, ".quote, .reviewTitle")?),
            "rating": rating.map(rating_value).unwrap_or(Value::Null),
            "date": opt(text_in(review, ".ratingDate, .review-date")?),
            "content": opt(text_in(review, ".partial_entry, .reviewText")?),
            "author": opt(text_in(review, ".username, .member_info")?),
        }));
    }
    Ok(reviews)
}

/// A `bubble_NN` class reads as `NN / 10`; otherwise the visible text.
fn rating_value(el: ElementRef<'_>) -> Value {
    let from_class = el
        .value()
        .classes()
        .find_map(|c| c.strip_prefix("bubble_"))
        .and_then(|n| n.parse::<u32>().ok())
        .map(|n| f64::from(n) / 10.0);
    match from_class {
        Some(stars) => json!(stars),
        None => {
            let text = text_of(el);
            if text.is_empty() { Value::Null } else { json!(text) }
        }
    }
}

fn generic(doc: &Document) -> Result<Map<String, Value>, AppError> {
    let images: Vec<String> = doc
        .select("img[src]")?
        .into_iter()
        .filter_map(|img| img.value().attr("src"))
        .filter(|src| src.starts_with("http"))
        .take(5)
        .map(str::to_string)
        .collect();
    let mut out = Map::new();
    out.insert("title".into(), opt(doc.first_text("h1")?));
    out.insert("description".into(), opt(doc.meta_description()?));
    out.insert("images".into(), json!(images));
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hotel_markup() {
        let result = TravelAdapter.extract(
            r#"<h1 class="hotel-name">Hotel Test</h1><ul class="hotel-facilities"><li>Pool</li><li>Wifi</li></ul>"#,
            "https://travel.com/hotel/1",
        );
        assert_eq!(result.result_type(), "travel_hotel");
        assert_eq!(result.get("name"), Some(&json!("Hotel Test")));
        assert_eq!(result.get("amenities"), Some(&json!(["Pool", "Wifi"])));
        assert_eq!(result.get("rating"), Some(&Value::Null));
    }

    #[test]
    fn hotel_metadata_first() {
        let html = r#"<script type="application/ld+json">{"@type":"Hotel","name":"Grand",
            "aggregateRating":{"ratingValue":"8.9","reviewCount":"1200"},
            "address":{"streetAddress":"1 Sea Rd"},"amenityFeature":[{"name":"Spa"}]}</script>
            <h1 class="hotel-name">Markup</h1><span class="price">$210</span>"#;
        let result = TravelAdapter.extract(html, "https://www.booking.com/hotel/gr/grand.html");
        assert_eq!(
            serde_json::to_value(&result).unwrap(),
            json!({
                "type": "travel_hotel",
                "name": "Grand",
                "rating": "8.9",
                "review_count": "1200",
                "price": "$210",
                "amenities": ["Spa"],
                "location": "1 Sea Rd"
            })
        );
    }

    #[test]
    fn reviews_with_bubble_ratings() {
        let result = TravelAdapter.extract(
            r#"<div class="review"><span class="ui_bubble_rating bubble_45"></span>
                 <span class="quote">Lovely</span><p class="partial_entry">Great stay</p></div>
               <div class="review"><span class="rating">Good</span></div>"#,
            "https://www.tripadvisor.com/reviews?id=1",
        );
        assert_eq!(result.result_type(), "travel_reviews");
        assert_eq!(result.get("count"), Some(&json!(2)));
        let reviews = result.get("reviews").unwrap();
        assert_eq!(reviews[0]["rating"], json!(4.5));
        assert_eq!(reviews[0]["title"], "Lovely");
        assert_eq!(reviews[1]["rating"], "Good");
    }

    #[test]
    fn flight_metadata_first() {
        let html = r#"<script type="application/ld+json">{"@type":"Flight",
            "departureAirport":{"@type":"Airport","iataCode":"JFK"},"arrivalAirport":{"@type":"Airport","name":"Heathrow"},
            "airline":{"@type":"Airline","name":"Oceanic"},"estimatedFlightDuration":"PT7H"}</script>
            <div class="route">NYC to LON</div><span class="price-text">$540</span><span class="stops">Nonstop</span>"#;
        let result = TravelAdapter.extract(html, "https://www.kayak.com/flights/JFK-LHR");
        assert_eq!(
            serde_json::to_value(&result).unwrap(),
            json!({
                "type": "travel_flight",
                "route": "JFK - Heathrow",
                "price": "$540",
                "duration": "PT7H",
                "stops": "Nonstop",
                "airlines": "Oceanic"
            })
        );
    }

    #[test]
    fn flight_markup() {
        let result = TravelAdapter.extract(
            r#"<div class="route">NYC to LON</div><span class="airline-name">Oceanic</span>"#,
            "https://www.kayak.com/flights/JFK-LHR",
        );
        assert_eq!(result.get("route"), Some(&json!("NYC to LON")));
        assert_eq!(result.get("airlines"), Some(&json!("Oceanic")));
        assert_eq!(result.get("duration"), Some(&Value::Null));
    }

    #[test]
    fn review_metadata_first() {
        let html = r#"<script type="application/ld+json">[
            {"@type":"Review","name":"Superb","reviewBody":"Loved it","datePublished":"2024-02-02",
             "author":{"@type":"Person","name":"Kim"},"reviewRating":{"@type":"Rating","ratingValue":5}},
            {"@type":"Review","reviewBody":"Fine","reviewRating":{"ratingValue":"3"}}]</script>
            <div class="review"><span class="quote">Markup review</span></div>"#;
        let result = TravelAdapter.extract(html, "https://www.tripadvisor.com/reviews?id=9");
        assert_eq!(result.get("count"), Some(&json!(2)));
        let reviews = result.get("reviews").unwrap();
        assert_eq!(
            reviews[0],
            json!({"title": "Superb", "rating": 5, "date": "2024-02-02", "content": "Loved it", "author": "Kim"})
        );
        assert_eq!(reviews[1]["rating"], "3");
        assert_eq!(reviews[1]["title"], Value::Null);
    }

    #[test]
    fn generic_travel_page() {
        let result = TravelAdapter.extract(
            r#"<head><meta name="description" content="Trips"></head><body><h1>Explore</h1>
               <img src="/local.png"><img src="https://cdn/x.jpg"></body>"#,
            "https://www.kayak.com/explore",
        );
        assert_eq!(
            serde_json::to_value(&result).unwrap(),
            json!({"type": "travel_generic", "title": "Explore", "description": "Trips", "images": ["https://cdn/x.jpg"]})
        );
    }

    #[test]
    fn page_detection() {
        assert_eq!(Page::from_url("https://x.com/flights/a-b"), Page::Flight);
        assert_eq!(Page::from_url("https://x.com/Restaurant/1"), Page::Restaurant);
        assert_eq!(Page::from_url("https://x.com/attraction/1"), Page::Attraction);
    }
}
