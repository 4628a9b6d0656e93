use std::sync::LazyLock;

use regex::Regex;
use serde_json::{Value, json};

use scour_core::error::AppError;

use super::ContentAdapter;
use crate::document::{Document, text_in};
use crate::registry::AdapterKind;
use crate::result::ExtractionResult;
use crate::structured::{StructuredData, StructuredItem};
use crate::values::{capture_number, opt, opt_num, parse_listing_price};

const PROPERTY_TYPES: &[&str] = &[
    "SingleFamilyResidence",
    "Apartment",
    "House",
    "Residence",
    "RealEstateListing",
];

struct DetailPatterns {
    bedrooms: Regex,
    bathrooms: Regex,
    sqft: Regex,
}

static DETAILS: LazyLock<Result<DetailPatterns, regex::Error>> = LazyLock::new(|| {
    Ok(DetailPatterns {
        bedrooms: Regex::new(r"(\d+(?:\.\d+)?)\s*bed")?,
        bathrooms: Regex::new(r"(\d+(?:\.\d+)?)\s*bath")?,
        sqft: Regex::new(r"(\d+(?:\.\d+)?)\s*sq\.?\s*ft")?,
    })
});

#[derive(Debug, Clone, Copy, Default)]
pub struct RealEstateAdapter;

impl ContentAdapter for RealEstateAdapter {
    fn kind(&self) -> AdapterKind {
        AdapterKind::RealEstate
    }

    fn extract_document(&self, doc: &Document, _url: &str) -> Result<ExtractionResult, AppError> {
        let data = StructuredData::extract(doc);
        let listings = data.all_of(PROPERTY_TYPES);

        let properties = if listings.is_empty() {
            from_markup(doc)?
        } else {
            listings.into_iter().map(from_item).collect()
        };
        Ok(ExtractionResult::success(
            "real_estate",
            json!({ "properties": properties }),
        ))
    }
}

fn from_item(item: &StructuredItem) -> Value {
    json!({
        "address": opt(item.text(&["address", "streetAddress"]).or_else(|| item.text(&["address"]))),
        "price": opt_num(item.number(&["offers", "price"])),
        "bedrooms": opt_num(item.number(&["numberOfBedrooms"]).or_else(|| item.number(&["numberOfRooms"]))),
        "bathrooms": opt_num(item.number(&["numberOfBathroomsTotal"]).or_else(|| item.number(&["numberOfBathrooms"]))),
        "sqft": opt_num(item.number(&["floorSize", "value"])),
    })
}

/// Listing cards with both an address and a price.
fn from_markup(doc: &Document) -> Result<Vec<Value>, AppError> {
    let patterns = DETAILS
        .as_ref()
        .map_err(|e| AppError::Generic(format!("Invalid listing detail pattern: {e}")))?;

    let mut properties = Vec::new();
    for card in doc.select(".property, .listing, .result")? {
        let address = text_in(card, ".address, .location")?;
        let price = text_in(card, ".price, .list-price")?;
        let (Some(address), Some(price)) = (address, price) else {
            continue;
        };

        let mut property = json!({
            "address": address,
            "price": opt_num(parse_listing_price(&price)),
        });
        if let Some(details) = text_in(card, ".details, .specs")? {
            let details = details.to_lowercase();
            property["bedrooms"] = opt_num(capture_number(&patterns.bedrooms, &details));
            property["bathrooms"] = opt_num(capture_number(&patterns.bathrooms, &details));
            property["sqft"] = opt_num(capture_number(&patterns.sqft, &details));
        }
        properties.push(property);
    }
    Ok(properties)
}
