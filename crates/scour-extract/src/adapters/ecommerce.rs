use serde_json::{Value, json};

use scour_core::error::AppError;

use super::ContentAdapter;
use crate::document::{Document, text_in};
use crate::registry::AdapterKind;
use crate::result::ExtractionResult;
use crate::structured::{StructuredData, StructuredItem};
use crate::values::{opt, opt_num, parse_price};

#[derive(Debug, Clone, Copy, Default)]
pub struct EcommerceAdapter;

impl ContentAdapter for EcommerceAdapter {
    fn kind(&self) -> AdapterKind {
        AdapterKind::Ecommerce
    }

    fn extract_document(&self, doc: &Document, url: &str) -> Result<ExtractionResult, AppError> {
        let data = StructuredData::extract(doc);
        let items = data.all_of(&["Product"]);

        let products = if items.is_empty() {
            from_markup(doc)?
        } else {
            items.into_iter().map(|item| from_item(item, url)).collect()
        };

        Ok(ExtractionResult::success(
            "ecommerce",
            json!({ "products": products }),
        ))
    }
}

fn from_item(item: &StructuredItem, url: &str) -> Value {
    let price = item
        .number(&["offers", "price"])
        .or_else(|| item.number(&["offers", "lowPrice"]));
    json!({
        "name": opt(item.text(&["name"])),
        "price": opt_num(price),
        "currency": opt(item.text(&["offers", "priceCurrency"])),
        "description": opt(item.text(&["description"])),
        "category": category_for(url),
    })
}

/// Product cards: a name and a price inside `.product`/`.item`.
fn from_markup(doc: &Document) -> Result<Vec<Value>, AppError> {
    let mut products = Vec::new();
    for card in doc.select(".product, .item")? {
        let name = text_in(card, r#".product-name, .title, [itemprop="name"]"#)?;
        let price = text_in(card, r#".price, .product-price, [itemprop="price"]"#)?;
        let (Some(name), Some(price_text)) = (name, price) else {
            continue;
        };
        let currency = price_text.contains('$').then(|| "USD".to_string());
        products.push(json!({
            "name": name,
            "price": opt_num(parse_price(&price_text)),
            "currency": opt(currency),
        }));
    }
    Ok(products)
}

fn category_for(url: &str) -> &'static str {
    ["electronics", "clothing", "books"]
        .into_iter()
        .find(|c| url.contains(&format!("/{c}/")))
        .unwrap_or("general")
}
