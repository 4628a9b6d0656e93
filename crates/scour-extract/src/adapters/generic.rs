use serde_json::{Value, json};

use scour_core::error::AppError;

use super::news::ARTICLE_TYPES;
use super::{ContentAdapter, EcommerceAdapter, NewsAdapter};
use crate::document::{Document, text_in, text_of};
use crate::registry::AdapterKind;
use crate::result::ExtractionResult;
use crate::structured::{StructuredData, StructuredItem};
use crate::values::{name_of, opt, opt_num};

const LISTING_ITEMS: &str = ".item, .listing, .result";

/// A page needs more listing items than this to be read as a listing.
const LISTING_THRESHOLD: usize = 5;

/// Fallback for URLs no family pattern claims.
///
/// Recognizes articles and product pages and hands them to the matching
/// adapter. Listing pages become a `listing` record; anything else a
/// `generic` record with title, main content and page metadata.
#[derive(Debug, Clone, Copy, Default)]
pub struct GenericAdapter;

impl ContentAdapter for GenericAdapter {
    fn kind(&self) -> AdapterKind {
        AdapterKind::Generic
    }

    fn extract_document(&self, doc: &Document, url: &str) -> Result<ExtractionResult, AppError> {
        if doc.exists("article")? {
            return NewsAdapter.extract_document(doc, url);
        }
        if doc.exists(r#"[itemtype*="Product"]"#)? {
            return EcommerceAdapter.extract_document(doc, url);
        }
        if doc.count(LISTING_ITEMS)? > LISTING_THRESHOLD {
            return listing(doc);
        }

        let data = StructuredData::extract(doc);
        Ok(ExtractionResult::success(
            "generic",
            json!({
                "title": opt(doc.title()),
                "content": main_content(doc, &data)?,
                "metadata": metadata(doc, &data)?,
            }),
        ))
    }
}

fn listing(doc: &Document) -> Result<ExtractionResult, AppError> {
    let mut items = Vec::new();
    for item in doc.select(LISTING_ITEMS)? {
        let url = (item.value().name() == "a")
            .then(|| item.value().attr("href"))
            .flatten()
            .map(str::to_string);
        items.push(json!({
            "title": opt(text_in(item, ".title, .name, h3")?),
            "description": opt(text_in(item, ".description, .summary")?),
            "url": opt(url),
        }));
    }
    Ok(ExtractionResult::success("listing", json!({ "items": items })))
}

/// First JSON-LD item, then `<article>` text, then the whole document text.
fn main_content(doc: &Document, data: &StructuredData) -> Result<Value, AppError> {
    if let Some(item) = data.first_jsonld() {
        return Ok(summarize(item));
    }
    if let Some(article) = doc.first("article")? {
        return Ok(json!(text_of(article)));
    }
    Ok(json!(doc.text()))
}

fn summarize(item: &StructuredItem) -> Value {
    if item.item_type == "Product" {
        json!({
            "type": "product",
            "name": opt(item.text(&["name"])),
            "price": opt_num(item.number(&["offers", "price"])),
            "description": opt(item.text(&["description"])),
        })
    } else if ARTICLE_TYPES.contains(&item.item_type.as_str()) {
        json!({
            "type": "article",
            "headline": opt(item.text(&["headline"])),
            "author": opt(item.get(&["author"]).and_then(name_of)),
            "content": opt(item.text(&["articleBody"])),
        })
    } else {
        let mut properties = item.properties.clone();
        properties.insert("@type".into(), json!(item.item_type));
        Value::Object(properties)
    }
}

fn metadata(doc: &Document, data: &StructuredData) -> Result<Value, AppError> {
    let published = doc
        .first("time[datetime], .date, .published, .pubdate")?
        .map(|el| match el.value().attr("datetime") {
            Some(dt) => dt.trim().to_string(),
            None => text_of(el),
        });
    let keywords: Vec<String> = doc
        .meta_content(r#"meta[name="keywords"]"#)?
        .map(|k| {
            k.split(',')
                .map(|k| k.trim().to_string())
                .filter(|k| !k.is_empty())
                .collect()
        })
        .unwrap_or_default();
    let open_graph = data
        .open_graph()
        .map(|og| Value::Object(og.properties.clone()))
        .unwrap_or(Value::Null);

    Ok(json!({
        "author": opt(doc.first_text(r#"[itemprop="author"], .author, .byline"#)?),
        "published_date": opt(published),
        "keywords": keywords,
        "category": opt(doc.first_text(r#".category, [itemprop="articleSection"]"#)?),
        "open_graph": open_graph,
    }))
}
