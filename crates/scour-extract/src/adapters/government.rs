use scraper::ElementRef;
use serde_json::{Value, json};
use url::Url;

use scour_core::error::AppError;

use super::ContentAdapter;
use crate::document::{Document, attr_in, normalize_whitespace, selector, text_in, text_of};
use crate::registry::AdapterKind;
use crate::result::ExtractionResult;
use crate::structured::{StructuredData, StructuredItem};
use crate::values::{as_text, lookup, opt};

const AGENCY: &str = ".agency-name, .department-name";
const DOWNLOADS: &str = r#"a[href$=".csv"], a[href$=".json"], a[href$=".xml"]"#;

#[derive(Debug, Clone, Copy, Default)]
pub struct GovernmentAdapter;

impl ContentAdapter for GovernmentAdapter {
    fn kind(&self) -> AdapterKind {
        AdapterKind::Government
    }

    fn extract_document(&self, doc: &Document, url: &str) -> Result<ExtractionResult, AppError> {
        if let Some(link) = doc.first(r#"a[href$=".pdf"]"#)? {
            return pdf_document(doc, link, url);
        }
        if url.to_lowercase().contains("forms/") {
            return form(doc);
        }

        let data = StructuredData::extract(doc);
        let datasets = data.all_of(&["Dataset", "DataCatalog"]);
        if !datasets.is_empty() {
            let datasets: Vec<Value> = datasets.into_iter().map(dataset_from_item).collect();
            return Ok(catalog(datasets));
        }
        if doc.exists(".dataset, .data-catalog")? {
            return Ok(catalog(datasets_from_markup(doc)?));
        }

        page(doc)
    }
}

fn resolve(base: &str, href: &str) -> String {
    Url::parse(base)
        .and_then(|b| b.join(href))
        .map(String::from)
        .unwrap_or_else(|_| href.to_string())
}

fn pdf_document(doc: &Document, link: ElementRef<'_>, url: &str) -> Result<ExtractionResult, AppError> {
    let title = Some(text_of(link)).filter(|t| !t.is_empty());
    let href = link.value().attr("href").map(|h| resolve(url, h.trim()));
    Ok(ExtractionResult::success(
        "government_document",
        json!({
            "document_type": "pdf",
            "title": opt(title),
            "url": opt(href),
            "description": opt(doc.meta_description()?),
            "published_date": opt(doc.meta_content(r#"meta[property="article:published_time"]"#)?),
            "agency": opt(doc.first_text(AGENCY)?),
        }),
    ))
}

fn form(doc: &Document) -> Result<ExtractionResult, AppError> {
    let title = doc.first_text("h1.form-title")?.or_else(|| doc.title());
    let fields = match doc.first("form")? {
        Some(form) => form_fields(doc, form)?,
        None => Vec::new(),
    };
    Ok(ExtractionResult::success(
        "government_form",
        json!({
            "title": opt(title),
            "description": opt(doc.meta_description()?),
            "fields": fields,
        }),
    ))
}

/// Inputs of `form`, each labelled by the nearest `<label>` before it in
/// document order.
fn form_fields(doc: &Document, form: ElementRef<'_>) -> Result<Vec<Value>, AppError> {
    let inputs = selector("input, select, textarea")?;
    let labels = selector("label")?;

    let mut fields = Vec::new();
    let mut last_label: Option<String> = None;
    for el in doc.root().descendants().filter_map(ElementRef::wrap) {
        if labels.matches(&el) {
            last_label = Some(text_of(el));
        } else if inputs.matches(&el) && el.ancestors().any(|a| a.id() == form.id()) {
            fields.push(json!({
                "name": opt(el.value().attr("name").map(str::to_string)),
                "type": el.value().name(),
                "label": opt(last_label.clone()),
            }));
        }
    }
    Ok(fields)
}

fn catalog(datasets: Vec<Value>) -> ExtractionResult {
    ExtractionResult::success(
        "data_catalog",
        json!({ "count": datasets.len(), "datasets": datasets }),
    )
}

fn dataset_from_item(item: &StructuredItem) -> Value {
    let download = lookup(&item.properties, &["distribution", "contentUrl"]).and_then(as_text);
    let format = lookup(&item.properties, &["distribution", "encodingFormat"])
        .and_then(as_text)
        .or_else(|| download.as_deref().and_then(extension));
    json!({
        "title": opt(item.text(&["name"])),
        "description": opt(item.text(&["description"])),
        "download_url": opt(download),
        "format": opt(format),
    })
}

fn datasets_from_markup(doc: &Document) -> Result<Vec<Value>, AppError> {
    let mut datasets = Vec::new();
    for entry in doc.select(".dataset, .catalog-item")? {
        let download = attr_in(entry, DOWNLOADS, "href")?;
        let format = download.as_deref().and_then(extension);
        datasets.push(json!({
            "title": opt(text_in(entry, ".dataset-title, .catalog-title")?),
            "description": opt(text_in(entry, ".dataset-description, .catalog-desc")?),
            "download_url": opt(download),
            "format": opt(format),
        }));
    }
    Ok(datasets)
}

fn extension(href: &str) -> Option<String> {
    href.rsplit_once('.').map(|(_, ext)| ext.to_lowercase())
}

fn page(doc: &Document) -> Result<ExtractionResult, AppError> {
    let title = doc.first_text("h1.documentFirstHeading, h1.page-title")?;
    let content = doc.first_text("#content-core, #main-content, .document-content")?;

    let notices: Vec<Value> = doc
        .select(".notice, .alert")?
        .into_iter()
        .map(|notice| {
            let level = notice
                .value()
                .attr("class")
                .map(normalize_whitespace)
                .unwrap_or_default();
            json!({ "text": text_of(notice), "level": level })
        })
        .collect();

    let related_links: Vec<Value> = doc
        .select(".related-links a[href], .sidebar a[href]")?
        .into_iter()
        .map(|link| {
            json!({
                "title": text_of(link),
                "url": link.value().attr("href").unwrap_or_default(),
            })
        })
        .collect();

    Ok(ExtractionResult::success(
        "government_page",
        json!({
            "title": opt(title),
            "content": opt(content),
            "agency": opt(doc.first_text(AGENCY)?),
            "notices": notices,
            "related_links": related_links,
        }),
    ))
}
