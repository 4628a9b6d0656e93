use serde_json::{Value, json};

use scour_core::error::AppError;

use super::ContentAdapter;
use crate::document::{Document, attr_in, text_of};
use crate::registry::AdapterKind;
use crate::result::ExtractionResult;
use crate::structured::{StructuredData, StructuredItem};
use crate::values::{names_of, opt};

const PAPER_TYPES: &[&str] = &["ScholarlyArticle", "Article"];

#[derive(Debug, Clone, Copy, Default)]
pub struct AcademicAdapter;

impl ContentAdapter for AcademicAdapter {
    fn kind(&self) -> AdapterKind {
        AdapterKind::Academic
    }

    fn extract_document(&self, doc: &Document, _url: &str) -> Result<ExtractionResult, AppError> {
        let data = StructuredData::extract(doc);
        let paper = match data.first_of(&PAPER_TYPES[..1]).or_else(|| data.first_of(&PAPER_TYPES[1..])) {
            Some(item) => from_item(item),
            None => from_markup(doc)?,
        };
        Ok(ExtractionResult::success(
            "academic",
            json!({ "paper": paper, "citations": citations(doc)? }),
        ))
    }
}

fn from_item(item: &StructuredItem) -> Value {
    let authors = item.get(&["author"]).map(names_of).unwrap_or_default();
    let doi = item.text(&["doi"]).or_else(|| {
        item.text(&["identifier"])
            .filter(|id| id.starts_with("10.") || id.contains("doi.org"))
    });
    json!({
        "title": opt(item.text(&["headline"]).or_else(|| item.text(&["name"]))),
        "authors": authors,
        "date_published": opt(item.text(&["datePublished"])),
        "journal": opt(item.name("isPartOf").or_else(|| item.name("publisher"))),
        "abstract": opt(item.text(&["abstract"]).or_else(|| item.text(&["description"]))),
        "doi": opt(doi),
        "url": opt(item.text(&["url"])),
        "citation_count": item.get(&["citationCount"]).cloned().unwrap_or(Value::Null),
    })
}

fn from_markup(doc: &Document) -> Result<Value, AppError> {
    let authors: Vec<String> = doc
        .select(r#".authors-list a, .author-name, [itemprop="author"]"#)?
        .into_iter()
        .map(text_of)
        .filter(|a| !a.is_empty())
        .collect();
    Ok(json!({
        "title": opt(doc.first_text("h1.article-title, h1.title")?),
        "authors": authors,
        "abstract": opt(doc.first_text("div.abstract, section.abstract")?),
        "journal": opt(doc.first_text(".journal-title, .publication-title")?),
        "date_published": opt(doc.first_text(".article-date, .published-on")?),
        "doi": opt(doc.first_text(r#"a[href*="doi.org"], .doi-value"#)?),
        "pdf_url": opt(doc.first_attr(r#"a[href$=".pdf"]"#, "href")?),
    }))
}

/// Reference list plus the advertised citation count (reference count when
/// the page shows none).
fn citations(doc: &Document) -> Result<Value, AppError> {
    let mut references = Vec::new();
    for reference in doc.select(".references li, .citation")? {
        references.push(json!({
            "text": text_of(reference),
            "url": opt(attr_in(reference, "a[href]", "href")?),
        }));
    }
    let count = match doc.first_text(".citation-count, .cited-by-count")? {
        Some(count) => json!(count),
        None => json!(references.len()),
    };
    Ok(json!({ "count": count, "references": references }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn markup_fallback() {
        let result = AcademicAdapter.extract(
            r#"<h1 class="article-title">Research Paper</h1><div class="abstract">Abstract</div>"#,
            "https://journals.com/paper/1",
        );
        assert_eq!(
            serde_json::to_value(&result).unwrap(),
            json!({
                "type": "academic",
                "paper": {
                    "title": "Research Paper",
                    "authors": [],
                    "abstract": "Abstract",
                    "journal": null,
                    "date_published": null,
                    "doi": null,
                    "pdf_url": null
                },
                "citations": {"count": 0, "references": []}
            })
        );
    }

    #[test]
    fn scholarly_article_and_references() {
        let html = r#"<script type="application/ld+json">{"@type":"ScholarlyArticle",
            "headline":"On Graphs","author":[{"@type":"Person","name":"A. Turing"},{"@type":"Person","name":"E. Noether"}],
            "datePublished":"1950","publisher":{"name":"Mind"},"description":"We study graphs.",
            "doi":"10.1000/xyz","citationCount":42}</script>
            <h1 class="title">Markup title</h1>
            <ol class="references"><li>Euler, 1736 <a href="https://doi.org/10.1/e">link</a></li><li>Knuth</li></ol>
            <span class="cited-by-count">Cited by 42</span>"#;
        let result = AcademicAdapter.extract(html, "https://arxiv.org/abs/1");
        let paper = result.get("paper").unwrap();
        assert_eq!(paper["title"], "On Graphs");
        assert_eq!(paper["authors"], json!(["A. Turing", "E. Noether"]));
        assert_eq!(paper["journal"], "Mind");
        assert_eq!(paper["abstract"], "We study graphs.");
        assert_eq!(paper["doi"], "10.1000/xyz");
        assert_eq!(paper["citation_count"], 42);

        let citations = result.get("citations").unwrap();
        assert_eq!(citations["count"], "Cited by 42");
        assert_eq!(
            citations["references"],
            json!([
                {"text": "Euler, 1736 link", "url": "https://doi.org/10.1/e"},
                {"text": "Knuth", "url": null}
            ])
        );
    }
}
