use serde_json::{Value, json};

use scour_core::error::AppError;

use super::ContentAdapter;
use crate::document::{Document, text_excluding, text_of};
use crate::registry::AdapterKind;
use crate::result::ExtractionResult;
use crate::structured::{StructuredData, StructuredItem};
use crate::values::{name_of, opt, url_of};

pub(crate) const ARTICLE_TYPES: &[&str] = &["NewsArticle", "Article", "BlogPosting", "ReportageNewsArticle"];

/// Subtrees dropped from article body text.
const BOILERPLATE: &str = "script, style, aside, .ad-container, .comments-section";

#[derive(Debug, Clone, Copy, Default)]
pub struct NewsAdapter;

impl ContentAdapter for NewsAdapter {
    fn kind(&self) -> AdapterKind {
        AdapterKind::News
    }

    fn extract_document(&self, doc: &Document, _url: &str) -> Result<ExtractionResult, AppError> {
        let data = StructuredData::extract(doc);
        let article = match data.first_of(ARTICLE_TYPES) {
            Some(item) => from_item(item),
            None => from_markup(doc)?,
        };
        Ok(ExtractionResult::success("news", json!({ "data": article })))
    }
}

fn from_item(item: &StructuredItem) -> Value {
    json!({
        "headline": opt(item.text(&["headline"])),
        "author": opt(item.get(&["author"]).and_then(name_of)),
        "published_date": opt(item.text(&["datePublished"])),
        "modified_date": opt(item.text(&["dateModified"])),
        "publisher": opt(item.name("publisher")),
        "description": opt(item.text(&["description"])),
        "content": opt(item.text(&["articleBody"])),
        "image": opt(item.get(&["image"]).and_then(url_of)),
    })
}

fn from_markup(doc: &Document) -> Result<Value, AppError> {
    let headline = doc.first_text(r#"h1[itemprop="headline"], h1.article-title, h1.headline"#)?;

    let body = match doc.first("article")? {
        Some(el) => Some(el),
        None => match doc.first(r#"[itemprop="articleBody"]"#)? {
            Some(el) => Some(el),
            None => doc.first(".article-content")?,
        },
    };
    let content = body.map(|el| text_excluding(el, BOILERPLATE)).transpose()?;
    let content_html = body.map(|el| el.html());

    let author = doc.first_text(r#"[itemprop="author"], .author-name, .byline"#)?;

    let published = doc
        .first(r#"[itemprop="datePublished"], time[datetime], .date-published"#)?
        .map(|el| match el.value().attr("datetime") {
            Some(dt) => dt.trim().to_string(),
            None => text_of(el),
        });

    let image = doc.first_attr("article img[src], .article-image img[src]", "src")?;

    Ok(json!({
        "headline": opt(headline),
        "author": opt(author),
        "published_date": opt(published),
        "content": opt(content),
        "content_html": opt(content_html),
        "image": opt(image),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn markup_fallback() {
        let result = NewsAdapter.extract(
            r#"<article><h1 class="headline">Test News</h1><div class="article-content">Content</div>
               <aside>Related</aside><time datetime="2024-05-01">May 1</time></article>"#,
            "https://news.com/article/1",
        );
        assert_eq!(result.result_type(), "news");
        let data = result.get("data").unwrap();
        assert_eq!(data["headline"], "Test News");
        assert_eq!(data["content"], "Test News Content May 1");
        assert_eq!(data["published_date"], "2024-05-01");
        assert!(data["content_html"].as_str().unwrap().starts_with("<article>"));
        assert_eq!(data["author"], Value::Null);
    }

    #[test]
    fn jsonld_article() {
        let html = r#"<script type="application/ld+json">{
            "@context":"https://schema.org","@type":"NewsArticle","headline":"Big Day",
            "author":[{"@type":"Person","name":"Ann Lee"}],"datePublished":"2024-01-02",
            "publisher":{"@type":"Organization","name":"Daily"},
            "image":{"@type":"ImageObject","url":"https://x/a.jpg"},"articleBody":"Text"}</script>
            <h1 class="headline">Markup headline</h1>"#;
        let result = NewsAdapter.extract(html, "https://news.com/a");
        assert_eq!(
            result.get("data"),
            Some(&json!({
                "headline": "Big Day",
                "author": "Ann Lee",
                "published_date": "2024-01-02",
                "modified_date": null,
                "publisher": "Daily",
                "description": null,
                "content": "Text",
                "image": "https://x/a.jpg"
            }))
        );
    }
}
