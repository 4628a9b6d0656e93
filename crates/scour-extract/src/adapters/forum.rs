use scraper::ElementRef;
use serde_json::{Value, json};

use scour_core::error::AppError;

use super::ContentAdapter;
use crate::document::{Document, first_in, has_class, text_in, text_of};
use crate::registry::AdapterKind;
use crate::result::ExtractionResult;
use crate::structured::StructuredData;
use crate::values::opt;

const THREAD_TYPES: &[&str] = &["DiscussionForumPosting", "QAPage"];

#[derive(Debug, Clone, Copy, Default)]
pub struct ForumAdapter;

impl ContentAdapter for ForumAdapter {
    fn kind(&self) -> AdapterKind {
        AdapterKind::Forum
    }

    fn extract_document(&self, doc: &Document, _url: &str) -> Result<ExtractionResult, AppError> {
        let data = StructuredData::extract(doc);
        let structured = data.first_of(THREAD_TYPES);

        let title = match structured.and_then(|t| t.text(&["headline"]).or_else(|| t.text(&["name"]))) {
            Some(title) => Some(title),
            None => doc
                .first_text(r#"h1.title, h1.thread-title, h1[itemprop="name"]"#)?
                .or_else(|| doc.title()),
        };
        let author = match structured.and_then(|t| t.name("author")) {
            Some(author) => author,
            None => doc
                .first_text(r#".post-author, .username, [itemprop="author"]"#)?
                .unwrap_or_else(|| "Unknown".into()),
        };
        let content = match structured.and_then(|t| t.text(&["text"]).or_else(|| t.text(&["articleBody"]))) {
            Some(content) => content,
            None => doc
                .first_text(r#".post-content, .message-content, [itemprop="text"]"#)?
                .unwrap_or_default(),
        };

        let thread = json!({
            "title": opt(title),
            "author": author,
            "content": content,
            "replies": replies(doc)?,
        });
        Ok(ExtractionResult::success("forum", json!({ "data": thread })))
    }
}

/// Posts after the opening one that carry both an author and a body.
fn replies(doc: &Document) -> Result<Vec<Value>, AppError> {
    let mut replies = Vec::new();
    for post in doc.select(".post, .comment, .message")? {
        if has_class(post, "first-post") {
            continue;
        }
        let author = text_in(post, ".username, .author")?;
        let content = text_in(post, ".content, .message-body")?;
        if let (Some(author), Some(content)) = (author, content) {
            replies.push(json!({
                "author": author,
                "content": content,
                "timestamp": opt(post_time(post)?),
            }));
        }
    }
    Ok(replies)
}

fn post_time(post: ElementRef<'_>) -> Result<Option<String>, AppError> {
    Ok(first_in(post, "time, .post-time")?.map(|el| match el.value().attr("datetime") {
        Some(dt) => dt.trim().to_string(),
        None => text_of(el),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opening_post_only() {
        let result = ForumAdapter.extract(
            r#"<h1 class="title">Test Thread</h1><div class="post-content">First post</div>"#,
            "https://forum.com/thread/1",
        );
        assert_eq!(result.result_type(), "forum");
        assert_eq!(
            result.get("data"),
            Some(&json!({
                "title": "Test Thread",
                "author": "Unknown",
                "content": "First post",
                "replies": []
            }))
        );
    }

    #[test]
    fn replies_skip_the_first_post() {
        let html = r#"<html><head><title>Thread via title</title></head><body>
            <div class="post first-post"><span class="username">op</span><div class="content">Q?</div></div>
            <div class="post"><span class="username">ann</span><div class="content">A!</div>
                <time datetime="2024-02-02">Feb 2</time></div>
            <div class="comment"><span class="author">bo</span></div>
            </body></html>"#;
        let result = ForumAdapter.extract(html, "https://forum.example/t/2");
        let data = result.get("data").unwrap();
        assert_eq!(data["title"], "Thread via title");
        assert_eq!(data["author"], "op");
        assert_eq!(
            data["replies"],
            json!([{"author": "ann", "content": "A!", "timestamp": "2024-02-02"}])
        );
    }

    #[test]
    fn discussion_posting_metadata_first() {
        let html = r#"<script type="application/ld+json">{"@type":"DiscussionForumPosting",
            "headline":"Structured thread","author":{"@type":"Person","name":"kim"},"text":"Hello"}</script>
            <h1 class="title">Markup thread</h1>"#;
        let data = ForumAdapter.extract(html, "https://discourse.example/t/3").get("data").cloned().unwrap();
        assert_eq!(data["title"], "Structured thread");
        assert_eq!(data["author"], "kim");
        assert_eq!(data["content"], "Hello");
    }
}
