use serde_json::{Map, Value, json};

use scour_core::error::AppError;

use super::ContentAdapter;
use crate::document::{Document, text_of};
use crate::registry::AdapterKind;
use crate::result::ExtractionResult;
use crate::structured::{StructuredData, StructuredItem};
use crate::values::{name_of, opt, opt_num};

const POST_TYPES: &[&str] = &["SocialMediaPosting", "DiscussionForumPosting", "Comment"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Platform {
    Twitter,
    Instagram,
    Reddit,
    Facebook,
    Other,
}

impl Platform {
    fn from_url(url: &str) -> Self {
        let url = url.to_lowercase();
        if url.contains("twitter.com") || url.contains("://x.com") || url.contains(".x.com") {
            Platform::Twitter
        } else if url.contains("instagram.com") {
            Platform::Instagram
        } else if url.contains("reddit.com") {
            Platform::Reddit
        } else if url.contains("facebook.com") {
            Platform::Facebook
        } else {
            Platform::Other
        }
    }

    fn as_str(&self) -> &'static str {
        match self {
            Platform::Twitter => "twitter",
            Platform::Instagram => "instagram",
            Platform::Reddit => "reddit",
            Platform::Facebook => "facebook",
            Platform::Other => "generic",
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SocialMediaAdapter;

impl ContentAdapter for SocialMediaAdapter {
    fn kind(&self) -> AdapterKind {
        AdapterKind::SocialMedia
    }

    fn extract_document(&self, doc: &Document, url: &str) -> Result<ExtractionResult, AppError> {
        let platform = Platform::from_url(url);
        let data = StructuredData::extract(doc);
        let mut post = match data.first_of(POST_TYPES) {
            Some(item) => from_item(item),
            None => match platform {
                Platform::Twitter => twitter(doc)?,
                Platform::Instagram => instagram(doc)?,
                Platform::Reddit => reddit(doc)?,
                Platform::Facebook => facebook(doc)?,
                Platform::Other => generic(doc)?,
            },
        };
        if let Some(og) = data.open_graph() {
            fill_from_open_graph(&mut post, og);
        }
        if post.get("timestamp").is_none_or(Value::is_null) {
            post.insert("timestamp".into(), opt(timestamp(doc)?));
        }

        let mut payload = Map::new();
        payload.insert("platform".into(), json!(platform.as_str()));
        payload.extend(post);
        Ok(ExtractionResult::success("social_media", Value::Object(payload)))
    }
}

fn from_item(item: &StructuredItem) -> Map<String, Value> {
    let mut post = fields(vec![
        ("author", item.get(&["author"]).and_then(name_of)),
        ("title", item.text(&["headline"])),
        ("content", item.text(&["articleBody"]).or_else(|| item.text(&["text"]))),
        ("timestamp", item.text(&["datePublished"])),
    ]);
    post.insert("comments".into(), opt_num(item.number(&["commentCount"])));
    post
}

/// Open Graph `title`/`description` stand in for a missing title or content.
fn fill_from_open_graph(post: &mut Map<String, Value>, og: &StructuredItem) {
    for (field, key) in [("title", "title"), ("content", "description")] {
        let missing = post.get(field).is_none_or(Value::is_null);
        if missing && let Some(value) = og.text(&[key]) {
            post.insert(field.to_string(), json!(value));
        }
    }
}

/// Text of the `n`th element matching `css`.
fn nth_text(doc: &Document, css: &str, n: usize) -> Result<Option<String>, AppError> {
    Ok(doc.select(css)?.get(n).map(|el| text_of(*el)))
}

fn fields(pairs: Vec<(&str, Option<String>)>) -> Map<String, Value> {
    pairs
        .into_iter()
        .map(|(key, value)| (key.to_string(), opt(value)))
        .collect()
}

fn twitter(doc: &Document) -> Result<Map<String, Value>, AppError> {
    Ok(fields(vec![
        ("author", doc.first_text(r#"[data-testid="User-Name"] a"#)?),
        ("content", doc.first_text(r#"div[data-testid="tweetText"]"#)?),
        ("replies", doc.first_text(r#"[data-testid="reply"] span"#)?),
        ("retweets", doc.first_text(r#"[data-testid="retweet"] span"#)?),
        ("likes", doc.first_text(r#"[data-testid="like"] span"#)?),
    ]))
}

fn instagram(doc: &Document) -> Result<Map<String, Value>, AppError> {
    Ok(fields(vec![
        ("author", doc.first_text("header h2 a")?),
        ("content", doc.first_text("div.C4VMK span")?),
        ("image", doc.first_attr(r#"img[style="object-fit: cover;"]"#, "src")?),
        ("likes", nth_text(doc, "span._ac2a", 0)?),
        ("comments", nth_text(doc, "span._ac2a", 1)?),
    ]))
}

fn reddit(doc: &Document) -> Result<Map<String, Value>, AppError> {
    Ok(fields(vec![
        ("author", doc.first_text(r#"a[href^="/user/"], a[href^="/u/"]"#)?),
        ("title", doc.first_text("h1")?),
        ("content", doc.first_text(r#"[data-test-id="post-content"]"#)?),
        ("votes", doc.first_text(r#"[id^="vote-arrows"]"#)?),
        (
            "comments",
            doc.first_text(r#"[data-test-id="comments-page-link-num-comments"]"#)?,
        ),
    ]))
}

fn facebook(doc: &Document) -> Result<Map<String, Value>, AppError> {
    Ok(fields(vec![
        ("author", doc.first_text(r#"a[role="link"]"#)?),
        ("content", doc.first_text(r#"div[data-ad-preview="message"]"#)?),
        ("reactions", doc.first_text(r#"[aria-label*="reactions"]"#)?),
        ("comments", doc.first_text(r#"div[aria-label="Comment"] span"#)?),
        ("shares", doc.first_text(r#"div[aria-label="Share"] span"#)?),
    ]))
}

fn generic(doc: &Document) -> Result<Map<String, Value>, AppError> {
    Ok(fields(vec![
        ("author", doc.first_text(r#"[itemprop="author"], .author, .username, .user"#)?),
        ("content", doc.first_text(r#"[itemprop="text"], .content, .post-content"#)?),
    ]))
}

/// Machine-readable `datetime` first, then visible date text.
fn timestamp(doc: &Document) -> Result<Option<String>, AppError> {
    if let Some(dt) = doc.first_attr("time[datetime]", "datetime")? {
        return Ok(Some(dt));
    }
    doc.first_text("time, .timestamp, .date, .posted-on")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tweet() {
        let result = SocialMediaAdapter.extract(
            r#"<div data-testid="tweetText">Hello Twitter!</div>
               <div data-testid="reply"><span>3</span></div><div data-testid="like"><span>9</span></div>"#,
            "https://twitter.com/test/status/1",
        );
        assert_eq!(result.result_type(), "social_media");
        assert_eq!(result.get("platform"), Some(&json!("twitter")));
        assert_eq!(result.get("content"), Some(&json!("Hello Twitter!")));
        assert_eq!(result.get("replies"), Some(&json!("3")));
        assert_eq!(result.get("retweets"), Some(&Value::Null));
        assert_eq!(result.get("likes"), Some(&json!("9")));
    }

    #[test]
    fn reddit_post() {
        let result = SocialMediaAdapter.extract(
            r#"<h1>Ask me anything</h1><a href="/u/someone">someone</a>
               <div data-test-id="post-content">Body</div><time datetime="2024-03-03T10:00:00Z">1h</time>"#,
            "https://www.reddit.com/comments/abc",
        );
        assert_eq!(result.get("platform"), Some(&json!("reddit")));
        assert_eq!(result.get("title"), Some(&json!("Ask me anything")));
        assert_eq!(result.get("author"), Some(&json!("someone")));
        assert_eq!(result.get("timestamp"), Some(&json!("2024-03-03T10:00:00Z")));
    }

    #[test]
    fn unknown_platform_uses_generic_selectors() {
        let result = SocialMediaAdapter.extract(
            r#"<span class="username">pin_fan</span><div class="content">Nice</div><span class="date">Yesterday</span>"#,
            "https://www.pinterest.com/pin/1",
        );
        assert_eq!(result.get("platform"), Some(&json!("generic")));
        assert_eq!(result.get("author"), Some(&json!("pin_fan")));
        assert_eq!(result.get("timestamp"), Some(&json!("Yesterday")));
    }

    #[test]
    fn posting_metadata_wins_over_markup() {
        let result = SocialMediaAdapter.extract(
            r#"<script type="application/ld+json">{"@type":"SocialMediaPosting","author":{"@type":"Person","name":"Alice"},
                "articleBody":"Hello world","datePublished":"2024-05-01T08:00:00Z","commentCount":4}</script>
               <div data-testid="tweetText">Markup text</div>"#,
            "https://twitter.com/alice/status/1",
        );
        assert_eq!(
            serde_json::to_value(&result).unwrap(),
            json!({
                "type": "social_media",
                "platform": "twitter",
                "author": "Alice",
                "title": null,
                "content": "Hello world",
                "timestamp": "2024-05-01T08:00:00Z",
                "comments": 4.0
            })
        );
    }

    #[test]
    fn open_graph_fills_missing_content() {
        let result = SocialMediaAdapter.extract(
            r#"<head><meta property="og:title" content="Post by Bob"><meta property="og:description" content="Shared text"></head>
               <body><a href="/u/bob">bob</a></body>"#,
            "https://www.reddit.com/comments/xyz",
        );
        assert_eq!(result.get("author"), Some(&json!("bob")));
        assert_eq!(result.get("title"), Some(&json!("Post by Bob")));
        assert_eq!(result.get("content"), Some(&json!("Shared text")));
    }

    #[test]
    fn platform_detection() {
        assert_eq!(Platform::from_url("https://x.com/a/status/1"), Platform::Twitter);
        assert_eq!(Platform::from_url("https://www.instagram.com/p/1"), Platform::Instagram);
        assert_eq!(Platform::from_url("https://m.facebook.com/story"), Platform::Facebook);
        assert_eq!(Platform::from_url("https://tiktok.com/@a"), Platform::Other);
    }
}
