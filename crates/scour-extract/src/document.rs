//! Parsed HTML document and the selector helpers every adapter shares.
//!
//! All lookups return `Option` (or an empty `Vec`): a missing element is the
//! normal case on pages that do not follow a site family's conventions. The
//! only errors are unparseable input and invalid selectors.

use scraper::{ElementRef, Html, Selector};

use scour_core::error::AppError;

/// Parse a CSS selector, mapping failures into the crate error type.
pub fn selector(css: &str) -> Result<Selector, AppError> {
    Selector::parse(css).map_err(|e| AppError::ParseError(format!("Invalid selector '{css}': {e}")))
}

/// Text content of an element with whitespace runs collapsed and trimmed.
pub fn text_of(element: ElementRef<'_>) -> String {
    normalize_whitespace(&element.text().collect::<String>())
}

pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// First descendant of `element` matching `css`.
pub fn first_in<'a>(element: ElementRef<'a>, css: &str) -> Result<Option<ElementRef<'a>>, AppError> {
    let sel = selector(css)?;
    Ok(element.select(&sel).next())
}

/// All descendants of `element` matching `css`, in document order.
pub fn select_in<'a>(element: ElementRef<'a>, css: &str) -> Result<Vec<ElementRef<'a>>, AppError> {
    let sel = selector(css)?;
    Ok(element.select(&sel).collect())
}

/// Normalized text of the first descendant matching `css`.
pub fn text_in(element: ElementRef<'_>, css: &str) -> Result<Option<String>, AppError> {
    Ok(first_in(element, css)?.map(text_of))
}

/// Attribute of the first descendant matching `css` that carries it.
pub fn attr_in(element: ElementRef<'_>, css: &str, attr: &str) -> Result<Option<String>, AppError> {
    Ok(first_in(element, css)?
        .and_then(|el| el.value().attr(attr))
        .map(|v| v.trim().to_string()))
}

/// Text of `element`, skipping any subtree matching `exclude`.
pub fn text_excluding(element: ElementRef<'_>, exclude: &str) -> Result<String, AppError> {
    let sel = selector(exclude)?;
    let mut out = String::new();
    collect_text(element, &sel, &mut out);
    Ok(normalize_whitespace(&out))
}

fn collect_text(element: ElementRef<'_>, exclude: &Selector, out: &mut String) {
    for child in element.children() {
        if let Some(text) = child.value().as_text() {
            out.push_str(text);
            out.push(' ');
        } else if let Some(child_el) = ElementRef::wrap(child)
            && !exclude.matches(&child_el)
        {
            collect_text(child_el, exclude, out);
        }
    }
}

/// Whether `element` carries `class` in its class list.
pub fn has_class(element: ElementRef<'_>, class: &str) -> bool {
    element.value().classes().any(|c| c == class)
}

pub struct Document {
    html: Html,
}

impl Document {
    /// Parse raw HTML.
    ///
    /// The HTML5 parser accepts anything, so "unparseable" is defined here as
    /// input that cannot be a document: empty or whitespace-only text, text
    /// containing NUL bytes, or text that yields no element at all beyond the
    /// implied `html`/`head`/`body` skeleton.
    pub fn parse(raw: &str) -> Result<Self, AppError> {
        if raw.trim().is_empty() {
            return Err(AppError::ParseError("Empty document".into()));
        }
        if raw.contains('\0') {
            return Err(AppError::ParseError(
                "Document contains NUL bytes (binary content?)".into(),
            ));
        }

        let html = Html::parse_document(raw);
        let skeleton = ["html", "head", "body"];
        let has_content = html
            .root_element()
            .descendants()
            .filter_map(ElementRef::wrap)
            .any(|el| !skeleton.contains(&el.value().name()));
        if !has_content {
            return Err(AppError::ParseError("Document contains no elements".into()));
        }

        Ok(Self { html })
    }

    pub fn html(&self) -> &Html {
        &self.html
    }

    pub fn root(&self) -> ElementRef<'_> {
        self.html.root_element()
    }

    pub fn first(&self, css: &str) -> Result<Option<ElementRef<'_>>, AppError> {
        let sel = selector(css)?;
        Ok(self.html.select(&sel).next())
    }

    pub fn select(&self, css: &str) -> Result<Vec<ElementRef<'_>>, AppError> {
        let sel = selector(css)?;
        Ok(self.html.select(&sel).collect())
    }

    pub fn exists(&self, css: &str) -> Result<bool, AppError> {
        Ok(self.first(css)?.is_some())
    }

    pub fn count(&self, css: &str) -> Result<usize, AppError> {
        let sel = selector(css)?;
        Ok(self.html.select(&sel).count())
    }

    pub fn first_text(&self, css: &str) -> Result<Option<String>, AppError> {
        Ok(self.first(css)?.map(text_of))
    }

    pub fn first_attr(&self, css: &str, attr: &str) -> Result<Option<String>, AppError> {
        Ok(self
            .first(css)?
            .and_then(|el| el.value().attr(attr))
            .map(|v| v.trim().to_string()))
    }

    /// `content` attribute of the first matching `<meta>`.
    pub fn meta_content(&self, css: &str) -> Result<Option<String>, AppError> {
        self.first_attr(css, "content")
    }

    /// `<meta name="description">`.
    pub fn meta_description(&self) -> Result<Option<String>, AppError> {
        self.meta_content(r#"meta[name="description"]"#)
    }

    /// The `<title>` text, if any.
    pub fn title(&self) -> Option<String> {
        self.first_text("title").ok().flatten()
    }

    /// Normalized text of the whole document.
    pub fn text(&self) -> String {
        text_of(self.root())
    }
}
