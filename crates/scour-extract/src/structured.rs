//! Embedded machine-readable metadata: JSON-LD graphs, Open Graph tags and
//! microdata, normalized into items grouped by declared type.
//!
//! Extraction never fails. Invalid JSON-LD blocks are skipped, unknown shapes
//! are ignored, and a document without metadata yields an empty result.

use std::collections::BTreeMap;

use scraper::{ElementRef, Selector};
use serde::Serialize;
use serde_json::{Map, Value};

use scour_core::error::AppError;

use crate::document::{Document, normalize_whitespace, selector, text_of};
use crate::values;

/// Where a [`StructuredItem`] was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MetadataSource {
    JsonLd,
    OpenGraph,
    Microdata,
}

/// One typed metadata item.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StructuredItem {
    /// Declared type with any vocabulary prefix removed (`"Product"`).
    pub item_type: String,
    pub properties: Map<String, Value>,
    pub source: MetadataSource,
    /// Document order across all sources.
    pub position: usize,
}

impl StructuredItem {
    pub fn get(&self, path: &[&str]) -> Option<&Value> {
        values::lookup(&self.properties, path)
    }

    pub fn text(&self, path: &[&str]) -> Option<String> {
        self.get(path).and_then(values::as_text)
    }

    pub fn number(&self, path: &[&str]) -> Option<f64> {
        self.get(path).and_then(values::as_number)
    }

    pub fn name(&self, key: &str) -> Option<String> {
        self.get(&[key]).and_then(values::name_of)
    }
}

/// Type name to items of that type, each list in document order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StructuredData {
    items: BTreeMap<String, Vec<StructuredItem>>,
}

impl StructuredData {
    /// One walk over the document. Every item is numbered by the position of
    /// its source element (a JSON-LD `<script>`, a top-level `[itemscope]`,
    /// or the first `og:` meta tag), so groups mixing sources stay in
    /// document order.
    pub fn extract(doc: &Document) -> Self {
        let Ok(sources) = Sources::new() else {
            return Self::default();
        };
        let mut out = Collector::default();
        let mut og = OpenGraphTags::default();
        for el in doc.root().descendants().filter_map(ElementRef::wrap) {
            if sources.jsonld.matches(&el) {
                extract_jsonld(el, &mut out);
            } else if sources.opengraph.matches(&el) {
                og.add(el, &mut out);
            } else if sources.microdata.matches(&el) {
                extract_microdata(el, &mut out);
            }
        }
        og.finish(&mut out);
        tracing::debug!(
            types = out.data.items.len(),
            items = out.position,
            "Structured metadata extracted"
        );
        out.data
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn types(&self) -> impl Iterator<Item = &str> {
        self.items.keys().map(String::as_str)
    }

    pub fn items_of(&self, item_type: &str) -> &[StructuredItem] {
        self.items.get(item_type).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Items of any of `types`, in document order, without duplicates for
    /// items declaring several of them.
    pub fn all_of(&self, types: &[&str]) -> Vec<&StructuredItem> {
        let mut found: Vec<&StructuredItem> = types.iter().flat_map(|t| self.items_of(t)).collect();
        found.sort_by_key(|item| item.position);
        found.dedup_by_key(|item| item.position);
        found
    }

    /// Earliest item of any of `types`.
    pub fn first_of(&self, types: &[&str]) -> Option<&StructuredItem> {
        self.all_of(types).into_iter().next()
    }

    /// Earliest item found in a JSON-LD block, whatever its type.
    pub fn first_jsonld(&self) -> Option<&StructuredItem> {
        self.items
            .values()
            .flatten()
            .filter(|item| item.source == MetadataSource::JsonLd)
            .min_by_key(|item| item.position)
    }

    /// Open Graph properties (`og:` prefix removed), if the page has any.
    pub fn open_graph(&self) -> Option<&StructuredItem> {
        self.items_of("OpenGraph").first()
    }
}

#[derive(Default)]
struct Collector {
    data: StructuredData,
    position: usize,
}

impl Collector {
    fn next_position(&mut self) -> usize {
        let position = self.position;
        self.position += 1;
        position
    }

    fn push(&mut self, types: Vec<String>, properties: Map<String, Value>, source: MetadataSource) {
        let position = self.next_position();
        self.push_at(position, types, properties, source);
    }

    fn push_at(
        &mut self,
        position: usize,
        types: Vec<String>,
        properties: Map<String, Value>,
        source: MetadataSource,
    ) {
        for item_type in types {
            self.data
                .items
                .entry(item_type.clone())
                .or_default()
                .push(StructuredItem {
                    item_type,
                    properties: properties.clone(),
                    source,
                    position,
                });
        }
    }
}

struct Sources {
    jsonld: Selector,
    opengraph: Selector,
    microdata: Selector,
}

impl Sources {
    fn new() -> Result<Self, AppError> {
        Ok(Self {
            jsonld: selector(r#"script[type="application/ld+json"]"#)?,
            opengraph: selector(r#"meta[property^="og:"]"#)?,
            microdata: selector("[itemscope]:not([itemprop])")?,
        })
    }
}

/// `"https://schema.org/Product"` and `"schema:Product"` both become `"Product"`.
fn short_type(raw: &str) -> String {
    raw.trim()
        .rsplit(['/', '#', ':'])
        .next()
        .unwrap_or(raw)
        .to_string()
}

// ── JSON-LD ─────────────────────────────────────────────────────────────────

fn extract_jsonld(script: ElementRef<'_>, out: &mut Collector) {
    let text: String = script.text().collect();
    let text = text.trim();
    if text.is_empty() {
        return;
    }
    match serde_json::from_str::<Value>(text) {
        Ok(value) => collect_jsonld(&value, out),
        Err(e) => tracing::debug!(error = %e, "Skipping invalid JSON-LD block"),
    }
}

fn collect_jsonld(value: &Value, out: &mut Collector) {
    match value {
        Value::Array(items) => items.iter().for_each(|item| collect_jsonld(item, out)),
        Value::Object(map) => {
            let types = jsonld_types(map);
            if !types.is_empty() {
                let properties = map
                    .iter()
                    .filter(|(k, _)| !matches!(k.as_str(), "@context" | "@type" | "@graph"))
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect();
                out.push(types, properties, MetadataSource::JsonLd);
            }
            if let Some(graph) = map.get("@graph") {
                collect_jsonld(graph, out);
            }
        }
        _ => {}
    }
}

fn jsonld_types(map: &Map<String, Value>) -> Vec<String> {
    match map.get("@type") {
        Some(Value::String(t)) => vec![short_type(t)],
        Some(Value::Array(ts)) => ts.iter().filter_map(Value::as_str).map(short_type).collect(),
        _ => Vec::new(),
    }
}

// ── Open Graph ──────────────────────────────────────────────────────────────

/// All `og:` tags of a page fold into one item, placed at the first tag.
#[derive(Default)]
struct OpenGraphTags {
    position: Option<usize>,
    properties: Map<String, Value>,
}

impl OpenGraphTags {
    fn add(&mut self, tag: ElementRef<'_>, out: &mut Collector) {
        let (Some(property), Some(content)) = (tag.value().attr("property"), tag.value().attr("content"))
        else {
            return;
        };
        if self.position.is_none() {
            self.position = Some(out.next_position());
        }
        let key = property.trim_start_matches("og:").to_string();
        insert_repeated(&mut self.properties, key, Value::String(content.trim().to_string()));
    }

    fn finish(self, out: &mut Collector) {
        if let Some(position) = self.position
            && !self.properties.is_empty()
        {
            out.push_at(position, vec!["OpenGraph".into()], self.properties, MetadataSource::OpenGraph);
        }
    }
}

/// Insert, turning a repeated key into an array of values.
fn insert_repeated(map: &mut Map<String, Value>, key: String, value: Value) {
    match map.get_mut(&key) {
        None => {
            map.insert(key, value);
        }
        Some(Value::Array(existing)) => existing.push(value),
        Some(existing) => {
            let first = existing.take();
            *existing = Value::Array(vec![first, value]);
        }
    }
}

// ── Microdata ───────────────────────────────────────────────────────────────

fn extract_microdata(scope: ElementRef<'_>, out: &mut Collector) {
    let types = microdata_types(scope);
    if types.is_empty() {
        return;
    }
    let mut properties = Map::new();
    collect_props(scope, &mut properties);
    out.push(types, properties, MetadataSource::Microdata);
}

fn microdata_types(scope: ElementRef<'_>) -> Vec<String> {
    scope
        .value()
        .attr("itemtype")
        .map(|t| t.split_whitespace().map(short_type).collect())
        .unwrap_or_default()
}

/// Walk `scope`'s subtree, stopping at nested scopes (their properties are
/// their own).
fn collect_props(scope: ElementRef<'_>, properties: &mut Map<String, Value>) {
    for child in scope.children().filter_map(ElementRef::wrap) {
        let nested = child.value().attr("itemscope").is_some();
        if let Some(names) = child.value().attr("itemprop") {
            let value = if nested {
                nested_item(child)
            } else {
                microdata_value(child)
            };
            for name in names.split_whitespace() {
                insert_repeated(properties, name.to_string(), value.clone());
            }
        }
        if !nested {
            collect_props(child, properties);
        }
    }
}

fn nested_item(scope: ElementRef<'_>) -> Value {
    let mut map = Map::new();
    if let Some(t) = microdata_types(scope).into_iter().next() {
        map.insert("@type".into(), Value::String(t));
    }
    collect_props(scope, &mut map);
    Value::Object(map)
}

fn microdata_value(el: ElementRef<'_>) -> Value {
    let attrs = el.value();
    let from_attr = match attrs.name() {
        "meta" => attrs.attr("content"),
        "a" | "link" | "area" => attrs.attr("href"),
        "img" | "audio" | "video" | "source" | "iframe" | "embed" => attrs.attr("src"),
        "time" => attrs.attr("datetime"),
        "data" | "meter" => attrs.attr("value"),
        _ => attrs.attr("content"),
    };
    match from_attr {
        Some(v) => Value::String(normalize_whitespace(v)),
        None => Value::String(text_of(el)),
    }
}
