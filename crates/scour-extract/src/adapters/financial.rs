use scraper::ElementRef;
use serde_json::{Map, Value, json};

use scour_core::error::AppError;

use super::ContentAdapter;
use crate::document::{Document, select_in, text_of};
use crate::registry::AdapterKind;
use crate::result::ExtractionResult;
use crate::structured::StructuredData;
use crate::values::{opt, opt_num, parse_price};

/// A statement page: URL marker, keyword its table must contain, label.
struct Statement {
    marker: &'static str,
    keyword: &'static str,
    label: &'static str,
}

const STATEMENTS: &[Statement] = &[
    Statement {
        marker: "income-statement",
        keyword: "revenue",
        label: "income statement",
    },
    Statement {
        marker: "balance-sheet",
        keyword: "assets",
        label: "balance sheet",
    },
    Statement {
        marker: "cash-flow",
        keyword: "cash",
        label: "cash flow",
    },
];

#[derive(Debug, Clone, Copy, Default)]
pub struct FinancialAdapter;

impl ContentAdapter for FinancialAdapter {
    fn kind(&self) -> AdapterKind {
        AdapterKind::Financial
    }

    fn extract_document(&self, doc: &Document, url: &str) -> Result<ExtractionResult, AppError> {
        let lower = url.to_lowercase();
        match STATEMENTS.iter().find(|s| lower.contains(s.marker)) {
            Some(statement) => statement_table(doc, statement),
            None => stock_data(doc),
        }
    }
}

/// First table mentioning the statement's keyword, as header row plus
/// `label -> {column header -> cell}` rows.
fn statement_table(doc: &Document, statement: &Statement) -> Result<ExtractionResult, AppError> {
    let table = doc
        .select("table")?
        .into_iter()
        .find(|t| text_of(*t).to_lowercase().contains(statement.keyword));

    let Some(table) = table else {
        return Ok(ExtractionResult::failure(
            statement.marker,
            format!("No {} table found", statement.label),
        ));
    };

    let (headers, rows) = parse_table(table)?;
    Ok(ExtractionResult::success(
        statement.marker,
        json!({ "headers": headers, "rows": rows }),
    ))
}

fn parse_table(table: ElementRef<'_>) -> Result<(Vec<String>, Map<String, Value>), AppError> {
    let headers: Vec<String> = match select_in(table, "tr")?.first() {
        Some(first_row) => select_in(*first_row, "th")?.into_iter().map(text_of).collect(),
        None => Vec::new(),
    };

    let mut rows = Map::new();
    for row in select_in(table, "tr")? {
        let cells: Vec<String> = select_in(row, "td")?.into_iter().map(text_of).collect();
        let Some((label, values)) = cells.split_first() else {
            continue;
        };
        if label.is_empty() || values.is_empty() {
            continue;
        }
        // value columns line up with headers after the label column;
        // unnamed columns are keyed by position
        let columns = values
            .iter()
            .enumerate()
            .map(|(i, value)| {
                let key = headers
                    .get(i + 1)
                    .filter(|h| !h.is_empty())
                    .cloned()
                    .unwrap_or_else(|| (i + 1).to_string());
                (key, Value::String(value.clone()))
            })
            .collect::<Map<_, _>>();
        rows.insert(label.clone(), Value::Object(columns));
    }
    Ok((headers, rows))
}

fn stock_data(doc: &Document) -> Result<ExtractionResult, AppError> {
    let data = StructuredData::extract(doc);
    let corporation = data.first_of(&["Corporation", "Organization"]);

    let symbol = match corporation.and_then(|c| c.text(&["tickerSymbol"])) {
        Some(symbol) => Some(symbol),
        None => match doc.first_attr("[data-symbol]", "data-symbol")? {
            Some(symbol) => Some(symbol),
            None => doc.first_text(".symbol, .ticker, .quote-symbol")?,
        },
    };
    let price = doc
        .first_text(r#"[data-field="regularMarketPrice"], .quote-price, .last-price, .price"#)?
        .and_then(|p| parse_price(&p));
    let change = doc.first_text(r#"[data-field="regularMarketChange"], .price-change, .change"#)?;

    Ok(ExtractionResult::success(
        "stock_data",
        json!({
            "symbol": opt(symbol),
            "price": opt_num(price),
            "change": opt(change),
            "key_metrics": key_metrics(doc)?,
        }),
    ))
}

/// Two-column `label | value` rows from metric tables.
fn key_metrics(doc: &Document) -> Result<Map<String, Value>, AppError> {
    let mut metrics = Map::new();
    for row in doc.select(".key-metrics tr, table.metrics tr, .quote-summary tr")? {
        let cells = select_in(row, "td, th")?;
        if let [label, value] = cells.as_slice() {
            let label = text_of(*label);
            if !label.is_empty() {
                metrics.insert(label, Value::String(text_of(*value)));
            }
        }
    }
    Ok(metrics)
}
