use serde_json::{Value, json};

use scour_core::error::AppError;

use super::ContentAdapter;
use crate::document::{Document, text_in};
use crate::registry::AdapterKind;
use crate::result::ExtractionResult;
use crate::structured::{StructuredData, StructuredItem};
use crate::values::{opt, opt_num, parse_salary};

#[derive(Debug, Clone, Copy, Default)]
pub struct JobBoardAdapter;

impl ContentAdapter for JobBoardAdapter {
    fn kind(&self) -> AdapterKind {
        AdapterKind::JobBoard
    }

    fn extract_document(&self, doc: &Document, _url: &str) -> Result<ExtractionResult, AppError> {
        let data = StructuredData::extract(doc);
        let postings = data.all_of(&["JobPosting"]);

        let jobs = if postings.is_empty() {
            from_markup(doc)?
        } else {
            postings.into_iter().map(from_item).collect()
        };
        Ok(ExtractionResult::success("job_board", json!({ "jobs": jobs })))
    }
}

fn from_item(item: &StructuredItem) -> Value {
    let salary = item
        .number(&["baseSalary", "value", "value"])
        .or_else(|| item.number(&["baseSalary", "value", "minValue"]))
        .or_else(|| item.number(&["baseSalary", "value"]));
    json!({
        "title": opt(item.text(&["title"])),
        "company": opt(item.name("hiringOrganization")),
        "location": opt(item.text(&["jobLocation", "address", "addressLocality"])),
        "salary": opt_num(salary),
    })
}

/// Result rows with at least a title.
fn from_markup(doc: &Document) -> Result<Vec<Value>, AppError> {
    let mut jobs = Vec::new();
    for row in doc.select(".job, .result, .listing")? {
        let Some(title) = text_in(row, ".title, .job-title")? else {
            continue;
        };
        let salary = text_in(row, ".salary, .compensation")?.and_then(|s| parse_salary(&s));
        jobs.push(json!({
            "title": title,
            "company": opt(text_in(row, ".company, .employer")?),
            "location": opt(text_in(row, ".location, .geo")?),
            "salary": opt_num(salary),
        }));
    }
    Ok(jobs)
}
