//! Site-family adapters.
//!
//! Every adapter follows the same two-tier policy: structured metadata of the
//! family's types first, selector heuristics over the document tree second.
//! Families with several page kinds branch on URL substrings first.

mod academic;
mod ecommerce;
mod financial;
mod forum;
mod generic;
mod government;
mod jobs;
mod news;
mod real_estate;
mod social;
mod travel;

pub use academic::AcademicAdapter;
pub use ecommerce::EcommerceAdapter;
pub use financial::FinancialAdapter;
pub use forum::ForumAdapter;
pub use generic::GenericAdapter;
pub use government::GovernmentAdapter;
pub use jobs::JobBoardAdapter;
pub use news::NewsAdapter;
pub use real_estate::RealEstateAdapter;
pub use social::SocialMediaAdapter;
pub use travel::TravelAdapter;

use scour_core::error::AppError;

use crate::document::Document;
use crate::registry::AdapterKind;
use crate::result::ExtractionResult;

/// Extraction contract shared by every site family.
pub trait ContentAdapter: Send + Sync {
    fn kind(&self) -> AdapterKind;

    /// Extract from an already parsed document.
    ///
    /// Errors returned here are converted by [`ContentAdapter::extract`];
    /// implementations simply propagate them with `?`.
    fn extract_document(&self, doc: &Document, url: &str) -> Result<ExtractionResult, AppError>;

    /// Parse `html` and extract. Never fails: any error becomes
    /// `{type, error}` with this adapter's type.
    fn extract(&self, html: &str, url: &str) -> ExtractionResult {
        let kind = self.kind();
        let outcome = Document::parse(html).and_then(|doc| self.extract_document(&doc, url));
        match outcome {
            Ok(result) => {
                tracing::debug!(url = %url, adapter = %kind, result_type = result.result_type(), "Extracted");
                result
            }
            Err(e) => {
                tracing::error!(url = %url, adapter = %kind, error = %e, "Extraction failed");
                ExtractionResult::failure(kind.as_str(), e.to_string())
            }
        }
    }
}

/// The adapter implementing `kind`.
pub fn adapter_for(kind: AdapterKind) -> &'static dyn ContentAdapter {
    match kind {
        AdapterKind::Ecommerce => &EcommerceAdapter,
        AdapterKind::SocialMedia => &SocialMediaAdapter,
        AdapterKind::Forum => &ForumAdapter,
        AdapterKind::JobBoard => &JobBoardAdapter,
        AdapterKind::RealEstate => &RealEstateAdapter,
        AdapterKind::Financial => &FinancialAdapter,
        AdapterKind::Government => &GovernmentAdapter,
        AdapterKind::Academic => &AcademicAdapter,
        AdapterKind::Travel => &TravelAdapter,
        AdapterKind::News => &NewsAdapter,
        AdapterKind::Generic => &GenericAdapter,
    }
}
