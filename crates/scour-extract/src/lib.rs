pub mod adapters;
pub mod api;
pub mod document;
pub mod registry;
pub mod result;
pub mod structured;
pub mod values;

pub use adapters::{ContentAdapter, adapter_for};
pub use api::{ScraperApi, SearchHit};
pub use document::Document;
pub use registry::{AdapterKind, AdapterRegistry};
pub use result::ExtractionResult;
pub use structured::{MetadataSource, StructuredData, StructuredItem};
