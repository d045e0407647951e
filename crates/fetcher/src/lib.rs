// Content retrieval: API sources and the per-category cache

pub mod cache;
pub mod http;

pub use cache::{CacheLookup, CategoryCache, LookupSource};
pub use http::{HttpContentSource, parse_category_body};

use async_trait::async_trait;
use sitemap_kit_core::{Category, ContentItem, Result};
use sitemap_kit_validator::ValidationReport;

/// Validated items of one category plus what was dropped on the way.
#[derive(Debug, Clone, Default)]
pub struct FetchedCategory {
    pub items: Vec<ContentItem>,
    pub report: ValidationReport,
}

#[async_trait]
pub trait ContentSource: Send + Sync {
    async fn fetch_category(&self, category: &Category) -> Result<FetchedCategory>;
}
