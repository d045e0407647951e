//! Orchestrates a full sitemap generation run.
//!
//! Static routes are built first, every category is resolved through the
//! cache with bounded concurrency, entries are validated and deduplicated,
//! and oversized results are split into chunk files.

use futures::stream::{FuturesOrdered, StreamExt};
use sitemap_kit_core::{
    CATEGORIES, Category, Error, MAX_URLS_PER_SITEMAP, Result, SitemapConfig, SitemapEntry,
    timestamp_now,
};
use sitemap_kit_fetcher::{CategoryCache, ContentSource, LookupSource};
use sitemap_kit_validator::validate_entries;
use std::sync::Arc;
use std::time::Duration;

use crate::routes::RouteBuilder;
use crate::xml::XmlWriter;

/// Whether `count` URLs must be split across several sitemap files.
pub fn exceeds_url_limit(count: usize) -> bool {
    count > MAX_URLS_PER_SITEMAP
}

#[derive(Debug, Clone)]
pub struct AssemblerOptions {
    pub base_url: String,
    /// Upper bound on category fetches in flight
    pub max_concurrent: usize,
    pub fetch_timeout: Duration,
}

impl AssemblerOptions {
    pub fn from_config(config: &SitemapConfig) -> Self {
        Self {
            base_url: config.site.base_url.clone(),
            max_concurrent: config.api.max_concurrent,
            fetch_timeout: config.api.timeout,
        }
    }
}

/// Result handed back to the host.
#[derive(Debug, Clone, PartialEq)]
pub enum SitemapOutput {
    /// Every entry, small enough to be served as one document.
    Complete(Vec<SitemapEntry>),
    /// Chunk files were written; one index entry per chunk.
    Split(Vec<SitemapEntry>),
}

impl SitemapOutput {
    pub fn entries(&self) -> &[SitemapEntry] {
        match self {
            SitemapOutput::Complete(entries) | SitemapOutput::Split(entries) => entries,
        }
    }

    pub fn is_split(&self) -> bool {
        matches!(self, SitemapOutput::Split(_))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CategoryReport {
    pub key: &'static str,
    pub items: usize,
    /// Payload elements rejected by validation (0 unless freshly fetched)
    pub dropped: usize,
    pub source: LookupSource,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct GenerationReport {
    pub generated_at: String,
    pub categories: Vec<CategoryReport>,
    pub static_entries: usize,
    pub dynamic_entries: usize,
    pub invalid_entries: usize,
    pub duplicate_entries: usize,
    /// URLs after validation and deduplication
    pub total_urls: usize,
    pub split: bool,
}

impl GenerationReport {
    pub fn dropped_items(&self) -> usize {
        self.categories.iter().map(|c| c.dropped).sum()
    }
}

#[derive(Debug, Clone)]
pub struct Assembly {
    pub output: SitemapOutput,
    pub report: GenerationReport,
}

pub struct SitemapAssembler {
    options: AssemblerOptions,
    categories: Vec<Category>,
    source: Arc<dyn ContentSource>,
    cache: Arc<CategoryCache>,
    writer: XmlWriter,
}

impl SitemapAssembler {
    pub fn new(
        options: AssemblerOptions,
        source: Arc<dyn ContentSource>,
        cache: Arc<CategoryCache>,
        writer: XmlWriter,
    ) -> Self {
        Self {
            options,
            categories: CATEGORIES.to_vec(),
            source,
            cache,
            writer,
        }
    }

    /// Restrict or replace the categories included in the sitemap.
    pub fn with_categories(mut self, categories: Vec<Category>) -> Self {
        self.categories = categories;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.options.base_url
    }

    pub fn writer(&self) -> &XmlWriter {
        &self.writer
    }

    pub async fn assemble(&self) -> Result<Assembly> {
        self.assemble_at(timestamp_now()).await
    }

    /// Run generation with a fixed timestamp for entries lacking one.
    ///
    /// Only a write failure returns an error (writing chunks, or removing
    /// chunks left by an earlier split); category failures degrade to stale
    /// or empty content.
    pub async fn assemble_at(&self, generated_at: String) -> Result<Assembly> {
        let builder = RouteBuilder::new(&self.options.base_url, generated_at.clone());
        let static_entries = builder.static_routes(&self.categories);

        // At most `max_concurrent` categories in flight; results keep category order.
        let mut pending = FuturesOrdered::new();
        let mut remaining = self.categories.iter();
        for category in remaining.by_ref().take(self.options.max_concurrent.max(1)) {
            pending.push_back(self.collect_category(category, &builder));
        }
        let mut collected = Vec::with_capacity(self.categories.len());
        while let Some(result) = pending.next().await {
            collected.push(result);
            if let Some(category) = remaining.next() {
                pending.push_back(self.collect_category(category, &builder));
            }
        }

        let mut report = GenerationReport {
            generated_at: generated_at.clone(),
            static_entries: static_entries.len(),
            ..Default::default()
        };

        let mut entries = static_entries;
        for (category_entries, category_report) in collected {
            report.dynamic_entries += category_entries.len();
            entries.extend(category_entries);
            report.categories.push(category_report);
        }

        let (entries, entry_report) = validate_entries(entries);
        report.invalid_entries = entry_report.invalid;
        report.duplicate_entries = entry_report.duplicates;
        report.total_urls = entries.len();

        let output = if exceeds_url_limit(entries.len()) {
            tracing::info!(urls = entries.len(), limit = MAX_URLS_PER_SITEMAP, "splitting sitemap");
            let index = self
                .writer
                .split_sitemaps(&entries, builder.base_url(), &generated_at)
                .await?;
            SitemapOutput::Split(index)
        } else {
            self.writer.remove_stale_chunks(0).await?;
            SitemapOutput::Complete(entries)
        };
        report.split = output.is_split();

        tracing::info!(
            urls = report.total_urls,
            dropped_items = report.dropped_items(),
            duplicates = report.duplicate_entries,
            split = report.split,
            "sitemap assembled"
        );

        Ok(Assembly { output, report })
    }

    async fn collect_category(
        &self,
        category: &Category,
        builder: &RouteBuilder,
    ) -> (Vec<SitemapEntry>, CategoryReport) {
        let source = self.source.as_ref();
        let timeout = self.options.fetch_timeout;
        let mut dropped = 0;
        let dropped_out = &mut dropped;

        let lookup = self
            .cache
            .get_or_fetch(category.key, move || async move {
                let result = match tokio::time::timeout(timeout, source.fetch_category(category)).await {
                    Ok(result) => result,
                    Err(_) => Err(Error::Timeout {
                        category: category.key.to_string(),
                    }),
                };
                match result {
                    Ok(fetched) => {
                        *dropped_out = fetched.report.dropped();
                        Ok(fetched.items)
                    }
                    Err(err) => {
                        log_fetch_failure(category, &err);
                        Err(err)
                    }
                }
            })
            .await;

        let entries = builder.dynamic_routes(&lookup.items, category);
        tracing::debug!(
            category = category.key,
            items = lookup.items.len(),
            source = lookup.source.as_str(),
            "category resolved"
        );

        let report = CategoryReport {
            key: category.key,
            items: lookup.items.len(),
            dropped,
            source: lookup.source,
        };
        (entries, report)
    }
}

/// Airdrops are time-sensitive, so losing them is logged as an error.
fn log_fetch_failure(category: &Category, err: &Error) {
    if category.key == "airdrops" {
        tracing::error!(category = category.key, error = %err, "fetch failed for time-sensitive category");
    } else {
        tracing::warn!(category = category.key, error = %err, "category fetch failed");
    }
}
