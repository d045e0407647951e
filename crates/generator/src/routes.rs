use sitemap_kit_core::{
    Category, ChangeFrequency, ContentItem, STATIC_PATHS, SitemapEntry, SitemapImage,
    category_policy, normalize_base_url,
};

/// Maps static pages and content items to sitemap entries.
///
/// The generation timestamp is fixed at construction so every entry of one
/// run shares it and repeated mapping of the same input is identical.
#[derive(Debug, Clone)]
pub struct RouteBuilder {
    base_url: String,
    generated_at: String,
}

impl RouteBuilder {
    pub fn new(base_url: &str, generated_at: impl Into<String>) -> Self {
        Self {
            base_url: normalize_base_url(base_url).to_string(),
            generated_at: generated_at.into(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Home, about, contact, risk disclosure and every category listing page.
    pub fn static_routes(&self, categories: &[Category]) -> Vec<SitemapEntry> {
        STATIC_PATHS
            .iter()
            .copied()
            .chain(categories.iter().map(Category::root_path))
            .map(|route| SitemapEntry {
                url: format!("{}{}", self.base_url, route),
                last_modified: self.generated_at.clone(),
                change_frequency: ChangeFrequency::Daily,
                priority: if route.is_empty() { 1.0 } else { 0.9 },
                images: Vec::new(),
            })
            .collect()
    }

    /// One entry per item, with crawl hints from the category policy table.
    pub fn dynamic_routes(&self, items: &[ContentItem], category: &Category) -> Vec<SitemapEntry> {
        let policy = category_policy(category.key);

        items
            .iter()
            .map(|item| SitemapEntry {
                url: format!("{}{}{}", self.base_url, category.link_prefix, item.slug),
                last_modified: item
                    .last_modified()
                    .unwrap_or(self.generated_at.as_str())
                    .to_string(),
                change_frequency: policy.change_frequency,
                priority: policy.priority,
                images: item_image(item, category).into_iter().collect(),
            })
            .collect()
    }
}

fn item_image(item: &ContentItem, category: &Category) -> Option<SitemapImage> {
    let loc = item.image.as_ref()?;
    let title = item
        .image_alt
        .as_deref()
        .or_else(|| item.field(category.item_key))
        .map(str::to_string);

    Some(SitemapImage {
        loc: loc.clone(),
        title,
    })
}
