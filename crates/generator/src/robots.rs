use sitemap_kit_core::{SITEMAP_FILE, SITEMAP_INDEX_FILE, normalize_base_url};

/// Render robots.txt allowing all crawlers and advertising the sitemap.
///
/// When the sitemap was split, crawlers are pointed at the index document.
pub fn render_robots(base_url: &str, split: bool) -> String {
    let sitemap = if split { SITEMAP_INDEX_FILE } else { SITEMAP_FILE };
    format!(
        "User-agent: *\nAllow: /\n\nSitemap: {}/{}\n",
        normalize_base_url(base_url),
        sitemap
    )
}
