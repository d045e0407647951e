use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Search engines reject sitemap files listing more URLs than this.
pub const MAX_URLS_PER_SITEMAP: usize = 50_000;

/// Chunk size used when splitting, kept below the protocol ceiling.
pub const SITEMAP_CHUNK_SIZE: usize = 45_000;

pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(300);

pub const SITEMAP_NS: &str = "http://www.sitemaps.org/schemas/sitemap/0.9";
pub const IMAGE_NS: &str = "http://www.google.com/schemas/sitemap-image/1.1";

pub const SITEMAP_FILE: &str = "sitemap.xml";
pub const SITEMAP_INDEX_FILE: &str = "sitemap-index.xml";
pub const ROBOTS_FILE: &str = "robots.txt";

/// File name of the `n`th chunk (1-based) of a split sitemap.
pub fn chunk_file_name(n: usize) -> String {
    format!("sitemap-{}.xml", n)
}

/// A content type served by one API endpoint and one URL prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Category {
    pub name: &'static str,
    /// Path segment of the API endpoint
    pub key: &'static str,
    /// Item field used as display title
    pub item_key: &'static str,
    pub link_prefix: &'static str,
}

impl Category {
    /// Listing page path, e.g. `/airdrops` for prefix `/airdrops/`.
    pub fn root_path(&self) -> &'static str {
        self.link_prefix.trim_end_matches('/')
    }
}

pub const CATEGORIES: &[Category] = &[
    Category {
        name: "Airdrops",
        key: "airdrops",
        item_key: "title",
        link_prefix: "/airdrops/",
    },
    Category {
        name: "Games",
        key: "games",
        item_key: "title",
        link_prefix: "/games/",
    },
    Category {
        name: "Farming",
        key: "farm-tokens",
        item_key: "tokenName",
        link_prefix: "/token-farming/",
    },
    Category {
        name: "Reward Tasks",
        key: "reward-tasks",
        item_key: "title",
        link_prefix: "/platforms/",
    },
    Category {
        name: "Academy",
        key: "academy",
        item_key: "postHeading",
        link_prefix: "/academy/",
    },
];

/// Top-level pages that always appear in the sitemap ("" is the home page).
pub const STATIC_PATHS: &[&str] = &["", "/about", "/contact", "/risk-disclosure"];

/// Crawler revisit hint from the Sitemap Protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeFrequency {
    Always,
    Hourly,
    Daily,
    Weekly,
    Monthly,
    Yearly,
    Never,
}

impl ChangeFrequency {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeFrequency::Always => "always",
            ChangeFrequency::Hourly => "hourly",
            ChangeFrequency::Daily => "daily",
            ChangeFrequency::Weekly => "weekly",
            ChangeFrequency::Monthly => "monthly",
            ChangeFrequency::Yearly => "yearly",
            ChangeFrequency::Never => "never",
        }
    }
}

impl fmt::Display for ChangeFrequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Frequency and priority assigned to every item of a category
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CategoryPolicy {
    pub change_frequency: ChangeFrequency,
    pub priority: f64,
}

/// Look up the crawl policy for a category key.
///
/// Unlisted categories fall back to `weekly` / `0.5`.
pub fn category_policy(key: &str) -> CategoryPolicy {
    let (change_frequency, priority) = match key {
        "airdrops" => (ChangeFrequency::Hourly, 0.9),
        "games" => (ChangeFrequency::Daily, 0.8),
        "farm-tokens" => (ChangeFrequency::Daily, 0.8),
        "reward-tasks" => (ChangeFrequency::Daily, 0.7),
        "academy" => (ChangeFrequency::Weekly, 0.7),
        _ => (ChangeFrequency::Weekly, 0.5),
    };
    CategoryPolicy {
        change_frequency,
        priority,
    }
}

/// A content record that passed the slug check.
///
/// Known fields are lifted out; everything else stays in `fields` so the
/// category title key can be resolved later.
#[derive(Debug, Clone, PartialEq)]
pub struct ContentItem {
    pub slug: String,
    pub updated_at: Option<String>,
    pub created_at: Option<String>,
    pub image: Option<String>,
    pub image_alt: Option<String>,
    pub fields: serde_json::Map<String, serde_json::Value>,
}

impl ContentItem {
    pub fn new(slug: impl Into<String>) -> Self {
        Self {
            slug: slug.into(),
            updated_at: None,
            created_at: None,
            image: None,
            image_alt: None,
            fields: serde_json::Map::new(),
        }
    }

    /// String value of an arbitrary field, if present and a string.
    pub fn field(&self, key: &str) -> Option<&str> {
        self.fields.get(key).and_then(|v| v.as_str())
    }

    /// `updatedAt`, falling back to `createdAt`
    pub fn last_modified(&self) -> Option<&str> {
        self.updated_at.as_deref().or(self.created_at.as_deref())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SitemapImage {
    pub loc: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

/// One URL record of the Sitemap Protocol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SitemapEntry {
    pub url: String,
    pub last_modified: String,
    pub change_frequency: ChangeFrequency,
    pub priority: f64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub images: Vec<SitemapImage>,
}

/// Strip trailing slashes so paths can be appended directly.
pub fn normalize_base_url(base_url: &str) -> &str {
    base_url.trim_end_matches('/')
}

/// Current time in the format used for `lastmod` (RFC 3339, millisecond precision, UTC).
pub fn timestamp_now() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}
