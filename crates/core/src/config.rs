use crate::error::{Error, Result};
use crate::types::DEFAULT_CACHE_TTL;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://www.web3fruity.com";
pub const DEFAULT_API_URL: &str = "https://www.web3fruity.com/api";
pub const DEFAULT_PUBLIC_DIR: &str = "public";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_MAX_CONCURRENT: usize = 4;

/// Environment variables read by [`SitemapConfig::apply_env`], in priority order.
pub const ENV_BASE_URL: &[&str] = &["NEXT_PUBLIC_BASE_URL"];
pub const ENV_API_URL: &[&str] = &["NEXT_PUBLIC_API_URL", "API_URL"];

/// Resolved generator configuration
#[derive(Debug, Clone, PartialEq)]
pub struct SitemapConfig {
    pub site: SiteSettings,
    pub api: ApiSettings,
    pub cache: CacheSettings,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SiteSettings {
    /// Public origin used to build absolute URLs (no trailing slash)
    pub base_url: String,
    /// Directory receiving sitemap files and robots.txt
    pub public_dir: PathBuf,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ApiSettings {
    /// Content API base; categories are fetched from `{base_url}/{key}`
    pub base_url: String,
    pub timeout: Duration,
    pub max_concurrent: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CacheSettings {
    pub ttl: Duration,
}

impl Default for SitemapConfig {
    fn default() -> Self {
        Self {
            site: SiteSettings {
                base_url: DEFAULT_BASE_URL.to_string(),
                public_dir: PathBuf::from(DEFAULT_PUBLIC_DIR),
            },
            api: ApiSettings {
                base_url: DEFAULT_API_URL.to_string(),
                timeout: DEFAULT_TIMEOUT,
                max_concurrent: DEFAULT_MAX_CONCURRENT,
            },
            cache: CacheSettings {
                ttl: DEFAULT_CACHE_TTL,
            },
        }
    }
}

/// Raw TOML configuration structure
/// Every table and field is optional; gaps fall back to defaults.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    #[serde(default)]
    site: RawSite,
    #[serde(default)]
    api: RawApi,
    #[serde(default)]
    cache: RawCache,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawSite {
    base_url: Option<String>,
    public_dir: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawApi {
    base_url: Option<String>,
    timeout_secs: Option<u64>,
    max_concurrent: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawCache {
    ttl_secs: Option<u64>,
}

/// Parse sitemap.toml from a file path
pub fn parse_config_toml<P: AsRef<Path>>(path: P) -> Result<SitemapConfig> {
    let content = fs::read_to_string(path)?;
    parse_config_toml_str(&content)
}

/// Parse sitemap.toml from a string (useful for testing)
pub fn parse_config_toml_str(content: &str) -> Result<SitemapConfig> {
    let raw: RawConfig = toml::from_str(content)?;
    let mut config = SitemapConfig::default();

    if let Some(base_url) = raw.site.base_url {
        config.site.base_url = validate_base_url(&base_url, "site.base_url")?;
    }
    if let Some(public_dir) = raw.site.public_dir {
        if public_dir.trim().is_empty() {
            return Err(Error::ConfigParse(
                "Empty path in 'site.public_dir' field".to_string(),
            ));
        }
        config.site.public_dir = PathBuf::from(public_dir);
    }

    if let Some(base_url) = raw.api.base_url {
        config.api.base_url = validate_base_url(&base_url, "api.base_url")?;
    }
    if let Some(secs) = raw.api.timeout_secs {
        if secs == 0 {
            return Err(Error::ConfigParse(
                "'api.timeout_secs' must be greater than zero".to_string(),
            ));
        }
        config.api.timeout = Duration::from_secs(secs);
    }
    if let Some(max) = raw.api.max_concurrent {
        if max == 0 {
            return Err(Error::ConfigParse(
                "'api.max_concurrent' must be at least 1".to_string(),
            ));
        }
        config.api.max_concurrent = max;
    }

    if let Some(secs) = raw.cache.ttl_secs {
        config.cache.ttl = Duration::from_secs(secs);
    }

    Ok(config)
}

impl SitemapConfig {
    /// Load from `path` when given, otherwise start from defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => parse_config_toml(path),
            None => Ok(Self::default()),
        }
    }

    /// Override URLs from the process environment.
    pub fn apply_process_env(&mut self) -> Result<()> {
        self.apply_env(|name| std::env::var(name).ok())
    }

    /// Override URLs from an environment lookup.
    ///
    /// Empty values are ignored so an unset-but-exported variable does not
    /// wipe a configured URL.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let first = |names: &'static [&'static str]| -> Option<(&'static str, String)> {
            names.iter().find_map(|name| {
                lookup(name)
                    .filter(|v| !v.trim().is_empty())
                    .map(|v| (*name, v))
            })
        };

        if let Some((name, value)) = first(ENV_BASE_URL) {
            self.site.base_url = validate_base_url(&value, name)?;
        }
        if let Some((name, value)) = first(ENV_API_URL) {
            self.api.base_url = validate_base_url(&value, name)?;
        }
        Ok(())
    }

    pub fn set_base_url(&mut self, value: &str) -> Result<()> {
        self.site.base_url = validate_base_url(value, "--base-url")?;
        Ok(())
    }

    pub fn set_api_url(&mut self, value: &str) -> Result<()> {
        self.api.base_url = validate_base_url(value, "--api-url")?;
        Ok(())
    }
}

/// Validate an origin-style URL and strip trailing slashes.
///
/// Only absolute `http`/`https` URLs with a host are accepted; the value is
/// used as a prefix for every sitemap `<loc>`, so anything else would yield
/// an unusable sitemap.
fn validate_base_url(value: &str, field_name: &str) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(Error::ConfigParse(format!(
            "Empty URL in '{}' field",
            field_name
        )));
    }

    let parsed = url::Url::parse(trimmed).map_err(|e| {
        Error::ConfigParse(format!("Invalid URL in '{}': '{}' ({})", field_name, trimmed, e))
    })?;

    if !matches!(parsed.scheme(), "http" | "https") || parsed.host_str().is_none() {
        return Err(Error::ConfigParse(format!(
            "'{}' must be an absolute http(s) URL: '{}'",
            field_name, trimmed
        )));
    }

    Ok(trimmed.trim_end_matches('/').to_string())
}
