pub mod generate;
pub mod serve;
pub mod validate;

use anyhow::{Context, Result};
use clap::Args;
use sitemap_kit_core::SitemapConfig;
use sitemap_kit_fetcher::{CategoryCache, HttpContentSource};
use sitemap_kit_generator::{AssemblerOptions, SitemapAssembler, XmlWriter};
use std::path::PathBuf;
use std::sync::Arc;

/// Flags shared by every command that talks to the content API
#[derive(Args, Debug, Clone, Default)]
pub struct ConfigArgs {
    /// Path to sitemap.toml
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Public site origin (overrides NEXT_PUBLIC_BASE_URL)
    #[arg(long)]
    pub base_url: Option<String>,

    /// Content API base (overrides NEXT_PUBLIC_API_URL)
    #[arg(long)]
    pub api_url: Option<String>,
}

impl ConfigArgs {
    /// Resolve configuration: defaults < file < environment < flags.
    pub fn resolve(&self) -> Result<SitemapConfig> {
        let mut config = match &self.config {
            Some(path) => SitemapConfig::load(Some(path.as_path()))
                .with_context(|| format!("Failed to load {}", path.display()))?,
            None => SitemapConfig::default(),
        };

        config
            .apply_process_env()
            .context("Invalid URL in environment")?;

        if let Some(base_url) = &self.base_url {
            config.set_base_url(base_url)?;
        }
        if let Some(api_url) = &self.api_url {
            config.set_api_url(api_url)?;
        }

        Ok(config)
    }
}

/// HTTP source for the configured content API
pub fn content_source(config: &SitemapConfig) -> Result<HttpContentSource> {
    HttpContentSource::new(&config.api.base_url, config.api.timeout)
        .context("Failed to create content API client")
}

/// Wire the HTTP source, a shared cache and the writer into an assembler.
pub fn build_assembler(config: &SitemapConfig) -> Result<SitemapAssembler> {
    let source = Arc::new(content_source(config)?);
    let cache = Arc::new(CategoryCache::new(config.cache.ttl));
    let writer = XmlWriter::new(&config.site.public_dir);

    Ok(SitemapAssembler::new(
        AssemblerOptions::from_config(config),
        source,
        cache,
        writer,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_flags_override_config_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("sitemap.toml");
        fs::write(
            &path,
            "[site]\nbase_url = \"https://file.example.com\"\n\n[cache]\nttl_secs = 30\n",
        )
        .unwrap();

        let args = ConfigArgs {
            config: Some(path),
            base_url: Some("https://flag.example.com/".to_string()),
            api_url: None,
        };
        let config = args.resolve().unwrap();

        assert_eq!(config.site.base_url, "https://flag.example.com");
        assert_eq!(config.cache.ttl.as_secs(), 30);
    }

    #[test]
    fn test_missing_config_file_is_an_error() {
        let args = ConfigArgs {
            config: Some(PathBuf::from("/nonexistent/sitemap.toml")),
            ..Default::default()
        };
        let err = args.resolve().unwrap_err();
        assert!(err.to_string().contains("Failed to load"));
    }

    #[test]
    fn test_invalid_flag_url_is_rejected() {
        let args = ConfigArgs {
            api_url: Some("not-a-url".to_string()),
            ..Default::default()
        };
        assert!(args.resolve().is_err());
    }
}
