//! Sitemap Protocol serialization.
//!
//! Two document shapes are produced:
//!
//! ```xml
//! <urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
//!   <url><loc>https://example.com/</loc>...</url>
//! </urlset>
//!
//! <sitemapindex xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
//!   <sitemap><loc>https://example.com/sitemap-1.xml</loc>...</sitemap>
//! </sitemapindex>
//! ```

use sitemap_kit_core::{
    ChangeFrequency, Error, IMAGE_NS, Result, SITEMAP_CHUNK_SIZE, SITEMAP_INDEX_FILE, SITEMAP_NS,
    SitemapEntry, chunk_file_name, normalize_base_url,
};
use std::borrow::Cow;
use std::io::Write;
use std::path::{Path, PathBuf};

const XML_DECLARATION: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n";

/// Escape the five XML reserved characters.
pub fn escape_xml(s: &str) -> Cow<'_, str> {
    if !s.contains(['&', '<', '>', '"', '\'']) {
        return Cow::Borrowed(s);
    }

    let mut out = String::with_capacity(s.len() + 16);
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    Cow::Owned(out)
}

fn push_element(xml: &mut String, indent: &str, name: &str, text: &str) {
    xml.push_str(indent);
    xml.push('<');
    xml.push_str(name);
    xml.push('>');
    xml.push_str(&escape_xml(text));
    xml.push_str("</");
    xml.push_str(name);
    xml.push_str(">\n");
}

/// Render a `<urlset>` document.
///
/// The image namespace is only declared when at least one entry carries an
/// image.
pub fn render_urlset(entries: &[SitemapEntry]) -> String {
    let mut xml = String::with_capacity(256 + entries.len() * 200);
    let with_images = entries.iter().any(|e| !e.images.is_empty());

    xml.push_str(XML_DECLARATION);
    xml.push_str("<urlset xmlns=\"");
    xml.push_str(SITEMAP_NS);
    if with_images {
        xml.push_str("\" xmlns:image=\"");
        xml.push_str(IMAGE_NS);
    }
    xml.push_str("\">\n");

    for entry in entries {
        xml.push_str("  <url>\n");
        push_element(&mut xml, "    ", "loc", &entry.url);
        push_element(&mut xml, "    ", "lastmod", &entry.last_modified);
        push_element(&mut xml, "    ", "changefreq", entry.change_frequency.as_str());
        push_element(&mut xml, "    ", "priority", &format_priority(entry.priority));
        for image in &entry.images {
            xml.push_str("    <image:image>\n");
            push_element(&mut xml, "      ", "image:loc", &image.loc);
            if let Some(title) = &image.title {
                push_element(&mut xml, "      ", "image:title", title);
            }
            xml.push_str("    </image:image>\n");
        }
        xml.push_str("  </url>\n");
    }

    xml.push_str("</urlset>\n");
    xml
}

/// Render a `<sitemapindex>` document; only `loc` and `lastmod` are used.
pub fn render_sitemap_index(entries: &[SitemapEntry]) -> String {
    let mut xml = String::with_capacity(256 + entries.len() * 120);

    xml.push_str(XML_DECLARATION);
    xml.push_str("<sitemapindex xmlns=\"");
    xml.push_str(SITEMAP_NS);
    xml.push_str("\">\n");

    for entry in entries {
        xml.push_str("  <sitemap>\n");
        push_element(&mut xml, "    ", "loc", &entry.url);
        push_element(&mut xml, "    ", "lastmod", &entry.last_modified);
        xml.push_str("  </sitemap>\n");
    }

    xml.push_str("</sitemapindex>\n");
    xml
}

fn format_priority(priority: f64) -> String {
    format!("{:.1}", priority)
}

/// Index documents are recognised by file name.
fn is_index_file(file_name: &str) -> bool {
    file_name.contains("index")
}

/// Persists sitemap documents under the public asset root.
#[derive(Debug, Clone)]
pub struct XmlWriter {
    public_dir: PathBuf,
    chunk_size: usize,
}

impl XmlWriter {
    pub fn new(public_dir: impl Into<PathBuf>) -> Self {
        Self {
            public_dir: public_dir.into(),
            chunk_size: SITEMAP_CHUNK_SIZE,
        }
    }

    /// Override the chunk size used by [`XmlWriter::split_sitemaps`].
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    /// Serialize `entries` and write them to `file_name` under the public root.
    ///
    /// Write failures are logged and returned; a partially written sitemap
    /// must fail the run.
    pub async fn write_sitemap_file(&self, entries: &[SitemapEntry], file_name: &str) -> Result<PathBuf> {
        let xml = if is_index_file(file_name) {
            render_sitemap_index(entries)
        } else {
            render_urlset(entries)
        };
        self.write_file(file_name, xml.as_bytes()).await
    }

    /// Write an arbitrary text asset (robots.txt) under the public root.
    pub async fn write_text_file(&self, file_name: &str, contents: &str) -> Result<PathBuf> {
        self.write_file(file_name, contents.as_bytes()).await
    }

    /// Split `entries` into chunk files plus an index document.
    ///
    /// Returns one index entry per chunk, pointing at the chunk's public URL.
    pub async fn split_sitemaps(
        &self,
        entries: &[SitemapEntry],
        base_url: &str,
        generated_at: &str,
    ) -> Result<Vec<SitemapEntry>> {
        let base_url = normalize_base_url(base_url);
        let mut index = Vec::with_capacity(entries.len().div_ceil(self.chunk_size));

        for (i, chunk) in entries.chunks(self.chunk_size).enumerate() {
            let file_name = chunk_file_name(i + 1);
            self.write_sitemap_file(chunk, &file_name).await?;
            index.push(SitemapEntry {
                url: format!("{}/{}", base_url, file_name),
                last_modified: generated_at.to_string(),
                change_frequency: ChangeFrequency::Daily,
                priority: 1.0,
                images: Vec::new(),
            });
        }

        self.write_sitemap_file(&index, SITEMAP_INDEX_FILE).await?;
        self.remove_stale_chunks(index.len()).await?;
        tracing::info!(chunks = index.len(), urls = entries.len(), "wrote split sitemap");

        Ok(index)
    }

    /// Delete chunk files numbered above `keep` left by an earlier, larger
    /// run. With `keep == 0` the index document goes too.
    pub async fn remove_stale_chunks(&self, keep: usize) -> Result<usize> {
        let mut removed = 0;
        if keep == 0 && self.remove_if_present(SITEMAP_INDEX_FILE).await? {
            removed += 1;
        }
        // Chunks are numbered contiguously from 1.
        let mut n = keep + 1;
        while self.remove_if_present(&chunk_file_name(n)).await? {
            removed += 1;
            n += 1;
        }

        if removed > 0 {
            tracing::info!(removed, keep, "removed stale sitemap files");
        }
        Ok(removed)
    }

    async fn remove_if_present(&self, file_name: &str) -> Result<bool> {
        let path = self.public_dir.join(file_name);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(true),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(source) => {
                tracing::error!(path = %path.display(), error = %source, "failed to remove stale sitemap file");
                Err(Error::Write { path, source })
            }
        }
    }

    async fn write_file(&self, file_name: &str, contents: &[u8]) -> Result<PathBuf> {
        let path = self.public_dir.join(file_name);
        let write_err = |source: std::io::Error| {
            tracing::error!(path = %path.display(), error = %source, "failed to write sitemap asset");
            Error::Write {
                path: path.clone(),
                source,
            }
        };

        let dir = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.public_dir.clone());
        tokio::fs::create_dir_all(&dir).await.map_err(write_err)?;

        let target = path.clone();
        let data = contents.to_vec();
        tokio::task::spawn_blocking(move || replace_file(&dir, &target, &data))
            .await
            .map_err(std::io::Error::other)
            .and_then(|written| written)
            .map_err(write_err)?;

        tracing::debug!(path = %path.display(), bytes = contents.len(), "wrote file");
        Ok(path)
    }
}

/// Write `contents` to a temporary file in `dir` and rename it over
/// `target`. Readers see the old file or the new one, never a partial write;
/// on failure the temporary file is removed and `target` is untouched.
fn replace_file(dir: &Path, target: &Path, contents: &[u8]) -> std::io::Result<()> {
    let mut builder = tempfile::Builder::new();
    builder.prefix(".sitemap-").suffix(".tmp");
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        builder.permissions(std::fs::Permissions::from_mode(0o644));
    }

    let mut file = builder.tempfile_in(dir)?;
    file.write_all(contents)?;
    file.as_file().sync_all()?;
    file.persist(target).map_err(|err| err.error)?;
    Ok(())
}
