use std::path::PathBuf;

/// Errors raised while fetching content and producing sitemaps.
///
/// Fetch-side variants (`Fetch`, `Request`, `Timeout`, `Parse`) are absorbed
/// by the category cache. `Write` is the only class that aborts generation.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration parse error: {0}")]
    ConfigParse(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// Content API answered with a non-2xx status.
    #[error("Fetching '{category}' failed with HTTP status {status}")]
    Fetch { category: String, status: u16 },

    /// Transport-level failure (connection refused, TLS, body read).
    #[error("Request for '{category}' failed: {message}")]
    Request { category: String, message: String },

    #[error("Fetching '{category}' timed out")]
    Timeout { category: String },

    /// Body was not valid JSON, or not a JSON array.
    #[error("Invalid payload for '{category}': {message}")]
    Parse { category: String, message: String },

    /// A single content item failed the shape check.
    #[error("Item {index} rejected: {reason}")]
    Validation { index: usize, reason: String },

    #[error("Failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::ConfigParse(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_error_message_names_category_and_status() {
        let err = Error::Fetch {
            category: "games".to_string(),
            status: 503,
        };
        let msg = err.to_string();
        assert!(msg.contains("games"));
        assert!(msg.contains("503"));
    }

    #[test]
    fn test_write_error_names_path() {
        let err = Error::Write {
            path: PathBuf::from("public/sitemap.xml"),
            source: std::io::Error::other("disk full"),
        };
        assert!(err.to_string().contains("public/sitemap.xml"));
    }
}
