//! Shape checks for content payloads and generated sitemap entries.
//!
//! Neither check is fatal: rejected items and entries are dropped and
//! counted so upstream content regressions show up in reports and logs.

use serde_json::Value;
use sitemap_kit_core::{Category, ContentItem, Error, Result, SitemapEntry};
use std::collections::HashSet;

/// A payload element that was dropped
#[derive(Debug, Clone, PartialEq)]
pub struct Rejection {
    pub index: usize,
    pub reason: String,
}

/// Outcome of validating one category payload.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidationReport {
    pub category: String,
    pub accepted: usize,
    pub rejected: Vec<Rejection>,
}

impl ValidationReport {
    pub fn dropped(&self) -> usize {
        self.rejected.len()
    }
}

/// Check a single payload element.
///
/// An item is usable only when it is an object carrying a non-empty string
/// `slug`. Optional fields of the wrong type are ignored rather than
/// rejecting the item.
pub fn validate_item(index: usize, value: &Value) -> Result<ContentItem> {
    let object = value.as_object().ok_or_else(|| Error::Validation {
        index,
        reason: format!("expected an object, found {}", json_type(value)),
    })?;

    let slug = match object.get("slug") {
        Some(Value::String(s)) if !s.trim().is_empty() => s.clone(),
        Some(Value::String(_)) => {
            return Err(Error::Validation {
                index,
                reason: "slug is empty".to_string(),
            });
        }
        Some(other) => {
            return Err(Error::Validation {
                index,
                reason: format!("slug must be a string, found {}", json_type(other)),
            });
        }
        None => {
            return Err(Error::Validation {
                index,
                reason: "missing slug".to_string(),
            });
        }
    };

    let text = |key: &str| object.get(key).and_then(Value::as_str).map(str::to_string);

    let mut fields = object.clone();
    for known in ["slug", "updatedAt", "createdAt", "image", "imageAlt"] {
        fields.remove(known);
    }

    Ok(ContentItem {
        slug,
        updated_at: text("updatedAt"),
        created_at: text("createdAt"),
        image: text("image").filter(|s| !s.trim().is_empty()),
        image_alt: text("imageAlt"),
        fields,
    })
}

/// Validate a decoded category payload.
///
/// The payload itself must be a JSON array; anything else is a parse
/// failure for the whole category. Individual bad elements are collected in
/// the report and skipped.
pub fn validate_payload(category: &Category, payload: Value) -> Result<(Vec<ContentItem>, ValidationReport)> {
    let Value::Array(elements) = payload else {
        return Err(Error::Parse {
            category: category.key.to_string(),
            message: format!("expected a JSON array, found {}", json_type(&payload)),
        });
    };

    let mut report = ValidationReport {
        category: category.key.to_string(),
        ..Default::default()
    };
    let mut items = Vec::with_capacity(elements.len());

    for (index, element) in elements.iter().enumerate() {
        match validate_item(index, element) {
            Ok(item) => items.push(item),
            Err(Error::Validation { index, reason }) => {
                tracing::debug!(category = category.key, index, %reason, "rejected content item");
                report.rejected.push(Rejection { index, reason });
            }
            Err(other) => return Err(other),
        }
    }
    report.accepted = items.len();

    Ok((items, report))
}

/// Counts of entries removed by [`validate_entries`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EntryReport {
    pub invalid: usize,
    pub duplicates: usize,
}

/// Drop malformed and duplicate entries.
///
/// An entry is malformed when its URL is not an absolute http(s) URL or its
/// priority falls outside `[0, 1]`. Duplicates keep their first occurrence,
/// so static routes win over dynamic ones sharing a URL.
pub fn validate_entries(entries: Vec<SitemapEntry>) -> (Vec<SitemapEntry>, EntryReport) {
    let mut report = EntryReport::default();
    let mut seen = HashSet::with_capacity(entries.len());
    let mut kept = Vec::with_capacity(entries.len());

    for entry in entries {
        if !is_valid_entry(&entry) {
            tracing::warn!(url = %entry.url, priority = entry.priority, "dropping malformed sitemap entry");
            report.invalid += 1;
            continue;
        }
        if !seen.insert(entry.url.clone()) {
            report.duplicates += 1;
            continue;
        }
        kept.push(entry);
    }

    if report.duplicates > 0 {
        tracing::info!(duplicates = report.duplicates, "removed duplicate sitemap URLs");
    }

    (kept, report)
}

fn is_valid_entry(entry: &SitemapEntry) -> bool {
    let url_ok = url::Url::parse(&entry.url)
        .map(|u| matches!(u.scheme(), "http" | "https") && u.host_str().is_some())
        .unwrap_or(false);
    url_ok && (0.0..=1.0).contains(&entry.priority)
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use sitemap_kit_core::{CATEGORIES, ChangeFrequency};

    fn airdrops() -> &'static Category {
        &CATEGORIES[0]
    }

    fn entry(url: &str) -> SitemapEntry {
        SitemapEntry {
            url: url.to_string(),
            last_modified: "2024-01-01T00:00:00Z".to_string(),
            change_frequency: ChangeFrequency::Daily,
            priority: 0.9,
            images: vec![],
        }
    }

    #[test]
    fn test_validate_item_lifts_known_fields() {
        let value = json!({
            "slug": "abc",
            "updatedAt": "2024-01-01T00:00:00Z",
            "image": "https://cdn.example.com/a.png",
            "imageAlt": "Alt",
            "title": "Title"
        });
        let item = validate_item(0, &value).unwrap();
        assert_eq!(item.slug, "abc");
        assert_eq!(item.updated_at.as_deref(), Some("2024-01-01T00:00:00Z"));
        assert_eq!(item.image.as_deref(), Some("https://cdn.example.com/a.png"));
        assert_eq!(item.image_alt.as_deref(), Some("Alt"));
        assert_eq!(item.field("title"), Some("Title"));
        assert!(item.field("slug").is_none());
    }

    #[test]
    fn test_validate_item_rejects_bad_slugs() {
        let cases = [
            json!({"title": "no slug"}),
            json!({"slug": 42}),
            json!({"slug": null}),
            json!({"slug": ""}),
            json!({"slug": "   "}),
            json!("just a string"),
        ];
        for (index, value) in cases.iter().enumerate() {
            let err = validate_item(index, value).unwrap_err();
            assert!(
                matches!(err, Error::Validation { index: i, .. } if i == index),
                "case {} should be a validation error",
                index
            );
        }
    }

    #[test]
    fn test_validate_item_ignores_wrongly_typed_optionals() {
        let item = validate_item(0, &json!({"slug": "a", "updatedAt": 17, "image": ""})).unwrap();
        assert!(item.updated_at.is_none());
        assert!(item.image.is_none());
    }

    #[test]
    fn test_validate_payload_drops_invalid_items_without_failing() {
        let payload = json!([
            {"slug": "one"},
            {"title": "missing"},
            {"slug": 5},
            {"slug": "two"}
        ]);
        let (items, report) = validate_payload(airdrops(), payload).unwrap();

        assert_eq!(items.len(), 2);
        assert_eq!(report.accepted, 2);
        assert_eq!(report.dropped(), 2);
        assert_eq!(report.rejected[0].index, 1);
        assert_eq!(report.rejected[1].index, 2);
        assert_eq!(report.category, "airdrops");
    }

    #[test]
    fn test_validate_payload_empty_array_is_ok() {
        let (items, report) = validate_payload(airdrops(), json!([])).unwrap();
        assert!(items.is_empty());
        assert_eq!(report.dropped(), 0);
    }

    #[test]
    fn test_validate_payload_requires_array() {
        let err = validate_payload(airdrops(), json!({"items": []})).unwrap_err();
        assert!(matches!(err, Error::Parse { .. }));
        assert!(err.to_string().contains("expected a JSON array"));
    }

    #[test]
    fn test_validate_entries_removes_duplicates_keeping_first() {
        let mut second = entry("https://example.com/airdrops");
        second.priority = 0.5;
        let entries = vec![
            entry("https://example.com/airdrops"),
            entry("https://example.com/games/x"),
            second,
        ];

        let (kept, report) = validate_entries(entries);
        assert_eq!(kept.len(), 2);
        assert_eq!(report.duplicates, 1);
        assert_eq!(kept[0].priority, 0.9);
    }

    #[test]
    fn test_validate_entries_drops_malformed() {
        let mut bad_priority = entry("https://example.com/ok");
        bad_priority.priority = 1.5;
        let entries = vec![
            entry("/relative/path"),
            entry("mailto:someone@example.com"),
            bad_priority,
            entry("https://example.com/good"),
        ];

        let (kept, report) = validate_entries(entries);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].url, "https://example.com/good");
        assert_eq!(report.invalid, 3);
    }
}
