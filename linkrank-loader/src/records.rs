// Crawl-export rows. Column headers used by common crawler exports are
// accepted as aliases, so a CSV export converted to JSON loads unchanged.

use crate::error::{LoadError, Result};
use linkrank_core::model::{LinkLocation, LinkRecord, PageRecord};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::path::Path;

/// A cell that exports write as a bool, a number or a string.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub(crate) enum Scalar {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl Scalar {
    fn as_u64(&self) -> Option<u64> {
        match self {
            Scalar::Int(n) => u64::try_from(*n).ok(),
            Scalar::Float(f) if f.is_finite() && *f >= 0.0 => Some(*f as u64),
            Scalar::Text(s) => s
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|f| f.is_finite() && *f >= 0.0)
                .map(|f| f as u64),
            _ => None,
        }
    }

    /// `true`, `yes`, `1` and `indexable` read as set; anything else as unset.
    fn as_flag(&self) -> bool {
        match self {
            Scalar::Bool(b) => *b,
            Scalar::Int(n) => *n != 0,
            Scalar::Float(f) => *f != 0.0,
            Scalar::Text(s) => matches!(
                s.trim().to_lowercase().as_str(),
                "true" | "yes" | "1" | "indexable"
            ),
        }
    }

    fn is_present(&self) -> bool {
        match self {
            Scalar::Text(s) => !s.trim().is_empty(),
            other => other.as_flag(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawPage {
    #[serde(default, alias = "Address", alias = "address")]
    url: Option<String>,
    #[serde(default, alias = "Status Code", alias = "status")]
    status_code: Option<Scalar>,
    #[serde(default, alias = "Indexability", alias = "indexability")]
    indexable: Option<Scalar>,
    #[serde(default, alias = "Word Count")]
    word_count: Option<Scalar>,
    #[serde(default, alias = "Meta Description 1", alias = "meta_description")]
    has_meta_description: Option<Scalar>,
    #[serde(default, alias = "Title 1", alias = "Title")]
    title: Option<String>,
    #[serde(default, alias = "H1-1", alias = "H1")]
    h1: Option<String>,
    #[serde(default, alias = "Crawl Depth", alias = "Depth")]
    depth: Option<Scalar>,
    #[serde(default, alias = "Redirect URL")]
    redirect_url: Option<String>,
}

impl From<RawPage> for PageRecord {
    fn from(raw: RawPage) -> Self {
        PageRecord {
            url: raw.url,
            status_code: raw
                .status_code
                .and_then(|s| s.as_u64())
                .and_then(|n| u16::try_from(n).ok())
                .unwrap_or(0),
            // Exports that carry no indexability column are treated as indexable.
            indexable: raw.indexable.map(|s| s.as_flag()).unwrap_or(true),
            word_count: raw
                .word_count
                .and_then(|s| s.as_u64())
                .map(|n| u32::try_from(n).unwrap_or(u32::MAX))
                .unwrap_or(0),
            has_meta_description: raw
                .has_meta_description
                .map(|s| s.is_present())
                .unwrap_or(false),
            title: non_blank(raw.title),
            h1: non_blank(raw.h1),
            depth: raw
                .depth
                .and_then(|s| s.as_u64())
                .and_then(|n| u32::try_from(n).ok()),
            redirect_url: non_blank(raw.redirect_url),
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawLink {
    #[serde(default, alias = "From", alias = "Source", alias = "source")]
    source_url: Option<String>,
    #[serde(default, alias = "To", alias = "Destination", alias = "target")]
    target_url: Option<String>,
    #[serde(default, alias = "Anchor Text", alias = "Anchor", alias = "anchor")]
    anchor_text: Option<String>,
    #[serde(default, alias = "Link Position", alias = "Link Location", alias = "position")]
    location: Option<String>,
}

impl From<RawLink> for LinkRecord {
    fn from(raw: RawLink) -> Self {
        let location = match raw.location.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => LinkLocation::parse(name),
            _ => LinkLocation::default(),
        };
        LinkRecord {
            source_url: raw.source_url,
            target_url: raw.target_url,
            anchor_text: raw.anchor_text.unwrap_or_default(),
            location,
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

/// Parse either a JSON array of objects or JSON Lines (one object per line).
pub(crate) fn parse_records<T: DeserializeOwned>(text: &str, path: &Path) -> Result<Vec<T>> {
    let json_error = |line: usize, source: serde_json::Error| LoadError::Json {
        path: path.to_path_buf(),
        line,
        source,
    };

    if text.trim_start().starts_with('[') {
        return serde_json::from_str(text).map_err(|e| {
            let line = e.line();
            json_error(line, e)
        });
    }

    let mut records = Vec::new();
    for (idx, line) in text.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let record = serde_json::from_str(line).map_err(|e| json_error(idx + 1, e))?;
        records.push(record);
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalar_status_from_text() {
        assert_eq!(Scalar::Text(" 301 ".to_string()).as_u64(), Some(301));
        assert_eq!(Scalar::Float(200.0).as_u64(), Some(200));
        assert_eq!(Scalar::Int(-1).as_u64(), None);
    }

    #[test]
    fn test_scalar_indexability_flag() {
        assert!(Scalar::Text("Indexable".to_string()).as_flag());
        assert!(!Scalar::Text("Non-Indexable".to_string()).as_flag());
        assert!(Scalar::Bool(true).as_flag());
    }

    #[test]
    fn test_meta_description_text_counts_as_present() {
        assert!(Scalar::Text("A page about widgets".to_string()).is_present());
        assert!(!Scalar::Text("  ".to_string()).is_present());
    }
}
