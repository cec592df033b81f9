use serde::{Deserialize, Serialize};
use std::fmt;

/// Case-fold a URL and strip trailing slashes so that
/// `https://Example.com/Blog/` and `https://example.com/blog` compare equal.
pub fn normalize_url(url: &str) -> String {
    url.trim().trim_end_matches('/').to_lowercase()
}

/// A crawled page as handed over by the loader.
///
/// `url` is optional because the loader forwards records verbatim; the graph
/// builder is the one that rejects records without it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PageRecord {
    pub url: Option<String>,
    pub status_code: u16,
    pub indexable: bool,
    pub word_count: u32,
    pub has_meta_description: bool,
    pub title: Option<String>,
    pub h1: Option<String>,
    pub depth: Option<u32>,
    pub redirect_url: Option<String>,
}

impl PageRecord {
    /// An indexable 200 page with no other metadata.
    pub fn ok(url: &str) -> Self {
        Self {
            url: Some(url.to_string()),
            status_code: 200,
            indexable: true,
            ..Self::default()
        }
    }

    pub fn with_status(mut self, status_code: u16) -> Self {
        self.status_code = status_code;
        self
    }

    pub fn with_indexable(mut self, indexable: bool) -> Self {
        self.indexable = indexable;
        self
    }

    pub fn with_title(mut self, title: &str) -> Self {
        self.title = Some(title.to_string());
        self
    }

    pub fn with_h1(mut self, h1: &str) -> Self {
        self.h1 = Some(h1.to_string());
        self
    }

    pub fn with_redirect(mut self, redirect_url: &str) -> Self {
        self.redirect_url = Some(redirect_url.to_string());
        self
    }
}

/// A link found on a page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LinkRecord {
    pub source_url: Option<String>,
    pub target_url: Option<String>,
    pub anchor_text: String,
    pub location: LinkLocation,
}

impl LinkRecord {
    pub fn new(source_url: &str, target_url: &str, location: LinkLocation) -> Self {
        Self {
            source_url: Some(source_url.to_string()),
            target_url: Some(target_url.to_string()),
            anchor_text: String::new(),
            location,
        }
    }

    pub fn with_anchor(mut self, anchor_text: &str) -> Self {
        self.anchor_text = anchor_text.to_string();
        self
    }
}

/// Where on the page a link sits. Drives the PageRank weight multiplier.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum LinkLocation {
    Navigation,
    Header,
    #[default]
    Body,
    Footer,
    Sidebar,
    Other(String),
}

impl LinkLocation {
    pub fn parse(s: &str) -> Self {
        let folded = s.trim().to_lowercase();
        match folded.as_str() {
            "navigation" | "nav" | "menu" => LinkLocation::Navigation,
            "header" => LinkLocation::Header,
            "body" | "content" | "main_content" => LinkLocation::Body,
            "footer" => LinkLocation::Footer,
            "sidebar" | "aside" => LinkLocation::Sidebar,
            _ => LinkLocation::Other(folded),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            LinkLocation::Navigation => "navigation",
            LinkLocation::Header => "header",
            LinkLocation::Body => "body",
            LinkLocation::Footer => "footer",
            LinkLocation::Sidebar => "sidebar",
            LinkLocation::Other(name) => name,
        }
    }
}

impl fmt::Display for LinkLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for LinkLocation {
    fn from(s: String) -> Self {
        LinkLocation::parse(&s)
    }
}

impl From<LinkLocation> for String {
    fn from(location: LinkLocation) -> Self {
        location.as_str().to_string()
    }
}
