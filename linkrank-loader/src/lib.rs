pub mod error;
mod records;
pub mod sitemap;

pub use error::{LoadError, Result};
pub use sitemap::{load_sitemap, load_sitemaps, parse_sitemap};

use linkrank_core::model::{LinkRecord, PageRecord};
use records::{RawLink, RawPage, parse_records};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Page records from a JSON array or JSON Lines file.
pub fn load_pages(path: &Path) -> Result<Vec<PageRecord>> {
    let text = fs::read_to_string(path).map_err(|e| LoadError::io(path, e))?;
    let raw: Vec<RawPage> = parse_records(&text, path)?;
    debug!("Read {} page rows from {}", raw.len(), path.display());
    Ok(raw.into_iter().map(PageRecord::from).collect())
}

/// Link records from a JSON array or JSON Lines file.
pub fn load_links(path: &Path) -> Result<Vec<LinkRecord>> {
    let text = fs::read_to_string(path).map_err(|e| LoadError::io(path, e))?;
    let raw: Vec<RawLink> = parse_records(&text, path)?;
    debug!("Read {} link rows from {}", raw.len(), path.display());
    Ok(raw.into_iter().map(LinkRecord::from).collect())
}

/// Everything one analysis run reads from disk.
#[derive(Debug, Clone, Default)]
pub struct CrawlExport {
    pub pages: Vec<PageRecord>,
    pub links: Vec<LinkRecord>,
    pub sitemap: Option<HashSet<String>>,
}

impl CrawlExport {
    /// Load pages and links; sitemaps are optional and an empty slice means
    /// no allowlist.
    pub fn load(pages: &Path, links: &Path, sitemaps: &[PathBuf]) -> Result<Self> {
        let pages = load_pages(pages)?;
        let links = load_links(links)?;
        let sitemap = if sitemaps.is_empty() {
            None
        } else {
            Some(load_sitemaps(sitemaps)?)
        };

        info!(
            "Loaded {} page records and {} link records",
            pages.len(),
            links.len()
        );
        Ok(Self {
            pages,
            links,
            sitemap,
        })
    }
}
