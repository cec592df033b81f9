use crate::error::{LoadError, Result};
use linkrank_core::model::normalize_url;
use quick_xml::Reader;
use quick_xml::events::Event;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Read `<url><loc>` entries from a local sitemap file as normalized URLs.
pub fn load_sitemap(path: &Path) -> Result<HashSet<String>> {
    let xml = fs::read_to_string(path).map_err(|e| LoadError::io(path, e))?;
    parse_sitemap(&xml, path)
}

/// Union of several sitemaps.
pub fn load_sitemaps(paths: &[PathBuf]) -> Result<HashSet<String>> {
    let mut urls = HashSet::new();
    for path in paths {
        urls.extend(load_sitemap(path)?);
    }
    info!("Sitemap allowlist holds {} URLs from {} files", urls.len(), paths.len());
    Ok(urls)
}

pub fn parse_sitemap(xml: &str, path: &Path) -> Result<HashSet<String>> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut urls = HashSet::new();
    let mut in_url = false;
    let mut in_loc = false;
    let mut nested_sitemaps = 0usize;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => match e.local_name().as_ref() {
                b"url" => in_url = true,
                b"loc" => in_loc = in_url,
                b"sitemap" => nested_sitemaps += 1,
                _ => {}
            },
            Ok(Event::End(e)) => match e.local_name().as_ref() {
                b"url" => in_url = false,
                b"loc" => in_loc = false,
                _ => {}
            },
            Ok(Event::Text(text)) if in_loc => {
                let loc = text.unescape().map_err(|e| xml_error(path, e))?;
                insert_loc(&mut urls, &loc);
            }
            Ok(Event::CData(data)) if in_loc => {
                insert_loc(&mut urls, &String::from_utf8_lossy(&data));
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(xml_error(path, e)),
            _ => {}
        }
    }

    if nested_sitemaps > 0 {
        warn!(
            "{} is a sitemap index; its {} child sitemaps must be passed individually",
            path.display(),
            nested_sitemaps
        );
    }
    Ok(urls)
}

fn insert_loc(urls: &mut HashSet<String>, loc: &str) {
    let url = normalize_url(loc);
    if !url.is_empty() {
        urls.insert(url);
    }
}

fn xml_error(path: &Path, err: impl std::fmt::Display) -> LoadError {
    LoadError::Xml {
        path: path.to_path_buf(),
        message: err.to_string(),
    }
}
