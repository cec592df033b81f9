// Link graph construction.
//
// Nodes live in a Vec indexed by NodeId and edges reference nodes by index,
// so pages and links never point at each other directly. The graph is frozen
// once `GraphBuilder::build` returns; later stages keep their results in
// separate vectors indexed the same way.

use crate::error::{InputValidationError, RecordKind};
use crate::model::{LinkLocation, LinkRecord, PageRecord, normalize_url};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap, HashSet};
use tracing::{debug, info, warn};

/// How many skipped records get an individual log line.
const LOGGED_INVALID_RECORDS: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct NodeId(usize);

impl NodeId {
    pub(crate) fn from_index(index: usize) -> Self {
        NodeId(index)
    }

    pub fn index(self) -> usize {
        self.0
    }
}

/// A page that made it into the graph.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page {
    pub url: String,
    pub word_count: u32,
    pub has_meta_description: bool,
    pub title: Option<String>,
    pub h1: Option<String>,
    pub depth: Option<u32>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Edge {
    pub source: NodeId,
    pub target: NodeId,
    pub anchor_text: String,
    pub location: LinkLocation,
}

impl Edge {
    pub fn is_self_loop(&self) -> bool {
        self.source == self.target
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ExclusionReason {
    NonOk,
    NonIndexable,
    NotInSitemap,
}

impl ExclusionReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExclusionReason::NonOk => "non_200",
            ExclusionReason::NonIndexable => "non_indexable",
            ExclusionReason::NotInSitemap => "not_in_sitemap",
        }
    }
}

/// A page record that was filtered out before graph construction.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExcludedPage {
    pub url: String,
    pub status_code: u16,
    pub reason: ExclusionReason,
    pub redirect_url: Option<String>,
}

/// A link from a graph node to something outside the graph.
///
/// These never take part in scoring; diagnostics use them to spot authority
/// spent on excluded or broken pages.
#[derive(Debug, Clone, PartialEq)]
pub struct OutboundExclusion {
    pub source: NodeId,
    pub target_url: String,
    pub anchor_text: String,
    pub location: LinkLocation,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ExcludedCounts {
    pub non_ok: usize,
    pub non_indexable: usize,
    pub not_in_sitemap: usize,
}

impl ExcludedCounts {
    pub fn total(&self) -> usize {
        self.non_ok + self.non_indexable + self.not_in_sitemap
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DroppedEdges {
    pub missing_field: usize,
    pub unknown_source: usize,
    pub unknown_target: usize,
    pub excluded_source: usize,
    pub excluded_target: usize,
}

impl DroppedEdges {
    pub fn total(&self) -> usize {
        self.missing_field
            + self.unknown_source
            + self.unknown_target
            + self.excluded_source
            + self.excluded_target
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BuildSummary {
    pub pages_seen: usize,
    pub nodes_kept: usize,
    pub pages_excluded: ExcludedCounts,
    pub pages_invalid: usize,
    pub duplicate_pages: usize,
    pub links_seen: usize,
    pub edges_kept: usize,
    pub self_loops: usize,
    pub edges_dropped: DroppedEdges,
    #[serde(skip)]
    pub invalid_records: Vec<InputValidationError>,
}

#[derive(Debug, Clone, Default)]
pub struct Graph {
    pages: Vec<Page>,
    lookup: HashMap<String, NodeId>,
    edges: Vec<Edge>,
    outgoing: Vec<Vec<usize>>,
    incoming: Vec<Vec<usize>>,
    excluded: BTreeMap<String, ExcludedPage>,
    outbound_exclusions: Vec<OutboundExclusion>,
}

impl Graph {
    pub fn node_count(&self) -> usize {
        self.pages.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    /// Node ids in index order, which is lexicographic URL order.
    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        (0..self.pages.len()).map(NodeId)
    }

    pub fn page(&self, id: NodeId) -> &Page {
        &self.pages[id.0]
    }

    pub fn url(&self, id: NodeId) -> &str {
        &self.pages[id.0].url
    }

    /// Look up a node by URL. The URL is normalized first.
    pub fn node_id(&self, url: &str) -> Option<NodeId> {
        self.lookup.get(&normalize_url(url)).copied()
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn outgoing(&self, id: NodeId) -> impl Iterator<Item = &Edge> + '_ {
        self.outgoing[id.0].iter().map(move |&e| &self.edges[e])
    }

    pub fn incoming(&self, id: NodeId) -> impl Iterator<Item = &Edge> + '_ {
        self.incoming[id.0].iter().map(move |&e| &self.edges[e])
    }

    pub fn in_degree(&self, id: NodeId) -> usize {
        self.incoming[id.0].len()
    }

    pub fn out_degree(&self, id: NodeId) -> usize {
        self.outgoing[id.0].len()
    }

    /// Inbound edges, not counting links a page makes to itself.
    pub fn inlinks_from_other_pages(&self, id: NodeId) -> usize {
        self.incoming(id).filter(|e| !e.is_self_loop()).count()
    }

    pub fn has_edge(&self, source: NodeId, target: NodeId) -> bool {
        self.outgoing(source).any(|e| e.target == target)
    }

    pub fn excluded_page(&self, url: &str) -> Option<&ExcludedPage> {
        self.excluded.get(&normalize_url(url))
    }

    pub fn excluded_pages(&self) -> impl Iterator<Item = &ExcludedPage> + '_ {
        self.excluded.values()
    }

    pub fn outbound_exclusions(&self) -> &[OutboundExclusion] {
        &self.outbound_exclusions
    }
}

/// Turns loader records into a [`Graph`].
#[derive(Debug, Clone, Default)]
pub struct GraphBuilder {
    sitemap: Option<HashSet<String>>,
}

impl GraphBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict nodes to pages listed in a sitemap.
    pub fn with_sitemap<I, S>(mut self, urls: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.sitemap = Some(urls.into_iter().map(|u| normalize_url(u.as_ref())).collect());
        self
    }

    pub fn build(&self, pages: &[PageRecord], links: &[LinkRecord]) -> (Graph, BuildSummary) {
        let mut summary = BuildSummary {
            pages_seen: pages.len(),
            links_seen: links.len(),
            ..BuildSummary::default()
        };

        // BTreeMap keeps the kept pages sorted by URL, which fixes node order.
        let mut kept: BTreeMap<String, &PageRecord> = BTreeMap::new();
        let mut excluded: BTreeMap<String, ExcludedPage> = BTreeMap::new();

        for (position, record) in pages.iter().enumerate() {
            let Some(url) = required_url(record.url.as_deref()) else {
                summary.pages_invalid += 1;
                summary.invalid_records.push(InputValidationError {
                    kind: RecordKind::Page,
                    position,
                    field: "url",
                });
                continue;
            };

            if kept.contains_key(&url) || excluded.contains_key(&url) {
                debug!("Duplicate page record for {}, keeping the first", url);
                summary.duplicate_pages += 1;
                continue;
            }

            match self.exclusion_reason(&url, record) {
                Some(reason) => {
                    match reason {
                        ExclusionReason::NonOk => summary.pages_excluded.non_ok += 1,
                        ExclusionReason::NonIndexable => summary.pages_excluded.non_indexable += 1,
                        ExclusionReason::NotInSitemap => summary.pages_excluded.not_in_sitemap += 1,
                    }
                    excluded.insert(
                        url.clone(),
                        ExcludedPage {
                            url,
                            status_code: record.status_code,
                            reason,
                            redirect_url: record.redirect_url.as_deref().map(normalize_url),
                        },
                    );
                }
                None => {
                    kept.insert(url, record);
                }
            }
        }

        let mut lookup = HashMap::with_capacity(kept.len());
        let mut node_pages = Vec::with_capacity(kept.len());
        for (index, (url, record)) in kept.into_iter().enumerate() {
            lookup.insert(url.clone(), NodeId(index));
            node_pages.push(Page {
                url,
                word_count: record.word_count,
                has_meta_description: record.has_meta_description,
                title: non_empty(record.title.as_deref()),
                h1: non_empty(record.h1.as_deref()),
                depth: record.depth,
            });
        }

        let node_count = node_pages.len();
        let mut edges = Vec::new();
        let mut outgoing = vec![Vec::new(); node_count];
        let mut incoming = vec![Vec::new(); node_count];
        let mut outbound_exclusions = Vec::new();

        for (position, link) in links.iter().enumerate() {
            let source = required_url(link.source_url.as_deref());
            let target = required_url(link.target_url.as_deref());
            let (source, target) = match (source, target) {
                (Some(s), Some(t)) => (s, t),
                (s, _) => {
                    summary.edges_dropped.missing_field += 1;
                    summary.invalid_records.push(InputValidationError {
                        kind: RecordKind::Link,
                        position,
                        field: if s.is_none() { "source_url" } else { "target_url" },
                    });
                    continue;
                }
            };

            let Some(&source_id) = lookup.get(&source) else {
                if excluded.contains_key(&source) {
                    summary.edges_dropped.excluded_source += 1;
                } else {
                    summary.edges_dropped.unknown_source += 1;
                }
                continue;
            };

            let Some(&target_id) = lookup.get(&target) else {
                if excluded.contains_key(&target) {
                    summary.edges_dropped.excluded_target += 1;
                } else {
                    summary.edges_dropped.unknown_target += 1;
                }
                outbound_exclusions.push(OutboundExclusion {
                    source: source_id,
                    target_url: target,
                    anchor_text: link.anchor_text.clone(),
                    location: link.location.clone(),
                });
                continue;
            };

            if source_id == target_id {
                summary.self_loops += 1;
            }
            let edge_index = edges.len();
            outgoing[source_id.0].push(edge_index);
            incoming[target_id.0].push(edge_index);
            edges.push(Edge {
                source: source_id,
                target: target_id,
                anchor_text: link.anchor_text.clone(),
                location: link.location.clone(),
            });
        }

        summary.nodes_kept = node_count;
        summary.edges_kept = edges.len();

        for issue in summary.invalid_records.iter().take(LOGGED_INVALID_RECORDS) {
            warn!("Skipping record: {}", issue);
        }
        if summary.invalid_records.len() > LOGGED_INVALID_RECORDS {
            warn!(
                "{} more records skipped for missing fields",
                summary.invalid_records.len() - LOGGED_INVALID_RECORDS
            );
        }
        info!(
            "Graph built: {} nodes, {} edges kept, {} edges dropped, {} pages excluded",
            summary.nodes_kept,
            summary.edges_kept,
            summary.edges_dropped.total(),
            summary.pages_excluded.total()
        );

        let graph = Graph {
            pages: node_pages,
            lookup,
            edges,
            outgoing,
            incoming,
            excluded,
            outbound_exclusions,
        };
        (graph, summary)
    }

    fn exclusion_reason(&self, url: &str, record: &PageRecord) -> Option<ExclusionReason> {
        if record.status_code != 200 {
            return Some(ExclusionReason::NonOk);
        }
        if !record.indexable {
            return Some(ExclusionReason::NonIndexable);
        }
        if let Some(ref sitemap) = self.sitemap
            && !sitemap.contains(url)
        {
            return Some(ExclusionReason::NotInSitemap);
        }
        None
    }
}

fn required_url(url: Option<&str>) -> Option<String> {
    url.map(normalize_url).filter(|u| !u.is_empty())
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
