// Orphan, authority-leak and broken-link detection over a scored graph.

use crate::config::{AnalysisConfig, WeightTable};
use crate::graph::{Graph, NodeId, OutboundExclusion};
use crate::model::LinkLocation;
use crate::pagerank::{PageRankScores, at_or_above};
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use tracing::info;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Orphan {
    #[serde(skip)]
    pub node: NodeId,
    pub url: String,
    pub score: f64,
    pub inbound_count: usize,
    /// Shortfall relative to the site median: (median - score) / median.
    pub lost_authority: f64,
    pub word_count: u32,
    pub title: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LeakedTarget {
    pub url: String,
    /// None when the target is not a graph node.
    pub score: Option<f64>,
    /// Only known for targets outside the graph.
    pub status_code: Option<u16>,
    pub weight: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuthorityLeak {
    #[serde(skip)]
    pub node: NodeId,
    pub url: String,
    pub score: f64,
    pub leaked_weight: f64,
    pub leaked_share: f64,
    pub leaked_targets: Vec<LeakedTarget>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum LinkFix {
    UpdateRedirect { to: String },
    FixBroken,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BrokenLink {
    pub source_url: String,
    pub target_url: String,
    pub status_code: Option<u16>,
    pub redirect_target: Option<String>,
    pub anchor_text: String,
    pub location: LinkLocation,
    pub fix: LinkFix,
}

impl BrokenLink {
    pub fn recommendation(&self) -> String {
        match (&self.fix, self.status_code) {
            (LinkFix::UpdateRedirect { to }, _) => format!("Update link to point directly to {}", to),
            (LinkFix::FixBroken, Some(status)) => format!("Fix broken link (status: {})", status),
            (LinkFix::FixBroken, None) => "Fix broken link (status: unknown)".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Diagnostics {
    pub median_score: f64,
    pub top_score_cutoff: f64,
    pub orphans: Vec<Orphan>,
    pub leaks: Vec<AuthorityLeak>,
    pub broken_links: Vec<BrokenLink>,
}

pub struct DiagnosticsEngine {
    min_inlinks: usize,
    pagerank_threshold: f64,
    weights: WeightTable,
}

impl Default for DiagnosticsEngine {
    fn default() -> Self {
        Self::from_config(&AnalysisConfig::default())
    }
}

impl DiagnosticsEngine {
    pub fn from_config(config: &AnalysisConfig) -> Self {
        Self {
            min_inlinks: config.min_inlinks,
            pagerank_threshold: config.pagerank_threshold,
            weights: config.weights.clone(),
        }
    }

    pub fn with_min_inlinks(mut self, min_inlinks: usize) -> Self {
        self.min_inlinks = min_inlinks;
        self
    }

    pub fn with_pagerank_threshold(mut self, pagerank_threshold: f64) -> Self {
        self.pagerank_threshold = pagerank_threshold;
        self
    }

    pub fn diagnose(&self, graph: &Graph, scores: &PageRankScores) -> Diagnostics {
        if graph.is_empty() {
            return Diagnostics::default();
        }

        let median_score = scores.median();
        let top_score_cutoff = self.top_score_cutoff(scores);

        let orphans = self.find_orphans(graph, scores, median_score);
        let leaks = self.find_leaks(graph, scores, median_score, top_score_cutoff);
        let broken_links = find_broken_links(graph);

        info!(
            "Diagnostics: {} orphans, {} authority leaks, {} broken links",
            orphans.len(),
            leaks.len(),
            broken_links.len()
        );

        Diagnostics {
            median_score,
            top_score_cutoff,
            orphans,
            leaks,
            broken_links,
        }
    }

    /// Score of the k-th best node, k = ceil(threshold * N).
    fn top_score_cutoff(&self, scores: &PageRankScores) -> f64 {
        let ranked = scores.ranked();
        let n = ranked.len();
        let k = ((self.pagerank_threshold * n as f64).ceil() as usize).clamp(1, n);
        scores.score(ranked[k - 1])
    }

    fn find_orphans(&self, graph: &Graph, scores: &PageRankScores, median: f64) -> Vec<Orphan> {
        let mut orphans: Vec<Orphan> = graph
            .node_ids()
            .filter_map(|id| {
                let inbound_count = graph.inlinks_from_other_pages(id);
                if inbound_count >= self.min_inlinks {
                    return None;
                }
                let score = scores.score(id);
                let page = graph.page(id);
                Some(Orphan {
                    node: id,
                    url: page.url.clone(),
                    score,
                    inbound_count,
                    lost_authority: if median > 0.0 {
                        (median - score) / median
                    } else {
                        0.0
                    },
                    word_count: page.word_count,
                    title: page.title.clone(),
                })
            })
            .collect();

        orphans.sort_by(|a, b| {
            b.lost_authority
                .partial_cmp(&a.lost_authority)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.url.cmp(&b.url))
        });
        orphans
    }

    fn find_leaks(
        &self,
        graph: &Graph,
        scores: &PageRankScores,
        median: f64,
        cutoff: f64,
    ) -> Vec<AuthorityLeak> {
        let mut exclusions_by_source: HashMap<NodeId, Vec<&OutboundExclusion>> = HashMap::new();
        for exclusion in graph.outbound_exclusions() {
            exclusions_by_source
                .entry(exclusion.source)
                .or_default()
                .push(exclusion);
        }

        let mut leaks = Vec::new();
        for id in graph.node_ids() {
            let score = scores.score(id);
            if !at_or_above(score, cutoff) {
                continue;
            }

            let mut targets: BTreeMap<String, LeakedTarget> = BTreeMap::new();
            for edge in graph.outgoing(id) {
                let target_score = scores.score(edge.target);
                if at_or_above(target_score, median) {
                    continue;
                }
                let url = graph.url(edge.target);
                let entry = targets.entry(url.to_string()).or_insert_with(|| LeakedTarget {
                    url: url.to_string(),
                    score: Some(target_score),
                    status_code: None,
                    weight: 0.0,
                });
                entry.weight += self.weights.weight_for(&edge.location);
            }

            let exclusions = exclusions_by_source.get(&id).map(Vec::as_slice).unwrap_or(&[]);
            let mut excluded_weight = 0.0;
            for exclusion in exclusions {
                let weight = self.weights.weight_for(&exclusion.location);
                excluded_weight += weight;
                let entry = targets
                    .entry(exclusion.target_url.clone())
                    .or_insert_with(|| LeakedTarget {
                        url: exclusion.target_url.clone(),
                        score: None,
                        status_code: graph
                            .excluded_page(&exclusion.target_url)
                            .map(|p| p.status_code),
                        weight: 0.0,
                    });
                entry.weight += weight;
            }

            if targets.is_empty() {
                continue;
            }

            let leaked_weight: f64 = targets.values().map(|t| t.weight).sum();
            let total_weight = scores.total_outgoing_weight(id) + excluded_weight;
            leaks.push(AuthorityLeak {
                node: id,
                url: graph.url(id).to_string(),
                score,
                leaked_weight,
                leaked_share: if total_weight > 0.0 {
                    leaked_weight / total_weight
                } else {
                    0.0
                },
                leaked_targets: targets.into_values().collect(),
            });
        }

        leaks.sort_by(|a, b| {
            b.leaked_weight
                .partial_cmp(&a.leaked_weight)
                .unwrap_or(Ordering::Equal)
                .then_with(|| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal))
                .then_with(|| a.url.cmp(&b.url))
        });
        leaks
    }
}

/// Links from graph pages to non-200 or unknown targets.
pub fn find_broken_links(graph: &Graph) -> Vec<BrokenLink> {
    let mut broken: Vec<BrokenLink> = graph
        .outbound_exclusions()
        .iter()
        .filter_map(|exclusion| {
            let target = graph.excluded_page(&exclusion.target_url);
            let (status_code, redirect_target) = match target {
                // Excluded for indexability or sitemap reasons, the link itself works.
                Some(page) if page.status_code == 200 => return None,
                Some(page) if is_redirect(page.status_code) => {
                    (Some(page.status_code), page.redirect_url.clone())
                }
                Some(page) => (Some(page.status_code), None),
                None => (None, None),
            };
            let fix = match redirect_target {
                Some(ref to) => LinkFix::UpdateRedirect { to: to.clone() },
                None => LinkFix::FixBroken,
            };
            Some(BrokenLink {
                source_url: graph.url(exclusion.source).to_string(),
                target_url: exclusion.target_url.clone(),
                status_code,
                redirect_target,
                anchor_text: exclusion.anchor_text.clone(),
                location: exclusion.location.clone(),
                fix,
            })
        })
        .collect();

    broken.sort_by(|a, b| {
        a.source_url
            .cmp(&b.source_url)
            .then_with(|| a.target_url.cmp(&b.target_url))
    });
    broken
}

fn is_redirect(status_code: u16) -> bool {
    matches!(status_code, 301 | 302 | 307 | 308)
}
