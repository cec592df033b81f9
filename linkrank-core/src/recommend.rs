// New-link suggestions for orphaned pages.

use crate::config::{AnalysisConfig, WeightTable};
use crate::diagnostics::Orphan;
use crate::graph::{Graph, NodeId, Page};
use crate::model::LinkLocation;
use crate::pagerank::{PageRankScores, at_or_above};
use serde::Serialize;
use std::cmp::Ordering;
use tracing::info;
use url::Url;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recommendation {
    #[serde(skip)]
    pub source: NodeId,
    #[serde(skip)]
    pub target: NodeId,
    pub source_url: String,
    pub target_url: String,
    pub suggested_anchor: String,
    pub location: LinkLocation,
    pub expected_gain: f64,
    pub source_score: f64,
    pub target_score: f64,
}

pub struct RecommendationGenerator {
    location: LinkLocation,
    weights: WeightTable,
    max_per_orphan: usize,
}

impl Default for RecommendationGenerator {
    fn default() -> Self {
        Self::from_config(&AnalysisConfig::default())
    }
}

impl RecommendationGenerator {
    pub fn from_config(config: &AnalysisConfig) -> Self {
        Self {
            location: config.recommendation_location.clone(),
            weights: config.weights.clone(),
            max_per_orphan: config.max_recommendations_per_orphan,
        }
    }

    pub fn with_location(mut self, location: LinkLocation) -> Self {
        self.location = location;
        self
    }

    /// Cap on suggestions per orphan; 0 means no cap.
    pub fn with_max_per_orphan(mut self, max_per_orphan: usize) -> Self {
        self.max_per_orphan = max_per_orphan;
        self
    }

    /// Authority a new link from `source` is expected to pass on:
    /// source score times the new link's share of the source's outgoing weight.
    pub fn expected_gain(&self, scores: &PageRankScores, source: NodeId) -> f64 {
        let weight = self.weights.weight_for(&self.location);
        let total_after = scores.total_outgoing_weight(source) + weight;
        if total_after <= 0.0 {
            return 0.0;
        }
        scores.score(source) * weight / total_after
    }

    pub fn generate(
        &self,
        graph: &Graph,
        scores: &PageRankScores,
        orphans: &[Orphan],
    ) -> Vec<Recommendation> {
        let median = scores.median();
        let sources: Vec<NodeId> = scores
            .ranked()
            .into_iter()
            .take_while(|&id| at_or_above(scores.score(id), median))
            .collect();

        let mut recommendations = Vec::new();
        for orphan in orphans {
            let target = orphan.node;
            let anchor = suggested_anchor(graph.page(target));

            let mut candidates: Vec<Recommendation> = sources
                .iter()
                .copied()
                .filter(|&source| source != target && !graph.has_edge(source, target))
                .map(|source| Recommendation {
                    source,
                    target,
                    source_url: graph.url(source).to_string(),
                    target_url: orphan.url.clone(),
                    suggested_anchor: anchor.clone(),
                    location: self.location.clone(),
                    expected_gain: self.expected_gain(scores, source),
                    source_score: scores.score(source),
                    target_score: orphan.score,
                })
                .collect();

            candidates.sort_by(rank_order);
            if self.max_per_orphan > 0 {
                candidates.truncate(self.max_per_orphan);
            }
            recommendations.extend(candidates);
        }

        recommendations.sort_by(|a, b| rank_order(a, b).then_with(|| a.target_url.cmp(&b.target_url)));
        info!(
            "Generated {} link recommendations for {} orphans",
            recommendations.len(),
            orphans.len()
        );
        recommendations
    }
}

/// Gain descending, then source score descending, then source URL ascending.
fn rank_order(a: &Recommendation, b: &Recommendation) -> Ordering {
    b.expected_gain
        .partial_cmp(&a.expected_gain)
        .unwrap_or(Ordering::Equal)
        .then_with(|| {
            b.source_score
                .partial_cmp(&a.source_score)
                .unwrap_or(Ordering::Equal)
        })
        .then_with(|| a.source_url.cmp(&b.source_url))
}

/// H1, then title, then words from the last path segment.
pub fn suggested_anchor(page: &Page) -> String {
    if let Some(ref h1) = page.h1 {
        return h1.clone();
    }
    if let Some(ref title) = page.title {
        return title.clone();
    }
    anchor_from_url(&page.url)
}

fn anchor_from_url(url: &str) -> String {
    let segment = Url::parse(url)
        .ok()
        .and_then(|u| {
            u.path_segments()
                .and_then(|mut segments| segments.rfind(|s| !s.is_empty()).map(str::to_string))
                .or_else(|| u.host_str().map(str::to_string))
        })
        .unwrap_or_else(|| url.rsplit('/').find(|s| !s.is_empty()).unwrap_or(url).to_string());

    let stem = segment
        .rsplit_once('.')
        .filter(|(_, ext)| matches!(*ext, "html" | "htm" | "php" | "aspx"))
        .map(|(stem, _)| stem)
        .unwrap_or(&segment);

    stem.split(['-', '_'])
        .filter(|w| !w.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}
