// One analysis run: Build -> Score -> Diagnose -> Recommend -> Done.

use crate::config::AnalysisConfig;
use crate::diagnostics::{AuthorityLeak, BrokenLink, DiagnosticsEngine, Orphan};
use crate::error::Result;
use crate::graph::{BuildSummary, Graph, GraphBuilder};
use crate::model::{LinkRecord, PageRecord};
use crate::pagerank::{PageRankEngine, PageRankScores};
use crate::recommend::{Recommendation, RecommendationGenerator};
use serde::Serialize;
use std::fmt;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Build,
    Score,
    Diagnose,
    Recommend,
    Done,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Build => "build",
            Stage::Score => "score",
            Stage::Diagnose => "diagnose",
            Stage::Recommend => "recommend",
            Stage::Done => "done",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A non-fatal condition recorded during a stage.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Warning {
    pub stage: Stage,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedNode {
    pub url: String,
    pub score: f64,
    pub inbound_count: usize,
    pub outbound_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunMetadata {
    pub nodes_kept: usize,
    pub edges_kept: usize,
    pub edges_dropped: usize,
    pub converged: bool,
    pub iterations_run: usize,
    pub final_delta: f64,
    pub median_score: f64,
    pub build: BuildSummary,
    pub warnings: Vec<Warning>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisResult {
    pub metadata: RunMetadata,
    pub ranked_nodes: Vec<RankedNode>,
    pub orphans: Vec<Orphan>,
    pub leaks: Vec<AuthorityLeak>,
    pub broken_links: Vec<BrokenLink>,
    pub recommendations: Vec<Recommendation>,
}

/// No page survived filtering.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmptyGraph {
    pub build: BuildSummary,
    pub warnings: Vec<Warning>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Analysis {
    Empty(EmptyGraph),
    Complete(Box<AnalysisResult>),
}

impl Analysis {
    pub fn is_empty(&self) -> bool {
        matches!(self, Analysis::Empty(_))
    }

    pub fn result(&self) -> Option<&AnalysisResult> {
        match self {
            Analysis::Complete(result) => Some(result),
            Analysis::Empty(_) => None,
        }
    }

    pub fn build_summary(&self) -> &BuildSummary {
        match self {
            Analysis::Complete(result) => &result.metadata.build,
            Analysis::Empty(empty) => &empty.build,
        }
    }
}

pub struct Analyzer {
    config: AnalysisConfig,
    builder: GraphBuilder,
}

impl Analyzer {
    /// Validates the configuration up front; nothing is built with a bad one.
    pub fn new(config: AnalysisConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            builder: GraphBuilder::new(),
        })
    }

    pub fn with_sitemap<I, S>(mut self, urls: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.builder = self.builder.with_sitemap(urls);
        self
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    pub fn run(&self, pages: &[PageRecord], links: &[LinkRecord]) -> Result<Analysis> {
        let mut warnings = Vec::new();

        info!("Stage {}: {} page records, {} link records", Stage::Build, pages.len(), links.len());
        let (graph, build) = self.builder.build(pages, links);
        if !build.invalid_records.is_empty() {
            warnings.push(Warning {
                stage: Stage::Build,
                message: format!(
                    "{} records skipped for missing required fields",
                    build.invalid_records.len()
                ),
            });
        }

        if graph.is_empty() {
            info!("No analyzable pages after filtering");
            return Ok(Analysis::Empty(EmptyGraph { build, warnings }));
        }

        info!("Stage {}: {} nodes, {} edges", Stage::Score, graph.node_count(), graph.edge_count());
        let scores = PageRankEngine::from_config(&self.config).score(&graph)?;
        if !scores.converged() {
            warnings.push(Warning {
                stage: Stage::Score,
                message: format!(
                    "PageRank did not converge within {} iterations (last delta {:.3e})",
                    scores.iterations(),
                    scores.final_delta()
                ),
            });
        }

        info!("Stage {}", Stage::Diagnose);
        let diagnostics = DiagnosticsEngine::from_config(&self.config).diagnose(&graph, &scores);

        info!("Stage {}", Stage::Recommend);
        let recommendations = RecommendationGenerator::from_config(&self.config).generate(
            &graph,
            &scores,
            &diagnostics.orphans,
        );

        info!("Stage {}", Stage::Done);
        let metadata = RunMetadata {
            nodes_kept: build.nodes_kept,
            edges_kept: build.edges_kept,
            edges_dropped: build.edges_dropped.total(),
            converged: scores.converged(),
            iterations_run: scores.iterations(),
            final_delta: scores.final_delta(),
            median_score: diagnostics.median_score,
            build,
            warnings,
        };

        Ok(Analysis::Complete(Box::new(AnalysisResult {
            metadata,
            ranked_nodes: ranked_nodes(&graph, &scores),
            orphans: diagnostics.orphans,
            leaks: diagnostics.leaks,
            broken_links: diagnostics.broken_links,
            recommendations,
        })))
    }
}

/// Every node by descending score.
pub fn ranked_nodes(graph: &Graph, scores: &PageRankScores) -> Vec<RankedNode> {
    scores
        .ranked()
        .into_iter()
        .map(|id| RankedNode {
            url: graph.url(id).to_string(),
            score: scores.score(id),
            inbound_count: graph.in_degree(id),
            outbound_count: graph.out_degree(id),
        })
        .collect()
}

/// Convenience wrapper: validate, build and run in one call.
pub fn analyze(
    config: AnalysisConfig,
    pages: &[PageRecord],
    links: &[LinkRecord],
) -> Result<Analysis> {
    Analyzer::new(config)?.run(pages, links)
}
