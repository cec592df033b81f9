pub mod config;
pub mod diagnostics;
pub mod error;
pub mod graph;
pub mod model;
pub mod pagerank;
pub mod pipeline;
pub mod recommend;
pub mod report;

pub use config::{AnalysisConfig, WeightTable};
pub use diagnostics::{Diagnostics, DiagnosticsEngine};
pub use error::{InputValidationError, LinkRankError, Result};
pub use graph::{BuildSummary, Graph, GraphBuilder, NodeId};
pub use model::{LinkLocation, LinkRecord, PageRecord, normalize_url};
pub use pagerank::{PageRankEngine, PageRankScores};
pub use pipeline::{Analysis, AnalysisResult, Analyzer, analyze};
pub use recommend::{Recommendation, RecommendationGenerator};
