// Location-weighted PageRank.
//
// Each pass reads the previous vector and writes a fresh one; the two are
// swapped only after the whole pass is done. Every node's new score depends
// on nothing but the frozen previous vector, so the pass runs on rayon with
// no shared mutable state, and the result is the same for any worker count.

use crate::config::{AnalysisConfig, WeightTable};
use crate::error::{LinkRankError, Result};
use crate::graph::{Graph, NodeId};
use rayon::prelude::*;
use serde::Serialize;
use std::cmp::Ordering;
use tracing::{debug, info, warn};

/// Nodes per rayon task. Below this the split overhead dominates.
const MIN_NODES_PER_TASK: usize = 512;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageRankScores {
    scores: Vec<f64>,
    out_weight: Vec<f64>,
    iterations: usize,
    converged: bool,
    final_delta: f64,
}

impl PageRankScores {
    pub fn score(&self, id: NodeId) -> f64 {
        self.scores[id.index()]
    }

    pub fn scores(&self) -> &[f64] {
        &self.scores
    }

    /// Sum of location multipliers over a node's outgoing edges.
    pub fn total_outgoing_weight(&self, id: NodeId) -> f64 {
        self.out_weight[id.index()]
    }

    pub fn iterations(&self) -> usize {
        self.iterations
    }

    pub fn converged(&self) -> bool {
        self.converged
    }

    /// L1 distance between the last two vectors.
    pub fn final_delta(&self) -> f64 {
        self.final_delta
    }

    pub fn total(&self) -> f64 {
        self.scores.iter().sum()
    }

    pub fn median(&self) -> f64 {
        median(&self.scores)
    }

    /// Node ids by descending score. Ties keep URL order.
    pub fn ranked(&self) -> Vec<NodeId> {
        let mut ids: Vec<usize> = (0..self.scores.len()).collect();
        ids.sort_by(|&a, &b| {
            self.scores[b]
                .partial_cmp(&self.scores[a])
                .unwrap_or(Ordering::Equal)
                .then(a.cmp(&b))
        });
        ids.into_iter().map(NodeId::from_index).collect()
    }
}

pub struct PageRankEngine {
    damping: f64,
    epsilon: f64,
    max_iterations: usize,
    weights: WeightTable,
    workers: usize,
}

impl Default for PageRankEngine {
    fn default() -> Self {
        Self::from_config(&AnalysisConfig::default())
    }
}

impl PageRankEngine {
    pub fn from_config(config: &AnalysisConfig) -> Self {
        Self {
            damping: config.damping,
            epsilon: config.epsilon,
            max_iterations: config.max_iterations,
            weights: config.weights.clone(),
            workers: config.workers,
        }
    }

    pub fn with_damping(mut self, damping: f64) -> Self {
        self.damping = damping;
        self
    }

    pub fn with_epsilon(mut self, epsilon: f64) -> Self {
        self.epsilon = epsilon;
        self
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub fn with_weights(mut self, weights: WeightTable) -> Self {
        self.weights = weights;
        self
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    fn validate(&self) -> Result<()> {
        if !(self.damping > 0.0 && self.damping < 1.0) {
            return Err(LinkRankError::InvalidDamping(self.damping));
        }
        if !(self.epsilon.is_finite() && self.epsilon > 0.0) {
            return Err(LinkRankError::InvalidEpsilon(self.epsilon));
        }
        if self.max_iterations == 0 {
            return Err(LinkRankError::InvalidMaxIterations);
        }
        self.weights.validate()
    }

    pub fn score(&self, graph: &Graph) -> Result<PageRankScores> {
        self.validate()?;

        let n = graph.node_count();
        if n == 0 {
            return Ok(PageRankScores {
                scores: Vec::new(),
                out_weight: Vec::new(),
                iterations: 0,
                converged: true,
                final_delta: 0.0,
            });
        }

        let pool = match self.workers {
            0 | 1 => None,
            workers => Some(
                rayon::ThreadPoolBuilder::new()
                    .num_threads(workers)
                    .build()?,
            ),
        };
        let parallel = self.workers != 1;

        let out_weight: Vec<f64> = graph
            .node_ids()
            .map(|id| {
                graph
                    .outgoing(id)
                    .map(|e| self.weights.weight_for(&e.location))
                    .sum()
            })
            .collect();

        // Nodes whose outgoing weight is zero spread their score over everyone.
        let dangling: Vec<usize> = (0..n).filter(|&u| out_weight[u] <= 0.0).collect();

        // inbound[v] = (u, share of u's score that flows along u -> v), one entry per edge.
        let inbound: Vec<Vec<(usize, f64)>> = graph
            .node_ids()
            .map(|v| {
                graph
                    .incoming(v)
                    .filter(|e| out_weight[e.source.index()] > 0.0)
                    .map(|e| {
                        let u = e.source.index();
                        (u, self.weights.weight_for(&e.location) / out_weight[u])
                    })
                    .collect()
            })
            .collect();

        let nodes = n as f64;
        let d = self.damping;
        let mut current = vec![1.0 / nodes; n];
        let mut next = vec![0.0; n];
        let mut iterations = 0;
        let mut converged = false;
        let mut delta = f64::INFINITY;

        while iterations < self.max_iterations {
            iterations += 1;

            let dangling_mass: f64 = dangling.iter().map(|&u| current[u]).sum();
            let base = (1.0 - d) / nodes + d * dangling_mass / nodes;

            match pool {
                Some(ref pool) => {
                    pool.install(|| update_pass(&mut next, &current, &inbound, base, d, parallel))
                }
                None => update_pass(&mut next, &current, &inbound, base, d, parallel),
            }

            delta = current
                .iter()
                .zip(&next)
                .map(|(old, new)| (old - new).abs())
                .sum();
            std::mem::swap(&mut current, &mut next);
            debug!("PageRank iteration {}: L1 delta {:.3e}", iterations, delta);

            if delta < self.epsilon {
                converged = true;
                break;
            }
        }

        if converged {
            info!("PageRank converged after {} iterations", iterations);
        } else {
            warn!(
                "PageRank did not converge within {} iterations (last delta {:.3e})",
                iterations, delta
            );
        }

        Ok(PageRankScores {
            scores: current,
            out_weight,
            iterations,
            converged,
            final_delta: delta,
        })
    }
}

fn update_pass(
    next: &mut [f64],
    current: &[f64],
    inbound: &[Vec<(usize, f64)>],
    base: f64,
    damping: f64,
    parallel: bool,
) {
    let update = |(v, slot): (usize, &mut f64)| {
        let inflow: f64 = inbound[v].iter().map(|&(u, share)| share * current[u]).sum();
        *slot = base + damping * inflow;
    };

    if parallel {
        next.par_iter_mut()
            .with_min_len(MIN_NODES_PER_TASK)
            .enumerate()
            .for_each(update);
    } else {
        next.iter_mut().enumerate().for_each(update);
    }
}

/// Scores closer than this compare as equal.
pub const SCORE_TOLERANCE: f64 = 1e-12;

/// `score >= reference`, treating differences below [`SCORE_TOLERANCE`] as ties.
pub fn at_or_above(score: f64, reference: f64) -> bool {
    score >= reference - SCORE_TOLERANCE
}

/// Median of a score vector; the mean of the middle pair for even lengths.
pub fn median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}
