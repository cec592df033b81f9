// Analysis configuration. No file format lives here: callers deserialize
// these structs from whatever source they own.

use crate::error::{LinkRankError, Result};
use crate::model::LinkLocation;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

/// Location name to PageRank weight multiplier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeightTable {
    /// Used for locations missing from `weights`.
    pub default_weight: f64,
    #[serde(deserialize_with = "layered_over_defaults")]
    pub weights: BTreeMap<String, f64>,
}

impl Default for WeightTable {
    fn default() -> Self {
        let weights = [
            ("navigation", 0.5),
            ("header", 0.5),
            ("body", 1.0),
            ("footer", 0.3),
            ("sidebar", 0.5),
        ]
        .into_iter()
        .map(|(name, weight)| (name.to_string(), weight))
        .collect();

        Self {
            default_weight: 1.0,
            weights,
        }
    }
}

impl WeightTable {
    pub fn weight_for(&self, location: &LinkLocation) -> f64 {
        self.weights
            .get(location.as_str())
            .copied()
            .unwrap_or(self.default_weight)
    }

    /// Set the multiplier for a location, folding aliases onto their canonical name.
    pub fn set(&mut self, location: &str, weight: f64) {
        let canonical = LinkLocation::parse(location);
        self.weights.insert(canonical.as_str().to_string(), weight);
    }

    pub fn validate(&self) -> Result<()> {
        for (location, &weight) in &self.weights {
            if !weight.is_finite() || weight < 0.0 {
                return Err(LinkRankError::InvalidWeight {
                    location: location.clone(),
                    weight,
                });
            }
        }
        if !self.default_weight.is_finite() || self.default_weight < 0.0 {
            return Err(LinkRankError::InvalidWeight {
                location: "default".to_string(),
                weight: self.default_weight,
            });
        }
        Ok(())
    }
}

/// Entries read from a config file replace matching defaults; the other
/// default locations stay in the table.
fn layered_over_defaults<'de, D>(deserializer: D) -> std::result::Result<BTreeMap<String, f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let entries = BTreeMap::<String, f64>::deserialize(deserializer)?;
    let mut table = WeightTable::default();
    for (location, weight) in entries {
        table.set(&location, weight);
    }
    Ok(table.weights)
}

/// Everything a single analysis run is parameterised by.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub damping: f64,
    pub epsilon: f64,
    pub max_iterations: usize,
    pub min_inlinks: usize,
    /// Fraction of nodes (by score) considered "top" for leak detection.
    pub pagerank_threshold: f64,
    /// Worker threads for the scoring pass. 0 lets rayon pick.
    pub workers: usize,
    pub recommendation_location: LinkLocation,
    pub max_recommendations_per_orphan: usize,
    pub weights: WeightTable,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            damping: 0.85,
            epsilon: 1e-6,
            max_iterations: 100,
            min_inlinks: 2,
            pagerank_threshold: 0.10,
            workers: 0,
            recommendation_location: LinkLocation::Body,
            max_recommendations_per_orphan: 5,
            weights: WeightTable::default(),
        }
    }
}

impl AnalysisConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.damping > 0.0 && self.damping < 1.0) {
            return Err(LinkRankError::InvalidDamping(self.damping));
        }
        if !(self.epsilon.is_finite() && self.epsilon > 0.0) {
            return Err(LinkRankError::InvalidEpsilon(self.epsilon));
        }
        if self.max_iterations == 0 {
            return Err(LinkRankError::InvalidMaxIterations);
        }
        if !(self.pagerank_threshold > 0.0 && self.pagerank_threshold <= 1.0) {
            return Err(LinkRankError::InvalidThreshold(self.pagerank_threshold));
        }
        self.weights.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(AnalysisConfig::default().validate().is_ok());
    }

    #[test]
    fn test_nan_damping_rejected() {
        let config = AnalysisConfig {
            damping: f64::NAN,
            ..AnalysisConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(LinkRankError::InvalidDamping(_))
        ));
    }

    #[test]
    fn test_set_folds_aliases() {
        let mut table = WeightTable::default();
        table.set("Main_Content", 1.5);
        assert_eq!(table.weight_for(&LinkLocation::Body), 1.5);
    }
}
