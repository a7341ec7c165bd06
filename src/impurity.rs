//! Impurity measures
//!
//! Scoring strategies for candidate splits over weighted class counts.
//! Both variants share the same weighted-entropy partition score; they
//! differ in how the final gain is normalized. The measures are stateless
//! value singletons and safe to share across concurrent node evaluations.
use crate::errors::TreeSplitError;
use crate::utils::items_to_strings;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Split scoring strategy, chosen once per learner run.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
pub enum ImpurityMeasure {
    /// Plain information gain: prior impurity minus post-split impurity.
    Gain,
    /// Information gain divided by the split information of the partition
    /// weights, penalizing splits that fragment rows into many small
    /// partitions.
    GainRatio,
}

impl FromStr for ImpurityMeasure {
    type Err = TreeSplitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Gain" => Ok(ImpurityMeasure::Gain),
            "GainRatio" => Ok(ImpurityMeasure::GainRatio),
            _ => Err(TreeSplitError::ParseString(
                s.to_string(),
                "ImpurityMeasure".to_string(),
                items_to_strings(vec!["Gain", "GainRatio"]),
            )),
        }
    }
}

impl ImpurityMeasure {
    /// Weighted entropy of the class distribution within one partition, in
    /// log2 units: `-sum(p * log2(p))` over the class proportions
    /// `p = count / partition_weight`.
    ///
    /// A zero-weight or pure partition scores 0.0; a two-class 50/50
    /// partition scores 1.0.
    pub fn partition_impurity(&self, class_counts: &[f64], partition_weight: f64) -> f64 {
        if partition_weight <= 0.0 {
            return 0.0;
        }
        let mut entropy = 0.0;
        for count in class_counts {
            if *count > 0.0 {
                let p = count / partition_weight;
                entropy -= p * p.log2();
            }
        }
        entropy
    }

    /// Average of per-partition impurity scores, each weighted by the
    /// partition's share of `total_weight`.
    pub fn post_split_impurity(
        &self,
        partition_scores: &[f64],
        partition_weights: &[f64],
        total_weight: f64,
    ) -> f64 {
        if total_weight <= 0.0 {
            return 0.0;
        }
        partition_scores
            .iter()
            .zip(partition_weights.iter())
            .map(|(score, weight)| (weight / total_weight) * score)
            .sum()
    }

    /// Gain achieved by the split.
    ///
    /// For [`ImpurityMeasure::Gain`] this is the raw impurity reduction.
    /// For [`ImpurityMeasure::GainRatio`] the raw gain is divided by the
    /// split information of `partition_weights`; a degenerate
    /// single-partition split has zero split information, in which case the
    /// raw gain is returned unnormalized.
    pub fn gain(
        &self,
        prior_impurity: f64,
        post_split_impurity: f64,
        partition_weights: &[f64],
        total_weight: f64,
    ) -> f64 {
        let raw = prior_impurity - post_split_impurity;
        match self {
            ImpurityMeasure::Gain => raw,
            ImpurityMeasure::GainRatio => {
                let split_info = split_information(partition_weights, total_weight);
                if split_info == 0.0 {
                    raw
                } else {
                    raw / split_info
                }
            }
        }
    }
}

/// Split information of a partition of `total_weight` into the given
/// partition weights: `-sum((w / total) * log2(w / total))`.
pub fn split_information(partition_weights: &[f64], total_weight: f64) -> f64 {
    if total_weight <= 0.0 {
        return 0.0;
    }
    let mut info = 0.0;
    for weight in partition_weights {
        if *weight > 0.0 {
            let p = weight / total_weight;
            info -= p * p.log2();
        }
    }
    info
}

/// Weighted class counts accumulated while scanning one partition.
#[derive(Debug, Clone)]
pub struct WeightedClassCounts {
    counts: Vec<f64>,
    total_weight: f64,
}

impl WeightedClassCounts {
    /// Create a zeroed count vector for `n_classes` target classes.
    /// At least one class is required.
    pub fn new(n_classes: usize) -> Result<Self, TreeSplitError> {
        if n_classes == 0 {
            return Err(TreeSplitError::EmptyClassCounts);
        }
        Ok(WeightedClassCounts {
            counts: vec![0.0; n_classes],
            total_weight: 0.0,
        })
    }

    /// Add `weight` to the count of `class`.
    pub fn add(&mut self, class: usize, weight: f64) {
        self.counts[class] += weight;
        self.total_weight += weight;
    }

    pub fn counts(&self) -> &[f64] {
        &self.counts
    }

    pub fn total_weight(&self) -> f64 {
        self.total_weight
    }

    pub fn n_classes(&self) -> usize {
        self.counts.len()
    }

    /// Reset all counts to zero for reuse on the next partition.
    pub fn clear(&mut self) {
        self.counts.iter_mut().for_each(|c| *c = 0.0);
        self.total_weight = 0.0;
    }

    /// Impurity of this partition under the given measure.
    pub fn impurity(&self, measure: ImpurityMeasure) -> f64 {
        measure.partition_impurity(&self.counts, self.total_weight)
    }
}
