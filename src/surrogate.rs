//! Surrogate splits
//!
//! When the winning split's column is missing for some rows of a node, the
//! finder searches the remaining candidate columns for splits whose own
//! partition best reproduces the winner's partition, so those rows can still
//! be routed left or right. Rows missed by every surrogate fall back to the
//! majority-weight child.
use crate::membership::RowSubsetView;
use crate::split::{ChildCondition, ColumnPredicate, SplitCandidate, SplitRule};
use crate::utils::cmp_score_descending;
use fixedbitset::FixedBitSet;
use log::debug;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// One surrogate column together with how well its rule reproduces the
/// primary partition, as the weighted fraction of comparable rows routed to
/// the same side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedSurrogate {
    pub column: usize,
    pub rule: SplitRule,
    pub agreement: f64,
}

/// Result of surrogate recovery for one node: the ranked surrogate columns,
/// the left/right routing predicates for the caller's model, and the
/// complete child markers over the node's local rows, with rows missing the
/// primary column filled in from the surrogates and finally the default
/// direction.
#[derive(Debug, Clone)]
pub struct SurrogateSplit {
    /// Surrogates in descending order of agreement. May be empty; the
    /// routing predicates then consist of the primary rule and the default
    /// direction only.
    pub ranked: Vec<RankedSurrogate>,
    /// Routing predicate of the left child.
    pub left: ChildCondition,
    /// Routing predicate of the right child.
    pub right: ChildCondition,
    /// Local rows routed to the left child, missing rows already filled in.
    pub left_rows: FixedBitSet,
    /// Local rows routed to the right child, missing rows already filled in.
    pub right_rows: FixedBitSet,
}

struct ScoredCandidate {
    column: usize,
    rule: SplitRule,
    agreement: f64,
    left: FixedBitSet,
    right: FixedBitSet,
}

/// Recovers surrogate splits that approximate a primary split's partition
/// for rows where the primary column is missing.
pub struct SurrogateFinder;

impl SurrogateFinder {
    /// Find surrogates for `primary` among `candidates`, ranked by how well
    /// each candidate's own rule reproduces the primary partition over the
    /// rows of `memberships`.
    ///
    /// Candidates on the primary's column are skipped. A candidate is
    /// retained only if it shares at least one comparable row with the
    /// primary (both columns present) and agrees on a positive amount of
    /// row weight; ties in agreement preserve the externally supplied
    /// candidate order.
    pub fn find(
        primary: &SplitCandidate,
        candidates: &[SplitCandidate],
        memberships: &RowSubsetView,
    ) -> SurrogateSplit {
        let (mut left_rows, mut right_rows) = primary.partition(memberships);
        let majority_goes_left = Self::majority_goes_left(&left_rows, &right_rows, memberships);

        let mut scored: Vec<ScoredCandidate> = candidates
            .par_iter()
            .map(|candidate| Self::score_candidate(primary, candidate, &left_rows, &right_rows, memberships))
            .collect::<Vec<Option<ScoredCandidate>>>()
            .into_iter()
            .flatten()
            .collect();
        // stable by construction: equal scores keep candidate order
        scored.sort_by(|a, b| cmp_score_descending(a.agreement, b.agreement));

        debug!(
            "surrogates for column {}: retained {} of {} candidates",
            primary.column,
            scored.len(),
            candidates.len()
        );

        if primary.has_missing() {
            Self::fill_missing_child_markers(
                primary,
                &mut left_rows,
                &mut right_rows,
                &scored,
                majority_goes_left,
            );
        }

        let (left, right) = Self::build_conditions(primary, &scored, majority_goes_left);
        let ranked = scored
            .into_iter()
            .map(|s| RankedSurrogate {
                column: s.column,
                rule: s.rule,
                agreement: s.agreement,
            })
            .collect();

        SurrogateSplit {
            ranked,
            left,
            right,
            left_rows,
            right_rows,
        }
    }

    /// Build a surrogate split that carries only the primary rule and the
    /// default (majority) direction, skipping the surrogate search. Rows
    /// missing the primary column are all routed to the majority-weight
    /// child.
    pub fn with_default_direction(primary: &SplitCandidate, memberships: &RowSubsetView) -> SurrogateSplit {
        let (mut left_rows, mut right_rows) = primary.partition(memberships);
        let majority_goes_left = Self::majority_goes_left(&left_rows, &right_rows, memberships);

        if primary.has_missing() {
            Self::fill_missing_child_markers(primary, &mut left_rows, &mut right_rows, &[], majority_goes_left);
        }

        let (left, right) = Self::build_conditions(primary, &[], majority_goes_left);
        SurrogateSplit {
            ranked: Vec::new(),
            left,
            right,
            left_rows,
            right_rows,
        }
    }

    /// Weighted agreement of one candidate with the primary partition, over
    /// the rows where both columns are present. Returns None for candidates
    /// on the primary's column, with no comparable rows, or with no
    /// agreeing weight at all.
    fn score_candidate(
        primary: &SplitCandidate,
        candidate: &SplitCandidate,
        primary_left: &FixedBitSet,
        primary_right: &FixedBitSet,
        memberships: &RowSubsetView,
    ) -> Option<ScoredCandidate> {
        if candidate.column == primary.column {
            return None;
        }
        let (left, right) = candidate.partition(memberships);

        let mut agreeing = 0.0;
        let mut comparable = 0.0;
        for i in 0..memberships.row_count() {
            let primary_goes_left = if primary_left.contains(i) {
                true
            } else if primary_right.contains(i) {
                false
            } else {
                continue;
            };
            let candidate_goes_left = if left.contains(i) {
                true
            } else if right.contains(i) {
                false
            } else {
                continue;
            };
            let weight = memberships.weight(i);
            comparable += weight;
            if primary_goes_left == candidate_goes_left {
                agreeing += weight;
            }
        }

        if comparable <= 0.0 || agreeing <= 0.0 {
            return None;
        }
        Some(ScoredCandidate {
            column: candidate.column,
            rule: candidate.rule.clone(),
            agreement: agreeing / comparable,
            left,
            right,
        })
    }

    fn majority_goes_left(left: &FixedBitSet, right: &FixedBitSet, memberships: &RowSubsetView) -> bool {
        let left_weight: f64 = left.ones().map(|i| memberships.weight(i)).sum();
        let right_weight: f64 = right.ones().map(|i| memberships.weight(i)).sum();
        left_weight >= right_weight
    }

    /// Fill the child markers for rows missing the primary column: the first
    /// surrogate (in rank order) that covers the row decides; rows missed by
    /// every surrogate go to the majority child.
    fn fill_missing_child_markers(
        primary: &SplitCandidate,
        left_rows: &mut FixedBitSet,
        right_rows: &mut FixedBitSet,
        surrogates: &[ScoredCandidate],
        majority_goes_left: bool,
    ) {
        for i in 0..left_rows.len() {
            if !primary.is_row_missing(i) {
                continue;
            }
            let mut filled = false;
            for surrogate in surrogates {
                if surrogate.left.contains(i) {
                    left_rows.insert(i);
                    filled = true;
                    break;
                } else if surrogate.right.contains(i) {
                    right_rows.insert(i);
                    filled = true;
                    break;
                }
            }
            if filled {
                continue;
            }
            if majority_goes_left {
                left_rows.insert(i);
            } else {
                right_rows.insert(i);
            }
        }
    }

    fn build_conditions(
        primary: &SplitCandidate,
        surrogates: &[ScoredCandidate],
        majority_goes_left: bool,
    ) -> (ChildCondition, ChildCondition) {
        let mut left_chain = Vec::with_capacity(surrogates.len() + 1);
        let mut right_chain = Vec::with_capacity(surrogates.len() + 1);
        left_chain.push(ColumnPredicate {
            column: primary.column,
            rule: primary.rule.clone(),
            accept_when_left: true,
        });
        right_chain.push(ColumnPredicate {
            column: primary.column,
            rule: primary.rule.clone(),
            accept_when_left: false,
        });
        for surrogate in surrogates {
            left_chain.push(ColumnPredicate {
                column: surrogate.column,
                rule: surrogate.rule.clone(),
                accept_when_left: true,
            });
            right_chain.push(ColumnPredicate {
                column: surrogate.column,
                rule: surrogate.rule.clone(),
                accept_when_left: false,
            });
        }
        (
            ChildCondition {
                conditions: left_chain,
                default_accept: majority_goes_left,
            },
            ChildCondition {
                conditions: right_chain,
                default_accept: !majority_goes_left,
            },
        )
    }
}
