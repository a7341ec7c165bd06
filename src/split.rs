//! Split candidates
//!
//! Immutable descriptions of proposed splits and the routing predicates
//! derived from them. Candidate generation itself (threshold search,
//! nominal-partition search) happens in the caller; this module only holds
//! the result and evaluates it against row memberships.
use crate::membership::RowSubsetView;
use crate::utils::is_missing;
use fixedbitset::FixedBitSet;
use hashbrown::HashSet;
use serde::{Deserialize, Serialize};

/// Partitioning rule of a binary split on one column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SplitRule {
    /// Numeric rule: values strictly below the threshold go left.
    Numeric { threshold: f64 },
    /// Nominal rule: categories in the set go left, all others right.
    Nominal { left_categories: HashSet<usize> },
}

impl SplitRule {
    /// Whether a non-missing value is routed to the left child.
    pub fn goes_left(&self, value: f64) -> bool {
        match self {
            SplitRule::Numeric { threshold } => value < *threshold,
            SplitRule::Nominal { left_categories } => left_categories.contains(&(value as usize)),
        }
    }
}

/// An immutable description of one proposed split: the column it was derived
/// from, its partitioning rule, its computed gain, and a bitmap of the
/// node's rows for which the column value is missing.
///
/// `missing` is `None` when the column has no missing rows in this node,
/// so the common all-present case never allocates a bitmap and skips all
/// mask checks.
#[derive(Debug)]
pub struct SplitCandidate<'a> {
    /// Index of the column this candidate splits on.
    pub column: usize,
    /// Borrow of the column's backing values, indexed by global row id.
    pub column_data: &'a [f64],
    /// The partitioning rule.
    pub rule: SplitRule,
    /// Gain computed for this candidate by the scoring step.
    pub gain: f64,
    missing: Option<FixedBitSet>,
}

impl<'a> SplitCandidate<'a> {
    pub fn new(
        column: usize,
        column_data: &'a [f64],
        rule: SplitRule,
        gain: f64,
        missing: Option<FixedBitSet>,
    ) -> Self {
        SplitCandidate {
            column,
            column_data,
            rule,
            gain,
            missing,
        }
    }

    /// Build the missing-row bitmap of `column_data` over the rows of
    /// `view`, using `missing` as the missing-value marker. Returns `None`
    /// when no row is missing.
    pub fn missing_mask(column_data: &[f64], view: &RowSubsetView, missing: f64) -> Option<FixedBitSet> {
        let mut mask: Option<FixedBitSet> = None;
        if view.is_empty() {
            return mask;
        }
        let mut cursor = view.cursor(column_data);
        loop {
            if is_missing(&cursor.current_value(), &missing) {
                mask.get_or_insert_with(|| FixedBitSet::with_capacity(view.row_count()))
                    .insert(cursor.current_local_index());
            }
            if !cursor.advance() {
                break;
            }
        }
        mask
    }

    /// Whether any row of the node is missing this candidate's column value.
    pub fn has_missing(&self) -> bool {
        self.missing.is_some()
    }

    /// Whether the row at local position `i` of the node's view is missing
    /// this candidate's column value.
    pub fn is_row_missing(&self, i: usize) -> bool {
        match &self.missing {
            Some(mask) => mask.contains(i),
            None => false,
        }
    }

    /// Partition the non-missing rows of `view` into left and right child
    /// markers according to this candidate's rule. Missing rows are set in
    /// neither bitmap.
    pub fn partition(&self, view: &RowSubsetView) -> (FixedBitSet, FixedBitSet) {
        let mut left = FixedBitSet::with_capacity(view.row_count());
        let mut right = FixedBitSet::with_capacity(view.row_count());
        if view.is_empty() {
            return (left, right);
        }
        let mut cursor = view.cursor(self.column_data);
        loop {
            let i = cursor.current_local_index();
            if !self.is_row_missing(i) {
                if self.rule.goes_left(cursor.current_value()) {
                    left.insert(i);
                } else {
                    right.insert(i);
                }
            }
            if !cursor.advance() {
                break;
            }
        }
        (left, right)
    }
}

/// One link in a routing chain: the rule of a primary or surrogate column
/// together with the side of that rule that routes into the owning child.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnPredicate {
    pub column: usize,
    pub rule: SplitRule,
    /// Accept the row when the rule sends it left (true) or right (false).
    pub accept_when_left: bool,
}

impl ColumnPredicate {
    /// Whether a non-missing value of this predicate's column routes the row
    /// into the owning child.
    pub fn accepts(&self, value: f64) -> bool {
        self.rule.goes_left(value) == self.accept_when_left
    }
}

/// Routing predicate of one child: the primary rule first, then surrogates
/// in rank order, then the majority-side default.
///
/// This is the only split-evaluation artifact the caller persists into the
/// serialized model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChildCondition {
    /// Ordered predicate chain; the first entry is the primary split.
    pub conditions: Vec<ColumnPredicate>,
    /// Take this child when every chained column is missing for the row.
    pub default_accept: bool,
}

impl ChildCondition {
    /// Route one row: the first chained predicate whose column value is
    /// present decides; rows missing every column fall back to the default.
    ///
    /// `value_for` returns `None` for columns whose value is missing.
    pub fn accepts<F>(&self, value_for: F) -> bool
    where
        F: Fn(usize) -> Option<f64>,
    {
        for condition in &self.conditions {
            if let Some(value) = value_for(condition.column) {
                return condition.accepts(value);
            }
        }
        self.default_accept
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nominal_rule(left: &[usize]) -> SplitRule {
        SplitRule::Nominal {
            left_categories: left.iter().copied().collect(),
        }
    }

    #[test]
    fn test_numeric_rule() {
        let rule = SplitRule::Numeric { threshold: 3.0 };
        assert!(rule.goes_left(2.9));
        assert!(!rule.goes_left(3.0));
        assert!(!rule.goes_left(4.0));
    }

    #[test]
    fn test_nominal_rule() {
        let rule = nominal_rule(&[0, 2]);
        assert!(rule.goes_left(0.0));
        assert!(!rule.goes_left(1.0));
        assert!(rule.goes_left(2.0));
    }

    #[test]
    fn test_missing_mask() {
        let column = vec![1.0, f64::NAN, 2.0, f64::NAN];
        let view = RowSubsetView::root(4);
        let mask = SplitCandidate::missing_mask(&column, &view, f64::NAN).unwrap();
        assert!(!mask.contains(0));
        assert!(mask.contains(1));
        assert!(mask.contains(3));
    }

    #[test]
    fn test_missing_mask_sentinel_value() {
        let column = vec![1.0, -99.0, 2.0];
        let view = RowSubsetView::root(3);
        let mask = SplitCandidate::missing_mask(&column, &view, -99.0).unwrap();
        assert_eq!(mask.count_ones(..), 1);
        assert!(mask.contains(1));
    }

    #[test]
    fn test_missing_mask_none_when_all_present() {
        let column = vec![1.0, 2.0, 3.0];
        let view = RowSubsetView::root(3);
        assert!(SplitCandidate::missing_mask(&column, &view, f64::NAN).is_none());
    }

    #[test]
    fn test_partition_skips_missing() {
        let column = vec![1.0, 5.0, f64::NAN, 2.0];
        let view = RowSubsetView::root(4);
        let mask = SplitCandidate::missing_mask(&column, &view, f64::NAN);
        let candidate = SplitCandidate::new(0, &column, SplitRule::Numeric { threshold: 3.0 }, 0.1, mask);
        let (left, right) = candidate.partition(&view);
        assert!(left.contains(0));
        assert!(right.contains(1));
        assert!(!left.contains(2));
        assert!(!right.contains(2));
        assert!(left.contains(3));
    }

    #[test]
    fn test_child_condition_chains() {
        let left = ChildCondition {
            conditions: vec![
                ColumnPredicate {
                    column: 0,
                    rule: SplitRule::Numeric { threshold: 3.0 },
                    accept_when_left: true,
                },
                ColumnPredicate {
                    column: 1,
                    rule: nominal_rule(&[1]),
                    accept_when_left: true,
                },
            ],
            default_accept: false,
        };
        // primary present: decides alone
        assert!(left.accepts(|c| if c == 0 { Some(1.0) } else { None }));
        // primary missing: surrogate decides
        assert!(left.accepts(|c| if c == 1 { Some(1.0) } else { None }));
        assert!(!left.accepts(|c| if c == 1 { Some(2.0) } else { None }));
        // everything missing: default
        assert!(!left.accepts(|_| None));
    }

    #[test]
    fn test_child_condition_serde_round_trip() {
        let condition = ChildCondition {
            conditions: vec![ColumnPredicate {
                column: 3,
                rule: nominal_rule(&[0, 4]),
                accept_when_left: false,
            }],
            default_accept: true,
        };
        let json = serde_json::to_string(&condition).unwrap();
        let back: ChildCondition = serde_json::from_str(&json).unwrap();
        assert_eq!(condition, back);
    }
}
