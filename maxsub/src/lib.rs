//! Maximum-subarray (Kadane) core used by the maxsub CLI and web front ends.
//!
//! The three entry points are pure functions over a slice of parcels:
//! [`classic_max_subarray_sum`], [`visual_max_subarray_sum`] and
//! [`all_subarrays`]. None of them fail; an empty slice yields a sentinel.

use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod generate;
pub mod parse;
pub mod report;

pub use generate::{generate_patch, PatchSpec};
pub use parse::{format_parcels, parse_parcels, parse_parcels_strict, ParsedInput};
pub use report::{
    compute_report, compute_report_timed, list_modes, Mode, ModeInfo, Report, SolveParams,
    StageTimings,
};

/// One element of an input sequence.
pub type Parcel = i32;

/// Sum of a run of parcels. Wider than [`Parcel`] so no slice sum can overflow.
pub type Gain = i64;

/// Length above which enumerating every subarray is considered too expensive
/// for interactive use.
pub const DEFAULT_ENUMERATION_LIMIT: usize = 200;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MaxSubError {
    #[error("invalid token #{index}: '{token}' is not an integer")]
    InvalidToken { index: usize, token: String },
    #[error("invalid range: min {min} is greater than max {max}")]
    InvalidRange { min: Parcel, max: Parcel },
    #[error("range contains only zero; no non-zero parcel can be drawn")]
    ZeroOnlyRange,
    #[error("refusing to enumerate subarrays of {len} parcels (limit {limit})")]
    EnumerationTooLarge { len: usize, limit: usize },
}

/// Winning slice reported by [`visual_max_subarray_sum`].
///
/// `end` is `None` only for the empty-input sentinel; on the wire it is
/// written as `-1` so the shape stays `{sum, start, end}`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubarrayResult {
    pub sum: Gain,
    pub start: usize,
    #[serde(with = "end_sentinel")]
    pub end: Option<usize>,
}

impl SubarrayResult {
    /// Sentinel returned for an empty sequence.
    pub const EMPTY: SubarrayResult = SubarrayResult {
        sum: 0,
        start: 0,
        end: None,
    };

    pub fn range(&self) -> Option<RangeInclusive<usize>> {
        self.end.map(|end| self.start..=end)
    }

    pub fn is_empty(&self) -> bool {
        self.end.is_none()
    }

    pub fn len(&self) -> usize {
        self.end.map_or(0, |end| (end + 1).saturating_sub(self.start))
    }

    pub fn contains(&self, index: usize) -> bool {
        self.range().is_some_and(|r| r.contains(&index))
    }

    /// Winning parcels within `seq`, or an empty slice for the sentinel or a
    /// range that does not fit `seq`.
    pub fn slice<'a>(&self, seq: &'a [Parcel]) -> &'a [Parcel] {
        self.range()
            .and_then(|r| seq.get(r))
            .unwrap_or(&[])
    }
}

mod end_sentinel {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(end: &Option<usize>, serializer: S) -> Result<S::Ok, S::Error> {
        match end {
            Some(idx) => serializer.serialize_u64(*idx as u64),
            None => serializer.serialize_i64(-1),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<usize>, D::Error> {
        let raw = i64::deserialize(deserializer)?;
        if raw < 0 {
            Ok(None)
        } else {
            usize::try_from(raw)
                .map(Some)
                .map_err(serde::de::Error::custom)
        }
    }
}

/// A contiguous slice of the input together with its sum.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubarrayEntry {
    pub values: Vec<Parcel>,
    pub sum: Gain,
    pub start: usize,
    pub end: usize,
}

impl SubarrayEntry {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Maximum sum over all non-empty contiguous slices; 0 for an empty slice.
pub fn classic_max_subarray_sum(seq: &[Parcel]) -> Gain {
    let Some((&first, rest)) = seq.split_first() else {
        return 0;
    };
    let mut best_here = Gain::from(first);
    let mut best_global = best_here;
    for &x in rest {
        let x = Gain::from(x);
        best_here = x.max(best_here + x);
        best_global = best_global.max(best_here);
    }
    best_global
}

/// Maximum sum plus the inclusive index range of the earliest optimal slice.
///
/// The running slice restarts only when the new parcel alone beats extending
/// it, and the best is replaced only on a strictly greater sum, so among
/// equal maxima the first one found is kept.
pub fn visual_max_subarray_sum(seq: &[Parcel]) -> SubarrayResult {
    let Some(&first) = seq.first() else {
        return SubarrayResult::EMPTY;
    };
    let mut cur_sum = Gain::from(first);
    let mut cur_start = 0usize;
    let mut best_sum = cur_sum;
    let mut best_start = 0usize;
    let mut best_end = 0usize;

    for (i, &x) in seq.iter().enumerate().skip(1) {
        let x = Gain::from(x);
        if x > cur_sum + x {
            cur_sum = x;
            cur_start = i;
        } else {
            cur_sum += x;
        }
        if cur_sum > best_sum {
            best_sum = cur_sum;
            best_start = cur_start;
            best_end = i;
        }
    }

    SubarrayResult {
        sum: best_sum,
        start: best_start,
        end: Some(best_end),
    }
}

/// Every contiguous non-empty slice with its sum, highest sum first.
///
/// Entries are produced by start index, then end index, and the sort is
/// stable, so equal sums keep that order. Unbounded: callers that take
/// untrusted lengths should go through [`try_all_subarrays`].
pub fn all_subarrays(seq: &[Parcel]) -> Vec<SubarrayEntry> {
    let mut out = Vec::with_capacity(subarray_count(seq.len()));
    for start in 0..seq.len() {
        let mut running: Gain = 0;
        let mut values = Vec::with_capacity(seq.len() - start);
        for (end, &x) in seq.iter().enumerate().skip(start) {
            running += Gain::from(x);
            values.push(x);
            out.push(SubarrayEntry {
                values: values.clone(),
                sum: running,
                start,
                end,
            });
        }
    }
    out.sort_by(|a, b| b.sum.cmp(&a.sum));
    out
}

/// [`all_subarrays`] behind a length guard.
pub fn try_all_subarrays(seq: &[Parcel], limit: usize) -> Result<Vec<SubarrayEntry>, MaxSubError> {
    if seq.len() > limit {
        return Err(MaxSubError::EnumerationTooLarge {
            len: seq.len(),
            limit,
        });
    }
    Ok(all_subarrays(seq))
}

/// Number of contiguous non-empty slices of a sequence of `len` parcels.
pub fn subarray_count(len: usize) -> usize {
    len.saturating_mul(len.saturating_add(1)) / 2
}

#[cfg(test)]
mod tests {
    use super::*;
    use quickcheck_macros::quickcheck;

    fn winning(seq: &[Parcel]) -> Vec<Parcel> {
        visual_max_subarray_sum(seq).slice(seq).to_vec()
    }

    #[test]
    fn empty_sequence_returns_sentinels() {
        assert_eq!(classic_max_subarray_sum(&[]), 0);
        let visual = visual_max_subarray_sum(&[]);
        assert_eq!(visual, SubarrayResult::EMPTY);
        assert_eq!(visual.start, 0);
        assert!(visual.is_empty());
        assert_eq!(visual.len(), 0);
        assert!(visual.slice(&[]).is_empty());
        assert!(all_subarrays(&[]).is_empty());
    }

    #[test]
    fn all_positive_takes_everything() {
        let seq = [1, 2, 3, 4];
        assert_eq!(classic_max_subarray_sum(&seq), 10);
        assert_eq!(
            visual_max_subarray_sum(&seq),
            SubarrayResult {
                sum: 10,
                start: 0,
                end: Some(3)
            }
        );
    }

    #[test]
    fn classic_textbook_example() {
        let seq = [-2, 1, -3, 4, -1, 2, 1, -5, 4];
        assert_eq!(classic_max_subarray_sum(&seq), 6);
        let visual = visual_max_subarray_sum(&seq);
        assert_eq!(visual.sum, 6);
        assert_eq!(visual.range(), Some(3..=6));
        assert_eq!(winning(&seq), vec![4, -1, 2, 1]);
    }

    #[test]
    fn all_negative_picks_earliest_largest() {
        let seq = [-1, -2, -3, -4];
        assert_eq!(classic_max_subarray_sum(&seq), -1);
        let visual = visual_max_subarray_sum(&seq);
        assert_eq!(visual.sum, -1);
        assert_eq!(visual.range(), Some(0..=0));
    }

    #[test]
    fn restart_in_the_middle_keeps_larger_prefix() {
        let seq = [8, 1, -100, 2, 5];
        assert_eq!(classic_max_subarray_sum(&seq), 9);
        assert_eq!(winning(&seq), vec![8, 1]);
    }

    #[test]
    fn tie_keeps_first_optimal_slice() {
        let seq = [8, 1, -100, 4, 5];
        assert_eq!(classic_max_subarray_sum(&seq), 9);
        let visual = visual_max_subarray_sum(&seq);
        assert_eq!(visual.range(), Some(0..=1));
        assert_eq!(winning(&seq), vec![8, 1]);
    }

    #[test]
    fn tie_with_zero_extension_does_not_grow_slice() {
        // [3] and [3, 0] both sum to 3; the strict comparison keeps [3].
        let seq = [3, 0, -5];
        assert_eq!(visual_max_subarray_sum(&seq).range(), Some(0..=0));
    }

    #[test]
    fn single_elements() {
        assert_eq!(classic_max_subarray_sum(&[5]), 5);
        assert_eq!(
            visual_max_subarray_sum(&[5]),
            SubarrayResult {
                sum: 5,
                start: 0,
                end: Some(0)
            }
        );
        assert_eq!(classic_max_subarray_sum(&[-5]), -5);
        assert_eq!(
            visual_max_subarray_sum(&[-5]),
            SubarrayResult {
                sum: -5,
                start: 0,
                end: Some(0)
            }
        );
    }

    #[test]
    fn extreme_values_do_not_overflow() {
        let seq = [Parcel::MAX, Parcel::MAX, Parcel::MAX];
        assert_eq!(classic_max_subarray_sum(&seq), 3 * Gain::from(Parcel::MAX));
        let seq = [Parcel::MIN, Parcel::MIN];
        assert_eq!(visual_max_subarray_sum(&seq).sum, Gain::from(Parcel::MIN));
    }

    #[test]
    fn all_subarrays_sorted_with_stable_ties() {
        let seq = [1, -1, 1];
        let entries = all_subarrays(&seq);
        let listed: Vec<(Vec<Parcel>, Gain)> = entries
            .iter()
            .map(|e| (e.values.clone(), e.sum))
            .collect();
        assert_eq!(
            listed,
            vec![
                (vec![1], 1),
                (vec![1, -1, 1], 1),
                (vec![1], 1),
                (vec![1, -1], 0),
                (vec![-1, 1], 0),
                (vec![-1], -1),
            ]
        );
        assert_eq!((entries[0].start, entries[0].end), (0, 0));
        assert_eq!((entries[2].start, entries[2].end), (2, 2));
    }

    #[test]
    fn guard_rejects_long_sequences() {
        let seq = vec![1; 5];
        assert_eq!(
            try_all_subarrays(&seq, 4),
            Err(MaxSubError::EnumerationTooLarge { len: 5, limit: 4 })
        );
        assert_eq!(try_all_subarrays(&seq, 5).map(|v| v.len()), Ok(15));
    }

    #[test]
    fn subarray_count_matches_triangle_numbers() {
        assert_eq!(subarray_count(0), 0);
        assert_eq!(subarray_count(1), 1);
        assert_eq!(subarray_count(4), 10);
        assert_eq!(subarray_count(150), 11_325);
    }

    #[test]
    fn result_serializes_with_negative_end_sentinel() {
        let json = serde_json::to_string(&SubarrayResult::EMPTY).unwrap();
        assert_eq!(json, r#"{"sum":0,"start":0,"end":-1}"#);
        let back: SubarrayResult = serde_json::from_str(&json).unwrap();
        assert_eq!(back, SubarrayResult::EMPTY);

        let found = visual_max_subarray_sum(&[8, 1, -100, 4, 5]);
        assert_eq!(
            serde_json::to_string(&found).unwrap(),
            r#"{"sum":9,"start":0,"end":1}"#
        );
    }

    #[test]
    fn slice_ignores_out_of_bounds_range() {
        let bogus = SubarrayResult {
            sum: 1,
            start: 2,
            end: Some(9),
        };
        assert!(bogus.slice(&[1, 2, 3]).is_empty());
        assert!(bogus.contains(5));
        assert!(!bogus.contains(1));
    }

    #[test]
    fn inverted_range_has_zero_len() {
        let inverted = SubarrayResult {
            sum: 0,
            start: 5,
            end: Some(2),
        };
        assert_eq!(inverted.len(), 0);
        assert!(!inverted.contains(3));
        assert!(inverted.slice(&[1, 2, 3, 4, 5, 6]).is_empty());

        let decoded: SubarrayResult =
            serde_json::from_str(r#"{"sum":0,"start":5,"end":2}"#).unwrap();
        assert_eq!(decoded.len(), 0);
    }

    #[quickcheck]
    fn classic_agrees_with_visual(seq: Vec<Parcel>) -> bool {
        classic_max_subarray_sum(&seq) == visual_max_subarray_sum(&seq).sum
    }

    #[quickcheck]
    fn winning_slice_sums_to_reported_sum(seq: Vec<Parcel>) -> bool {
        let visual = visual_max_subarray_sum(&seq);
        let total: Gain = visual.slice(&seq).iter().map(|&x| Gain::from(x)).sum();
        if seq.is_empty() {
            visual == SubarrayResult::EMPTY
        } else {
            !visual.is_empty() && total == visual.sum
        }
    }

    #[quickcheck]
    fn enumeration_is_complete_and_sorted(seq: Vec<i8>) -> bool {
        let seq: Vec<Parcel> = seq.into_iter().map(Parcel::from).collect();
        let entries = all_subarrays(&seq);
        let sorted = entries.windows(2).all(|w| w[0].sum >= w[1].sum);
        let complete = entries.len() == seq.len() * (seq.len() + 1) / 2;
        let top_matches = entries
            .first()
            .map_or(seq.is_empty(), |top| top.sum == classic_max_subarray_sum(&seq));
        sorted && complete && top_matches
    }

    #[quickcheck]
    fn equal_sums_keep_enumeration_order(seq: Vec<i8>) -> bool {
        let seq: Vec<Parcel> = seq.into_iter().map(|x| Parcel::from(x % 3)).collect();
        all_subarrays(&seq)
            .windows(2)
            .filter(|w| w[0].sum == w[1].sum)
            .all(|w| (w[0].start, w[0].end) < (w[1].start, w[1].end))
    }

    #[quickcheck]
    fn visual_is_earliest_optimum(seq: Vec<i8>) -> bool {
        let seq: Vec<Parcel> = seq.into_iter().map(|x| Parcel::from(x % 4)).collect();
        let visual = visual_max_subarray_sum(&seq);
        match all_subarrays(&seq).first() {
            None => visual.is_empty(),
            Some(top) => top.sum == visual.sum && visual.range() == Some(top.start..=top.end),
        }
    }

    #[quickcheck]
    fn functions_are_idempotent(seq: Vec<Parcel>) -> bool {
        classic_max_subarray_sum(&seq) == classic_max_subarray_sum(&seq)
            && visual_max_subarray_sum(&seq) == visual_max_subarray_sum(&seq)
    }

    #[quickcheck]
    fn enumeration_is_idempotent(seq: Vec<i8>) -> bool {
        let seq: Vec<Parcel> = seq.into_iter().map(Parcel::from).collect();
        all_subarrays(&seq) == all_subarrays(&seq)
    }
}
