use serde::{Deserialize, Serialize};

use super::{
    all_subarrays, classic_max_subarray_sum, subarray_count, visual_max_subarray_sum, Gain,
    Parcel, SubarrayEntry, SubarrayResult, DEFAULT_ENUMERATION_LIMIT,
};

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum Mode {
    #[serde(rename = "kadane.classic")]
    Classic,
    #[serde(rename = "kadane.visual")]
    Visual,
}

impl Default for Mode {
    fn default() -> Self {
        Mode::Visual
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ModeInfo {
    pub id: String,
    pub name: String,
    pub description: String,
    pub enumerates: bool,
}

impl Mode {
    pub fn id(&self) -> &'static str {
        match self {
            Mode::Classic => "kadane.classic",
            Mode::Visual => "kadane.visual",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Mode::Classic => "Classic (sum only)",
            Mode::Visual => "Visual (sum + winning slice + all subarrays)",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Mode::Classic => "Linear Kadane pass that reports only the maximum sum.",
            Mode::Visual => {
                "Kadane pass that also tracks the earliest optimal slice, plus an O(n^2) listing of every contiguous subarray sorted by sum."
            }
        }
    }

    /// Whether the mode lists every subarray.
    pub fn enumerates(&self) -> bool {
        matches!(self, Mode::Visual)
    }

    pub fn from_id(id: &str) -> Option<Self> {
        match id.trim() {
            "kadane.classic" | "classic" => Some(Mode::Classic),
            "kadane.visual" | "visual" => Some(Mode::Visual),
            _ => None,
        }
    }
}

pub fn list_modes() -> Vec<ModeInfo> {
    [Mode::Classic, Mode::Visual]
        .into_iter()
        .map(|mode| ModeInfo {
            id: mode.id().to_string(),
            name: mode.name().to_string(),
            description: mode.description().to_string(),
            enumerates: mode.enumerates(),
        })
        .collect()
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SolveParams {
    pub mode: Mode,
    /// Longest sequence whose subarrays are listed; `None` lifts the guard.
    pub enumeration_limit: Option<usize>,
}

impl Default for SolveParams {
    fn default() -> Self {
        Self {
            mode: Mode::Visual,
            enumeration_limit: Some(DEFAULT_ENUMERATION_LIMIT),
        }
    }
}

/// Everything a front end shows for one sequence.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
    pub mode: Mode,
    pub parcels: Vec<Parcel>,
    pub classic_sum: Gain,
    pub best: Option<SubarrayResult>,
    pub winning_slice: Vec<Parcel>,
    pub subarrays: Vec<SubarrayEntry>,
    pub subarray_count: usize,
    pub enumeration_skipped: bool,
}

impl Report {
    /// Entries are highlighted when they tie the best sum or repeat the
    /// winning slice's values.
    pub fn is_highlighted(&self, entry: &SubarrayEntry) -> bool {
        match self.best.as_ref() {
            Some(best) if !best.is_empty() => {
                entry.sum == best.sum || entry.values == self.winning_slice
            }
            _ => false,
        }
    }

    /// Classic and visual answers agree and the winning slice adds up.
    pub fn consistent(&self) -> bool {
        let Some(best) = self.best.as_ref() else {
            return true;
        };
        let slice_sum: Gain = self.winning_slice.iter().map(|&v| Gain::from(v)).sum();
        let top_ok = self
            .subarrays
            .first()
            .map_or(true, |top| top.sum == self.classic_sum);
        best.sum == self.classic_sum && (best.is_empty() || slice_sum == best.sum) && top_ok
    }

    pub fn highlighted_count(&self) -> usize {
        self.subarrays
            .iter()
            .filter(|e| self.is_highlighted(e))
            .count()
    }
}

/// Milliseconds spent in each core call while building a [`Report`].
///
/// `visual_ms` is `None` in classic mode and `enumeration_ms` is `None`
/// whenever the listing was not built.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct StageTimings {
    pub classic_ms: f64,
    pub visual_ms: Option<f64>,
    pub enumeration_ms: Option<f64>,
}

pub fn compute_report(seq: &[Parcel], params: &SolveParams) -> Report {
    compute_report_timed(seq, params, || 0.0).0
}

/// Same as [`compute_report`], timing each call with `now` (milliseconds).
pub fn compute_report_timed<C>(
    seq: &[Parcel],
    params: &SolveParams,
    mut now: C,
) -> (Report, StageTimings)
where
    C: FnMut() -> f64,
{
    let t0 = now();
    let classic_sum = classic_max_subarray_sum(seq);
    let mut timings = StageTimings {
        classic_ms: now() - t0,
        ..StageTimings::default()
    };
    let count = subarray_count(seq.len());

    if !params.mode.enumerates() {
        let report = Report {
            mode: params.mode,
            parcels: seq.to_vec(),
            classic_sum,
            best: None,
            winning_slice: Vec::new(),
            subarrays: Vec::new(),
            subarray_count: count,
            enumeration_skipped: false,
        };
        return (report, timings);
    }

    let t0 = now();
    let best = visual_max_subarray_sum(seq);
    timings.visual_ms = Some(now() - t0);

    let winning_slice = best.slice(seq).to_vec();
    let over_limit = params
        .enumeration_limit
        .is_some_and(|limit| seq.len() > limit);
    let subarrays = if over_limit {
        Vec::new()
    } else {
        let t0 = now();
        let entries = all_subarrays(seq);
        timings.enumeration_ms = Some(now() - t0);
        entries
    };

    let report = Report {
        mode: params.mode,
        parcels: seq.to_vec(),
        classic_sum,
        best: Some(best),
        winning_slice,
        subarrays,
        subarray_count: count,
        enumeration_skipped: over_limit,
    };
    (report, timings)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_ids_round_trip() {
        for info in list_modes() {
            let mode = Mode::from_id(&info.id).unwrap();
            assert_eq!(mode.id(), info.id);
            assert_eq!(mode.name(), info.name);
        }
        assert_eq!(Mode::from_id(" classic "), Some(Mode::Classic));
        assert_eq!(Mode::from_id("brute"), None);
        assert_eq!(
            serde_json::to_string(&Mode::Visual).unwrap(),
            "\"kadane.visual\""
        );
    }

    #[test]
    fn classic_report_skips_visual_work() {
        let params = SolveParams {
            mode: Mode::Classic,
            ..SolveParams::default()
        };
        let report = compute_report(&[2, -5, 8, -2, 4, -10, 3, 1], &params);
        assert_eq!(report.classic_sum, 10);
        assert!(report.best.is_none());
        assert!(report.subarrays.is_empty());
        assert!(!report.enumeration_skipped);
        assert_eq!(report.subarray_count, 36);
        assert!(report.consistent());
    }

    #[test]
    fn visual_report_on_demo_input() {
        let report = compute_report(&[2, -5, 8, -2, 4, -10, 3, 1], &SolveParams::default());
        assert_eq!(report.classic_sum, 10);
        assert_eq!(report.winning_slice, vec![8, -2, 4]);
        assert_eq!(report.best.and_then(|b| b.range()), Some(2..=4));
        assert_eq!(report.subarrays.len(), 36);
        assert!(report.consistent());
        assert_eq!(report.highlighted_count(), 1);
        assert!(report.is_highlighted(&report.subarrays[0]));
    }

    #[test]
    fn ties_are_all_highlighted() {
        let report = compute_report(&[8, 1, -100, 4, 5], &SolveParams::default());
        assert_eq!(report.winning_slice, vec![8, 1]);
        let tied: Vec<Vec<Parcel>> = report
            .subarrays
            .iter()
            .filter(|e| report.is_highlighted(e))
            .map(|e| e.values.clone())
            .collect();
        assert_eq!(tied, vec![vec![8, 1], vec![4, 5]]);
    }

    #[test]
    fn guard_skips_enumeration_but_keeps_answer() {
        let seq: Vec<Parcel> = (1..=10).map(|v| if v % 3 == 0 { -v } else { v }).collect();
        let params = SolveParams {
            mode: Mode::Visual,
            enumeration_limit: Some(4),
        };
        let report = compute_report(&seq, &params);
        assert!(report.enumeration_skipped);
        assert!(report.subarrays.is_empty());
        assert_eq!(report.subarray_count, 55);
        assert_eq!(report.best.map(|b| b.sum), Some(report.classic_sum));
        assert!(report.consistent());

        let unguarded = compute_report(
            &seq,
            &SolveParams {
                enumeration_limit: None,
                ..params
            },
        );
        assert_eq!(unguarded.subarrays.len(), 55);
    }

    fn ticking_clock() -> impl FnMut() -> f64 {
        let mut ticks = 0.0;
        move || {
            ticks += 1.0;
            ticks
        }
    }

    #[test]
    fn each_stage_is_timed_separately() {
        let seq = [2, -5, 8, -2, 4, -10, 3, 1];
        let (report, timings) =
            compute_report_timed(&seq, &SolveParams::default(), ticking_clock());
        assert_eq!(report, compute_report(&seq, &SolveParams::default()));
        assert_eq!(
            timings,
            StageTimings {
                classic_ms: 1.0,
                visual_ms: Some(1.0),
                enumeration_ms: Some(1.0),
            }
        );
    }

    #[test]
    fn untimed_stages_are_absent() {
        let seq = [1, -2, 3, 4, -5];
        let classic = SolveParams {
            mode: Mode::Classic,
            ..SolveParams::default()
        };
        let (_, timings) = compute_report_timed(&seq, &classic, ticking_clock());
        assert_eq!(timings.visual_ms, None);
        assert_eq!(timings.enumeration_ms, None);

        let guarded = SolveParams {
            mode: Mode::Visual,
            enumeration_limit: Some(3),
        };
        let (report, timings) = compute_report_timed(&seq, &guarded, ticking_clock());
        assert!(report.enumeration_skipped);
        assert_eq!(timings.visual_ms, Some(1.0));
        assert_eq!(timings.enumeration_ms, None);
    }

    #[test]
    fn empty_input_report() {
        let report = compute_report(&[], &SolveParams::default());
        assert_eq!(report.classic_sum, 0);
        assert_eq!(report.best, Some(SubarrayResult::EMPTY));
        assert!(report.winning_slice.is_empty());
        assert!(report.subarrays.is_empty());
        assert_eq!(report.subarray_count, 0);
        assert!(report.consistent());
    }
}
