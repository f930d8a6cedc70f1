//! Post-run pacing analysis: run phases, first-time content beats, novelty
//! droughts and bursts.

use inkblade_game::catalog::Catalog;
use inkblade_game::state::GameState;
use serde::Serialize;
use std::collections::HashSet;

use crate::simulation::{EventTag, SimEvent};

const MID_TOTAL_STROKES: f64 = 20_000.0;
const MID_TOTAL_CLICKS: u64 = 250;
const MID_MEDIA_TIER: usize = 2;
const LATE_MEDIA_TIER: usize = 4;

/// Coarse run phase used for pacing tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RunPhase {
    Early,
    Mid,
    Late,
}

impl RunPhase {
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            RunPhase::Early => "early",
            RunPhase::Mid => "mid",
            RunPhase::Late => "late",
        }
    }

    #[must_use]
    pub fn description(self) -> &'static str {
        match self {
            RunPhase::Early => "Minimal tools. Build rhythm with deliberate strokes.",
            RunPhase::Mid => "The studio is busy. Throughput matters now.",
            RunPhase::Late => "The run bends toward ritual and erasure.",
        }
    }
}

/// Classify a state into early/mid/late.
#[must_use]
pub fn run_phase(catalog: &Catalog, state: &GameState) -> RunPhase {
    let is_late = state.total_strokes >= catalog.tuning.prestige_threshold
        || state.media_tier >= LATE_MEDIA_TIER
        || state.total_strokes >= catalog.tuning.erasure_divisor
        || state.prestige_count > 0;
    if is_late {
        return RunPhase::Late;
    }
    let is_mid = state.total_strokes >= MID_TOTAL_STROKES
        || state.total_clicks >= MID_TOTAL_CLICKS
        || state.media_tier >= MID_MEDIA_TIER;
    if is_mid { RunPhase::Mid } else { RunPhase::Early }
}

/// A first-time content moment: media tier, sword or achievement.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MajorBeat {
    pub sim_time: f64,
    pub tag: EventTag,
    pub label: String,
}

/// Cadence statistics over first-time major beats.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CadenceSummary {
    pub beat_count: usize,
    pub first_beat_time: Option<f64>,
    pub avg_gap: Option<f64>,
    pub median_gap: Option<f64>,
    pub longest_drought: f64,
    pub drought_start: f64,
    pub drought_end: f64,
    pub burst_window_secs: f64,
    pub peak_burst_count: usize,
    pub peak_burst_start: Option<f64>,
    pub peak_burst_end: Option<f64>,
}

/// Extract the first occurrence of each content beat, in time order.
/// Repeated unlocks after a prestige do not count again.
#[must_use]
pub fn first_time_major_beats(events: &[SimEvent]) -> Vec<MajorBeat> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut beats = Vec::new();
    for event in events {
        if !matches!(event.tag, EventTag::Media | EventTag::Sword | EventTag::Achieve) {
            continue;
        }
        let key = format!("{}:{}", event.tag.as_str(), event.label);
        if !seen.insert(key) {
            continue;
        }
        beats.push(MajorBeat {
            sim_time: event.sim_time,
            tag: event.tag,
            label: event.label.clone(),
        });
    }
    beats.sort_by(|a, b| a.sim_time.total_cmp(&b.sim_time));
    beats
}

#[must_use]
pub fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 1 {
        Some(sorted[mid])
    } else {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    }
}

/// Summarize gaps, the longest drought and the densest burst of beats.
#[must_use]
pub fn summarize_cadence(
    beats: &[MajorBeat],
    session_end: f64,
    burst_window_secs: f64,
) -> CadenceSummary {
    let Some(first) = beats.first() else {
        return CadenceSummary {
            beat_count: 0,
            first_beat_time: None,
            avg_gap: None,
            median_gap: None,
            longest_drought: session_end,
            drought_start: 0.0,
            drought_end: session_end,
            burst_window_secs,
            peak_burst_count: 0,
            peak_burst_start: None,
            peak_burst_end: None,
        };
    };

    let gaps: Vec<f64> = beats
        .windows(2)
        .map(|pair| pair[1].sim_time - pair[0].sim_time)
        .collect();

    let mut drought_start = 0.0;
    let mut drought_end = first.sim_time;
    let mut longest_drought = drought_end - drought_start;
    for pair in beats.windows(2) {
        let gap = pair[1].sim_time - pair[0].sim_time;
        if gap > longest_drought {
            longest_drought = gap;
            drought_start = pair[0].sim_time;
            drought_end = pair[1].sim_time;
        }
    }
    let last_beat_time = beats[beats.len() - 1].sim_time;
    let tail_gap = (session_end - last_beat_time).max(0.0);
    if tail_gap > longest_drought {
        longest_drought = tail_gap;
        drought_start = last_beat_time;
        drought_end = session_end;
    }

    let mut peak_burst_count = 1;
    let mut peak_burst_start = Some(first.sim_time);
    let mut peak_burst_end = Some(first.sim_time);
    for (i, opener) in beats.iter().enumerate() {
        let window_end = opener.sim_time + burst_window_secs;
        let mut count = 0;
        let mut end = opener.sim_time;
        for beat in &beats[i..] {
            if beat.sim_time <= window_end {
                count += 1;
                end = beat.sim_time;
            } else {
                break;
            }
        }
        if count > peak_burst_count {
            peak_burst_count = count;
            peak_burst_start = Some(opener.sim_time);
            peak_burst_end = Some(end);
        }
    }

    let avg_gap = if gaps.is_empty() {
        None
    } else {
        Some(gaps.iter().sum::<f64>() / gaps.len() as f64)
    };

    CadenceSummary {
        beat_count: beats.len(),
        first_beat_time: Some(first.sim_time),
        avg_gap,
        median_gap: median(&gaps),
        longest_drought,
        drought_start,
        drought_end,
        burst_window_secs,
        peak_burst_count,
        peak_burst_start,
        peak_burst_end,
    }
}
