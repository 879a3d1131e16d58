//! Interval normalizer (spec.md §4.1): parses raw timestamps, detects
//! cadence, assigns month/day keys under a configured time zone, and
//! optionally gap-fills short interior gaps by linear interpolation.

use chrono_tz::Tz;

use crate::domain::{DayKey, EngineWarning, MonthKey, NormalizedInterval, NormalizedSeries};

/// A raw reading before parsing: the row index it came from (for warnings)
/// and the unparsed timestamp/kW pair.
#[derive(Debug, Clone)]
pub struct RawReading {
    pub timestamp_raw: String,
    pub kw: f64,
}

#[derive(Debug, Clone, Copy)]
pub struct NormalizeOptions {
    pub zone: Tz,
    pub fill_gaps: bool,
    /// Maximum number of consecutive missing intervals that may be filled.
    pub max_fill_count: usize,
}

impl Default for NormalizeOptions {
    fn default() -> Self {
        Self {
            zone: Tz::UTC,
            fill_gaps: true,
            max_fill_count: 4,
        }
    }
}

const CANDIDATE_CADENCES_MINUTES: [i64; 6] = [5, 10, 15, 20, 30, 60];

/// Round a raw median-delta (in minutes) to the nearest supported AMI
/// cadence. Falls back to the raw value if it's absurdly far from every
/// candidate (e.g. malformed input), so downstream code still gets a
/// positive number rather than panicking on division by zero.
fn round_to_stable_cadence(median_minutes: f64) -> f64 {
    CANDIDATE_CADENCES_MINUTES
        .iter()
        .map(|&c| c as f64)
        .min_by(|a, b| {
            (a - median_minutes)
                .abs()
                .partial_cmp(&(b - median_minutes).abs())
                .unwrap()
        })
        .unwrap_or(median_minutes)
}

fn detect_cadence_hours(sorted_timestamps: &[chrono::DateTime<Tz>]) -> f64 {
    if sorted_timestamps.len() < 2 {
        return 15.0 / 60.0;
    }
    let mut deltas_minutes: Vec<f64> = sorted_timestamps
        .windows(2)
        .map(|w| (w[1] - w[0]).num_seconds() as f64 / 60.0)
        .collect();
    deltas_minutes.sort_by(|a, b| a.partial_cmp(b).unwrap());
    let median = deltas_minutes[deltas_minutes.len() / 2];
    round_to_stable_cadence(median) / 60.0
}

/// Normalize a series of raw readings into an ordered, gap-policed series.
pub fn normalize(readings: &[RawReading], opts: NormalizeOptions) -> NormalizedSeries {
    let mut warnings = Vec::new();
    let mut parsed: Vec<(chrono::DateTime<Tz>, f64)> = Vec::with_capacity(readings.len());

    for reading in readings {
        match crate::domain::parse_timestamp(&reading.timestamp_raw, opts.zone) {
            Some(ts) => parsed.push((ts, reading.kw)),
            None => warnings.push(EngineWarning::UnparseableTimestamp {
                raw: reading.timestamp_raw.clone(),
            }),
        }
    }

    parsed.sort_by_key(|(ts, _)| *ts);

    let timestamps: Vec<chrono::DateTime<Tz>> = parsed.iter().map(|(ts, _)| *ts).collect();
    let cadence_hours = detect_cadence_hours(&timestamps);

    let filled = if opts.fill_gaps {
        fill_gaps(&parsed, cadence_hours, opts.max_fill_count, &mut warnings)
    } else {
        parsed
    };

    let mut intervals = Vec::with_capacity(filled.len());
    for (idx, (ts, kw)) in filled.into_iter().enumerate() {
        if kw < 0.0 {
            warnings.push(EngineWarning::NetExportInterval { index: idx });
        }
        intervals.push(NormalizedInterval {
            timestamp: ts,
            kw,
            month_key: MonthKey::from_datetime(&ts),
            day_key: DayKey::from_datetime(&ts),
        });
    }

    NormalizedSeries {
        intervals,
        cadence_hours,
        warnings,
    }
}

/// Linearly interpolate interior gaps up to `max_fill_count` consecutive
/// missing intervals; larger gaps are left unfilled and warned about.
fn fill_gaps(
    parsed: &[(chrono::DateTime<Tz>, f64)],
    cadence_hours: f64,
    max_fill_count: usize,
    warnings: &mut Vec<EngineWarning>,
) -> Vec<(chrono::DateTime<Tz>, f64)> {
    if parsed.len() < 2 || cadence_hours <= 0.0 {
        return parsed.to_vec();
    }

    let step = chrono::Duration::milliseconds((cadence_hours * 3_600_000.0).round() as i64);
    let mut out = Vec::with_capacity(parsed.len());
    out.push(parsed[0]);

    for window in parsed.windows(2) {
        let (prev_ts, prev_kw) = window[0];
        let (next_ts, next_kw) = window[1];
        let gap_steps = ((next_ts - prev_ts).num_milliseconds() as f64 / step.num_milliseconds() as f64).round() as i64 - 1;

        if gap_steps <= 0 {
            out.push((next_ts, next_kw));
            continue;
        }

        if gap_steps as usize > max_fill_count {
            warnings.push(EngineWarning::GapNotFilled {
                index: out.len(),
                missing_count: gap_steps as usize,
            });
            out.push((next_ts, next_kw));
            continue;
        }

        for i in 1..=gap_steps {
            let frac = i as f64 / (gap_steps + 1) as f64;
            let ts = prev_ts + step * i as i32;
            let kw = prev_kw + (next_kw - prev_kw) * frac;
            out.push((ts, kw));
        }
        out.push((next_ts, next_kw));
    }

    out
}
