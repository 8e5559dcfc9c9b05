use serde::Serialize;

use crate::models::CollectionQualityRecord;
use crate::scores::{percent, round_half_up};

/// Hours after the event by which the survey should be out.
pub const DISPATCH_TARGET_HOURS: f64 = 48.0;

pub const RESPONSE_RATE_BAND: Band = Band::higher_is_better(20, 10);
pub const COMPLETENESS_BAND: Band = Band::higher_is_better(90, 70);
pub const DELAY_BAND: Band = Band::lower_is_better(24, 48);
pub const VIBE_BAND: Band = Band::higher_is_better(70, 40);

/// Segment scores: good at or above the floor, warning down to zero,
/// bad below zero.
pub const NPS_GOOD_MIN: i32 = 50;
pub const NET_EASE_GOOD_MIN: i32 = 40;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Status {
    Good,
    Warning,
    Bad,
}

impl Status {
    pub fn label(self) -> &'static str {
        match self {
            Status::Good => "good",
            Status::Warning => "warning",
            Status::Bad => "bad",
        }
    }
}

/// Good/bad cutoffs for one metric; values strictly between them warn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Band {
    pub good: i32,
    pub bad: i32,
    pub lower_is_better: bool,
}

impl Band {
    pub const fn higher_is_better(good: i32, bad: i32) -> Self {
        Self {
            good,
            bad,
            lower_is_better: false,
        }
    }

    pub const fn lower_is_better(good: i32, bad: i32) -> Self {
        Self {
            good,
            bad,
            lower_is_better: true,
        }
    }

    pub fn classify(&self, value: i32) -> Status {
        let (is_good, is_bad) = if self.lower_is_better {
            (value <= self.good, value >= self.bad)
        } else {
            (value >= self.good, value <= self.bad)
        };
        if is_good {
            Status::Good
        } else if is_bad {
            Status::Bad
        } else {
            Status::Warning
        }
    }
}

fn score_status(value: i32, good_min: i32) -> Status {
    if value >= good_min {
        Status::Good
    } else if value >= 0 {
        Status::Warning
    } else {
        Status::Bad
    }
}

pub fn nps_status(value: i32) -> Status {
    score_status(value, NPS_GOOD_MIN)
}

pub fn net_ease_status(value: i32) -> Status {
    score_status(value, NET_EASE_GOOD_MIN)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionHealth {
    pub response_rate: i32,
    pub completeness: i32,
    pub delay: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthStatus {
    pub response_rate: Status,
    pub completeness: Status,
    pub delay: Status,
}

impl CollectionHealth {
    pub fn status(&self) -> HealthStatus {
        HealthStatus {
            response_rate: RESPONSE_RATE_BAND.classify(self.response_rate),
            completeness: COMPLETENESS_BAND.classify(self.completeness),
            delay: DELAY_BAND.classify(self.delay),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct QualityTotals {
    pub invites: u64,
    pub responses: u64,
    pub complete: u64,
    pub average_delay_hours: f64,
}

pub fn quality_totals(quality: &[CollectionQualityRecord]) -> QualityTotals {
    let mut totals = QualityTotals::default();
    let mut delay_sum = 0.0;

    for record in quality {
        totals.invites += u64::from(record.invites_sent);
        totals.responses += u64::from(record.responses_total);
        totals.complete += u64::from(record.complete_responses);
        delay_sum += record.sent_delay_hours.max(0.0);
    }

    if !quality.is_empty() {
        totals.average_delay_hours = delay_sum / quality.len() as f64;
    }
    totals
}

/// Share of `part` in `whole`, 0 when `whole` is empty. Counts that break
/// `part <= whole` are reported as 100.
fn capped_rate(part: u64, whole: u64) -> i32 {
    if whole == 0 {
        return 0;
    }
    percent(part as usize, whole as usize).min(100)
}

pub fn response_rate(totals: &QualityTotals) -> i32 {
    capped_rate(totals.responses, totals.invites)
}

pub fn calculate_health(quality: &[CollectionQualityRecord]) -> CollectionHealth {
    let totals = quality_totals(quality);

    CollectionHealth {
        response_rate: response_rate(&totals),
        completeness: capped_rate(totals.complete, totals.responses),
        delay: round_half_up(totals.average_delay_hours),
    }
}

/// How far under the dispatch target the average delay is, as 0..=100.
pub fn dispatch_freshness(delay_hours: i32) -> i32 {
    let remaining = (DISPATCH_TARGET_HOURS - f64::from(delay_hours)) / DISPATCH_TARGET_HOURS;
    round_half_up((remaining * 100.0).clamp(0.0, 100.0))
}
