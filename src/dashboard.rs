//! Composes every aggregation into the snapshot the dashboard renders.

use serde::Serialize;

use crate::health::{self, CollectionHealth};
use crate::matrix::{self, QuadrantMatrix};
use crate::models::{CollectionQualityRecord, DashboardInput, ResponseRecord};
use crate::rankings::{self, Drivers, PreferenceCount};
use crate::scores::{self, NetEaseScore, NpsScore, ScoreBucket, VibeScore};
use crate::segments::{self, Segments};

/// Below this many answers a number is shown with a low-confidence warning.
pub const SMALL_SAMPLE_THRESHOLD: usize = 100;

pub fn is_small_sample(count: usize) -> bool {
    count < SMALL_SAMPLE_THRESHOLD
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseRateKpi {
    pub value: i32,
    pub responses: u64,
    pub invites: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DelayKpi {
    pub value: i32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Kpis {
    pub nps: NpsScore,
    pub net_ease: NetEaseScore,
    pub vibe_positive: VibeScore,
    pub response_rate: ResponseRateKpi,
    pub delay_hours: DelayKpi,
    pub sample_size: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Wayfinding {
    pub distribution: Vec<ScoreBucket>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DashboardSnapshot {
    pub kpis: Kpis,
    pub matrix: QuadrantMatrix,
    pub drivers: Drivers,
    pub wayfinding: Wayfinding,
    pub segments: Segments,
    pub preferences: Vec<PreferenceCount>,
    pub health: CollectionHealth,
}

pub fn calculate_kpis(
    responses: &[ResponseRecord],
    quality: &[CollectionQualityRecord],
) -> Kpis {
    let totals = health::quality_totals(quality);

    Kpis {
        nps: scores::calculate_nps(responses),
        net_ease: scores::calculate_net_ease(responses),
        vibe_positive: scores::calculate_vibe(responses),
        response_rate: ResponseRateKpi {
            value: health::response_rate(&totals),
            responses: totals.responses,
            invites: totals.invites,
        },
        delay_hours: DelayKpi {
            value: scores::round_half_up(totals.average_delay_hours),
        },
        sample_size: responses.len(),
    }
}

pub fn calculate_wayfinding(responses: &[ResponseRecord]) -> Wayfinding {
    Wayfinding {
        distribution: scores::wayfinding_distribution(responses),
    }
}

/// Builds every fragment from one already-filtered input. Scoping rows to
/// the selected events is the caller's job (`filters::apply`, `db`).
pub fn build_snapshot(input: &DashboardInput) -> DashboardSnapshot {
    let responses = &input.responses;

    let snapshot = DashboardSnapshot {
        kpis: calculate_kpis(responses, &input.quality),
        matrix: matrix::calculate_matrix(responses),
        drivers: rankings::calculate_drivers(responses),
        wayfinding: calculate_wayfinding(responses),
        segments: segments::calculate_segments(responses, &input.events, &input.respondents),
        preferences: rankings::calculate_preferences(responses),
        health: health::calculate_health(&input.quality),
    };

    tracing::debug!(
        responses = responses.len(),
        events = input.events.len(),
        nps = snapshot.kpis.nps.value,
        "dashboard snapshot built"
    );
    snapshot
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{at, by, date, event, nps, quality, respondent, selections, vibe, wayfinding};
    use crate::models::QuestionId;

    #[test]
    fn empty_input_gives_all_zero_snapshot() {
        let snapshot = build_snapshot(&DashboardInput::default());
        assert_eq!(snapshot.kpis, Kpis::default());
        assert_eq!(snapshot.matrix, QuadrantMatrix::default());
        assert_eq!(snapshot.health, CollectionHealth::default());
        assert!(snapshot.drivers.trophies.is_empty());
        assert!(snapshot.preferences.is_empty());
        assert!(snapshot.segments.by_event_type.is_empty());
        assert_eq!(snapshot.wayfinding.distribution.len(), 5);
    }

    #[test]
    fn rows_without_events_are_still_aggregated() {
        let input = DashboardInput {
            responses: vec![nps(10), nps(9), nps(2)],
            quality: vec![quality(100, 50, 40, 10.0)],
            ..Default::default()
        };
        let snapshot = build_snapshot(&input);
        assert_eq!(snapshot.kpis.nps.value, 33);
        assert_eq!(snapshot.kpis.response_rate.value, 50);
        assert_eq!(snapshot.health.completeness, 80);
        assert_eq!(snapshot.health.delay, 10);
    }

    #[test]
    fn event_scoping_happens_before_the_engine() {
        let input = DashboardInput {
            responses: vec![nps(10), nps(9)],
            quality: vec![quality(100, 50, 50, 10.0)],
            ..Default::default()
        };
        let scoped = crate::filters::apply(&input, &crate::filters::DashboardFilters::default());
        assert!(scoped.responses.is_empty());
        assert!(scoped.quality.is_empty());

        let snapshot = build_snapshot(&scoped);
        assert_eq!(snapshot.kpis, Kpis::default());
        assert_eq!(snapshot.health, CollectionHealth::default());
    }

    #[test]
    fn snapshot_composes_every_fragment() {
        let show = event("shows/festivais", date(2026, 5, 2));
        let fan = respondent("Feminino", "25-34", "Transporte público");
        let id = fan.respondent_id;
        let responses = vec![
            at(show.event_id, by(id, nps(10))),
            at(show.event_id, by(id, wayfinding(2))),
            at(show.event_id, by(id, selections(QuestionId::Trophies, &["Qualidade do som"]))),
            at(show.event_id, by(id, selections(QuestionId::Frustrations, &["Filas muito longas"]))),
            at(show.event_id, by(id, vibe("Com certeza voltarei"))),
            at(show.event_id, by(id, selections(QuestionId::Preferences, &["Rock", "MPB"]))),
        ];
        let input = DashboardInput {
            events: vec![show],
            respondents: vec![fan],
            responses,
            quality: vec![quality(400, 80, 72, 20.0)],
        };

        let snapshot = build_snapshot(&input);
        assert_eq!(snapshot.kpis.nps.value, 100);
        assert_eq!(snapshot.kpis.net_ease.value, 100);
        assert_eq!(snapshot.kpis.vibe_positive.value, 100);
        assert_eq!(
            snapshot.kpis.response_rate,
            ResponseRateKpi {
                value: 20,
                responses: 80,
                invites: 400,
            }
        );
        assert_eq!(snapshot.kpis.delay_hours.value, 20);
        assert_eq!(snapshot.kpis.sample_size, 6);
        assert_eq!(snapshot.matrix.high_vibe_high_nps.count, 1);
        assert_eq!(snapshot.drivers.trophies[0].percentage, 100);
        assert_eq!(snapshot.drivers.frustrations[0].label, "Filas muito longas");
        assert_eq!(snapshot.wayfinding.distribution[1].count, 1);
        assert_eq!(snapshot.segments.by_event_type[0].count, 6);
        assert_eq!(snapshot.segments.by_transport[0].name, "Transporte público");
        assert_eq!(snapshot.preferences.len(), 2);
        assert_eq!(snapshot.health.completeness, 90);
    }

    #[test]
    fn small_sample_threshold() {
        assert!(is_small_sample(99));
        assert!(!is_small_sample(100));
    }

    #[test]
    fn snapshot_serializes_with_dashboard_field_names() {
        let value = serde_json::to_value(build_snapshot(&DashboardInput::default())).unwrap();
        assert_eq!(value["kpis"]["nps"]["value"], 0);
        assert_eq!(value["kpis"]["netEase"]["easy"], 0);
        assert_eq!(value["kpis"]["vibePositive"]["value"], 0);
        assert_eq!(value["kpis"]["sampleSize"], 0);
        assert_eq!(value["matrix"]["highVibeLowNPS"]["count"], 0);
        assert_eq!(value["health"]["responseRate"], 0);
        assert!(value["segments"]["byEventType"].as_array().unwrap().is_empty());
    }
}
