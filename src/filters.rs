use std::collections::{HashMap, HashSet};

use chrono::{Duration, NaiveDate, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::models::{
    CollectionQualityRecord, DashboardInput, EventRecord, RespondentRecord, ResponseRecord,
};

/// Inclusive on both ends; either end may be open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DateRange {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl DateRange {
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.from.map_or(true, |from| date >= from) && self.to.map_or(true, |to| date <= to)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardFilters {
    pub date_range: Option<DateRange>,
    pub event_type: Option<String>,
    pub gender: Option<String>,
    pub age_band: Option<String>,
    pub transport_mode: Option<String>,
}

impl DashboardFilters {
    pub fn filters_respondents(&self) -> bool {
        self.gender.is_some() || self.age_band.is_some() || self.transport_mode.is_some()
    }

    pub fn accepts_event(&self, event: &EventRecord) -> bool {
        let in_range = self
            .date_range
            .map_or(true, |range| range.contains(event.event_date));
        let of_type = self
            .event_type
            .as_deref()
            .map_or(true, |event_type| event.event_type == event_type);
        in_range && of_type
    }

    pub fn accepts_respondent(&self, respondent: Option<&RespondentRecord>) -> bool {
        if !self.filters_respondents() {
            return true;
        }
        let Some(respondent) = respondent else {
            return false;
        };
        matches(&self.gender, &respondent.gender)
            && matches(&self.age_band, &respondent.age_band)
            && matches(&self.transport_mode, &respondent.transport_mode)
    }

    /// Human label for report headers.
    pub fn describe(&self) -> String {
        let mut parts = Vec::new();
        if let Some(range) = self.date_range {
            let from = range.from.map_or("start".to_string(), |d| d.to_string());
            let to = range.to.map_or("today".to_string(), |d| d.to_string());
            parts.push(format!("{from} to {to}"));
        }
        for (name, value) in [
            ("event type", &self.event_type),
            ("gender", &self.gender),
            ("age", &self.age_band),
            ("transport", &self.transport_mode),
        ] {
            if let Some(value) = value {
                parts.push(format!("{name} {value}"));
            }
        }
        if parts.is_empty() {
            "all events".to_string()
        } else {
            parts.join(", ")
        }
    }
}

fn matches(wanted: &Option<String>, actual: &Option<String>) -> bool {
    match wanted {
        None => true,
        Some(value) => actual.as_deref() == Some(value.as_str()),
    }
}

pub fn cutoff_date(since_days: i64) -> NaiveDate {
    Utc::now().date_naive() - Duration::days(since_days.max(1))
}

/// Trailing window of `since_days` ending today.
pub fn trailing_window(since_days: i64) -> DateRange {
    DateRange {
        from: Some(cutoff_date(since_days)),
        to: Some(Utc::now().date_naive()),
    }
}

pub fn select_events(events: &[EventRecord], filters: &DashboardFilters) -> Vec<EventRecord> {
    events
        .iter()
        .filter(|event| filters.accepts_event(event))
        .cloned()
        .collect()
}

pub fn filter_responses(
    responses: &[ResponseRecord],
    events: &[EventRecord],
    respondents: &[RespondentRecord],
    filters: &DashboardFilters,
) -> Vec<ResponseRecord> {
    let event_ids: HashSet<Uuid> = events.iter().map(|event| event.event_id).collect();
    let lookup: HashMap<Uuid, &RespondentRecord> = respondents
        .iter()
        .map(|respondent| (respondent.respondent_id, respondent))
        .collect();

    responses
        .iter()
        .filter(|response| {
            response
                .event_id
                .is_some_and(|event_id| event_ids.contains(&event_id))
        })
        .filter(|response| {
            let respondent = response
                .respondent_id
                .and_then(|id| lookup.get(&id).copied());
            filters.accepts_respondent(respondent)
        })
        .cloned()
        .collect()
}

pub fn filter_quality(
    quality: &[CollectionQualityRecord],
    events: &[EventRecord],
) -> Vec<CollectionQualityRecord> {
    let event_ids: HashSet<Uuid> = events.iter().map(|event| event.event_id).collect();
    quality
        .iter()
        .filter(|record| record.event_id.is_some_and(|id| event_ids.contains(&id)))
        .cloned()
        .collect()
}

/// Narrows a raw input down to what one dashboard query should see.
/// Respondent filters narrow the responses only; collection quality stays
/// per event.
pub fn apply(input: &DashboardInput, filters: &DashboardFilters) -> DashboardInput {
    let events = select_events(&input.events, filters);
    let responses = filter_responses(&input.responses, &events, &input.respondents, filters);
    let quality = filter_quality(&input.quality, &events);

    DashboardInput {
        events,
        respondents: input.respondents.clone(),
        responses,
        quality,
    }
}
