use std::collections::HashMap;

use serde::Serialize;
use uuid::Uuid;

use crate::models::{EventRecord, RespondentRecord, ResponseRecord};
use crate::scores::{calculate_net_ease, calculate_nps};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SegmentMetrics {
    pub name: String,
    pub nps: i32,
    pub net_ease: i32,
    pub count: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Segments {
    pub by_event_type: Vec<SegmentMetrics>,
    pub by_gender: Vec<SegmentMetrics>,
    pub by_age: Vec<SegmentMetrics>,
    pub by_transport: Vec<SegmentMetrics>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RespondentDimension {
    Gender,
    AgeBand,
    TransportMode,
}

impl RespondentDimension {
    pub fn value_of(self, respondent: &RespondentRecord) -> Option<&str> {
        match self {
            RespondentDimension::Gender => respondent.gender.as_deref(),
            RespondentDimension::AgeBand => respondent.age_band.as_deref(),
            RespondentDimension::TransportMode => respondent.transport_mode.as_deref(),
        }
    }
}

/// Groups keyed by name, kept in the order the names were first seen.
#[derive(Default)]
struct Grouped {
    index: HashMap<String, usize>,
    groups: Vec<(String, Vec<ResponseRecord>)>,
}

impl Grouped {
    fn group(&mut self, name: &str) -> &mut Vec<ResponseRecord> {
        let slot = match self.index.get(name) {
            Some(&slot) => slot,
            None => {
                self.index.insert(name.to_string(), self.groups.len());
                self.groups.push((name.to_string(), Vec::new()));
                self.groups.len() - 1
            }
        };
        &mut self.groups[slot].1
    }

    fn into_metrics(self) -> Vec<SegmentMetrics> {
        self.groups
            .into_iter()
            .map(|(name, responses)| segment_metrics(name, &responses))
            .collect()
    }
}

pub fn segment_metrics(name: String, responses: &[ResponseRecord]) -> SegmentMetrics {
    SegmentMetrics {
        name,
        nps: calculate_nps(responses).value,
        net_ease: calculate_net_ease(responses).value,
        count: responses.len(),
    }
}

/// One group per event type, in event-list order. Types whose events drew
/// no responses still appear with a zero count.
pub fn by_event_type(responses: &[ResponseRecord], events: &[EventRecord]) -> Vec<SegmentMetrics> {
    let mut by_event: HashMap<Uuid, Vec<&ResponseRecord>> = HashMap::new();
    for response in responses {
        if let Some(event_id) = response.event_id {
            by_event.entry(event_id).or_default().push(response);
        }
    }

    let mut grouped = Grouped::default();
    for event in events {
        let group = grouped.group(&event.event_type);
        if let Some(event_responses) = by_event.get(&event.event_id) {
            group.extend(event_responses.iter().map(|r| (*r).clone()));
        }
    }
    grouped.into_metrics()
}

/// Groups responses by an attribute of their respondent. Responses whose
/// respondent or attribute is unknown are left out.
pub fn by_respondent(
    responses: &[ResponseRecord],
    respondents: &[RespondentRecord],
    dimension: RespondentDimension,
) -> Vec<SegmentMetrics> {
    let lookup: HashMap<Uuid, &RespondentRecord> = respondents
        .iter()
        .map(|respondent| (respondent.respondent_id, respondent))
        .collect();

    let mut grouped = Grouped::default();
    for response in responses {
        let value = response
            .respondent_id
            .and_then(|id| lookup.get(&id))
            .and_then(|respondent| dimension.value_of(respondent));
        if let Some(value) = value {
            grouped.group(value).push(response.clone());
        }
    }
    grouped.into_metrics()
}

pub fn calculate_segments(
    responses: &[ResponseRecord],
    events: &[EventRecord],
    respondents: &[RespondentRecord],
) -> Segments {
    Segments {
        by_event_type: by_event_type(responses, events),
        by_gender: by_respondent(responses, respondents, RespondentDimension::Gender),
        by_age: by_respondent(responses, respondents, RespondentDimension::AgeBand),
        by_transport: by_respondent(responses, respondents, RespondentDimension::TransportMode),
    }
}
