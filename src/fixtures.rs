//! Record builders shared by the unit tests.

use chrono::NaiveDate;
use uuid::Uuid;

use crate::models::{
    Answer, CollectionQualityRecord, EventRecord, QuestionId, RespondentRecord, ResponseRecord,
};

pub fn response(question: QuestionId, answer: Answer) -> ResponseRecord {
    ResponseRecord {
        response_id: Uuid::new_v4(),
        event_id: None,
        respondent_id: Some(Uuid::new_v4()),
        question,
        answer,
        answered_at: None,
    }
}

pub fn nps(score: i32) -> ResponseRecord {
    response(QuestionId::Nps, Answer::Numeric(score))
}

pub fn wayfinding(score: i32) -> ResponseRecord {
    response(QuestionId::Wayfinding, Answer::Numeric(score))
}

pub fn vibe(answer: &str) -> ResponseRecord {
    response(QuestionId::Vibe, Answer::Choice(answer.to_string()))
}

pub fn selections(question: QuestionId, labels: &[&str]) -> ResponseRecord {
    response(
        question,
        Answer::Selections(labels.iter().map(|l| l.to_string()).collect()),
    )
}

pub fn by(respondent_id: Uuid, mut record: ResponseRecord) -> ResponseRecord {
    record.respondent_id = Some(respondent_id);
    record
}

pub fn at(event_id: Uuid, mut record: ResponseRecord) -> ResponseRecord {
    record.event_id = Some(event_id);
    record
}

pub fn event(event_type: &str, date: NaiveDate) -> EventRecord {
    EventRecord {
        event_id: Uuid::new_v4(),
        event_code: "EVT001".to_string(),
        name: format!("Evento - {event_type}"),
        event_type: event_type.to_string(),
        event_date: date,
        capacity: Some(1500),
    }
}

pub fn respondent(gender: &str, age_band: &str, transport_mode: &str) -> RespondentRecord {
    RespondentRecord {
        respondent_id: Uuid::new_v4(),
        gender: Some(gender.to_string()),
        age_band: Some(age_band.to_string()),
        transport_mode: Some(transport_mode.to_string()),
    }
}

pub fn quality(invites: u32, responses: u32, complete: u32, delay: f64) -> CollectionQualityRecord {
    CollectionQualityRecord {
        event_id: None,
        invites_sent: invites,
        responses_total: responses,
        complete_responses: complete,
        sent_delay_hours: delay,
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid fixture date")
}
