use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ModelError {
    #[error("unknown question id `{0}`")]
    UnknownQuestion(String),
}

/// Survey questions the dashboard aggregates. Q1..Q4 are demographic and
/// live on the respondent row, so they never show up as responses here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QuestionId {
    Nps,
    Wayfinding,
    Trophies,
    Frustrations,
    Vibe,
    Preferences,
}

impl QuestionId {
    pub fn code(self) -> &'static str {
        match self {
            QuestionId::Nps => "Q5",
            QuestionId::Wayfinding => "Q6",
            QuestionId::Trophies => "Q7",
            QuestionId::Frustrations => "Q8",
            QuestionId::Vibe => "Q9",
            QuestionId::Preferences => "Q10",
        }
    }

    fn answer_kind(self) -> AnswerKind {
        match self {
            QuestionId::Nps | QuestionId::Wayfinding => AnswerKind::Numeric,
            QuestionId::Vibe => AnswerKind::Choice,
            QuestionId::Trophies | QuestionId::Frustrations | QuestionId::Preferences => {
                AnswerKind::Selections
            }
        }
    }
}

impl FromStr for QuestionId {
    type Err = ModelError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "Q5" => Ok(QuestionId::Nps),
            "Q6" => Ok(QuestionId::Wayfinding),
            "Q7" => Ok(QuestionId::Trophies),
            "Q8" => Ok(QuestionId::Frustrations),
            "Q9" => Ok(QuestionId::Vibe),
            "Q10" => Ok(QuestionId::Preferences),
            other => Err(ModelError::UnknownQuestion(other.to_string())),
        }
    }
}

impl fmt::Display for QuestionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

enum AnswerKind {
    Numeric,
    Choice,
    Selections,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Answer {
    Numeric(i32),
    Choice(String),
    Selections(Vec<String>),
    Missing,
}

impl Answer {
    /// Builds the answer from the three nullable store columns, reading only
    /// the column that belongs to `question`.
    pub fn from_columns(
        question: QuestionId,
        numeric: Option<i32>,
        value: Option<String>,
        array: Option<&serde_json::Value>,
    ) -> Self {
        match question.answer_kind() {
            AnswerKind::Numeric => numeric.map(Answer::Numeric).unwrap_or(Answer::Missing),
            AnswerKind::Choice => match value {
                Some(text) if !text.is_empty() => Answer::Choice(text),
                _ => Answer::Missing,
            },
            AnswerKind::Selections => match array {
                Some(serde_json::Value::Array(items)) => Answer::Selections(
                    items
                        .iter()
                        .filter_map(|item| item.as_str().map(str::to_string))
                        .collect(),
                ),
                _ => Answer::Missing,
            },
        }
    }

    pub fn numeric(&self) -> Option<i32> {
        match self {
            Answer::Numeric(score) => Some(*score),
            _ => None,
        }
    }

    pub fn choice(&self) -> Option<&str> {
        match self {
            Answer::Choice(text) => Some(text),
            _ => None,
        }
    }

    pub fn selections(&self) -> Option<&[String]> {
        match self {
            Answer::Selections(items) => Some(items),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ResponseRecord {
    pub response_id: Uuid,
    pub event_id: Option<Uuid>,
    pub respondent_id: Option<Uuid>,
    pub question: QuestionId,
    pub answer: Answer,
    pub answered_at: Option<DateTime<Utc>>,
}

/// A `fct_response` row as the store hands it over.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub response_id: Uuid,
    pub event_id: Option<Uuid>,
    pub respondent_id: Option<Uuid>,
    pub question_id: String,
    pub answer_numeric: Option<i32>,
    pub answer_value: Option<String>,
    pub answer_array: Option<serde_json::Value>,
    pub answered_at: Option<DateTime<Utc>>,
}

impl TryFrom<RawResponse> for ResponseRecord {
    type Error = ModelError;

    fn try_from(raw: RawResponse) -> Result<Self, Self::Error> {
        let question: QuestionId = raw.question_id.parse()?;
        let answer = Answer::from_columns(
            question,
            raw.answer_numeric,
            raw.answer_value,
            raw.answer_array.as_ref(),
        );

        Ok(ResponseRecord {
            response_id: raw.response_id,
            event_id: raw.event_id,
            respondent_id: raw.respondent_id,
            question,
            answer,
            answered_at: raw.answered_at,
        })
    }
}

/// Converts raw rows, dropping the ones whose question the dashboard does
/// not aggregate. Returns the records and the number dropped.
pub fn convert_responses(rows: Vec<RawResponse>) -> (Vec<ResponseRecord>, usize) {
    let mut records = Vec::with_capacity(rows.len());
    let mut skipped = 0usize;

    for raw in rows {
        match ResponseRecord::try_from(raw) {
            Ok(record) => records.push(record),
            Err(err) => {
                tracing::debug!(%err, "skipping response row");
                skipped += 1;
            }
        }
    }

    (records, skipped)
}

#[derive(Debug, Clone)]
pub struct RespondentRecord {
    pub respondent_id: Uuid,
    pub gender: Option<String>,
    pub age_band: Option<String>,
    pub transport_mode: Option<String>,
}

#[derive(Debug, Clone)]
pub struct EventRecord {
    pub event_id: Uuid,
    pub event_code: String,
    pub name: String,
    pub event_type: String,
    pub event_date: NaiveDate,
    pub capacity: Option<i32>,
}

#[derive(Debug, Clone, Default)]
pub struct CollectionQualityRecord {
    pub event_id: Option<Uuid>,
    pub invites_sent: u32,
    pub responses_total: u32,
    pub complete_responses: u32,
    pub sent_delay_hours: f64,
}

/// Converts a nullable store count into the engine's non-negative count.
pub fn non_negative(value: Option<i32>) -> u32 {
    value.and_then(|v| u32::try_from(v).ok()).unwrap_or(0)
}

/// Everything one dashboard query hands to the engine.
#[derive(Debug, Clone, Default)]
pub struct DashboardInput {
    pub events: Vec<EventRecord>,
    pub respondents: Vec<RespondentRecord>,
    pub responses: Vec<ResponseRecord>,
    pub quality: Vec<CollectionQualityRecord>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn question_codes_parse_both_ways() {
        for code in ["Q5", "Q6", "Q7", "Q8", "Q9", "Q10"] {
            let question: QuestionId = code.parse().unwrap();
            assert_eq!(question.code(), code);
        }
        assert_eq!(
            "Q3".parse::<QuestionId>(),
            Err(ModelError::UnknownQuestion("Q3".to_string()))
        );
    }

    #[test]
    fn answer_reads_only_the_column_of_its_question() {
        let array = json!(["Rock"]);
        assert_eq!(
            Answer::from_columns(QuestionId::Nps, Some(9), Some("x".into()), Some(&array)),
            Answer::Numeric(9)
        );
        assert_eq!(
            Answer::from_columns(QuestionId::Vibe, Some(9), Some("Talvez volte".into()), None),
            Answer::Choice("Talvez volte".to_string())
        );
        assert_eq!(
            Answer::from_columns(QuestionId::Preferences, Some(9), None, Some(&array)),
            Answer::Selections(vec!["Rock".to_string()])
        );
    }

    #[test]
    fn empty_or_malformed_columns_are_missing() {
        assert_eq!(
            Answer::from_columns(QuestionId::Wayfinding, None, None, None),
            Answer::Missing
        );
        assert_eq!(
            Answer::from_columns(QuestionId::Vibe, None, Some(String::new()), None),
            Answer::Missing
        );
        let object = json!({"label": "Rock"});
        assert_eq!(
            Answer::from_columns(QuestionId::Trophies, None, None, Some(&object)),
            Answer::Missing
        );
        let mixed = json!(["Som", 3, null, "Luz"]);
        assert_eq!(
            Answer::from_columns(QuestionId::Trophies, None, None, Some(&mixed)),
            Answer::Selections(vec!["Som".to_string(), "Luz".to_string()])
        );
    }

    fn raw(question_id: &str, numeric: Option<i32>) -> RawResponse {
        RawResponse {
            response_id: Uuid::new_v4(),
            event_id: Some(Uuid::new_v4()),
            respondent_id: None,
            question_id: question_id.to_string(),
            answer_numeric: numeric,
            answer_value: None,
            answer_array: None,
            answered_at: None,
        }
    }

    #[test]
    fn conversion_drops_unaggregated_questions() {
        let rows = vec![raw("Q5", Some(9)), raw("Q1", None), raw("Q6", Some(2))];
        let (records, skipped) = convert_responses(rows);
        assert_eq!(skipped, 1);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].question, QuestionId::Nps);
        assert_eq!(records[1].answer, Answer::Numeric(2));
    }

    #[test]
    fn negative_counts_load_as_zero() {
        assert_eq!(non_negative(Some(-4)), 0);
        assert_eq!(non_negative(None), 0);
        assert_eq!(non_negative(Some(250)), 250);
    }
}
