//! Offline source: CSV exports of the four store tables, one file each,
//! headers named after the store columns.

use std::path::Path;

use anyhow::Context;
use chrono::{DateTime, NaiveDate, Utc};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use uuid::Uuid;

use crate::models::{
    self, CollectionQualityRecord, DashboardInput, EventRecord, RawResponse, RespondentRecord,
};

pub const EVENTS_FILE: &str = "events.csv";
pub const RESPONDENTS_FILE: &str = "respondents.csv";
pub const RESPONSES_FILE: &str = "responses.csv";
pub const QUALITY_FILE: &str = "collection_quality.csv";

#[derive(Deserialize)]
struct EventRow {
    event_id: Uuid,
    event_code: String,
    name: String,
    event_type: String,
    event_date: NaiveDate,
    capacity: Option<i32>,
}

#[derive(Deserialize)]
struct RespondentRow {
    respondent_id: Uuid,
    gender: Option<String>,
    age_band: Option<String>,
    transport_mode: Option<String>,
}

#[derive(Deserialize)]
struct ResponseRow {
    response_id: Uuid,
    event_id: Option<Uuid>,
    respondent_id: Option<Uuid>,
    question_id: String,
    answer_numeric: Option<i32>,
    answer_value: Option<String>,
    answer_array: Option<String>,
    answered_at: Option<DateTime<Utc>>,
}

#[derive(Deserialize)]
struct QualityRow {
    event_id: Option<Uuid>,
    invites_sent: Option<i32>,
    responses_total: Option<i32>,
    complete_responses: Option<i32>,
    sent_delay_hours: Option<f64>,
}

fn read_rows<T: DeserializeOwned>(path: &Path) -> anyhow::Result<Vec<T>> {
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("failed to open {}", path.display()))?;
    let mut rows = Vec::new();
    for (line, result) in reader.deserialize::<T>().enumerate() {
        let row = result.with_context(|| format!("bad row {} in {}", line + 2, path.display()))?;
        rows.push(row);
    }
    Ok(rows)
}

fn read_optional_rows<T: DeserializeOwned>(path: &Path) -> anyhow::Result<Vec<T>> {
    if !path.exists() {
        tracing::warn!(path = %path.display(), "export file missing, treating as empty");
        return Ok(Vec::new());
    }
    read_rows(path)
}

/// Parses the JSON text of an `answer_array` cell. Text that is not JSON
/// becomes a missing answer rather than an error.
fn parse_answer_array(cell: Option<String>) -> Option<serde_json::Value> {
    let text = cell?;
    if text.trim().is_empty() {
        return None;
    }
    match serde_json::from_str(&text) {
        Ok(value) => Some(value),
        Err(err) => {
            tracing::debug!(%err, "answer_array is not JSON");
            None
        }
    }
}

/// Rows in the responses export, every question included, as the store's
/// `count(*)` would see them.
pub fn count_response_rows(dir: &Path) -> anyhow::Result<u64> {
    let rows = read_rows::<ResponseRow>(&dir.join(RESPONSES_FILE))?;
    Ok(rows.len() as u64)
}

pub fn load_export_dir(dir: &Path) -> anyhow::Result<DashboardInput> {
    let events: Vec<EventRecord> = read_rows::<EventRow>(&dir.join(EVENTS_FILE))?
        .into_iter()
        .map(|row| EventRecord {
            event_id: row.event_id,
            event_code: row.event_code,
            name: row.name,
            event_type: row.event_type,
            event_date: row.event_date,
            capacity: row.capacity,
        })
        .collect();

    let respondents: Vec<RespondentRecord> =
        read_optional_rows::<RespondentRow>(&dir.join(RESPONDENTS_FILE))?
            .into_iter()
            .map(|row| RespondentRecord {
                respondent_id: row.respondent_id,
                gender: row.gender,
                age_band: row.age_band,
                transport_mode: row.transport_mode,
            })
            .collect();

    let raw: Vec<RawResponse> = read_rows::<ResponseRow>(&dir.join(RESPONSES_FILE))?
        .into_iter()
        .map(|row| RawResponse {
            response_id: row.response_id,
            event_id: row.event_id,
            respondent_id: row.respondent_id,
            question_id: row.question_id,
            answer_numeric: row.answer_numeric,
            answer_value: row.answer_value,
            answer_array: parse_answer_array(row.answer_array),
            answered_at: row.answered_at,
        })
        .collect();
    let (responses, skipped) = models::convert_responses(raw);
    if skipped > 0 {
        tracing::warn!(skipped, "ignored responses to questions outside the dashboard");
    }

    let quality: Vec<CollectionQualityRecord> =
        read_optional_rows::<QualityRow>(&dir.join(QUALITY_FILE))?
            .into_iter()
            .map(|row| CollectionQualityRecord {
                event_id: row.event_id,
                invites_sent: models::non_negative(row.invites_sent),
                responses_total: models::non_negative(row.responses_total),
                complete_responses: models::non_negative(row.complete_responses),
                sent_delay_hours: row.sent_delay_hours.unwrap_or(0.0),
            })
            .collect();

    tracing::info!(
        dir = %dir.display(),
        events = events.len(),
        responses = responses.len(),
        "loaded export"
    );

    Ok(DashboardInput {
        events,
        respondents,
        responses,
        quality,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Answer, QuestionId};

    const EVENT: &str = "6f1c4a52-3b8e-4c1f-9a55-0d7b2a9e1c11";
    const RESPONDENT: &str = "0c22f1f1-9184-4fd4-9b21-28c68a6a89dc";

    fn write(dir: &Path, name: &str, body: &str) {
        std::fs::write(dir.join(name), body).unwrap();
    }

    fn write_required(dir: &Path) {
        write(
            dir,
            EVENTS_FILE,
            &format!(
                "event_id,event_code,name,event_type,event_date,capacity\n\
                 {EVENT},EVT001,Evento 1,futebol,2026-03-14,\n"
            ),
        );
        write(
            dir,
            RESPONSES_FILE,
            &format!(
                "response_id,event_id,respondent_id,question_id,answer_numeric,answer_value,answer_array,answered_at\n\
                 3d7f5d6f-24f7-4e8e-8b4b-3e7e44b4a7b2,{EVENT},{RESPONDENT},Q5,9,,,2026-03-15T10:00:00Z\n\
                 d5a0a1a2-2a3c-44c2-8f73-60b7897a9dd2,{EVENT},{RESPONDENT},Q7,,,\"[\"\"Segurança do local\"\",\"\"Acessibilidade\"\"]\",\n\
                 8b0e3f9c-1d2a-4e5f-9a6b-7c8d9e0f1a2b,{EVENT},,Q2,,Feminino,,\n"
            ),
        );
    }

    #[test]
    fn loads_required_files_and_tolerates_missing_optional_ones() {
        let dir = tempfile::tempdir().unwrap();
        write_required(dir.path());

        let input = load_export_dir(dir.path()).unwrap();
        assert_eq!(input.events.len(), 1);
        assert_eq!(input.events[0].capacity, None);
        assert!(input.respondents.is_empty());
        assert!(input.quality.is_empty());

        assert_eq!(input.responses.len(), 2);
        assert_eq!(input.responses[0].answer, Answer::Numeric(9));
        assert!(input.responses[0].answered_at.is_some());
        assert_eq!(input.responses[1].question, QuestionId::Trophies);
        assert_eq!(
            input.responses[1].answer,
            Answer::Selections(vec![
                "Segurança do local".to_string(),
                "Acessibilidade".to_string()
            ])
        );
    }

    #[test]
    fn reads_quality_and_respondents_when_present() {
        let dir = tempfile::tempdir().unwrap();
        write_required(dir.path());
        write(
            dir.path(),
            RESPONDENTS_FILE,
            &format!("respondent_id,gender,age_band,transport_mode\n{RESPONDENT},Feminino,25-34,\n"),
        );
        write(
            dir.path(),
            QUALITY_FILE,
            &format!(
                "event_id,invites_sent,responses_total,complete_responses,sent_delay_hours\n\
                 {EVENT},1000,250,200,18\n"
            ),
        );

        let input = load_export_dir(dir.path()).unwrap();
        assert_eq!(input.respondents[0].transport_mode, None);
        assert_eq!(input.quality[0].invites_sent, 1000);
        assert_eq!(input.quality[0].sent_delay_hours, 18.0);
    }

    #[test]
    fn response_row_count_includes_demographic_questions() {
        let dir = tempfile::tempdir().unwrap();
        write_required(dir.path());
        assert_eq!(count_response_rows(dir.path()).unwrap(), 3);
        assert_eq!(load_export_dir(dir.path()).unwrap().responses.len(), 2);
    }

    #[test]
    fn missing_responses_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            EVENTS_FILE,
            "event_id,event_code,name,event_type,event_date,capacity\n",
        );
        let err = load_export_dir(dir.path()).unwrap_err();
        assert!(err.to_string().contains(RESPONSES_FILE));
    }

    #[test]
    fn non_json_array_cell_is_missing() {
        assert_eq!(parse_answer_array(Some("Rock, Pop".to_string())), None);
        assert_eq!(parse_answer_array(Some("  ".to_string())), None);
        assert!(parse_answer_array(Some("[\"Rock\"]".to_string())).is_some());
    }
}
