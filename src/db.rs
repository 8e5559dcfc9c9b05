use anyhow::Context;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::filters::{self, DashboardFilters};
use crate::models::{
    self, CollectionQualityRecord, DashboardInput, EventRecord, RawResponse, RespondentRecord,
    ResponseRecord,
};

pub async fn fetch_events(
    pool: &PgPool,
    filters: &DashboardFilters,
) -> anyhow::Result<Vec<EventRecord>> {
    let mut query = String::from(
        "SELECT event_id, event_code, name, event_type, event_date, capacity \
         FROM dim_event \
         WHERE TRUE",
    );

    let range = filters.date_range.unwrap_or_default();
    let mut param = 0;
    if range.from.is_some() {
        param += 1;
        query.push_str(&format!(" AND event_date >= ${param}"));
    }
    if range.to.is_some() {
        param += 1;
        query.push_str(&format!(" AND event_date <= ${param}"));
    }
    if filters.event_type.is_some() {
        param += 1;
        query.push_str(&format!(" AND event_type = ${param}"));
    }
    query.push_str(" ORDER BY event_date, event_code");

    let mut rows = sqlx::query(&query);
    if let Some(from) = range.from {
        rows = rows.bind(from);
    }
    if let Some(to) = range.to {
        rows = rows.bind(to);
    }
    if let Some(event_type) = filters.event_type.as_deref() {
        rows = rows.bind(event_type);
    }

    let records = rows
        .fetch_all(pool)
        .await
        .context("failed to fetch events")?;

    let events = records
        .into_iter()
        .map(|row| EventRecord {
            event_id: row.get("event_id"),
            event_code: row.get("event_code"),
            name: row.get("name"),
            event_type: row.get("event_type"),
            event_date: row.get("event_date"),
            capacity: row.get("capacity"),
        })
        .collect();

    Ok(events)
}

pub async fn fetch_responses(
    pool: &PgPool,
    event_ids: &[Uuid],
) -> anyhow::Result<Vec<ResponseRecord>> {
    if event_ids.is_empty() {
        return Ok(Vec::new());
    }

    let records = sqlx::query(
        r#"
        SELECT response_id, event_id, respondent_id, question_id,
               answer_numeric::int4 AS answer_numeric, answer_value, answer_array, answered_at
        FROM fct_response
        WHERE event_id = ANY($1)
        ORDER BY answered_at NULLS LAST, response_id
        "#,
    )
    .bind(event_ids)
    .fetch_all(pool)
    .await
    .context("failed to fetch responses")?;

    let rows: Vec<RawResponse> = records
        .into_iter()
        .map(|row| RawResponse {
            response_id: row.get("response_id"),
            event_id: row.get("event_id"),
            respondent_id: row.get("respondent_id"),
            question_id: row.get("question_id"),
            answer_numeric: row.get("answer_numeric"),
            answer_value: row.get("answer_value"),
            answer_array: row.get("answer_array"),
            answered_at: row.get("answered_at"),
        })
        .collect();

    let (responses, skipped) = models::convert_responses(rows);
    if skipped > 0 {
        tracing::warn!(skipped, "ignored responses to questions outside the dashboard");
    }
    Ok(responses)
}

pub async fn fetch_respondents(
    pool: &PgPool,
    event_ids: &[Uuid],
) -> anyhow::Result<Vec<RespondentRecord>> {
    if event_ids.is_empty() {
        return Ok(Vec::new());
    }

    let records = sqlx::query(
        r#"
        SELECT DISTINCT r.respondent_id, r.gender, r.age_band, r.transport_mode
        FROM dim_respondent r
        JOIN fct_response f ON f.respondent_id = r.respondent_id
        WHERE f.event_id = ANY($1)
        "#,
    )
    .bind(event_ids)
    .fetch_all(pool)
    .await
    .context("failed to fetch respondents")?;

    Ok(records
        .into_iter()
        .map(|row| RespondentRecord {
            respondent_id: row.get("respondent_id"),
            gender: row.get("gender"),
            age_band: row.get("age_band"),
            transport_mode: row.get("transport_mode"),
        })
        .collect())
}

pub async fn fetch_collection_quality(
    pool: &PgPool,
    event_ids: &[Uuid],
) -> anyhow::Result<Vec<CollectionQualityRecord>> {
    if event_ids.is_empty() {
        return Ok(Vec::new());
    }

    let records = sqlx::query(
        r#"
        SELECT event_id,
               invites_sent::int4 AS invites_sent,
               responses_total::int4 AS responses_total,
               complete_responses::int4 AS complete_responses,
               sent_delay_hours::float8 AS sent_delay_hours
        FROM fct_collection_quality
        WHERE event_id = ANY($1)
        "#,
    )
    .bind(event_ids)
    .fetch_all(pool)
    .await
    .context("failed to fetch collection quality")?;

    Ok(records
        .into_iter()
        .map(|row| CollectionQualityRecord {
            event_id: row.get("event_id"),
            invites_sent: models::non_negative(row.get("invites_sent")),
            responses_total: models::non_negative(row.get("responses_total")),
            complete_responses: models::non_negative(row.get("complete_responses")),
            sent_delay_hours: row
                .get::<Option<f64>, _>("sent_delay_hours")
                .unwrap_or(0.0),
        })
        .collect())
}

/// Fetches everything one dashboard query needs. Date and event-type filters
/// run in SQL; respondent filters run in memory.
pub async fn load_dashboard_input(
    pool: &PgPool,
    filters: &DashboardFilters,
) -> anyhow::Result<DashboardInput> {
    let events = fetch_events(pool, filters).await?;
    if events.is_empty() {
        tracing::info!("no events match the filters");
        return Ok(DashboardInput::default());
    }

    let event_ids: Vec<Uuid> = events.iter().map(|event| event.event_id).collect();
    let responses = fetch_responses(pool, &event_ids).await?;
    let respondents = fetch_respondents(pool, &event_ids).await?;
    let quality = fetch_collection_quality(pool, &event_ids).await?;

    tracing::info!(
        events = events.len(),
        responses = responses.len(),
        respondents = respondents.len(),
        "loaded dashboard rows"
    );

    let raw = DashboardInput {
        events,
        respondents,
        responses,
        quality,
    };
    Ok(filters::apply(&raw, filters))
}

pub async fn count_responses(pool: &PgPool) -> anyhow::Result<u64> {
    let total: i64 = sqlx::query("SELECT COUNT(*) AS total FROM fct_response")
        .fetch_one(pool)
        .await
        .context("failed to count responses")?
        .get("total");

    Ok(u64::try_from(total).unwrap_or(0))
}
