use std::collections::{HashMap, HashSet};

use serde::Serialize;

use crate::models::{QuestionId, ResponseRecord};
use crate::scores::percent;

pub const DRIVER_DISPLAY_LIMIT: usize = 10;
pub const PREFERENCE_DISPLAY_LIMIT: usize = 20;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RankedItem {
    pub label: String,
    pub count: usize,
    pub total: usize,
    pub percentage: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Drivers {
    pub trophies: Vec<RankedItem>,
    pub frustrations: Vec<RankedItem>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PreferenceCount {
    pub label: String,
    pub count: usize,
}

/// Label counts in first-seen order, plus the number of responses that
/// carried a selection list. A label repeated inside one response counts once.
struct SelectionTally {
    labels: Vec<(String, usize)>,
    responses: usize,
}

fn tally_selections(responses: &[ResponseRecord], question: QuestionId) -> SelectionTally {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut labels: Vec<(String, usize)> = Vec::new();
    let mut answered = 0usize;

    for items in responses
        .iter()
        .filter(|r| r.question == question)
        .filter_map(|r| r.answer.selections())
    {
        answered += 1;
        let mut seen_here: HashSet<&str> = HashSet::new();
        for item in items {
            if !seen_here.insert(item.as_str()) {
                continue;
            }
            match index.get(item.as_str()) {
                Some(&slot) => labels[slot].1 += 1,
                None => {
                    index.insert(item.as_str(), labels.len());
                    labels.push((item.clone(), 1));
                }
            }
        }
    }

    SelectionTally {
        labels,
        responses: answered,
    }
}

/// Ranks the labels of a multi-select question by the share of its
/// responses that picked them. Shares can add up past 100.
pub fn rank_selections(responses: &[ResponseRecord], question: QuestionId) -> Vec<RankedItem> {
    let tally = tally_selections(responses, question);
    let total = tally.responses.max(1);

    let mut ranked: Vec<RankedItem> = tally
        .labels
        .into_iter()
        .map(|(label, count)| RankedItem {
            label,
            count,
            total,
            percentage: percent(count, total),
        })
        .collect();

    ranked.sort_by(|a, b| b.percentage.cmp(&a.percentage));
    ranked
}

pub fn calculate_drivers(responses: &[ResponseRecord]) -> Drivers {
    Drivers {
        trophies: rank_selections(responses, QuestionId::Trophies),
        frustrations: rank_selections(responses, QuestionId::Frustrations),
    }
}

pub fn calculate_preferences(responses: &[ResponseRecord]) -> Vec<PreferenceCount> {
    let mut preferences: Vec<PreferenceCount> =
        tally_selections(responses, QuestionId::Preferences)
            .labels
            .into_iter()
            .map(|(label, count)| PreferenceCount { label, count })
            .collect();

    preferences.sort_by(|a, b| b.count.cmp(&a.count));
    preferences
}

pub fn top<T>(items: &[T], limit: usize) -> &[T] {
    &items[..items.len().min(limit)]
}

/// Case-insensitive substring match on the label, truncated to `limit`.
pub fn search_preferences<'a>(
    preferences: &'a [PreferenceCount],
    term: &str,
    limit: usize,
) -> Vec<&'a PreferenceCount> {
    let needle = term.to_lowercase();
    preferences
        .iter()
        .filter(|p| p.label.to_lowercase().contains(&needle))
        .take(limit)
        .collect()
}
