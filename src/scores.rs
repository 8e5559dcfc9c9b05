use serde::Serialize;

use crate::models::{QuestionId, ResponseRecord};

pub const PROMOTER_MIN: i32 = 9;
pub const DETRACTOR_MAX: i32 = 6;
pub const EASY_MAX: i32 = 2;
pub const DIFFICULT_MIN: i32 = 4;
pub const WAYFINDING_SCALE: [i32; 5] = [1, 2, 3, 4, 5];

/// The two top return-intention answers of Q9.
pub const POSITIVE_VIBES: [&str; 2] = [
    "Já adquiri ingresso para próximo evento",
    "Com certeza voltarei",
];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NpsScore {
    pub value: i32,
    pub promoters: i32,
    pub detractors: i32,
    pub responses: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NetEaseScore {
    pub value: i32,
    pub easy: i32,
    pub difficult: i32,
    pub responses: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VibeScore {
    pub value: i32,
    pub positive: usize,
    pub responses: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreBucket {
    pub label: String,
    pub count: usize,
    pub percentage: i32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NpsPartition {
    pub promoters: usize,
    pub passives: usize,
    pub detractors: usize,
}

impl NpsPartition {
    pub fn total(&self) -> usize {
        self.promoters + self.passives + self.detractors
    }
}

/// Rounds halves toward positive infinity, so -2.5 becomes -2.
pub fn round_half_up(value: f64) -> i32 {
    (value + 0.5).floor() as i32
}

/// `round(count / total * 100)` with an empty denominator treated as 1.
pub fn percent(count: usize, total: usize) -> i32 {
    let total = total.max(1);
    round_half_up(count as f64 / total as f64 * 100.0)
}

fn net_percent(positive: usize, negative: usize, total: usize) -> i32 {
    let total = total.max(1);
    round_half_up((positive as f64 - negative as f64) / total as f64 * 100.0)
}

pub fn numeric_answers(
    responses: &[ResponseRecord],
    question: QuestionId,
) -> impl Iterator<Item = i32> + '_ {
    responses
        .iter()
        .filter(move |r| r.question == question)
        .filter_map(|r| r.answer.numeric())
}

pub fn is_positive_vibe(answer: &str) -> bool {
    POSITIVE_VIBES.iter().any(|positive| *positive == answer)
}

pub fn nps_partition(responses: &[ResponseRecord]) -> NpsPartition {
    let mut partition = NpsPartition::default();
    for score in numeric_answers(responses, QuestionId::Nps) {
        if score >= PROMOTER_MIN {
            partition.promoters += 1;
        } else if score <= DETRACTOR_MAX {
            partition.detractors += 1;
        } else {
            partition.passives += 1;
        }
    }
    partition
}

pub fn calculate_nps(responses: &[ResponseRecord]) -> NpsScore {
    let partition = nps_partition(responses);
    let total = partition.total();

    NpsScore {
        value: net_percent(partition.promoters, partition.detractors, total),
        promoters: percent(partition.promoters, total),
        detractors: percent(partition.detractors, total),
        responses: total,
    }
}

pub fn calculate_net_ease(responses: &[ResponseRecord]) -> NetEaseScore {
    let mut easy = 0usize;
    let mut difficult = 0usize;
    let mut total = 0usize;

    for score in numeric_answers(responses, QuestionId::Wayfinding) {
        total += 1;
        if score <= EASY_MAX {
            easy += 1;
        } else if score >= DIFFICULT_MIN {
            difficult += 1;
        }
    }

    NetEaseScore {
        value: net_percent(easy, difficult, total),
        easy: percent(easy, total),
        difficult: percent(difficult, total),
        responses: total,
    }
}

pub fn calculate_vibe(responses: &[ResponseRecord]) -> VibeScore {
    let answers: Vec<&str> = responses
        .iter()
        .filter(|r| r.question == QuestionId::Vibe)
        .filter_map(|r| r.answer.choice())
        .collect();
    let positive = answers.iter().filter(|a| is_positive_vibe(a)).count();

    VibeScore {
        value: percent(positive, answers.len()),
        positive,
        responses: answers.len(),
    }
}

/// Count and share of each point on the 1-5 ease scale. Answers outside the
/// scale still count toward the denominator.
pub fn wayfinding_distribution(responses: &[ResponseRecord]) -> Vec<ScoreBucket> {
    let scores: Vec<i32> = numeric_answers(responses, QuestionId::Wayfinding).collect();

    WAYFINDING_SCALE
        .iter()
        .map(|&point| {
            let count = scores.iter().filter(|&&s| s == point).count();
            let percentage = if scores.is_empty() {
                0
            } else {
                percent(count, scores.len())
            };
            ScoreBucket {
                label: point.to_string(),
                count,
                percentage,
            }
        })
        .collect()
}
