use std::collections::hash_map::Entry;
use std::collections::HashMap;

use serde::Serialize;
use uuid::Uuid;

use crate::models::{QuestionId, ResponseRecord};
use crate::scores::{is_positive_vibe, percent};

/// "High NPS" in the matrix means satisfied (7+), looser than the promoter
/// cutoff of the headline score. Keep the two constants separate.
pub const HIGH_NPS_MIN: i32 = 7;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct QuadrantCell {
    pub count: usize,
    pub percentage: i32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct QuadrantMatrix {
    #[serde(rename = "highVibeHighNPS")]
    pub high_vibe_high_nps: QuadrantCell,
    #[serde(rename = "highVibeLowNPS")]
    pub high_vibe_low_nps: QuadrantCell,
    #[serde(rename = "lowVibeHighNPS")]
    pub low_vibe_high_nps: QuadrantCell,
    #[serde(rename = "lowVibeLowNPS")]
    pub low_vibe_low_nps: QuadrantCell,
}

impl QuadrantMatrix {
    pub fn cell_mut(&mut self, high_nps: bool, high_vibe: bool) -> &mut QuadrantCell {
        match (high_vibe, high_nps) {
            (true, true) => &mut self.high_vibe_high_nps,
            (true, false) => &mut self.high_vibe_low_nps,
            (false, true) => &mut self.low_vibe_high_nps,
            (false, false) => &mut self.low_vibe_low_nps,
        }
    }

    pub fn cells(&self) -> [(&'static str, QuadrantCell); 4] {
        [
            ("High vibe / high NPS", self.high_vibe_high_nps),
            ("High vibe / low NPS", self.high_vibe_low_nps),
            ("Low vibe / high NPS", self.low_vibe_high_nps),
            ("Low vibe / low NPS", self.low_vibe_low_nps),
        ]
    }

    pub fn total(&self) -> usize {
        self.cells().iter().map(|(_, cell)| cell.count).sum()
    }
}

/// Cross-tabulates respondents who answered both Q5 and Q9. Each respondent
/// is classified once, from their first answer to each question.
pub fn calculate_matrix(responses: &[ResponseRecord]) -> QuadrantMatrix {
    let mut first_nps: HashMap<Uuid, Option<i32>> = HashMap::new();
    let mut first_vibe: HashMap<Uuid, Option<&str>> = HashMap::new();
    let mut order: Vec<Uuid> = Vec::new();

    for response in responses {
        let Some(respondent_id) = response.respondent_id else {
            continue;
        };
        match response.question {
            QuestionId::Nps => {
                if let Entry::Vacant(slot) = first_nps.entry(respondent_id) {
                    slot.insert(response.answer.numeric());
                    order.push(respondent_id);
                }
            }
            QuestionId::Vibe => {
                first_vibe
                    .entry(respondent_id)
                    .or_insert_with(|| response.answer.choice());
            }
            _ => {}
        }
    }

    let mut matrix = QuadrantMatrix::default();
    let mut classified = 0usize;

    for respondent_id in order {
        let Some(vibe) = first_vibe.get(&respondent_id) else {
            continue;
        };
        let nps = first_nps.get(&respondent_id).copied().flatten();
        let high_nps = nps.is_some_and(|score| score >= HIGH_NPS_MIN);
        let high_vibe = vibe.is_some_and(|answer| is_positive_vibe(answer));
        matrix.cell_mut(high_nps, high_vibe).count += 1;
        classified += 1;
    }

    for cell in [
        &mut matrix.high_vibe_high_nps,
        &mut matrix.high_vibe_low_nps,
        &mut matrix.low_vibe_high_nps,
        &mut matrix.low_vibe_low_nps,
    ] {
        cell.percentage = percent(cell.count, classified);
    }

    tracing::debug!(classified, "quadrant matrix built");
    matrix
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{by, nps, vibe};
    use crate::models::Answer;
    use crate::scores::PROMOTER_MIN;
    use proptest::prelude::*;

    const YES: &str = "Com certeza voltarei";
    const MAYBE: &str = "Talvez volte";

    #[test]
    fn empty_matrix_is_all_zero() {
        assert_eq!(calculate_matrix(&[]), QuadrantMatrix::default());
    }

    #[test]
    fn classifies_respondents_into_quadrants() {
        let (a, b, c, d) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        let responses = vec![
            by(a, nps(10)),
            by(a, vibe(YES)),
            by(b, nps(3)),
            by(b, vibe(YES)),
            by(c, nps(8)),
            by(c, vibe(MAYBE)),
            by(d, nps(0)),
            by(d, vibe(MAYBE)),
        ];
        let matrix = calculate_matrix(&responses);
        for (_, cell) in matrix.cells() {
            assert_eq!(cell.count, 1);
            assert_eq!(cell.percentage, 25);
        }
    }

    #[test]
    fn high_nps_cutoff_is_looser_than_promoter_cutoff() {
        assert_eq!(HIGH_NPS_MIN, 7);
        assert_eq!(PROMOTER_MIN, 9);

        let respondent = Uuid::new_v4();
        let responses = vec![by(respondent, nps(7)), by(respondent, vibe(YES))];
        let matrix = calculate_matrix(&responses);
        assert_eq!(matrix.high_vibe_high_nps.count, 1);
        assert_eq!(matrix.high_vibe_high_nps.percentage, 100);
    }

    #[test]
    fn only_respondents_answering_both_are_counted_once() {
        let both = Uuid::new_v4();
        let nps_only = Uuid::new_v4();
        let vibe_only = Uuid::new_v4();
        let responses = vec![
            by(both, nps(9)),
            by(both, nps(2)),
            by(both, vibe(MAYBE)),
            by(both, vibe(YES)),
            by(nps_only, nps(10)),
            by(vibe_only, vibe(YES)),
        ];
        let matrix = calculate_matrix(&responses);
        assert_eq!(matrix.total(), 1);
        assert_eq!(matrix.low_vibe_high_nps.count, 1);
    }

    #[test]
    fn missing_answers_classify_as_low() {
        let respondent = Uuid::new_v4();
        let responses = vec![
            by(respondent, crate::fixtures::response(QuestionId::Nps, Answer::Missing)),
            by(respondent, crate::fixtures::response(QuestionId::Vibe, Answer::Missing)),
        ];
        let matrix = calculate_matrix(&responses);
        assert_eq!(matrix.low_vibe_low_nps.count, 1);
    }

    proptest! {
        #[test]
        fn matrix_counts_each_respondent_answering_both(
            answers in prop::collection::vec(
                (prop::option::of(0i32..=10), prop::option::of(any::<bool>())),
                0..100,
            ),
        ) {
            let mut responses = Vec::new();
            for (index, (score, positive)) in answers.iter().enumerate() {
                let respondent = Uuid::from_u128(index as u128 + 1);
                if let Some(score) = score {
                    responses.push(by(respondent, nps(*score)));
                    responses.push(by(respondent, nps(10 - *score)));
                }
                if let Some(positive) = positive {
                    responses.push(by(respondent, vibe(if *positive { YES } else { MAYBE })));
                }
            }
            let both = answers
                .iter()
                .filter(|(score, positive)| score.is_some() && positive.is_some())
                .count();

            let matrix = calculate_matrix(&responses);
            prop_assert_eq!(matrix.total(), both);
            for (_, cell) in matrix.cells() {
                prop_assert!(cell.count <= both);
                prop_assert!((0..=100).contains(&cell.percentage));
            }
        }
    }
}
