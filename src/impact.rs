use serde::Serialize;

pub const RESPONSES_PER_TREE: u64 = 100;
pub const CO2_KG_PER_TREE: u64 = 22;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Impact {
    pub responses: u64,
    pub trees_planted: u64,
    pub co2_offset_kg: u64,
    pub responses_to_next_tree: u64,
}

impl Impact {
    pub fn from_responses(responses: u64) -> Self {
        let trees_planted = responses / RESPONSES_PER_TREE;
        Self {
            responses,
            trees_planted,
            co2_offset_kg: trees_planted * CO2_KG_PER_TREE,
            responses_to_next_tree: RESPONSES_PER_TREE - responses % RESPONSES_PER_TREE,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImpactUpdate {
    pub impact: Impact,
    pub new_tree: bool,
}

/// Caller-owned view of the response counter. Feed it every fresh total;
/// it reports only the changes.
#[derive(Debug, Default)]
pub struct ImpactCounter {
    last: Option<Impact>,
}

impl ImpactCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<Impact> {
        self.last
    }

    pub fn observe(&mut self, responses: u64) -> Option<ImpactUpdate> {
        let impact = Impact::from_responses(responses);
        let previous = self.last.replace(impact);

        match previous {
            Some(previous) if previous.responses == responses => None,
            Some(previous) => Some(ImpactUpdate {
                impact,
                new_tree: impact.trees_planted > previous.trees_planted,
            }),
            None => Some(ImpactUpdate {
                impact,
                new_tree: false,
            }),
        }
    }
}
