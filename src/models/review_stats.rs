use serde::{Deserialize, Serialize};

/// Dashboard numbers for the review history.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewStats {
    pub total_cards: usize,
    pub cards_due_today: usize,
    pub cards_reviewed_today: usize,
    pub streak: u32,
    pub last_review_date: Option<i64>,
}
