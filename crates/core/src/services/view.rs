//! View descriptions for the voting page and the moderation console.
//!
//! Pure functions from read-model state to serializable cards. Nothing here
//! touches the store or the session store.

use crate::services::moderation::{ModerationAction, allowed_actions};
use crate::services::ranking::RankedPriority;
use priority_db::entities::{PriorityStatus, priority};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Category shown when a priority has none.
pub const DEFAULT_CATEGORY: &str = "Other";

/// Characters of description shown on a card.
pub const EXCERPT_CHARS: usize = 100;

const TRENDING_LIMIT: usize = 10;
const NEW_LIMIT: usize = 5;

/// Rank label: medals for the podium, `#n` below it.
#[must_use]
pub fn rank_label(rank: usize) -> String {
    match rank {
        1 => "🥇".to_string(),
        2 => "🥈".to_string(),
        3 => "🥉".to_string(),
        n => format!("#{n}"),
    }
}

/// Card excerpt of a description, or `None` when it is empty.
#[must_use]
pub fn excerpt(description: &str) -> Option<String> {
    if description.is_empty() {
        return None;
    }
    let head: String = description.chars().take(EXCERPT_CHARS).collect();
    Some(format!("{head}..."))
}

fn category_or_default(category: &str) -> String {
    if category.trim().is_empty() {
        DEFAULT_CATEGORY.to_string()
    } else {
        category.to_string()
    }
}

/// One row of the public ranking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PriorityCard {
    pub id: String,
    pub rank: usize,
    pub rank_label: String,
    pub title: String,
    pub category: String,
    pub excerpt: Option<String>,
    pub votes: i32,
    pub has_voted: bool,
    pub can_vote: bool,
}

/// Build ranking cards for a viewer.
///
/// `voted` is `None` for anonymous viewers, who can never vote.
#[must_use]
pub fn priority_cards(
    ranked: &[RankedPriority],
    voted: Option<&HashSet<String>>,
) -> Vec<PriorityCard> {
    ranked
        .iter()
        .map(|r| {
            let p = &r.priority;
            let has_voted = voted.is_some_and(|v| v.contains(&p.id));
            PriorityCard {
                id: p.id.clone(),
                rank: r.rank,
                rank_label: rank_label(r.rank),
                title: p.title.clone(),
                category: category_or_default(&p.category),
                excerpt: excerpt(&p.description),
                votes: p.votes,
                has_voted,
                can_vote: voted.is_some() && !has_voted,
            }
        })
        .collect()
}

/// Public list filter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListFilter {
    #[default]
    All,
    /// Top of the ranking.
    Trending,
    /// Bottom of the ranking, where recently approved items start out.
    New,
}

impl ListFilter {
    /// Apply the filter to cards in ranking order.
    #[must_use]
    pub fn apply(self, mut cards: Vec<PriorityCard>) -> Vec<PriorityCard> {
        match self {
            Self::All => cards,
            Self::Trending => {
                cards.truncate(TRENDING_LIMIT);
                cards
            }
            Self::New => {
                let skip = cards.len().saturating_sub(NEW_LIMIT);
                cards.split_off(skip)
            }
        }
    }
}

/// One row of the moderation console.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionCard {
    pub id: String,
    pub title: String,
    pub category: String,
    pub description: String,
    pub status: PriorityStatus,
    pub submitted_by: String,
    pub submitted_by_name: String,
    pub created_at: String,
    pub votes: i32,
    pub rejection_reason: Option<String>,
    /// Actions the state machine allows from the current status.
    pub actions: Vec<ModerationAction>,
}

impl From<&priority::Model> for SubmissionCard {
    fn from(p: &priority::Model) -> Self {
        Self {
            id: p.id.clone(),
            title: p.title.clone(),
            category: category_or_default(&p.category),
            description: p.description.clone(),
            status: p.status,
            submitted_by: p.submitted_by_email.clone(),
            submitted_by_name: p.submitted_by_name.clone(),
            created_at: p.created_at.to_rfc3339(),
            votes: p.votes,
            rejection_reason: p.rejection_reason.clone(),
            actions: allowed_actions(p.status),
        }
    }
}

/// A status tab of the moderation console.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubmissionList {
    pub status: PriorityStatus,
    pub count: usize,
    pub items: Vec<SubmissionCard>,
}

/// Build the console tab for one status.
#[must_use]
pub fn submission_list(status: PriorityStatus, priorities: &[priority::Model]) -> SubmissionList {
    let items: Vec<SubmissionCard> = priorities.iter().map(SubmissionCard::from).collect();
    SubmissionList {
        status,
        count: items.len(),
        items,
    }
}
