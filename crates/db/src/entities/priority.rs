//! Priority entity: a user-submitted proposal subject to moderation and voting.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Moderation status of a priority.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "lowercase")]
#[derive(Default)]
pub enum PriorityStatus {
    #[sea_orm(string_value = "pending")]
    #[default]
    Pending,
    #[sea_orm(string_value = "approved")]
    Approved,
    #[sea_orm(string_value = "rejected")]
    Rejected,
}

impl PriorityStatus {
    /// Lowercase name as stored and exposed over the API.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }
}

impl std::fmt::Display for PriorityStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for PriorityStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            other => Err(format!("unknown priority status: {other}")),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "priority")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    pub title: String,

    #[sea_orm(column_type = "Text")]
    pub description: String,

    /// Free-form category label
    pub category: String,

    #[sea_orm(indexed)]
    pub status: PriorityStatus,

    /// Vote counter, only ever moved by the vote transaction
    #[sea_orm(default_value = 0)]
    pub votes: i32,

    /// Provider uid of the submitter
    pub submitted_by: String,

    pub submitted_by_email: String,

    pub submitted_by_name: String,

    pub created_at: DateTimeWithTimeZone,

    #[sea_orm(nullable)]
    pub last_vote_at: Option<DateTimeWithTimeZone>,

    #[sea_orm(nullable)]
    pub approved_at: Option<DateTimeWithTimeZone>,

    /// Admin email
    #[sea_orm(nullable)]
    pub approved_by: Option<String>,

    #[sea_orm(nullable)]
    pub rejected_at: Option<DateTimeWithTimeZone>,

    /// Admin email
    #[sea_orm(nullable)]
    pub rejected_by: Option<String>,

    #[sea_orm(column_type = "Text", nullable)]
    pub rejection_reason: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_status_round_trips_through_str() {
        for status in [
            PriorityStatus::Pending,
            PriorityStatus::Approved,
            PriorityStatus::Rejected,
        ] {
            assert_eq!(status.as_str().parse::<PriorityStatus>(), Ok(status));
        }
        assert!("archived".parse::<PriorityStatus>().is_err());
    }

    #[test]
    fn test_status_serializes_lowercase() {
        let json = serde_json::to_string(&PriorityStatus::Approved).unwrap();
        assert_eq!(json, "\"approved\"");
    }
}
