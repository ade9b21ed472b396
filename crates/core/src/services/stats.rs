//! Public and admin statistics.

use priority_common::AppResult;
use priority_db::{
    entities::PriorityStatus,
    repositories::{PriorityRepository, UserRepository, VoteRepository},
};
use serde::Serialize;
use std::collections::HashSet;

/// Upper bound on the reported country count.
pub const MAX_COUNTRIES: usize = 195;

/// Headline numbers on the public page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicStats {
    /// Vote records, including votes for since-deleted priorities.
    pub total_votes: u64,
    pub total_priorities: u64,
    pub active_users: u64,
    /// Distinct email domains, capped at [`MAX_COUNTRIES`].
    pub countries: usize,
}

/// Moderation console summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminStats {
    pub pending: u64,
    pub approved: u64,
    pub users: u64,
    /// Sum of the counters on approved priorities.
    pub votes: i64,
}

/// Distinct email domains, capped.
#[must_use]
pub fn count_domains<S: AsRef<str>>(emails: &[S]) -> usize {
    let domains: HashSet<String> = emails
        .iter()
        .filter_map(|e| e.as_ref().split_once('@'))
        .map(|(_, domain)| domain.trim().to_lowercase())
        .filter(|d| !d.is_empty())
        .collect();
    domains.len().min(MAX_COUNTRIES)
}

/// Stats service.
#[derive(Clone)]
pub struct StatsService {
    priority_repo: PriorityRepository,
    vote_repo: VoteRepository,
    user_repo: UserRepository,
}

impl StatsService {
    /// Create a new stats service.
    #[must_use]
    pub const fn new(
        priority_repo: PriorityRepository,
        vote_repo: VoteRepository,
        user_repo: UserRepository,
    ) -> Self {
        Self {
            priority_repo,
            vote_repo,
            user_repo,
        }
    }

    pub async fn public_stats(&self) -> AppResult<PublicStats> {
        let total_votes = self.vote_repo.count_all().await?;
        let total_priorities = self
            .priority_repo
            .count_by_status(PriorityStatus::Approved)
            .await?;
        let active_users = self.user_repo.count().await?;
        let emails = self.user_repo.find_all_emails().await?;

        Ok(PublicStats {
            total_votes,
            total_priorities,
            active_users,
            countries: count_domains(emails.as_slice()),
        })
    }

    pub async fn admin_stats(&self) -> AppResult<AdminStats> {
        let pending = self
            .priority_repo
            .count_by_status(PriorityStatus::Pending)
            .await?;
        let approved = self
            .priority_repo
            .count_by_status(PriorityStatus::Approved)
            .await?;
        let users = self.user_repo.count().await?;
        let votes = self
            .priority_repo
            .sum_votes_by_status(PriorityStatus::Approved)
            .await?;

        Ok(AdminStats {
            pending,
            approved,
            users,
            votes,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use maplit::btreemap;
    use sea_orm::{DatabaseBackend, MockDatabase, Value};
    use std::sync::Arc;

    fn count_row(n: i64) -> Vec<std::collections::BTreeMap<&'static str, Value>> {
        vec![btreemap! { "num_items" => Value::BigInt(Some(n)) }]
    }

    #[test]
    fn test_count_domains() {
        let emails = [
            "a@example.com",
            "b@EXAMPLE.com",
            "c@example.org",
            "no-at-sign",
        ];
        assert_eq!(count_domains(&emails), 2);
    }

    #[test]
    fn test_count_domains_is_capped() {
        let emails: Vec<String> = (0..300).map(|i| format!("u@d{i}.example")).collect();
        assert_eq!(count_domains(emails.as_slice()), MAX_COUNTRIES);
    }

    #[tokio::test]
    async fn test_public_stats() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([count_row(12), count_row(3), count_row(4)])
                .append_query_results([vec![
                    btreemap! { "email" => Value::from("a@example.com") },
                    btreemap! { "email" => Value::from("b@example.org") },
                ]])
                .into_connection(),
        );
        let service = StatsService::new(
            PriorityRepository::new(db.clone()),
            VoteRepository::new(db.clone()),
            UserRepository::new(db),
        );

        let stats = service.public_stats().await.unwrap();
        assert_eq!(
            stats,
            PublicStats {
                total_votes: 12,
                total_priorities: 3,
                active_users: 4,
                countries: 2,
            }
        );
    }

    #[tokio::test]
    async fn test_admin_stats() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([count_row(2), count_row(5), count_row(9)])
                .append_query_results([vec![btreemap! { "total" => Value::BigInt(Some(41)) }]])
                .into_connection(),
        );
        let service = StatsService::new(
            PriorityRepository::new(db.clone()),
            VoteRepository::new(db.clone()),
            UserRepository::new(db),
        );

        let stats = service.admin_stats().await.unwrap();
        assert_eq!(stats.pending, 2);
        assert_eq!(stats.approved, 5);
        assert_eq!(stats.users, 9);
        assert_eq!(stats.votes, 41);
    }
}
