//! Poll and vote data types.
//!
//! The API speaks camelCase JSON; everything here renames accordingly so
//! the rest of the crate can stay snake_case.

use serde_derive::{Deserialize, Serialize};

/// A poll, as returned by the listing and detail endpoints.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
#[non_exhaustive]
pub struct Poll {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub creator_name: String,
    #[serde(default)]
    pub creator_id: Option<String>,
    pub start_date: String,
    #[serde(default)]
    pub end_date: Option<String>,
    pub is_active: bool,
    pub created_at: String,
    pub total_votes: u64,
    /// Whether the requesting user already voted today. Only present on
    /// authenticated requests.
    #[serde(default)]
    pub has_voted_today: Option<bool>,
    #[serde(default)]
    pub can_edit: Option<bool>,
    pub options: Vec<PollOption>,
}

/// One of the choices a poll offers.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
#[non_exhaustive]
pub struct PollOption {
    pub id: String,
    pub text: String,
    #[serde(default)]
    pub image_url: Option<String>,
    pub vote_count: u64,
    #[serde(default)]
    pub percentage: Option<f64>,
}

/// The request body for creating a poll.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePollRequest {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
    pub options: Vec<CreatePollOption>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePollOption {
    pub text: String,
    /// Set when an image part with the same ordinal is attached to the
    /// request.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub has_image: Option<bool>,
}

/// An image attached to a poll option on creation.
#[derive(Debug, Clone, PartialEq)]
pub struct PollImage {
    pub file_name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

/// Filtering and paging options for the poll listing endpoints.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PollQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub search: Option<String>,
    pub sort_by: Option<String>,
    pub sort_order: Option<SortOrder>,
    pub active: Option<bool>,
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub enum SortOrder {
    Ascending,
    Descending,
}

impl SortOrder {
    fn as_param(self) -> &'static str {
        match self {
            SortOrder::Ascending => "asc",
            SortOrder::Descending => "desc",
        }
    }
}

impl PollQuery {
    pub(crate) fn to_params(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();

        if let Some(page) = self.page {
            params.push(("page", page.to_string()));
        }
        if let Some(limit) = self.limit {
            params.push(("limit", limit.to_string()));
        }
        if let Some(ref search) = self.search {
            params.push(("search", search.clone()));
        }
        if let Some(ref sort_by) = self.sort_by {
            params.push(("sortBy", sort_by.clone()));
        }
        if let Some(sort_order) = self.sort_order {
            params.push(("sortOrder", sort_order.as_param().to_string()));
        }
        if let Some(active) = self.active {
            params.push(("active", active.to_string()));
        }

        params
    }
}

/// One page of a paginated listing.
///
/// Depending on the endpoint the API names the item array `polls`,
/// `votes`, or `data`; they all deserialize into `items`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Page<T> {
    #[serde(alias = "polls", alias = "votes", alias = "data")]
    pub items: Vec<T>,
    pub pagination: Pagination,
}

#[derive(Debug, Copy, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    pub total: u64,
    pub total_pages: u32,
    pub has_next: bool,
    pub has_prev: bool,
}

/// Whether the current user may vote on a poll today.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanVote {
    pub can_vote: bool,
    #[serde(default)]
    pub reason: Option<String>,
}

/// A past vote, as returned by the history endpoint.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
#[non_exhaustive]
pub struct VoteRecord {
    pub id: String,
    pub voted_at: String,
    pub poll: VotedPoll,
    pub option: VotedOption,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VotedPoll {
    pub id: String,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VotedOption {
    pub id: String,
    pub text: String,
    #[serde(default)]
    pub image_url: Option<String>,
}

/// A single vote on a poll, as shown to the poll's creator.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
#[non_exhaustive]
pub struct PollVote {
    pub id: String,
    pub voted_at: String,
    #[serde(default)]
    pub user: Option<Voter>,
    #[serde(default)]
    pub option: Option<VotedOption>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Voter {
    pub id: String,
    pub name: String,
}

/// Aggregated statistics for a poll, visible to its creator.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
#[non_exhaustive]
pub struct PollStats {
    pub poll_title: String,
    pub total_stats: TotalStats,
    pub daily_stats: Vec<DailyStat>,
    pub option_stats: Vec<OptionStat>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TotalStats {
    pub unique_voters: u64,
    pub total_votes: u64,
    pub first_vote: String,
    pub last_vote: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyStat {
    pub date: String,
    pub vote_count: u64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptionStat {
    pub id: String,
    pub text: String,
    #[serde(default)]
    pub image_url: Option<String>,
    pub vote_count: u64,
    pub percentage: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_a_poll_listing_page() {
        let src = r#"{
            "polls": [{
                "id": "p1",
                "title": "Best editor",
                "creatorName": "ada",
                "startDate": "2026-01-01T00:00:00Z",
                "isActive": true,
                "createdAt": "2026-01-01T00:00:00Z",
                "totalVotes": 12,
                "hasVotedToday": false,
                "options": [
                    {"id": "o1", "text": "vim", "voteCount": 7, "percentage": 58.3},
                    {"id": "o2", "text": "emacs", "voteCount": 5, "imageUrl": "/uploads/o2.png"}
                ]
            }],
            "pagination": {
                "page": 1, "limit": 10, "total": 1,
                "totalPages": 1, "hasNext": false, "hasPrev": false
            }
        }"#;

        let page: Page<Poll> = serde_json::from_str(src).unwrap();

        assert_eq!(page.items.len(), 1);
        let poll = &page.items[0];
        assert_eq!(poll.title, "Best editor");
        assert_eq!(poll.has_voted_today, Some(false));
        assert_eq!(poll.options[1].image_url.as_deref(), Some("/uploads/o2.png"));
        assert!(!page.pagination.has_next);
    }

    #[test]
    fn the_item_array_may_be_called_votes_or_data() {
        let votes = r#"{
            "votes": [],
            "pagination": {"page": 1, "limit": 10, "total": 0, "totalPages": 0, "hasNext": false, "hasPrev": false}
        }"#;
        let data = r#"{
            "data": [],
            "pagination": {"page": 1, "limit": 10, "total": 0, "totalPages": 0, "hasNext": false, "hasPrev": false}
        }"#;

        let _: Page<VoteRecord> = serde_json::from_str(votes).unwrap();
        let _: Page<VoteRecord> = serde_json::from_str(data).unwrap();
    }

    #[test]
    fn parse_poll_stats() {
        let src = r#"{
            "pollTitle": "Best editor",
            "totalStats": {
                "uniqueVoters": 9,
                "totalVotes": 12,
                "firstVote": "2026-01-02T09:00:00Z",
                "lastVote": "2026-01-05T17:30:00Z"
            },
            "dailyStats": [{"date": "2026-01-02", "voteCount": 4}],
            "optionStats": [
                {"id": "o1", "text": "vim", "voteCount": 7, "percentage": 58.3}
            ]
        }"#;

        let stats: PollStats = serde_json::from_str(src).unwrap();

        assert_eq!(stats.total_stats.unique_voters, 9);
        assert_eq!(stats.daily_stats[0].vote_count, 4);
        assert_eq!(stats.option_stats[0].percentage, 58.3);
    }

    #[test]
    fn create_poll_request_skips_absent_fields() {
        let request = CreatePollRequest {
            title: String::from("Best editor"),
            description: None,
            end_date: None,
            options: vec![CreatePollOption {
                text: String::from("vim"),
                has_image: None,
            }],
        };

        let json = serde_json::to_value(&request).unwrap();

        assert_eq!(
            json,
            serde_json::json!({
                "title": "Best editor",
                "options": [{"text": "vim"}]
            })
        );
    }

    #[test]
    fn poll_query_serializes_camel_case_params() {
        let query = PollQuery {
            page: Some(2),
            limit: Some(20),
            search: Some(String::from("editor")),
            sort_by: Some(String::from("createdAt")),
            sort_order: Some(SortOrder::Descending),
            active: Some(true),
        };

        let params = query.to_params();

        assert_eq!(
            params,
            vec![
                ("page", String::from("2")),
                ("limit", String::from("20")),
                ("search", String::from("editor")),
                ("sortBy", String::from("createdAt")),
                ("sortOrder", String::from("desc")),
                ("active", String::from("true")),
            ]
        );
    }
}
