use crate::twitter::rate_limit::RateLimitStatus;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use time::OffsetDateTime;
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;

/// v1.1 `created_at` layout, e.g. `Wed Aug 27 13:08:45 +0000 2008`.
pub const CREATED_AT_FORMAT: &[BorrowedFormatItem<'static>] = format_description!(
    "[weekday repr:short] [month repr:short] [day] [hour]:[minute]:[second] [offset_hour sign:mandatory][offset_minute] [year]"
);

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: u64,
    #[serde(default)]
    pub id_str: String,
    #[serde(default)]
    pub screen_name: String,
    #[serde(default)]
    pub name: Option<String>,
    /// Most recent status; absent when the account never posted or is protected.
    #[serde(default)]
    pub status: Option<Box<Tweet>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Tweet {
    #[serde(default)]
    pub id: u64,
    #[serde(default)]
    pub id_str: String,
    pub created_at: String,
    #[serde(default, alias = "full_text")]
    pub text: String,
    /// Owning account. `users/lookup` embeds statuses without it; the fetcher
    /// attaches it.
    #[serde(default)]
    pub user: Option<User>,
}

impl Tweet {
    /// Parse the raw `created_at` string.
    pub fn created_at_time(&self) -> Result<OffsetDateTime, time::error::Parse> {
        OffsetDateTime::parse(&self.created_at, CREATED_AT_FORMAT)
    }

    pub fn screen_name(&self) -> &str {
        self.user.as_ref().map(|u| u.screen_name.as_str()).unwrap_or("-")
    }
}

/// Render a timestamp in the `created_at` layout.
pub fn format_created_at(at: OffsetDateTime) -> Result<String, time::error::Format> {
    at.format(CREATED_AT_FORMAT)
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CursoringIds {
    #[serde(default)]
    pub ids: Vec<u64>,
    #[serde(default)]
    pub next_cursor: i64,
    #[serde(default)]
    pub next_cursor_str: String,
    #[serde(default)]
    pub previous_cursor: i64,
    #[serde(default)]
    pub previous_cursor_str: String,
}

impl CursoringIds {
    pub fn is_last_page(&self) -> bool {
        self.next_cursor == 0
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RateLimitResponse {
    #[serde(default)]
    pub resources: RateLimitResources,
}

/// Budgets keyed by endpoint path. Only the `users` family paces the poller;
/// other families in the response are ignored.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RateLimitResources {
    #[serde(default)]
    pub users: HashMap<String, RateLimitStatus>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use time::macros::datetime;

    #[test]
    fn parses_created_at() {
        let tweet = Tweet {
            created_at: "Wed Aug 27 13:08:45 +0000 2008".into(),
            ..Default::default()
        };
        assert_eq!(
            tweet.created_at_time().unwrap(),
            datetime!(2008-08-27 13:08:45 UTC)
        );
    }

    #[test]
    fn keeps_offset_when_parsing() {
        let tweet = Tweet {
            created_at: "Mon Jan 02 15:04:05 -0700 2006".into(),
            ..Default::default()
        };
        assert_eq!(
            tweet.created_at_time().unwrap(),
            datetime!(2006-01-02 22:04:05 UTC)
        );
    }

    #[test]
    fn malformed_created_at_is_an_error() {
        let tweet = Tweet {
            created_at: "2008-08-27T13:08:45Z".into(),
            ..Default::default()
        };
        assert!(tweet.created_at_time().is_err());
    }

    #[test]
    fn format_roundtrips_through_parse() {
        let at = datetime!(2024-03-09 07:05:01 UTC);
        let tweet = Tweet {
            created_at: format_created_at(at).unwrap(),
            ..Default::default()
        };
        assert_eq!(tweet.created_at_time().unwrap(), at);
    }

    #[test]
    fn decodes_lookup_payload_with_embedded_status() {
        let users: Vec<User> = serde_json::from_value(json!([
            {
                "id": 100,
                "id_str": "100",
                "screen_name": "alice",
                "status": {
                    "id": 7,
                    "id_str": "7",
                    "created_at": "Wed Aug 27 13:08:45 +0000 2008",
                    "text": "hello"
                }
            },
            { "id": 200, "screen_name": "bob" }
        ]))
        .unwrap();
        assert_eq!(users.len(), 2);
        let status = users[0].status.as_ref().unwrap();
        assert_eq!(status.text, "hello");
        assert!(status.user.is_none());
        assert!(users[1].status.is_none());
    }

    #[test]
    fn decodes_rate_limit_resources() {
        let resp: RateLimitResponse = serde_json::from_value(json!({
            "rate_limit_context": { "access_token": "x" },
            "resources": {
                "users": {
                    "/users/lookup": { "limit": 180, "remaining": 179, "reset": 1700000000 }
                },
                "followers": {
                    "/followers/ids": { "limit": 15, "remaining": 15, "reset": 1700000000 }
                }
            }
        }))
        .unwrap();
        let lookup = resp.resources.users["/users/lookup"];
        assert_eq!(lookup.limit, 180);
        assert_eq!(lookup.remaining, 179);
        assert_eq!(resp.resources.users.len(), 1);
    }
}
