use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer};

// ---------------------------------------------------------------------------
// Friend id listing
// ---------------------------------------------------------------------------

/// One page of `GET friends/ids.json`. A `next_cursor` of 0 means the
/// listing is exhausted.
#[derive(Debug, Clone, Deserialize)]
pub struct FriendIdsPage {
    pub ids: Vec<u64>,
    #[serde(default)]
    pub next_cursor: i64,
}

// ---------------------------------------------------------------------------
// User
// ---------------------------------------------------------------------------

/// A v1.1 user object, reduced to the fields this tool reads.
#[derive(Debug, Clone, Deserialize)]
pub struct TwitterUser {
    pub id: u64,
    pub screen_name: String,
    /// Most recent tweet; absent for accounts that have never tweeted
    /// (or whose tweets are protected).
    #[serde(default)]
    pub status: Option<TweetStatus>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TweetStatus {
    #[serde(deserialize_with = "deserialize_twitter_date")]
    pub created_at: DateTime<Utc>,
}

/// Parse v1.1's legacy date format, e.g. `Wed Oct 10 20:19:24 +0000 2018`.
fn deserialize_twitter_date<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    DateTime::parse_from_str(&s, "%a %b %d %H:%M:%S %z %Y")
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(serde::de::Error::custom)
}

// ---------------------------------------------------------------------------
// Error body
// ---------------------------------------------------------------------------

/// The `{"errors": [{"code": .., "message": ..}]}` body v1.1 returns on
/// failure, including rate limiting (code 88).
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorBody {
    #[serde(default)]
    pub errors: Vec<ApiErrorDetail>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorDetail {
    #[serde(default)]
    pub code: i64,
    pub message: String,
}

impl ApiErrorBody {
    /// The first error message, mirroring how the API is documented to
    /// report a single failure per response.
    pub fn first_message(&self) -> Option<&str> {
        self.errors.first().map(|e| e.message.as_str())
    }
}
