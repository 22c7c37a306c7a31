use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::api::types::TwitterUser;

// ---------------------------------------------------------------------------
// Friend record
// ---------------------------------------------------------------------------

/// One followed account. Identity is `user_id`; `user_name` and
/// `last_tweet_at` are display data.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FriendRecord {
    pub user_id: u64,
    pub user_name: String,
    /// When the account last tweeted; `None` if it never has.
    pub last_tweet_at: Option<DateTime<Utc>>,
}

impl From<TwitterUser> for FriendRecord {
    fn from(user: TwitterUser) -> Self {
        Self {
            user_id: user.id,
            user_name: user.screen_name,
            last_tweet_at: user.status.map(|s| s.created_at),
        }
    }
}

// ---------------------------------------------------------------------------
// Sort keys
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    Username,
    LastTweet,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Ascending,
    Descending,
}

impl SortOrder {
    pub fn flipped(self) -> Self {
        match self {
            SortOrder::Ascending => SortOrder::Descending,
            SortOrder::Descending => SortOrder::Ascending,
        }
    }
}

// ---------------------------------------------------------------------------
// Friends list
// ---------------------------------------------------------------------------

/// In-memory table of fetched friends, in fetch order.
///
/// Lives for the duration of the process only; there is no persistence.
#[derive(Debug, Default)]
pub struct FriendsList {
    rows: Vec<FriendRecord>,
}

impl FriendsList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a row. There is deliberately no duplicate guard: ids arrive
    /// from a single listing and are unique per fetch, so a duplicate row
    /// would indicate a caller bug rather than a state to defend against.
    pub fn add(&mut self, record: FriendRecord) {
        self.rows.push(record);
    }

    /// Remove the first row with the given id, returning it. A missing id
    /// is a no-op.
    pub fn remove(&mut self, user_id: u64) -> Option<FriendRecord> {
        let pos = self.rows.iter().position(|r| r.user_id == user_id)?;
        Some(self.rows.remove(pos))
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&FriendRecord> {
        self.rows.get(index)
    }

    /// Presentation ordering of row indices for the given sort key. The
    /// underlying rows keep their insertion order and identity.
    ///
    /// Accounts that never tweeted sort after every dated row regardless of
    /// order, since "no activity" is what this tool is hunting for.
    pub fn sorted_indices(&self, key: SortKey, order: SortOrder) -> Vec<usize> {
        let mut indices: Vec<usize> = (0..self.rows.len()).collect();
        match key {
            SortKey::Username => {
                indices.sort_by(|&a, &b| {
                    let cmp = self.rows[a]
                        .user_name
                        .to_lowercase()
                        .cmp(&self.rows[b].user_name.to_lowercase());
                    match order {
                        SortOrder::Ascending => cmp,
                        SortOrder::Descending => cmp.reverse(),
                    }
                });
            }
            SortKey::LastTweet => {
                indices.sort_by(|&a, &b| {
                    match (self.rows[a].last_tweet_at, self.rows[b].last_tweet_at) {
                        (Some(ta), Some(tb)) => match order {
                            SortOrder::Ascending => ta.cmp(&tb),
                            SortOrder::Descending => tb.cmp(&ta),
                        },
                        (Some(_), None) => std::cmp::Ordering::Less,
                        (None, Some(_)) => std::cmp::Ordering::Greater,
                        (None, None) => std::cmp::Ordering::Equal,
                    }
                });
            }
        }
        indices
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn record(user_id: u64, user_name: &str, tweet_ts: Option<i64>) -> FriendRecord {
        FriendRecord {
            user_id,
            user_name: user_name.into(),
            last_tweet_at: tweet_ts.map(|ts| Utc.timestamp_opt(ts, 0).unwrap()),
        }
    }

    #[test]
    fn remove_then_add_restores_prior_state() {
        let mut list = FriendsList::new();
        list.add(record(101, "alice", Some(1000)));
        list.add(record(202, "bob", Some(2000)));

        let removed = list.remove(101).unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list.get(0).unwrap().user_id, 202);

        list.add(removed);
        assert_eq!(list.len(), 2);
        assert_eq!(list.get(1).unwrap().user_id, 101);
    }

    #[test]
    fn remove_unknown_id_is_a_noop() {
        let mut list = FriendsList::new();
        list.add(record(101, "alice", None));
        assert!(list.remove(999).is_none());
        assert_eq!(list.len(), 1);
        assert_eq!(list.get(0).unwrap().user_id, 101);
    }

    #[test]
    fn sorts_by_username_ascending() {
        let mut list = FriendsList::new();
        list.add(record(202, "bob", None));
        list.add(record(101, "alice", None));

        let order = list.sorted_indices(SortKey::Username, SortOrder::Ascending);
        let names: Vec<&str> = order
            .iter()
            .map(|&i| list.get(i).unwrap().user_name.as_str())
            .collect();
        assert_eq!(names, vec!["alice", "bob"]);
        // Underlying rows keep insertion order.
        assert_eq!(list.get(0).unwrap().user_name, "bob");
    }

    #[test]
    fn sorts_by_last_tweet_with_never_tweeted_last() {
        let mut list = FriendsList::new();
        list.add(record(1, "quiet", None));
        list.add(record(2, "recent", Some(2000)));
        list.add(record(3, "stale", Some(1000)));

        let asc = list.sorted_indices(SortKey::LastTweet, SortOrder::Ascending);
        let ids: Vec<u64> = asc.iter().map(|&i| list.get(i).unwrap().user_id).collect();
        assert_eq!(ids, vec![3, 2, 1]);

        let desc = list.sorted_indices(SortKey::LastTweet, SortOrder::Descending);
        let ids: Vec<u64> = desc.iter().map(|&i| list.get(i).unwrap().user_id).collect();
        assert_eq!(ids, vec![2, 3, 1]);
    }

    #[test]
    fn duplicate_ids_are_not_deduplicated() {
        // Documented behavior: add has no guard, callers must not re-add a
        // fetched id. This test pins the behavior rather than endorsing it.
        let mut list = FriendsList::new();
        list.add(record(101, "alice", None));
        list.add(record(101, "alice", None));
        assert_eq!(list.len(), 2);

        // remove drops only the first match.
        list.remove(101);
        assert_eq!(list.len(), 1);
    }

    #[test]
    fn converts_twitter_user_to_record() {
        let user: TwitterUser = serde_json::from_str(
            r#"{
                "id": 101,
                "screen_name": "alice",
                "status": {"created_at": "Wed Oct 10 20:19:24 +0000 2018"}
            }"#,
        )
        .unwrap();
        let record: FriendRecord = user.into();
        assert_eq!(record.user_id, 101);
        assert_eq!(record.user_name, "alice");
        assert!(record.last_tweet_at.is_some());
    }
}
