use reqwest::Method;

use crate::api::types::{FriendIdsPage, TwitterUser};
use crate::api::{ApiClientError, TwitterApiClient};

impl TwitterApiClient {
    /// Fetch one page of the ids of accounts `screen_name` follows.
    ///
    /// Pass a cursor of -1 for the first page; a returned `next_cursor` of 0
    /// means there are no more pages.
    pub async fn friend_ids(
        &self,
        screen_name: &str,
        cursor: i64,
    ) -> Result<FriendIdsPage, ApiClientError> {
        let url = Self::url(&format!(
            "/friends/ids.json?screen_name={screen_name}&cursor={cursor}"
        ));
        self.signed_request(Method::GET, &url).await
    }

    /// Look up a single user by numeric id, including their latest tweet.
    pub async fn get_user(&self, user_id: u64) -> Result<TwitterUser, ApiClientError> {
        let url = Self::url(&format!("/users/show.json?user_id={user_id}"));
        self.signed_request(Method::GET, &url).await
    }

    /// Unfollow a user. Returns the unfollowed user on success.
    pub async fn destroy_friendship(&self, user_id: u64) -> Result<TwitterUser, ApiClientError> {
        let url = Self::url(&format!("/friendships/destroy.json?user_id={user_id}"));
        self.signed_request(Method::POST, &url).await
    }
}
