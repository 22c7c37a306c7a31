use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::api::types::{FriendIdsPage, TwitterUser};
use crate::api::{ApiClientError, TwitterApiClient};
use crate::event::{AppEvent, Event};

// ---------------------------------------------------------------------------
// Friend source
// ---------------------------------------------------------------------------

/// The two read operations the fetch loop performs against the remote
/// service. Implemented by [`TwitterApiClient`]; mocked in tests.
pub trait FriendSource {
    fn friend_ids(
        &self,
        screen_name: &str,
        cursor: i64,
    ) -> impl Future<Output = Result<FriendIdsPage, ApiClientError>> + Send;

    fn get_user(
        &self,
        user_id: u64,
    ) -> impl Future<Output = Result<TwitterUser, ApiClientError>> + Send;
}

impl FriendSource for TwitterApiClient {
    async fn friend_ids(
        &self,
        screen_name: &str,
        cursor: i64,
    ) -> Result<FriendIdsPage, ApiClientError> {
        TwitterApiClient::friend_ids(self, screen_name, cursor).await
    }

    async fn get_user(&self, user_id: u64) -> Result<TwitterUser, ApiClientError> {
        TwitterApiClient::get_user(self, user_id).await
    }
}

// ---------------------------------------------------------------------------
// Fetch loop
// ---------------------------------------------------------------------------

/// Cursor state of the loop: which phase it is in and where.
#[derive(Debug, Clone, Copy)]
enum FetchPhase {
    /// Walking the paged friend-id listing.
    IdList { cursor: i64 },
    /// Fetching profiles one id at a time.
    User { index: usize },
}

/// Incremental, rate-limit-aware walk of a user's friends list.
///
/// Runs on its own tokio task and performs exactly one remote call per
/// step, yielding between steps so the event loop stays responsive. Each
/// fetched profile is emitted as [`AppEvent::FriendFetched`] over the
/// app's event channel, in the order of the remote id listing.
///
/// A rate-limited step is retried at the same position after a fixed
/// backoff; any other failure stops the loop and is surfaced as
/// [`AppEvent::FetchFailed`].
pub struct FriendsFetcher<S> {
    source: Arc<S>,
    user_name: String,
    backoff: Duration,
    cancel: CancellationToken,
    sender: mpsc::UnboundedSender<Event>,
}

impl<S: FriendSource> FriendsFetcher<S> {
    pub fn new(
        source: Arc<S>,
        user_name: impl Into<String>,
        backoff: Duration,
        cancel: CancellationToken,
        sender: mpsc::UnboundedSender<Event>,
    ) -> Self {
        Self {
            source,
            user_name: user_name.into(),
            backoff,
            cancel,
            sender,
        }
    }

    /// Drive the loop to completion (or cancellation).
    pub async fn run(self) {
        let mut ids: Vec<u64> = Vec::new();
        let mut phase = FetchPhase::IdList { cursor: -1 };

        loop {
            // Best-effort cancellation: checked before every step, so at
            // most one in-flight call completes after a stop request.
            if self.cancel.is_cancelled() {
                return;
            }

            match phase {
                FetchPhase::IdList { cursor } => {
                    match self.source.friend_ids(&self.user_name, cursor).await {
                        Ok(page) => {
                            ids.extend(page.ids);
                            if page.next_cursor != 0 {
                                phase = FetchPhase::IdList {
                                    cursor: page.next_cursor,
                                };
                            } else if ids.is_empty() {
                                tracing::info!(user = %self.user_name, "friend list is empty");
                                self.send(AppEvent::FetchFinished);
                                return;
                            } else {
                                tracing::info!(count = ids.len(), "friend id listing complete");
                                phase = FetchPhase::User { index: 0 };
                            }
                        }
                        Err(ApiClientError::RateLimited { message, .. }) => {
                            tracing::warn!(%message, "rate limited while listing friend ids");
                            self.send(AppEvent::FetchRateLimited(message));
                            if !self.wait_backoff().await {
                                return;
                            }
                            // Same phase, same cursor: no position is lost.
                        }
                        Err(e) => {
                            self.send(AppEvent::FetchFailed(e.to_string()));
                            return;
                        }
                    }
                }
                FetchPhase::User { index } => match self.source.get_user(ids[index]).await {
                    Ok(user) => {
                        self.send(AppEvent::FriendFetched(user.into()));
                        if index + 1 < ids.len() {
                            phase = FetchPhase::User { index: index + 1 };
                        } else {
                            tracing::info!(count = ids.len(), "friends fetch complete");
                            self.send(AppEvent::FetchFinished);
                            return;
                        }
                    }
                    Err(ApiClientError::RateLimited { message, .. }) => {
                        tracing::warn!(%message, index, "rate limited while fetching a user");
                        self.send(AppEvent::FetchRateLimited(message));
                        if !self.wait_backoff().await {
                            return;
                        }
                        // Retry the same index, never skip.
                    }
                    Err(e) => {
                        self.send(AppEvent::FetchFailed(e.to_string()));
                        return;
                    }
                },
            }

            // One remote call per step; hand control back before the next.
            tokio::task::yield_now().await;
        }
    }

    /// Sleep out the rate-limit window. Returns false when cancelled.
    async fn wait_backoff(&self) -> bool {
        tokio::select! {
            _ = self.cancel.cancelled() => false,
            _ = tokio::time::sleep(self.backoff) => true,
        }
    }

    fn send(&self, event: AppEvent) {
        let _ = self.sender.send(Event::App(event));
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use super::*;
    use crate::store::{FriendsList, SortKey, SortOrder};

    /// Scripted responses, consumed front to back; a call past the end of
    /// its script is a test bug.
    struct ScriptedSource {
        id_pages: Mutex<VecDeque<Result<FriendIdsPage, ApiClientError>>>,
        users: Mutex<VecDeque<Result<TwitterUser, ApiClientError>>>,
    }

    impl ScriptedSource {
        fn new(
            id_pages: Vec<Result<FriendIdsPage, ApiClientError>>,
            users: Vec<Result<TwitterUser, ApiClientError>>,
        ) -> Arc<Self> {
            Arc::new(Self {
                id_pages: Mutex::new(id_pages.into()),
                users: Mutex::new(users.into()),
            })
        }
    }

    impl FriendSource for ScriptedSource {
        async fn friend_ids(
            &self,
            _screen_name: &str,
            _cursor: i64,
        ) -> Result<FriendIdsPage, ApiClientError> {
            self.id_pages
                .lock()
                .unwrap()
                .pop_front()
                .expect("unexpected friend_ids call")
        }

        async fn get_user(&self, _user_id: u64) -> Result<TwitterUser, ApiClientError> {
            self.users
                .lock()
                .unwrap()
                .pop_front()
                .expect("unexpected get_user call")
        }
    }

    fn page(ids: Vec<u64>, next_cursor: i64) -> Result<FriendIdsPage, ApiClientError> {
        Ok(FriendIdsPage { ids, next_cursor })
    }

    fn user(id: u64, screen_name: &str) -> Result<TwitterUser, ApiClientError> {
        Ok(serde_json::from_value(serde_json::json!({
            "id": id,
            "screen_name": screen_name,
            "status": {"created_at": "Wed Oct 10 20:19:24 +0000 2018"}
        }))
        .unwrap())
    }

    fn rate_limited() -> ApiClientError {
        ApiClientError::RateLimited {
            message: "Rate limit exceeded".into(),
            reset_at: None,
        }
    }

    fn fetcher(
        source: Arc<ScriptedSource>,
        cancel: CancellationToken,
    ) -> (
        FriendsFetcher<ScriptedSource>,
        mpsc::UnboundedReceiver<Event>,
    ) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            FriendsFetcher::new(source, "me", Duration::ZERO, cancel, tx),
            rx,
        )
    }

    async fn run_and_collect(
        fetcher: FriendsFetcher<ScriptedSource>,
        mut rx: mpsc::UnboundedReceiver<Event>,
    ) -> Vec<AppEvent> {
        fetcher.run().await;
        let mut events = Vec::new();
        while let Ok(evt) = rx.try_recv() {
            if let Event::App(app) = evt {
                events.push(app);
            }
        }
        events
    }

    fn fetched_ids(events: &[AppEvent]) -> Vec<u64> {
        events
            .iter()
            .filter_map(|e| match e {
                AppEvent::FriendFetched(r) => Some(r.user_id),
                _ => None,
            })
            .collect()
    }

    #[tokio::test]
    async fn emits_records_in_id_order_then_finishes() {
        let source = ScriptedSource::new(
            vec![page(vec![101, 202], 0)],
            vec![user(101, "alice"), user(202, "bob")],
        );
        let (fetcher, rx) = fetcher(source, CancellationToken::new());
        let events = run_and_collect(fetcher, rx).await;

        assert_eq!(fetched_ids(&events), vec![101, 202]);
        assert!(matches!(events.last(), Some(AppEvent::FetchFinished)));
        assert_eq!(events.len(), 3);
    }

    #[tokio::test]
    async fn retries_same_index_after_user_rate_limit() {
        let source = ScriptedSource::new(
            vec![page(vec![101, 202], 0)],
            vec![user(101, "alice"), Err(rate_limited()), user(202, "bob")],
        );
        let (fetcher, rx) = fetcher(source, CancellationToken::new());
        let events = run_and_collect(fetcher, rx).await;

        // Index 1 was retried, not skipped: both records still arrive.
        assert_eq!(fetched_ids(&events), vec![101, 202]);
        let timeouts = events
            .iter()
            .filter(|e| matches!(e, AppEvent::FetchRateLimited(_)))
            .count();
        assert_eq!(timeouts, 1);
    }

    #[tokio::test]
    async fn id_list_rate_limit_then_success() {
        let source = ScriptedSource::new(
            vec![Err(rate_limited()), page(vec![303], 0)],
            vec![user(303, "carol")],
        );
        let (fetcher, rx) = fetcher(source, CancellationToken::new());
        let events = run_and_collect(fetcher, rx).await;

        match &events[..] {
            [
                AppEvent::FetchRateLimited(msg),
                AppEvent::FriendFetched(record),
                AppEvent::FetchFinished,
            ] => {
                assert_eq!(msg, "Rate limit exceeded");
                assert_eq!(record.user_id, 303);
            }
            other => panic!("unexpected event sequence: {other:?}"),
        }
    }

    #[tokio::test]
    async fn cancelled_before_start_emits_nothing() {
        let source = ScriptedSource::new(vec![page(vec![101], 0)], vec![user(101, "alice")]);
        let cancel = CancellationToken::new();
        cancel.cancel();
        let (fetcher, rx) = fetcher(source, cancel);
        let events = run_and_collect(fetcher, rx).await;
        assert!(events.is_empty());
    }

    #[tokio::test]
    async fn empty_friend_list_finishes_without_records() {
        let source = ScriptedSource::new(vec![page(vec![], 0)], vec![]);
        let (fetcher, rx) = fetcher(source, CancellationToken::new());
        let events = run_and_collect(fetcher, rx).await;

        assert!(matches!(&events[..], [AppEvent::FetchFinished]));
    }

    #[tokio::test]
    async fn follows_cursor_across_id_pages() {
        let source = ScriptedSource::new(
            vec![page(vec![101], 7), page(vec![202], 0)],
            vec![user(101, "alice"), user(202, "bob")],
        );
        let (fetcher, rx) = fetcher(source, CancellationToken::new());
        let events = run_and_collect(fetcher, rx).await;

        assert_eq!(fetched_ids(&events), vec![101, 202]);
    }

    #[tokio::test]
    async fn remote_error_stops_the_loop() {
        let source = ScriptedSource::new(
            vec![page(vec![101, 202], 0)],
            vec![
                user(101, "alice"),
                Err(ApiClientError::Api {
                    status: 404,
                    message: "not found".into(),
                }),
                user(202, "bob"),
            ],
        );
        let (fetcher, rx) = fetcher(source, CancellationToken::new());
        let events = run_and_collect(fetcher, rx).await;

        assert_eq!(fetched_ids(&events), vec![101]);
        match events.last() {
            Some(AppEvent::FetchFailed(msg)) => assert_eq!(msg, "not found"),
            other => panic!("expected FetchFailed, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn fetched_records_populate_a_sortable_store() {
        let source = ScriptedSource::new(
            vec![page(vec![101, 202], 0)],
            vec![user(101, "bob"), user(202, "alice")],
        );
        let (fetcher, rx) = fetcher(source, CancellationToken::new());
        let events = run_and_collect(fetcher, rx).await;

        let mut store = FriendsList::new();
        for event in events {
            if let AppEvent::FriendFetched(record) = event {
                store.add(record);
            }
        }
        assert_eq!(store.len(), 2);

        let order = store.sorted_indices(SortKey::Username, SortOrder::Ascending);
        let names: Vec<&str> = order
            .iter()
            .map(|&i| store.get(i).unwrap().user_name.as_str())
            .collect();
        assert_eq!(names, vec!["alice", "bob"]);
    }
}
