use std::sync::Arc;
use std::time::Duration;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::DefaultTerminal;
use tokio_util::sync::CancellationToken;

use crate::api::TwitterApiClient;
use crate::config::AppConfig;
use crate::event::{AppEvent, Event, EventHandler};
use crate::fetch::FriendsFetcher;
use crate::store::{FriendRecord, FriendsList, SortKey, SortOrder};
use crate::ui;

/// Profile page URL for a screen name.
pub fn profile_url(user_name: &str) -> String {
    format!("https://twitter.com/{user_name}")
}

pub struct App {
    pub running: bool,
    pub events: EventHandler,
    pub config: AppConfig,
    /// Whose friends list is shown.
    pub user_name: String,

    // Data state
    pub friends: FriendsList,
    pub sort_key: SortKey,
    pub sort_order: SortOrder,
    /// Selection position within the sorted view, not the underlying rows.
    pub selected_index: usize,

    // Status
    pub fetching: bool,
    pub status_message: Option<String>,
    pub error_detail: Option<String>,
    pub show_help: bool,

    // Shared with the fetch loop and unfollow tasks
    api_client: Arc<TwitterApiClient>,
    fetch_cancel: CancellationToken,
}

impl App {
    pub fn new(config: AppConfig, api_client: Arc<TwitterApiClient>) -> Self {
        let user_name = api_client.user_name().to_owned();
        let sort_key = config.default_sort.into();
        Self {
            running: true,
            events: EventHandler::new(),
            config,
            user_name,
            friends: FriendsList::new(),
            sort_key,
            sort_order: SortOrder::Ascending,
            selected_index: 0,
            fetching: false,
            status_message: None,
            error_detail: None,
            show_help: false,
            api_client,
            fetch_cancel: CancellationToken::new(),
        }
    }

    // -- Main event loop ----------------------------------------------------

    pub async fn run(mut self, mut terminal: DefaultTerminal) -> color_eyre::Result<()> {
        self.start_fetch();

        while self.running {
            terminal.draw(|frame| self.draw(frame))?;
            match self.events.next().await? {
                Event::Tick => {}
                Event::Crossterm(event) => {
                    if let crossterm::event::Event::Key(key) = event
                        && key.kind == crossterm::event::KeyEventKind::Press
                    {
                        self.handle_key_event(key);
                    }
                }
                Event::App(app_event) => self.handle_app_event(app_event),
            }
        }
        Ok(())
    }

    fn draw(&self, frame: &mut ratatui::Frame) {
        ui::draw(frame, self);
    }

    /// Spawn the friends-fetch loop on its own task.
    fn start_fetch(&mut self) {
        let fetcher = FriendsFetcher::new(
            Arc::clone(&self.api_client),
            self.user_name.clone(),
            Duration::from_secs(self.config.rate_limit_backoff_secs),
            self.fetch_cancel.clone(),
            self.events.sender(),
        );
        tokio::spawn(fetcher.run());
        self.fetching = true;
    }

    // -- Key event routing --------------------------------------------------

    fn handle_key_event(&mut self, key: KeyEvent) {
        // Ctrl-C always quits.
        if key.modifiers.contains(KeyModifiers::CONTROL)
            && matches!(key.code, KeyCode::Char('c' | 'C'))
        {
            self.events.send(AppEvent::Quit);
            return;
        }

        // The error popup swallows input until dismissed.
        if self.error_detail.is_some() {
            if matches!(key.code, KeyCode::Esc | KeyCode::Enter | KeyCode::Char('q')) {
                self.events.send(AppEvent::DismissError);
            }
            return;
        }

        if self.show_help {
            if matches!(
                key.code,
                KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('?')
            ) {
                self.show_help = false;
            }
            return;
        }

        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => {
                self.events.send(AppEvent::Quit);
            }
            KeyCode::Char('j') | KeyCode::Down => {
                if self.selected_index + 1 < self.friends.len() {
                    self.selected_index += 1;
                }
            }
            KeyCode::Char('k') | KeyCode::Up => {
                self.selected_index = self.selected_index.saturating_sub(1);
            }
            KeyCode::Enter | KeyCode::Char('o') => {
                if let Some(record) = self.selected_record() {
                    self.events.send(AppEvent::ViewProfile {
                        user_name: record.user_name.clone(),
                    });
                }
            }
            KeyCode::Char('u') => {
                if let Some(record) = self.selected_record() {
                    self.events.send(AppEvent::Unfollow {
                        user_id: record.user_id,
                    });
                }
            }
            KeyCode::Char('1') => {
                self.events.send(AppEvent::SortBy(SortKey::Username));
            }
            KeyCode::Char('2') => {
                self.events.send(AppEvent::SortBy(SortKey::LastTweet));
            }
            KeyCode::Char('?') => {
                self.show_help = true;
            }
            _ => {}
        }
    }

    // -- App event handling -------------------------------------------------

    fn handle_app_event(&mut self, event: AppEvent) {
        match event {
            AppEvent::Quit => {
                self.fetch_cancel.cancel();
                self.running = false;
            }

            // Fetch loop notifications
            AppEvent::FriendFetched(record) => {
                self.friends.add(record);
            }
            AppEvent::FetchRateLimited(message) => {
                self.status_message = Some(format!("{message} (retrying)"));
            }
            AppEvent::FetchFailed(message) => {
                self.fetching = false;
                self.error_detail = Some(message);
            }
            AppEvent::FetchFinished => {
                self.fetching = false;
                self.status_message = Some(format!("Fetched {} friends", self.friends.len()));
            }

            // User requests
            AppEvent::Unfollow { user_id } => {
                self.dispatch_unfollow(user_id);
            }
            AppEvent::ViewProfile { user_name } => {
                let url = profile_url(&user_name);
                if let Err(e) = open::that_detached(&url) {
                    tracing::warn!(%url, "failed to open browser: {e}");
                }
            }
            AppEvent::SortBy(key) => {
                if self.sort_key == key {
                    self.sort_order = self.sort_order.flipped();
                } else {
                    self.sort_key = key;
                    self.sort_order = SortOrder::Ascending;
                }
            }
            AppEvent::DismissError => {
                self.error_detail = None;
            }

            // Unfollow task result
            AppEvent::UnfollowCompleted { user_id, result } => match result {
                Ok(user_name) => {
                    self.friends.remove(user_id);
                    self.clamp_selection();
                    self.status_message = Some(format!("You have unfollowed '{user_name}'."));
                }
                Err(message) => {
                    self.error_detail = Some(message.to_string());
                }
            },
        }
    }

    // -- API dispatch -------------------------------------------------------

    fn dispatch_unfollow(&self, user_id: u64) {
        let client = Arc::clone(&self.api_client);
        let sender = self.events.sender();

        tokio::spawn(async move {
            let result = client
                .destroy_friendship(user_id)
                .await
                .map(|user| user.screen_name)
                .map_err(|e| Arc::new(e.to_string()));
            let _ = sender.send(Event::App(AppEvent::UnfollowCompleted { user_id, result }));
        });
    }

    // -- Helpers ------------------------------------------------------------

    /// The record under the cursor, resolved through the sorted view.
    pub fn selected_record(&self) -> Option<&FriendRecord> {
        let order = self.friends.sorted_indices(self.sort_key, self.sort_order);
        order
            .get(self.selected_index)
            .and_then(|&row| self.friends.get(row))
    }

    fn clamp_selection(&mut self) {
        if self.friends.is_empty() {
            self.selected_index = 0;
        } else {
            self.selected_index = self.selected_index.min(self.friends.len() - 1);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::{App, profile_url};
    use crate::api::TwitterApiClient;
    use crate::auth::credentials::Credentials;
    use crate::config::AppConfig;
    use crate::event::AppEvent;
    use crate::store::FriendRecord;

    fn test_app() -> App {
        let creds = Credentials {
            consumer_key: "ck".into(),
            consumer_secret: "cs".into(),
            access_token: "at".into(),
            access_secret: "as".into(),
            user_name: "me".into(),
        };
        App::new(AppConfig::default(), Arc::new(TwitterApiClient::new(creds)))
    }

    fn record(user_id: u64, user_name: &str) -> FriendRecord {
        FriendRecord {
            user_id,
            user_name: user_name.into(),
            last_tweet_at: None,
        }
    }

    #[test]
    fn builds_profile_url() {
        assert_eq!(profile_url("alice"), "https://twitter.com/alice");
    }

    #[tokio::test]
    async fn successful_unfollow_removes_only_the_targeted_row() {
        let mut app = test_app();
        app.friends.add(record(101, "alice"));
        app.friends.add(record(202, "bob"));

        app.handle_app_event(AppEvent::UnfollowCompleted {
            user_id: 101,
            result: Ok("alice".into()),
        });

        assert_eq!(app.friends.len(), 1);
        assert_eq!(app.friends.get(0).unwrap().user_id, 202);
        assert_eq!(
            app.status_message.as_deref(),
            Some("You have unfollowed 'alice'.")
        );
        assert!(app.error_detail.is_none());
    }

    #[tokio::test]
    async fn failed_unfollow_leaves_the_store_unchanged() {
        let mut app = test_app();
        app.friends.add(record(101, "alice"));
        app.friends.add(record(202, "bob"));

        app.handle_app_event(AppEvent::UnfollowCompleted {
            user_id: 101,
            result: Err(Arc::new("not found".into())),
        });

        assert_eq!(app.friends.len(), 2);
        assert_eq!(app.friends.get(0).unwrap().user_id, 101);
        assert_eq!(app.error_detail.as_deref(), Some("not found"));
    }
}
