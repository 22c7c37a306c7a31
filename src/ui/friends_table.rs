use chrono::{DateTime, Utc};
use ratatui::buffer::Buffer;
use ratatui::layout::{Constraint, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Block, Borders, Row, StatefulWidget, Table, TableState, Widget};

use crate::app::App;
use crate::store::{SortKey, SortOrder};

/// Two-column friends table: username and last tweet time, sorted by the
/// app's current sort key with the active column marked in the header.
pub struct FriendsTable<'a> {
    app: &'a App,
}

impl<'a> FriendsTable<'a> {
    pub fn new(app: &'a App) -> Self {
        Self { app }
    }
}

fn format_last_tweet(ts: Option<DateTime<Utc>>) -> String {
    match ts {
        Some(ts) => ts.format("%m/%d/%Y %H:%M:%S").to_string(),
        None => "never".to_string(),
    }
}

fn sort_marker(active: bool, order: SortOrder) -> &'static str {
    if !active {
        return "";
    }
    match order {
        SortOrder::Ascending => " \u{25B2}",
        SortOrder::Descending => " \u{25BC}",
    }
}

impl Widget for FriendsTable<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let app = self.app;

        let block = Block::default()
            .borders(Borders::ALL)
            .title(format!(" Friends of @{} ", app.user_name))
            .title_style(
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            )
            .border_style(Style::default().fg(Color::DarkGray));

        if app.friends.is_empty() {
            let inner = block.inner(area);
            block.render(area, buf);
            let msg = if app.fetching {
                "Loading friends..."
            } else {
                "No friends to display"
            };
            buf.set_string(
                inner.x + 1,
                inner.y,
                msg,
                Style::default().fg(Color::DarkGray),
            );
            return;
        }

        let header = Row::new([
            format!(
                "Username{}",
                sort_marker(app.sort_key == SortKey::Username, app.sort_order)
            ),
            format!(
                "Last Tweet At{}",
                sort_marker(app.sort_key == SortKey::LastTweet, app.sort_order)
            ),
        ])
        .style(
            Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        );

        let order = app.friends.sorted_indices(app.sort_key, app.sort_order);
        let rows = order.iter().filter_map(|&i| {
            let record = app.friends.get(i)?;
            Some(Row::new([
                record.user_name.clone(),
                format_last_tweet(record.last_tweet_at),
            ]))
        });

        let table = Table::new(rows, [Constraint::Fill(1), Constraint::Length(20)])
            .header(header)
            .block(block)
            .row_highlight_style(
                Style::default()
                    .bg(Color::DarkGray)
                    .add_modifier(Modifier::BOLD),
            )
            .highlight_symbol("> ");

        let mut state = TableState::default();
        state.select(Some(app.selected_index.min(order.len().saturating_sub(1))));
        StatefulWidget::render(table, area, buf, &mut state);
    }
}
