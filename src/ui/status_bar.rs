use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Widget;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::app::App;

/// Bottom status bar: row count, fetch progress, and transient messages.
pub struct StatusBar<'a> {
    pub app: &'a App,
}

impl<'a> StatusBar<'a> {
    pub fn new(app: &'a App) -> Self {
        Self { app }
    }
}

impl Widget for StatusBar<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.height == 0 || area.width == 0 {
            return;
        }

        let bg_style = Style::default().bg(Color::DarkGray).fg(Color::White);
        for x in area.x..area.x + area.width {
            buf[(x, area.y)].set_style(bg_style);
        }

        let mut spans = Vec::new();

        spans.push(Span::styled(
            " unfriendly ",
            Style::default()
                .bg(Color::Blue)
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        ));
        spans.push(Span::styled(
            format!(" {} friends", self.app.friends.len()),
            bg_style,
        ));

        if self.app.fetching {
            spans.push(Span::styled(
                " [fetching...]",
                Style::default().bg(Color::DarkGray).fg(Color::Yellow),
            ));
        }

        // Transient message, right-aligned. Messages are relayed verbatim
        // from the API, so truncation must respect char boundaries and
        // display width, not byte length.
        if let Some(ref msg) = self.app.status_message {
            let left_width: usize = spans.iter().map(|s| s.width()).sum();
            let available = (area.width as usize).saturating_sub(left_width);
            let msg = truncate_to_width(msg, available);
            let padding = available.saturating_sub(msg.width());
            if padding > 0 {
                spans.push(Span::styled(" ".repeat(padding), bg_style));
            }
            spans.push(Span::styled(
                msg,
                Style::default().bg(Color::DarkGray).fg(Color::Yellow),
            ));
        }

        let line = Line::from(spans);
        buf.set_line(area.x, area.y, &line, area.width);
    }
}

/// Longest prefix of `msg` that fits within `max_width` terminal columns.
fn truncate_to_width(msg: &str, max_width: usize) -> &str {
    let mut width = 0;
    let mut end = 0;
    for (idx, ch) in msg.char_indices() {
        let ch_width = ch.width().unwrap_or(0);
        if width + ch_width > max_width {
            break;
        }
        width += ch_width;
        end = idx + ch.len_utf8();
    }
    &msg[..end]
}
