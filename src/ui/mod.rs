pub mod error_popup;
pub mod friends_table;
pub mod help;
pub mod status_bar;

use ratatui::Frame;
use ratatui::layout::{Constraint, Layout};

use crate::app::App;

use error_popup::ErrorPopup;
use friends_table::FriendsTable;
use help::HelpView;
use status_bar::StatusBar;

pub fn draw(frame: &mut Frame, app: &App) {
    let area = frame.area();

    let [main_area, status_area] =
        Layout::vertical([Constraint::Min(1), Constraint::Length(1)]).areas(area);

    frame.render_widget(FriendsTable::new(app), main_area);
    frame.render_widget(StatusBar::new(app), status_area);

    if app.show_help {
        frame.render_widget(HelpView::new(), main_area);
    }

    // Error popup renders on top of everything.
    if let Some(ref detail) = app.error_detail {
        frame.render_widget(ErrorPopup::new(detail), frame.area());
    }
}
