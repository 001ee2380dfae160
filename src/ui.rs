use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};

use crate::app_state::ChatWidget;
use crate::constants::WINDOW_TITLE;
use crate::ui_components::{ChatView, SendButton};

/// Draws one frame. Reads the widget, only touches view state.
pub fn draw_ui<B>(f: &mut ratatui::Frame, widget: &ChatWidget<B>, view: &mut ChatView) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Title
            Constraint::Min(3),    // History
            Constraint::Length(3), // Input row
        ])
        .split(f.area());

    render_title(f, chunks[0]);
    view.history.render(f, chunks[1], widget.history().as_slice());
    render_input_row(f, view, chunks[2]);
}

fn render_title(f: &mut ratatui::Frame, area: Rect) {
    let title = Paragraph::new(Line::from(Span::styled(
        WINDOW_TITLE,
        Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
    )))
    .alignment(Alignment::Center)
    .block(Block::default().borders(Borders::ALL));
    f.render_widget(title, area);
}

fn render_input_row(f: &mut ratatui::Frame, view: &mut ChatView, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(10), Constraint::Length(SendButton::width())])
        .split(area);

    view.input.render(f, chunks[0]);
    view.send_button.render(f, chunks[1]);
}
