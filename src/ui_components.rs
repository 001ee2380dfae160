use ratatui::{
    layout::{Constraint, Direction, Layout, Position, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Paragraph, Scrollbar, ScrollbarOrientation, ScrollbarState},
};
use tui_textarea::{Input, TextArea};

use crate::app_state::{Message, Sender};
use crate::constants::{INPUT_PLACEHOLDER, SEND_LABEL};

/// Scroll state for the history pane.
///
/// Sticks to the bottom until the user scrolls up, and goes back to
/// following once they reach the end again.
#[derive(Debug)]
pub struct HistoryView {
    pub scroll_position: usize,
    pub max_scroll: usize,
    follow: bool,
}

impl HistoryView {
    pub fn new() -> Self {
        Self {
            scroll_position: 0,
            max_scroll: 0,
            follow: true,
        }
    }

    pub fn is_following(&self) -> bool {
        self.follow
    }

    pub fn scroll_up(&mut self, lines: usize) {
        self.scroll_position = self.scroll_position.saturating_sub(lines);
        if lines > 0 && self.scroll_position < self.max_scroll {
            self.follow = false;
        }
    }

    pub fn scroll_down(&mut self, lines: usize) {
        self.scroll_position = (self.scroll_position + lines).min(self.max_scroll);
        if self.scroll_position == self.max_scroll {
            self.follow = true;
        }
    }

    pub fn scroll_to_bottom(&mut self) {
        self.scroll_position = self.max_scroll;
        self.follow = true;
    }

    pub fn scroll_to_top(&mut self) {
        self.scroll_position = 0;
        self.follow = self.max_scroll == 0;
    }

    fn update_max_scroll(&mut self, content_lines: usize, visible_lines: usize) {
        // Paragraph offsets are u16.
        self.max_scroll = content_lines
            .saturating_sub(visible_lines)
            .min(u16::MAX as usize);
        if self.follow {
            self.scroll_position = self.max_scroll;
        } else {
            self.scroll_position = self.scroll_position.min(self.max_scroll);
        }
    }

    pub fn render(&mut self, f: &mut ratatui::Frame, area: Rect, messages: &[Message]) {
        let block = Block::default().borders(Borders::ALL);
        let inner = block.inner(area);

        // Leave the last column to the scrollbar.
        let text_width = inner.width.saturating_sub(1).max(1) as usize;
        let lines: Vec<Line<'static>> = messages
            .iter()
            .flat_map(|message| message_lines(message, text_width))
            .collect();

        self.update_max_scroll(lines.len(), inner.height as usize);

        let chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Min(0), Constraint::Length(1)])
            .split(inner);

        f.render_widget(block, area);
        let paragraph = Paragraph::new(Text::from(lines))
            .scroll((u16::try_from(self.scroll_position).unwrap_or(u16::MAX), 0));
        f.render_widget(paragraph, chunks[0]);

        if self.max_scroll > 0 {
            let mut scrollbar_state = ScrollbarState::new(self.max_scroll).position(self.scroll_position);

            let scrollbar = Scrollbar::default()
                .orientation(ScrollbarOrientation::VerticalRight)
                .begin_symbol(Some("↑"))
                .end_symbol(Some("↓"))
                .track_symbol(Some("│"))
                .thumb_symbol("█");

            f.render_stateful_widget(scrollbar, chunks[1], &mut scrollbar_state);
        }
    }
}

impl Default for HistoryView {
    fn default() -> Self {
        Self::new()
    }
}

fn sender_style(sender: Sender) -> Style {
    match sender {
        Sender::User => Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        Sender::Bot => Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
    }
}

fn sanitize(text: &str) -> String {
    // CRLF line endings become plain breaks and stray carriage returns go away.
    text.replace("\r\n", "\n")
        .chars()
        .filter(|c| *c != '\r')
        .map(|c| if c.is_control() && c != '\n' && c != '\t' { '?' } else { c })
        .collect::<String>()
        .replace('\t', "    ")
}

/// Wraps one history entry to `width` columns, label first.
pub fn message_lines(message: &Message, width: usize) -> Vec<Line<'static>> {
    let label = format!("{}: ", message.sender().label());
    let label_style = sender_style(message.sender());
    let body = sanitize(message.text());

    let mut lines = Vec::new();
    for (index, raw_line) in body.split('\n').enumerate() {
        let source = if index == 0 {
            format!("{}{}", label, raw_line)
        } else {
            raw_line.to_string()
        };

        let wrapped = textwrap::wrap(&source, width);
        if wrapped.is_empty() {
            lines.push(Line::from(""));
            continue;
        }

        for (row, piece) in wrapped.iter().enumerate() {
            if index == 0 && row == 0 {
                lines.push(labelled_line(piece, &label, label_style));
            } else {
                lines.push(Line::from(piece.to_string()));
            }
        }
    }
    lines
}

fn labelled_line(piece: &str, label: &str, label_style: Style) -> Line<'static> {
    let label_part = if piece.starts_with(label) {
        label
    } else {
        // The label itself was wider than the view and got wrapped.
        let trimmed = label.trim_end();
        if piece.starts_with(trimmed) {
            trimmed
        } else {
            return Line::from(Span::styled(piece.to_string(), label_style));
        }
    };

    Line::from(vec![
        Span::styled(label_part.to_string(), label_style),
        Span::raw(piece[label_part.len()..].to_string()),
    ])
}

/// Single-line text box backing the draft.
pub struct InputBox {
    textarea: TextArea<'static>,
}

impl InputBox {
    pub fn new() -> Self {
        Self {
            textarea: Self::empty_textarea(),
        }
    }

    fn empty_textarea() -> TextArea<'static> {
        let mut textarea = TextArea::default();
        textarea.set_placeholder_text(INPUT_PLACEHOLDER);
        textarea.set_cursor_line_style(Style::default());
        textarea
    }

    pub fn text(&self) -> String {
        self.textarea.lines().join(" ")
    }

    pub fn input(&mut self, input: impl Into<Input>) -> bool {
        self.textarea.input(input)
    }

    pub fn insert_str(&mut self, text: &str) -> bool {
        self.textarea.insert_str(text)
    }

    /// Rebuilds the box when the draft changed underneath it.
    pub fn sync(&mut self, draft: &str) {
        if self.text() == draft {
            return;
        }
        let mut textarea = Self::empty_textarea();
        textarea.insert_str(draft);
        self.textarea = textarea;
    }

    pub fn render(&mut self, f: &mut ratatui::Frame, area: Rect) {
        self.textarea.set_block(
            Block::default()
                .borders(Borders::ALL)
                .title("Mensaje (Enter para enviar)")
                .border_style(Style::default().fg(Color::Green)),
        );
        f.render_widget(&self.textarea, area);
    }
}

impl Default for InputBox {
    fn default() -> Self {
        Self::new()
    }
}

/// The clickable send control. Remembers where it was last drawn.
#[derive(Debug, Default)]
pub struct SendButton {
    area: Rect,
}

impl SendButton {
    pub fn width() -> u16 {
        SEND_LABEL.chars().count() as u16 + 4
    }

    pub fn contains(&self, column: u16, row: u16) -> bool {
        self.area.contains(Position::new(column, row))
    }

    pub fn render(&mut self, f: &mut ratatui::Frame, area: Rect) {
        self.area = area;
        let button = Paragraph::new(Line::from(Span::styled(
            SEND_LABEL,
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        )))
        .centered()
        .block(Block::default().borders(Borders::ALL));
        f.render_widget(button, area);
    }
}

/// Everything the renderer keeps between frames that is not chat state.
#[derive(Default)]
pub struct ChatView {
    pub history: HistoryView,
    pub input: InputBox,
    pub send_button: SendButton,
}

impl ChatView {
    pub fn new() -> Self {
        Self::default()
    }
}
