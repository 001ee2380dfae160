use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEventKind};
use tracing::debug;

use crate::app_state::ChatWidget;
use crate::chat::ChatBackend;
use crate::ui_components::ChatView;

/// Returns `true` when the user asked to quit.
pub fn handle_key_event<B: ChatBackend>(
    widget: &mut ChatWidget<B>,
    view: &mut ChatView,
    key: KeyEvent,
) -> bool {
    if key.kind != KeyEventKind::Press {
        return false;
    }

    match (key.code, key.modifiers) {
        // Exit
        (KeyCode::Char('c'), KeyModifiers::CONTROL)
        | (KeyCode::Char('q'), KeyModifiers::CONTROL)
        | (KeyCode::Esc, _) => true,

        // Send
        (KeyCode::Enter, KeyModifiers::NONE) => {
            if let Some(request) = widget.handle_key_trigger(KeyCode::Enter) {
                debug!(%request, "Submitted draft from keyboard");
                view.history.scroll_to_bottom();
            }
            false
        }

        // Scrolling
        (KeyCode::PageUp, _) => {
            view.history.scroll_up(5);
            false
        }
        (KeyCode::PageDown, _) => {
            view.history.scroll_down(5);
            false
        }
        (KeyCode::Up, KeyModifiers::CONTROL) => {
            view.history.scroll_up(1);
            false
        }
        (KeyCode::Down, KeyModifiers::CONTROL) => {
            view.history.scroll_down(1);
            false
        }
        (KeyCode::Home, KeyModifiers::CONTROL) => {
            view.history.scroll_to_top();
            false
        }
        (KeyCode::End, KeyModifiers::CONTROL) => {
            view.history.scroll_to_bottom();
            false
        }

        // The box is single-line; swallow newline editing.
        (KeyCode::Enter, _) | (KeyCode::Char('m'), KeyModifiers::CONTROL) => false,

        // Everything else edits the draft
        _ => {
            if view.input.input(key) {
                widget.update_draft(view.input.text());
            }
            false
        }
    }
}

pub fn handle_paste<B>(widget: &mut ChatWidget<B>, view: &mut ChatView, data: &str) {
    let flattened: String = data
        .chars()
        .map(|c| if c == '\r' || c == '\n' { ' ' } else { c })
        .collect();
    debug!(len = flattened.len(), "Paste into draft");
    if view.input.insert_str(&flattened) {
        widget.update_draft(view.input.text());
    }
}

pub fn handle_mouse_event<B: ChatBackend>(
    widget: &mut ChatWidget<B>,
    view: &mut ChatView,
    kind: MouseEventKind,
    column: u16,
    row: u16,
) {
    match kind {
        MouseEventKind::Down(MouseButton::Left) if view.send_button.contains(column, row) => {
            if let Some(request) = widget.submit_draft() {
                debug!(%request, "Submitted draft from send button");
                view.history.scroll_to_bottom();
            }
        }
        MouseEventKind::ScrollUp => view.history.scroll_up(3),
        MouseEventKind::ScrollDown => view.history.scroll_down(3),
        _ => {}
    }
}
