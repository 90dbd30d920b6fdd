use crossterm::event::KeyEvent;
use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::Span,
    widgets::{Block, BorderType, Borders},
    Frame,
};
use tui_textarea::TextArea;

/// Single-line search box wrapper around tui-textarea
pub struct InputWidget {
    textarea: TextArea<'static>,
}

impl InputWidget {
    pub fn new() -> Self {
        Self::with_text("")
    }

    /// Create an input box pre-filled with `text`
    pub fn with_text(text: &str) -> Self {
        let mut textarea = TextArea::new(vec![text.to_string()]);
        textarea.set_block(
            Block::default()
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded)
                .title(Span::styled(
                    " 🔍 Sök produkter... (Enter=Sök) ",
                    Style::default()
                        .fg(Color::LightBlue)
                        .add_modifier(Modifier::BOLD),
                ))
                .border_style(Style::default().fg(Color::DarkGray)),
        );
        textarea.set_cursor_line_style(Style::default());
        textarea.set_placeholder_text("Sök produkter...");
        textarea.move_cursor(tui_textarea::CursorMove::End);

        Self { textarea }
    }

    /// Handle keyboard input
    pub fn handle_key(&mut self, key: KeyEvent) {
        self.textarea.input(key);
    }

    /// Current text. The box is single-line, so only the first line counts.
    pub fn text(&self) -> String {
        self.textarea.lines().first().cloned().unwrap_or_default()
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        frame.render_widget(&self.textarea, area);
    }
}

impl Default for InputWidget {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{KeyCode, KeyModifiers};

    #[test]
    fn test_typing_updates_text() {
        let mut input = InputWidget::with_text("leg");
        input.handle_key(KeyEvent::new(KeyCode::Char('o'), KeyModifiers::NONE));
        assert_eq!(input.text(), "lego");

        input.handle_key(KeyEvent::new(KeyCode::Backspace, KeyModifiers::NONE));
        assert_eq!(input.text(), "leg");
    }
}
