use crate::search::ResultItem;
use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, BorderType, Borders, Paragraph},
    Frame,
};
use textwrap::wrap;

const LINK_LABEL: &str = "Till produkten →";

/// Scrollable list of result cards with a selected entry
pub struct ResultList {
    selected: usize,
    scroll_offset: u16,
    viewport_height: u16,
    viewport_width: u16,
}

impl ResultList {
    pub fn new() -> Self {
        Self {
            selected: 0,
            scroll_offset: 0,
            viewport_height: 0,
            viewport_width: 0,
        }
    }

    pub fn selected(&self) -> usize {
        self.selected
    }

    /// Move the selection down, clamped to the last item
    pub fn select_next(&mut self, items: &[ResultItem]) {
        if self.selected + 1 < items.len() {
            self.selected += 1;
        }
        self.ensure_selected_visible(items);
    }

    pub fn select_previous(&mut self, items: &[ResultItem]) {
        self.selected = self.selected.saturating_sub(1);
        self.ensure_selected_visible(items);
    }

    /// Jump back to the first result
    pub fn scroll_to_top(&mut self) {
        self.selected = 0;
        self.scroll_offset = 0;
    }

    pub fn scroll_down(&mut self, lines: u16, items: &[ResultItem]) {
        let total = self.total_height(items, self.viewport_width);
        let max_scroll = total.saturating_sub(self.viewport_height);
        self.scroll_offset = self.scroll_offset.saturating_add(lines).min(max_scroll);
    }

    pub fn scroll_up(&mut self, lines: u16) {
        self.scroll_offset = self.scroll_offset.saturating_sub(lines);
    }

    /// Keep the selection in range after the item list was replaced
    pub fn clamp_selection(&mut self, len: usize) {
        if self.selected >= len {
            self.selected = len.saturating_sub(1);
        }
    }

    fn card_lines(item: &ResultItem, width: u16) -> Vec<Line<'static>> {
        let content_width = (width.saturating_sub(4) as usize).max(10);
        let mut lines = Vec::new();

        for line in wrap(&item.title, content_width) {
            lines.push(Line::from(Span::styled(
                line.into_owned(),
                Style::default().add_modifier(Modifier::BOLD),
            )));
        }
        for line in wrap(&item.snippet, content_width) {
            lines.push(Line::from(line.into_owned()));
        }
        lines.push(Line::from(Span::styled(
            format!("Bild: {}", item.image),
            Style::default().fg(Color::DarkGray),
        )));
        lines.push(Line::from(vec![
            Span::styled(
                LINK_LABEL,
                Style::default()
                    .fg(Color::LightCyan)
                    .add_modifier(Modifier::UNDERLINED),
            ),
            Span::raw(" "),
            Span::styled(item.link.clone(), Style::default().fg(Color::DarkGray)),
        ]));
        lines
    }

    fn card_height(item: &ResultItem, width: u16) -> u16 {
        Self::card_lines(item, width).len() as u16 + 2 // borders
    }

    fn total_height(&self, items: &[ResultItem], width: u16) -> u16 {
        items.iter().map(|item| Self::card_height(item, width)).sum()
    }

    fn ensure_selected_visible(&mut self, items: &[ResultItem]) {
        let width = self.viewport_width;
        let top: u16 = items
            .iter()
            .take(self.selected)
            .map(|item| Self::card_height(item, width))
            .sum();
        let height = items
            .get(self.selected)
            .map(|item| Self::card_height(item, width))
            .unwrap_or(0);

        if top < self.scroll_offset {
            self.scroll_offset = top;
        } else if top + height > self.scroll_offset + self.viewport_height {
            self.scroll_offset = (top + height).saturating_sub(self.viewport_height);
        }
    }

    pub fn render(&mut self, frame: &mut Frame, area: Rect, items: &[ResultItem]) {
        self.viewport_height = area.height;
        self.viewport_width = area.width;

        let visible_start = self.scroll_offset;
        let visible_end = visible_start + area.height;
        let mut current_y = 0u16;

        for (i, item) in items.iter().enumerate() {
            let height = Self::card_height(item, area.width);
            let pos = current_y;
            current_y += height;

            if pos + height <= visible_start || pos >= visible_end {
                continue;
            }

            // Cards cut off at the top are scrolled inside their own area
            let clipped = visible_start.saturating_sub(pos);
            let render_y = pos.saturating_sub(visible_start);
            let card_area = Rect {
                x: area.x,
                y: area.y + render_y,
                width: area.width,
                height: (height - clipped).min(area.height - render_y),
            };

            self.render_card(frame, item, i == self.selected, card_area, clipped);
        }
    }

    fn render_card(
        &self,
        frame: &mut Frame,
        item: &ResultItem,
        selected: bool,
        area: Rect,
        clipped: u16,
    ) {
        let border_color = if selected {
            Color::LightGreen
        } else {
            Color::DarkGray
        };

        let block = Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(border_color));

        let paragraph = Paragraph::new(Text::from(Self::card_lines(item, area.width)))
            .block(block)
            .scroll((clipped, 0));
        frame.render_widget(paragraph, area);
    }
}

impl Default for ResultList {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(n: usize) -> ResultItem {
        ResultItem {
            title: format!("Set {n}"),
            snippet: "snippet".to_string(),
            link: format!("https://x/{n}"),
            image: crate::search::PLACEHOLDER_IMAGE.to_string(),
        }
    }

    #[test]
    fn test_card_shows_link_label_and_image() {
        let lines = ResultList::card_lines(&item(1), 80);
        let rendered: Vec<String> = lines.iter().map(|l| l.to_string()).collect();
        assert_eq!(rendered[0], "Set 1");
        assert!(rendered
            .iter()
            .any(|l| l.contains(crate::search::PLACEHOLDER_IMAGE)));
        assert!(rendered.last().unwrap().starts_with("Till produkten →"));
    }

    #[test]
    fn test_selection_is_clamped() {
        let items: Vec<_> = (0..3).map(item).collect();
        let mut list = ResultList::new();

        list.select_previous(&items);
        assert_eq!(list.selected(), 0);

        for _ in 0..5 {
            list.select_next(&items);
        }
        assert_eq!(list.selected(), 2);

        list.clamp_selection(1);
        assert_eq!(list.selected(), 0);
    }

    #[test]
    fn test_scroll_to_top_resets_selection() {
        let items: Vec<_> = (0..3).map(item).collect();
        let mut list = ResultList::new();
        list.select_next(&items);
        list.scroll_to_top();
        assert_eq!(list.selected(), 0);
        assert_eq!(list.scroll_offset, 0);
    }
}
