use crate::event::{Event, EventResult};
use crate::search::SearchError;
use crate::tui::{InputWidget, ResultList};
use crate::view::{FetchKind, FetchOutcome, PendingFetch, SearchView};
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Paragraph},
    Frame,
};
use tokio::sync::mpsc;

const HEADER: &str = "Lego från Stor&Liten";

/// Main application state
pub struct App {
    /// Search state and operations
    view: SearchView,
    /// Query input box
    input: InputWidget,
    /// Result cards with selection and scrolling
    result_list: ResultList,
    /// Transient status line (e.g. a link that failed to open)
    notice: Option<String>,
    should_quit: bool,
    /// Finished fetches come back through this channel
    fetch_tx: mpsc::UnboundedSender<FetchOutcome>,
    fetch_rx: mpsc::UnboundedReceiver<FetchOutcome>,
}

impl App {
    /// Create a new application around `view`, with the input pre-filled
    /// from the view's current query.
    pub fn new(view: SearchView) -> Self {
        let (fetch_tx, fetch_rx) = mpsc::unbounded_channel();
        let input = InputWidget::with_text(view.query());

        Self {
            view,
            input,
            result_list: ResultList::new(),
            notice: None,
            should_quit: false,
            fetch_tx,
            fetch_rx,
        }
    }

    pub fn view(&self) -> &SearchView {
        &self.view
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    /// Non-blocking check for a finished fetch
    pub fn poll_fetch(&mut self) -> Option<FetchOutcome> {
        self.fetch_rx.try_recv().ok()
    }

    /// Handle an event
    pub fn handle_event(&mut self, event: Event) -> EventResult<()> {
        match event {
            Event::Key(key) => self.handle_key(key),
            Event::Mouse(mouse) => self.handle_mouse(mouse),
            Event::Fetched(outcome) => {
                self.apply_fetch(outcome);
                Ok(())
            }
            Event::Quit => {
                self.should_quit = true;
                Ok(())
            }
            Event::Resize(..) => Ok(()),
        }
    }

    fn handle_mouse(&mut self, mouse: crossterm::event::MouseEvent) -> EventResult<()> {
        use crossterm::event::MouseEventKind;

        match mouse.kind {
            MouseEventKind::ScrollUp => self.result_list.scroll_up(3),
            MouseEventKind::ScrollDown => self.result_list.scroll_down(3, self.view.items()),
            _ => {}
        }
        Ok(())
    }

    fn handle_key(&mut self, key: KeyEvent) -> EventResult<()> {
        if key.kind == KeyEventKind::Release {
            return Ok(());
        }

        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

        match key.code {
            KeyCode::Char('c') if ctrl => self.should_quit = true,
            KeyCode::Esc => self.should_quit = true,
            KeyCode::Enter => self.submit(),
            KeyCode::Char('n') if ctrl => {
                let fetch = self.view.begin_next_page();
                self.after_page_change(fetch);
            }
            KeyCode::Char('p') if ctrl => {
                let fetch = self.view.begin_previous_page();
                self.after_page_change(fetch);
            }
            KeyCode::Char('o') if ctrl => self.open_selected(),
            KeyCode::Up => self.result_list.select_previous(self.view.items()),
            KeyCode::Down => self.result_list.select_next(self.view.items()),
            KeyCode::PageUp => self.result_list.scroll_up(10),
            KeyCode::PageDown => self.result_list.scroll_down(10, self.view.items()),
            _ => {
                self.input.handle_key(key);
                self.view.set_query(self.input.text());
            }
        }
        Ok(())
    }

    /// Submit the query currently in the input box
    pub fn submit(&mut self) {
        self.notice = None;
        if let Some(fetch) = self.view.begin_submit() {
            self.spawn_fetch(fetch);
        }
    }

    fn after_page_change(&mut self, fetch: Option<PendingFetch>) {
        if self.view.take_scroll_request() {
            self.result_list.scroll_to_top();
        }
        if let Some(fetch) = fetch {
            self.spawn_fetch(fetch);
        }
    }

    /// Run `fetch` on the runtime; the outcome is picked up by [`App::poll_fetch`].
    fn spawn_fetch(&self, fetch: PendingFetch) {
        tracing::debug!(query = %fetch.query, page = fetch.page, kind = ?fetch.kind, "spawning search");

        let provider = self.view.provider();
        let tx = self.fetch_tx.clone();
        let request = fetch.clone();
        let task = tokio::spawn(async move { fetch.run(provider.as_ref()).await });

        // Every spawned fetch reports back, even when the provider panics,
        // so the loading state always clears.
        tokio::spawn(async move {
            let outcome = match task.await {
                Ok(outcome) => outcome,
                Err(e) => {
                    tracing::error!(query = %request.query, error = %e, "search task failed");
                    FetchOutcome {
                        request,
                        result: Err(SearchError::TaskFailed(e.to_string())),
                    }
                }
            };
            // Receiver only goes away on shutdown
            let _ = tx.send(outcome);
        });
    }

    fn apply_fetch(&mut self, outcome: FetchOutcome) {
        let fresh_search = outcome.request.kind == FetchKind::Submit && outcome.result.is_ok();
        self.view.apply(outcome);

        if fresh_search {
            self.result_list.scroll_to_top();
        }
        self.result_list.clamp_selection(self.view.items().len());
    }

    fn open_selected(&mut self) {
        let Some(item) = self.view.items().get(self.result_list.selected()) else {
            return;
        };

        match open::that_detached(&item.link) {
            Ok(()) => {
                tracing::debug!(link = %item.link, "opened result in browser");
                self.notice = None;
            }
            Err(e) => {
                tracing::warn!(link = %item.link, error = %e, "failed to open link");
                self.notice = Some(format!("Kunde inte öppna {}: {}", item.link, e));
            }
        }
    }

    /// Render the application UI
    pub fn render(&mut self, frame: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1), // Header
                Constraint::Length(3), // Search input
                Constraint::Length(1), // Error line
                Constraint::Min(3),    // Results
                Constraint::Length(3), // Pagination
                Constraint::Length(1), // Help / status
            ])
            .split(frame.area());

        self.render_header(frame, chunks[0]);
        self.input.render(frame, chunks[1]);
        self.render_error(frame, chunks[2]);
        self.render_results(frame, chunks[3]);
        if self.view.show_pagination() {
            self.render_pagination(frame, chunks[4]);
        }
        self.render_status(frame, chunks[5]);
    }

    fn render_header(&self, frame: &mut Frame, area: Rect) {
        let header = Paragraph::new(Span::styled(
            HEADER,
            Style::default()
                .fg(Color::LightYellow)
                .add_modifier(Modifier::BOLD),
        ))
        .alignment(Alignment::Center);
        frame.render_widget(header, area);
    }

    fn render_error(&self, frame: &mut Frame, area: Rect) {
        if self.view.error().is_empty() {
            return;
        }
        let error = Paragraph::new(Span::styled(
            self.view.error().to_string(),
            Style::default().fg(Color::Red),
        ));
        frame.render_widget(error, area);
    }

    fn render_results(&mut self, frame: &mut Frame, area: Rect) {
        if self.view.take_scroll_request() {
            self.result_list.scroll_to_top();
        }
        self.result_list.render(frame, area, self.view.items());
    }

    fn render_pagination(&self, frame: &mut Frame, area: Rect) {
        let button = |label: &'static str, enabled: bool| {
            let style = if enabled {
                Style::default().fg(Color::White).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::DarkGray)
            };
            Span::styled(label, style)
        };

        let line = Line::from(vec![
            button("◀ Föregående", self.view.has_previous()),
            Span::raw("   "),
            Span::styled(self.view.page_label(), Style::default().fg(Color::LightCyan)),
            Span::raw("   "),
            button("Nästa ▶", self.view.has_next()),
        ]);

        let pagination = Paragraph::new(line).alignment(Alignment::Center).block(
            Block::default()
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded)
                .border_style(Style::default().fg(Color::DarkGray)),
        );
        frame.render_widget(pagination, area);
    }

    fn render_status(&self, frame: &mut Frame, area: Rect) {
        let mut spans = Vec::new();
        if self.view.is_loading() {
            spans.push(Span::styled("Söker... ", Style::default().fg(Color::Yellow)));
        }
        if let Some(notice) = &self.notice {
            spans.push(Span::styled(
                format!("{notice} "),
                Style::default().fg(Color::LightRed),
            ));
        }
        spans.push(Span::styled(
            "Enter=Sök │ Ctrl+P/Ctrl+N=sida │ ↑↓=välj │ Ctrl+O=öppna │ Esc=avsluta",
            Style::default().fg(Color::DarkGray),
        ));

        frame.render_widget(Paragraph::new(Line::from(spans)), area);
    }
}
