use crate::view::FetchOutcome;
use crossterm::event::{KeyEvent, MouseEvent};

/// Events that can occur in the application
#[derive(Debug)]
pub enum Event {
    /// Terminal key press event
    Key(KeyEvent),
    /// Terminal mouse event
    Mouse(MouseEvent),
    /// Terminal resize event; the next draw picks up the new size
    Resize(u16, u16),
    /// A spawned search request finished
    Fetched(FetchOutcome),
    /// Request to quit the application
    Quit,
}

/// Result type for event handling
pub type EventResult<T> = anyhow::Result<T>;
