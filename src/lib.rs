//! sok library
//!
//! Search view state, the Google Custom Search provider and the terminal UI,
//! exported for the binary and for integration tests.

pub mod cli;
pub mod config;
pub mod event;
pub mod logging;
pub mod search;
pub mod tui;
pub mod view;
