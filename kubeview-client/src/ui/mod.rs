//! Terminal UI.
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────┐
//! │                          app.rs                             │
//! │  App ── key routing ── Mode (table, prompts, panes)         │
//! └──────────────┬──────────────────────────────┬───────────────┘
//!                │                              │
//!                ▼                              ▼
//! ┌──────────────────────────────┐  ┌──────────────────────────┐
//! │ table.rs    panes.rs         │  │ components/              │
//! │ TableView   LogPane          │  │ header, help bar,        │
//! │             TextPane, picker │  │ status line / prompt     │
//! └──────────────────────────────┘  └──────────────────────────┘
//! ```

pub mod app;
pub mod colors;
pub mod components;
pub mod events;
pub mod layout;
pub mod panes;
pub mod table;

use std::io::{self, IsTerminal};

use crossterm::{
    cursor, execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};

pub use app::App;

/// Runs `app` on the alternate screen and restores the terminal afterwards,
/// whether the session ended normally or with an error.
pub async fn run(app: App) -> io::Result<()> {
    if !io::stdin().is_terminal() || !io::stdout().is_terminal() {
        return Err(io::Error::other("kubeview requires an interactive terminal"));
    }

    let mut stdout = io::stdout();
    enable_raw_mode()?;
    execute!(stdout, EnterAlternateScreen)?;

    let mut terminal = Terminal::new(CrosstermBackend::new(stdout))?;
    terminal.clear().ok();

    let res = app.run(&mut terminal).await;

    restore_terminal();
    terminal.show_cursor().ok();
    res
}

/// Leaves raw mode and the alternate screen. Safe to call more than once.
pub fn restore_terminal() {
    disable_raw_mode().ok();
    execute!(io::stdout(), LeaveAlternateScreen, cursor::Show).ok();
}
