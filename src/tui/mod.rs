//! Interactive terminal UI
//!
//! A search box over the directory, a suggestion list under it, and the
//! benefits of the chosen institution once one is picked.

pub mod app;
pub mod colors;
pub mod search;
pub mod ui;

pub use app::App;

use crate::error::{FertilikeyError, Result};
use crate::search::Controller;
use crate::{logging, AppConfig};
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use std::io::{self, Stdout};

/// Raw mode and the alternate screen, released on drop.
struct TerminalGuard {
    terminal: Terminal<CrosstermBackend<Stdout>>,
}

impl TerminalGuard {
    fn enter() -> Result<Self> {
        enable_raw_mode().map_err(terminal_error)?;
        let mut stdout = io::stdout();
        if let Err(e) = execute!(stdout, EnterAlternateScreen) {
            let _ = disable_raw_mode();
            return Err(terminal_error(e));
        }
        let terminal = Terminal::new(CrosstermBackend::new(stdout)).map_err(terminal_error)?;
        Ok(Self { terminal })
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(self.terminal.backend_mut(), LeaveAlternateScreen);
        let _ = self.terminal.show_cursor();
    }
}

fn terminal_error(e: io::Error) -> FertilikeyError {
    FertilikeyError::Terminal(e.to_string())
}

/// Run the TUI until the user quits.
pub fn run(config: &AppConfig) -> Result<()> {
    let controller =
        Controller::new(config.controller_options()).with_search_log(config.search_log());
    let mut app = App::new(controller);

    match config.directory_store() {
        Ok(store) => app.start_load(store),
        Err(FertilikeyError::Fetch(e)) => app.finish_load(Err(e)),
        Err(e) => return Err(e),
    }

    logging::info("TUI", "Entering terminal UI");
    let mut guard = TerminalGuard::enter()?;
    let result = app.run(&mut guard.terminal);
    drop(guard);
    app.controller.flush_search_log();
    logging::info("TUI", "Left terminal UI");

    result
}
