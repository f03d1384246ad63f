//! Interactive TUI dashboard over the inventory API.

pub mod app;
mod ui;

use std::io;

use anyhow::Result;
use crossterm::event::{self, Event, KeyEventKind};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;

use stockwright_core::selection::Workbench;

use app::{Action, App};

/// Launch the interactive TUI dashboard.
pub async fn run_dashboard(bench: Workbench) -> Result<()> {
    let mut app = App::new(bench);

    // Initial data load, before the terminal is taken over.
    app.dispatch(Action::Refresh).await;

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_event_loop(&mut terminal, &mut app).await;

    // Restore terminal.
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

async fn run_event_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
) -> Result<()> {
    let tick_rate = app.tick_rate;

    loop {
        terminal.draw(|f| ui::render(f, app))?;

        if event::poll(tick_rate)? {
            if let Event::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                if let Some(action) = app.handle_key(key) {
                    // Draw the busy state; keys pressed meanwhile wait in the
                    // terminal's input queue.
                    app.begin(&action);
                    terminal.draw(|f| ui::render(f, app))?;
                    app.perform(action).await;
                }
            }
        }

        if app.should_quit {
            return Ok(());
        }
    }
}
