//! Interactive wizard.
//!
//! The event loop polls the terminal on the caller's thread while backend
//! calls run as tokio tasks; their results come back over a channel and are
//! applied on the next tick, so the screen keeps updating during a call.

mod app;
mod menu;
mod view;

use std::time::Duration;

use anyhow::{Context, Result};
use cdai_core::Studio;
use crossterm::event::{self, Event};
use ratatui::DefaultTerminal;
use tokio::runtime::Handle;
use tracing::info;

pub use self::app::Uploads;
use self::app::App;

/// How long to wait for input before redrawing.
const TICK: Duration = Duration::from_millis(100);

/// Run the wizard until the user quits.
pub async fn run(studio: Studio, uploads: Uploads) -> Result<()> {
    let mut app = App::new(studio, Handle::current());
    app.preload(uploads);

    info!("starting interactive session");
    let result = tokio::task::block_in_place(|| {
        let mut terminal = ratatui::init();
        let result = event_loop(&mut app, &mut terminal);
        ratatui::restore();
        result
    });
    info!(step = %app.studio().current_step(), "interactive session ended");
    result
}

fn event_loop(app: &mut App, terminal: &mut DefaultTerminal) -> Result<()> {
    while app.is_running() {
        app.tick();
        terminal
            .draw(|frame| view::draw(frame, app))
            .context("failed to draw frame")?;
        if event::poll(TICK)?
            && let Event::Key(key) = event::read()?
        {
            app.handle_key(key);
        }
    }
    Ok(())
}
