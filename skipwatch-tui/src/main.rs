//! Terminal operator console: fleet overview, alerts, route plan, and
//! per-bin overflow forecasts over a demo fleet held in memory.

mod app;
mod input;
mod ui;

use std::{env, io, sync::Arc, time::Duration as StdDuration};

use anyhow::Result;
use chrono::Utc;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event as CEvent},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use rand::SeedableRng;
use rand::rngs::StdRng;
use ratatui::{Terminal, backend::CrosstermBackend};
use skipwatch_core::service::FleetService;
use skipwatch_store_memory::MemoryStore;

use crate::app::{App, Screen};
use crate::input::Action;

#[tokio::main]
async fn main() -> Result<()> {
    // Service over an in-memory demo fleet; SKIPWATCH_SEED makes a session
    // reproducible.
    let rng = match env::var("SKIPWATCH_SEED")
        .ok()
        .and_then(|raw| raw.parse().ok())
    {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let service = Arc::new(FleetService::new(MemoryStore::backend(), None, rng));
    service.seed_demo(10, Utc::now()).await?;

    // App state
    let mut app = App::new(service);
    app.refresh().await;

    // Terminal init
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(
        stdout,
        EnterAlternateScreen,
        EnableMouseCapture
    )?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Run event loop
    let res = run(&mut terminal, app).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    res
}

async fn run(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>, mut app: App) -> Result<()> {
    loop {
        // Draw current UI
        terminal.draw(|frame| ui::draw(frame, &app))?;

        // Poll for input (non-blocking, small timeout to keep CPU low)
        if event::poll(StdDuration::from_millis(100))?
            && let CEvent::Key(key) = event::read()?
        {
            let action = input::handle_key_event(key, &mut app);

            match action {
                Action::Quit => break,
                Action::None => {}
                Action::Refresh => {
                    app.is_loading = true;
                    app.error_message = None;
                    terminal.draw(|frame| ui::draw(frame, &app))?;

                    app.refresh().await;

                    app.is_loading = false;
                }
                Action::LoadForecastForCurrentBin => {
                    let Some(bin) = app.selected_bin().cloned() else {
                        app.error_message =
                            Some("No bin selected (move with ↑/↓ first)".into());
                        continue;
                    };

                    app.is_loading = true;
                    app.error_message = None;
                    terminal.draw(|frame| ui::draw(frame, &app))?;

                    let res = app.service.forecast(&bin.id, Utc::now()).await;

                    app.is_loading = false;
                    match res {
                        Ok(forecast) => {
                            app.forecast = Some(forecast);
                            app.screen = Screen::Forecast;
                        }
                        Err(err) => {
                            app.error_message = Some(format!("Failed to load forecast: {err}"));
                        }
                    }
                }
            }
        }
    }

    Ok(())
}
