mod app;
mod config;
mod context_menu;
mod edit_form;
mod entry;
mod error;
mod file_chooser;
mod launch;
mod list;
mod logging;
mod path_validator;
mod row;
mod settings;
mod ui;

use std::io::{self, Write};

use anyhow::Result;
use crossterm::event::{self, DisableMouseCapture, EnableMouseCapture, Event};
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::{execute, ExecutableCommand};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use tracing::{error, info};

use crate::app::App;
use crate::config::{AppPaths, TICK_RATE};
use crate::launch::{Launch, ProcessLauncher};
use crate::settings::SettingsStore;

fn main() -> Result<()> {
    let paths = AppPaths::new()?;
    let _logging = logging::init(&paths.log_file)?;
    info!(config_dir = %paths.config_dir.display(), "starting");

    let store = SettingsStore::new(paths.settings_file.clone());
    info!(settings = %store.path().display(), "loading settings");
    let mut app = App::new(store, ProcessLauncher::default())?;
    let result = run_app(&mut app);
    if let Err(err) = &result {
        error!(%err, "exiting with error");
    }
    result
}

fn run_app<L: Launch>(app: &mut App<L>) -> Result<()> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    stdout.execute(EnterAlternateScreen)?;
    stdout.execute(EnableMouseCapture)?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.hide_cursor()?;

    let result = event_loop(&mut terminal, app);
    let saved = app.save_settings();

    restore_terminal(&mut terminal)?;
    result?;
    if let Err(err) = &saved {
        eprintln!("Failed to save settings: {err:#}");
    }
    saved
}

fn event_loop<B, L>(terminal: &mut Terminal<B>, app: &mut App<L>) -> Result<()>
where
    B: ratatui::backend::Backend + Write,
    L: Launch,
{
    loop {
        terminal.draw(|frame| app.render(frame))?;

        if event::poll(TICK_RATE)? {
            match event::read()? {
                Event::Key(key) => {
                    app.set_viewport(terminal.size()?);
                    app.handle_key(key);
                }
                Event::Mouse(mouse) => {
                    let size = terminal.size()?;
                    app.handle_mouse(mouse, size);
                }
                Event::Resize(_, _) => {}
                Event::FocusGained | Event::FocusLost | Event::Paste(_) => {}
            };
        }

        app.tick();

        if app.should_quit {
            break;
        }
    }
    Ok(())
}

fn restore_terminal<B>(terminal: &mut Terminal<B>) -> Result<()>
where
    B: ratatui::backend::Backend + Write,
{
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;
    Ok(())
}
