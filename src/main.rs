use std::sync::Arc;

use anyhow::{anyhow, Result};
use tracing_subscriber::EnvFilter;

mod app;
mod config;
mod handler;
mod responder;
mod session;
mod store;
mod tui;
mod ui;

use app::App;
use config::Config;
use responder::ResponderClient;
use session::Session;
use store::SessionStore;
use tui::{EventHandler, Tui};

#[tokio::main]
async fn main() -> Result<()> {
    init_logging()?;

    let config = Config::load_or_init().unwrap_or_else(|err| {
        tracing::warn!("failed to load config, using defaults: {err:#}");
        Config::default()
    });
    let responder = ResponderClient::new(&config.resolve_api_url());
    let store = SessionStore::open()?;
    let session = Session::restore(&store);
    let mut app = App::new(session, store, responder);

    tui::install_panic_hook();
    let mut terminal = tui::init()?;
    let mut events = EventHandler::new();

    let result = run(&mut terminal, &mut events, &mut app).await;
    tui::restore()?;
    result
}

async fn run(terminal: &mut Tui, events: &mut EventHandler, app: &mut App) -> Result<()> {
    while !app.should_quit {
        terminal.draw(|frame| ui::render(app, frame))?;
        match events.next().await {
            Some(event) => handler::handle_event(app, event).await?,
            None => break,
        }
    }
    Ok(())
}

/// The TUI owns stderr, so logs go to a file next to the persisted
/// session. `RUST_LOG` controls the filter.
fn init_logging() -> Result<()> {
    let dir = dirs::config_dir()
        .ok_or_else(|| anyhow!("could not determine config directory"))?
        .join("helpdesk-chat");
    std::fs::create_dir_all(&dir)?;
    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(dir.join("helpdesk.log"))?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(Arc::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}
