use anyhow::Result;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use triadhub::app::App;
use triadhub::handler;
use triadhub::tui::{self, EventHandler, Tui};
use triadhub::ui;

/// Logs go to a rolling file under the data dir; the terminal itself is
/// owned by the TUI. The guard must stay alive for the whole run or the
/// non-blocking writer drops buffered lines.
fn init_logging() -> Option<WorkerGuard> {
    let dir = dirs::data_dir()?.join("triadhub").join("logs");
    std::fs::create_dir_all(&dir).ok()?;

    let appender = tracing_appender::rolling::daily(dir, "triadhub.log");
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .init();

    Some(guard)
}

async fn run(terminal: &mut Tui) -> Result<()> {
    let mut app = App::new();
    let mut events = EventHandler::new();

    while !app.should_quit {
        terminal.draw(|frame| ui::render(&mut app, frame))?;
        if let Some(event) = events.next().await {
            handler::handle_event(&mut app, event).await?;
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let _guard = init_logging();
    tui::install_panic_hook();

    let mut terminal = tui::init()?;
    let result = run(&mut terminal).await;
    tui::restore()?;

    result
}
