use std::io;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{bail, Result};
use clap::Parser;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use mytodo_service::BlockingHttpService;
use mytodo_tui::app::App;
use ratatui::prelude::*;

/// Terminal client for a mytodo server.
#[derive(Debug, Parser)]
#[command(name = "mytodo", version)]
struct Cli {
    /// Base URL of the server.
    #[arg(long, env = "MYTODO_SERVER_URL", default_value = "http://127.0.0.1:3000")]
    server: String,

    /// API key, when the server requires one.
    #[arg(long, env = "MYTODO_API_KEY", hide_env_values = true)]
    api_key: Option<String>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let service = match cli.api_key.filter(|k| !k.is_empty()) {
        Some(key) => BlockingHttpService::with_api_key(&cli.server, key)?,
        None => BlockingHttpService::new(&cli.server)?,
    };
    wait_for_server(&service)?;

    run_tui(service)
}

fn wait_for_server(service: &BlockingHttpService) -> Result<()> {
    let start = Instant::now();
    let timeout = Duration::from_secs(10);

    loop {
        if service.health_check().is_ok() {
            return Ok(());
        }
        if start.elapsed() > timeout {
            bail!(
                "{} did not answer within {}s",
                service.base_url(),
                timeout.as_secs()
            );
        }
        thread::sleep(Duration::from_millis(100));
    }
}

fn run_tui(service: BlockingHttpService) -> Result<()> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = event_loop(&mut terminal, service);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(ref e) = result {
        eprintln!("Error: {e}");
    }

    result
}

fn event_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    service: BlockingHttpService,
) -> Result<()> {
    let mut app = App::new(service)?;

    loop {
        terminal.draw(|frame| app.render(frame))?;

        if let Event::Key(key) = event::read()? {
            if key.kind != KeyEventKind::Press {
                continue;
            }
            // Ctrl+C always quits
            if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
                break;
            }
            if key.code == KeyCode::Char('q')
                && !app.is_input_mode()
                && matches!(app.mode(), mytodo_tui::app::Mode::Normal)
            {
                break;
            }
            app.handle_key(key);
        }
    }

    Ok(())
}
