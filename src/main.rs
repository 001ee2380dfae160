use std::{io, time::Duration};

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    event::{
        self, DisableBracketedPaste, DisableMouseCapture, EnableBracketedPaste, EnableMouseCapture,
        Event,
    },
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use tracing::{error, info};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use comex_chat::constants::{DEFAULT_LOG_FILTER, TICK_MILLIS};
use comex_chat::events::{handle_key_event, handle_mouse_event, handle_paste};
use comex_chat::ui::draw_ui;
use comex_chat::ui_components::ChatView;
use comex_chat::{ChatBackend, ChatConfig, ChatWidget, HttpChatBackend, LogArgs};

// Define the command-line interface structure using clap
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Open the chat widget in the terminal.
    Chat {
        #[command(flatten)]
        config: ChatConfig,
        #[command(flatten)]
        log: LogArgs,
    },
    /// Check that the chat backend is up.
    Health {
        #[command(flatten)]
        config: ChatConfig,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (endpoint and user id overrides)
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    match cli.command {
        Commands::Chat { config, log } => {
            let _guard = init_file_logging(&log)?;
            info!(endpoint = %config.endpoint, "Starting chat widget");

            let backend =
                HttpChatBackend::new(&config).context("Failed to configure chat backend")?;
            run_terminal(ChatWidget::new(backend)).await?;

            info!("Chat widget closed");
        }
        Commands::Health { config } => {
            tracing_subscriber::fmt()
                .with_writer(io::stderr)
                .with_env_filter(env_filter())
                .init();

            let backend =
                HttpChatBackend::new(&config).context("Failed to configure chat backend")?;
            let url = backend.health_url()?;
            let health = backend
                .health()
                .await
                .with_context(|| format!("Chat backend at {} is not reachable", url))?;

            match health.timestamp {
                Some(timestamp) => println!("{}: {} ({})", url, health.status, timestamp),
                None => println!("{}: {}", url, health.status),
            }
        }
    }

    Ok(())
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER))
}

// The terminal is in raw mode for the whole session, so logs go to a file.
fn init_file_logging(log: &LogArgs) -> Result<WorkerGuard> {
    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log.log_file)
        .with_context(|| format!("Failed to open log file {}", log.log_file.display()))?;
    let (non_blocking, guard) = tracing_appender::non_blocking(file);
    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_env_filter(env_filter())
        .init();
    Ok(guard)
}

async fn run_terminal<B: ChatBackend>(mut widget: ChatWidget<B>) -> Result<()> {
    enable_raw_mode().context("Failed to enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture, EnableBracketedPaste)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, &mut widget).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture,
        DisableBracketedPaste
    )?;
    terminal.show_cursor()?;

    if let Err(err) = &res {
        error!("Chat widget failed: {:?}", err);
    }
    res
}

async fn run_app<T: Backend, B: ChatBackend>(
    terminal: &mut Terminal<T>,
    widget: &mut ChatWidget<B>,
) -> Result<()> {
    let mut view = ChatView::new();
    let mut changes = widget.subscribe();
    let mut needs_redraw = true;

    loop {
        // Apply any replies that came back since the last tick
        widget.process_updates();

        if changes.has_changed().unwrap_or(false) {
            changes.borrow_and_update();
            view.input.sync(widget.draft());
            needs_redraw = true;
        }

        if needs_redraw {
            terminal.draw(|f| draw_ui(f, widget, &mut view))?;
            needs_redraw = false;
        }

        // Event polling blocks, so keep it off the runtime threads.
        let next_event = tokio::task::block_in_place(|| -> io::Result<Option<Event>> {
            if event::poll(Duration::from_millis(TICK_MILLIS))? {
                event::read().map(Some)
            } else {
                Ok(None)
            }
        })
        .context("Failed to read terminal event")?;

        let Some(event) = next_event else {
            continue;
        };

        match event {
            Event::Key(key) => {
                if handle_key_event(widget, &mut view, key) {
                    return Ok(());
                }
            }
            Event::Paste(data) => handle_paste(widget, &mut view, &data),
            Event::Mouse(mouse) => {
                handle_mouse_event(widget, &mut view, mouse.kind, mouse.column, mouse.row)
            }
            Event::Resize(..) | Event::FocusGained | Event::FocusLost => {}
        }
        // Scrolling and resizes change only view state.
        needs_redraw = true;
    }
}
