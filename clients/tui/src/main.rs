use std::time::Duration;
use std::{error::Error, io};

use blackjack::GameRules;
use clap::Parser;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use shoe_advisor::{AdvisorConfig, TurnController};

mod app;
use app::{App, CardStyle};

mod tui_logger;
use tui_logger::TuiLogger;

mod ui;

#[derive(Parser, Debug)]
#[command(name = "shoe-advisor")]
#[command(about = "Track a blackjack shoe and get hit/stand advice", long_about = None)]
struct Args {
    /// Decks in the shoe
    #[arg(long, env = "ADVISOR_DECKS", default_value_t = 1)]
    decks: u32,

    /// Seconds to wait on any engine call before giving up
    #[arg(long, env = "ADVISOR_CALL_TIMEOUT_SECS", default_value_t = 10)]
    call_timeout_secs: u64,

    /// Suit the cards are drawn in
    #[arg(long, env = "ADVISOR_CARD_STYLE", value_enum, default_value_t = CardStyle::Hearts)]
    card_style: CardStyle,

    /// Dealer hits soft 17
    #[arg(long, env = "ADVISOR_H17")]
    h17: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    dotenvy::dotenv().ok();
    let args = Args::parse();
    let config = AdvisorConfig::new(args.decks, Duration::from_secs(args.call_timeout_secs))?;
    let rules = if args.h17 {
        GameRules::h17()
    } else {
        GameRules::default()
    };

    let (logger, log_buffer) = TuiLogger::new(log::Level::Info);
    log::set_boxed_logger(Box::new(logger))
        .map(|()| log::set_max_level(log::LevelFilter::Info))?;

    let (controller, _pump) = TurnController::with_local_engine(config, rules);

    // setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let app = App::new(controller, args.card_style, log_buffer);
    let res = run_app(&mut terminal, app).await;

    // restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        println!("{err:?}")
    }

    Ok(())
}

async fn run_app<B: Backend>(terminal: &mut Terminal<B>, mut app: App) -> Result<(), Box<dyn Error>>
where
    B::Error: 'static,
{
    loop {
        app.sync_logs();
        app.poll_tasks().await;

        terminal.draw(|f| ui::ui(f, &app))?;

        // Poll with a timeout so the table refreshes while calls are in flight
        if event::poll(Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press && !app.handle_key(key) {
                    app.abort_tasks();
                    return Ok(());
                }
            }
        }
    }
}
