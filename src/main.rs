use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use lapwatch::{
    app_dirs::AppDirs,
    clock::SystemClock,
    config::{Config, ConfigStore, FileConfigStore},
    input::{handle_event, Flow},
    logger::init_logging,
    runtime::{CrosstermEventSource, LapEventSource, Runner, ThreadRedrawScheduler},
    stopwatch::{load_records, Stopwatch, RECORDS_KEY},
    store::SqliteStore,
    ui::history_report,
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    layout::Rect,
    Terminal,
};
use std::{
    error::Error,
    io::{self, stdin},
    path::PathBuf,
    time::Duration,
};
use tracing::info;

const IDLE_POLL_MS: u64 = 250;

/// keyboard-driven stopwatch with lap records and persistent history
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "A keyboard-driven stopwatch TUI. Space starts and stops the timer, every stop is recorded, and the history with its running average survives restarts."
)]
pub struct Cli {
    /// database file holding recorded times
    #[clap(long)]
    db: Option<PathBuf>,

    /// milliseconds between display refreshes while running
    #[clap(long = "redraw-ms")]
    redraw_ms: Option<u64>,

    /// print recorded times and averages, then exit
    #[clap(long)]
    print: bool,

    /// write the effective settings to the config file, then exit
    #[clap(long = "save-config")]
    save_config: bool,

    /// log at debug level
    #[clap(short = 'v', long)]
    verbose: bool,
}

impl Cli {
    /// Command-line flags override values from the config file
    fn apply_to(&self, mut config: Config) -> Config {
        if let Some(db) = &self.db {
            config.db_path = Some(db.clone());
        }
        if let Some(ms) = self.redraw_ms {
            config.redraw_interval_ms = ms;
        }
        config
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    let config = cli.apply_to(FileConfigStore::new().load());

    init_logging(AppDirs::log_path().as_deref(), cli.verbose);

    if cli.save_config {
        FileConfigStore::new().save(&config)?;
        info!(?config, "saved config");
        return Ok(());
    }

    let db_path = config.resolved_db_path();
    info!(db = %db_path.display(), "opening record store");
    let store = SqliteStore::open(&db_path)?;

    if cli.print {
        let last_saved = store.updated_at(RECORDS_KEY).ok().flatten();
        println!("{}", history_report(&load_records(&store)));
        if let Some(at) = last_saved {
            println!("Last Saved: {}", at.format("%Y-%m-%d %H:%M:%S"));
        }
        return Ok(());
    }

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    let events = CrosstermEventSource::new();
    let mut stopwatch = Stopwatch::new(
        Box::new(store),
        Box::new(SystemClock),
        Box::new(ThreadRedrawScheduler::new(events.sender())),
        config.redraw_interval(),
    );

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let runner = Runner::new(events, Duration::from_millis(IDLE_POLL_MS));
    let result = start_tui(&mut terminal, &mut stopwatch, &runner);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        DisableMouseCapture,
        LeaveAlternateScreen
    )?;
    terminal.show_cursor()?;

    result
}

fn start_tui<B: Backend, E: LapEventSource>(
    terminal: &mut Terminal<B>,
    stopwatch: &mut Stopwatch,
    runner: &Runner<E>,
) -> Result<(), Box<dyn Error>> {
    terminal.draw(|f| f.render_widget(&*stopwatch, f.area()))?;

    loop {
        let Some(event) = runner.step()? else {
            continue;
        };

        let size = terminal.size()?;
        let area = Rect::new(0, 0, size.width, size.height);
        match handle_event(stopwatch, &event, area) {
            Flow::Quit => break,
            Flow::Redraw => {
                terminal.draw(|f| f.render_widget(&*stopwatch, f.area()))?;
            }
            Flow::Continue => {}
        }
    }

    // a timing still in flight on quit is discarded, not recorded
    info!(running = stopwatch.is_running(), "quitting");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
    use lapwatch::{
        clock::ManualClock,
        runtime::{CountingScheduler, LapEvent, TestEventSource},
        store::MemoryStore,
    };
    use ratatui::backend::TestBackend;
    use std::sync::mpsc;

    #[test]
    fn test_cli_default_values() {
        let cli = Cli::parse_from(["lapwatch"]);
        assert_eq!(cli.db, None);
        assert_eq!(cli.redraw_ms, None);
        assert!(!cli.print);
        assert!(!cli.save_config);
        assert!(!cli.verbose);
    }

    #[test]
    fn test_cli_save_config_flag() {
        let cli = Cli::parse_from(["lapwatch", "--save-config", "--redraw-ms", "30"]);
        assert!(cli.save_config);
        assert_eq!(cli.apply_to(Config::default()).redraw_interval_ms, 30);
    }

    #[test]
    fn test_cli_flags() {
        let cli = Cli::parse_from(["lapwatch", "--db", "/tmp/x.db", "--redraw-ms", "16", "--print", "-v"]);
        assert_eq!(cli.db, Some(PathBuf::from("/tmp/x.db")));
        assert_eq!(cli.redraw_ms, Some(16));
        assert!(cli.print);
        assert!(cli.verbose);
    }

    #[test]
    fn test_cli_overrides_config() {
        let cli = Cli::parse_from(["lapwatch", "--db", "a.db", "--redraw-ms", "8"]);
        let cfg = cli.apply_to(Config::default());
        assert_eq!(cfg.db_path, Some(PathBuf::from("a.db")));
        assert_eq!(cfg.redraw_interval_ms, 8);
    }

    #[test]
    fn test_cli_keeps_config_when_flags_absent() {
        let cli = Cli::parse_from(["lapwatch"]);
        let cfg = Config {
            redraw_interval_ms: 20,
            db_path: Some(PathBuf::from("kept.db")),
        };
        assert_eq!(cli.apply_to(cfg.clone()), cfg);
    }

    #[test]
    fn test_start_tui_runs_until_quit() {
        let clock = ManualClock::new();
        let mut stopwatch = Stopwatch::new(
            Box::new(MemoryStore::new()),
            Box::new(clock.clone()),
            Box::new(CountingScheduler::new()),
            Duration::from_millis(1),
        );

        let (tx, rx) = mpsc::channel();
        let key = |c| LapEvent::Key(KeyEvent::new(c, KeyModifiers::NONE));
        tx.send(key(KeyCode::Char(' '))).unwrap();
        tx.send(LapEvent::Tick).unwrap();
        tx.send(key(KeyCode::Char(' '))).unwrap();
        tx.send(key(KeyCode::Esc)).unwrap();

        let runner = Runner::new(TestEventSource::new(rx), Duration::from_millis(5));
        let mut terminal = Terminal::new(TestBackend::new(80, 24)).unwrap();
        start_tui(&mut terminal, &mut stopwatch, &runner).unwrap();

        assert!(!stopwatch.is_running());
        assert_eq!(stopwatch.records().len(), 1);
    }

    #[test]
    fn test_start_tui_returns_when_input_closes() {
        let clock = ManualClock::new();
        let mut stopwatch = Stopwatch::new(
            Box::new(MemoryStore::new()),
            Box::new(clock.clone()),
            Box::new(CountingScheduler::new()),
            Duration::from_millis(1),
        );

        let (tx, rx) = mpsc::channel::<LapEvent>();
        tx.send(LapEvent::Key(KeyEvent::new(KeyCode::Char(' '), KeyModifiers::NONE)))
            .unwrap();
        drop(tx);

        let runner = Runner::new(TestEventSource::new(rx), Duration::from_millis(5));
        let mut terminal = Terminal::new(TestBackend::new(80, 24)).unwrap();
        assert!(start_tui(&mut terminal, &mut stopwatch, &runner).is_err());
        assert!(stopwatch.is_running());
    }

    #[test]
    fn test_start_tui_quits_on_closed_reader() {
        let clock = ManualClock::new();
        let mut stopwatch = Stopwatch::new(
            Box::new(MemoryStore::new()),
            Box::new(clock.clone()),
            Box::new(CountingScheduler::new()),
            Duration::from_millis(1),
        );

        // sender stays alive, as the redraw scheduler's clone does in the binary
        let (tx, rx) = mpsc::channel();
        tx.send(LapEvent::Closed).unwrap();

        let runner = Runner::new(TestEventSource::new(rx), Duration::from_millis(5));
        let mut terminal = Terminal::new(TestBackend::new(80, 24)).unwrap();
        start_tui(&mut terminal, &mut stopwatch, &runner).unwrap();
    }
}
