use std::fs::File;
use std::io::stdout;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use log::info;
use ratatui::{Terminal, backend::CrosstermBackend, layout::Rect};
use simplelog::{Config, LevelFilter, WriteLogger};

use lectern::audio::{AudioEngine, NullAudioEngine, PacedBackend, SpeechService};
use lectern::content::{ContentSource, PlainTextSource};
use lectern::input::TerminalEventSource;
use lectern::panic_handler;
use lectern::progress::{self, ProgressStore};
use lectern::session::{ReaderSession, run_session};

#[derive(Parser)]
#[command(name = "lectern", version, about = "Terminal read-aloud book reader")]
struct Cli {
    /// Book to open (plain text)
    file: PathBuf,

    /// Run without the audio engine
    #[arg(long)]
    no_audio: bool,

    /// Words per minute for the pacing backend
    #[arg(long, default_value_t = 160.0)]
    wpm: f32,

    /// Ignore saved progress and start from the beginning
    #[arg(long)]
    fresh: bool,

    /// Log file path (defaults to the platform data dir)
    #[arg(long)]
    log_file: Option<PathBuf>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_file.clone())?;
    info!("starting lectern");
    panic_handler::initialize_panic_handler();

    // Content failures are fatal and must surface before the terminal
    // switches to raw mode.
    let document = Arc::new(PlainTextSource.load(&cli.file)?);
    let book_id = document.title().to_string();

    let store = if cli.fresh {
        ProgressStore::ephemeral()
    } else {
        ProgressStore::load_or_ephemeral(progress::default_store_path().as_deref())
    };

    let audio: Box<dyn AudioEngine> = if cli.no_audio {
        Box::new(NullAudioEngine)
    } else {
        Box::new(SpeechService::spawn(
            document.clone(),
            Box::new(PacedBackend::new(cli.wpm)),
        ))
    };

    enable_raw_mode()?;
    let mut out = stdout();
    execute!(out, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(out);
    let mut terminal = Terminal::new(backend)?;

    let size = terminal.size()?;
    let area = Rect::new(0, 0, size.width, size.height);
    let mut session = ReaderSession::new(document, audio, store, book_id, area);

    let result = run_session(&mut terminal, &mut session, &mut TerminalEventSource);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(err) = &result {
        log::error!("application error: {:?}", err);
    }
    info!("lectern shut down");
    result
}

fn init_logging(path: Option<PathBuf>) -> Result<()> {
    let path = match path {
        Some(path) => path,
        None => {
            let dir = dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("lectern");
            std::fs::create_dir_all(&dir)?;
            dir.join("lectern.log")
        }
    };
    let file = File::create(&path)
        .with_context(|| format!("cannot create log file {}", path.display()))?;
    WriteLogger::init(LevelFilter::Info, Config::default(), file)?;
    Ok(())
}
