use std::fs::{self, File};
use std::io::stdout;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use crossterm::{
    execute,
    terminal::{EnterAlternateScreen, enable_raw_mode},
};
use log::info;
use ratatui::{Terminal, backend::CrosstermBackend};
use simplelog::{Config, LevelFilter, WriteLogger};

use pdfpane::engine::{MupdfLoader, TextDocumentBuilder};
use pdfpane::event_source::KeyboardEventSource;
use pdfpane::export::export_pages;
use pdfpane::panic_handler::{initialize_panic_handler, restore_terminal};
use pdfpane::settings::{Settings, load_settings};
use pdfpane::{App, run_app_with_event_source};

#[derive(Parser)]
#[command(name = "pdfpane", version, about = "Typeset plain text as a PDF and page through it")]
struct Cli {
    /// Settings file (defaults to <config dir>/pdfpane/config.yaml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log file
    #[arg(long, global = true, default_value = "pdfpane.log")]
    log_file: PathBuf,

    /// Log at debug level
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the document in the terminal
    View {
        /// Plain text file to typeset
        file: PathBuf,
    },
    /// Write every rendered page as page-<n>.png
    Export {
        file: PathBuf,

        #[arg(long)]
        out: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    let log_file = File::create(&cli.log_file)
        .with_context(|| format!("Failed to create log file {}", cli.log_file.display()))?;
    WriteLogger::init(level, Config::default(), log_file)?;
    info!("Starting pdfpane");

    let settings = load_settings(cli.config.as_deref());

    match cli.command {
        Commands::View { file } => view(&settings, file),
        Commands::Export { file, out } => {
            let content = read_content(&file)?;
            let paths = export_pages(
                settings.viewer_config(),
                TextDocumentBuilder::new(settings.document_style()),
                MupdfLoader,
                &content,
                &out,
            )?;
            println!("Exported {} page(s) to {}", paths.len(), out.display());
            Ok(())
        }
    }
}

fn read_content(file: &Path) -> Result<String> {
    fs::read_to_string(file).with_context(|| format!("Failed to read {}", file.display()))
}

fn view(settings: &Settings, file: PathBuf) -> Result<()> {
    let content = read_content(&file)?;
    let mut app = App::new(
        settings.viewer_config(),
        TextDocumentBuilder::new(settings.document_style()),
        MupdfLoader,
        content,
        Some(file),
    )?;

    initialize_panic_handler();
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.hide_cursor()?;

    let result = run_app_with_event_source(&mut terminal, &mut app, &mut KeyboardEventSource);

    restore_terminal();
    info!("Shutting down pdfpane");
    result
}
