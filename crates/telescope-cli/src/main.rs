mod commands;
mod terminal_surface;

use clap::Parser;
use commands::{Command, HELP};
use std::path::PathBuf;
use telescope_core::{
    Engine, EngineConfig, EngineEvent, EngineUpdate, FilterConfig, ResultSet, RipgrepRunner,
    SessionKey, log, path_utils,
};
use terminal_surface::TerminalSurface;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

const SESSION: SessionKey = SessionKey(1);

#[derive(Parser, Debug)]
#[command(
    name = "telescope",
    version,
    about = "Live grep with fuzzy ranking and file preview, driven from stdin"
)]
struct Cli {
    /// Directories to search
    #[arg(default_value = ".")]
    roots: Vec<PathBuf>,

    /// Comma separated file filter, e.g. ".py, -*_test.py, views/*.html"
    #[arg(short, long, default_value = "")]
    globs: String,

    /// Search `*.ext`, `-*.ext` and `type:` query tokens literally
    #[arg(long)]
    literal_globs: bool,

    /// Engine config file (TOML)
    #[arg(short, long, env = "TELESCOPE_CONFIG")]
    config: Option<PathBuf>,

    /// Write logs to this file instead of stderr
    #[arg(long, env = "TELESCOPE_LOG_FILE")]
    log_file: Option<PathBuf>,

    /// Log level, overridden by RUST_LOG
    #[arg(long, env = "TELESCOPE_LOG_LEVEL")]
    log_level: Option<String>,

    /// Width of the result list columns
    #[arg(long, default_value_t = 60)]
    width: usize,
}

#[tokio::main]
async fn main() -> Result<(), telescope_core::Error> {
    log::install_panic_hook();

    let cli = Cli::parse();
    match &cli.log_file {
        Some(path) => log::init_tracing(&path.to_string_lossy(), cli.log_level.as_deref())?,
        None => log::init_stderr_tracing(Some(cli.log_level.as_deref().unwrap_or("warn")))?,
    }

    let config = match &cli.config {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::default(),
    };

    let roots = path_utils::resolve_roots(&cli.roots);
    let (mut engine, updates) = Engine::new(config, RipgrepRunner, TerminalSurface::new());

    engine.handle(EngineEvent::Open {
        session: SESSION,
        roots: roots.clone(),
        filters: FilterConfig {
            globs: cli.globs.clone(),
            query_globs: !cli.literal_globs,
        },
    });

    println!("{HELP}");
    tokio::spawn(read_commands(engine.sender()));
    let printer = tokio::spawn(print_updates(updates, roots, cli.width));

    engine.run().await;
    // the engine owns the last update sender
    drop(engine);
    let _ = printer.await;
    Ok(())
}

async fn read_commands(events: UnboundedSender<EngineEvent<u32>>) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                tracing::error!(error = %e, "Failed to read stdin");
                break;
            }
        };

        let command = Command::parse(&line);
        let ends_session = command.ends_session();
        match command.into_event(SESSION) {
            Some(event) => {
                if events.send(event).is_err() {
                    return;
                }
            }
            None => println!("{HELP}"),
        }

        if ends_session {
            let _ = events.send(EngineEvent::Shutdown);
            return;
        }
    }

    let _ = events.send(EngineEvent::Shutdown);
}

async fn print_updates(
    mut updates: UnboundedReceiver<EngineUpdate<u32>>,
    roots: Vec<PathBuf>,
    width: usize,
) {
    let mut shown = ResultSet::empty();

    while let Some(update) = updates.recv().await {
        match update {
            EngineUpdate::Results {
                query,
                results,
                highlighted,
                ..
            } => {
                let capped = if results.is_capped() { "+" } else { "" };
                println!("-- {}{capped} results for {query:?}", results.len());
                print_rows(&results, highlighted, width);
                shown = results;
            }
            EngineUpdate::Highlighted { index, .. } => {
                if let Some(result) = index.and_then(|i| shown.get(i)) {
                    let path = path_utils::relative_to_roots(&result.path, &roots);
                    println!("> {}:{}", path.display(), result.line_number);
                }
            }
            EngineUpdate::Confirmed { result, .. } => {
                println!("{}", result.location());
            }
            EngineUpdate::Dismissed { .. } => println!("-- cancelled"),
        }
    }
}

fn print_rows(results: &ResultSet, highlighted: Option<usize>, width: usize) {
    if let Some(buffer) = results.display_buffer() {
        print!("{buffer}");
        return;
    }

    for (index, row) in results.rows(width).iter().enumerate() {
        let marker = if highlighted == Some(index) { '>' } else { ' ' };
        println!("{marker} {index:>3} {} {}", row.text, row.details);
    }
}
