use std::fs::File;
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use simplelog::{ConfigBuilder, WriteLogger};
use waypoint::LogLevel;
use waypoint::console::{self, ConsolePort};
use waypoint::core::config::{self, CliOverrides, ResolvedConfig};
use waypoint::core::session::{LoadError, LoadOptions, Session};
use waypoint::fetch::{self, DownloadRetriever, FileRetriever};

#[derive(Parser)]
#[command(name = "waypoint", about = "Browse a declarative screen document")]
struct Args {
    /// Document url or path (overrides config and WAYPOINT_DOCUMENT)
    document: Option<String>,

    /// Directory previewed files are downloaded into
    #[arg(short, long)]
    download_dir: Option<PathBuf>,

    /// Log verbosity
    #[arg(short, long, value_enum)]
    log_level: Option<LogLevel>,

    /// Start at this screen id instead of the first one
    #[arg(short, long)]
    start: Option<String>,

    /// Refuse documents with links to missing screens
    #[arg(long)]
    strict: bool,

    /// Load and validate the document, print a summary, and exit
    #[arg(long)]
    check: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    dotenv::dotenv().ok();

    let file_config = match config::load_config() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::FAILURE;
        }
    };
    let resolved = config::resolve(
        &file_config,
        &CliOverrides {
            document: args.document.clone(),
            download_dir: args.download_dir.clone(),
            log_level: args.log_level,
            strict_links: args.strict,
        },
    );

    init_logging(&resolved);
    log::info!("Waypoint starting up with document: {}", resolved.document_location);

    let session = match load_session(&resolved).await {
        Ok(s) => s,
        Err(e) => {
            log::error!("Startup failed: {}", e);
            eprintln!("error: {e}");
            if matches!(&e, LoadError::Fetch(f) if f.is_transient()) {
                eprintln!("the document source may be temporarily unavailable, try again later");
            }
            return ExitCode::FAILURE;
        }
    };

    if args.check {
        print_summary(&session);
        return if session.dangling_links().is_empty() {
            ExitCode::SUCCESS
        } else {
            ExitCode::FAILURE
        };
    }

    match browse(&session, &resolved, args.start.as_deref()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

/// Initialize file logger - writes next to the working directory by default
fn init_logging(resolved: &ResolvedConfig) {
    let log_config = ConfigBuilder::new()
        .set_time_format_rfc3339()
        .build();

    if let Ok(log_file) = File::create(&resolved.log_file) {
        let _ = WriteLogger::init(resolved.log_level.into(), log_config, log_file);
    }
}

async fn load_session(resolved: &ResolvedConfig) -> Result<Session, LoadError> {
    let source = fetch::document_source(&resolved.document_location, &resolved.http)?;
    let retriever: Arc<dyn FileRetriever> = Arc::new(DownloadRetriever::new(
        fetch::build_client(&resolved.http)?,
        resolved.download_dir.clone(),
    ));
    let options = LoadOptions {
        strict_links: resolved.strict_links,
    };
    Session::load(source.as_ref(), retriever, &options).await
}

fn print_summary(session: &Session) {
    let registry = session.engine().registry();
    println!("{} screen(s), entry {:?}", registry.len(), session.entry_screen().id);
    for screen in registry.screens() {
        println!("  {:<20} {} row(s)  {}", screen.id, screen.rows.len(), screen.title);
    }
    for link in session.dangling_links() {
        println!("warning: {link}");
    }
}

async fn browse(
    session: &Session,
    resolved: &ResolvedConfig,
    start: Option<&str>,
) -> io::Result<()> {
    let port = Arc::new(ConsolePort::new(io::stdout(), resolved.allow_calls));
    session
        .present(port.as_ref(), start)
        .map_err(|e| io::Error::new(io::ErrorKind::NotFound, e))?;
    console::run(port).await
}
