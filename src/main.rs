use std::panic;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use crossterm::terminal::disable_raw_mode;
use tokio::io::{AsyncRead, BufReader};
use tracing::{debug, info};

use dockside::cli::{Command, USAGE};
use dockside::config::Config;
use dockside::logging;
use dockside::progress::{follow_progress, line_chunks, RenderOptions};

/// Time given to leftover blocking reads (stdin) before the runtime is torn down
const SHUTDOWN_GRACE: Duration = Duration::from_millis(100);

fn setup_panic_handler() {
    let original_hook = panic::take_hook();
    panic::set_hook(Box::new(move |panic_info| {
        let _ = disable_raw_mode();
        original_hook(panic_info);
    }));
}

fn main() -> Result<()> {
    let command = Command::parse_from(std::env::args().skip(1))?;

    match command {
        Command::Help => {
            print!("{USAGE}");
            return Ok(());
        }
        Command::Version => {
            println!("dockside {}", env!("CARGO_PKG_VERSION"));
            return Ok(());
        }
        _ => {}
    }

    let config = Config::load()?;
    init_logging(&config);
    setup_panic_handler();

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;
    let result = runtime.block_on(run(command, config));
    runtime.shutdown_timeout(SHUTDOWN_GRACE);
    result
}

fn init_logging(config: &Config) {
    let path = match config.log_path() {
        Ok(path) => path,
        Err(e) => {
            eprintln!("dockside: logging disabled: {e:#}");
            return;
        }
    };
    if let Err(e) = logging::init_global(&path, &config.log_filter()) {
        eprintln!("dockside: logging disabled: {e:#}");
    }
}

async fn run(command: Command, config: Config) -> Result<()> {
    match command {
        Command::Replay { path, columns } => replay(path.as_deref(), config.render_options(columns)).await,
        Command::Attach { socket } => attach(&socket).await,
        Command::Config { init } => show_config(&config, init),
        Command::Help | Command::Version => Ok(()),
    }
}

async fn replay(path: Option<&Path>, options: RenderOptions) -> Result<()> {
    let reader: Box<dyn AsyncRead + Unpin + Send> = match path {
        Some(path) => Box::new(
            tokio::fs::File::open(path)
                .await
                .with_context(|| format!("Failed to open {}", path.display()))?,
        ),
        None => Box::new(tokio::io::stdin()),
    };

    info!(source = ?path, "replaying progress stream");
    follow_progress(line_chunks(BufReader::new(reader)), options).await?;
    debug!("progress stream complete");
    Ok(())
}

#[cfg(unix)]
async fn attach(socket: &Path) -> Result<()> {
    use dockside::attach::{attach_stream, LocalTerminal};

    let stream = tokio::net::UnixStream::connect(socket)
        .await
        .with_context(|| format!("Failed to connect to {}", socket.display()))?;

    info!(socket = %socket.display(), "attached");
    attach_stream(stream, tokio::io::stdin(), tokio::io::stdout(), &LocalTerminal).await?;
    info!("detached");
    Ok(())
}

#[cfg(not(unix))]
async fn attach(_socket: &Path) -> Result<()> {
    anyhow::bail!("attach is only supported on Unix")
}

fn show_config(config: &Config, init: bool) -> Result<()> {
    if !init {
        print!("{}", toml::to_string_pretty(config).context("Failed to serialize config")?);
        return Ok(());
    }

    let path = Config::config_path()?;
    if path.exists() {
        println!("{} already exists", path.display());
        return Ok(());
    }
    let path = Config::default().save()?;
    println!("Wrote {}", path.display());
    Ok(())
}
