//! CLI argument parsing

use std::path::PathBuf;

use anyhow::{bail, Context, Result};

pub const USAGE: &str = "\
dockside - Docker progress display and stream attachment

USAGE:
    dockside replay [FILE] [--columns N]   Render a captured progress stream (stdin if no FILE)
    dockside attach <SOCKET>               Attach the terminal to a raw stream on a Unix socket
    dockside config [--init]               Show the configuration, or write the defaults
    dockside --help | --version
";

/// Subcommand to run
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    Replay {
        path: Option<PathBuf>,
        columns: Option<u16>,
    },
    Attach {
        socket: PathBuf,
    },
    Config {
        init: bool,
    },
    Help,
    Version,
}

impl Command {
    /// Parse command-line arguments, excluding the binary name
    pub fn parse_from<I, S>(args: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut iter = args.into_iter().map(Into::into);

        let Some(first) = iter.next() else {
            return Ok(Command::Help);
        };

        match first.as_str() {
            "--help" | "-h" | "help" => Ok(Command::Help),
            "--version" | "-V" => Ok(Command::Version),
            "replay" => {
                let mut path = None;
                let mut columns = None;
                while let Some(arg) = iter.next() {
                    match arg.as_str() {
                        "--columns" | "-c" => {
                            let value = iter.next().context("--columns needs a value")?;
                            columns = Some(parse_columns(&value)?);
                        }
                        "-" if path.is_none() => {}
                        _ if !arg.starts_with('-') && path.is_none() => {
                            path = Some(PathBuf::from(arg));
                        }
                        _ => bail!("unexpected argument for replay: {arg}"),
                    }
                }
                Ok(Command::Replay { path, columns })
            }
            "attach" => {
                let socket = iter.next().context("attach needs a socket path")?;
                if let Some(extra) = iter.next() {
                    bail!("unexpected argument for attach: {extra}");
                }
                Ok(Command::Attach {
                    socket: PathBuf::from(socket),
                })
            }
            "config" => {
                let mut init = false;
                for arg in iter {
                    match arg.as_str() {
                        "--init" => init = true,
                        _ => bail!("unexpected argument for config: {arg}"),
                    }
                }
                Ok(Command::Config { init })
            }
            other => bail!("unknown command: {other}"),
        }
    }
}

fn parse_columns(value: &str) -> Result<u16> {
    let columns: u16 = value
        .parse()
        .with_context(|| format!("invalid column count: {value}"))?;
    if columns == 0 {
        bail!("column count must be positive");
    }
    Ok(columns)
}
