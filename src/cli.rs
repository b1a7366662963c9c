//! Argument parsing and entry points for the command-line programs.
//!
//! Each binary under `src/bin` is a thin wrapper around one of the `run_*`
//! functions here. Program output goes to stdout; diagnostics and logs go
//! to stderr.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::error::ErrorKind;
use clap::Parser;
use tracing::{debug, error};

use crate::config::ServiceConfig;
use crate::error::{ProtocolError, Result};
use crate::input;
use crate::keygen;
use crate::protocol::role::ServiceRole;
use crate::service::{ClientRequester, ServiceListener};
use crate::utils::logging::init_logging;

/// Arguments shared by both servers
#[derive(Debug, Parser)]
#[command(version, about = "Serve one-time-pad requests on a TCP port")]
pub struct ServerArgs {
    /// Port to listen on
    pub port: u16,

    /// TOML configuration file; environment variables are used when absent
    #[arg(long)]
    pub config: Option<PathBuf>,
}

/// Arguments shared by both clients
#[derive(Debug, Parser)]
#[command(version, about = "Send a message and key to a one-time-pad server")]
pub struct ClientArgs {
    /// File whose first line is the message
    pub message: PathBuf,

    /// File whose first line is the key
    pub key: PathBuf,

    /// Port the server listens on
    pub port: u16,

    /// TOML configuration file; environment variables are used when absent
    #[arg(long)]
    pub config: Option<PathBuf>,
}

/// Arguments for the key generator
#[derive(Debug, Parser)]
#[command(version, about = "Print a random key over the 27-symbol alphabet")]
pub struct KeygenArgs {
    /// Number of symbols to generate
    pub length: usize,
}

/// Parse the process arguments.
///
/// Help and version requests print and yield exit code 0; any other parse
/// failure prints the usage error and yields exit code 1.
pub fn parse_args<T: Parser>() -> std::result::Result<T, ExitCode> {
    parse_args_from(std::env::args_os())
}

/// [`parse_args`] over an explicit argument list.
pub fn parse_args_from<T, I, A>(args: I) -> std::result::Result<T, ExitCode>
where
    T: Parser,
    I: IntoIterator<Item = A>,
    A: Into<std::ffi::OsString> + Clone,
{
    T::try_parse_from(args).map_err(|e| {
        let _ = e.print();
        match e.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => ExitCode::SUCCESS,
            kind => ExitCode::from(exit_status(&ProtocolError::Usage(format!("{kind:?}")))),
        }
    })
}

/// Load configuration from `path`, or from the environment when no file is given.
pub fn load_config(path: Option<&Path>) -> Result<ServiceConfig> {
    let config = match path {
        Some(path) => ServiceConfig::from_file(path)?,
        None => ServiceConfig::from_env()?,
    };
    config.validate_strict()?;
    Ok(config)
}

/// Report `err` on stderr and turn it into the matching exit code.
pub fn report_failure(err: &ProtocolError) -> ExitCode {
    eprintln!("Error: {err}");
    ExitCode::from(exit_status(err))
}

fn exit_status(err: &ProtocolError) -> u8 {
    u8::try_from(err.exit_code()).unwrap_or(1)
}

/// Run a server until Ctrl-C.
///
/// Exits with 1 when configuration or socket setup fails. Per-request
/// failures are logged and never stop the server.
pub async fn run_server(role: ServiceRole, args: ServerArgs) -> ExitCode {
    let config = match load_config(args.config.as_deref()) {
        Ok(config) => config,
        Err(e) => return report_failure(&e),
    };
    init_logging(&config.logging);

    let listener = match ServiceListener::bind(role, args.port, &config) {
        Ok(listener) => listener,
        Err(e) => {
            error!(error = %e, "Server setup failed");
            eprintln!("Error: {e}");
            return ExitCode::from(1);
        }
    };

    match listener.run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::from(1)
        }
    }
}

/// Run one request against a server and print the result.
///
/// Exit codes: 0 on success, 1 for usage, input or configuration problems,
/// 2 for connection and protocol failures.
pub async fn run_client(role: ServiceRole, args: ClientArgs) -> ExitCode {
    match client_request(role, &args).await {
        Ok(result) => match write_line(&result) {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => report_failure(&ProtocolError::Io(e)),
        },
        Err(e) => report_failure(&e),
    }
}

async fn client_request(role: ServiceRole, args: &ClientArgs) -> Result<Vec<u8>> {
    let config = load_config(args.config.as_deref())?;
    init_logging(&config.logging);

    let (message, key) =
        input::load_request(&args.message, &args.key, config.transport.max_message_size)?;
    debug!(symbols = message.len(), port = args.port, "Input validated");

    ClientRequester::new(role, args.port, &config)
        .request(&message, &key)
        .await
}

/// Print a generated key followed by a newline.
pub fn run_keygen(args: KeygenArgs) -> ExitCode {
    let key = keygen::generate_key(args.length);
    match write_line(&key) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => report_failure(&ProtocolError::Io(e)),
    }
}

fn write_line(bytes: &[u8]) -> std::io::Result<()> {
    let mut stdout = std::io::stdout().lock();
    stdout.write_all(bytes)?;
    stdout.write_all(b"\n")?;
    stdout.flush()
}
