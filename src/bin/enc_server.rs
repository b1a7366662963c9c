//! Encryption server: `enc_server <port>`

use std::process::ExitCode;

use otp_protocol::cli::{self, ServerArgs};
use otp_protocol::ServiceRole;

#[tokio::main]
async fn main() -> ExitCode {
    match cli::parse_args::<ServerArgs>() {
        Ok(args) => cli::run_server(ServiceRole::Encryption, args).await,
        Err(code) => code,
    }
}
