//! Encryption client: `enc_client <message> <key> <port>`

use std::process::ExitCode;

use otp_protocol::cli::{self, ClientArgs};
use otp_protocol::ServiceRole;

#[tokio::main]
async fn main() -> ExitCode {
    match cli::parse_args::<ClientArgs>() {
        Ok(args) => cli::run_client(ServiceRole::Encryption, args).await,
        Err(code) => code,
    }
}
