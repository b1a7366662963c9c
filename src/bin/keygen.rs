//! Key generator: `keygen <length>`

use std::process::ExitCode;

use otp_protocol::cli::{self, KeygenArgs};

fn main() -> ExitCode {
    match cli::parse_args::<KeygenArgs>() {
        Ok(args) => cli::run_keygen(args),
        Err(code) => code,
    }
}
