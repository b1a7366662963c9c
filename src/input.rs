//! Loading and validating message and key files.
//!
//! Only the first line of a file is used. Every check here runs before a
//! requester touches the network.

use crate::core::alphabet::first_invalid_symbol;
use crate::error::{ProtocolError, Result};
use std::path::Path;
use tracing::debug;

/// The first line of `content`, without its newline.
pub fn first_line(content: &[u8]) -> &[u8] {
    match content.iter().position(|&b| b == b'\n') {
        Some(end) => &content[..end],
        None => content,
    }
}

/// Fail with [`ProtocolError::InvalidSymbol`] at the first byte outside the
/// alphabet. `source_name` names the input in the error.
pub fn validate_symbols(data: &[u8], source_name: &str) -> Result<()> {
    match first_invalid_symbol(data) {
        Some((position, symbol)) => Err(ProtocolError::InvalidSymbol {
            source_name: source_name.to_string(),
            symbol: char::from(symbol),
            position,
        }),
        None => Ok(()),
    }
}

/// Read the first line of the file at `path` and validate it.
pub fn load_symbols<P: AsRef<Path>>(path: P) -> Result<Vec<u8>> {
    let path = path.as_ref();
    let path_text = path.display().to_string();

    let content = std::fs::read(path).map_err(|e| {
        debug!(path = %path_text, error = %e, "Failed to read input");
        ProtocolError::InputNotFound {
            path: path_text.clone(),
        }
    })?;

    let line = first_line(&content);
    validate_symbols(line, &path_text)?;
    Ok(line.to_vec())
}

/// Load a message and its key, checking that the message is between 1 and
/// `capacity` symbols and that the key covers it.
pub fn load_request<P, Q>(
    message_path: P,
    key_path: Q,
    capacity: usize,
) -> Result<(Vec<u8>, Vec<u8>)>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
{
    let message = load_symbols(message_path)?;
    let key = load_symbols(key_path)?;

    if message.is_empty() || message.len() > capacity {
        return Err(ProtocolError::InvalidLength(message.len()));
    }
    if key.len() < message.len() {
        return Err(ProtocolError::KeyTooShort {
            key_len: key.len(),
            required: message.len(),
        });
    }

    Ok((message, key))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn file_with(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_first_line_only() {
        assert_eq!(first_line(b"HELLO\nIGNORED\n"), b"HELLO");
        assert_eq!(first_line(b"NO NEWLINE"), b"NO NEWLINE");
        assert_eq!(first_line(b""), b"");
    }

    #[test]
    fn test_load_valid_request() {
        let message = file_with("HELLO WORLD\n");
        let key = file_with("ABCDEFGHIJKLMNOP\n");

        let (m, k) = load_request(message.path(), key.path(), 100_000).unwrap();
        assert_eq!(m, b"HELLO WORLD");
        assert_eq!(k, b"ABCDEFGHIJKLMNOP");
    }

    #[test]
    fn test_invalid_symbol_is_reported_with_position() {
        let message = file_with("HELLO world\n");
        let err = load_symbols(message.path()).unwrap_err();
        match err {
            ProtocolError::InvalidSymbol {
                symbol, position, ..
            } => {
                assert_eq!(symbol, 'w');
                assert_eq!(position, 6);
            }
            other => panic!("Expected InvalidSymbol, got {other:?}"),
        }
    }

    #[test]
    fn test_short_key_is_rejected() {
        let message = file_with("HELLO WORLD\n");
        let key = file_with("SHORT\n");
        let err = load_request(message.path(), key.path(), 100_000).unwrap_err();
        assert!(matches!(
            err,
            ProtocolError::KeyTooShort {
                key_len: 5,
                required: 11
            }
        ));
        assert_eq!(err.exit_code(), 1);
    }

    #[test]
    fn test_missing_file() {
        let err = load_symbols("/definitely/not/here.txt").unwrap_err();
        assert!(matches!(err, ProtocolError::InputNotFound { .. }));
    }

    #[test]
    fn test_missing_file_reports_path_with_debug_logging() {
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_test_writer()
            .finish();

        let err = tracing::subscriber::with_default(subscriber, || {
            load_symbols("/definitely/not/key.txt").unwrap_err()
        });

        match err {
            ProtocolError::InputNotFound { path } => assert_eq!(path, "/definitely/not/key.txt"),
            other => panic!("Expected InputNotFound, got {other:?}"),
        }
    }

    #[test]
    fn test_empty_and_oversized_messages() {
        let empty = file_with("\n");
        let key = file_with("ABC\n");
        assert!(matches!(
            load_request(empty.path(), key.path(), 100).unwrap_err(),
            ProtocolError::InvalidLength(0)
        ));

        let long = file_with("ABCDE\n");
        let long_key = file_with("ABCDE\n");
        assert!(matches!(
            load_request(long.path(), long_key.path(), 4).unwrap_err(),
            ProtocolError::InvalidLength(5)
        ));
    }
}
