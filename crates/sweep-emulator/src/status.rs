//! Parsing of the emulator's `status` output
//!
//! The emulator prints newline-delimited `key: value` lines:
//!
//! ```text
//! Windows Azure Storage Emulator 5.10.0.0 command line tool
//! IsRunning: True
//! BlobEndpoint: http://127.0.0.1:10000/
//! QueueEndpoint: http://127.0.0.1:10001/
//! TableEndpoint: http://127.0.0.1:10002/
//! ```
//!
//! Only the `IsRunning` line is load-bearing. Errors arrive on stderr as
//! free-form text; the part after the final `:` is surfaced.

use crate::runner::ProcessResult;
use sweep_core::prelude::*;

/// Key of the single line that carries liveness
const STATUS_KEY: &str = "IsRunning";

/// Liveness and error text derived from one [`ProcessResult`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmulatorStatus {
    pub is_running: bool,
    pub error_message: Option<String>,
}

impl EmulatorStatus {
    pub fn from_result(result: &ProcessResult) -> Result<Self> {
        let is_running = parse_status(&result.stdout)?;
        let error = parse_error(&result.stderr);

        Ok(Self {
            is_running,
            error_message: (!error.is_empty()).then_some(error),
        })
    }
}

/// Extract the `IsRunning` flag from status output.
///
/// A missing status line means "not running". A status line whose value is
/// not a boolean literal, or more than one status line, is a
/// [`Error::ParseFailure`].
pub fn parse_status(output: &str) -> Result<bool> {
    let mut status_lines = output
        .lines()
        .filter(|line| !line.is_empty())
        .filter(|line| line.starts_with(STATUS_KEY));

    let Some(line) = status_lines.next() else {
        return Ok(false);
    };

    if status_lines.next().is_some() {
        return Err(Error::parse_failure(format!(
            "multiple {} lines in status output",
            STATUS_KEY
        )));
    }

    let value = trailing_segment(line);
    parse_bool(value).ok_or_else(|| Error::parse_failure(format!("'{}'", line.trim())))
}

/// Extract the surfaced error message from stderr text.
///
/// Returns an empty string when the stream was empty.
pub fn parse_error(stderr: &str) -> String {
    trailing_segment(stderr).to_string()
}

/// Text after the final `:`, trimmed; the whole input when there is none
fn trailing_segment(text: &str) -> &str {
    text.rsplit(':').next().unwrap_or_default().trim()
}

fn parse_bool(value: &str) -> Option<bool> {
    if value.eq_ignore_ascii_case("true") {
        Some(true)
    } else if value.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RUNNING_OUTPUT: &str = "Windows Azure Storage Emulator 5.10.0.0 command line tool\r\n\
                                  IsRunning: True\r\n\
                                  BlobEndpoint: http://127.0.0.1:10000/\r\n\
                                  QueueEndpoint: http://127.0.0.1:10001/\r\n\
                                  TableEndpoint: http://127.0.0.1:10002/\r\n";

    #[test]
    fn test_parse_status_running() {
        assert!(parse_status(RUNNING_OUTPUT).unwrap());
    }

    #[test]
    fn test_parse_status_stopped() {
        let output = RUNNING_OUTPUT.replace("IsRunning: True", "IsRunning: False");
        assert!(!parse_status(&output).unwrap());
    }

    #[test]
    fn test_parse_status_casing_and_whitespace() {
        assert!(parse_status("IsRunning:true").unwrap());
        assert!(parse_status("IsRunning:   TRUE   ").unwrap());
        assert!(parse_status("IsRunning :\ttRuE").unwrap());
        assert!(!parse_status("IsRunning: fAlSe\n").unwrap());
    }

    #[test]
    fn test_parse_status_unix_newlines() {
        assert!(parse_status("header\nIsRunning: True\nfooter\n").unwrap());
    }

    #[test]
    fn test_parse_status_missing_line_is_not_running() {
        assert!(!parse_status("").unwrap());
        assert!(!parse_status("\r\n\r\n").unwrap());
        assert!(!parse_status("BlobEndpoint: http://127.0.0.1:10000/\n").unwrap());
    }

    #[test]
    fn test_parse_status_indented_line_is_ignored() {
        // The key must start the line
        assert!(!parse_status("  IsRunning: True").unwrap());
    }

    #[test]
    fn test_parse_status_invalid_literal_is_parse_failure() {
        let err = parse_status("IsRunning: maybe").unwrap_err();
        assert!(matches!(err, Error::ParseFailure { .. }));
        assert!(err.to_string().contains("IsRunning: maybe"));
    }

    #[test]
    fn test_parse_status_empty_value_is_parse_failure() {
        assert!(matches!(
            parse_status("IsRunning:").unwrap_err(),
            Error::ParseFailure { .. }
        ));
    }

    #[test]
    fn test_parse_status_duplicate_line_is_parse_failure() {
        let err = parse_status("IsRunning: True\nIsRunning: False\n").unwrap_err();
        assert!(matches!(err, Error::ParseFailure { .. }));
        assert!(err.to_string().contains("multiple"));
    }

    #[test]
    fn test_parse_error_empty() {
        assert_eq!(parse_error(""), "");
        assert_eq!(parse_error("\r\n"), "");
    }

    #[test]
    fn test_parse_error_takes_trailing_segment() {
        assert_eq!(parse_error("Error: emulator busy"), "emulator busy");
        assert_eq!(
            parse_error("Error: port already in use\r\n"),
            "port already in use"
        );
        assert_eq!(parse_error("a: b: c"), "c");
    }

    #[test]
    fn test_parse_error_without_separator() {
        assert_eq!(parse_error("something went wrong"), "something went wrong");
    }

    #[test]
    fn test_status_from_result() {
        let status =
            EmulatorStatus::from_result(&ProcessResult::exited(RUNNING_OUTPUT, "")).unwrap();
        assert!(status.is_running);
        assert_eq!(status.error_message, None);

        let status = EmulatorStatus::from_result(&ProcessResult::exited(
            "IsRunning: False",
            "Error: emulator busy",
        ))
        .unwrap();
        assert!(!status.is_running);
        assert_eq!(status.error_message.as_deref(), Some("emulator busy"));
    }
}
