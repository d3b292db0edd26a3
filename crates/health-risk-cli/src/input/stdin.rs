use std::io::{self, Read};

use crate::input::file::decode_text;

/// Read piped stdin as text. Returns None when stdin is a TTY or the
/// piped content is blank.
pub fn read_stdin_text() -> Result<Option<String>, Box<dyn std::error::Error>> {
    if atty::is(atty::Stream::Stdin) {
        return Ok(None);
    }

    let mut buffer = Vec::new();
    io::stdin().read_to_end(&mut buffer)?;

    let text = decode_text(buffer, "stdin");
    if text.trim().is_empty() {
        return Ok(None);
    }
    Ok(Some(text))
}

/// Piped stdin parsed as JSON.
pub fn read_stdin_json() -> Result<Option<serde_json::Value>, Box<dyn std::error::Error>> {
    match read_stdin_text()? {
        Some(text) => Ok(Some(serde_json::from_str(text.trim())?)),
        None => Ok(None),
    }
}
