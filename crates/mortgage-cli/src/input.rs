use serde::de::DeserializeOwned;
use std::io::{self, Read};
use std::path::Path;

/// Read a loan description from a JSON or YAML file, picked by extension.
pub fn read_input_file<T: DeserializeOwned>(path: &str) -> Result<T, Box<dyn std::error::Error>> {
    let p = Path::new(path);
    if !p.is_file() {
        return Err(format!("File not found: {path}").into());
    }

    let contents = std::fs::read_to_string(p)
        .map_err(|e| format!("Failed to read '{path}': {e}"))?;

    let yaml = matches!(
        p.extension().and_then(|e| e.to_str()),
        Some("yaml") | Some("yml")
    );
    if yaml {
        serde_yaml::from_str(&contents).map_err(|e| format!("Failed to parse '{path}': {e}").into())
    } else {
        serde_json::from_str(&contents).map_err(|e| format!("Failed to parse '{path}': {e}").into())
    }
}

/// Read JSON from stdin if data is being piped.
/// Returns None if stdin is a TTY (interactive) or empty.
pub fn read_stdin<T: DeserializeOwned>() -> Result<Option<T>, Box<dyn std::error::Error>> {
    if atty::is(atty::Stream::Stdin) {
        return Ok(None);
    }

    let mut buffer = String::new();
    io::stdin().read_to_string(&mut buffer)?;

    let trimmed = buffer.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }

    Ok(Some(serde_json::from_str(trimmed)?))
}
