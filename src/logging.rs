use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

use crate::config::LoggingSettings;

/// Environment variable that overrides the configured filter.
pub const LOG_ENV: &str = "MEDIASCOUT_LOG";

const DEFAULT_FILTER: &str = "mediascout=info,warn";

/// Keeps the non-blocking file writer alive; drop it only at shutdown.
#[allow(dead_code)]
pub struct LogGuard(tracing_appender::non_blocking::WorkerGuard);

/// Initialize logging.
///
/// Logs go to stderr unless `log_file` is configured, in which case a daily-rolling
/// file is used and a guard is returned. Calling this twice is harmless.
pub fn init(settings: &LoggingSettings) -> Result<Option<LogGuard>> {
    let filter = build_filter(settings.filter.as_deref());

    let Some(raw_path) = settings.log_file.as_deref() else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .try_init()
            .ok();
        return Ok(None);
    };

    let path = PathBuf::from(expand_tilde(raw_path));
    let (dir, file_name) = split_dir_and_name(&path)?;
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("Failed to create log directory: {}", dir.display()))?;

    let appender = tracing_appender::rolling::daily(&dir, &file_name);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_target(true)
        .with_writer(writer)
        .try_init()
        .ok(); // Already initialized (e.g. in tests)

    tracing::info!(log_dir = %dir.display(), file = %file_name, "writing logs to file");

    Ok(Some(LogGuard(guard)))
}

fn build_filter(configured: Option<&str>) -> EnvFilter {
    if let Ok(from_env) = EnvFilter::try_from_env(LOG_ENV) {
        return from_env;
    }
    configured
        .and_then(|directive| EnvFilter::try_new(directive).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_FILTER))
}

fn expand_tilde(raw: &str) -> String {
    if raw == "~" || raw.starts_with("~/") {
        if let Some(home) = dirs::home_dir() {
            let suffix = raw.strip_prefix('~').unwrap_or("");
            return format!("{}{}", home.display(), suffix);
        }
    }
    raw.to_string()
}

fn split_dir_and_name(path: &Path) -> Result<(PathBuf, String)> {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));
    let name = path
        .file_name()
        .and_then(|s| s.to_str())
        .context("Invalid log_file: not valid UTF-8")?
        .to_string();
    Ok((dir, name))
}

/// Best-effort redaction of secrets before upstream text reaches the logs.
///
/// Masks `sk-...` style keys and the values of `key=` / `apikey=` query parameters.
pub fn redact_secrets(input: &str) -> String {
    redact_query_keys(&redact_sk_keys(input))
}

fn redact_sk_keys(input: &str) -> String {
    let bytes = input.as_bytes();
    let mut out = String::with_capacity(input.len());
    let mut last = 0usize;
    let mut i = 0usize;

    while i < input.len() {
        if input[i..].starts_with("sk-") && i + 3 < input.len() {
            let end = token_end(bytes, i + 3);
            // Require a minimum length to reduce false positives.
            if end.saturating_sub(i + 3) >= 8 {
                out.push_str(&input[last..i]);
                out.push_str("sk-***REDACTED***");
                last = end;
                i = end;
                continue;
            }
        }
        i += input[i..].chars().next().map_or(1, char::len_utf8);
    }

    out.push_str(&input[last..]);
    out
}

fn redact_query_keys(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(pos) = find_key_param(rest) {
        let (head, tail) = rest.split_at(pos);
        let eq = tail.find('=').map_or(tail.len(), |e| e + 1);
        out.push_str(head);
        out.push_str(&tail[..eq]);
        let value_end = token_end(tail.as_bytes(), eq);
        if value_end > eq {
            out.push_str("***");
        }
        rest = &tail[value_end..];
    }

    out.push_str(rest);
    out
}

/// Position of the next `key=` or `apikey=` that starts a query parameter.
fn find_key_param(s: &str) -> Option<usize> {
    let lower = s.to_ascii_lowercase();
    let mut from = 0;
    while from < lower.len() {
        let rel = ["key=", "apikey="]
            .iter()
            .filter_map(|needle| lower[from..].find(needle))
            .min()?;
        let pos = from + rel;
        let at_boundary = pos == 0 || matches!(lower.as_bytes()[pos - 1], b'?' | b'&');
        if at_boundary {
            return Some(pos);
        }
        from = pos + 1;
    }
    None
}

fn token_end(bytes: &[u8], start: usize) -> usize {
    let mut j = start;
    while j < bytes.len() {
        match bytes[j] {
            b'a'..=b'z' | b'A'..=b'Z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'%' => j += 1,
            _ => break,
        }
    }
    j
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redacts_sk_keys() {
        let out = redact_secrets("bad key sk-abcdefghijklmnop provided");
        assert_eq!(out, "bad key sk-***REDACTED*** provided");
        // Too short to be a key
        assert_eq!(redact_secrets("sk-abc"), "sk-abc");
    }

    #[test]
    fn test_redacts_query_parameters() {
        let out = redact_secrets(
            "error sending request for url (https://www.googleapis.com/customsearch/v1?key=AIzaSy123&cx=abc&q=dune)",
        );
        assert_eq!(
            out,
            "error sending request for url (https://www.googleapis.com/customsearch/v1?key=***&cx=abc&q=dune)"
        );
        assert_eq!(
            redact_secrets("https://www.omdbapi.com/?t=Heat&apikey=deadbeef"),
            "https://www.omdbapi.com/?t=Heat&apikey=***"
        );
    }

    #[test]
    fn test_leaves_unrelated_text_alone() {
        let text = "monkey=1 and turkey=2 are not secrets";
        assert_eq!(redact_secrets(text), text);
    }

    #[test]
    fn test_split_dir_and_name() {
        let (dir, name) = split_dir_and_name(Path::new("/var/log/mediascout.log")).unwrap();
        assert_eq!(dir, PathBuf::from("/var/log"));
        assert_eq!(name, "mediascout.log");

        let (dir, _) = split_dir_and_name(Path::new("mediascout.log")).unwrap();
        assert_eq!(dir, PathBuf::from("."));
    }
}
