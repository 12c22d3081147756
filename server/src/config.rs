//! Configuration for the match host
//!
//! Each setting is read from the environment, falling back to a default:
//! 1. KFCHESS_PIECES_DIR: piece rule data and board layout (`./pieces`)
//! 2. KFCHESS_TICK_MS: simulation tick period in milliseconds (33)
//! 3. KFCHESS_LOG_DIR: optional directory for daily log files

use std::path::PathBuf;
use std::time::Duration;

const PIECES_DIR_VAR: &str = "KFCHESS_PIECES_DIR";
const TICK_MS_VAR: &str = "KFCHESS_TICK_MS";
const LOG_DIR_VAR: &str = "KFCHESS_LOG_DIR";

const DEFAULT_PIECES_DIR: &str = "./pieces";
const DEFAULT_TICK_MS: u64 = 33;

/// Get the directory holding per-piece rule data and `board.csv`.
pub fn get_pieces_dir() -> PathBuf {
    std::env::var(PIECES_DIR_VAR)
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_PIECES_DIR))
}

/// Get the tick period. Unparsable or zero values fall back to the default.
pub fn get_tick_period() -> Duration {
    Duration::from_millis(parse_tick_ms(std::env::var(TICK_MS_VAR).ok().as_deref()))
}

/// Get the log directory, if file logging was requested.
pub fn get_log_dir() -> Option<PathBuf> {
    std::env::var(LOG_DIR_VAR)
        .ok()
        .filter(|dir| !dir.is_empty())
        .map(PathBuf::from)
}

fn parse_tick_ms(raw: Option<&str>) -> u64 {
    match raw.map(str::trim).map(str::parse::<u64>) {
        Some(Ok(ms)) if ms > 0 => ms,
        Some(_) => {
            tracing::warn!("Ignoring invalid {}, using {}ms", TICK_MS_VAR, DEFAULT_TICK_MS);
            DEFAULT_TICK_MS
        }
        None => DEFAULT_TICK_MS,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_pieces_dir_fallback() {
        // Returns KFCHESS_PIECES_DIR when it is set, which is also correct.
        let dir = get_pieces_dir();
        assert!(!dir.as_os_str().is_empty());
    }

    #[test]
    fn test_parse_tick_ms() {
        assert_eq!(parse_tick_ms(None), DEFAULT_TICK_MS);
        assert_eq!(parse_tick_ms(Some("16")), 16);
        assert_eq!(parse_tick_ms(Some(" 50 ")), 50);
        assert_eq!(parse_tick_ms(Some("0")), DEFAULT_TICK_MS);
        assert_eq!(parse_tick_ms(Some("fast")), DEFAULT_TICK_MS);
    }
}
