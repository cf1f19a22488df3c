//! # Table-driven line classifier.
//!
//! Maps a raw line to a ([`LogLevel`], [`LogCategory`]) pair by
//! case-insensitive substring match. The rules live in two const tables so
//! they can be audited and tested without touching the pipeline.
//!
//! ## Rules
//! - First matching entry of a table wins; tables are ordered by precedence.
//! - Direct `stderr` lines are always `error` — the level table applies to
//!   `stdout` and `file` lines only.
//! - When no category rule matches, the source's default category is used
//!   (`console` for streams, the watched file's configured category for the
//!   tailer).

use super::entry::{LogCategory, LogLevel, LogSource};

/// Substring → level, ordered by precedence.
const LEVEL_RULES: &[(&str, LogLevel)] = &[
    ("[error]", LogLevel::Error),
    ("error:", LogLevel::Error),
    ("uncaught", LogLevel::Error),
    ("exception", LogLevel::Error),
    ("[warn", LogLevel::Warning),
    ("warning", LogLevel::Warning),
    ("[debug]", LogLevel::Debug),
];

/// Substring → category, ordered by precedence.
const CATEGORY_RULES: &[(&str, LogCategory)] = &[
    ("[network]", LogCategory::Network),
    ("fetch", LogCategory::Network),
    ("http", LogCategory::Network),
    ("[renderer]", LogCategory::Renderer),
    ("[browser]", LogCategory::Renderer),
    ("[security]", LogCategory::Security),
    ("cors", LogCategory::Security),
    ("csp", LogCategory::Security),
    ("[ipc]", LogCategory::Ipc),
    ("[performance]", LogCategory::Performance),
    ("memory", LogCategory::Performance),
    ("cpu", LogCategory::Performance),
];

/// Classifies one line.
///
/// `default_category` is the source-provided fallback: `console` for direct
/// stream pushes, the watched file's category for tailed lines.
pub fn classify(
    line: &str,
    source: LogSource,
    default_category: LogCategory,
) -> (LogLevel, LogCategory) {
    let lowered = line.to_lowercase();

    let level = match source {
        LogSource::Stderr => LogLevel::Error,
        LogSource::Stdout | LogSource::File => LEVEL_RULES
            .iter()
            .find(|(needle, _)| lowered.contains(needle))
            .map(|(_, level)| *level)
            .unwrap_or(LogLevel::Info),
    };

    let category = CATEGORY_RULES
        .iter()
        .find(|(needle, _)| lowered.contains(needle))
        .map(|(_, category)| *category)
        .unwrap_or(default_category);

    (level, category)
}
