//! Shared formatting utilities used by both CLI and TUI
//!
//! Size constants, string truncation, Slurm-style durations, byte sizes and
//! usage ratios. The parser only borrows the size constants; everything else is
//! presentation.

use chrono::NaiveDateTime;

/// Memory size constants (in bytes)
pub mod size {
    pub const KB: u64 = 1024;
    pub const MB: u64 = KB * 1024;
    pub const GB: u64 = MB * 1024;
    pub const TB: u64 = GB * 1024;
}

/// Layout constants used across CLI and TUI
pub mod layout {
    /// Width of the text usage bars in one-shot output
    pub const BAR_LENGTH: usize = 20;
}

/// Utilization thresholds for color coding
pub mod thresholds {
    pub const UTILIZATION_LOW: f64 = 50.0;
    pub const UTILIZATION_HIGH: f64 = 80.0;
    /// Nearly full: the dashboard bars turn red from here
    pub const UTILIZATION_CRITICAL: f64 = 95.0;
}

/// Truncate a string to a maximum length (in characters), adding "..." at the end if truncated.
///
/// This function is Unicode-safe and counts characters, not bytes.
///
/// # Examples
/// ```
/// use smon::formatting::truncate_string;
/// assert_eq!(truncate_string("hello", 10), "hello");
/// assert_eq!(truncate_string("hello world", 8), "hello...");
/// assert_eq!(truncate_string("ab", 2), "ab");
/// ```
#[must_use]
pub fn truncate_string(s: &str, max_len: usize) -> String {
    let char_count = s.chars().count();
    if char_count <= max_len {
        s.to_string()
    } else if max_len <= 3 {
        // Too short for an ellipsis
        s.chars().take(max_len).collect()
    } else {
        let truncated: String = s.chars().take(max_len - 3).collect();
        format!("{truncated}...")
    }
}

/// Format duration the way Slurm prints it: `HH:MM:SS` or `D-HH:MM:SS`.
///
/// # Examples
/// ```
/// use smon::formatting::format_duration_hms;
/// assert_eq!(format_duration_hms(3661), "01:01:01");
/// assert_eq!(format_duration_hms(90061), "1-01:01:01");
/// ```
#[must_use]
pub fn format_duration_hms(seconds: u64) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;

    if hours >= 24 {
        format!("{}-{:02}:{minutes:02}:{secs:02}", hours / 24, hours % 24)
    } else {
        format!("{hours:02}:{minutes:02}:{secs:02}")
    }
}

/// Remaining wall time; `None` is an unlimited job.
///
/// # Examples
/// ```
/// use smon::formatting::format_time_left;
/// assert_eq!(format_time_left(Some(59)), "00:00:59");
/// assert_eq!(format_time_left(None), "UNLIMITED");
/// ```
#[must_use]
pub fn format_time_left(seconds: Option<u64>) -> String {
    seconds.map_or_else(|| "UNLIMITED".to_string(), format_duration_hms)
}

/// Format duration in short human-readable style (e.g., "2d 3h", "5m 3s").
///
/// Shows at most 2 time units.
///
/// # Examples
/// ```
/// use smon::formatting::format_duration_human;
/// assert_eq!(format_duration_human(0), "0s");
/// assert_eq!(format_duration_human(3660), "1h 1m");
/// assert_eq!(format_duration_human(90000), "1d 1h");
/// ```
#[must_use]
pub fn format_duration_human(seconds: u64) -> String {
    let days = seconds / 86400;
    let hours = (seconds % 86400) / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;

    let (major, minor) = if days > 0 {
        ((days, 'd'), (hours, 'h'))
    } else if hours > 0 {
        ((hours, 'h'), (minutes, 'm'))
    } else if minutes > 0 {
        ((minutes, 'm'), (secs, 's'))
    } else {
        return format!("{secs}s");
    };

    if minor.0 > 0 {
        format!("{}{} {}{}", major.0, major.1, minor.0, minor.1)
    } else {
        format!("{}{}", major.0, major.1)
    }
}

/// Format raw bytes to human-readable size.
///
/// # Examples
/// ```
/// use smon::formatting::format_bytes;
/// assert_eq!(format_bytes(512), "512B");
/// assert_eq!(format_bytes(1536), "1.5K");
/// assert_eq!(format_bytes(1073741824), "1.0G");
/// ```
#[must_use]
pub fn format_bytes(bytes: u64) -> String {
    use size::{GB, KB, MB, TB};

    if bytes >= TB {
        format!("{:.1}T", bytes as f64 / TB as f64)
    } else if bytes >= GB {
        format!("{:.1}G", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.1}M", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1}K", bytes as f64 / KB as f64)
    } else {
        format!("{bytes}B")
    }
}

/// Whole gibibytes, the node table's memory unit.
#[must_use]
pub fn format_gib(bytes: u64) -> String {
    format!("{}G", bytes / size::GB)
}

/// Share of `total` taken by `used`, in percent. Zero when `total` is zero.
#[must_use]
pub fn percent(used: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        used as f64 / total as f64 * 100.0
    }
}

/// Month, day and minute of a submit time; `-` when unknown.
#[must_use]
pub fn format_submit_time(time: Option<NaiveDateTime>) -> String {
    time.map_or_else(|| "-".to_string(), |t| t.format("%m-%d %H:%M").to_string())
}

/// Text usage bar such as `[#######.............]`.
///
/// # Examples
/// ```
/// use smon::formatting::usage_bar;
/// assert_eq!(usage_bar(50.0, 4), "[##..]");
/// ```
#[must_use]
pub fn usage_bar(percent: f64, width: usize) -> String {
    let filled = ((percent.clamp(0.0, 100.0) / 100.0) * width as f64).round() as usize;
    format!("[{}{}]", "#".repeat(filled), ".".repeat(width - filled.min(width)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_string() {
        assert_eq!(truncate_string("hello", 10), "hello");
        assert_eq!(truncate_string("hello world", 8), "hello...");
        assert_eq!(truncate_string("abc", 3), "abc");
        assert_eq!(truncate_string("abcd", 3), "abc");
        assert_eq!(truncate_string("abcdefgh", 6), "abc...");
    }

    #[test]
    fn test_truncate_string_unicode() {
        let long_chinese = "\u{4e2d}\u{6587}\u{6d4b}\u{8bd5}\u{5b57}\u{7b26}";
        assert_eq!(truncate_string(long_chinese, 5), "\u{4e2d}\u{6587}...");

        let emoji = "\u{1F600}\u{1F601}\u{1F602}";
        assert_eq!(truncate_string(emoji, 3), emoji);
        assert_eq!(truncate_string(emoji, 2), "\u{1F600}\u{1F601}");
    }

    #[test]
    fn test_format_duration_hms() {
        assert_eq!(format_duration_hms(0), "00:00:00");
        assert_eq!(format_duration_hms(61), "00:01:01");
        assert_eq!(format_duration_hms(86400), "1-00:00:00");
        assert_eq!(format_duration_hms(90061), "1-01:01:01");
    }

    #[test]
    fn test_format_duration_human() {
        assert_eq!(format_duration_human(45), "45s");
        assert_eq!(format_duration_human(65), "1m 5s");
        assert_eq!(format_duration_human(3600), "1h");
        assert_eq!(format_duration_human(86400), "1d");
    }

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(1024), "1.0K");
        assert_eq!(format_bytes(1048576), "1.0M");
        assert_eq!(format_bytes(1099511627776), "1.0T");
        assert_eq!(format_gib(512 * size::GB + 10), "512G");
    }

    #[test]
    fn test_percent_and_bar() {
        assert_eq!(percent(0, 0), 0.0);
        assert_eq!(percent(1, 4), 25.0);
        assert_eq!(usage_bar(0.0, 3), "[...]");
        assert_eq!(usage_bar(150.0, 3), "[###]");
    }

    #[test]
    fn test_format_submit_time() {
        let t = NaiveDateTime::parse_from_str("2026-03-04T05:06:07", "%Y-%m-%dT%H:%M:%S").unwrap();
        assert_eq!(format_submit_time(Some(t)), "03-04 05:06");
        assert_eq!(format_submit_time(None), "-");
    }
}
