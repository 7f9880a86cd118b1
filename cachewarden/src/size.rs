//! Human-readable size parsing (e.g., "2GB", "500MB").

use std::fmt;
use thiserror::Error;

/// Error parsing a size string.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("Invalid size '{input}' - expected format like '2GB', '500MB', or '1024KB'")]
pub struct SizeParseError {
    input: String,
}

impl SizeParseError {
    fn new(input: impl Into<String>) -> Self {
        Self {
            input: input.into(),
        }
    }
}

/// Parse a human-readable size string into bytes.
///
/// Supports:
/// - Bare numbers (treated as bytes)
/// - KB/K suffix (1024 bytes)
/// - MB/M suffix (1024² bytes)
/// - GB/G suffix (1024³ bytes)
/// - Case-insensitive
/// - Whitespace tolerant
///
/// # Examples
///
/// ```
/// use cachewarden::size::parse_size;
///
/// assert_eq!(parse_size("1024").unwrap(), 1024);
/// assert_eq!(parse_size("1KB").unwrap(), 1024);
/// assert_eq!(parse_size("1 KB").unwrap(), 1024);
/// assert_eq!(parse_size("2GB").unwrap(), 2 * 1024 * 1024 * 1024);
/// assert_eq!(parse_size("500mb").unwrap(), 500 * 1024 * 1024);
/// ```
pub fn parse_size(s: &str) -> Result<u64, SizeParseError> {
    let s = s.trim();
    if s.is_empty() {
        return Err(SizeParseError::new(s));
    }

    let s_upper = s.to_uppercase();
    let s_upper = s_upper.trim();

    let (num_str, multiplier) = if s_upper.ends_with("GB") || s_upper.ends_with("G") {
        let suffix_len = if s_upper.ends_with("GB") { 2 } else { 1 };
        let num_part = s[..s.len() - suffix_len].trim();
        (num_part, 1024_u64 * 1024 * 1024)
    } else if s_upper.ends_with("MB") || s_upper.ends_with("M") {
        let suffix_len = if s_upper.ends_with("MB") { 2 } else { 1 };
        let num_part = s[..s.len() - suffix_len].trim();
        (num_part, 1024_u64 * 1024)
    } else if s_upper.ends_with("KB") || s_upper.ends_with("K") {
        let suffix_len = if s_upper.ends_with("KB") { 2 } else { 1 };
        let num_part = s[..s.len() - suffix_len].trim();
        (num_part, 1024_u64)
    } else {
        // No suffix, treat as bytes
        (s, 1_u64)
    };

    let num: u64 = num_str.parse().map_err(|_| SizeParseError::new(s))?;

    num.checked_mul(multiplier)
        .ok_or_else(|| SizeParseError::new(s))
}

/// Format a byte count as a human-readable string.
///
/// # Examples
///
/// ```
/// use cachewarden::size::format_size;
///
/// assert_eq!(format_size(1024), "1KB");
/// assert_eq!(format_size(2 * 1024 * 1024 * 1024), "2GB");
/// assert_eq!(format_size(500 * 1024 * 1024), "500MB");
/// ```
pub fn format_size(bytes: u64) -> String {
    const GB: u64 = 1024 * 1024 * 1024;
    const MB: u64 = 1024 * 1024;
    const KB: u64 = 1024;

    if bytes >= GB && bytes % GB == 0 {
        format!("{}GB", bytes / GB)
    } else if bytes >= MB && bytes % MB == 0 {
        format!("{}MB", bytes / MB)
    } else if bytes >= KB && bytes % KB == 0 {
        format!("{}KB", bytes / KB)
    } else {
        format!("{}", bytes)
    }
}

/// Format a byte count approximately, for status displays where exact
/// multiples are rare (e.g. "1.4GB").
pub fn format_size_approx(bytes: u64) -> String {
    const GB: f64 = (1024u64 * 1024 * 1024) as f64;
    const MB: f64 = (1024u64 * 1024) as f64;
    const KB: f64 = 1024.0;

    let bytes_f = bytes as f64;
    if bytes_f >= GB {
        format!("{:.1}GB", bytes_f / GB)
    } else if bytes_f >= MB {
        format!("{:.1}MB", bytes_f / MB)
    } else if bytes_f >= KB {
        format!("{:.1}KB", bytes_f / KB)
    } else {
        format!("{}B", bytes)
    }
}

/// A size value that can be parsed from and formatted to human-readable strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Size(pub u64);

impl Size {
    pub fn bytes(self) -> u64 {
        self.0
    }

    pub fn from_gb(gb: u64) -> Self {
        Self(gb * 1024 * 1024 * 1024)
    }

    pub fn from_mb(mb: u64) -> Self {
        Self(mb * 1024 * 1024)
    }
}

impl std::str::FromStr for Size {
    type Err = SizeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_size(s).map(Size)
    }
}

impl fmt::Display for Size {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", format_size(self.0))
    }
}
