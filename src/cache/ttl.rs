//! TTL strings: `15m`, `1h`, `2d`, `30s`. A bare number means minutes.

use std::time::Duration;

/// Fifteen minutes.
pub const DEFAULT_TTL: Duration = Duration::from_secs(900);

pub fn parse_ttl(input: &str) -> Result<Duration, String> {
    let trimmed = input.trim().to_ascii_lowercase();
    if trimmed.is_empty() {
        return Err("empty TTL".to_string());
    }
    let (digits, unit) = match trimmed.char_indices().find(|(_, c)| !c.is_ascii_digit()) {
        Some((idx, _)) => trimmed.split_at(idx),
        None => (trimmed.as_str(), "m"),
    };
    let value: u64 = digits
        .parse()
        .map_err(|_| format!("invalid TTL '{}': expected e.g. 15m, 1h, 2d", input))?;
    let seconds = match unit {
        "s" => value,
        "m" => value * 60,
        "h" => value * 3600,
        "d" => value * 86_400,
        other => return Err(format!("invalid TTL unit '{}' in '{}'", other, input)),
    };
    if seconds == 0 {
        return Err("TTL must be greater than zero".to_string());
    }
    Ok(Duration::from_secs(seconds))
}

/// Largest whole unit that divides the duration evenly.
pub fn format_ttl(ttl: Duration) -> String {
    let secs = ttl.as_secs();
    if secs == 0 {
        return "0s".to_string();
    }
    if secs % 86_400 == 0 {
        format!("{}d", secs / 86_400)
    } else if secs % 3600 == 0 {
        format!("{}h", secs / 3600)
    } else if secs % 60 == 0 {
        format!("{}m", secs / 60)
    } else {
        format!("{}s", secs)
    }
}
