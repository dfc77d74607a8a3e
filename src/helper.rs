use chrono::{DateTime, Local, Timelike, Utc};

/// Current time truncated to whole milliseconds, the precision notes are
/// stored with.
pub fn now_millis() -> DateTime<Utc> {
    let now = Utc::now();
    let nanos = now.nanosecond();
    now.with_nanosecond(nanos - nanos % 1_000_000).unwrap_or(now)
}

/// Short local rendering of a timestamp for list and detail views, e.g.
/// `Mar 01, 02:30 PM`.
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.with_timezone(&Local).format("%b %d, %I:%M %p").to_string()
}

/// First non-empty line of `content`, cut to `max_chars` characters.
pub fn content_preview(content: &str, max_chars: usize) -> String {
    let first_line = content
        .lines()
        .find(|line| !line.trim().is_empty())
        .unwrap_or("");

    if first_line.chars().count() <= max_chars {
        first_line.to_string()
    } else {
        let cut: String = first_line.chars().take(max_chars).collect();
        format!("{}...", cut)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_now_millis_has_no_sub_millisecond_part() {
        assert_eq!(now_millis().nanosecond() % 1_000_000, 0);
    }

    #[test]
    fn test_content_preview() {
        assert_eq!(content_preview("\n\n  first\nsecond", 20), "  first");
        assert_eq!(content_preview("", 20), "");
        assert_eq!(content_preview("héllo wörld", 5), "héllo...");
    }
}
