use std::time::Duration;

use jiff::Timestamp;

const MINUTE: u64 = 60;
const HOUR: u64 = 60 * MINUTE;
const DAY: u64 = 24 * HOUR;
const YEAR: u64 = 365 * DAY;

/// Raw age of a timestamp, kept parseable (`1d3h0m12s`) so it can be diffed
/// verbatim and humanized only when displayed.
pub fn raw_age(ts: &Timestamp) -> String {
    let secs = (Timestamp::now().as_second() - ts.as_second()).max(0) as u64;
    raw_duration(Duration::from_secs(secs))
}

pub fn raw_duration(d: Duration) -> String {
    let total = d.as_secs();
    let days = total / DAY;
    let hours = (total % DAY) / HOUR;
    let mins = (total % HOUR) / MINUTE;
    let secs = total % MINUTE;

    if days > 0 {
        format!("{days}d{hours}h{mins}m{secs}s")
    } else if hours > 0 {
        format!("{hours}h{mins}m{secs}s")
    } else if mins > 0 {
        format!("{mins}m{secs}s")
    } else {
        format!("{secs}s")
    }
}

/// Short human form of a duration, e.g. `3h25m`, `12d`, `1y20d`.
pub fn human_duration(d: Duration) -> String {
    let total = d.as_secs();
    let days = total / DAY;
    let hours = (total % DAY) / HOUR;
    let mins = (total % HOUR) / MINUTE;
    let secs = total % MINUTE;

    if days > 365 {
        format!("{}y{}d", days / 365, days % 365)
    } else if days > 7 {
        format!("{days}d")
    } else if days > 0 {
        format!("{days}d{hours}h")
    } else if hours > 0 {
        format!("{hours}h{mins}m")
    } else if mins > 0 {
        format!("{mins}m{secs}s")
    } else {
        format!("{secs}s")
    }
}

/// Humanizes a raw age field; anything unparseable is shown as is.
pub fn human_age(raw: &str) -> String {
    parse_age(raw)
        .map(human_duration)
        .unwrap_or_else(|| raw.to_string())
}

/// Parses `1y2d3h4m5s`, `250ms` and any ordered subset of those units.
pub fn parse_age(s: &str) -> Option<Duration> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    let mut total_ms: u64 = 0;
    let mut rest = s;
    while !rest.is_empty() {
        let digits = rest.find(|c: char| !c.is_ascii_digit()).unwrap_or(rest.len());
        if digits == 0 {
            return None;
        }
        let n: u64 = rest[..digits].parse().ok()?;
        rest = &rest[digits..];

        let (unit_ms, len) = if rest.starts_with("ms") {
            (1, 2)
        } else {
            let secs = match rest.chars().next()? {
                'y' => YEAR,
                'd' => DAY,
                'h' => HOUR,
                'm' => MINUTE,
                's' => 1,
                _ => return None,
            };
            (secs * 1000, 1)
        };
        total_ms = total_ms.checked_add(n.checked_mul(unit_ms)?)?;
        rest = &rest[len..];
    }
    Some(Duration::from_millis(total_ms))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_duration() {
        assert_eq!(raw_duration(Duration::from_secs(5)), "5s");
        assert_eq!(raw_duration(Duration::from_secs(3 * 3600 + 25 * 60 + 7)), "3h25m7s");
        assert_eq!(raw_duration(Duration::from_secs(86400 + 12)), "1d0h0m12s");
    }

    #[test]
    fn test_parse_age_round_trips_raw_form() {
        let d = Duration::from_secs(2 * 86400 + 3 * 3600 + 4 * 60 + 5);
        assert_eq!(parse_age(&raw_duration(d)), Some(d));
    }

    #[test]
    fn test_parse_age_human_forms() {
        assert_eq!(parse_age("1y20d"), Some(Duration::from_secs(385 * 86400)));
        assert_eq!(parse_age("250ms"), Some(Duration::from_millis(250)));
        assert_eq!(parse_age("3h25m"), Some(Duration::from_secs(3 * 3600 + 25 * 60)));
        assert_eq!(parse_age("n/a"), None);
        assert_eq!(parse_age("12"), None);
        assert_eq!(parse_age(""), None);
    }

    #[test]
    fn test_parse_age_large_counts() {
        assert_eq!(parse_age("5000000000s"), Some(Duration::from_secs(5_000_000_000)));
        assert_eq!(parse_age("18446744073709551615y"), None);
        assert_eq!(parse_age("18446744073709551s1s"), None);
    }

    #[test]
    fn test_human_age() {
        assert_eq!(human_age("3h25m7s"), "3h25m");
        assert_eq!(human_age("12d1h0m0s"), "12d");
        assert_eq!(human_age("<unknown>"), "<unknown>");
    }
}
