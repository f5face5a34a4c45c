//! ISO-8601 video durations (`PT1H2M3S`) and their display form.

use once_cell::sync::OnceCell;
use regex::Regex;

/// Records at or below this length count as short-form content.
pub const SHORT_FORM_MAX_SECS: f64 = 60.0;

/// Parse `PT#H#M#S` into seconds. Anything unparseable is 0.
pub fn parse_iso8601_duration(s: &str) -> u64 {
    static RE: OnceCell<Regex> = OnceCell::new();
    let re = RE.get_or_init(|| {
        Regex::new(r"^P(?:(\d+)D)?T?(?:(\d+)H)?(?:(\d+)M)?(?:(\d+)S)?$").expect("duration regex")
    });
    let Some(caps) = re.captures(s.trim()) else {
        return 0;
    };
    let part = |i: usize| -> u64 {
        caps.get(i)
            .and_then(|m| m.as_str().parse::<u64>().ok())
            .unwrap_or(0)
    };
    part(1)
        .saturating_mul(86_400)
        .saturating_add(part(2).saturating_mul(3_600))
        .saturating_add(part(3).saturating_mul(60))
        .saturating_add(part(4))
}

/// `45s`, `4:05`, `1:02:03`.
pub fn format_duration(seconds: u64) -> String {
    if seconds < 60 {
        return format!("{seconds}s");
    }
    let hours = seconds / 3_600;
    let minutes = (seconds % 3_600) / 60;
    let secs = seconds % 60;
    if hours > 0 {
        format!("{hours}:{minutes:02}:{secs:02}")
    } else {
        format!("{minutes}:{secs:02}")
    }
}

/// Unknown (zero) durations are not short-form.
pub fn is_short_form(duration_seconds: f64) -> bool {
    duration_seconds > 0.0 && duration_seconds <= SHORT_FORM_MAX_SECS
}
