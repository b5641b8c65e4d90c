//! User-visible formatting of times and values

/// Whole minutes as `"{m}m"`, otherwise `"{m}:{ss}"` with two-digit seconds.
///
/// Fractional input is rounded to the nearest second first.
pub fn format_time(seconds: f64) -> String {
    let total = seconds.round() as i64;
    let minutes = total.div_euclid(60);
    let secs = total.rem_euclid(60);

    if secs == 0 {
        format!("{}m", minutes)
    } else {
        format!("{}:{:02}", minutes, secs)
    }
}

/// Compact axis label: one decimal with `M` or `k`, the rounded integer below 1000.
pub fn format_value(value: f64) -> String {
    if value >= 1_000_000.0 {
        format!("{:.1}M", round_to_tenth(value / 1_000_000.0))
    } else if value >= 1_000.0 {
        format!("{:.1}k", round_to_tenth(value / 1_000.0))
    } else {
        round_for_display(value).to_string()
    }
}

/// `f64::round` rounds half away from zero, unlike the banker's rounding
/// `{:.1}` would apply on its own.
fn round_to_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Tooltip rows show integers
pub fn round_for_display(value: f64) -> i64 {
    value.round() as i64
}
