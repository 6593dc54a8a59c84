//! Unit inference and display formatting for stat keys
//!
//! Pure lookup rules shared by every normalizer. Unit detection is
//! string-pattern driven: clock keys are tested before percent-like keys
//! so `cpu|speed_mhz` never classifies as a percentage.

/// Infer the physical unit for a stat or property key
///
/// Returns an empty string when no rule matches.
pub fn detect_unit(key: &str) -> &'static str {
    let key = key.to_ascii_lowercase();

    // Clock keys win over the generic usage/percent rule
    if key.contains("cpu") && (key.contains("hz") || key.contains("speed") || key.contains("clock"))
    {
        if key.contains("ghz") {
            return "GHz";
        }
        return "MHz";
    }

    if key.contains("usage") || key.contains("percent") || key.contains("utilization") {
        return "%";
    }

    if key.contains("diskspace") {
        return "GB";
    }

    if key.contains("mem") {
        if key.contains("gb") {
            return "GB";
        }
        return "MB";
    }

    ""
}

/// Format a raw sample value for display
///
/// Disk-space used/provisioned values arrive in KB and scale to GB;
/// consumed-memory values arrive in KB and scale to MB. Anything missing
/// or non-finite renders as "N/A".
pub fn format_value(value: Option<f64>, key: &str) -> String {
    let Some(value) = value else {
        return "N/A".to_string();
    };
    if !value.is_finite() {
        return "N/A".to_string();
    }

    let lowered = key.to_ascii_lowercase();
    let scaled = if lowered.contains("diskspace")
        && (lowered.contains("used") || lowered.contains("provisioned"))
    {
        // KB -> GB
        value / (1024.0 * 1024.0)
    } else if lowered.contains("mem") && lowered.contains("consumed") {
        // KB -> MB
        value / 1024.0
    } else {
        value
    };

    let unit = detect_unit(key);
    if unit.is_empty() {
        format!("{:.2}", scaled)
    } else {
        format!("{:.2} {}", scaled, unit)
    }
}
