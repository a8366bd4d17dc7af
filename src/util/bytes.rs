//! Human-readable byte counts for media listings.

/// Format a byte count as `Bytes`, `KB`, `MB` or `GB` (base 1024), with up to
/// two decimals and trailing zeros trimmed.
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];

    let mut value = bytes as f64;
    let mut unit_index = 0;

    while value >= 1024.0 && unit_index < UNITS.len() - 1 {
        value /= 1024.0;
        unit_index += 1;
    }

    if unit_index == 0 {
        return format!("{bytes} {}", UNITS[unit_index]);
    }

    let mut value_str = format!("{value:.2}");
    while value_str.ends_with('0') {
        value_str.pop();
    }
    if value_str.ends_with('.') {
        value_str.pop();
    }

    format!("{value_str} {}", UNITS[unit_index])
}
