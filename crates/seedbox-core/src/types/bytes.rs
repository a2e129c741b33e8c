//! Human-readable byte sizes.

const THRESHOLD: f64 = 1024.0;
const UNITS: [&str; 6] = ["KB", "MB", "GB", "TB", "PB", "EB"];

/// Format a byte count using 1024-based units.
///
/// Values below 1 KB are printed as-is (`"512 B"`), `KB` and `MB` have no
/// decimals and `GB` and above use two (`"1.50 GB"`).
pub fn format_bytes(bytes: u64) -> String {
    if (bytes as f64) < THRESHOLD {
        return format!("{bytes} B");
    }

    let mut value = bytes as f64;
    let mut unit = 0usize;
    value /= THRESHOLD;
    while value >= THRESHOLD && unit < UNITS.len() - 1 {
        value /= THRESHOLD;
        unit += 1;
    }

    let decimals = if unit < 2 { 0 } else { 2 };
    format!("{value:.decimals$} {}", UNITS[unit])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(0), "0 B");
        assert_eq!(format_bytes(1023), "1023 B");
        assert_eq!(format_bytes(2048), "2 KB");
        assert_eq!(format_bytes(3 * 1024 * 1024), "3 MB");
        assert_eq!(format_bytes(1536 * 1024 * 1024), "1.50 GB");
        assert_eq!(format_bytes(5 * 1024 * 1024 * 1024), "5.00 GB");
    }
}
