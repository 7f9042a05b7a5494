// src/utils/format.rs
//! Human-readable rendering of rates, counts and durations for log output

use std::time::Duration;

/// Scales `value` with an SI prefix (k, M, G, T) and appends `unit`
///
/// Values below one thousand and in the kilo range are rounded to whole
/// numbers; larger ranges keep `precision` decimals.
pub fn format_si(value: f64, unit: &str, precision: usize) -> String {
    const SCALES: [(f64, &str); 3] = [(1e12, "T"), (1e9, "G"), (1e6, "M")];

    for (scale, prefix) in SCALES {
        if value >= scale {
            return format!("{:.*} {}{}", precision, value / scale, prefix, unit);
        }
    }
    if value >= 1e3 {
        format!("{:.0} k{}", value / 1e3, unit)
    } else {
        format!("{:.0} {}", value, unit)
    }
}

/// Formats a hashrate, e.g. `12 kH/s` or `1.50 MH/s`
pub fn format_hashrate(hashrate: f64) -> String {
    format_si(hashrate, "H/s", 2)
}

/// Formats mining uptime as seconds, minutes or hours
pub fn format_uptime(uptime: Duration) -> String {
    let secs = uptime.as_secs();
    if secs < 60 {
        format!("{} seconds", secs)
    } else if secs < 120 {
        "1 minute".to_string()
    } else if secs < 3600 {
        format!("{} minutes", secs / 60)
    } else if secs < 7200 {
        "1 hour".to_string()
    } else {
        format!("{} hours", secs / 3600)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hashrate_prefixes() {
        assert_eq!(format_hashrate(0.0), "0 H/s");
        assert_eq!(format_hashrate(999.4), "999 H/s");
        assert_eq!(format_hashrate(12_345.0), "12 kH/s");
        assert_eq!(format_hashrate(1_500_000.0), "1.50 MH/s");
        assert_eq!(format_hashrate(2_000_000_000.0), "2.00 GH/s");
        assert_eq!(format_si(3e12, "H/s", 1), "3.0 TH/s");
    }

    #[test]
    fn uptime_units() {
        assert_eq!(format_uptime(Duration::from_secs(59)), "59 seconds");
        assert_eq!(format_uptime(Duration::from_secs(90)), "1 minute");
        assert_eq!(format_uptime(Duration::from_secs(600)), "10 minutes");
        assert_eq!(format_uptime(Duration::from_secs(3_700)), "1 hour");
        assert_eq!(format_uptime(Duration::from_secs(36_000)), "10 hours");
    }
}
