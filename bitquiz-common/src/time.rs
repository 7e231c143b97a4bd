//! Timestamp utilities

use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicI64, Ordering};

static LAST_STAMP: AtomicI64 = AtomicI64::new(0);

/// Get current UTC timestamp
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// High-resolution stamp for naming sessions
///
/// Microseconds since the Unix epoch, strictly increasing within the process
/// even when two calls land in the same microsecond.
pub fn session_stamp() -> i64 {
    let wall = Utc::now().timestamp_micros();
    let mut last = LAST_STAMP.load(Ordering::Relaxed);
    loop {
        let next = wall.max(last + 1);
        match LAST_STAMP.compare_exchange_weak(last, next, Ordering::AcqRel, Ordering::Relaxed) {
            Ok(_) => return next,
            Err(current) => last = current,
        }
    }
}

/// Format a playback position as `M:SS`
///
/// Negative and non-finite inputs render as `0:00`. Fractions are truncated,
/// so a position of 119.9s still reads `1:59`.
///
/// ```
/// use bitquiz_common::time::format_clock;
///
/// assert_eq!(format_clock(0.0), "0:00");
/// assert_eq!(format_clock(42.7), "0:42");
/// assert_eq!(format_clock(120.0), "2:00");
/// ```
pub fn format_clock(seconds: f64) -> String {
    let total = if seconds.is_finite() && seconds > 0.0 {
        seconds.floor() as u64
    } else {
        0
    };
    format!("{}:{:02}", total / 60, total % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_now_returns_valid_timestamp() {
        let timestamp = now();
        // Should be a reasonable timestamp (after year 2000)
        assert!(timestamp.timestamp() > 946_684_800);
    }

    #[test]
    fn test_session_stamp_strictly_increasing() {
        let mut previous = session_stamp();
        for _ in 0..1000 {
            let next = session_stamp();
            assert!(next > previous, "{} should be after {}", next, previous);
            previous = next;
        }
    }

    #[test]
    fn test_session_stamp_unique_across_threads() {
        let handles: Vec<_> = (0..4)
            .map(|_| std::thread::spawn(|| (0..250).map(|_| session_stamp()).collect::<Vec<_>>()))
            .collect();

        let mut all: Vec<i64> = handles
            .into_iter()
            .flat_map(|h| h.join().unwrap())
            .collect();
        let count = all.len();
        all.sort_unstable();
        all.dedup();
        assert_eq!(all.len(), count);
    }

    #[test]
    fn test_format_clock() {
        assert_eq!(format_clock(5.0), "0:05");
        assert_eq!(format_clock(59.99), "0:59");
        assert_eq!(format_clock(61.0), "1:01");
        assert_eq!(format_clock(3600.0), "60:00");
    }

    #[test]
    fn test_format_clock_degenerate_inputs() {
        assert_eq!(format_clock(-3.0), "0:00");
        assert_eq!(format_clock(f64::NAN), "0:00");
        assert_eq!(format_clock(f64::INFINITY), "0:00");
    }
}
