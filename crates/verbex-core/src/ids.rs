//! k-sortable opaque identifiers and timestamp formatting.
//!
//! Every row in every table is keyed by a 26-character Crockford-base32
//! ULID. The engine never inspects the bits beyond lexicographic
//! (case-insensitive) comparison.

use std::sync::{Mutex, OnceLock};

use chrono::{DateTime, Utc};
use ulid::{Generator, Ulid};

/// A plain `Ulid::new()` is only time-ordered to millisecond resolution: two
/// ids minted in the same millisecond have an independent random payload and
/// aren't guaranteed to compare correctly. `ulid::Generator` instead bumps
/// the random component on repeat calls within the same millisecond, so ids
/// it produces are strictly monotonic non-decreasing regardless of call
/// rate. One generator is shared process-wide behind a mutex.
static GENERATOR: OnceLock<Mutex<Generator>> = OnceLock::new();

/// Generate a new k-sortable identifier, monotonic over insertion order
/// within this process.
pub fn new_id() -> String {
    let mutex = GENERATOR.get_or_init(|| Mutex::new(Generator::new()));
    let mut generator = mutex.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
    let ulid: Ulid = generator.generate().expect("ulid generator exhausted its per-millisecond sequence");
    ulid.to_string()
}

/// Render a timestamp as the ISO-8601 UTC, nanosecond-precision string this
/// engine stores and compares lexicographically.
pub fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.format("%Y-%m-%dT%H:%M:%S%.9fZ").to_string()
}

/// The current instant, formatted as above.
pub fn now() -> String {
    format_timestamp(Utc::now())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_26_chars_and_unique() {
        let a = new_id();
        let b = new_id();
        assert_eq!(a.len(), 26);
        assert_eq!(b.len(), 26);
        assert_ne!(a, b);
    }

    #[test]
    fn ids_are_monotonic_non_decreasing() {
        let mut prev = new_id();
        for _ in 0..50 {
            let next = new_id();
            assert!(next.to_lowercase() >= prev.to_lowercase());
            prev = next;
        }
    }

    #[test]
    fn timestamp_format_is_lexicographically_ordered() {
        let a = format_timestamp(Utc::now());
        std::thread::sleep(std::time::Duration::from_millis(2));
        let b = format_timestamp(Utc::now());
        assert!(b > a);
        assert!(a.ends_with('Z'));
    }
}
