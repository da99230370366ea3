//! Time-of-day interval overlap.
//!
//! # Invariants
//! - Intervals are half-open `[start, end)`; touching boundaries do not
//!   overlap.
//! - Inputs are wall-clock times only, with `start < end` validated upstream.

use chrono::NaiveTime;

/// Returns whether `[start_a, end_a)` and `[start_b, end_b)` overlap.
pub fn overlaps(start_a: NaiveTime, end_a: NaiveTime, start_b: NaiveTime, end_b: NaiveTime) -> bool {
    start_a < end_b && end_a > start_b
}

#[cfg(test)]
mod tests {
    use super::overlaps;
    use chrono::NaiveTime;

    fn at(hour: u32, minute: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(hour, minute, 0).unwrap()
    }

    #[test]
    fn interval_overlaps_itself() {
        assert!(overlaps(at(9, 0), at(10, 0), at(9, 0), at(10, 0)));
    }

    #[test]
    fn touching_boundary_is_not_overlap() {
        assert!(!overlaps(at(9, 0), at(10, 0), at(10, 0), at(11, 0)));
        assert!(!overlaps(at(10, 0), at(11, 0), at(9, 0), at(10, 0)));
    }

    #[test]
    fn partial_and_nested_ranges_overlap() {
        assert!(overlaps(at(9, 0), at(10, 0), at(9, 30), at(10, 30)));
        assert!(overlaps(at(8, 0), at(12, 0), at(9, 0), at(10, 0)));
        assert!(!overlaps(at(7, 0), at(8, 0), at(13, 0), at(14, 0)));
    }
}
