//! Aggregate rating computation.
//!
//! A cafe's `avg_rating`/`review_count` pair is always re-derived from the
//! full set of its reviews rather than adjusted incrementally, so a missed
//! update can never cause drift.

/// Mean of the given ratings, rounded half-up to one decimal place.
///
/// Returns `0.0` for an empty slice (a cafe with no reviews).
pub fn average_rating(ratings: &[i32]) -> f64 {
    if ratings.is_empty() {
        return 0.0;
    }
    let sum: i32 = ratings.iter().sum();
    let mean = f64::from(sum) / ratings.len() as f64;
    (mean * 10.0).round() / 10.0
}
