/// Weighted random choice among eligible candidates.

use rand::Rng;

/// Pick one candidate with probability `weight / total_weight`.
///
/// Draws a value in `[0, total)` and walks the list in order, subtracting
/// each weight until the remainder drops to zero or below. Returns `None`
/// for an empty list. If the weights don't sum to a positive number the
/// first candidate is returned.
pub fn select<'a, T, R: Rng>(candidates: &'a [(T, f64)], rng: &mut R) -> Option<&'a T> {
    let (first, _) = candidates.first()?;

    let total: f64 = candidates.iter().map(|(_, w)| *w).sum();
    if !(total > 0.0) || !total.is_finite() {
        return Some(first);
    }

    let mut remainder = rng.gen_range(0.0..total);
    for (candidate, weight) in candidates {
        remainder -= weight;
        if remainder <= 0.0 {
            return Some(candidate);
        }
    }

    // Float rounding can leave a sliver of remainder after the last weight.
    candidates.last().map(|(c, _)| c)
}
