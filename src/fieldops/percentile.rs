use std::cmp::Ordering;

/// Linear-interpolated percentile of a sample buffer.
///
/// Rank is `p / 100 * (n - 1)`, interpolated between the two surrounding
/// order statistics. The buffer is reordered in place; partial selection
/// keeps this O(n) instead of a full sort.
pub fn percentile(values: &mut [f32], p: f32) -> f32 {
    if values.is_empty() {
        return 0.0;
    }
    let n = values.len();
    if n == 1 {
        return values[0];
    }

    let rank = (p / 100.0).clamp(0.0, 1.0) * (n - 1) as f32;
    let lo = rank.floor() as usize;
    let frac = rank - lo as f32;

    values.select_nth_unstable_by(lo, cmp_f32);
    let lo_value = values[lo];

    if frac == 0.0 {
        return lo_value;
    }

    // The next order statistic is the minimum of the upper partition.
    let hi_value = values[lo + 1..]
        .iter()
        .copied()
        .fold(f32::INFINITY, f32::min);

    lo_value + (hi_value - lo_value) * frac
}

fn cmp_f32(a: &f32, b: &f32) -> Ordering {
    a.partial_cmp(b).unwrap_or(Ordering::Equal)
}
