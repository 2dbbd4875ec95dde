//! Lower-bound Wilson scoring of star-rating histograms.

/// Default statistical power used by [`wilson_rating`].
pub const DEFAULT_POWER: f64 = 0.2;

const PNORMAL_COEFFICIENTS: [f64; 11] = [
    1.570796288,
    0.03706987906,
    -0.8364353589e-3,
    -0.2250947176e-3,
    0.6841218299e-5,
    0.5824238515e-5,
    -0.104527497e-5,
    0.8360937017e-7,
    -0.3231081277e-8,
    0.3657763036e-10,
    0.6936233982e-12,
];

/// Approximate inverse of the standard normal CDF.
///
/// Returns 0 outside `0.0..=1.0` and at the median.
pub fn pnormaldist(qn: f64) -> f64 {
    if !(0.0..=1.0).contains(&qn) || qn == 0.5 {
        return 0.0;
    }

    let w1 = qn.min(1.0 - qn);
    let w3 = -(4.0 * w1 * (1.0 - w1)).ln();
    let mut sum = PNORMAL_COEFFICIENTS[0];
    let mut power = 1.0;
    for b in &PNORMAL_COEFFICIENTS[1..] {
        power *= w3;
        sum += b * power;
    }

    let z = (sum * w3).sqrt();
    if qn > 0.5 { z } else { -z }
}

/// Lower bound of the Wilson score interval for `value` positives out of `n`.
pub fn wilson_score(value: f64, n: f64, power: f64) -> f64 {
    if value == 0.0 {
        return 0.0;
    }

    let z = pnormaldist(1.0 - power / 2.0);
    let phat = value / n;
    (phat + z * z / (2.0 * n) - z * ((phat * (1.0 - phat) + z * z / (4.0 * n)) / n).sqrt())
        / (1.0 + z * z / n)
}

/// Blend the per-star Wilson scores into a single 0..=100 rating.
///
/// Index 0 of `star_counts` (ratings without stars) is ignored. Returns
/// `None` when no star was given at all.
pub fn wilson_rating(star_counts: &[u32; 6]) -> Option<u8> {
    let total: u64 = star_counts[1..].iter().map(|&n| u64::from(n)).sum();
    if total == 0 {
        return None;
    }

    let n = total as f64;
    let w = |stars: usize| wilson_score(f64::from(star_counts[stars]), n, DEFAULT_POWER);
    let blended = (-2.0 * w(1) - w(2) + w(4) + 2.0 * w(5) + 3.0) * 20.0;

    Some(blended.ceil().clamp(0.0, 100.0) as u8)
}
