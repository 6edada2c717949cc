//! Small numeric helpers shared by the channels that work in log-odds / probability space.

/// `log(p / (1 - p))`. `p` is assumed already clamped to `(0, 1)` by the caller.
pub fn log_odds(p: f64) -> f64 {
    (p / (1.0 - p)).ln()
}

/// Inverse of [`log_odds`]: recovers a probability from a log-odds value.
pub fn probability(log_odds: f64) -> f64 {
    1.0 - 1.0 / (1.0 + log_odds.exp())
}

/// Linear interpolation from `a` (`t=0`) to `b` (`t=1`).
pub fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

/// The operand with the smallest absolute value, ties favoring `a`.
pub fn smallest_magnitude(a: f64, b: f64) -> f64 {
    if b.abs() < a.abs() {
        b
    } else {
        a
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn log_odds_and_probability_round_trip() {
        let p = 0.73;
        assert_relative_eq!(probability(log_odds(p)), p, epsilon = 1e-9);
    }

    #[test]
    fn lerp_interpolates_linearly() {
        assert_relative_eq!(lerp(0.0, 10.0, 0.25), 2.5);
    }

    #[test]
    fn smallest_magnitude_picks_closer_to_zero() {
        assert_eq!(smallest_magnitude(0.3, -0.1), -0.1);
        assert_eq!(smallest_magnitude(-0.2, 0.5), -0.2);
    }
}
