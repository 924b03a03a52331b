//! Root finding for monotone CDFs on `(0, ∞)`.
//!
//! Concentrations span orders of magnitude, so we search in `ln x`: the bracket is
//! bisected geometrically, which gives uniform *relative* precision.

/// Maximum bisection steps (each halves the bracket width in log space).
const MAX_BISECT: usize = 200;

/// Relative width at which bisection stops.
const REL_TOL: f64 = 1e-12;

/// Maximum number of ×10 expansions when searching for a bracket.
const MAX_EXPAND: usize = 64;

/// Find `x` in `[lo, hi]` such that `cdf(x) = target`, assuming `cdf` is
/// non-decreasing and `cdf(lo) <= target <= cdf(hi)`.
///
/// Returns `None` for an invalid bracket.
pub fn solve_increasing_ln<F>(cdf: F, lo: f64, hi: f64, target: f64) -> Option<f64>
where
    F: Fn(f64) -> f64,
{
    if !(lo.is_finite() && hi.is_finite() && lo > 0.0 && hi >= lo && target.is_finite()) {
        return None;
    }
    if hi == lo {
        return Some(lo);
    }

    let mut a = lo.ln();
    let mut b = hi.ln();
    for _ in 0..MAX_BISECT {
        if b - a <= REL_TOL * (1.0 + a.abs().max(b.abs())) {
            break;
        }
        let mid = 0.5 * (a + b);
        let f = cdf(mid.exp());
        if !f.is_finite() {
            return None;
        }
        if f < target {
            a = mid;
        } else {
            b = mid;
        }
    }
    Some((0.5 * (a + b)).exp())
}

/// Expand `[guess, guess]` geometrically until it brackets `target`, then solve.
pub fn solve_from_guess_ln<F>(cdf: F, guess: f64, target: f64) -> Option<f64>
where
    F: Fn(f64) -> f64,
{
    if !(guess.is_finite() && guess > 0.0) {
        return None;
    }

    let mut lo = guess;
    let mut hi = guess;
    let mut n = 0;
    while cdf(lo) > target {
        lo /= 10.0;
        n += 1;
        if n > MAX_EXPAND || lo <= f64::MIN_POSITIVE {
            return None;
        }
    }
    n = 0;
    while cdf(hi) < target {
        hi *= 10.0;
        n += 1;
        if n > MAX_EXPAND || !hi.is_finite() {
            return None;
        }
    }

    solve_increasing_ln(cdf, lo, hi, target)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn solves_exponential_cdf() {
        // F(x) = 1 - exp(-x / 2); median = 2 ln 2.
        let cdf = |x: f64| -(-x / 2.0).exp_m1();
        let x = solve_increasing_ln(cdf, 0.01, 100.0, 0.5).unwrap();
        assert!((x - 2.0 * std::f64::consts::LN_2).abs() < 1e-10);
    }

    #[test]
    fn expands_bracket_from_poor_guess() {
        let cdf = |x: f64| x / (1.0 + x);
        let x = solve_from_guess_ln(cdf, 1e6, 0.05).unwrap();
        assert!((x - 0.05 / 0.95).abs() < 1e-12);
    }

    #[test]
    fn rejects_invalid_bracket() {
        assert!(solve_increasing_ln(|x| x, -1.0, 1.0, 0.5).is_none());
    }
}
