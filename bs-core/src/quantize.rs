/// Round a non-negative duration to the nearest power of two.
///
/// Zero (and anything non-positive or non-finite) maps to zero.  Values below one round to
/// fractional powers, e.g. `0.3 -> 0.25`.  When `n` sits exactly halfway between two powers the
/// upper one wins, so `6 -> 8`.
pub fn nearest_power_of_two(n: f64) -> f64 {
    if !n.is_finite() || n <= 0.0 {
        return 0.0;
    }

    let exp = n.log2();
    let lower = exp.floor().exp2();
    let upper = exp.ceil().exp2();

    if (n - lower).abs() < (upper - n).abs() {
        lower
    } else {
        upper
    }
}
