use super::math::Float;
use super::rng::ONE_MINUS_EPSILON;

/// The prime bases backing the low-discrepancy dimensions used here.
const PRIMES: [u64; 8] = [2, 3, 5, 7, 11, 13, 17, 19];

/// Compute the radical inverse of the given sample index in the prime base
/// selected by `base_index`. The digit reversal is deterministic, so a
/// sample's value depends only on its index, never on evaluation order.
pub fn radical_inverse(base_index: usize, a: u64) -> Float {
    let base = PRIMES[base_index];
    let inv_base = 1.0 / base as f64;
    let mut reversed_digits: u64 = 0;
    let mut inv_base_n: f64 = 1.0;
    let mut a = a;
    while a != 0 {
        let next = a / base;
        let digit = a - next * base;
        reversed_digits = reversed_digits * base + digit;
        inv_base_n *= inv_base;
        a = next;
    }
    ((reversed_digits as f64 * inv_base_n) as Float).min(ONE_MINUS_EPSILON)
}
