use crate::Weight;

/// Smallest exponent a positive f64 can carry (the minimal subnormal `2^-1074`).
pub const MIN_EXPONENT: i32 = -1074;

/// Largest exponent a finite f64 can carry.
pub const MAX_EXPONENT: i32 = 1023;

const MANTISSA_BITS: u32 = 52;
const MANTISSA_MASK: u64 = (1u64 << MANTISSA_BITS) - 1;
const EXPONENT_BIAS: i32 = 1023;

/// Returns `floor(log2(weight))`, exact for every finite `weight > 0`.
///
/// Bucket boundaries must be exact: `f64::log2` can round `log2(2^i)` below
/// `i` and `floor` would then misplace a boundary weight. Reading the
/// IEEE-754 exponent field sidesteps rounding entirely; subnormals fall back
/// to the position of the highest mantissa bit.
///
/// # Example
/// ```
/// use rust_wss::dyadic::exponent;
///
/// assert_eq!(exponent(8.0), 3);
/// assert_eq!(exponent(7.99), 2);
/// assert_eq!(exponent(1e30), 99);
/// ```
///
/// # Panics
/// Panics if `weight` is not a positive finite number.
#[inline]
pub fn exponent(weight: Weight) -> i32 {
    assert!(
        weight > 0.0 && weight.is_finite(),
        "weight {} has no dyadic exponent",
        weight
    );

    let bits = weight.to_bits();
    let biased = ((bits >> MANTISSA_BITS) & 0x7ff) as i32;
    if biased == 0 {
        // subnormal: 2^-1074 scaled by the highest set mantissa bit
        let mantissa = bits & MANTISSA_MASK;
        MIN_EXPONENT + (63 - mantissa.leading_zeros() as i32)
    } else {
        biased - EXPONENT_BIAS
    }
}

/// Returns `weight / 2^exponent(weight)`, exact and always in `[1, 2)`.
///
/// This is the acceptance ratio against the bucket's upper bound without ever
/// materializing `2^(j+1)`, which overflows f64 for the topmost bucket.
#[inline]
pub fn normalized_fraction(weight: Weight) -> f64 {
    debug_assert!(weight > 0.0 && weight.is_finite());

    let bits = weight.to_bits();
    let biased = (bits >> MANTISSA_BITS) & 0x7ff;
    if biased == 0 {
        let mantissa = bits & MANTISSA_MASK;
        let top = 63 - mantissa.leading_zeros();
        // both sides below 2^53, so the division is exact
        mantissa as f64 / (1u64 << top) as f64
    } else {
        f64::from_bits((bits & MANTISSA_MASK) | ((EXPONENT_BIAS as u64) << MANTISSA_BITS))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn powers_of_two_land_on_their_own_exponent() {
        // the half-open bucket convention: 2^i belongs to bucket i, not i-1
        for i in -1022..=1023 {
            let w = f64::from_bits(((i + EXPONENT_BIAS) as u64) << MANTISSA_BITS);
            assert_eq!(exponent(w), i, "weight 2^{}", i);
            assert_eq!(normalized_fraction(w), 1.0, "weight 2^{}", i);
        }
    }

    #[test]
    fn just_below_a_boundary_stays_in_the_lower_bucket() {
        for i in [-500, -1, 0, 1, 4, 100, 1023] {
            let boundary = f64::from_bits(((i + EXPONENT_BIAS) as u64) << MANTISSA_BITS);
            let below = f64::from_bits(boundary.to_bits() - 1);
            assert_eq!(exponent(below), i - 1, "just below 2^{}", i);
        }
    }

    #[test]
    fn subnormals_resolve_to_their_true_magnitude() {
        assert_eq!(exponent(f64::from_bits(1)), MIN_EXPONENT);
        assert_eq!(exponent(f64::from_bits(2)), MIN_EXPONENT + 1);
        assert_eq!(exponent(f64::from_bits(3)), MIN_EXPONENT + 1);
        assert_eq!(exponent(f64::MIN_POSITIVE), -1022);

        let below_min_normal = f64::from_bits(f64::MIN_POSITIVE.to_bits() - 1);
        assert_eq!(exponent(below_min_normal), -1023);
        assert!((1.0..2.0).contains(&normalized_fraction(below_min_normal)));
    }

    #[test]
    fn fraction_reconstructs_the_weight() {
        for w in [1.0, 1.5, 3.0, 7.99, 1234.5678, 0.3, 1e-9, 6.25e12] {
            let rebuilt = normalized_fraction(w) * 2f64.powi(exponent(w));
            assert_eq!(rebuilt, w, "weight {}", w);
        }
    }

    #[test]
    fn fraction_is_always_in_the_unit_octave() {
        let mut w = 1e-300;
        while w < 1e300 {
            let m = normalized_fraction(w);
            assert!((1.0..2.0).contains(&m), "weight {} gave fraction {}", w, m);
            w *= 3.7;
        }
    }

    #[test]
    fn thirty_orders_of_magnitude_fit_in_about_a_hundred_buckets() {
        let spread = exponent(1e30) - exponent(1.0);
        assert_eq!(spread, 99);
    }

    #[test]
    #[should_panic(expected = "no dyadic exponent")]
    fn zero_weight_has_no_bucket() {
        exponent(0.0);
    }

    #[test]
    #[should_panic(expected = "no dyadic exponent")]
    fn infinite_weight_has_no_bucket() {
        exponent(f64::INFINITY);
    }
}
