//! Fixed-point natural logarithm and exponential over the WAD scale.
//!
//! [Decimal256](cosmwasm_std::Decimal256) already is the WAD representation
//! (atomics scale `10^18`), and its checked `mul`/`div` are the WAD product
//! and quotient (full-width intermediate, truncated). This module adds the
//! two transcendental functions the pricing engine needs, built purely from
//! checked [Decimal256]/[Number] arithmetic.
//!
//! Both functions use range reduction to a small argument followed by a
//! truncated series:
//!
//! * `ln x = ln m + k·ln 2` with `x = m·2^k`, `m ∈ [1, 2)`, and
//!   `ln m = 2·atanh t` for `t = (m−1)/(m+1) ∈ [0, 1/3)`, summing the odd
//!   series `t + t³/3 + … + t³⁹/39`. The first neglected term is below
//!   `3⁻⁴¹/41 ≈ 3·10⁻²¹`, well under one atomic.
//!
//! * `exp x = 2^k·exp r` with `k = round(x/ln 2)` and `|r| ≤ ln2/2`, summing
//!   the Taylor series `Σ rⁿ/n!` through `n = 16`. The first neglected term
//!   is below `(ln2/2)¹⁷/17! ≈ 4·10⁻²³`.
//!
//! The normalization shift is applied as a single multiplication or division
//! by `2^k`, so truncation contributes at most one atomic before the series.

use crate::error::{ErrorDomain, ErrorId};
use crate::number::Number;
use crate::{opt_anyhow, opt_bail, opt_ensure};
use anyhow::Result;
use cosmwasm_std::{Decimal256, Uint128, Uint256};

/// `ln 2` at WAD precision.
const LN2: Decimal256 = Decimal256::raw(693_147_180_559_945_309);

/// Largest input to [exp] whose result is representable.
const EXP_INPUT_MAX: Decimal256 = Decimal256::raw(135_305_999_368_893_231_589);

/// Inputs below `-42` underflow to zero (`e^-42 < 10^-18`).
const EXP_INPUT_MIN_ABS: Decimal256 = Decimal256::raw(42_000_000_000_000_000_000);

/// Number of series terms beyond the first for `atanh`, covering odd powers
/// through `t^39`.
const ATANH_TERMS: u64 = 19;

/// Number of Taylor terms beyond the constant one for `exp`.
const EXP_TERMS: u64 = 16;

/// Natural logarithm of a WAD value.
///
/// Fails with `LnUndefined` on zero input. Deterministic and monotonic over
/// the whole [Decimal256] range.
pub fn ln(x: Decimal256) -> Result<Number> {
    if x.is_zero() {
        opt_bail!(
            ErrorId::LnUndefined,
            ErrorDomain::Math,
            "ln is undefined for non-positive input"
        );
    }

    let one = Decimal256::one().atomics();
    let two = Uint256::from_u128(2);
    let double = one.checked_mul(two)?;
    let a = x.atomics();

    // find k with a / 2^k in [1e18, 2e18)
    let mut k: i64 = 0;
    let mut tmp = a;
    while tmp >= double {
        tmp = tmp.checked_div(two)?;
        k += 1;
    }
    while tmp < one {
        tmp = tmp.checked_mul(two)?;
        k -= 1;
    }
    let m = if k >= 0 {
        a.checked_div(pow2(k.unsigned_abs())?)?
    } else {
        a.checked_mul(pow2(k.unsigned_abs())?)?
    };
    let m = Decimal256::new(m);

    // ln m = 2 atanh t, t = (m - 1) / (m + 1)
    let t = m
        .checked_sub(Decimal256::one())?
        .checked_div(m.checked_add(Decimal256::one())?)?;
    let t2 = t.checked_mul(t)?;

    let mut term = t;
    let mut sum = t;
    for n in 1..=ATANH_TERMS {
        term = term.checked_mul(t2)?;
        let divisor = Decimal256::from_ratio(2 * n + 1, 1u64);
        sum = sum.checked_add(term.checked_div(divisor)?)?;
    }
    let ln_m = Number::new_positive(sum.checked_mul(Decimal256::from_ratio(2u64, 1u64))?);

    ln_m.checked_add(ln2_times(k)?)
}

/// Exponential of a signed WAD value.
///
/// Returns zero on deep underflow (inputs below `-42`), fails with
/// `ExpOverflow` when the result would exceed the representable range.
pub fn exp(x: Number) -> Result<Decimal256> {
    if x < Number::new_negative(EXP_INPUT_MIN_ABS) {
        return Ok(Decimal256::zero());
    }
    opt_ensure!(
        x <= Number::new_positive(EXP_INPUT_MAX),
        ErrorId::ExpOverflow,
        ErrorDomain::Math,
        "exp overflows for input {}",
        x
    );

    // k = round(x / ln 2), r = x - k ln 2
    let k = round_to_int(x.checked_div(Number::new_positive(LN2))?)?;
    let r = x.checked_sub(ln2_times(k)?)?;

    let mut term = Number::ONE;
    let mut sum = Number::ONE;
    for n in 1..=EXP_TERMS {
        term = term.checked_mul(r)?.checked_div(Number::from(n))?;
        sum = sum.checked_add(term)?;
    }
    let small = sum.try_into_non_negative_value().ok_or_else(|| {
        opt_anyhow!(
            ErrorId::Conversion,
            ErrorDomain::Math,
            "exp series produced a negative value for {}",
            x
        )
    })?;

    let scaled = if k >= 0 {
        small
            .atomics()
            .checked_mul(pow2(k.unsigned_abs())?)
            .map_err(|_| {
                opt_anyhow!(
                    ErrorId::ExpOverflow,
                    ErrorDomain::Math,
                    "exp overflows for input {}",
                    x
                )
            })?
    } else {
        small.atomics().checked_div(pow2(k.unsigned_abs())?)?
    };
    Ok(Decimal256::new(scaled))
}

/// `k · ln 2` as a signed value.
fn ln2_times(k: i64) -> Result<Number> {
    let magnitude = LN2.checked_mul(Decimal256::from_ratio(k.unsigned_abs(), 1u64))?;
    Ok(if k >= 0 {
        Number::new_positive(magnitude)
    } else {
        Number::new_negative(magnitude)
    })
}

/// `2^e` as a raw integer.
fn pow2(e: u64) -> Result<Uint256> {
    opt_ensure!(
        e <= 255,
        ErrorId::Conversion,
        ErrorDomain::Math,
        "pow2 exponent {} out of range",
        e
    );
    let two = Uint256::from_u128(2);
    let mut result = Uint256::one();
    for _ in 0..e {
        result = result.checked_mul(two)?;
    }
    Ok(result)
}

/// Round a signed value to the nearest integer (half away from negative
/// infinity is irrelevant here since inputs never land on exact halves).
fn round_to_int(n: Number) -> Result<i64> {
    let half = Number::new_positive(Decimal256::from_ratio(1u64, 2u64));
    let shifted = n.checked_add(half)?;
    let one = Decimal256::one().atomics();
    let atoms = shifted.abs_unsigned().atomics();
    let whole = atoms.checked_div(one)?;
    let magnitude = if shifted.is_negative() && !atoms.checked_rem(one)?.is_zero() {
        whole.checked_add(Uint256::one())?
    } else {
        whole
    };
    let magnitude = u64::try_from(Uint128::try_from(magnitude)?.u128())?;
    let magnitude = i64::try_from(magnitude)?;
    Ok(if shifted.is_negative() {
        -magnitude
    } else {
        magnitude
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::error_id_of;
    use proptest::prelude::*;
    use std::str::FromStr;

    fn assert_close(actual: Number, expected: f64, rel_tol: f64) {
        let actual: f64 = actual.to_string().parse().unwrap();
        let diff = (actual - expected).abs();
        assert!(
            diff <= expected.abs() * rel_tol + 1e-12,
            "actual {actual} vs expected {expected}"
        );
    }

    #[test]
    fn ln_exact_points() {
        assert_eq!(ln(Decimal256::one()).unwrap(), Number::ZERO);
        assert_eq!(
            ln(Decimal256::from_ratio(2u64, 1u64)).unwrap(),
            Number::new_positive(LN2)
        );
    }

    #[test]
    fn ln_rejects_zero() {
        let err = ln(Decimal256::zero()).unwrap_err();
        assert_eq!(error_id_of(&err), Some(ErrorId::LnUndefined));
    }

    #[test]
    fn ln_known_values() {
        let e = Decimal256::from_str("2.718281828459045235").unwrap();
        assert_close(ln(e).unwrap(), 1.0, 1e-12);

        let x = Decimal256::from_str("3000").unwrap();
        assert_close(ln(x).unwrap(), 3000.0_f64.ln(), 1e-12);

        let x = Decimal256::from_str("0.000001").unwrap();
        assert_close(ln(x).unwrap(), 0.000001_f64.ln(), 1e-12);

        // the upper end of the supported pricing range
        let big = Decimal256::from_ratio(10u128.pow(36), 1u64);
        assert_close(ln(big).unwrap(), 36.0 * 10.0_f64.ln(), 1e-12);
    }

    #[test]
    fn exp_exact_points() {
        assert_eq!(exp(Number::ZERO).unwrap(), Decimal256::one());
        assert_eq!(
            exp(Number::from_str("-50").unwrap()).unwrap(),
            Decimal256::zero()
        );
    }

    #[test]
    fn exp_known_values() {
        assert_close(
            Number::new_positive(exp(Number::ONE).unwrap()),
            1.0_f64.exp(),
            1e-12,
        );
        assert_close(
            Number::new_positive(exp(Number::from_str("-1").unwrap()).unwrap()),
            (-1.0_f64).exp(),
            1e-12,
        );
        assert_close(
            Number::new_positive(exp(Number::from_str("10.5").unwrap()).unwrap()),
            10.5_f64.exp(),
            1e-12,
        );
        assert_close(
            Number::new_positive(exp(Number::from_str("135").unwrap()).unwrap()),
            135.0_f64.exp(),
            1e-9,
        );
    }

    #[test]
    fn exp_overflow() {
        let err = exp(Number::from_str("136").unwrap()).unwrap_err();
        assert_eq!(error_id_of(&err), Some(ErrorId::ExpOverflow));
    }

    #[test]
    fn exp_ln_round_trip() {
        for s in ["0.5", "1", "2", "42.5", "3000", "123456.789"] {
            let x = Decimal256::from_str(s).unwrap();
            let back = exp(ln(x).unwrap()).unwrap();
            let diff = if back > x { back - x } else { x - back };
            assert!(
                diff <= x * Decimal256::from_ratio(1u64, 1_000_000_000u64),
                "round trip of {s} returned {back}"
            );
        }
    }

    proptest! {
        #[test]
        fn ln_matches_f64(numerator in 1u64.., denominator in 1u64..) {
            let x = Decimal256::from_ratio(numerator, denominator);
            let expected = (to_f64(numerator) / to_f64(denominator)).ln();
            assert_close(ln(x).unwrap(), expected, 1e-9);
        }

        #[test]
        fn ln_monotonic(a in 1u64.., b in 1u64..) {
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            let ln_lo = ln(Decimal256::from_ratio(lo, 1u64)).unwrap();
            let ln_hi = ln(Decimal256::from_ratio(hi, 1u64)).unwrap();
            prop_assert!(ln_lo <= ln_hi);
        }

        #[test]
        fn exp_matches_f64(int_part in 0u64..130, frac in 0u64..1_000_000u64, negative in proptest::bool::ANY) {
            let magnitude = Decimal256::from_ratio(int_part, 1u64)
                .checked_add(Decimal256::from_ratio(frac, 1_000_000u64))
                .unwrap();
            let x = if negative {
                Number::new_negative(magnitude)
            } else {
                Number::new_positive(magnitude)
            };
            let expected: f64 = x.to_string().parse::<f64>().unwrap().exp();
            if expected >= 1e-15 {
                assert_close(Number::new_positive(exp(x).unwrap()), expected, 1e-9);
            }
        }
    }

    #[allow(clippy::as_conversions)]
    fn to_f64(x: u64) -> f64 {
        x as f64
    }
}
