//! Provides a number of data types, methods, and traits to have more
//! fine-grained and strongly-typed control of numeric data.
//!
//! Math generally uses [Decimal256](cosmwasm_std::Decimal256), whose atomic
//! representation is 18 decimal places, the WAD fixed-point scale every
//! internal quantity of the protocol is expressed in. This type alone cannot
//! express negative numbers, and we often want additional constraints at
//! compile time. A combination of traits and newtype wrappers gives us a
//! robust framework:
//!
//! * `UnsignedDecimal`: a _trait_, not a concrete type, implemented for
//!   [Collateral], [Price] and [Decimal256](cosmwasm_std::Decimal256) itself.
//!
//! * `NonZero<T>`: a newtype wrapper which ensures that the value is not zero.
//!
//! * `Signed<T>`: a newtype wrapper which allows for positive or negative
//!   values. The ubiquitous `Signed<Decimal256>` has its own alias, [Number];
//!   it carries the share vector, the cached cost and the utility level of
//!   the pricing engine.
//!
//! Conversions between the signed and unsigned worlds always go through
//! checked constructors such as [Signed::try_into_non_negative_value]; there
//! is no `as`-style casting anywhere in the protocol.

mod ops;
mod serialize;

use anyhow::{anyhow, Context, Result};
use cosmwasm_std::{Decimal256, OverflowError, Uint128, Uint256};
use std::{
    fmt::Display,
    ops::{Add, Sub},
    str::FromStr,
};

/// Generalizes any newtype wrapper around a [Decimal256].
pub trait UnsignedDecimal:
    Display
    + std::fmt::Debug
    + serde::Serialize
    + serde::de::DeserializeOwned
    + Copy
    + Ord
    + FromStr
    + Default
{
    /// Convert into the underlying [Decimal256].
    fn into_decimal256(self) -> Decimal256;

    /// Convert from a [Decimal256].
    fn from_decimal256(src: Decimal256) -> Self;

    /// Check if the underlying value is 0.
    fn is_zero(&self) -> bool {
        self.into_decimal256().is_zero()
    }

    /// Add two values together
    fn checked_add(self, rhs: Self) -> Result<Self, OverflowError> {
        self.into_decimal256()
            .checked_add(rhs.into_decimal256())
            .map(Self::from_decimal256)
    }

    /// Try to add a signed value to this, erroring if it results in a negative result.
    fn checked_add_signed(self, rhs: Signed<Self>) -> Result<Self> {
        self.into_signed()
            .checked_add(rhs)?
            .try_into_non_negative_value()
            .with_context(|| format!("{self} + {rhs}"))
    }

    /// Subtract two values
    fn checked_sub(self, rhs: Self) -> Result<Self, OverflowError> {
        self.into_decimal256()
            .checked_sub(rhs.into_decimal256())
            .map(Self::from_decimal256)
    }

    /// Try to convert from a general purpose [Number]
    fn try_from_number(Signed { value, negative }: Signed<Decimal256>) -> Result<Self> {
        if negative {
            Err(anyhow!("try_from_number: received a negative value"))
        } else {
            Ok(Self::from_decimal256(value))
        }
    }

    /// Convert into a general purpose [Number]
    fn into_number(self) -> Signed<Decimal256> {
        Signed::new_positive(self.into_decimal256())
    }

    /// Convert into a positive [Signed] value.
    fn into_signed(self) -> Signed<Self> {
        Signed::new_positive(self)
    }

    /// The value 0
    fn zero() -> Self {
        Self::from_decimal256(Decimal256::zero())
    }

    /// Difference between two values
    fn diff(self, rhs: Self) -> Self {
        Self::from_decimal256(if self > rhs {
            self.into_decimal256() - rhs.into_decimal256()
        } else {
            rhs.into_decimal256() - self.into_decimal256()
        })
    }
}

impl UnsignedDecimal for Decimal256 {
    fn into_decimal256(self) -> Decimal256 {
        self
    }

    fn from_decimal256(src: Decimal256) -> Self {
        src
    }
}

macro_rules! unsigned {
    ($t:tt) => {
        // Avoid using cw_serde because Decimal256 has a bad Debug impl
        #[derive(
            PartialEq,
            Eq,
            PartialOrd,
            Ord,
            Clone,
            Copy,
            Default,
            serde::Serialize,
            serde::Deserialize,
            schemars::JsonSchema,
        )]
        /// Unsigned value
        pub struct $t(Decimal256);

        impl $t {
            /// Zero value
            pub const fn zero() -> Self {
                Self(Decimal256::zero())
            }

            /// One value
            pub const fn one() -> Self {
                Self(Decimal256::one())
            }
        }

        impl UnsignedDecimal for $t {
            fn into_decimal256(self) -> Decimal256 {
                self.0
            }

            fn from_decimal256(src: Decimal256) -> Self {
                Self(src)
            }
        }

        impl Display for $t {
            fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl std::fmt::Debug for $t {
            fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
                write!(f, "{}({})", stringify!($t), self.0)
            }
        }

        impl FromStr for $t {
            type Err = anyhow::Error;

            fn from_str(s: &str) -> Result<Self> {
                parse_decimal256(s).map(Self::from_decimal256)
            }
        }

        impl TryFrom<&str> for $t {
            type Error = anyhow::Error;

            fn try_from(value: &str) -> Result<Self> {
                value.parse()
            }
        }

        impl TryFrom<String> for $t {
            type Error = anyhow::Error;

            fn try_from(value: String) -> Result<Self> {
                value.parse()
            }
        }

        impl Add for $t {
            type Output = anyhow::Result<Self, OverflowError>;

            fn add(self, rhs: Self) -> Self::Output {
                Ok(Self(self.0.checked_add(rhs.0)?))
            }
        }

        impl Sub for $t {
            type Output = anyhow::Result<Self, OverflowError>;

            fn sub(self, rhs: Self) -> Self::Output {
                Ok(Self(self.0.checked_sub(rhs.0)?))
            }
        }

        impl From<u64> for $t {
            fn from(src: u64) -> Self {
                u128::from(src).into()
            }
        }

        impl From<u128> for $t {
            fn from(src: u128) -> Self {
                Self::from_decimal256(Decimal256::from_ratio(src, 1u32))
            }
        }

        impl $t {
            /// Floor the current value with given decimal precision
            pub fn floor_with_precision(&self, precision: u32) -> Self {
                let factor = Decimal256::one().atomics() / Uint256::from_u128(10).pow(precision);
                let raw = self.0.atomics() / factor * factor;

                Self(Decimal256::new(raw))
            }
        }
    };
}

fn parse_decimal256(s: &str) -> Result<Decimal256> {
    s.parse()
        .with_context(|| format!("Unable to parse unsigned decimal from {s}"))
}

unsigned!(Collateral);
unsigned!(Price);

/// Wrap up any [UnsignedDecimal] to provide negative values too.
#[derive(PartialEq, Eq, Clone, Copy)]
pub struct Signed<T> {
    value: T,
    /// Invariant: must always be false if value is 0
    negative: bool,
}

impl<T: UnsignedDecimal> Default for Signed<T> {
    fn default() -> Self {
        Signed {
            value: T::default(),
            negative: false,
        }
    }
}

impl<T> From<T> for Signed<T> {
    fn from(value: T) -> Self {
        Signed {
            value,
            negative: false,
        }
    }
}

impl<T: UnsignedDecimal> Signed<T> {
    pub(crate) fn value(self) -> T {
        self.value
    }

    /// Strictly less than 0, returns false on 0
    pub fn is_negative(&self) -> bool {
        self.negative
    }

    /// create a new positive value
    pub fn new_positive(value: T) -> Self {
        Self {
            value,
            negative: false,
        }
    }

    /// create a new negative value
    pub fn new_negative(value: T) -> Self {
        Self {
            value,
            negative: !value.is_zero(),
        }
    }

    /// Convert into a general purpose [Number].
    pub fn into_number(self) -> Signed<Decimal256> {
        Signed {
            value: self.value.into_decimal256(),
            negative: self.negative,
        }
    }

    /// convert from a general purpose [Number].
    pub fn from_number(src: Signed<Decimal256>) -> Self {
        Signed {
            value: T::from_decimal256(src.value),
            negative: src.negative,
        }
    }

    /// The value 0
    pub fn zero() -> Self {
        Signed::new_positive(T::zero())
    }

    /// If the value is positive or zero, return the inner `T`. Otherwise return `None`.
    pub fn try_into_non_negative_value(self) -> Option<T> {
        if self.is_negative() {
            None
        } else {
            Some(self.value())
        }
    }

    /// absolute value
    pub fn abs(self) -> Self {
        Self::new_positive(self.value())
    }

    /// Absolute value, but return the `T` underlying type directly
    pub fn abs_unsigned(self) -> T {
        self.value()
    }

    /// Checks if this number is greater than 0.
    pub fn is_strictly_positive(&self) -> bool {
        !self.is_zero() && !self.is_negative()
    }

    /// Checks if this number is greater than or equal to 0.
    pub fn is_positive_or_zero(&self) -> bool {
        !self.is_negative()
    }

    /// Is the value 0?
    pub fn is_zero(&self) -> bool {
        self.value().is_zero()
    }

    /// Apply a function to the inner value and rewrap.
    ///
    /// This will keep the current sign (positive or negative) in place,
    /// respecting invariants that a value of 0 must have negative set to false.
    pub fn map<U: UnsignedDecimal, F: FnOnce(T) -> U>(self, f: F) -> Signed<U> {
        let value = f(self.value());
        if self.is_negative() {
            Signed::new_negative(value)
        } else {
            Signed::new_positive(value)
        }
    }
}

impl Signed<Decimal256> {
    /// The maximum allowed
    pub const MAX: Self = Self {
        value: Decimal256::MAX,
        negative: false,
    };

    /// The minimum allowed
    pub const MIN: Number = Number {
        value: Decimal256::MAX,
        negative: true,
    };

    /// 1 as a Number
    pub const ONE: Number = Number {
        value: Decimal256::one(),
        negative: false,
    };

    /// -1 as a Number
    pub const NEG_ONE: Number = Number {
        value: Decimal256::one(),
        negative: true,
    };

    /// 0 as a Number
    pub const ZERO: Number = Number {
        value: Decimal256::zero(),
        negative: false,
    };

    /// Default epsilon used for approximate comparisons
    pub const EPS_E7: Number = Number {
        // 18 digits precision - 7 digits == 11 zeros
        value: Decimal256::raw(100_000_000_000),
        negative: false,
    };

    /// An alternate epsilon that can be used for approximate comparisons
    pub const EPS_E6: Number = Number {
        value: Decimal256::raw(1_000_000_000_000),
        negative: false,
    };
}

impl<T: UnsignedDecimal> std::ops::Neg for Signed<T> {
    type Output = Self;

    fn neg(mut self) -> Self {
        if !self.value.is_zero() {
            self.negative = !self.negative;
        }
        self
    }
}

/// A signed number type with high fidelity.
///
/// A more ergonomic wrapper around [Decimal256] adding negative values and
/// other methods as needed by the pricing math.
pub type Number = Signed<Decimal256>;

/// Ensure that the inner value is never 0.
#[derive(PartialEq, Eq, Clone, Copy, PartialOrd, Ord, Debug)]
pub struct NonZero<T>(T);

impl<T: UnsignedDecimal> NonZero<T> {
    /// Get the underlying raw value.
    pub fn raw(self) -> T {
        self.0
    }

    /// Turn into a signed value.
    pub fn into_signed(self) -> Signed<T> {
        self.0.into()
    }

    /// Try to convert a raw value into a [NonZero].
    pub fn new(src: T) -> Option<Self> {
        if src.is_zero() {
            None
        } else {
            Some(NonZero(src))
        }
    }

    /// Convert into a general purpose [Decimal256].
    pub fn into_decimal256(self) -> Decimal256 {
        self.0.into_decimal256()
    }

    /// Convert into a general purpose [Number].
    pub fn into_number(self) -> Signed<Decimal256> {
        self.0.into_number()
    }

    /// Try to convert a general purpose [Decimal256] into this type.
    pub fn try_from_decimal(src: Decimal256) -> Option<Self> {
        NonZero::new(T::from_decimal256(src))
    }

    /// Try to convert a signed value into a non-zero.
    pub fn try_from_signed(src: Signed<T>) -> Result<Self> {
        src.try_into_non_negative_value()
            .and_then(NonZero::new)
            .with_context(|| format!("Could not convert signed value {src} into NonZero"))
    }

    /// The value 1.
    pub fn one() -> Self {
        Self(T::from_decimal256(Decimal256::one()))
    }
}

impl<T: UnsignedDecimal> Display for NonZero<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        Display::fmt(&self.0, f)
    }
}

impl<T: UnsignedDecimal> FromStr for NonZero<T> {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let raw = T::from_str(s).map_err(|_| anyhow!("Unable to parse decimal from {s}"))?;
        NonZero::new(raw).with_context(|| format!("NonZero cannot be zero: {s}"))
    }
}

impl<T: UnsignedDecimal> From<NonZero<T>> for Signed<T> {
    fn from(src: NonZero<T>) -> Self {
        Signed::new_positive(src.0)
    }
}

impl Collateral {
    /// Multiply by the given [Decimal256]
    pub fn checked_mul_dec(self, rhs: Decimal256) -> Result<Collateral> {
        self.0
            .checked_mul(rhs)
            .map(Collateral)
            .with_context(|| format!("Collateral::checked_mul_dec failed on {self} * {rhs}"))
    }

    /// Divide by the given [Decimal256]
    pub fn checked_div_dec(self, rhs: Decimal256) -> Result<Collateral> {
        self.0
            .checked_div(rhs)
            .map(Collateral)
            .with_context(|| format!("Collateral::checked_div_dec failed on {self} / {rhs}"))
    }
}

impl Price {
    /// Multiply by the given [Decimal256]
    pub fn checked_mul_dec(self, rhs: Decimal256) -> Result<Price> {
        self.0
            .checked_mul(rhs)
            .map(Price)
            .with_context(|| format!("Price::checked_mul_dec failed on {self} * {rhs}"))
    }

    /// Divide by the given [Decimal256]
    pub fn checked_div_dec(self, rhs: Decimal256) -> Result<Price> {
        self.0
            .checked_div(rhs)
            .map(Price)
            .with_context(|| format!("Price::checked_div_dec failed on {self} / {rhs}"))
    }

    /// Ratio between two prices.
    pub fn checked_div_price(self, rhs: Price) -> Result<Decimal256> {
        self.0
            .checked_div(rhs.0)
            .with_context(|| format!("Price::checked_div_price failed on {self} / {rhs}"))
    }
}

impl Number {
    /// Returns the ratio (nominator / denominator) as a positive Number
    pub fn from_ratio_u256<A: Into<Uint256>, B: Into<Uint256>>(
        numerator: A,
        denominator: B,
    ) -> Self {
        Number::new_positive(Decimal256::from_ratio(numerator, denominator))
    }

    /// Represent as a u128 encoded with given decimal places
    ///
    /// NOTE decimals may be dropped if precision isn't sufficient to represent
    /// all digits completely
    pub fn to_u128_with_precision(&self, precision: u32) -> Option<u128> {
        if self.is_negative() {
            return None;
        }

        let factor = Decimal256::one().atomics() / Uint256::from_u128(10).pow(precision);
        let raw = self.value().atomics() / factor;

        Uint128::try_from(raw).ok().map(|x| x.into())
    }
}

impl TryFrom<&str> for Number {
    type Error = anyhow::Error;

    fn try_from(val: &str) -> Result<Self> {
        Number::from_str(val)
    }
}

impl<T: UnsignedDecimal> FromStr for Signed<T> {
    type Err = anyhow::Error;

    /// Converts the decimal string to a signed value
    /// Possible inputs: "1.23", "1", "000012", "1.123000000", "-1.23"
    /// Disallowed: "", ".23"
    ///
    /// This never performs any kind of rounding.
    /// More than 18 fractional digits, even zeros, result in an error.
    fn from_str(input: &str) -> Result<Self> {
        match input.strip_prefix('-') {
            Some(input) => Decimal256::from_str(input)
                .map(T::from_decimal256)
                .map(Signed::new_negative),
            None => Decimal256::from_str(input)
                .map(T::from_decimal256)
                .map(Signed::new_positive),
        }
        .with_context(|| format!("Unable to parse signed decimal from {input:?}"))
    }
}

impl<T: UnsignedDecimal> From<u128> for Signed<T> {
    fn from(val: u128) -> Self {
        Signed::new_positive(T::from_decimal256(Decimal256::from_ratio(val, 1u32)))
    }
}

impl<T: UnsignedDecimal> From<u64> for Signed<T> {
    fn from(val: u64) -> Self {
        u128::from(val).into()
    }
}

impl<T: UnsignedDecimal> std::fmt::Display for Signed<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        if self.is_zero() {
            write!(f, "0")
        } else {
            if self.is_negative() {
                use std::fmt::Write;
                f.write_char('-')?;
            }
            write!(f, "{}", self.value())
        }
    }
}

impl<T: UnsignedDecimal> std::fmt::Debug for Signed<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn number_default() {
        assert_eq!(Number::ZERO, Number::default());
    }

    #[test]
    fn number_serde() {
        let a = Number::from(300u64);
        let b = Number::from(7u64);
        let res = a / b;

        assert_eq!(serde_json::to_value(res).unwrap(), "42.857142857142857142");
        assert_eq!(
            serde_json::from_str::<Number>("\"42.857142857142857142\"").unwrap(),
            res
        );

        let res = -res;

        assert_eq!(serde_json::to_value(res).unwrap(), "-42.857142857142857142");
        assert_eq!(
            serde_json::from_str::<Number>("\"-42.857142857142857142\"").unwrap(),
            res
        );
    }

    #[test]
    fn number_arithmetic() {
        let a = Number::from(300u64);
        let b = Number::from(7u64);

        assert_eq!((a + b).to_string(), "307");
        assert_eq!((a - b).to_string(), "293");
        assert_eq!((b - a).to_string(), "-293");
        assert_eq!((a * b).to_string(), "2100");
        assert_eq!((a / b).to_string(), "42.857142857142857142");

        let a = -a;
        let b = -b;
        assert_eq!((a + b).to_string(), "-307");
        assert_eq!((a - b).to_string(), "-293");
        assert_eq!((b - a).to_string(), "293");
        assert_eq!((a * b).to_string(), "2100");
        assert_eq!((a / b).to_string(), "42.857142857142857142");
    }

    #[test]
    fn number_cmp() {
        let a = Number::from_str("4.2").unwrap();
        let b = Number::from_str("0.007").unwrap();
        assert!(a > b);

        let a = Number::from_str("-4.2").unwrap();
        let b = Number::from_str("4.2").unwrap();
        assert!(a < b);

        let a = Number::from_str("-4.5").unwrap();
        let b = Number::from_str("-4.2").unwrap();
        assert!(a < b);
    }

    #[test]
    fn zero_str() {
        let mut a = Number::from_str("0").unwrap();
        a = -a;
        assert_eq!(a.to_string(), "0");

        let a = Number::from_str("-0").unwrap();
        assert_eq!(a.to_string(), "0");
    }

    #[test]
    fn number_u128_with_precision() {
        let a = Number::from_str("270.15").unwrap();
        let b = Number::from_str("1.000000001").unwrap();

        assert_eq!(a.to_u128_with_precision(6).unwrap(), 270_150_000);
        assert_eq!(b.to_u128_with_precision(6).unwrap(), 1_000_000);
        assert_eq!(b.to_u128_with_precision(9).unwrap(), 1_000_000_001);
    }

    #[test]
    fn catch_overflow() {
        match Number::MAX.checked_mul(Number::MAX) {
            Ok(_) => {
                panic!("should overflow!");
            }
            Err(e) => {
                if !e.to_string().contains("Overflow") {
                    panic!("wrong error! (got {e})");
                }
            }
        }
    }

    #[test]
    fn floor_unsigned_type_with_precision() {
        assert_eq!(
            Collateral::from_str("12.3456789")
                .unwrap()
                .floor_with_precision(2),
            Collateral::from_str("12.34").unwrap()
        );
    }
}
