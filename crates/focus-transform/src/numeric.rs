//! Numeric coercion and arithmetic over cells.
//!
//! Integers stay integral and amounts stay exact decimals; `f64` is only used
//! once a float is involved or text is out of decimal range.

use std::cmp::Ordering;
use std::str::FromStr;

use focus_model::{ArithmeticOperator, CellValue};
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::{Decimal, RoundingStrategy};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Number {
    Int(i64),
    Decimal(Decimal),
    Float(f64),
}

/// Parses a string as i64, returning None for invalid or empty strings.
pub fn parse_i64(value: &str) -> Option<i64> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.strip_prefix('+').unwrap_or(trimmed).parse().ok()
}

/// Parses a string as f64, returning None for invalid, empty or non-finite input.
pub fn parse_f64(value: &str) -> Option<f64> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Parses a string as an exact decimal, accepting scientific notation.
pub fn parse_decimal(value: &str) -> Option<Decimal> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    let unsigned = trimmed.strip_prefix('+').unwrap_or(trimmed);
    Decimal::from_str(unsigned)
        .ok()
        .or_else(|| Decimal::from_scientific(unsigned).ok())
}

/// Exact decimal view of a cell; floats go through their shortest text form.
pub fn cell_to_decimal(value: &CellValue) -> Option<Decimal> {
    match value {
        CellValue::Decimal(d) => Some(*d),
        CellValue::Int(i) => Some(Decimal::from(*i)),
        CellValue::Float(f) if f.is_finite() => parse_decimal(&f.to_string()),
        CellValue::Text(s) => parse_decimal(s),
        _ => None,
    }
}

/// Count of significant digits, with trailing zeros of an integer part included.
pub fn decimal_precision(value: &Decimal) -> u32 {
    let mut mantissa = value.mantissa().unsigned_abs();
    let mut digits = 1;
    while mantissa >= 10 {
        mantissa /= 10;
        digits += 1;
    }
    digits
}

/// Quantize to `scale` places with round-half-even, keeping trailing zeros.
pub fn quantize(value: Decimal, scale: u32) -> Decimal {
    let mut rounded = value.round_dp_with_strategy(scale, RoundingStrategy::MidpointNearestEven);
    rounded.rescale(scale);
    rounded
}

impl Number {
    /// Numeric view of a cell. Text parses as an integer, then as an exact
    /// decimal, and only then as a float.
    pub fn from_cell(value: &CellValue) -> Option<Number> {
        match value {
            CellValue::Text(s) => Self::parse(s),
            other => Self::from_numeric_cell(other),
        }
    }

    /// Numeric view of cells that already carry a numeric type.
    pub fn from_numeric_cell(value: &CellValue) -> Option<Number> {
        match value {
            CellValue::Int(i) => Some(Number::Int(*i)),
            CellValue::Float(f) if !f.is_nan() => Some(Number::Float(*f)),
            CellValue::Decimal(d) => Some(Number::Decimal(*d)),
            CellValue::Bool(b) => Some(Number::Int(i64::from(*b))),
            _ => None,
        }
    }

    pub fn parse(text: &str) -> Option<Number> {
        parse_i64(text)
            .map(Number::Int)
            .or_else(|| parse_decimal(text).map(Number::Decimal))
            .or_else(|| parse_f64(text).map(Number::Float))
    }

    pub fn to_f64(self) -> f64 {
        match self {
            Number::Int(i) => i as f64,
            Number::Decimal(d) => d.to_f64().unwrap_or(f64::NAN),
            Number::Float(f) => f,
        }
    }

    pub fn into_cell(self) -> CellValue {
        match self {
            Number::Int(i) => CellValue::Int(i),
            Number::Decimal(d) => CellValue::Decimal(d),
            Number::Float(f) if f.is_nan() => CellValue::Null,
            Number::Float(f) => CellValue::Float(f),
        }
    }

    pub fn is_zero(self) -> bool {
        match self {
            Number::Int(i) => i == 0,
            Number::Decimal(d) => d.is_zero(),
            Number::Float(f) => f == 0.0,
        }
    }

    fn to_decimal(self) -> Option<Decimal> {
        match self {
            Number::Int(i) => Some(Decimal::from(i)),
            Number::Decimal(d) => Some(d),
            Number::Float(f) => Decimal::from_f64(f),
        }
    }

    /// Truncate toward zero. Non-finite or out-of-range values give `None`.
    pub fn truncate(self) -> Option<i64> {
        match self {
            Number::Int(i) => Some(i),
            Number::Decimal(d) => d.trunc().to_i64(),
            Number::Float(f) if f.is_finite() => {
                let t = f.trunc();
                (t >= i64::MIN as f64 && t <= i64::MAX as f64).then_some(t as i64)
            }
            Number::Float(_) => None,
        }
    }

    /// Combine two numbers. Division or modulo by zero gives `None`.
    pub fn apply(self, op: ArithmeticOperator, rhs: Number) -> Option<Number> {
        if matches!(op, ArithmeticOperator::Div) && rhs.is_zero() {
            return None;
        }
        match (self, rhs) {
            (Number::Float(_), _) | (_, Number::Float(_)) => {
                Some(Number::Float(float_op(op, self.to_f64(), rhs.to_f64())))
            }
            (Number::Int(a), Number::Int(b)) => {
                let exact = match op {
                    ArithmeticOperator::Add => a.checked_add(b),
                    ArithmeticOperator::Sub => a.checked_sub(b),
                    ArithmeticOperator::Mul => a.checked_mul(b),
                    ArithmeticOperator::Div => {
                        return Some(
                            Decimal::from(a)
                                .checked_div(Decimal::from(b))
                                .map_or_else(|| Number::Float(a as f64 / b as f64), Number::Decimal),
                        );
                    }
                };
                Some(exact.map_or_else(
                    || Number::Float(float_op(op, a as f64, b as f64)),
                    Number::Int,
                ))
            }
            _ => {
                let (a, b) = (self.to_decimal()?, rhs.to_decimal()?);
                let exact = match op {
                    ArithmeticOperator::Add => a.checked_add(b),
                    ArithmeticOperator::Sub => a.checked_sub(b),
                    ArithmeticOperator::Mul => a.checked_mul(b),
                    ArithmeticOperator::Div => a.checked_div(b),
                };
                Some(exact.map_or_else(
                    || Number::Float(float_op(op, self.to_f64(), rhs.to_f64())),
                    Number::Decimal,
                ))
            }
        }
    }

    /// Remainder with the sign of the divisor. Zero divisor gives `None`.
    pub fn modulo(self, rhs: Number) -> Option<Number> {
        if rhs.is_zero() {
            return None;
        }
        match (self, rhs) {
            (Number::Int(a), Number::Int(b)) => {
                let r = a.checked_rem(b)?;
                Some(Number::Int(if r != 0 && (r < 0) != (b < 0) { r + b } else { r }))
            }
            (Number::Float(_), _) | (_, Number::Float(_)) => {
                let (a, b) = (self.to_f64(), rhs.to_f64());
                let r = a % b;
                Some(Number::Float(if r != 0.0 && (r < 0.0) != (b < 0.0) { r + b } else { r }))
            }
            _ => {
                let (a, b) = (self.to_decimal()?, rhs.to_decimal()?);
                let r = a.checked_rem(b)?;
                let fix = !r.is_zero() && (r.is_sign_negative() != b.is_sign_negative());
                Some(Number::Decimal(if fix { r + b } else { r }))
            }
        }
    }

    pub fn negate(self) -> Number {
        match self {
            Number::Int(i) => i.checked_neg().map_or(Number::Float(-(i as f64)), Number::Int),
            Number::Decimal(d) => Number::Decimal(-d),
            Number::Float(f) => Number::Float(-f),
        }
    }

    pub fn abs(self) -> Number {
        match self {
            Number::Int(i) => i.checked_abs().map_or(Number::Float((i as f64).abs()), Number::Int),
            Number::Decimal(d) => Number::Decimal(d.abs()),
            Number::Float(f) => Number::Float(f.abs()),
        }
    }

    /// Round half-to-even to `ndigits` places; negative values round to tens, hundreds...
    ///
    /// `None` when the rounded value leaves the decimal range.
    pub fn round(self, ndigits: i32) -> Option<Number> {
        match self {
            Number::Int(i) if ndigits >= 0 => Some(Number::Int(i)),
            Number::Int(i) => {
                round_decimal(Decimal::from(i), ndigits).map(|d| Number::Decimal(d).integral_or_self())
            }
            Number::Decimal(d) => round_decimal(d, ndigits).map(Number::Decimal),
            Number::Float(f) => {
                let factor = 10f64.powi(ndigits);
                let scaled = f * factor;
                if !scaled.is_finite() {
                    return Some(Number::Float(f));
                }
                Some(Number::Float(scaled.round_ties_even() / factor))
            }
        }
    }

    fn integral_or_self(self) -> Number {
        match self {
            Number::Decimal(d) if d.fract().is_zero() => d.to_i64().map_or(self, Number::Int),
            other => other,
        }
    }

    pub fn compare(self, other: Number) -> Option<Ordering> {
        match (self, other) {
            (Number::Int(a), Number::Int(b)) => Some(a.cmp(&b)),
            (Number::Float(_), _) | (_, Number::Float(_)) => {
                self.to_f64().partial_cmp(&other.to_f64())
            }
            _ => Some(self.to_decimal()?.cmp(&other.to_decimal()?)),
        }
    }
}

fn float_op(op: ArithmeticOperator, a: f64, b: f64) -> f64 {
    match op {
        ArithmeticOperator::Add => a + b,
        ArithmeticOperator::Sub => a - b,
        ArithmeticOperator::Mul => a * b,
        ArithmeticOperator::Div => a / b,
    }
}

fn round_decimal(value: Decimal, ndigits: i32) -> Option<Decimal> {
    if ndigits >= 0 {
        return Some(value.round_dp_with_strategy(
            ndigits.unsigned_abs(),
            RoundingStrategy::MidpointNearestEven,
        ));
    }
    let mut factor = Decimal::ONE;
    for _ in 0..ndigits.unsigned_abs() {
        let Some(next) = factor.checked_mul(Decimal::TEN) else {
            // Every decimal is smaller than half of 10^29.
            return Some(Decimal::ZERO);
        };
        factor = next;
    }
    value
        .checked_div(factor)?
        .round_dp_with_strategy(0, RoundingStrategy::MidpointNearestEven)
        .checked_mul(factor)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn text_parses_int_then_float() {
        assert_eq!(Number::parse(" 42 "), Some(Number::Int(42)));
        assert_eq!(Number::parse("1.5"), Some(Number::Decimal(dec("1.5"))));
        assert_eq!(Number::parse("1e400"), None);
        assert_eq!(Number::parse("abc"), None);
        assert_eq!(Number::parse(""), None);
        assert_eq!(Number::parse("inf"), None);
    }

    #[test]
    fn int_arithmetic_stays_integral() {
        let sum = Number::Int(2).apply(ArithmeticOperator::Add, Number::Int(3));
        assert_eq!(sum, Some(Number::Int(5)));
        let quotient = Number::Int(7).apply(ArithmeticOperator::Div, Number::Int(2));
        assert_eq!(quotient, Some(Number::Decimal(dec("3.5"))));
    }

    #[test]
    fn decimal_arithmetic_stays_exact() {
        let total = Number::Decimal(dec("0.1")).apply(ArithmeticOperator::Add, Number::Decimal(dec("0.2")));
        assert_eq!(total, Some(Number::Decimal(dec("0.3"))));
        let scaled = Number::Decimal(dec("1.10")).apply(ArithmeticOperator::Mul, Number::Int(3));
        assert_eq!(scaled, Some(Number::Decimal(dec("3.30"))));
    }

    #[test]
    fn division_by_zero_is_none() {
        assert_eq!(Number::Int(1).apply(ArithmeticOperator::Div, Number::Int(0)), None);
        assert_eq!(Number::Float(1.0).apply(ArithmeticOperator::Div, Number::Float(0.0)), None);
        assert_eq!(Number::Int(1).modulo(Number::Int(0)), None);
    }

    #[test]
    fn modulo_follows_divisor_sign() {
        assert_eq!(Number::Int(-7).modulo(Number::Int(3)), Some(Number::Int(2)));
        assert_eq!(Number::Int(7).modulo(Number::Int(-3)), Some(Number::Int(-2)));
    }

    #[test]
    fn rounding_is_half_even() {
        assert_eq!(Number::Float(2.5).round(0), Some(Number::Float(2.0)));
        assert_eq!(Number::Float(3.5).round(0), Some(Number::Float(4.0)));
        assert_eq!(Number::Decimal(dec("12.345")).round(2), Some(Number::Decimal(dec("12.34"))));
        assert_eq!(Number::Int(1250).round(-2), Some(Number::Int(1200)));
    }

    #[test]
    fn rounding_out_of_decimal_range_is_none() {
        assert_eq!(Number::Decimal(Decimal::MAX).round(-1), None);
        assert_eq!(Number::Decimal(Decimal::MIN).round(-1), None);
        assert_eq!(Number::Decimal(Decimal::MAX).round(-40), Some(Number::Decimal(Decimal::ZERO)));
        assert_eq!(
            Number::Decimal(dec("79228162514264337593543950")).round(-1),
            Some(Number::Decimal(dec("79228162514264337593543950")))
        );
    }

    #[test]
    fn text_amounts_add_exactly() {
        let (a, b) = (Number::parse("0.1").unwrap(), Number::parse("0.2").unwrap());
        assert_eq!(a.apply(ArithmeticOperator::Add, b), Some(Number::Decimal(dec("0.3"))));
    }

    #[test]
    fn quantize_keeps_trailing_zeros() {
        assert_eq!(quantize(dec("1.5"), 2).to_string(), "1.50");
        assert_eq!(quantize(dec("12.345"), 2).to_string(), "12.34");
        assert_eq!(quantize(dec("12.355"), 2).to_string(), "12.36");
    }

    #[test]
    fn precision_counts_significant_digits() {
        assert_eq!(decimal_precision(&dec("123456.78")), 8);
        assert_eq!(decimal_precision(&dec("0.05")), 1);
        assert_eq!(decimal_precision(&dec("100")), 3);
        assert_eq!(decimal_precision(&dec("0")), 1);
    }

    #[test]
    fn float_cells_convert_through_shortest_text() {
        assert_eq!(cell_to_decimal(&CellValue::Float(1.1)), Some(dec("1.1")));
        assert_eq!(cell_to_decimal(&CellValue::text("1e3")), Some(dec("1000")));
        assert_eq!(cell_to_decimal(&CellValue::Bool(true)), None);
    }
}
