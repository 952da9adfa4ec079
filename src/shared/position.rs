//! Fixed-Precision Positions
//!
//! `Position` is the orderable scalar that determines sibling render order.
//! It is a decimal with exactly nine fractional digits, stored as an `i64`
//! count of nano-units, so midpoint arithmetic and the rebalance threshold
//! behave identically on every platform.
//!
//! On the wire whole values serialize as JSON integers (`1500`) and
//! fractional values as exact decimal strings (`"1500.000000001"`), so every
//! position round-trips without passing through a float. JSON floats are
//! accepted on input and rounded to the nearest nano-unit.

use crate::shared::error::SharedError;
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Nano-units per whole position unit
pub const SCALE: i64 = 1_000_000_000;

/// Number of fractional decimal digits
const FRACTION_DIGITS: usize = 9;

/// Fixed-point ordinal position
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Position(i64);

impl Position {
    /// Position zero
    pub const ZERO: Position = Position(0);

    /// The smallest representable step (1e-9)
    pub const EPSILON: Position = Position(1);

    /// Build from raw nano-units
    pub const fn from_raw(raw: i64) -> Self {
        Self(raw)
    }

    /// Build from whole units (saturating)
    pub const fn from_units(units: i64) -> Self {
        Self(units.saturating_mul(SCALE))
    }

    /// Build from a float, rounding to the nearest nano-unit
    pub fn from_f64(value: f64) -> Result<Self, SharedError> {
        if !value.is_finite() {
            return Err(SharedError::invalid_position(value.to_string()));
        }
        let scaled = (value * SCALE as f64).round();
        if scaled < i64::MIN as f64 || scaled >= i64::MAX as f64 {
            return Err(SharedError::invalid_position(value.to_string()));
        }
        Ok(Self(scaled as i64))
    }

    /// Raw nano-units
    pub const fn raw(self) -> i64 {
        self.0
    }

    /// Whether the position has no fractional part
    pub fn is_whole(self) -> bool {
        self.0 % SCALE == 0
    }

    /// Whether the position is strictly greater than zero
    pub fn is_positive(self) -> bool {
        self.0 > 0
    }

    /// Arithmetic mean of two positions, truncated toward the lower one
    pub fn midpoint(self, other: Position) -> Position {
        let (lo, hi) = if self <= other { (self.0, other.0) } else { (other.0, self.0) };
        let mid = lo as i128 + (hi as i128 - lo as i128) / 2;
        Position(mid as i64)
    }

    /// Half of this position
    pub fn half(self) -> Position {
        Position(self.0 / 2)
    }

    /// Absolute distance between two positions (saturating)
    pub fn gap_to(self, other: Position) -> Position {
        let diff = (self.0 as i128 - other.0 as i128).abs();
        Position(diff.min(i64::MAX as i128) as i64)
    }

    /// Checked addition
    pub fn checked_add(self, other: Position) -> Option<Position> {
        self.0.checked_add(other.0).map(Position)
    }

    /// Saturating addition
    pub fn saturating_add(self, other: Position) -> Position {
        Position(self.0.saturating_add(other.0))
    }

    /// Checked multiplication by an integer factor
    pub fn checked_mul(self, factor: i64) -> Option<Position> {
        self.0.checked_mul(factor).map(Position)
    }

    /// Doubled value (saturating)
    pub fn doubled(self) -> Position {
        Position(self.0.saturating_mul(2))
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        let whole = abs / SCALE as u64;
        let frac = abs % SCALE as u64;
        if frac == 0 {
            return write!(f, "{}{}", sign, whole);
        }
        let digits = format!("{:0width$}", frac, width = FRACTION_DIGITS);
        write!(f, "{}{}.{}", sign, whole, digits.trim_end_matches('0'))
    }
}

impl FromStr for Position {
    type Err = SharedError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let text = s.trim();
        let invalid = || SharedError::invalid_position(s);

        let (negative, unsigned) = match text.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, text.strip_prefix('+').unwrap_or(text)),
        };
        let (whole_str, frac_str) = match unsigned.split_once('.') {
            Some((w, f)) => (w, f),
            None => (unsigned, ""),
        };
        if whole_str.is_empty() && frac_str.is_empty() {
            return Err(invalid());
        }
        if !whole_str.chars().all(|c| c.is_ascii_digit())
            || !frac_str.chars().all(|c| c.is_ascii_digit())
            || frac_str.len() > FRACTION_DIGITS
        {
            return Err(invalid());
        }

        let whole: i64 = if whole_str.is_empty() {
            0
        } else {
            whole_str.parse().map_err(|_| invalid())?
        };
        let frac: i64 = if frac_str.is_empty() {
            0
        } else {
            let padded = format!("{:0<width$}", frac_str, width = FRACTION_DIGITS);
            padded.parse().map_err(|_| invalid())?
        };

        let raw = whole
            .checked_mul(SCALE)
            .and_then(|w| w.checked_add(frac))
            .ok_or_else(invalid)?;
        Ok(Position(if negative { -raw } else { raw }))
    }
}

impl Serialize for Position {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if self.is_whole() {
            serializer.serialize_i64(self.0 / SCALE)
        } else {
            serializer.collect_str(self)
        }
    }
}

struct PositionVisitor;

impl Visitor<'_> for PositionVisitor {
    type Value = Position;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a number or decimal string")
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Position, E> {
        v.checked_mul(SCALE)
            .map(Position)
            .ok_or_else(|| E::custom(format!("position {} out of range", v)))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Position, E> {
        i64::try_from(v)
            .ok()
            .and_then(|v| v.checked_mul(SCALE))
            .map(Position)
            .ok_or_else(|| E::custom(format!("position {} out of range", v)))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Position, E> {
        Position::from_f64(v).map_err(E::custom)
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Position, E> {
        v.parse().map_err(E::custom)
    }
}

impl<'de> Deserialize<'de> for Position {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(PositionVisitor)
    }
}
