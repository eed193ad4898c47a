//! Symbol → units mapping used as the single source of truth for quantity updates.

use std::collections::HashMap;
use std::str::FromStr;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::Serialize;

/// Cell values treated as missing, in addition to the empty string.
const MISSING_MARKERS: &[&str] = &["nan", "NaN", "NA", "N/A", "n/a", "null", "NULL", "None"];

/// Trading symbol → integer units held.
///
/// Symbols are case-sensitive. Inserting an existing symbol replaces its
/// quantity (last write wins).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct QuantityMap(HashMap<String, i64>);

impl QuantityMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a quantity, returning the previous value for the symbol if any.
    pub fn insert(&mut self, symbol: impl Into<String>, quantity: i64) -> Option<i64> {
        self.0.insert(symbol.into(), quantity)
    }

    #[inline]
    pub fn get(&self, symbol: &str) -> Option<i64> {
        self.0.get(symbol).copied()
    }

    #[inline]
    pub fn contains(&self, symbol: &str) -> bool {
        self.0.contains_key(symbol)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<S: Into<String>> FromIterator<(S, i64)> for QuantityMap {
    fn from_iter<I: IntoIterator<Item = (S, i64)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (symbol, quantity) in iter {
            map.insert(symbol, quantity);
        }
        map
    }
}

/// Outcome of coercing a raw `units` cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitsValue {
    /// Parsed (fractions truncated toward zero).
    Parsed(i64),
    /// Empty or a missing-value marker; counts as zero.
    Missing,
    /// Not a number, or out of `i64` range; counts as zero.
    Invalid,
}

impl UnitsValue {
    /// Quantity to store in the map.
    pub fn quantity(self) -> i64 {
        match self {
            Self::Parsed(v) => v,
            Self::Missing | Self::Invalid => 0,
        }
    }
}

/// Coerce a raw `units` cell to an integer quantity.
///
/// Accepts plain integers, decimals (`"12.0"`, `"12.9"` → 12) and scientific
/// notation (`"1e3"`).
pub fn parse_units(raw: &str) -> UnitsValue {
    let s = raw.trim();
    if s.is_empty() || MISSING_MARKERS.contains(&s) {
        return UnitsValue::Missing;
    }

    if let Ok(v) = s.parse::<i64>() {
        return UnitsValue::Parsed(v);
    }

    let decimal = Decimal::from_str(s).or_else(|_| Decimal::from_scientific(s));
    match decimal.ok().and_then(|d| d.trunc().to_i64()) {
        Some(v) => UnitsValue::Parsed(v),
        None => UnitsValue::Invalid,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_units_integer() {
        assert_eq!(parse_units("10"), UnitsValue::Parsed(10));
        assert_eq!(parse_units(" 42 "), UnitsValue::Parsed(42));
        assert_eq!(parse_units("-3"), UnitsValue::Parsed(-3));
    }

    #[test]
    fn test_parse_units_fraction_truncates() {
        assert_eq!(parse_units("12.0"), UnitsValue::Parsed(12));
        assert_eq!(parse_units("12.9"), UnitsValue::Parsed(12));
        assert_eq!(parse_units("-2.5"), UnitsValue::Parsed(-2));
    }

    #[test]
    fn test_parse_units_scientific() {
        assert_eq!(parse_units("1e3"), UnitsValue::Parsed(1000));
    }

    #[test]
    fn test_parse_units_missing() {
        assert_eq!(parse_units(""), UnitsValue::Missing);
        assert_eq!(parse_units("NaN"), UnitsValue::Missing);
        assert_eq!(parse_units("   "), UnitsValue::Missing);
        assert_eq!(parse_units("").quantity(), 0);
    }

    #[test]
    fn test_parse_units_invalid() {
        assert_eq!(parse_units("ten"), UnitsValue::Invalid);
        assert_eq!(parse_units("ten").quantity(), 0);
    }

    #[test]
    fn test_last_write_wins() {
        let map: QuantityMap = vec![("A", 1), ("B", 2), ("A", 7)].into_iter().collect();
        assert_eq!(map.len(), 2);
        assert_eq!(map.get("A"), Some(7));
    }

    #[test]
    fn test_symbols_case_sensitive() {
        let map: QuantityMap = vec![("GOLDBEES", 5)].into_iter().collect();
        assert!(map.contains("GOLDBEES"));
        assert!(!map.contains("goldbees"));
    }
}
