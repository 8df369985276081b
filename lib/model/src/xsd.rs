//! Helpers for the XML Schema datatypes that can be compared inside SQL.

use oxrdf::vocab::xsd;
use oxrdf::{LiteralRef, NamedNodeRef};
use oxsdatatypes::{Boolean, Date, DateTime, Decimal, Double, Float, Integer, Time};
use std::str::FromStr;

/// The numeric type hierarchy used for type promotion.
///
/// The order of the variants is the promotion order: `Integer < Decimal < Float < Double`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum NumericType {
    Integer,
    Decimal,
    Float,
    Double,
}

impl NumericType {
    /// Returns the type that both `self` and `other` are promoted to.
    #[must_use]
    pub fn promote(self, other: NumericType) -> NumericType {
        self.max(other)
    }

    pub fn datatype(self) -> NamedNodeRef<'static> {
        match self {
            NumericType::Integer => xsd::INTEGER,
            NumericType::Decimal => xsd::DECIMAL,
            NumericType::Float => xsd::FLOAT,
            NumericType::Double => xsd::DOUBLE,
        }
    }

    /// Compares two lexical forms as values of this type.
    ///
    /// Returns `None` if one of them is not a valid lexical form.
    pub fn value_equals(self, left: &str, right: &str) -> Option<bool> {
        fn parse_eq<T: FromStr + PartialEq>(left: &str, right: &str) -> Option<bool> {
            Some(T::from_str(left).ok()? == T::from_str(right).ok()?)
        }

        match self {
            NumericType::Integer => parse_eq::<Integer>(left, right),
            NumericType::Decimal => parse_eq::<Decimal>(left, right),
            NumericType::Float => parse_eq::<Float>(left, right),
            NumericType::Double => parse_eq::<Double>(left, right),
        }
    }
}

/// Checks if the datatype is one of the integer datatypes.
pub fn is_integer_datatype(datatype: NamedNodeRef<'_>) -> bool {
    static INTEGER_DATATYPES: &[NamedNodeRef<'_>; 13] = &[
        xsd::INTEGER,
        xsd::BYTE,
        xsd::SHORT,
        xsd::INT,
        xsd::LONG,
        xsd::UNSIGNED_BYTE,
        xsd::UNSIGNED_SHORT,
        xsd::UNSIGNED_INT,
        xsd::UNSIGNED_LONG,
        xsd::POSITIVE_INTEGER,
        xsd::NEGATIVE_INTEGER,
        xsd::NON_POSITIVE_INTEGER,
        xsd::NON_NEGATIVE_INTEGER,
    ];
    INTEGER_DATATYPES.contains(&datatype)
}

/// Returns the position of `datatype` in the numeric type hierarchy.
pub fn numeric_type(datatype: NamedNodeRef<'_>) -> Option<NumericType> {
    if is_integer_datatype(datatype) {
        Some(NumericType::Integer)
    } else if datatype == xsd::DECIMAL {
        Some(NumericType::Decimal)
    } else if datatype == xsd::FLOAT {
        Some(NumericType::Float)
    } else if datatype == xsd::DOUBLE {
        Some(NumericType::Double)
    } else {
        None
    }
}

pub fn is_numeric_datatype(datatype: NamedNodeRef<'_>) -> bool {
    numeric_type(datatype).is_some()
}

/// Returns whether `literal` has a numeric datatype.
pub fn is_numeric_literal(literal: LiteralRef<'_>) -> bool {
    literal.language().is_none() && is_numeric_datatype(literal.datatype())
}

/// Returns whether values of `datatype` can be compared by the SQL backend.
///
/// `None` stands for plain literals.
pub fn is_comparable_in_sql(datatype: Option<NamedNodeRef<'_>>) -> bool {
    match datatype {
        None => true,
        Some(datatype) => {
            datatype == xsd::STRING || datatype == xsd::DATE_TIME || is_numeric_datatype(datatype)
        }
    }
}

/// Checks whether `value` is a valid lexical form of `datatype`.
///
/// Datatypes that are not validated always accept the value.
pub fn is_valid_lexical_form(datatype: NamedNodeRef<'_>, value: &str) -> bool {
    if is_integer_datatype(datatype) {
        Integer::from_str(value).is_ok()
    } else if datatype == xsd::DECIMAL {
        Decimal::from_str(value).is_ok()
    } else if datatype == xsd::FLOAT {
        Float::from_str(value).is_ok()
    } else if datatype == xsd::DOUBLE {
        Double::from_str(value).is_ok()
    } else if datatype == xsd::BOOLEAN {
        Boolean::from_str(value).is_ok()
    } else if datatype == xsd::DATE {
        Date::from_str(value).is_ok()
    } else if datatype == xsd::DATE_TIME {
        DateTime::from_str(value).is_ok()
    } else if datatype == xsd::TIME {
        Time::from_str(value).is_ok()
    } else {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_promotion() {
        assert_eq!(
            NumericType::Integer.promote(NumericType::Decimal),
            NumericType::Decimal
        );
        assert_eq!(
            NumericType::Double.promote(NumericType::Float),
            NumericType::Double
        );
        assert_eq!(numeric_type(xsd::INT), Some(NumericType::Integer));
        assert_eq!(numeric_type(xsd::STRING), None);
    }

    #[test]
    fn test_value_equals() {
        assert_eq!(NumericType::Decimal.value_equals("5", "5.0"), Some(true));
        assert_eq!(NumericType::Integer.value_equals("5", "6"), Some(false));
        assert_eq!(NumericType::Integer.value_equals("5", "abc"), None);
    }

    #[test]
    fn test_lexical_validation() {
        assert!(is_valid_lexical_form(xsd::DATE, "2002-04-01"));
        assert!(!is_valid_lexical_form(xsd::DATE, "2002-13-01"));
        assert!(is_valid_lexical_form(xsd::BOOLEAN, "true"));
        assert!(!is_valid_lexical_form(xsd::BOOLEAN, "yes"));
        assert!(is_valid_lexical_form(xsd::ANY_URI, "anything"));
    }

    #[test]
    fn test_comparable_in_sql() {
        assert!(is_comparable_in_sql(None));
        assert!(is_comparable_in_sql(Some(xsd::DATE_TIME)));
        assert!(!is_comparable_in_sql(Some(xsd::DATE)));
    }
}
