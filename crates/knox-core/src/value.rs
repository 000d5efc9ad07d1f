//! Credential values.
//!
//! The registry stores every value as a string, but the CLI distinguishes
//! strings, integers, and floats so a value reads back with the type it was
//! written with. Inference is conservative: a raw string is only promoted to
//! a numeric type when its canonical numeric form is the exact input, so the
//! wire form always round-trips.

use std::fmt;

/// A credential value as accepted by the resolver.
#[derive(Debug, Clone, PartialEq)]
pub enum CredentialValue {
    /// UTF-8 string value.
    String(String),
    /// 64-bit signed integer.
    Int(i64),
    /// Finite 64-bit float.
    Float(f64),
    /// A cleared/unset value. Fails [`CredentialValue::is_defined`].
    Undefined,
}

impl CredentialValue {
    /// Parse a raw string, inferring the narrowest type that round-trips.
    ///
    /// Integers win over floats, floats over strings. Values like `"01"` or
    /// `"1.50"` stay strings, as do non-finite floats (`"NaN"`, `"inf"`).
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        if let Ok(i) = raw.parse::<i64>() {
            if i.to_string() == raw {
                return Self::Int(i);
            }
        }
        if let Ok(x) = raw.parse::<f64>() {
            if x.is_finite() && x.to_string() == raw {
                return Self::Float(x);
            }
        }
        Self::String(raw.to_owned())
    }

    /// Whether this value may be written to the registry.
    #[must_use]
    pub fn is_defined(&self) -> bool {
        !matches!(self, Self::Undefined)
    }

    /// Tag describing this value's type.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::String(_) => "string",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::Undefined => "undefined",
        }
    }
}

impl fmt::Display for CredentialValue {
    /// Canonical string form submitted to the registry.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String(s) => f.write_str(s),
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::Undefined => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_infers_round_tripping_types() {
        assert_eq!(CredentialValue::parse("42"), CredentialValue::Int(42));
        assert_eq!(CredentialValue::parse("-7"), CredentialValue::Int(-7));
        assert_eq!(CredentialValue::parse("1.5"), CredentialValue::Float(1.5));
        assert_eq!(
            CredentialValue::parse("hunter2"),
            CredentialValue::String("hunter2".to_owned())
        );
    }

    #[test]
    fn non_canonical_numerics_stay_strings() {
        assert_eq!(
            CredentialValue::parse("01"),
            CredentialValue::String("01".to_owned())
        );
        assert_eq!(
            CredentialValue::parse("1.50"),
            CredentialValue::String("1.50".to_owned())
        );
        assert_eq!(
            CredentialValue::parse("NaN"),
            CredentialValue::String("NaN".to_owned())
        );
        assert_eq!(
            CredentialValue::parse("inf"),
            CredentialValue::String("inf".to_owned())
        );
    }

    #[test]
    fn display_round_trips_raw_input() {
        for raw in ["42", "-7", "1.5", "01", "password with spaces", ""] {
            assert_eq!(CredentialValue::parse(raw).to_string(), raw);
        }
    }

    #[test]
    fn undefined_fails_the_predicate() {
        assert!(!CredentialValue::Undefined.is_defined());
        assert!(CredentialValue::parse("").is_defined());
        assert!(CredentialValue::Int(0).is_defined());
    }

    #[test]
    fn type_names_match_variants() {
        assert_eq!(CredentialValue::parse("x").type_name(), "string");
        assert_eq!(CredentialValue::parse("3").type_name(), "int");
        assert_eq!(CredentialValue::parse("3.5").type_name(), "float");
        assert_eq!(CredentialValue::Undefined.type_name(), "undefined");
    }
}
