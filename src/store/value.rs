//! Loose comparison of record values.
//!
//! Records are schema-free, so a WHERE clause routinely compares values of
//! different JSON types (`"42"` against `42`, `true` against `1`). These
//! helpers follow ECMAScript abstract equality and abstract relational
//! comparison so that such comparisons behave the same way the data's
//! producers expect.

use std::borrow::Cow;
use std::cmp::Ordering;

use serde_json::{Map, Value};

/// Borrowed view of a record field, including the "field is absent" case.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Comparable<'a> {
    /// The record has no such field.
    Undefined,
    Null,
    Bool(bool),
    Number(f64),
    String(&'a str),
    Array(&'a [Value]),
    Object(&'a Map<String, Value>),
}

impl<'a> From<&'a Value> for Comparable<'a> {
    fn from(value: &'a Value) -> Self {
        match value {
            Value::Null => Comparable::Null,
            Value::Bool(b) => Comparable::Bool(*b),
            Value::Number(n) => Comparable::Number(n.as_f64().unwrap_or(f64::NAN)),
            Value::String(s) => Comparable::String(s),
            Value::Array(items) => Comparable::Array(items),
            Value::Object(map) => Comparable::Object(map),
        }
    }
}

impl<'a> From<Option<&'a Value>> for Comparable<'a> {
    fn from(value: Option<&'a Value>) -> Self {
        value.map(Comparable::from).unwrap_or(Comparable::Undefined)
    }
}

/// Result of converting a value to a primitive (arrays and objects become strings).
#[derive(Debug, Clone)]
enum Primitive<'a> {
    Undefined,
    Null,
    Bool(bool),
    Number(f64),
    String(Cow<'a, str>),
}

impl<'a> Comparable<'a> {
    fn to_primitive(self) -> Primitive<'a> {
        match self {
            Comparable::Undefined => Primitive::Undefined,
            Comparable::Null => Primitive::Null,
            Comparable::Bool(b) => Primitive::Bool(b),
            Comparable::Number(n) => Primitive::Number(n),
            Comparable::String(s) => Primitive::String(Cow::Borrowed(s)),
            Comparable::Array(items) => Primitive::String(Cow::Owned(join_array(items))),
            Comparable::Object(_) => Primitive::String(Cow::Borrowed("[object Object]")),
        }
    }

    /// String form of the value, as used by string membership tests.
    pub(crate) fn to_js_string(self) -> Cow<'a, str> {
        match self.to_primitive() {
            Primitive::Undefined => Cow::Borrowed("undefined"),
            Primitive::Null => Cow::Borrowed("null"),
            Primitive::Bool(true) => Cow::Borrowed("true"),
            Primitive::Bool(false) => Cow::Borrowed("false"),
            Primitive::Number(n) => Cow::Owned(number_to_string(n)),
            Primitive::String(s) => s,
        }
    }
}

impl Primitive<'_> {
    fn to_number(&self) -> f64 {
        match self {
            Primitive::Undefined => f64::NAN,
            Primitive::Null => 0.0,
            Primitive::Bool(b) => {
                if *b {
                    1.0
                } else {
                    0.0
                }
            }
            Primitive::Number(n) => *n,
            Primitive::String(s) => string_to_number(s),
        }
    }
}

/// Abstract (`==`) equality.
pub(crate) fn loose_eq(left: Comparable<'_>, right: Comparable<'_>) -> bool {
    use Comparable::{Array, Object};

    match (left, right) {
        // A record field and a condition value are never the same object.
        (Array(_) | Object(_), Array(_) | Object(_)) => false,
        _ => primitive_eq(&left.to_primitive(), &right.to_primitive()),
    }
}

fn primitive_eq(left: &Primitive<'_>, right: &Primitive<'_>) -> bool {
    use Primitive::*;

    match (left, right) {
        (Undefined | Null, Undefined | Null) => true,
        (Undefined | Null, _) | (_, Undefined | Null) => false,
        (String(a), String(b)) => a == b,
        (Bool(a), Bool(b)) => a == b,
        // Mixed number / string / bool comparisons go through numeric conversion.
        _ => left.to_number() == right.to_number(),
    }
}

/// Abstract relational comparison. `None` when the operands are unordered
/// (either side converts to `NaN`), which makes every ordering operator false.
pub(crate) fn loose_cmp(left: Comparable<'_>, right: Comparable<'_>) -> Option<Ordering> {
    let (left, right) = (left.to_primitive(), right.to_primitive());

    // Strings order by UTF-16 code units, not by code points.
    if let (Primitive::String(a), Primitive::String(b)) = (&left, &right) {
        return Some(a.encode_utf16().cmp(b.encode_utf16()));
    }

    left.to_number().partial_cmp(&right.to_number())
}

/// Membership test behind `IN` / `NOT_IN`.
///
/// Arrays are searched with strict equality, strings with a substring test on
/// the needle's string form. Any other container yields `None`.
pub(crate) fn includes(container: Comparable<'_>, needle: &Value) -> Option<bool> {
    match container {
        Comparable::Array(items) => Some(items.iter().any(|item| same_value_zero(item, needle))),
        Comparable::String(haystack) => {
            Some(haystack.contains(Comparable::from(needle).to_js_string().as_ref()))
        }
        _ => None,
    }
}

fn same_value_zero(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Null, Value::Null) => true,
        (Value::Bool(a), Value::Bool(b)) => a == b,
        (Value::Number(a), Value::Number(b)) => a.as_f64() == b.as_f64(),
        (Value::String(a), Value::String(b)) => a == b,
        _ => false,
    }
}

fn join_array(items: &[Value]) -> String {
    items
        .iter()
        .map(|item| match item {
            Value::Null => Cow::Borrowed(""),
            other => Comparable::from(other).to_js_string(),
        })
        .collect::<Vec<_>>()
        .join(",")
}

/// ECMAScript `Number::toString`: shortest round-trip digits, positional
/// notation for decimal exponents in `[-7, 21)`, exponent form outside it.
fn number_to_string(n: f64) -> String {
    if n.is_nan() {
        return "NaN".to_string();
    }
    if n == f64::INFINITY {
        return "Infinity".to_string();
    }
    if n == f64::NEG_INFINITY {
        return "-Infinity".to_string();
    }
    if n == 0.0 {
        return "0".to_string();
    }

    let sign = if n < 0.0 { "-" } else { "" };
    let scientific = format!("{:e}", n.abs());
    let Some((mantissa, exponent)) = scientific.split_once('e') else {
        return format!("{}", n);
    };
    let digits: String = mantissa.chars().filter(|c| *c != '.').collect();
    let Ok(exponent) = exponent.parse::<i32>() else {
        return format!("{}", n);
    };

    let k = digits.len() as i32;
    // Position of the decimal point relative to the first digit.
    let point = exponent + 1;

    let body = if k <= point && point <= 21 {
        format!("{}{}", digits, "0".repeat((point - k) as usize))
    } else if 0 < point && point <= 21 {
        let (int, frac) = digits.split_at(point as usize);
        format!("{}.{}", int, frac)
    } else if -6 < point && point <= 0 {
        format!("0.{}{}", "0".repeat(point.unsigned_abs() as usize), digits)
    } else {
        let (first, rest) = digits.split_at(1);
        let exp_sign = if exponent < 0 { '-' } else { '+' };
        if rest.is_empty() {
            format!("{}e{}{}", first, exp_sign, exponent.unsigned_abs())
        } else {
            format!("{}.{}e{}{}", first, rest, exp_sign, exponent.unsigned_abs())
        }
    };

    format!("{}{}", sign, body)
}

fn string_to_number(s: &str) -> f64 {
    let s = s.trim();

    if s.is_empty() {
        return 0.0;
    }

    match s {
        "Infinity" | "+Infinity" => return f64::INFINITY,
        "-Infinity" => return f64::NEG_INFINITY,
        _ => {}
    }

    let radix = match s.get(..2) {
        Some("0x") | Some("0X") => Some(16),
        Some("0o") | Some("0O") => Some(8),
        Some("0b") | Some("0B") => Some(2),
        _ => None,
    };

    if let Some(radix) = radix {
        let digits = &s[2..];
        if digits.is_empty() {
            return f64::NAN;
        }
        return digits.chars().try_fold(0.0_f64, |acc, c| {
            c.to_digit(radix).map(|d| acc * radix as f64 + d as f64)
        })
        .unwrap_or(f64::NAN);
    }

    // Rust's float parser also accepts "inf" and "nan", which are not numeric literals here.
    if !s.chars().all(|c| c.is_ascii_digit() || matches!(c, '.' | 'e' | 'E' | '+' | '-')) {
        return f64::NAN;
    }

    s.parse::<f64>().unwrap_or(f64::NAN)
}
