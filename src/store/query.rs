//! WHERE specifications and the predicate fold.
//!
//! A [`Where`] is an ordered list of `field -> Condition` clauses. It is
//! evaluated against one record by folding left to right:
//!
//! ```text
//! acc = eval(clause[0])                       // clause[0].conjunction is ignored
//! acc = acc OR  eval(clause[i])               // clause[i].conjunction == Or
//! acc = acc AND eval(clause[i])               // anything else
//! ```
//!
//! The fold is deliberately not commutative: each clause's own conjunction
//! decides how it joins everything to its left, so reordering clauses that mix
//! `AND` and `OR` can change the result. Callers own the clause order.
//!
//! # JSON shape
//!
//! ```text
//! { "<field>": { "operator": "=", "condition": "AND", "value": <any> }, ... }
//! ```
//!
//! `operator` defaults to `=`, `condition` to `AND`, `value` to `null`.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::error::{StoreError, StoreResult};
use crate::store::value::{includes, loose_cmp, loose_eq, Comparable};
use crate::store::Record;

/// Comparison applied between `record[field]` and the condition value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Operator {
    /// `=`: loose equality.
    #[default]
    Eq,
    /// `>`
    Gt,
    /// `>=`
    Gte,
    /// `<`
    Lt,
    /// `<=`
    Lte,
    /// `IN`: the field (array or string) contains the value.
    In,
    /// `NOT_IN`: negation of `IN`.
    NotIn,
}

impl Operator {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::Eq => "=",
            Operator::Gt => ">",
            Operator::Gte => ">=",
            Operator::Lt => "<",
            Operator::Lte => "<=",
            Operator::In => "IN",
            Operator::NotIn => "NOT_IN",
        }
    }
}

impl FromStr for Operator {
    type Err = StoreError;

    /// Operator names are matched case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "=" => Ok(Operator::Eq),
            ">" => Ok(Operator::Gt),
            ">=" => Ok(Operator::Gte),
            "<" => Ok(Operator::Lt),
            "<=" => Ok(Operator::Lte),
            "IN" => Ok(Operator::In),
            "NOT_IN" => Ok(Operator::NotIn),
            _ => Err(StoreError::InvalidOperator(s.to_string())),
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a clause joins the accumulated result of the clauses before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Conjunction {
    #[default]
    And,
    Or,
}

impl From<&str> for Conjunction {
    /// `OR` in any case selects [`Conjunction::Or`]; every other name is `AND`.
    fn from(s: &str) -> Self {
        if s.eq_ignore_ascii_case("OR") {
            Conjunction::Or
        } else {
            Conjunction::And
        }
    }
}

/// A single `field -> condition` entry of a WHERE specification.
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    pub operator: Operator,
    pub conjunction: Conjunction,
    pub value: Value,
}

impl Condition {
    pub fn new(operator: Operator, value: impl Into<Value>) -> Self {
        Self {
            operator,
            conjunction: Conjunction::And,
            value: value.into(),
        }
    }

    /// Shorthand for an `=` condition.
    pub fn equals(value: impl Into<Value>) -> Self {
        Self::new(Operator::Eq, value)
    }

    /// Join this clause to the preceding ones with OR.
    pub fn or(mut self) -> Self {
        self.conjunction = Conjunction::Or;
        self
    }

    /// Evaluate the operator for `record[field]`.
    pub fn evaluate(&self, field: &str, record: &Record) -> StoreResult<bool> {
        let left = Comparable::from(record.get(field));
        let right = Comparable::from(&self.value);

        let result = match self.operator {
            Operator::Eq => loose_eq(left, right),
            Operator::Gt => matches!(loose_cmp(left, right), Some(Ordering::Greater)),
            Operator::Gte => matches!(
                loose_cmp(left, right),
                Some(Ordering::Greater | Ordering::Equal)
            ),
            Operator::Lt => matches!(loose_cmp(left, right), Some(Ordering::Less)),
            Operator::Lte => matches!(
                loose_cmp(left, right),
                Some(Ordering::Less | Ordering::Equal)
            ),
            Operator::In => self.membership(field, left)?,
            Operator::NotIn => !self.membership(field, left)?,
        };

        Ok(result)
    }

    fn membership(&self, field: &str, container: Comparable<'_>) -> StoreResult<bool> {
        includes(container, &self.value).ok_or_else(|| StoreError::NonIterableMembershipTest {
            field: field.to_string(),
        })
    }

    fn from_value(field: &str, value: &Value) -> StoreResult<Self> {
        let spec = value.as_object().ok_or_else(|| {
            StoreError::InvalidWhere(format!("condition for '{}' must be an object", field))
        })?;

        let operator = match spec.get("operator") {
            None | Some(Value::Null) => Operator::default(),
            Some(Value::String(name)) => name.parse()?,
            Some(other) => {
                return Err(StoreError::InvalidWhere(format!(
                    "operator for '{}' must be a string, got {}",
                    field, other
                )))
            }
        };

        let conjunction = match spec.get("condition") {
            None | Some(Value::Null) => Conjunction::default(),
            Some(Value::String(name)) => Conjunction::from(name.as_str()),
            Some(other) => {
                return Err(StoreError::InvalidWhere(format!(
                    "condition for '{}' must be a string, got {}",
                    field, other
                )))
            }
        };

        Ok(Self {
            operator,
            conjunction,
            value: spec.get("value").cloned().unwrap_or(Value::Null),
        })
    }
}

/// Ordered WHERE specification.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Where {
    clauses: Vec<(String, Condition)>,
}

impl Where {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a clause, builder style. See [`Where::insert`].
    pub fn field(mut self, name: impl Into<String>, condition: Condition) -> Self {
        self.insert(name, condition);
        self
    }

    /// Add a clause for `name`. A field that is already present keeps its
    /// position and only has its condition replaced.
    pub fn insert(&mut self, name: impl Into<String>, condition: Condition) {
        let name = name.into();
        match self.clauses.iter_mut().find(|(field, _)| *field == name) {
            Some((_, existing)) => *existing = condition,
            None => self.clauses.push((name, condition)),
        }
    }

    pub fn len(&self) -> usize {
        self.clauses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Condition)> {
        self.clauses.iter().map(|(field, condition)| (field.as_str(), condition))
    }

    /// Parse the JSON form, keeping key order.
    pub fn from_value(value: &Value) -> StoreResult<Self> {
        let map = value
            .as_object()
            .ok_or_else(|| StoreError::InvalidWhere("expected a JSON object".to_string()))?;

        let mut spec = Where::new();
        for (field, condition) in map {
            spec.insert(field.clone(), Condition::from_value(field, condition)?);
        }

        Ok(spec)
    }

    /// Fold every clause over `record`.
    ///
    /// All clauses are evaluated even when the outcome is already decided, so
    /// a membership test on a non-iterable field fails consistently. An empty
    /// specification matches nothing.
    pub fn matches(&self, record: &Record) -> StoreResult<bool> {
        let mut acc: Option<bool> = None;

        for (field, condition) in &self.clauses {
            let result = condition.evaluate(field, record)?;

            acc = Some(match acc {
                None => result,
                Some(prev) => match condition.conjunction {
                    Conjunction::Or => prev || result,
                    Conjunction::And => prev && result,
                },
            });
        }

        Ok(acc.unwrap_or(false))
    }
}

impl<'de> Deserialize<'de> for Where {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Where::from_value(&value).map_err(serde::de::Error::custom)
    }
}
