use regex::Regex;
use serde::Serialize;
use serde_json::{Map, Value};
use std::sync::LazyLock;

static EMAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^[A-Za-z0-9.!#$%&'*+/=?^_`{|}~-]+@[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?)+$",
    )
    .expect("email pattern is valid")
});

/// A single rejected field
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

#[derive(Debug, Clone, Copy)]
pub enum Rule {
    NonEmpty,
    IntRange { min: i64, max: i64 },
    Email,
}

#[derive(Debug, Clone, Copy)]
pub struct FieldRule {
    pub field: &'static str,
    pub rule: Rule,
    /// Only checked when the field is present in the body.
    pub optional: bool,
}

impl FieldRule {
    pub const fn required(field: &'static str, rule: Rule) -> Self {
        Self { field, rule, optional: false }
    }

    pub const fn optional(field: &'static str, rule: Rule) -> Self {
        Self { field, rule, optional: true }
    }

    fn check(&self, value: Option<&Value>) -> Option<FieldError> {
        let value = match value {
            None if self.optional => return None,
            None => return Some(self.error(format!("{} is required", self.field))),
            Some(value) => value,
        };

        match self.rule {
            Rule::NonEmpty => match value.as_str() {
                Some(s) if !s.trim().is_empty() => None,
                _ => Some(self.error(format!("{} is required", self.field))),
            },
            Rule::IntRange { min, max } => match as_integer(value) {
                Some(n) if (min..=max).contains(&n) => None,
                _ => Some(self.error(format!(
                    "{} must be an integer between {min} and {max}",
                    self.field
                ))),
            },
            Rule::Email => match value.as_str() {
                Some(s) if is_email(s) => None,
                _ => Some(self.error(format!("{} must be a valid email", self.field))),
            },
        }
    }

    fn error(&self, message: String) -> FieldError {
        FieldError {
            field: self.field.to_string(),
            message,
        }
    }
}

const RATING: Rule = Rule::IntRange { min: 0, max: 5 };

pub const CREATE_REVIEW: &[FieldRule] = &[
    FieldRule::required("foodName", Rule::NonEmpty),
    FieldRule::required("foodImage", Rule::NonEmpty),
    FieldRule::required("restaurantName", Rule::NonEmpty),
    FieldRule::required("rating", RATING),
    FieldRule::required("userEmail", Rule::Email),
];

pub const UPDATE_REVIEW: &[FieldRule] = &[
    FieldRule::optional("foodName", Rule::NonEmpty),
    FieldRule::optional("foodImage", Rule::NonEmpty),
    FieldRule::optional("restaurantName", Rule::NonEmpty),
    FieldRule::optional("rating", RATING),
    FieldRule::optional("userEmail", Rule::Email),
];

pub const CREATE_FAVORITE: &[FieldRule] = &[
    FieldRule::required("userEmail", Rule::Email),
    FieldRule::required("reviewId", Rule::NonEmpty),
];

/// Check `body` against every rule, collecting all violations.
pub fn validate(body: &Map<String, Value>, rules: &[FieldRule]) -> Result<(), Vec<FieldError>> {
    let errors: Vec<FieldError> = rules
        .iter()
        .filter_map(|rule| rule.check(body.get(rule.field)))
        .collect();

    if errors.is_empty() { Ok(()) } else { Err(errors) }
}

pub fn is_email(candidate: &str) -> bool {
    EMAIL.is_match(candidate)
}

/// Integers may arrive as JSON numbers (`4`, `4.0`) or as strings such as `"4"`.
fn as_integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.fract() == 0.0 && f.abs() <= i64::MAX as f64)
                .map(|f| f as i64)
        }),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}
