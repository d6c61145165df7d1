//! Structural validation of bound parameters.
//!
//! The dispatcher reads back every bindable field that has a read accessor
//! and hands the values to a [`Validator`]. [`RuleValidator`] reads a
//! comma-separated rule list from the configured tag (`validate` by
//! default), e.g. `#[validate("required,gte=100,lte=999")]`.
//!
//! Supported rules: `required`, `omitempty`, `gt`, `gte`, `lt`, `lte`,
//! `min`, `max`, `len`, `eq`, `ne`, `oneof`, `alpha`, `alphanum`,
//! `numeric`, `email`, `url` and `uuid`. Comparisons apply to the numeric
//! value of numbers and to the length of strings, arrays and objects.

use crate::tag::Tags;
use daedalus_config::DEFAULT_VALIDATOR_TAG;
use regex::Regex;
use serde_json::Value;
use std::fmt;
use std::sync::OnceLock;

/// One field handed to a validator.
#[derive(Debug, Clone)]
pub struct FieldValue<'a> {
    /// Name reported in violations.
    pub name: &'a str,
    /// Raw tags of the field.
    pub tags: Tags,
    /// Current value of the field.
    pub value: Value,
    /// Rules on members of the value.
    pub members: &'a [MemberRule],
}

/// Rule tags of one member of a structured value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberRule {
    /// Dotted member path relative to the field, e.g. `address.city`.
    pub path: String,
    /// Raw tags of the member.
    pub tags: Tags,
}

impl MemberRule {
    /// Creates a rule for the member at `path`.
    pub fn new(path: impl Into<String>, tags: Tags) -> Self {
        Self {
            path: path.into(),
            tags,
        }
    }

    /// The same rule, addressed from the enclosing member `parent`.
    #[must_use]
    pub fn under(self, parent: &str) -> Self {
        Self {
            path: format!("{parent}.{}", self.path),
            tags: self.tags,
        }
    }
}

/// Structured types carrying member rules.
///
/// Derived with `#[derive(Validate)]`:
///
/// ```rust,ignore
/// #[derive(Default, Deserialize, Serialize, Validate)]
/// struct Account {
///     #[validate("required,email")]
///     email: String,
///     #[daedalus(nested)]
///     address: Address,
/// }
/// ```
pub trait Validate {
    /// Rules of every checked member, nested members included.
    fn member_rules() -> Vec<MemberRule>;
}

/// A failed rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// Field name.
    pub field: String,
    /// Rule name.
    pub rule: String,
    /// Rule parameter, possibly empty.
    pub param: String,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Field validation for '{}' failed on the '{}' tag", self.field, self.rule)
    }
}

/// All violations found in one aggregate.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    violations: Vec<Violation>,
}

impl ValidationErrors {
    /// Records a violation.
    pub fn push(&mut self, violation: Violation) {
        self.violations.push(violation);
    }

    /// The recorded violations.
    pub fn violations(&self) -> &[Violation] {
        &self.violations
    }

    /// `true` when nothing failed.
    pub fn is_empty(&self) -> bool {
        self.violations.is_empty()
    }
}

impl Extend<Violation> for ValidationErrors {
    fn extend<I: IntoIterator<Item = Violation>>(&mut self, iter: I) {
        self.violations.extend(iter);
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, v) in self.violations.iter().enumerate() {
            if i > 0 {
                f.write_str("\n")?;
            }
            write!(f, "{v}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

/// Validates an assembled parameter aggregate.
pub trait Validator: Send + Sync + 'static {
    /// Checks every field, returning all violations.
    fn validate(&self, fields: &[FieldValue<'_>]) -> Result<(), ValidationErrors>;
}

/// Rule-list validator driven by a field tag.
#[derive(Debug, Clone)]
pub struct RuleValidator {
    tag: String,
}

impl RuleValidator {
    /// Reads rules from the tag called `tag`.
    pub fn new(tag: impl Into<String>) -> Self {
        Self { tag: tag.into() }
    }

    /// The tag rules are read from.
    pub fn tag(&self) -> &str {
        &self.tag
    }

    fn check_value(&self, name: &str, tags: Tags, value: &Value) -> Option<Violation> {
        let raw = tags.lookup(&self.tag)?;
        let rules: Vec<(&str, &str)> = raw
            .split(',')
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .map(|r| r.split_once('=').map_or((r, ""), |(n, p)| (n.trim(), p.trim())))
            .collect();

        let zero = is_zero(value);
        if zero && rules.iter().any(|(n, _)| *n == "omitempty") {
            return None;
        }

        for (rule, param) in rules {
            let ok = match rule {
                "omitempty" => true,
                "required" => !zero,
                _ if value.is_null() => true,
                _ => match passes(rule, param, value) {
                    Some(ok) => ok,
                    None => {
                        tracing::warn!(rule, field = name, "unknown validation rule ignored");
                        true
                    }
                },
            };
            if !ok {
                return Some(Violation {
                    field: name.to_string(),
                    rule: rule.to_string(),
                    param: param.to_string(),
                });
            }
        }
        None
    }

    /// Follows `path` below `value`, checking the member it ends at.
    fn check_member(&self, name: &str, path: &[&str], tags: Tags, value: &Value, errors: &mut ValidationErrors) {
        match value {
            Value::Array(items) => {
                for (i, item) in items.iter().enumerate() {
                    self.check_member(&format!("{name}[{i}]"), path, tags, item, errors);
                }
            }
            Value::Object(map) => {
                let Some((head, rest)) = path.split_first() else {
                    return;
                };
                let name = format!("{name}.{head}");
                let member = map.get(*head).unwrap_or(&NULL);
                if rest.is_empty() {
                    errors.extend(self.check_value(&name, tags, member));
                } else {
                    self.check_member(&name, rest, tags, member, errors);
                }
            }
            _ => {}
        }
    }
}

impl Default for RuleValidator {
    fn default() -> Self {
        Self::new(DEFAULT_VALIDATOR_TAG)
    }
}

impl Validator for RuleValidator {
    fn validate(&self, fields: &[FieldValue<'_>]) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::default();
        for field in fields {
            errors.extend(self.check_value(field.name, field.tags, &field.value));
            for member in field.members {
                let path: Vec<&str> = member.path.split('.').collect();
                self.check_member(field.name, &path, member.tags, &field.value, &mut errors);
            }
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

static NULL: Value = Value::Null;

fn is_zero(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
    }
}

/// Number value, or length for strings and containers.
fn measure(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => Some(s.chars().count() as f64),
        Value::Array(a) => Some(a.len() as f64),
        Value::Object(o) => Some(o.len() as f64),
        Value::Bool(_) | Value::Null => None,
    }
}

fn as_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn compare(value: &Value, param: &str, cmp: fn(f64, f64) -> bool) -> bool {
    match (measure(value), param.parse::<f64>()) {
        (Some(actual), Ok(limit)) => cmp(actual, limit),
        _ => false,
    }
}

fn equals(value: &Value, param: &str) -> bool {
    match value {
        Value::String(s) => s == param,
        Value::Bool(b) => param.parse::<bool>().map_or(false, |p| p == *b),
        other => compare(other, param, |a, b| (a - b).abs() < f64::EPSILON),
    }
}

fn matches_pattern(value: &Value, pattern: &Regex) -> bool {
    value.as_str().map_or(false, |s| pattern.is_match(s))
}

macro_rules! pattern {
    ($name:ident, $re:expr) => {
        fn $name() -> &'static Regex {
            static PATTERN: OnceLock<Regex> = OnceLock::new();
            PATTERN.get_or_init(|| Regex::new($re).expect("valid regex"))
        }
    };
}

pattern!(alpha, r"^[a-zA-Z]+$");
pattern!(alphanum, r"^[a-zA-Z0-9]+$");
pattern!(numeric, r"^[-+]?[0-9]+(?:\.[0-9]+)?$");
pattern!(email, r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$");
pattern!(url, r"^https?://[^\s/$.?#].[^\s]*$");
pattern!(
    uuid,
    r"^[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}$"
);

/// Evaluates one rule; `None` for unknown rules.
fn passes(rule: &str, param: &str, value: &Value) -> Option<bool> {
    Some(match rule {
        "gt" => compare(value, param, |a, b| a > b),
        "gte" | "min" => compare(value, param, |a, b| a >= b),
        "lt" => compare(value, param, |a, b| a < b),
        "lte" | "max" => compare(value, param, |a, b| a <= b),
        "len" => compare(value, param, |a, b| (a - b).abs() < f64::EPSILON),
        "eq" => equals(value, param),
        "ne" => !equals(value, param),
        "oneof" => as_text(value).map_or(false, |text| param.split_whitespace().any(|p| p == text)),
        "alpha" => matches_pattern(value, alpha()),
        "alphanum" => matches_pattern(value, alphanum()),
        "numeric" => match value {
            Value::Number(_) => true,
            other => matches_pattern(other, numeric()),
        },
        "email" => matches_pattern(value, email()),
        "url" => matches_pattern(value, url()),
        "uuid" => matches_pattern(value, uuid()),
        _ => return None,
    })
}
