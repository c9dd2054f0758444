//! Declarative field validation.
//!
//! Each validated type publishes a static rule table (`field -> ordered rules`)
//! and a field accessor. [`Validator`] walks the table, evaluating every field
//! and stopping at the first broken rule of each field, so a request gets one
//! failure per offending field.

use regex::Regex;

use crate::contract::model::{
    AccountPatch, NewAccount, PasswordChange, ValidationFailure, ValidationFailures,
};

/// Minimum password length, in characters.
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// A single rule attached to a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    /// Value is not the type's zero/empty value.
    Required,
    /// Value is an email address.
    Email,
    /// String has at least N characters (numbers: value >= N).
    Min(usize),
    /// Value equals the named sibling field.
    EqField(&'static str),
}

impl Rule {
    /// Rule name as reported in a [`ValidationFailure`].
    pub fn tag(&self) -> &'static str {
        match self {
            Rule::Required => "required",
            Rule::Email => "email",
            Rule::Min(_) => "min",
            Rule::EqField(_) => "eqfield",
        }
    }
}

/// Ordered `(field, rules)` pairs.
pub type RuleTable = &'static [(&'static str, &'static [Rule])];

/// A borrowed field value handed to the rule functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldValue<'a> {
    Str(&'a str),
    Int(i64),
}

impl FieldValue<'_> {
    fn is_zero(&self) -> bool {
        match self {
            FieldValue::Str(s) => s.is_empty(),
            FieldValue::Int(n) => *n == 0,
        }
    }
}

/// Implemented by every input the service validates.
pub trait Validate {
    const RULES: RuleTable;

    /// Value of `name`, or `None` if this type does not carry that field.
    fn field(&self, name: &str) -> Option<FieldValue<'_>>;
}

// Local part: atoms joined by single dots. Domain: at least two dot-separated
// labels, each starting and ending with an alphanumeric. Letters include the
// BMP ranges allowed in internationalized addresses.
const EMAIL_PATTERN: &str = concat!(
    r"^[A-Za-z0-9!#$%&'*+/=?^_`{|}~\-\u{00A0}-\u{D7FF}\u{F900}-\u{FDCF}\u{FDF0}-\u{FFEF}]+",
    r"(?:\.[A-Za-z0-9!#$%&'*+/=?^_`{|}~\-\u{00A0}-\u{D7FF}\u{F900}-\u{FDCF}\u{FDF0}-\u{FFEF}]+)*",
    r"@",
    r"(?:[A-Za-z0-9\u{00A0}-\u{D7FF}\u{F900}-\u{FDCF}\u{FDF0}-\u{FFEF}]",
    r"(?:[A-Za-z0-9\-\u{00A0}-\u{D7FF}\u{F900}-\u{FDCF}\u{FDF0}-\u{FFEF}]*[A-Za-z0-9\u{00A0}-\u{D7FF}\u{F900}-\u{FDCF}\u{FDF0}-\u{FFEF}])?\.)+",
    r"[A-Za-z\u{00A0}-\u{D7FF}\u{F900}-\u{FDCF}\u{FDF0}-\u{FFEF}]",
    r"(?:[A-Za-z0-9\-\u{00A0}-\u{D7FF}\u{F900}-\u{FDCF}\u{FDF0}-\u{FFEF}]*[A-Za-z0-9\u{00A0}-\u{D7FF}\u{F900}-\u{FDCF}\u{FDF0}-\u{FFEF}])?$",
);

/// Rule evaluator. Build once and share; it owns the compiled email grammar.
#[derive(Debug, Clone)]
pub struct Validator {
    email: Regex,
}

impl Default for Validator {
    fn default() -> Self {
        Self::new()
    }
}

impl Validator {
    /// # Panics
    /// Never in practice: the email pattern is a literal exercised by the unit tests.
    pub fn new() -> Self {
        Self {
            email: Regex::new(EMAIL_PATTERN).expect("email pattern must compile"),
        }
    }

    /// Validate every field in `T::RULES`.
    pub fn validate<T: Validate>(&self, input: &T) -> Result<(), ValidationFailures> {
        self.run(input, |_| true)
    }

    /// Validate only the named fields; the rest of the table is skipped.
    pub fn validate_partial<T: Validate>(
        &self,
        input: &T,
        fields: &[&str],
    ) -> Result<(), ValidationFailures> {
        self.run(input, |name| fields.iter().any(|f| *f == name))
    }

    fn run<T: Validate>(
        &self,
        input: &T,
        include: impl Fn(&str) -> bool,
    ) -> Result<(), ValidationFailures> {
        let failures: Vec<ValidationFailure> = T::RULES
            .iter()
            .filter(|entry| include(entry.0))
            .filter_map(|&(name, rules)| {
                let value = input.field(name)?;
                rules
                    .iter()
                    .find(|rule| !self.check(**rule, value, input))
                    .map(|rule| ValidationFailure {
                        field: name,
                        rule: rule.tag(),
                    })
            })
            .collect();

        if failures.is_empty() {
            Ok(())
        } else {
            Err(ValidationFailures::new(failures))
        }
    }

    fn check<T: Validate>(&self, rule: Rule, value: FieldValue<'_>, input: &T) -> bool {
        match (rule, value) {
            (Rule::Required, v) => !v.is_zero(),
            (Rule::Email, FieldValue::Str(s)) => self.email.is_match(s),
            (Rule::Email, FieldValue::Int(_)) => false,
            (Rule::Min(n), FieldValue::Str(s)) => s.chars().count() >= n,
            (Rule::Min(n), FieldValue::Int(i)) => i64::try_from(n).is_ok_and(|n| i >= n),
            (Rule::EqField(other), v) => input.field(other) == Some(v),
        }
    }
}

// -------- rule tables --------

/// Rules of the account record. `id` is assigned by storage, so create and
/// update validate a subset of this table.
pub const ACCOUNT_RULES: RuleTable = &[
    ("id", &[Rule::Required]),
    ("username", &[Rule::Required]),
    ("email", &[Rule::Required, Rule::Email]),
    ("password", &[Rule::Required, Rule::Min(MIN_PASSWORD_LENGTH)]),
];

pub const CREATE_FIELDS: &[&str] = &["username", "email", "password"];
pub const UPDATE_FIELDS: &[&str] = &["username", "email"];

impl Validate for NewAccount {
    const RULES: RuleTable = ACCOUNT_RULES;

    fn field(&self, name: &str) -> Option<FieldValue<'_>> {
        match name {
            "username" => Some(FieldValue::Str(&self.username)),
            "email" => Some(FieldValue::Str(&self.email)),
            "password" => Some(FieldValue::Str(&self.password)),
            _ => None,
        }
    }
}

impl Validate for AccountPatch {
    const RULES: RuleTable = ACCOUNT_RULES;

    fn field(&self, name: &str) -> Option<FieldValue<'_>> {
        match name {
            "username" => Some(FieldValue::Str(&self.username)),
            "email" => Some(FieldValue::Str(&self.email)),
            _ => None,
        }
    }
}

impl Validate for PasswordChange {
    const RULES: RuleTable = &[
        ("current_password", &[Rule::Required]),
        (
            "new_password",
            &[Rule::Required, Rule::Min(MIN_PASSWORD_LENGTH)],
        ),
        (
            "confirm_password",
            &[Rule::Required, Rule::EqField("new_password")],
        ),
    ];

    fn field(&self, name: &str) -> Option<FieldValue<'_>> {
        match name {
            "current_password" => Some(FieldValue::Str(&self.current_password)),
            "new_password" => Some(FieldValue::Str(&self.new_password)),
            "confirm_password" => Some(FieldValue::Str(&self.confirm_password)),
            _ => None,
        }
    }
}
