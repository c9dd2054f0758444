use std::fmt;

/// Public view of an account for inter-module communication (no password hash).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountProfile {
    pub id: i64,
    pub username: String,
    pub email: String,
}

/// Data for creating a new account. `password` is plaintext and is hashed before storage.
#[derive(Clone, PartialEq, Eq, Default)]
pub struct NewAccount {
    pub username: String,
    pub email: String,
    pub password: String,
}

impl fmt::Debug for NewAccount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NewAccount")
            .field("username", &self.username)
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Profile update: both fields replace the stored values.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AccountPatch {
    pub username: String,
    pub email: String,
}

/// Password change request; `confirm_password` must repeat `new_password`.
#[derive(Clone, PartialEq, Eq, Default)]
pub struct PasswordChange {
    pub current_password: String,
    pub new_password: String,
    pub confirm_password: String,
}

impl fmt::Debug for PasswordChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PasswordChange").finish_non_exhaustive()
    }
}

/// A single broken rule: `field` failed `rule` (e.g. `"email"` / `"required"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ValidationFailure {
    pub field: &'static str,
    pub rule: &'static str,
}

impl fmt::Display for ValidationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.rule)
    }
}

/// Every rule a request broke, in rule-table order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ValidationFailures(Vec<ValidationFailure>);

impl ValidationFailures {
    pub fn new(failures: Vec<ValidationFailure>) -> Self {
        Self(failures)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ValidationFailure> {
        self.0.iter()
    }

    /// True if `field` failed `rule`.
    pub fn contains(&self, field: &str, rule: &str) -> bool {
        self.0.iter().any(|f| f.field == field && f.rule == rule)
    }
}

impl fmt::Display for ValidationFailures {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, failure) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{failure}")?;
        }
        Ok(())
    }
}

impl IntoIterator for ValidationFailures {
    type Item = ValidationFailure;
    type IntoIter = std::vec::IntoIter<ValidationFailure>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a ValidationFailures {
    type Item = &'a ValidationFailure;
    type IntoIter = std::slice::Iter<'a, ValidationFailure>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
