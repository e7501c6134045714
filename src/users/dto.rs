use std::fmt;

use lazy_static::lazy_static;
use regex::Regex;
use serde::Deserialize;

use crate::error::AppError;

/// Fields needed to open an account. The password is plaintext here and is
/// hashed before anything is stored.
#[derive(Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAccount {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub country: String,
    pub image: String,
}

impl fmt::Debug for NewAccount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NewAccount")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .field("first_name", &self.first_name)
            .field("last_name", &self.last_name)
            .field("country", &self.country)
            .finish_non_exhaustive()
    }
}

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email regex");
    }
    EMAIL_RE.is_match(email)
}

/// Canonical form used for storage and lookup.
pub(crate) fn fold_email(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// Folds, then rejects anything that is not an address.
pub(crate) fn normalize_email(raw: &str) -> Result<String, AppError> {
    let email = fold_email(raw);
    if !is_valid_email(&email) {
        return Err(AppError::Validation("Invalid email".into()));
    }
    Ok(email)
}

pub(crate) fn require(field: &str, value: &str) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::Validation(format!("{field} is required")));
    }
    Ok(())
}

impl NewAccount {
    /// Normalizes the email and checks required fields are present.
    pub fn validated(mut self) -> Result<Self, AppError> {
        self.email = normalize_email(&self.email)?;
        require("password", &self.password)?;
        require("firstName", &self.first_name)?;
        require("lastName", &self.last_name)?;
        require("country", &self.country)?;
        require("image", &self.image)?;
        Ok(self)
    }
}
