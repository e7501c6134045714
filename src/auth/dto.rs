use std::fmt;

use serde::{Deserialize, Serialize};

use crate::users::{dto::NewAccount, repo_types::PublicUser};

/// Request body for user registration.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    #[serde(flatten)]
    pub account: NewAccount,
    /// Front-end origin the verification link points at.
    pub front_base_url: String,
}

/// Request body for login.
#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

impl fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginRequest")
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

/// Response returned after login.
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub user: PublicUser,
    pub token: String,
}

/// Request body for asking a password reset email.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetRequest {
    pub email: String,
    pub front_base_url: String,
}

/// Request body for redeeming a reset code.
#[derive(Deserialize)]
pub struct NewPasswordRequest {
    pub password: String,
}

impl fmt::Debug for NewPasswordRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NewPasswordRequest").finish_non_exhaustive()
    }
}
