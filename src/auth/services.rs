//! Account verification, login and password reset.
//!
//! Every code is minted by [`generate_code`], stored against one user and
//! consumed through `CodeRepo::take`, which deletes it in the same step that
//! reads it. A code is therefore redeemable at most once, whichever flow
//! redeems it. Codes never expire.

use axum::extract::FromRef;
use tracing::{info, warn};

use crate::{
    auth::{codes::generate_code, jwt::JwtKeys, password::hash_password_blocking},
    error::AppError,
    notify::{self, reset_password_email, verify_account_email},
    state::AppState,
    users::{
        dto::NewAccount,
        repo_types::{PublicUser, User},
        services::{create_user, find_by_email, verify_credential},
    },
};

/// Creates the user, mails a verification link and stores the code.
pub async fn register(
    st: &AppState,
    account: NewAccount,
    base_url: &str,
) -> Result<User, AppError> {
    let user = create_user(st, account).await?;

    let code = generate_code();
    notify::dispatch(
        st.notifier.clone(),
        verify_account_email(&user.email, &user.first_name, base_url, &code),
    );
    st.codes.insert(&code, user.id).await?;

    info!(user_id = %user.id, "user registered");
    Ok(user)
}

/// Redeems a registration code and marks its user verified.
pub async fn verify_account(st: &AppState, code: &str) -> Result<User, AppError> {
    let Some(row) = st.codes.take(code).await? else {
        warn!("unknown verification code");
        return Err(AppError::Unauthorized);
    };
    let user = st
        .users
        .mark_verified(row.user_id)
        .await?
        .ok_or(AppError::NotFound)?;
    info!(user_id = %user.id, "account verified");
    Ok(user)
}

/// Returns the public user and a signed session token.
pub async fn login(
    st: &AppState,
    email: &str,
    password: &str,
) -> Result<(PublicUser, String), AppError> {
    let user = PublicUser::from(verify_credential(st, email, password).await?);
    let token = JwtKeys::from_ref(st).sign(&user)?;
    info!(user_id = %user.id, "user logged in");
    Ok((user, token))
}

/// Mails a reset link to an existing account. An unknown email is
/// `Unauthorized`, which does reveal whether the account exists.
pub async fn request_password_reset(
    st: &AppState,
    email: &str,
    base_url: &str,
) -> Result<User, AppError> {
    let Some(user) = find_by_email(st, email).await? else {
        warn!("password reset for unknown email");
        return Err(AppError::Unauthorized);
    };

    let code = generate_code();
    notify::dispatch(
        st.notifier.clone(),
        reset_password_email(&user.email, &user.first_name, base_url, &code),
    );
    st.codes.insert(&code, user.id).await?;

    info!(user_id = %user.id, "password reset requested");
    Ok(user)
}

/// Redeems a reset code and replaces the bound user's password.
pub async fn reset_password(
    st: &AppState,
    code: &str,
    new_password: String,
) -> Result<User, AppError> {
    let Some(row) = st.codes.take(code).await? else {
        warn!("unknown reset code");
        return Err(AppError::Unauthorized);
    };
    let hash = hash_password_blocking(new_password).await?;
    let user = st
        .users
        .set_password_hash(row.user_id, &hash)
        .await?
        .ok_or(AppError::NotFound)?;
    info!(user_id = %user.id, "password reset");
    Ok(user)
}
