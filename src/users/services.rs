use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    auth::password::{hash_password_blocking, verify_password_blocking},
    error::AppError,
    state::AppState,
    users::{
        dto::NewAccount,
        repo_types::{NewUser, ProfileUpdate, User},
    },
};

/// Hashes the password and stores a new, unverified user.
pub async fn create_user(st: &AppState, account: NewAccount) -> Result<User, AppError> {
    let password_hash = hash_password_blocking(account.password).await?;
    let user = st
        .users
        .insert(NewUser {
            email: account.email,
            password_hash,
            first_name: account.first_name,
            last_name: account.last_name,
            country: account.country,
            image: account.image,
        })
        .await?;
    info!(user_id = %user.id, "user created");
    Ok(user)
}

pub async fn list_users(st: &AppState) -> Result<Vec<User>, AppError> {
    st.users.list().await
}

pub async fn get_user(st: &AppState, id: Uuid) -> Result<User, AppError> {
    st.users.find_by_id(id).await?.ok_or(AppError::NotFound)
}

pub async fn find_by_email(st: &AppState, email: &str) -> Result<Option<User>, AppError> {
    st.users.find_by_email(email).await
}

pub async fn update_profile(
    st: &AppState,
    id: Uuid,
    fields: &ProfileUpdate,
) -> Result<User, AppError> {
    st.users
        .update_profile(id, fields)
        .await?
        .ok_or(AppError::NotFound)
}

pub async fn delete_user(st: &AppState, id: Uuid) -> Result<(), AppError> {
    if !st.users.delete(id).await? {
        return Err(AppError::NotFound);
    }
    // the Postgres schema cascades; other stores may not
    st.codes.delete_for_user(id).await?;
    info!(user_id = %id, "user deleted");
    Ok(())
}

/// Checks an email/password pair against a verified account.
///
/// Unknown email, unverified account and wrong password all yield the same
/// `Unauthorized`; only the log line tells them apart.
pub async fn verify_credential(
    st: &AppState,
    email: &str,
    password: &str,
) -> Result<User, AppError> {
    let Some(user) = st.users.find_by_email(email).await? else {
        warn!("login unknown email");
        return Err(AppError::Unauthorized);
    };
    if !user.is_verified {
        warn!(user_id = %user.id, "login unverified account");
        return Err(AppError::Unauthorized);
    }
    if !verify_password_blocking(password.to_string(), user.password_hash.clone()).await? {
        warn!(user_id = %user.id, "login invalid password");
        return Err(AppError::Unauthorized);
    }
    Ok(user)
}
