use std::collections::HashMap;

use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::{
    auth::{repo::CodeRepo, repo_types::VerificationCode},
    error::AppError,
    users::{
        repo::UserRepo,
        repo_types::{NewUser, ProfileUpdate, User},
    },
};

#[derive(Default)]
struct Inner {
    users: HashMap<Uuid, User>,
    codes: HashMap<String, VerificationCode>,
}

/// In-process store behind both repository traits. One lock guards users
/// and codes together, so user deletion drops pending codes atomically.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Codes currently pending for `user_id`, oldest first.
    pub async fn pending_codes(&self, user_id: Uuid) -> Vec<String> {
        let inner = self.inner.lock().await;
        let mut codes: Vec<&VerificationCode> =
            inner.codes.values().filter(|c| c.user_id == user_id).collect();
        codes.sort_by_key(|c| c.created_at);
        codes.into_iter().map(|c| c.code.clone()).collect()
    }

    pub async fn user_count(&self) -> usize {
        self.inner.lock().await.users.len()
    }
}

#[async_trait]
impl UserRepo for MemoryStore {
    async fn list(&self) -> Result<Vec<User>, AppError> {
        let inner = self.inner.lock().await;
        let mut users: Vec<User> = inner.users.values().cloned().collect();
        users.sort_by_key(|u| u.created_at);
        Ok(users)
    }

    async fn insert(&self, new: NewUser) -> Result<User, AppError> {
        let mut inner = self.inner.lock().await;
        if inner.users.values().any(|u| u.email == new.email) {
            return Err(AppError::Conflict);
        }
        let now = OffsetDateTime::now_utc();
        let user = User {
            id: Uuid::new_v4(),
            email: new.email,
            password_hash: new.password_hash,
            first_name: new.first_name,
            last_name: new.last_name,
            country: new.country,
            image: new.image,
            is_verified: false,
            created_at: now,
            updated_at: now,
        };
        inner.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AppError> {
        Ok(self.inner.lock().await.users.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let inner = self.inner.lock().await;
        Ok(inner.users.values().find(|u| u.email == email).cloned())
    }

    async fn update_profile(
        &self,
        id: Uuid,
        fields: &ProfileUpdate,
    ) -> Result<Option<User>, AppError> {
        let mut inner = self.inner.lock().await;
        let Some(user) = inner.users.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(v) = &fields.first_name {
            user.first_name = v.clone();
        }
        if let Some(v) = &fields.last_name {
            user.last_name = v.clone();
        }
        if let Some(v) = &fields.country {
            user.country = v.clone();
        }
        if let Some(v) = &fields.image {
            user.image = v.clone();
        }
        user.updated_at = OffsetDateTime::now_utc();
        Ok(Some(user.clone()))
    }

    async fn mark_verified(&self, id: Uuid) -> Result<Option<User>, AppError> {
        let mut inner = self.inner.lock().await;
        Ok(inner.users.get_mut(&id).map(|user| {
            user.is_verified = true;
            user.updated_at = OffsetDateTime::now_utc();
            user.clone()
        }))
    }

    async fn set_password_hash(&self, id: Uuid, hash: &str) -> Result<Option<User>, AppError> {
        let mut inner = self.inner.lock().await;
        Ok(inner.users.get_mut(&id).map(|user| {
            user.password_hash = hash.to_string();
            user.updated_at = OffsetDateTime::now_utc();
            user.clone()
        }))
    }

    async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        let mut inner = self.inner.lock().await;
        let removed = inner.users.remove(&id).is_some();
        if removed {
            inner.codes.retain(|_, c| c.user_id != id);
        }
        Ok(removed)
    }
}

#[async_trait]
impl CodeRepo for MemoryStore {
    async fn insert(&self, code: &str, user_id: Uuid) -> Result<VerificationCode, AppError> {
        let mut inner = self.inner.lock().await;
        if !inner.users.contains_key(&user_id) {
            return Err(AppError::Internal(anyhow::anyhow!(
                "verification code references missing user"
            )));
        }
        if inner.codes.contains_key(code) {
            return Err(AppError::Conflict);
        }
        let row = VerificationCode {
            code: code.to_string(),
            user_id,
            created_at: OffsetDateTime::now_utc(),
        };
        inner.codes.insert(row.code.clone(), row.clone());
        Ok(row)
    }

    async fn take(&self, code: &str) -> Result<Option<VerificationCode>, AppError> {
        Ok(self.inner.lock().await.codes.remove(code))
    }

    async fn delete_for_user(&self, user_id: Uuid) -> Result<u64, AppError> {
        let mut inner = self.inner.lock().await;
        let before = inner.codes.len();
        inner.codes.retain(|_, c| c.user_id != user_id);
        Ok((before - inner.codes.len()) as u64)
    }
}
