use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::users::repo_types::PublicUser;

/// JWT payload. The whole public user rides along, so `/users/me` answers
/// from the token alone and may lag behind later profile edits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,        // user ID
    pub user: PublicUser, // snapshot at login time
    pub iat: usize,       // issued at (unix timestamp)
    pub exp: usize,       // expires at (unix timestamp)
    pub iss: String,      // issuer
    pub aud: String,      // audience
}
