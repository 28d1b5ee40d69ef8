use serde::{Deserialize, Serialize};

use crate::domain::UserId;

/// A registered account, without any credential material.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub is_admin: bool,
    pub created_at: String,
    pub updated_at: String,
}

/// Row to insert at registration. `password_hash` is an Argon2 PHC string.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub api_key: String,
    pub is_admin: bool,
}

/// A user together with the secrets needed to authenticate them.
#[derive(Debug, Clone)]
pub struct UserCredentials {
    pub user: User,
    pub password_hash: String,
    pub api_key: String,
}
