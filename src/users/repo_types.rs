use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Store-assigned identifier. `0` means "not persisted".
pub type UserId = i64;

/// User record in the database.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password: String, // opaque credential, never exposed in JSON
    pub created_at: String,
}

impl User {
    pub fn is_persisted(&self) -> bool {
        self.id != 0
    }
}

// One row type per query, column order matching its SELECT list.

#[derive(Debug, FromRow)]
pub(super) struct UserByIdRow {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
    pub created_at: String,
}

impl UserByIdRow {
    pub fn into_user(self, id: UserId) -> User {
        User {
            id,
            first_name: self.first_name,
            last_name: self.last_name,
            email: self.email,
            password: self.password,
            created_at: self.created_at,
        }
    }
}

#[derive(Debug, FromRow)]
pub(super) struct UserByEmailRow {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub password: String,
    pub created_at: String,
}

impl UserByEmailRow {
    pub fn into_user(self, email: &str) -> User {
        User {
            id: self.id,
            first_name: self.first_name,
            last_name: self.last_name,
            email: email.to_owned(),
            password: self.password,
            created_at: self.created_at,
        }
    }
}

#[derive(Debug, FromRow)]
pub(super) struct UserByCredentialsRow {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub created_at: String,
}

impl UserByCredentialsRow {
    pub fn into_user(self, email: &str, password: &str) -> User {
        User {
            id: self.id,
            first_name: self.first_name,
            last_name: self.last_name,
            email: email.to_owned(),
            password: password.to_owned(),
            created_at: self.created_at,
        }
    }
}
