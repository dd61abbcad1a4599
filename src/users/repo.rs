use thiserror::Error;
use tracing::{info, warn};

use crate::{
    params,
    rdbms::{Rdbms, RdbmsError},
    users::repo_types::{User, UserByCredentialsRow, UserByEmailRow, UserByIdRow, UserId},
};

const INSERT_USER: &str = r#"
    INSERT INTO users (first_name, last_name, email, password)
    VALUES ($1, $2, $3, $4)
    RETURNING id
"#;

const FIND_BY_ID: &str = r#"
    SELECT first_name, last_name, email, password, CAST(created_at AS TEXT) AS created_at
    FROM users
    WHERE id = $1
"#;

const FIND_BY_EMAIL: &str = r#"
    SELECT id, first_name, last_name, password, CAST(created_at AS TEXT) AS created_at
    FROM users
    WHERE email = $1
"#;

const FIND_BY_EMAIL_AND_PASSWORD: &str = r#"
    SELECT id, first_name, last_name, CAST(created_at AS TEXT) AS created_at
    FROM users
    WHERE email = $1 AND password = $2
"#;

const UPDATE_USER: &str = r#"
    UPDATE users
    SET first_name = $1, last_name = $2, password = $3
    WHERE id = $4
"#;

const DELETE_USER: &str = "DELETE FROM users WHERE id = $1";

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("invalid user: {0}")]
    Validation(&'static str),

    #[error(transparent)]
    Store(#[from] RdbmsError),
}

impl RepositoryError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, RepositoryError::Store(e) if e.is_not_found())
    }

    pub fn is_duplicate(&self) -> bool {
        matches!(self, RepositoryError::Store(e) if e.is_duplicate())
    }
}

pub type RepoResult<T> = Result<T, RepositoryError>;

/// Users table access on top of the statement executor.
#[derive(Clone)]
pub struct UserRepository {
    rdbms: Rdbms,
    migrations: String,
}

impl UserRepository {
    pub fn new(rdbms: Rdbms, migrations: impl Into<String>) -> Self {
        Self {
            rdbms,
            migrations: migrations.into(),
        }
    }

    /// Insert a new user and write the generated id back onto `user`.
    ///
    /// Email and password must be non-empty.
    pub async fn create_user(&self, user: &mut User) -> RepoResult<()> {
        if user.email.is_empty() {
            warn!("create_user rejected: empty email");
            return Err(RepositoryError::Validation("email is required"));
        }
        if user.password.is_empty() {
            warn!(email = %user.email, "create_user rejected: empty password");
            return Err(RepositoryError::Validation("password is required"));
        }

        let id = self
            .rdbms
            .create(
                INSERT_USER,
                params![&user.first_name, &user.last_name, &user.email, &user.password],
            )
            .await?;
        user.id = id;

        info!(user_id = id, email = %user.email, "user created");
        Ok(())
    }

    pub async fn find_user_by_id(&self, id: UserId) -> RepoResult<User> {
        let row: UserByIdRow = self.rdbms.read(FIND_BY_ID, params![id]).await?;
        Ok(row.into_user(id))
    }

    /// Look up an account by email.
    ///
    /// A not-found error means the address is free to register.
    pub async fn find_user_by_email(&self, email: &str) -> RepoResult<User> {
        let row: UserByEmailRow = self.rdbms.read(FIND_BY_EMAIL, params![email]).await?;
        Ok(row.into_user(email))
    }

    /// Exact match on both fields. The credential is compared as stored.
    pub async fn find_user_by_email_and_password(
        &self,
        email: &str,
        password: &str,
    ) -> RepoResult<User> {
        let row: UserByCredentialsRow = self
            .rdbms
            .read(FIND_BY_EMAIL_AND_PASSWORD, params![email, password])
            .await?;
        Ok(row.into_user(email, password))
    }

    /// Overwrite first name, last name and password of `user.id`.
    ///
    /// All three columns are written unconditionally, so `user` must be the
    /// full current record with the caller's changes merged on top. Passing
    /// a partially filled user clears whatever was left empty.
    pub async fn update_user(&self, user: &User) -> RepoResult<()> {
        if !user.is_persisted() {
            return Err(RepositoryError::Validation("id is required"));
        }
        if user.password.is_empty() {
            return Err(RepositoryError::Validation("password is required"));
        }

        self.rdbms
            .update(
                UPDATE_USER,
                params![&user.first_name, &user.last_name, &user.password, user.id],
            )
            .await?;
        Ok(())
    }

    pub async fn delete_user(&self, user: &User) -> RepoResult<()> {
        if !user.is_persisted() {
            return Err(RepositoryError::Validation("id is required"));
        }
        self.rdbms.delete(DELETE_USER, params![user.id]).await?;
        info!(user_id = user.id, "user deleted");
        Ok(())
    }

    pub async fn migrate_up(&self) -> RepoResult<()> {
        Ok(self.rdbms.migrate_up(&self.migrations).await?)
    }

    pub async fn migrate_down(&self) -> RepoResult<()> {
        Ok(self.rdbms.migrate_down(&self.migrations).await?)
    }
}
