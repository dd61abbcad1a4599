//! Account flows behind the HTTP handlers.
//!
//! Updates here are read-modify-write: the current row is loaded, only the
//! supplied fields are overlaid, and the full record goes back through
//! [`UserRepository::update_user`](super::repo::UserRepository::update_user).

use lazy_static::lazy_static;
use regex::Regex;
use tracing::{error, info, warn};

use super::{
    errors::{ApiError, ApiResult},
    repo_types::{User, UserId},
};
use crate::{
    auth::password::{hash_password, verify_password},
    state::AppState,
};

pub const MIN_PASSWORD_LEN: usize = 8;

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn check_new_password(password: &str) -> ApiResult<()> {
    if password.len() < MIN_PASSWORD_LEN {
        warn!("password too short");
        return Err(ApiError::BadRequest("password too short".into()));
    }
    Ok(())
}

fn hash(password: &str) -> ApiResult<String> {
    hash_password(password).map_err(|e| {
        error!(error = %e, "hash_password failed");
        ApiError::Internal(e)
    })
}

async fn issue_token(state: &AppState, user_id: UserId) -> ApiResult<String> {
    state
        .tokens
        .generate_token(user_id)
        .await
        .map_err(ApiError::Internal)
}

/// Create an account and return a token for it.
pub async fn register(state: &AppState, email: &str, password: &str) -> ApiResult<String> {
    let email = normalize_email(email);
    if !is_valid_email(&email) {
        warn!(email = %email, "invalid email");
        return Err(ApiError::BadRequest("invalid email".into()));
    }
    check_new_password(password)?;

    match state.users.find_user_by_email(&email).await {
        Err(e) if e.is_not_found() => {}
        Err(e) => return Err(e.into()),
        Ok(existing) => {
            warn!(email = %email, user_id = existing.id, "email already registered");
            return Err(ApiError::EmailTaken);
        }
    }

    let mut user = User {
        email,
        password: hash(password)?,
        ..Default::default()
    };
    state.users.create_user(&mut user).await?;
    if !user.is_persisted() {
        error!(email = %user.email, "invalid user id created");
        return Err(ApiError::Internal(anyhow::anyhow!("invalid user id created")));
    }

    let token = issue_token(state, user.id).await?;
    info!(user_id = user.id, "user registered");
    Ok(token)
}

/// Check credentials and return a token.
pub async fn login(state: &AppState, email: &str, password: &str) -> ApiResult<String> {
    let email = normalize_email(email);

    let user = match state.users.find_user_by_email(&email).await {
        Ok(u) => u,
        Err(e) if e.is_not_found() => {
            warn!(email = %email, "login unknown email");
            return Err(ApiError::InvalidCredentials);
        }
        Err(e) => return Err(e.into()),
    };

    let ok = verify_password(password, &user.password).map_err(|e| {
        error!(error = %e, user_id = user.id, "verify_password failed");
        ApiError::Internal(e)
    })?;
    if !ok {
        warn!(user_id = user.id, "login invalid password");
        return Err(ApiError::InvalidCredentials);
    }

    issue_token(state, user.id).await
}

pub async fn profile(state: &AppState, id: UserId) -> ApiResult<User> {
    if id <= 0 {
        return Err(ApiError::BadRequest("invalid id has been given".into()));
    }
    Ok(state.users.find_user_by_id(id).await?)
}

/// Change first and/or last name. Empty fields keep their stored value.
pub async fn update_information(
    state: &AppState,
    id: UserId,
    first_name: &str,
    last_name: &str,
) -> ApiResult<()> {
    if first_name.is_empty() && last_name.is_empty() {
        return Err(ApiError::BadRequest(
            "an empty request body has been given".into(),
        ));
    }

    let mut user = state.users.find_user_by_id(id).await?;
    if !first_name.is_empty() {
        user.first_name = first_name.to_owned();
    }
    if !last_name.is_empty() {
        user.last_name = last_name.to_owned();
    }

    state.users.update_user(&user).await?;
    info!(user_id = id, "user information updated");
    Ok(())
}

/// Replace the password after checking the current one.
pub async fn update_password(
    state: &AppState,
    id: UserId,
    old_password: &str,
    new_password: &str,
) -> ApiResult<()> {
    if old_password.is_empty() {
        return Err(ApiError::BadRequest("invalid old password has been given".into()));
    }
    if new_password.is_empty() {
        return Err(ApiError::BadRequest("invalid password has been given".into()));
    }
    check_new_password(new_password)?;

    let mut user = state.users.find_user_by_id(id).await?;
    let ok = verify_password(old_password, &user.password).map_err(|e| {
        error!(error = %e, user_id = id, "verify_password failed");
        ApiError::Internal(e)
    })?;
    if !ok {
        warn!(user_id = id, "wrong old password");
        return Err(ApiError::WrongPassword);
    }

    user.password = hash(new_password)?;
    state.users.update_user(&user).await?;
    info!(user_id = id, "password updated");
    Ok(())
}

pub async fn delete_account(state: &AppState, id: UserId) -> ApiResult<()> {
    let user = state.users.find_user_by_id(id).await?;
    state.users.delete_user(&user).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::sqlite_db;

    #[test]
    fn email_validation() {
        assert!(is_valid_email("a@x.com"));
        assert!(!is_valid_email("a@x"));
        assert!(!is_valid_email("a x@x.com"));
        assert_eq!(normalize_email("  A@X.Com "), "a@x.com");
    }

    #[tokio::test]
    async fn register_then_login() {
        let t = sqlite_db().await;
        let state = AppState::for_tests(&t);

        let token = register(&state, " Ann@Example.com", "long-enough").await.unwrap();
        assert_eq!(token, "token-1");

        let stored = state.users.find_user_by_email("ann@example.com").await.unwrap();
        assert_ne!(stored.password, "long-enough");

        assert_eq!(login(&state, "ann@example.com", "long-enough").await.unwrap(), "token-1");
        assert!(matches!(
            login(&state, "ann@example.com", "wrong-pass").await,
            Err(ApiError::InvalidCredentials)
        ));
        assert!(matches!(
            login(&state, "nobody@example.com", "long-enough").await,
            Err(ApiError::InvalidCredentials)
        ));
    }

    #[tokio::test]
    async fn register_rejects_taken_email_and_weak_input() {
        let t = sqlite_db().await;
        let state = AppState::for_tests(&t);
        register(&state, "a@x.com", "long-enough").await.unwrap();

        assert!(matches!(
            register(&state, "A@x.com", "another-pass").await,
            Err(ApiError::EmailTaken)
        ));
        assert!(matches!(
            register(&state, "not-an-email", "long-enough").await,
            Err(ApiError::BadRequest(_))
        ));
        assert!(matches!(
            register(&state, "b@x.com", "short").await,
            Err(ApiError::BadRequest(_))
        ));
    }

    #[tokio::test]
    async fn update_information_merges_supplied_fields() {
        let t = sqlite_db().await;
        let state = AppState::for_tests(&t);
        register(&state, "a@x.com", "long-enough").await.unwrap();

        update_information(&state, 1, "Ann", "").await.unwrap();
        update_information(&state, 1, "", "Lee").await.unwrap();

        let user = profile(&state, 1).await.unwrap();
        assert_eq!((user.first_name.as_str(), user.last_name.as_str()), ("Ann", "Lee"));
        // password survived both writes
        assert!(verify_password("long-enough", &user.password).unwrap());

        assert!(matches!(
            update_information(&state, 1, "", "").await,
            Err(ApiError::BadRequest(_))
        ));
        assert!(matches!(
            update_information(&state, 99, "X", "").await,
            Err(ApiError::NotFound)
        ));
    }

    #[tokio::test]
    async fn update_password_requires_current_one() {
        let t = sqlite_db().await;
        let state = AppState::for_tests(&t);
        register(&state, "a@x.com", "long-enough").await.unwrap();
        update_information(&state, 1, "Ann", "Lee").await.unwrap();

        assert!(matches!(
            update_password(&state, 1, "not-it-at-all", "brand-new-pass").await,
            Err(ApiError::WrongPassword)
        ));
        assert!(matches!(
            update_password(&state, 1, "", "brand-new-pass").await,
            Err(ApiError::BadRequest(_))
        ));

        update_password(&state, 1, "long-enough", "brand-new-pass").await.unwrap();
        assert!(login(&state, "a@x.com", "long-enough").await.is_err());
        login(&state, "a@x.com", "brand-new-pass").await.unwrap();

        let user = profile(&state, 1).await.unwrap();
        assert_eq!(user.first_name, "Ann");
        assert_eq!(user.last_name, "Lee");
    }

    #[tokio::test]
    async fn delete_account_removes_user() {
        let t = sqlite_db().await;
        let state = AppState::for_tests(&t);
        register(&state, "a@x.com", "long-enough").await.unwrap();

        delete_account(&state, 1).await.unwrap();
        assert!(matches!(profile(&state, 1).await, Err(ApiError::NotFound)));
        assert!(matches!(delete_account(&state, 1).await, Err(ApiError::NotFound)));
    }
}
