use lazy_static::lazy_static;
use regex::Regex;
use sqlx::SqlitePool;
use thiserror::Error;
use tracing::{error, warn};

use super::dto::PublicUser;
use super::jwt::JwtKeys;
use super::password::{hash_password, verify_password};
use super::repo::{CreateUserError, User};

pub const MIN_PASSWORD_LEN: usize = 6;

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex =
            Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

#[derive(Debug)]
pub struct AuthSuccess {
    pub token: String,
    pub user: PublicUser,
}

#[derive(Debug, Error)]
pub enum RegisterError {
    #[error("invalid email format")]
    InvalidEmail,
    #[error("password must be at least 6 characters")]
    WeakPassword,
    #[error("email already registered")]
    EmailTaken,
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

#[derive(Debug, Error)]
pub enum LoginError {
    // one message for unknown email and wrong password, so responses
    // cannot be used to enumerate accounts
    #[error("invalid email or password")]
    InvalidCredentials,
    #[error("account is deactivated")]
    AccountDisabled,
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

pub async fn register(
    db: &SqlitePool,
    keys: &JwtKeys,
    email: &str,
    password: &str,
    first_name: Option<&str>,
    last_name: Option<&str>,
) -> Result<AuthSuccess, RegisterError> {
    let email = email.trim().to_lowercase();

    if !is_valid_email(&email) {
        return Err(RegisterError::InvalidEmail);
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(RegisterError::WeakPassword);
    }

    let hash = hash_password(password)?;
    let user = match User::create(db, &email, &hash, first_name, last_name).await {
        Ok(u) => u,
        Err(CreateUserError::DuplicateEmail) => return Err(RegisterError::EmailTaken),
        Err(CreateUserError::Database(e)) => {
            error!(error = %e, "create user failed");
            return Err(RegisterError::Internal(e.into()));
        }
    };

    let token = keys.sign(user.id, &user.email)?;
    Ok(AuthSuccess {
        token,
        user: PublicUser::from(user),
    })
}

pub async fn login(
    db: &SqlitePool,
    keys: &JwtKeys,
    email: &str,
    password: &str,
) -> Result<AuthSuccess, LoginError> {
    let email = email.trim().to_lowercase();

    let user = match User::find_by_email(db, &email).await {
        Ok(Some(u)) => u,
        Ok(None) => {
            warn!("login with unknown email");
            return Err(LoginError::InvalidCredentials);
        }
        Err(e) => {
            error!(error = %e, "find_by_email failed");
            return Err(LoginError::Internal(e));
        }
    };

    if !user.is_active {
        warn!(user_id = user.id, "login to deactivated account");
        return Err(LoginError::AccountDisabled);
    }

    if !verify_password(password, &user.password_hash)? {
        warn!(user_id = user.id, "login with invalid password");
        return Err(LoginError::InvalidCredentials);
    }

    let token = keys.sign(user.id, &user.email)?;
    Ok(AuthSuccess {
        token,
        user: PublicUser::from(user),
    })
}

#[cfg(test)]
mod email_tests {
    use super::is_valid_email;

    #[test]
    fn accepts_conventional_addresses() {
        assert!(is_valid_email("alice@example.com"));
        assert!(is_valid_email("bob.smith+tag@mail.co.uk"));
        assert!(is_valid_email("x_1%y@sub.domain.io"));
    }

    #[test]
    fn rejects_malformed_addresses() {
        assert!(!is_valid_email(""));
        assert!(!is_valid_email("no-at-sign"));
        assert!(!is_valid_email("a@nodot"));
        assert!(!is_valid_email("a@b.c")); // final label too short
        assert!(!is_valid_email("a b@example.com"));
        assert!(!is_valid_email("@example.com"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::AppState;

    fn keys(state: &AppState) -> JwtKeys {
        JwtKeys::from_config(&state.config.jwt)
    }

    #[tokio::test]
    async fn register_then_login_roundtrip() {
        let state = AppState::fake().await;
        let keys = keys(&state);

        let registered = register(
            &state.db,
            &keys,
            "alice@example.com",
            "secret1",
            Some("Alice"),
            Some("Doe"),
        )
        .await
        .expect("register");
        assert_eq!(registered.user.id, 1);
        assert_eq!(registered.user.email, "alice@example.com");

        let logged_in = login(&state.db, &keys, "alice@example.com", "secret1")
            .await
            .expect("login");
        let claims = keys.verify(&logged_in.token).expect("token");
        assert_eq!(claims.user_id, registered.user.id);
        assert_eq!(claims.email, "alice@example.com");
    }

    #[tokio::test]
    async fn register_normalizes_email_case() {
        let state = AppState::fake().await;
        let keys = keys(&state);
        let ok = register(&state.db, &keys, " Alice@Example.COM ", "secret1", None, None)
            .await
            .expect("register");
        assert_eq!(ok.user.email, "alice@example.com");
    }

    #[tokio::test]
    async fn duplicate_email_any_case_is_taken() {
        let state = AppState::fake().await;
        let keys = keys(&state);
        register(&state.db, &keys, "A@b.com", "secret1", None, None)
            .await
            .expect("register");
        let err = register(&state.db, &keys, "a@B.com", "secret1", None, None)
            .await
            .unwrap_err();
        assert!(matches!(err, RegisterError::EmailTaken));
    }

    #[tokio::test]
    async fn weak_password_creates_no_row() {
        let state = AppState::fake().await;
        let keys = keys(&state);
        let err = register(&state.db, &keys, "bob@x.co", "short", None, None)
            .await
            .unwrap_err();
        assert!(matches!(err, RegisterError::WeakPassword));
        assert!(User::find_by_email(&state.db, "bob@x.co")
            .await
            .expect("query")
            .is_none());
    }

    #[tokio::test]
    async fn invalid_email_is_rejected() {
        let state = AppState::fake().await;
        let keys = keys(&state);
        let err = register(&state.db, &keys, "not-an-email", "secret1", None, None)
            .await
            .unwrap_err();
        assert!(matches!(err, RegisterError::InvalidEmail));
    }

    #[tokio::test]
    async fn wrong_password_and_unknown_email_are_indistinguishable() {
        let state = AppState::fake().await;
        let keys = keys(&state);
        register(&state.db, &keys, "carol@example.com", "secret1", None, None)
            .await
            .expect("register");

        let wrong_password = login(&state.db, &keys, "carol@example.com", "nope-nope")
            .await
            .unwrap_err();
        let unknown_email = login(&state.db, &keys, "nobody@example.com", "secret1")
            .await
            .unwrap_err();

        assert!(matches!(wrong_password, LoginError::InvalidCredentials));
        assert!(matches!(unknown_email, LoginError::InvalidCredentials));
        assert_eq!(wrong_password.to_string(), unknown_email.to_string());
    }

    #[tokio::test]
    async fn deactivated_account_cannot_login() {
        let state = AppState::fake().await;
        let keys = keys(&state);
        let ok = register(&state.db, &keys, "dave@example.com", "secret1", None, None)
            .await
            .expect("register");

        sqlx::query("UPDATE users SET is_active = 0 WHERE id = ?")
            .bind(ok.user.id)
            .execute(&state.db)
            .await
            .expect("deactivate");

        let err = login(&state.db, &keys, "dave@example.com", "secret1")
            .await
            .unwrap_err();
        assert!(matches!(err, LoginError::AccountDisabled));
    }
}
