//! Registration, login and token verification.
//!
//! Passwords are hashed with argon2; sessions are stateless HS256 tokens.

mod password;
mod token;
pub use token::Claims;

use std::time::Duration;

use todo_model::{AuthSession, User, UserView};
use tracing::{info, instrument};

use crate::{
    error::CoreError,
    user::{UserRepository, new_user_id},
};
use token::TokenKeys;

/// Token lifetime used unless configured otherwise.
pub const DEFAULT_TOKEN_TTL: Duration = Duration::from_secs(7 * 24 * 60 * 60);

#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Shared HS256 secret.
    pub secret: String,
    pub token_ttl: Duration,
}

impl AuthConfig {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            token_ttl: DEFAULT_TOKEN_TTL,
        }
    }
}

/// Credential store front-end issuing and verifying access tokens.
pub struct AuthService {
    users: UserRepository,
    keys: TokenKeys,
}

/// Emails are matched case-insensitively.
fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

impl AuthService {
    pub fn new(users: UserRepository, config: &AuthConfig) -> Self {
        Self {
            users,
            keys: TokenKeys::new(config.secret.as_bytes(), config.token_ttl),
        }
    }

    pub fn users(&self) -> &UserRepository {
        &self.users
    }

    fn session(&self, user: User) -> Result<AuthSession, CoreError> {
        let token = self
            .keys
            .issue(&user.id, &user.email, self.users.clock().now())?;
        Ok(AuthSession {
            user: UserView::from(user),
            token,
        })
    }

    /// Create an account and return a session for it.
    ///
    /// Fails with [`CoreError::EmailTaken`] if the email is already registered.
    #[instrument(level = "debug", skip(self, password, name))]
    pub async fn register(
        &self,
        email: &str,
        password: &str,
        name: &str,
    ) -> Result<AuthSession, CoreError> {
        let email = normalize_email(email);
        if self.users.email_exists(&email).await? {
            return Err(CoreError::EmailTaken);
        }

        let password_hash = password::hash(password.to_string()).await?;
        let now = self.users.clock().now();
        let user = self
            .users
            .create(User {
                id: new_user_id(),
                email,
                password_hash,
                name: name.to_string(),
                created_at: now,
                updated_at: now,
            })
            .await?;

        info!(user_id = %user.id, "user registered");
        self.session(user)
    }

    /// Check credentials and return a fresh session.
    ///
    /// Unknown email and wrong password both yield [`CoreError::InvalidCredentials`].
    #[instrument(level = "debug", skip(self, password))]
    pub async fn login(&self, email: &str, password: &str) -> Result<AuthSession, CoreError> {
        let email = normalize_email(email);
        let Some(user) = self.users.find_by_email(&email).await? else {
            return Err(CoreError::InvalidCredentials);
        };

        if !password::verify(password.to_string(), user.password_hash.clone()).await? {
            return Err(CoreError::InvalidCredentials);
        }
        self.session(user)
    }

    /// Validate a token's signature and expiry.
    pub fn verify_token(&self, token: &str) -> Result<Claims, CoreError> {
        self.keys.verify(token)
    }

    /// Public view of a user, if it exists.
    pub async fn user(&self, id: &str) -> Result<Option<UserView>, CoreError> {
        Ok(self.users.find_by_id(id).await?.map(UserView::from))
    }
}
