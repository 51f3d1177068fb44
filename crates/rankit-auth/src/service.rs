//! Account service — registration and login orchestration.

use rankit_core::error::{RankError, RankResult};
use rankit_core::models::user::{CreateUser, User};
use rankit_core::repository::UserRepository;
use rankit_core::validate::{validate_email, validate_password, validate_username};
use tracing::info;

use crate::config::AuthConfig;
use crate::error::AuthError;
use crate::password;

/// Input for the registration flow.
#[derive(Debug)]
pub struct RegisterInput {
    pub username: String,
    pub email: String,
    pub password: String,
}

/// Account service.
///
/// Generic over the user repository so that the auth layer has no
/// dependency on the database crate. Password hashes never leave this
/// crate as anything but opaque strings.
pub struct AccountService<U: UserRepository> {
    user_repo: U,
    config: AuthConfig,
}

impl<U: UserRepository> AccountService<U> {
    pub fn new(user_repo: U, config: AuthConfig) -> Self {
        Self { user_repo, config }
    }

    /// Register a new account. Usernames and emails are unique; the
    /// email is normalized to trimmed lowercase before storage.
    pub async fn register(&self, input: RegisterInput) -> RankResult<User> {
        let username = input.username.trim().to_string();
        validate_username(&username)?;

        let email = input.email.trim().to_lowercase();
        validate_email(&email)?;

        validate_password(&input.password, self.config.min_password_length)?;

        let password_hash =
            password::hash_password(&input.password, self.config.pepper.as_deref())?;

        let user = self
            .user_repo
            .create(CreateUser {
                username,
                email,
                password_hash,
            })
            .await?;

        info!(user_id = %user.id, "account registered");
        Ok(user)
    }

    /// Authenticate with username or email plus password.
    ///
    /// Lookup failures and password mismatches collapse into the same
    /// `InvalidCredentials` error so callers cannot tell which accounts
    /// exist.
    pub async fn login(&self, username_or_email: &str, password: &str) -> RankResult<User> {
        let user = match self.user_repo.get_by_username(username_or_email).await {
            Ok(u) => u,
            Err(RankError::NotFound { .. }) => self
                .user_repo
                .get_by_email(username_or_email)
                .await
                .map_err(|_| AuthError::InvalidCredentials)?,
            Err(e) => return Err(e),
        };

        let valid = password::verify_password(
            password,
            &user.password_hash,
            self.config.pepper.as_deref(),
        )?;

        if !valid {
            return Err(AuthError::InvalidCredentials.into());
        }

        info!(user_id = %user.id, "login succeeded");
        Ok(user)
    }
}
