//! Authentication and user management service

use std::sync::Arc;

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::{Duration, Utc};
use rand::RngCore;
use sha2::{Digest, Sha256};
use validator::Validate;

use super::email::{password_reset_body, Notifier};
use crate::{
    config::AuthConfig,
    error::{AppError, AppResult},
    models::{
        user::{NewUser, RegisterUser, UserClaims, UserFilter},
        Role, User, UserShort,
    },
    repository::Repository,
};

const INVALID_CREDENTIALS: &str = "Invalid email or password";

/// Digest stored in place of a reset token
pub fn hash_reset_token(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

fn generate_reset_token() -> String {
    let mut bytes = [0u8; 20];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

#[derive(Clone)]
pub struct UsersService {
    repository: Repository,
    config: AuthConfig,
    frontend_url: String,
    notifier: Arc<dyn Notifier>,
}

impl UsersService {
    pub fn new(
        repository: Repository,
        config: AuthConfig,
        frontend_url: String,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            repository,
            config,
            frontend_url,
            notifier,
        }
    }

    /// Register a new account. The role is chosen by the caller.
    pub async fn register(&self, data: RegisterUser) -> AppResult<User> {
        data.validate()?;

        if let Some(team_id) = data.team_id {
            if self.repository.teams.find_by_id(team_id).await?.is_none() {
                return Err(AppError::InvalidReference(format!("Team {} does not exist", team_id)));
            }
        }

        let email = data.email.trim().to_string();
        if self.repository.users.find_by_email(&email).await?.is_some() {
            return Err(AppError::Conflict("User already exists".to_string()));
        }

        let user = self
            .repository
            .users
            .create(&NewUser {
                name: data.name.trim().to_string(),
                email,
                password_hash: self.hash_password(&data.password)?,
                role: data.role,
                team_id: data.team_id,
            })
            .await?;

        tracing::info!(user_id = user.id, role = %user.role, "User registered");
        Ok(user)
    }

    /// Check credentials and return a signed token with the user
    pub async fn authenticate(&self, email: &str, password: &str) -> AppResult<(String, User)> {
        let user = self
            .repository
            .users
            .find_by_email(email.trim())
            .await?
            .ok_or_else(|| AppError::Authentication(INVALID_CREDENTIALS.to_string()))?;

        if !self.verify_password(&user, password)? {
            tracing::debug!(user_id = user.id, "Rejected login");
            return Err(AppError::Authentication(INVALID_CREDENTIALS.to_string()));
        }

        let token = self.create_token_for_user(&user)?;
        Ok((token, user))
    }

    fn create_token_for_user(&self, user: &User) -> AppResult<String> {
        UserClaims::issue(user, self.config.jwt_expiration_hours)
            .create_token(&self.config.jwt_secret)
            .map_err(|e| AppError::Internal(format!("Failed to create token: {}", e)))
    }

    fn verify_password(&self, user: &User, password: &str) -> AppResult<bool> {
        let parsed_hash = PasswordHash::new(&user.password_hash)
            .map_err(|_| AppError::Internal("Invalid password hash".to_string()))?;
        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok())
    }

    /// Hash a password using Argon2
    pub fn hash_password(&self, password: &str) -> AppResult<String> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))?;
        Ok(hash.to_string())
    }

    /// Get user by ID
    pub async fn get_by_id(&self, id: i32) -> AppResult<User> {
        self.repository
            .users
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", id)))
    }

    pub async fn list_by_role(&self, role: Role) -> AppResult<Vec<UserShort>> {
        let filter = UserFilter {
            role: Some(role),
            ..Default::default()
        };
        let users = self.repository.users.find_where(&filter).await?;
        Ok(users.into_iter().map(UserShort::from).collect())
    }

    /// Start a password reset. Unknown addresses are silently ignored.
    pub async fn forgot_password(&self, email: &str) -> AppResult<()> {
        let Some(mut user) = self.repository.users.find_by_email(email.trim()).await? else {
            tracing::debug!("Password reset requested for unknown address");
            return Ok(());
        };

        let token = generate_reset_token();
        let ttl = self.config.reset_token_ttl_minutes;
        user.reset_token_hash = Some(hash_reset_token(&token));
        user.reset_token_expires_at = Some(Utc::now() + Duration::minutes(ttl));
        let user = self.repository.users.save(&user).await?;

        let link = format!(
            "{}/reset-password/{}",
            self.frontend_url.trim_end_matches('/'),
            token
        );
        self.notifier.notify(
            vec![user.email.clone()],
            "Password Reset Request".to_string(),
            password_reset_body(&link, ttl),
        );

        tracing::info!(user_id = user.id, "Password reset token issued");
        Ok(())
    }

    /// Complete a password reset; the token is single use
    pub async fn reset_password(&self, token: &str, new_password: &str) -> AppResult<()> {
        if new_password.len() < 6 {
            return Err(AppError::Validation(
                "Password must be at least 6 characters".to_string(),
            ));
        }

        let mut user = self
            .repository
            .users
            .find_by_reset_token(&hash_reset_token(token.trim()), Utc::now())
            .await?
            .ok_or_else(|| AppError::Validation("Invalid or expired reset token".to_string()))?;

        user.password_hash = self.hash_password(new_password)?;
        user.reset_token_hash = None;
        user.reset_token_expires_at = None;
        self.repository.users.save(&user).await?;

        tracing::info!(user_id = user.id, "Password reset completed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::{email::MockNotifier, testing::Fixture};
    use std::sync::Mutex;

    fn auth_config() -> AuthConfig {
        AuthConfig {
            jwt_secret: "test-secret".to_string(),
            jwt_expiration_hours: 24,
            reset_token_ttl_minutes: 60,
        }
    }

    fn service(fx: &Fixture, notifier: Arc<dyn Notifier>) -> UsersService {
        UsersService::new(
            fx.repository.clone(),
            auth_config(),
            "http://app.test/".to_string(),
            notifier,
        )
    }

    fn registration(email: &str, role: Role) -> RegisterUser {
        RegisterUser {
            name: "Alex".to_string(),
            email: email.to_string(),
            password: "secret1".to_string(),
            role,
            team_id: None,
        }
    }

    #[tokio::test]
    async fn test_register_then_login() {
        let fx = Fixture::new().await;
        let users = service(&fx, Fixture::silent_notifier());

        let user = users
            .register(registration("alex@example.com", Role::Technician))
            .await
            .unwrap();
        assert_ne!(user.password_hash, "secret1");

        let (token, logged_in) = users.authenticate("ALEX@example.com", "secret1").await.unwrap();
        assert_eq!(logged_in.id, user.id);
        let claims = UserClaims::from_token(&token, "test-secret").unwrap();
        assert_eq!(claims.role, Role::Technician);
        assert_eq!(claims.user_id, user.id);
    }

    #[tokio::test]
    async fn test_login_failures_are_uniform() {
        let fx = Fixture::new().await;
        let users = service(&fx, Fixture::silent_notifier());
        users
            .register(registration("alex@example.com", Role::Employee))
            .await
            .unwrap();

        let wrong_password = users.authenticate("alex@example.com", "nope").await.unwrap_err();
        let unknown = users.authenticate("ghost@example.com", "secret1").await.unwrap_err();
        assert_eq!(wrong_password.to_string(), unknown.to_string());
        assert!(matches!(unknown, AppError::Authentication(_)));
    }

    #[tokio::test]
    async fn test_register_rejects_duplicates_and_bad_input() {
        let fx = Fixture::new().await;
        let users = service(&fx, Fixture::silent_notifier());
        users
            .register(registration("alex@example.com", Role::Employee))
            .await
            .unwrap();

        let err = users
            .register(registration("Alex@Example.com", Role::Employee))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));

        let mut short = registration("sam@example.com", Role::Employee);
        short.password = "123".to_string();
        assert!(matches!(users.register(short).await.unwrap_err(), AppError::Validation(_)));

        let mut orphan = registration("sam@example.com", Role::Employee);
        orphan.team_id = Some(99);
        assert!(matches!(
            users.register(orphan).await.unwrap_err(),
            AppError::InvalidReference(_)
        ));
    }

    #[tokio::test]
    async fn test_list_by_role() {
        let fx = Fixture::new().await;
        fx.technician("t1@example.com").await;
        fx.technician("t2@example.com").await;
        fx.employee("e1@example.com").await;
        let users = service(&fx, Fixture::silent_notifier());

        assert_eq!(users.list_by_role(Role::Technician).await.unwrap().len(), 2);
        assert_eq!(users.list_by_role(Role::Employee).await.unwrap().len(), 1);
        assert!(users.list_by_role(Role::Manager).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_password_reset_flow() {
        let fx = Fixture::new().await;
        let sent = Arc::new(Mutex::new(Vec::<String>::new()));
        let mut notifier = MockNotifier::new();
        let sink = sent.clone();
        notifier
            .expect_notify()
            .withf(|to, subject, _| to == &vec!["alex@example.com".to_string()] && subject == "Password Reset Request")
            .times(1)
            .returning(move |_, _, body| sink.lock().unwrap().push(body));

        let users = service(&fx, Arc::new(notifier));
        users
            .register(registration("alex@example.com", Role::Employee))
            .await
            .unwrap();

        users.forgot_password("alex@example.com").await.unwrap();
        users.forgot_password("ghost@example.com").await.unwrap();

        let body = sent.lock().unwrap()[0].clone();
        let token = body
            .lines()
            .find_map(|line| line.strip_prefix("http://app.test/reset-password/"))
            .unwrap()
            .to_string();
        assert_eq!(token.len(), 40);

        let stored = fx.repository.users.find_by_email("alex@example.com").await.unwrap().unwrap();
        assert_eq!(stored.reset_token_hash, Some(hash_reset_token(&token)));

        users.reset_password(&token, "brand-new").await.unwrap();
        assert!(users.authenticate("alex@example.com", "brand-new").await.is_ok());

        let reused = users.reset_password(&token, "another1").await.unwrap_err();
        assert!(matches!(reused, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_expired_reset_token_is_rejected() {
        let fx = Fixture::new().await;
        let users = service(&fx, Fixture::silent_notifier());
        let user = users
            .register(registration("alex@example.com", Role::Employee))
            .await
            .unwrap();

        let mut expired = user.clone();
        expired.reset_token_hash = Some(hash_reset_token("stale"));
        expired.reset_token_expires_at = Some(Utc::now() - Duration::minutes(1));
        fx.repository.users.save(&expired).await.unwrap();

        let err = users.reset_password("stale", "brand-new").await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }
}
