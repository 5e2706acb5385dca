use crate::config::{DefaultsConfig, SecurityConfig};
use crate::db::{Store, User};

use super::auth_service::{AuthError, AuthService, ProfileInfo, UserInfo};

pub struct AuthServiceImpl {
    store: Store,
    security: SecurityConfig,
    defaults: DefaultsConfig,
}

impl AuthServiceImpl {
    #[must_use]
    pub const fn new(store: Store, security: SecurityConfig, defaults: DefaultsConfig) -> Self {
        Self {
            store,
            security,
            defaults,
        }
    }

    fn user_info(user: User) -> UserInfo {
        UserInfo {
            id: user.id,
            username: user.username,
            email: user.email,
            created_at: user.created_at,
        }
    }

    fn validate_username(username: &str) -> Result<&str, AuthError> {
        let username = username.trim();
        if username.is_empty() {
            return Err(AuthError::validation("username", "Username is required"));
        }
        if username.chars().count() > 150 {
            return Err(AuthError::validation(
                "username",
                "Username must be at most 150 characters",
            ));
        }
        if !username
            .chars()
            .all(|c| c.is_alphanumeric() || matches!(c, '_' | '-' | '.' | '@' | '+'))
        {
            return Err(AuthError::validation(
                "username",
                "Username may only contain letters, digits and _ - . @ +",
            ));
        }
        Ok(username)
    }

    fn validate_email(email: &str) -> Result<&str, AuthError> {
        let email = email.trim();
        let well_formed = email.split_once('@').is_some_and(|(local, domain)| {
            !local.is_empty() && domain.contains('.') && !domain.starts_with('.')
        });
        if !well_formed {
            return Err(AuthError::validation(
                "email",
                "Enter a valid email address",
            ));
        }
        Ok(email)
    }

    fn validate_password(&self, password: &str) -> Result<(), AuthError> {
        if password.chars().count() < self.security.minimum_password_length {
            return Err(AuthError::validation(
                "password",
                format!(
                    "Password must be at least {} characters",
                    self.security.minimum_password_length
                ),
            ));
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl AuthService for AuthServiceImpl {
    async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<UserInfo, AuthError> {
        let username = Self::validate_username(username)?;
        let email = Self::validate_email(email)?;
        self.validate_password(password)?;

        if self.store.get_user_by_username(username).await?.is_some() {
            return Err(AuthError::validation(
                "username",
                "A user with that username already exists",
            ));
        }
        if self.store.get_user_by_email(email).await?.is_some() {
            return Err(AuthError::validation(
                "email",
                "A user with that email already exists",
            ));
        }

        let user = match self
            .store
            .create_user_with_profile(
                username,
                email,
                password,
                &self.defaults.profile_color,
                &self.security,
            )
            .await
        {
            Ok(user) => user,
            // Raced another registration into one of the unique indexes.
            Err(e) if crate::db::is_unique_violation(&e) => {
                return Err(AuthError::validation(
                    "username",
                    "A user with that username or email already exists",
                ));
            }
            Err(e) => return Err(e.into()),
        };

        tracing::info!(username = %user.username, "User registered");

        Ok(Self::user_info(user))
    }

    async fn login(&self, username: &str, password: &str) -> Result<UserInfo, AuthError> {
        let is_valid = self.store.verify_user_password(username, password).await?;
        if !is_valid {
            return Err(AuthError::InvalidCredentials);
        }

        let user = self
            .store
            .get_user_by_username(username)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        Ok(Self::user_info(user))
    }

    async fn get_user_info(&self, username: &str) -> Result<UserInfo, AuthError> {
        let user = self
            .store
            .get_user_by_username(username)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        Ok(Self::user_info(user))
    }

    async fn get_profile(&self, user_id: i32) -> Result<ProfileInfo, AuthError> {
        let user = self
            .store
            .get_user_by_id(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        let profile = self
            .store
            .get_profile(user_id)
            .await?
            .ok_or_else(|| AuthError::Internal(format!("Profile missing for user {user_id}")))?;

        Ok(ProfileInfo {
            username: user.username,
            email: user.email,
            color: profile.color,
        })
    }

    async fn update_profile(
        &self,
        user_id: i32,
        color: Option<String>,
        email: Option<String>,
    ) -> Result<ProfileInfo, AuthError> {
        if let Some(color) = color {
            let color = color.trim();
            if !is_hex_color(color) {
                return Err(AuthError::validation(
                    "color",
                    "Color must be a hex value like #3fa7d6",
                ));
            }
            self.store.update_profile_color(user_id, color).await?;
        }

        if let Some(email) = email {
            let email = Self::validate_email(&email)?;
            if let Some(existing) = self.store.get_user_by_email(email).await?
                && existing.id != user_id
            {
                return Err(AuthError::validation(
                    "email",
                    "A user with that email already exists",
                ));
            }
            self.store.update_user_email(user_id, email).await?;
        }

        self.get_profile(user_id).await
    }

    async fn change_password(
        &self,
        username: &str,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), AuthError> {
        self.validate_password(new_password)?;

        if current_password == new_password {
            return Err(AuthError::validation(
                "password",
                "New password must be different from current password",
            ));
        }

        let is_valid = self
            .store
            .verify_user_password(username, current_password)
            .await?;
        if !is_valid {
            return Err(AuthError::validation(
                "password",
                "Current password is incorrect",
            ));
        }

        self.store
            .update_user_password(username, new_password, &self.security)
            .await?;

        tracing::info!(username, "Password changed");

        Ok(())
    }
}

fn is_hex_color(value: &str) -> bool {
    let Some(digits) = value.strip_prefix('#') else {
        return false;
    };
    matches!(digits.len(), 3 | 6) && digits.chars().all(|c| c.is_ascii_hexdigit())
}

#[cfg(test)]
mod tests {
    use super::is_hex_color;

    #[test]
    fn accepts_short_and_long_hex_colors() {
        assert!(is_hex_color("#fff"));
        assert!(is_hex_color("#3fa7d6"));
    }

    #[test]
    fn rejects_non_hex_values() {
        assert!(!is_hex_color("red"));
        assert!(!is_hex_color("#12345"));
        assert!(!is_hex_color("#gggggg"));
        assert!(!is_hex_color("3fa7d6"));
    }
}
