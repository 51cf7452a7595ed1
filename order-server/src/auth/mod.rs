//! Authentication
//!
//! - [`JwtService`] - token issue/validation
//! - [`CurrentUser`] - identity decoded from the `auth_token` cookie
//! - [`require_admin`] - admin gate middleware

mod extractor;
pub mod jwt;
pub mod middleware;
pub mod password;
mod seed;

pub use jwt::{Claims, JwtError, JwtService};
pub use middleware::{AUTH_COOKIE, auth_cookie, clear_auth_cookie, require_admin};
pub use seed::seed_admin;

use shared::error::AppError;
use shared::models::Role;

/// Authenticated caller
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub id: i64,
    pub email: String,
    pub role: Role,
}

impl CurrentUser {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

impl TryFrom<Claims> for CurrentUser {
    type Error = AppError;

    fn try_from(claims: Claims) -> Result<Self, Self::Error> {
        let id = claims
            .sub
            .parse()
            .map_err(|_| AppError::invalid_token("Malformed subject claim"))?;
        Ok(Self {
            id,
            email: claims.email,
            role: claims.role,
        })
    }
}

/// Basic shape check: `local@domain.tld`, no whitespace
pub fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    match domain.rsplit_once('.') {
        Some((host, tld)) => !host.is_empty() && !tld.is_empty(),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_shape() {
        assert!(is_valid_email("amy@example.com"));
        assert!(is_valid_email("a.b+c@mail.example.org"));
        assert!(!is_valid_email("amy@example"));
        assert!(!is_valid_email("@example.com"));
        assert!(!is_valid_email("amy@@example.com"));
        assert!(!is_valid_email("amy @example.com"));
        assert!(!is_valid_email("amy@.com"));
    }

    #[test]
    fn test_current_user_from_claims() {
        let claims = Claims {
            sub: "12".into(),
            email: "amy@example.com".into(),
            role: Role::Admin,
            exp: 0,
            iat: 0,
        };
        let user = CurrentUser::try_from(claims).unwrap();
        assert_eq!(user.id, 12);
        assert!(user.is_admin());
    }
}
