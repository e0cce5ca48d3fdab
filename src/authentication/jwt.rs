use chrono::Duration;
use chrono::Local;
use hmac::{Hmac, Mac};
use jwt::SignWithKey;
use jwt::VerifyWithKey;
use serde::Deserialize;
use serde::Serialize;
use sha2::Sha256;

use crate::database::schema::{User, UserRole};
use crate::error::ApiError;

use super::permissions::ActionType;

const SESSION_LIFETIME_HOURS: i64 = 24;

fn session_key() -> Hmac<Sha256> {
    let secret =
        std::env::var("JWT_SECRET").unwrap_or_else(|_| String::from("insecure-dev-secret"));
    Hmac::new_from_slice(secret.as_bytes()).unwrap()
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct JwtSessionData {
    pub user_id: i32,
    pub username: String,
    pub role: UserRole,
    iat: i64,
    exp: i64,
}

impl JwtSessionData {
    pub fn new(id: i32, username: String, role: UserRole) -> Self {
        let now = Local::now();
        let iat = now.timestamp();
        let exp = (now + Duration::hours(SESSION_LIFETIME_HOURS)).timestamp();

        Self {
            user_id: id,
            username,
            role,
            iat,
            exp,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SessionData {
    pub user_id: i32,
    pub username: String,
    pub role: UserRole,
    pub is_admin: bool,
}

impl SessionData {
    pub fn authenticate(&self, action: ActionType) -> Result<(), ApiError> {
        if !action.authenticate(self) {
            return Err(ApiError::Forbidden(String::from(
                "You don't have permission to perform this action",
            )));
        }
        Ok(())
    }
}

impl From<JwtSessionData> for SessionData {
    fn from(value: JwtSessionData) -> Self {
        SessionData {
            user_id: value.user_id,
            username: value.username,
            is_admin: value.role == UserRole::Admin,
            role: value.role,
        }
    }
}

pub fn generate_jwt_session(user: &User) -> String {
    let claims = JwtSessionData::new(user.id, user.username.to_owned(), user.role.to_owned());

    claims.sign_with_key(&session_key()).unwrap()
}

pub fn verify_jwt_session(token: &str) -> Result<JwtSessionData, ApiError> {
    token
        .verify_with_key(&session_key())
        .map_err(|_| ApiError::Unauthorized(String::from("Invalid session; Invalid token")))
        .map(|session: JwtSessionData| {
            let now = Local::now().timestamp();

            if (session.exp - now).is_negative() {
                return Err(ApiError::Unauthorized(String::from(
                    "Invalid session; Token expired",
                )));
            }
            Ok(session)
        })?
}

/// Pulls the token out of an `Authorization` header. Both the `Token`
/// scheme and plain `Bearer` are accepted.
pub fn token_from_header(header: &str) -> Result<&str, ApiError> {
    let mut parts = header.splitn(2, ' ');
    match (parts.next(), parts.next()) {
        (Some(scheme), Some(token))
            if scheme.eq_ignore_ascii_case("token") || scheme.eq_ignore_ascii_case("bearer") =>
        {
            Ok(token.trim())
        }
        _ => Err(ApiError::Unauthorized(String::from(
            "Invalid authorization header",
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_user() -> User {
        User {
            id: 7,
            email: String::from("cook@example.com"),
            username: String::from("cook"),
            password: String::new(),
            first_name: String::from("Ada"),
            last_name: String::from("Byron"),
            role: UserRole::User,
        }
    }

    #[test]
    fn sign_then_verify_roundtrip() {
        let token = generate_jwt_session(&test_user());
        let session = verify_jwt_session(&token).unwrap();
        assert_eq!(session.user_id, 7);
        assert_eq!(session.username, "cook");
        assert_eq!(session.role, UserRole::User);
    }

    #[test]
    fn tampered_token_is_rejected() {
        let mut token = generate_jwt_session(&test_user());
        token.push('x');
        assert!(verify_jwt_session(&token).is_err());
    }

    #[test]
    fn header_schemes() {
        assert_eq!(token_from_header("Token abc.def.ghi").unwrap(), "abc.def.ghi");
        assert_eq!(token_from_header("Bearer abc.def.ghi").unwrap(), "abc.def.ghi");
        assert!(token_from_header("abc.def.ghi").is_err());
        assert!(token_from_header("Basic dXNlcg==").is_err());
    }

    #[test]
    fn admin_flag_follows_role() {
        let mut user = test_user();
        user.role = UserRole::Admin;
        let session: SessionData = verify_jwt_session(&generate_jwt_session(&user))
            .unwrap()
            .into();
        assert!(session.is_admin);
    }
}
