use chrono::Duration;
use chrono::Local;
use hmac::{Hmac, Mac};
use jwt::SignWithKey;
use jwt::VerifyWithKey;
use serde::Deserialize;
use serde::Serialize;
use sha2::Sha256;

use crate::database::error::{Error, RequestError};
use crate::database::schema::{Id, User, UserRole};

use super::permissions::ActionType;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct JwtSessionData {
    pub user_id: Id,
    pub username: String,
    pub role: UserRole,
    iat: i64,
    exp: i64,
}

impl JwtSessionData {
    pub fn new(id: Id, username: String, role: UserRole, ttl_hours: i64) -> Self {
        let now = Local::now();
        let iat = now.timestamp();
        let exp = (now + Duration::hours(ttl_hours)).timestamp();

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
    pub user_id: Id,
    pub username: String,
    pub role: UserRole,
    pub is_admin: bool,
}

impl SessionData {
    pub fn authenticate(&self, action: ActionType) -> Result<(), Error> {
        if !action.authenticate(self) {
            return Err(
                RequestError::Unauthorized.new("You don't have permission to perform this action")
            );
        }
        Ok(())
    }
}

impl Into<SessionData> for JwtSessionData {
    fn into(self) -> SessionData {
        SessionData {
            username: self.username,
            user_id: self.user_id,
            is_admin: self.role == UserRole::Admin,
            role: self.role,
        }
    }
}

pub fn generate_jwt_session(user: &User, secret: &str, ttl_hours: i64) -> String {
    let key: Hmac<Sha256> = Hmac::new_from_slice(secret.as_bytes())
        .expect("HMAC accepts keys of any length");
    let claims = JwtSessionData::new(
        user.id,
        user.username.to_owned(),
        user.role.to_owned(),
        ttl_hours,
    );

    claims.sign_with_key(&key).expect("HMAC signing is infallible")
}

pub fn verify_jwt_session(token: String, secret: &str) -> Result<JwtSessionData, Error> {
    let key: Hmac<Sha256> = Hmac::new_from_slice(secret.as_bytes())
        .expect("HMAC accepts keys of any length");

    token
        .verify_with_key(&key)
        .map_err(|_| RequestError::InvalidSession.new("Invalid session; Invalid token"))
        .map(|session: JwtSessionData| {
            let now = Local::now().timestamp();

            if (session.exp - now).is_negative() {
                return Err(RequestError::InvalidSession.new("Invalid session; Token expired"));
            }
            Ok(session)
        })?
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(role: UserRole) -> User {
        User {
            id: 3,
            username: String::from("chef"),
            email: String::from("chef@example.com"),
            first_name: String::from("Julia"),
            last_name: String::from("Child"),
            password: String::from("hash"),
            role,
        }
    }

    #[test]
    fn token_round_trip() {
        let token = generate_jwt_session(&user(UserRole::User), "test-secret", 1);
        let session = verify_jwt_session(token, "test-secret").unwrap();

        assert_eq!(session.user_id, 3);
        assert_eq!(session.username, "chef");
        assert_eq!(session.role, UserRole::User);
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let token = generate_jwt_session(&user(UserRole::User), "test-secret", 1);
        assert!(verify_jwt_session(token, "other-secret").is_err());
    }

    #[test]
    fn expired_token_is_rejected() {
        let claims = JwtSessionData {
            user_id: 3,
            username: String::from("chef"),
            role: UserRole::User,
            iat: 0,
            exp: 1,
        };
        let key: Hmac<Sha256> = Hmac::new_from_slice(b"test-secret").unwrap();
        let token = claims.sign_with_key(&key).unwrap();

        let error = verify_jwt_session(token, "test-secret").unwrap_err();
        assert_eq!(error.code, 401);
    }

    #[test]
    fn admin_flag_follows_role() {
        let session: SessionData =
            JwtSessionData::new(1, String::from("boss"), UserRole::Admin, 1).into();
        assert!(session.is_admin);

        let session: SessionData =
            JwtSessionData::new(2, String::from("cook"), UserRole::User, 1).into();
        assert!(!session.is_admin);
    }
}
