use std::convert::Infallible;

use warp::{
    reject::{self, Rejection},
    Filter,
};

use super::jwt::{verify_jwt_session, JwtSessionData};

#[derive(Debug)]
struct Unauthorized;

impl reject::Reject for Unauthorized {}

/// Requires a valid session cookie, discarding the claims.
pub fn with_auth(secret: String) -> impl Filter<Extract = ((),), Error = Rejection> + Clone {
    warp::cookie::<String>("session").and_then(move |session: String| {
        let secret = secret.clone();
        async move {
            if verify_jwt_session(session, &secret).is_ok() {
                Ok(())
            } else {
                Err(warp::reject::custom(Unauthorized))
            }
        }
    })
}

/// Requires a valid session cookie and extracts the claims.
pub fn with_session(
    secret: String,
) -> impl Filter<Extract = (JwtSessionData,), Error = Rejection> + Clone {
    warp::cookie::<String>("session").and_then(move |session: String| {
        let secret = secret.clone();
        async move {
            match verify_jwt_session(session, &secret) {
                Ok(data) => Ok(data),
                Err(_) => Err(warp::reject::custom(Unauthorized)),
            }
        }
    })
}

/// Extracts the claims when present; anonymous requests pass through.
pub fn with_possible_session(
    secret: String,
) -> impl Filter<Extract = (Option<JwtSessionData>,), Error = Infallible> + Clone {
    warp::cookie::optional::<String>("session").map(move |session: Option<String>| {
        session.and_then(|session| verify_jwt_session(session, &secret).ok())
    })
}
