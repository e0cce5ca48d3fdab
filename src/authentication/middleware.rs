use warp::{reject::Rejection, Filter};

use super::jwt::{token_from_header, verify_jwt_session, SessionData};

/// Requires a valid `Authorization: Token <jwt>` header.
pub fn with_session() -> impl Filter<Extract = (SessionData,), Error = Rejection> + Copy {
    warp::header::<String>("authorization").and_then(|header: String| async move {
        match token_from_header(&header).and_then(verify_jwt_session) {
            Ok(data) => Ok(SessionData::from(data)),
            Err(e) => Err(e.reject()),
        }
    })
}

/// Extracts the session when present and valid, `None` otherwise. Read
/// endpoints use this for the per-user flags on recipes and profiles.
pub fn with_possible_session(
) -> impl Filter<Extract = (Option<SessionData>,), Error = Rejection> + Copy {
    warp::header::optional::<String>("authorization").map(|header: Option<String>| {
        header
            .as_deref()
            .and_then(|h| token_from_header(h).and_then(verify_jwt_session).ok())
            .map(SessionData::from)
    })
}
