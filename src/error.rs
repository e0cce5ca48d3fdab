use std::convert::Infallible;

use serde_json::json;
use thiserror::Error;
use warp::{http::StatusCode, reject::Rejection, reply::Reply};

/// Client-facing error for every action and handler. Validation failures and
/// duplicate unique relations render as 400, missing rows as 404.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    Database(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn reject(self) -> Rejection {
        warp::reject::custom(self)
    }
}

impl warp::reject::Reject for ApiError {}

/// Renders every rejection as a JSON body with a `detail` field, the same
/// shape the actions use for their own failures.
pub async fn handle_rejection(err: Rejection) -> Result<impl Reply, Infallible> {
    let (status, message) = if let Some(e) = err.find::<ApiError>() {
        if let ApiError::Database(info) = e {
            log::error!("database failure: {info}");
        }
        (e.status(), e.to_string())
    } else if err.is_not_found() {
        (StatusCode::NOT_FOUND, String::from("Not found"))
    } else if let Some(e) = err.find::<warp::filters::body::BodyDeserializeError>() {
        (StatusCode::BAD_REQUEST, e.to_string())
    } else if let Some(e) = err.find::<warp::reject::MissingHeader>() {
        if e.name().eq_ignore_ascii_case("authorization") {
            (
                StatusCode::UNAUTHORIZED,
                String::from("Authentication credentials were not provided"),
            )
        } else {
            (StatusCode::BAD_REQUEST, e.to_string())
        }
    } else if err.find::<warp::reject::MethodNotAllowed>().is_some() {
        (
            StatusCode::METHOD_NOT_ALLOWED,
            String::from("Method not allowed"),
        )
    } else {
        log::error!("unhandled rejection: {:?}", err);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            String::from("Internal server error"),
        )
    };

    let body = warp::reply::json(&json!({ "detail": message }));
    Ok(warp::reply::with_status(body, status))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses_map_to_http_classes() {
        assert_eq!(
            ApiError::Validation(String::new()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::NotFound(String::new()).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::Unauthorized(String::new()).status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError::Forbidden(String::new()).status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            ApiError::Database(String::new()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
