//! Reference server errors.

use thiserror::Error;

/// Errors the reference server reports as HTTP failures.
#[derive(Error, Debug)]
pub enum ServerError {
    /// No record with the requested id.
    #[error("no such record")]
    NotFound,

    /// The request did not match any supported route.
    #[error("unsupported route: {0}")]
    UnknownRoute(String),

    /// The request was malformed.
    #[error("malformed request: {0}")]
    BadRequest(String),
}

impl ServerError {
    /// The HTTP status this error maps to.
    pub fn status(&self) -> u16 {
        match self {
            ServerError::NotFound => 404,
            ServerError::UnknownRoute(_) => 404,
            ServerError::BadRequest(_) => 400,
        }
    }

    /// The HTTP status text this error maps to.
    pub fn status_text(&self) -> &'static str {
        match self {
            ServerError::NotFound => "Not Found",
            ServerError::UnknownRoute(_) => "Not Found",
            ServerError::BadRequest(_) => "Bad Request",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses_map_to_http() {
        assert_eq!(ServerError::NotFound.status(), 404);
        assert_eq!(ServerError::UnknownRoute("/x".into()).status(), 404);
        assert_eq!(ServerError::BadRequest("no id".into()).status(), 400);
        assert_eq!(ServerError::NotFound.status_text(), "Not Found");
    }
}
