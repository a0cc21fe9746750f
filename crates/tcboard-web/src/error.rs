use crate::api::proxy::cors;
use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use log::error;
use serde::Serialize;
use thiserror::Error;

/// Anything that goes wrong between receiving a request and handing back the
/// upstream body. Rendered as a JSON envelope: `404` for an unroutable path,
/// `500` for everything else.
#[derive(Error, Debug)]
pub enum RelayError {
    /// The rewritten target could not be parsed as a URL.
    #[error("invalid upstream URL: {0}")]
    Url(#[from] url::ParseError),

    /// Connecting to, or reading the body from, the upstream host failed.
    #[error(transparent)]
    Upstream(#[from] reqwest::Error),

    /// The inbound path does not name an upstream path.
    #[error("no upstream route for {0}")]
    Route(String),

    /// The upstream answered with a status actix cannot represent.
    #[error("invalid upstream status code: {0}")]
    Status(u16),
}

/// `{ "error": "<message>" }`
#[derive(Serialize, Debug)]
pub struct ErrorEnvelope {
    pub error: String,
}

impl ResponseError for RelayError {
    fn status_code(&self) -> StatusCode {
        match self {
            RelayError::Route(_) => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        error!("relay failure: {self}");
        cors(&mut HttpResponse::build(self.status_code())).json(ErrorEnvelope {
            error: self.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;

    #[actix_web::test]
    async fn test_error_response_is_json_envelope() {
        let err = RelayError::Status(1000);
        let response = err.error_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            response
                .headers()
                .get("Access-Control-Allow-Origin")
                .and_then(|v| v.to_str().ok()),
            Some("*")
        );

        let body = to_bytes(response.into_body()).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "error": "invalid upstream status code: 1000" })
        );
    }

    #[test]
    fn test_unroutable_path_is_404() {
        let err = RelayError::Route("/.netlify/functions/proxy@evil.example/x".into());
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(err.error_response().status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_url_error_message() {
        let err: RelayError = url::Url::parse("not a url").unwrap_err().into();
        assert!(err.to_string().starts_with("invalid upstream URL"));
    }
}
