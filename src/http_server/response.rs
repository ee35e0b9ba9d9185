use crate::Error;
use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// Body of every API response.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ApiResponse<T> {
    Success { data: T },
    Error { message: String },
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self::Success { data }
    }

    pub fn err(message: impl Display) -> Self {
        Self::Error {
            message: message.to_string(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct VerificationResponse {
    pub verified: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Verification(#[from] Error),
    #[error("contract is not verified")]
    NotVerified,
    #[error("{0}")]
    BadRequest(String),
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Verification(Error::Client(_)) | ApiError::BadRequest(_) => {
                StatusCode::BAD_REQUEST
            }
            ApiError::Verification(Error::Server(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::NotVerified => StatusCode::NOT_FOUND,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(ApiResponse::<()>::err(self))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{tests::parse::test_serialize_json_ok, ClientError, ServerError};
    use serde_json::json;

    #[test]
    fn serialize_envelope() {
        test_serialize_json_ok(vec![
            (
                ApiResponse::ok(VerificationResponse { verified: true }),
                json!({"status": "success", "data": {"verified": true}}),
            ),
            (
                ApiResponse::err("contract is not verified"),
                json!({"status": "error", "message": "contract is not verified"}),
            ),
        ]);
    }

    #[test]
    fn error_status_codes() {
        let client: ApiError = Error::from(ClientError::InvalidOptimizationRuns).into();
        let server: ApiError = Error::from(ServerError::Rpc("timeout".to_string())).into();

        assert_eq!(client.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(server.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(ApiError::NotVerified.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(
            ApiError::BadRequest("invalid address".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
    }
}
