use serde::{Deserialize, Serialize};
use tower_api_client::{Error as ApiError, StatusCode};

#[derive(Debug)]
pub enum AssetApiError {
    /// The backend answered with a non-success status.
    Api(StatusCode, ErrorDetail),
    Internal(ApiError),
}

impl AssetApiError {
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            AssetApiError::Api(status, _) => Some(*status),
            AssetApiError::Internal(_) => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(StatusCode::NOT_FOUND)
    }
}

impl From<ApiError> for AssetApiError {
    fn from(value: ApiError) -> Self {
        match value {
            ApiError::ClientError(status, body) | ApiError::ServerError(status, body) => {
                AssetApiError::Api(status, ErrorDetail::from_body(&body))
            }
            e => AssetApiError::Internal(e),
        }
    }
}

impl std::fmt::Display for AssetApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AssetApiError::Internal(e) => write!(f, "Internal error: {}", e),
            AssetApiError::Api(status, detail) => write!(f, "({}) {}", status, detail.detail),
        }
    }
}

impl std::error::Error for AssetApiError {}

/// Error body returned by the backend: `{"detail": "..."}`.
///
/// Validation failures carry a structured `detail` array instead of a string;
/// those are kept as their JSON text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorDetail {
    pub detail: String,
}

impl ErrorDetail {
    pub fn new(detail: impl Into<String>) -> Self {
        Self {
            detail: detail.into(),
        }
    }

    pub(crate) fn from_body(body: &str) -> Self {
        #[derive(Deserialize)]
        struct RawBody {
            detail: serde_json::Value,
        }

        match serde_json::from_str::<RawBody>(body) {
            Ok(RawBody {
                detail: serde_json::Value::String(detail),
            }) => Self::new(detail),
            Ok(RawBody { detail }) => Self::new(detail.to_string()),
            Err(_) if body.trim().is_empty() => Self::new("no response body"),
            Err(_) => Self::new(body.trim()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detail_string_is_extracted() {
        let detail = ErrorDetail::from_body(r#"{"detail": "Account 7 not found"}"#);
        assert_eq!(detail.detail, "Account 7 not found");
    }

    #[test]
    fn structured_detail_is_kept_as_json() {
        let detail = ErrorDetail::from_body(r#"{"detail": [{"loc": ["body", "amount"]}]}"#);
        assert_eq!(detail.detail, r#"[{"loc":["body","amount"]}]"#);
    }

    #[test]
    fn unexpected_body_does_not_panic() {
        assert_eq!(ErrorDetail::from_body("Bad Gateway").detail, "Bad Gateway");
        assert_eq!(ErrorDetail::from_body("  ").detail, "no response body");
    }

    #[test]
    fn display_includes_status_and_detail() {
        let err = AssetApiError::Api(StatusCode::NOT_FOUND, ErrorDetail::new("missing"));
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "(404 Not Found) missing");
    }
}
