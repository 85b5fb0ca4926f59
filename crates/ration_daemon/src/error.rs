use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use ration_core::CalcError;
use serde_json::json;

#[derive(Debug)]
pub enum ApiError {
    Calc(CalcError),
    UnknownTable(String),
}

impl From<CalcError> for ApiError {
    fn from(err: CalcError) -> Self {
        ApiError::Calc(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::Calc(err) => {
                let status = match err {
                    CalcError::InvalidInput { .. } | CalcError::DuplicateKey { .. } => {
                        StatusCode::BAD_REQUEST
                    }
                    CalcError::OutOfRange { .. } => StatusCode::NOT_FOUND,
                    CalcError::ReferenceDataMissing { .. } => {
                        tracing::error!("request hit missing reference data: {err}");
                        StatusCode::SERVICE_UNAVAILABLE
                    }
                };
                let mut body = json!({ "error": err.to_string(), "code": err.code() });
                if let CalcError::InvalidInput { field, .. } = &err {
                    body["field"] = json!(field);
                }
                (status, body)
            }
            ApiError::UnknownTable(message) => (
                StatusCode::NOT_FOUND,
                json!({ "error": message, "code": "unknown_table" }),
            ),
        };
        (status, Json(body)).into_response()
    }
}
