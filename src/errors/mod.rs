use axum::http::StatusCode;

/// Common trait for all custom error types in the application
pub trait AppError: std::error::Error + Send + Sync + 'static {
    /// Get the HTTP status code for this error
    fn status_code(&self) -> StatusCode;

    /// Get a user-friendly error message
    fn user_message(&self) -> String;

    /// Get the error code for frontend handling
    fn error_code(&self) -> &'static str;

    /// Extra JSON fields merged into the response body
    fn details(&self) -> Option<serde_json::Map<String, serde_json::Value>> {
        None
    }
}

/// Macro to implement IntoResponse for all AppError types
/// This provides consistent HTTP response formatting
macro_rules! impl_into_response {
    ($error_type:ty) => {
        impl axum::response::IntoResponse for $error_type {
            fn into_response(self) -> axum::response::Response {
                use crate::errors::AppError;
                use axum::response::Json;
                use serde_json::json;

                let status = self.status_code();
                if status.is_server_error() {
                    tracing::error!("{} ({}): {}", self.error_code(), status, self);
                } else {
                    tracing::warn!("{} ({}): {}", self.error_code(), status, self);
                }

                let mut body = json!({
                    "error": self.user_message(),
                    "code": self.error_code(),
                    "status": status.as_u16()
                });
                if let (Some(details), Some(object)) = (self.details(), body.as_object_mut()) {
                    object.extend(details);
                }

                (status, Json(body)).into_response()
            }
        }
    };
}


pub mod webdav;

pub use webdav::{ProxyError, WebDavError};
