//! JSON extractor whose rejections use the API error envelope.

use axum::{
    extract::FromRequest,
    response::{IntoResponse, Response},
};
use serde::Serialize;

use super::error::ApiError;

/// Drop-in for `axum::Json`; a body that fails to parse becomes a 400
/// `validation_error` instead of a plain-text 4xx.
#[derive(Debug, Clone, Copy, Default, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct Json<T>(pub T);

impl<T: Serialize> IntoResponse for Json<T> {
    fn into_response(self) -> Response {
        axum::Json(self.0).into_response()
    }
}
