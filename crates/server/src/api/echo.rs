//! Upload diagnostics handler.

use axum::{
    extract::multipart::{Multipart, MultipartRejection},
    http::StatusCode,
    Json,
};
use serde::Serialize;

use super::upload::{read_upload, UploadError};

/// Characters of the decoded file returned as a preview.
const PREVIEW_CHARS: usize = 200;

#[derive(Debug, Serialize)]
pub struct EchoResponse {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bytes: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preview: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl EchoResponse {
    fn failure(error: impl Into<String>) -> Self {
        Self {
            ok: false,
            bytes: None,
            preview: None,
            error: Some(error.into()),
        }
    }
}

/// POST /api/v1/echo
///
/// Report what the server received without running the pipeline.
pub async fn echo(
    multipart: Result<Multipart, MultipartRejection>,
) -> (StatusCode, Json<EchoResponse>) {
    let form = match read_upload(multipart).await {
        Ok(form) => form,
        Err(UploadError { status, message }) => {
            return (status, Json(EchoResponse::failure(message)))
        }
    };

    let Some(bytes) = form.file else {
        return (StatusCode::BAD_REQUEST, Json(EchoResponse::failure("No file")));
    };

    let preview = String::from_utf8_lossy(&bytes)
        .chars()
        .take(PREVIEW_CHARS)
        .collect();

    (
        StatusCode::OK,
        Json(EchoResponse {
            ok: true,
            bytes: Some(bytes.len()),
            preview: Some(preview),
            error: None,
        }),
    )
}
