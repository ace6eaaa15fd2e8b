//! Slate submission handler.

use std::sync::Arc;

use axum::{
    extract::{
        multipart::{Multipart, MultipartRejection},
        State,
    },
    http::StatusCode,
    Json,
};
use serde::Serialize;
use serde_json::Value;
use slaterunner_core::{PipelineDebug, PipelineError, Slate};
use tracing::{info, warn};

use super::upload::{read_upload, UploadError};
use crate::metrics::{UPLOADS_TOTAL, UPLOAD_BYTES};
use crate::state::AppState;

/// Response envelope for `/submit`.
#[derive(Debug, Serialize)]
pub struct SubmitResponse {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lineups: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub debug: Option<PipelineDebug>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Raw platform text for remote failures.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extra: Option<String>,
}

impl SubmitResponse {
    fn success(lineups: Value, debug: PipelineDebug) -> Self {
        Self {
            ok: true,
            lineups: Some(lineups),
            debug: Some(debug),
            error: None,
            extra: None,
        }
    }

    fn failure(error: impl Into<String>) -> Self {
        Self {
            ok: false,
            lineups: None,
            debug: None,
            error: Some(error.into()),
            extra: None,
        }
    }
}

type SubmitResult = (StatusCode, Json<SubmitResponse>);

fn rejected(status: StatusCode, error: impl Into<String>) -> SubmitResult {
    UPLOADS_TOTAL.with_label_values(&["rejected"]).inc();
    (status, Json(SubmitResponse::failure(error)))
}

/// POST /api/v1/submit
///
/// Run the lineup pipeline on an uploaded slate CSV.
pub async fn submit(
    State(state): State<Arc<AppState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> SubmitResult {
    let form = match read_upload(multipart).await {
        Ok(form) => form,
        Err(UploadError { status, message }) => return rejected(status, message),
    };

    let slate = match Slate::from_upload(form.sport(), form.site(), form.file.as_deref()) {
        Ok(slate) => slate,
        Err(e) => return rejected(status_for(&e), e.to_string()),
    };

    let bytes = slate.csv_text.len();
    UPLOAD_BYTES.observe(bytes as f64);
    info!(
        "Slate upload: sport={}, site={}, file={:?}, {} bytes",
        slate.sport, slate.site, form.filename, bytes
    );

    match state.pipeline().run(slate).await {
        Ok(outcome) => {
            UPLOADS_TOTAL.with_label_values(&["ok"]).inc();
            (
                StatusCode::OK,
                Json(SubmitResponse::success(outcome.lineups, outcome.debug)),
            )
        }
        Err(failure) => {
            UPLOADS_TOTAL.with_label_values(&["failed"]).inc();
            let status = status_for(&failure.error);
            warn!("Submit failed ({}): {}", status, failure.error);

            let debug = (!failure.debug.is_empty()).then_some(failure.debug);
            (
                status,
                Json(SubmitResponse {
                    extra: failure.error.diagnostic(),
                    debug,
                    ..SubmitResponse::failure(failure.error.to_string())
                }),
            )
        }
    }
}

fn status_for(error: &PipelineError) -> StatusCode {
    if error.is_input_error() {
        StatusCode::BAD_REQUEST
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    }
}
