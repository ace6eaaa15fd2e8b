//! Multipart slate upload decoding shared by the submit and echo handlers.

use axum::{
    body::Bytes,
    extract::multipart::{Multipart, MultipartRejection},
    http::StatusCode,
};
use tracing::debug;

/// Sport used when the form leaves it blank.
pub const DEFAULT_SPORT: &str = "NBA";
/// Site used when the form leaves it blank.
pub const DEFAULT_SITE: &str = "DK";

/// Fields read from an upload form.
#[derive(Debug, Default)]
pub struct UploadForm {
    pub file: Option<Bytes>,
    pub filename: Option<String>,
    pub sport: Option<String>,
    pub site: Option<String>,
}

impl UploadForm {
    pub fn sport(&self) -> &str {
        self.sport.as_deref().unwrap_or(DEFAULT_SPORT)
    }

    pub fn site(&self) -> &str {
        self.site.as_deref().unwrap_or(DEFAULT_SITE)
    }
}

/// Why an upload could not be read.
#[derive(Debug)]
pub struct UploadError {
    pub status: StatusCode,
    pub message: String,
}

impl UploadError {
    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }
}

/// Read `file`, `sport` and `site` from a multipart body. Unknown fields are
/// ignored; blank text fields count as absent.
pub async fn read_upload(
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<UploadForm, UploadError> {
    let mut multipart = multipart.map_err(|rejection| {
        UploadError::new(
            StatusCode::BAD_REQUEST,
            format!("Expected a multipart form upload: {}", rejection.body_text()),
        )
    })?;

    let mut form = UploadForm::default();

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => {
                return Err(UploadError::new(
                    e.status(),
                    format!("Failed to read upload: {}", e.body_text()),
                ))
            }
        };

        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "file" => {
                form.filename = field.file_name().map(|s| s.to_string());
                match field.bytes().await {
                    Ok(bytes) => form.file = Some(bytes),
                    Err(e) => {
                        return Err(UploadError::new(
                            e.status(),
                            format!("Failed to read file: {}", e.body_text()),
                        ))
                    }
                }
            }
            "sport" => form.sport = non_blank(field.text().await.ok()),
            "site" => form.site = non_blank(field.text().await.ok()),
            other => debug!("Ignoring unknown form field {:?}", other),
        }
    }

    Ok(form)
}

fn non_blank(text: Option<String>) -> Option<String> {
    text.map(|t| t.trim().to_string()).filter(|t| !t.is_empty())
}
