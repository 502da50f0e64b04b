use axum::extract::{DefaultBodyLimit, Multipart};
use serde::de::DeserializeOwned;

use crate::error::AppError;
use crate::extractors::json::describe_json_error;
use crate::services::assets::ImageUpload;

pub fn image_upload_body_limit() -> DefaultBodyLimit {
    DefaultBodyLimit::max(64 * 1024 * 1024) // 64 MB
}

/// A multipart request made of one JSON part and any number of file parts.
pub struct JsonWithImages<T> {
    pub payload: T,
    pub images: Vec<ImageUpload>,
}

/// Read `json_field` as JSON and collect every `file_field` part as an upload.
///
/// Unknown fields are ignored. File parts without a filename and without content
/// (what browsers send for an empty file input) are skipped.
pub async fn read_json_with_images<T: DeserializeOwned>(
    multipart: &mut Multipart,
    json_field: &str,
    file_field: &str,
) -> Result<JsonWithImages<T>, AppError> {
    let mut payload: Option<T> = None;
    let mut images = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Multipart error: {e}")))?
    {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };

        if name == json_field {
            let text = field
                .text()
                .await
                .map_err(|e| AppError::Validation(format!("Failed to read '{json_field}': {e}")))?;
            payload = Some(serde_json::from_str(&text).map_err(|e| {
                AppError::Validation(describe_json_error(&format!("'{json_field}'"), &e))
            })?);
        } else if name == file_field {
            let file_name = field.file_name().unwrap_or_default().to_string();
            let data = field
                .bytes()
                .await
                .map_err(|e| AppError::Validation(format!("Failed to read '{file_field}': {e}")))?;
            if file_name.is_empty() && data.is_empty() {
                continue;
            }
            images.push(ImageUpload {
                file_name,
                data: data.to_vec(),
            });
        }
    }

    let payload =
        payload.ok_or_else(|| AppError::Validation(format!("Missing '{json_field}' field")))?;
    Ok(JsonWithImages { payload, images })
}
