// Multipart form reading shared by the upload endpoints and the file
// security page.

use std::collections::HashMap;

use axum::body::Bytes;
use axum::extract::Multipart;

use crate::middleware::AppError;

pub const FILE_FIELD: &str = "file";

#[derive(Debug)]
pub struct UploadedFile {
    pub name: String,
    pub content_type: String,
    pub bytes: Bytes,
}

#[derive(Debug, Default)]
pub struct UploadForm {
    pub file: Option<UploadedFile>,
    /// Plain text fields by name
    pub fields: HashMap<String, String>,
}

impl UploadForm {
    pub fn require_file(&mut self) -> Result<UploadedFile, AppError> {
        self.file
            .take()
            .ok_or_else(|| AppError::Validation("Please select a file".to_string()))
    }

    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }
}

/// Drain a multipart body. The `file` part may be at most `limit` bytes.
pub async fn read_form(mut multipart: Multipart, limit: usize) -> Result<UploadForm, AppError> {
    let mut form = UploadForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Multipart(e.to_string()))?
    {
        let name = field.name().unwrap_or_default().to_string();
        if name == FILE_FIELD {
            let file_name = field.file_name().unwrap_or("upload").to_string();
            let content_type = field
                .content_type()
                .unwrap_or("application/octet-stream")
                .to_string();
            let bytes = field
                .bytes()
                .await
                .map_err(|e| AppError::Multipart(e.to_string()))?;
            if bytes.len() > limit {
                return Err(AppError::PayloadTooLarge { limit });
            }
            form.file = Some(UploadedFile {
                name: file_name,
                content_type,
                bytes,
            });
        } else {
            let text = field
                .text()
                .await
                .map_err(|e| AppError::Multipart(e.to_string()))?;
            form.fields.insert(name, text);
        }
    }

    Ok(form)
}
