use std::collections::{BTreeMap, HashMap};

use axum::{extract::Multipart, http::StatusCode};
use serde::Serialize;
use validator::{ValidationError, ValidationErrors};

use crate::{
    error::AppError,
    uploads::{self, UploadedFile},
};

/// Field name to messages, every violation of a submission at once.
#[derive(Debug, Default, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0.entry(field.to_string()).or_default().push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[cfg(test)]
    pub fn get(&self, field: &str) -> &[String] {
        self.0.get(field).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn from_validation(result: Result<(), ValidationErrors>) -> Self {
        result.err().map(FieldErrors::from).unwrap_or_default()
    }

    /// Validator errors merged with checks the derive cannot express.
    pub fn collect(result: Result<(), ValidationErrors>, extra: FieldErrors) -> Self {
        let mut errors = FieldErrors::from_validation(result);
        for (field, messages) in extra.0 {
            for m in messages {
                errors.add(&field, m);
            }
        }
        errors
    }
}

impl From<ValidationErrors> for FieldErrors {
    fn from(errors: ValidationErrors) -> Self {
        let mut out = FieldErrors::default();
        for (field, errs) in errors.field_errors() {
            for e in errs.iter() {
                let message = e
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| e.code.to_string());
                out.add(&field, message);
            }
        }
        out
    }
}

fn error_with(code: &'static str, message: &'static str) -> ValidationError {
    let mut e = ValidationError::new(code);
    e.message = Some(message.into());
    e
}

pub fn validate_required(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(error_with("required", "This field is required."));
    }
    Ok(())
}

/// Empty is fine; anything else must be an absolute URL with a host.
pub fn validate_optional_url(value: &str) -> Result<(), ValidationError> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(());
    }
    match url::Url::parse(value) {
        Ok(u) if u.has_host() => Ok(()),
        _ => Err(error_with("url", "Invalid URL.")),
    }
}

/// Single-file image fields reject the whole submission on a bad type.
pub fn check_image_field(errors: &mut FieldErrors, field: &str, file: Option<&UploadedFile>) {
    if let Some(f) = file {
        if !uploads::is_allowed(&f.file_name) {
            errors.add(field, "Images only!");
        }
    }
}

/// Decoded `multipart/form-data` submission.
#[derive(Debug, Default)]
pub struct MultipartForm {
    fields: HashMap<String, String>,
    files: HashMap<String, Vec<UploadedFile>>,
}

impl MultipartForm {
    pub async fn read(mut mp: Multipart) -> Result<Self, AppError> {
        let mut form = MultipartForm::default();
        loop {
            let field = match mp.next_field().await {
                Ok(Some(field)) => field,
                Ok(None) => break,
                Err(e) => return Err(multipart_error(e)),
            };
            let name = field.name().unwrap_or_default().to_string();

            match field.file_name().map(str::to_string) {
                Some(file_name) => {
                    let body = field.bytes().await.map_err(multipart_error)?;
                    // an untouched file input still sends an empty part
                    if file_name.is_empty() && body.is_empty() {
                        continue;
                    }
                    form.files
                        .entry(name)
                        .or_default()
                        .push(UploadedFile { file_name, body });
                }
                None => {
                    let text = field.text().await.map_err(multipart_error)?;
                    form.fields.insert(name, text);
                }
            }
        }
        Ok(form)
    }

    pub fn text(&self, name: &str) -> String {
        self.fields.get(name).cloned().unwrap_or_default()
    }

    /// HTML checkboxes are only submitted when ticked.
    pub fn checkbox(&self, name: &str) -> bool {
        self.fields
            .get(name)
            .map(|v| !matches!(v.as_str(), "" | "false" | "off" | "0"))
            .unwrap_or(false)
    }

    pub fn take_file(&mut self, name: &str) -> Option<UploadedFile> {
        let mut files = self.files.remove(name)?;
        if files.is_empty() {
            None
        } else {
            Some(files.swap_remove(0))
        }
    }

    pub fn take_files(&mut self, name: &str) -> Vec<UploadedFile> {
        self.files.remove(name).unwrap_or_default()
    }
}

fn multipart_error(e: axum::extract::multipart::MultipartError) -> AppError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge
    } else {
        AppError::BadRequest(e.body_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    #[test]
    fn required_rejects_blank() {
        assert!(validate_required("x").is_ok());
        assert!(validate_required("").is_err());
        assert!(validate_required(" \t\n").is_err());
    }

    #[test]
    fn optional_url_accepts_empty_and_absolute() {
        assert!(validate_optional_url("").is_ok());
        assert!(validate_optional_url("   ").is_ok());
        assert!(validate_optional_url("https://github.com/someone").is_ok());
        assert!(validate_optional_url("http://localhost:8080/x").is_ok());
        assert!(validate_optional_url("github.com/someone").is_err());
        assert!(validate_optional_url("not a url").is_err());
        assert!(validate_optional_url("mailto:me@example.com").is_err());
    }

    #[test]
    fn image_field_check_ignores_missing_file() {
        let mut errors = FieldErrors::default();
        check_image_field(&mut errors, "image", None);
        assert!(errors.is_empty());

        let bad = UploadedFile {
            file_name: "cv.pdf".into(),
            body: Bytes::from_static(b"%PDF"),
        };
        check_image_field(&mut errors, "image", Some(&bad));
        assert_eq!(errors.get("image"), ["Images only!".to_string()]);
    }

    #[test]
    fn collect_merges_extra_errors() {
        let mut extra = FieldErrors::default();
        extra.add("image", "Images only!");
        let errors = FieldErrors::collect(Ok(()), extra);
        assert_eq!(errors.get("image").len(), 1);
        assert!(errors.get("title").is_empty());
    }
}
