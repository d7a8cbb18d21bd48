//! Post create/edit form.
//!
//! Submitted as `multipart/form-data` so it can carry an image.

use axum::extract::Multipart;
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use super::{FormErrors, csrf::CSRF_FIELD, max_length, required};
use crate::error::AppError;
use crate::file::validate_image;
use crate::models::{Category, Location, PostSummary};

/// Longest accepted title.
pub const TITLE_MAX_LENGTH: usize = 256;

/// Accepted `pub_date` layouts, as sent by `datetime-local` inputs.
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%d %H:%M:%S",
];

/// Layout used to pre-fill the `pub_date` input.
const DATETIME_INPUT_FORMAT: &str = "%Y-%m-%dT%H:%M";

/// Post form values as entered.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PostForm {
    pub title: String,
    pub text: String,
    pub pub_date: String,
    pub category: String,
    pub location: String,
    pub is_published: bool,
    /// "Remove the current image" checkbox on the edit form.
    pub image_clear: bool,
}

/// A file part from the submission.
#[derive(Debug, Clone)]
pub struct UploadedImage {
    pub data: Vec<u8>,
}

/// Everything a post form submission carries.
#[derive(Debug, Clone, Default)]
pub struct PostSubmission {
    pub form: PostForm,
    pub image: Option<UploadedImage>,
    pub csrf_token: String,
}

/// A validated image ready to be stored.
#[derive(Debug, Clone)]
pub struct ValidImage {
    pub data: Vec<u8>,
    pub extension: &'static str,
}

/// Cleaned post input.
#[derive(Debug, Clone)]
pub struct PostInput {
    pub title: String,
    pub text: String,
    pub pub_date: DateTime<Utc>,
    pub is_published: bool,
    pub category_id: Uuid,
    pub location_id: Option<Uuid>,
    pub image: Option<ValidImage>,
    pub clear_image: bool,
}

impl PostSubmission {
    /// Read every part of a multipart body. Unknown parts are ignored; an
    /// empty file part (no file chosen) counts as no image.
    pub async fn from_multipart(mut multipart: Multipart) -> Result<Self, AppError> {
        let mut submission = Self::default();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| AppError::BadRequest(format!("malformed form data: {e}")))?
        {
            let name = field.name().unwrap_or_default().to_string();

            if name == "image" {
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::BadRequest(format!("failed to read upload: {e}")))?;
                if !data.is_empty() {
                    submission.image = Some(UploadedImage {
                        data: data.to_vec(),
                    });
                }
                continue;
            }

            let value = field
                .text()
                .await
                .map_err(|e| AppError::BadRequest(format!("failed to read field {name}: {e}")))?;
            let form = &mut submission.form;
            match name.as_str() {
                "title" => form.title = value,
                "text" => form.text = value,
                "pub_date" => form.pub_date = value,
                "category" => form.category = value,
                "location" => form.location = value,
                "is_published" => form.is_published = is_checked(&value),
                "image_clear" => form.image_clear = is_checked(&value),
                CSRF_FIELD => submission.csrf_token = value,
                _ => {}
            }
        }

        Ok(submission)
    }
}

fn is_checked(value: &str) -> bool {
    !matches!(value.trim(), "" | "0" | "false" | "off")
}

/// Parse a `pub_date` value as UTC.
pub fn parse_pub_date(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    DATETIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
        .map(|naive| naive.and_utc())
}

/// Format a timestamp for a `datetime-local` input.
pub fn format_pub_date(value: DateTime<Utc>) -> String {
    value.format(DATETIME_INPUT_FORMAT).to_string()
}

fn parse_choice(value: &str) -> Result<Option<Uuid>, ()> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(None);
    }
    Uuid::parse_str(value).map(Some).map_err(|_| ())
}

const INVALID_CHOICE: &str = "Select a valid choice. That choice is not one of the available choices.";

impl PostForm {
    /// Blank form for a new post: published, dated now.
    pub fn blank(now: DateTime<Utc>) -> Self {
        Self {
            pub_date: format_pub_date(now),
            is_published: true,
            ..Self::default()
        }
    }

    /// Form pre-filled from an existing post.
    pub fn from_post(post: &PostSummary) -> Self {
        Self {
            title: post.title.clone(),
            text: post.text.clone(),
            pub_date: format_pub_date(post.pub_date),
            category: post.category_id.map(|id| id.to_string()).unwrap_or_default(),
            location: post.location_id.map(|id| id.to_string()).unwrap_or_default(),
            is_published: post.is_published,
            image_clear: false,
        }
    }

    /// Validate against the current categories and locations.
    pub fn validate(
        &self,
        image: Option<&UploadedImage>,
        categories: &[Category],
        locations: &[Location],
        max_upload_bytes: usize,
    ) -> Result<PostInput, FormErrors> {
        let mut errors = FormErrors::new();

        let title = required(&mut errors, "title", &self.title);
        if let Some(title) = &title {
            max_length(&mut errors, "title", title, TITLE_MAX_LENGTH);
        }
        let text = required(&mut errors, "text", &self.text);

        let pub_date = match required(&mut errors, "pub_date", &self.pub_date) {
            Some(raw) => {
                let parsed = parse_pub_date(&raw);
                if parsed.is_none() {
                    errors.add("pub_date", "Enter a valid date/time.");
                }
                parsed
            }
            None => None,
        };

        let category_id = match parse_choice(&self.category) {
            Ok(Some(id)) if categories.iter().any(|c| c.id == id) => Some(id),
            Ok(None) => {
                errors.add("category", super::REQUIRED);
                None
            }
            _ => {
                errors.add("category", INVALID_CHOICE);
                None
            }
        };

        let location_id = match parse_choice(&self.location) {
            Ok(Some(id)) if locations.iter().any(|l| l.id == id) => Some(id),
            Ok(None) => None,
            _ => {
                errors.add("location", INVALID_CHOICE);
                None
            }
        };

        let image = match image {
            None => None,
            Some(upload) => match validate_image(&upload.data, max_upload_bytes) {
                Ok(extension) => Some(ValidImage {
                    data: upload.data.clone(),
                    extension,
                }),
                Err(rejection) => {
                    errors.add("image", rejection.to_string());
                    None
                }
            },
        };

        match (title, text, pub_date, category_id) {
            (Some(title), Some(text), Some(pub_date), Some(category_id)) if errors.is_empty() => {
                Ok(PostInput {
                    title,
                    text,
                    pub_date,
                    is_published: self.is_published,
                    category_id,
                    location_id,
                    image,
                    clear_image: self.image_clear,
                })
            }
            _ => Err(errors),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    const PNG: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0];

    fn category() -> Category {
        Category {
            id: Uuid::now_v7(),
            title: "Travel".to_string(),
            description: String::new(),
            slug: "travel".to_string(),
            is_published: true,
            created_at: Utc::now(),
        }
    }

    fn location() -> Location {
        Location {
            id: Uuid::now_v7(),
            name: "Paris".to_string(),
            is_published: true,
            created_at: Utc::now(),
        }
    }

    fn filled(category: &Category) -> PostForm {
        PostForm {
            title: " A trip ".to_string(),
            text: "Went places.".to_string(),
            pub_date: "2024-05-01T10:30".to_string(),
            category: category.id.to_string(),
            is_published: true,
            ..PostForm::default()
        }
    }

    #[test]
    fn valid_form_cleans_values() {
        let cat = category();
        let input = filled(&cat).validate(None, &[cat.clone()], &[], 1024).unwrap();

        assert_eq!(input.title, "A trip");
        assert_eq!(input.category_id, cat.id);
        assert_eq!(input.location_id, None);
        assert_eq!(input.pub_date.year(), 2024);
        assert_eq!(input.pub_date.hour(), 10);
        assert!(input.image.is_none());
    }

    #[test]
    fn blank_fields_are_required() {
        let errors = PostForm::default().validate(None, &[], &[], 1024).unwrap_err();
        for field in ["title", "text", "pub_date", "category"] {
            assert!(errors.has(field), "missing error for {field}");
        }
        assert!(!errors.has("location"));
    }

    #[test]
    fn unknown_choices_are_rejected() {
        let cat = category();
        let mut form = filled(&cat);
        form.location = Uuid::now_v7().to_string();
        let errors = form.validate(None, &[cat.clone()], &[location()], 1024).unwrap_err();
        assert!(errors.has("location"));

        let mut form = filled(&cat);
        form.category = "not-a-uuid".to_string();
        let errors = form.validate(None, &[cat], &[], 1024).unwrap_err();
        assert!(errors.has("category"));
    }

    #[test]
    fn long_title_and_bad_date_are_reported() {
        let cat = category();
        let mut form = filled(&cat);
        form.title = "x".repeat(TITLE_MAX_LENGTH + 1);
        form.pub_date = "yesterday".to_string();

        let errors = form.validate(None, &[cat], &[], 1024).unwrap_err();
        assert!(errors.has("title"));
        assert!(errors.has("pub_date"));
    }

    #[test]
    fn image_is_sniffed() {
        let cat = category();
        let form = filled(&cat);

        let png = UploadedImage {
            data: PNG.to_vec(),
        };
        let input = form.validate(Some(&png), &[cat.clone()], &[], 1024).unwrap();
        assert_eq!(input.image.unwrap().extension, "png");

        let text = UploadedImage {
            data: b"not an image".to_vec(),
        };
        let errors = form.validate(Some(&text), &[cat], &[], 1024).unwrap_err();
        assert!(errors.has("image"));
    }

    #[test]
    fn pub_date_formats() {
        assert!(parse_pub_date("2024-05-01T10:30").is_some());
        assert!(parse_pub_date("2024-05-01T10:30:15").is_some());
        assert!(parse_pub_date("2024-05-01 10:30").is_some());
        assert!(parse_pub_date("2024-05-01").is_none());

        let now = parse_pub_date("2024-05-01T10:30").unwrap();
        assert_eq!(format_pub_date(now), "2024-05-01T10:30");
    }

    #[test]
    fn checkbox_values() {
        assert!(is_checked("on"));
        assert!(is_checked("true"));
        assert!(!is_checked(""));
        assert!(!is_checked("off"));
    }
}
