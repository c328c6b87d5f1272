use serde::Serialize;
use validator::Validate;

use crate::{
    auth::repo_types::{ProfileChanges, User},
    forms::{validate_optional_url, validate_required, MultipartForm},
};

/// Profile edit form. The photo travels separately as a file part.
#[derive(Debug, Default, Clone, Serialize, Validate)]
pub struct ProfileForm {
    #[validate(length(max = 100, message = "Field cannot be longer than 100 characters."))]
    pub display_name: String,
    #[validate(length(max = 200, message = "Field cannot be longer than 200 characters."))]
    pub bio_header: String,
    #[validate(length(max = 2000, message = "Field cannot be longer than 2000 characters."))]
    pub bio: String,
    #[validate(length(max = 5000, message = "Field cannot be longer than 5000 characters."))]
    pub about_text: String,
    #[validate(
        custom(function = "validate_required"),
        length(max = 120, message = "Field cannot be longer than 120 characters.")
    )]
    pub email: String,
    #[validate(custom(function = "validate_optional_url"))]
    pub linkedin_url: String,
    #[validate(custom(function = "validate_optional_url"))]
    pub github_url: String,
}

impl ProfileForm {
    pub fn from_user(user: &User) -> Self {
        Self {
            display_name: user.display_name.clone(),
            bio_header: user.bio_header.clone(),
            bio: user.bio.clone(),
            about_text: user.about_text.clone(),
            email: user.email.clone(),
            linkedin_url: user.linkedin_url.clone(),
            github_url: user.github_url.clone(),
        }
    }

    pub fn from_multipart(form: &MultipartForm) -> Self {
        Self {
            display_name: form.text("display_name"),
            bio_header: form.text("bio_header"),
            bio: form.text("bio"),
            about_text: form.text("about_text"),
            email: form.text("email"),
            linkedin_url: form.text("linkedin_url"),
            github_url: form.text("github_url"),
        }
    }

    pub fn into_changes(self) -> ProfileChanges {
        ProfileChanges {
            display_name: self.display_name,
            bio_header: self.bio_header,
            bio: self.bio,
            about_text: self.about_text,
            email: self.email.trim().to_string(),
            linkedin_url: self.linkedin_url.trim().to_string(),
            github_url: self.github_url.trim().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forms::FieldErrors;

    fn valid() -> ProfileForm {
        ProfileForm {
            email: "me@example.com".into(),
            ..Default::default()
        }
    }

    #[test]
    fn minimal_profile_is_valid() {
        assert!(valid().validate().is_ok());
    }

    #[test]
    fn all_violations_are_reported_together() {
        let form = ProfileForm {
            display_name: "x".repeat(101),
            bio: "y".repeat(2001),
            email: " ".into(),
            linkedin_url: "linkedin".into(),
            ..Default::default()
        };
        let errors = FieldErrors::from_validation(form.validate());
        assert!(!errors.get("display_name").is_empty());
        assert!(!errors.get("bio").is_empty());
        assert_eq!(errors.get("email"), ["This field is required.".to_string()]);
        assert_eq!(errors.get("linkedin_url"), ["Invalid URL.".to_string()]);
        assert!(errors.get("github_url").is_empty());
    }

    #[test]
    fn length_counts_characters_not_bytes() {
        let form = ProfileForm {
            display_name: "\u{e9}".repeat(100),
            ..valid()
        };
        assert!(form.validate().is_ok());
    }
}
