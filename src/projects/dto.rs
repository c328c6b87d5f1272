use serde::Serialize;
use validator::Validate;

use super::repo_types::{Project, ProjectFields};
use crate::forms::{validate_optional_url, validate_required, MultipartForm};

/// Project create/edit form. Cover and content images arrive as file parts.
#[derive(Debug, Clone, Serialize, Validate)]
pub struct ProjectForm {
    #[validate(
        custom(function = "validate_required"),
        length(max = 200, message = "Field cannot be longer than 200 characters.")
    )]
    pub title: String,
    #[validate(
        custom(function = "validate_required"),
        length(max = 500, message = "Field cannot be longer than 500 characters.")
    )]
    pub description: String,
    #[validate(custom(function = "validate_required"))]
    pub content: String,
    #[validate(custom(function = "validate_optional_url"))]
    pub github_url: String,
    pub published: bool,
}

impl Default for ProjectForm {
    /// New projects start out published.
    fn default() -> Self {
        Self {
            title: String::new(),
            description: String::new(),
            content: String::new(),
            github_url: String::new(),
            published: true,
        }
    }
}

impl ProjectForm {
    pub fn from_project(p: &Project) -> Self {
        Self {
            title: p.title.clone(),
            description: p.description.clone(),
            content: p.content.clone(),
            github_url: p.github_url.clone(),
            published: p.published,
        }
    }

    pub fn from_multipart(form: &MultipartForm) -> Self {
        Self {
            title: form.text("title"),
            description: form.text("description"),
            content: form.text("content"),
            github_url: form.text("github_url"),
            published: form.checkbox("published"),
        }
    }

    pub fn into_fields(self) -> ProjectFields {
        ProjectFields {
            title: self.title.trim().to_string(),
            description: self.description.trim().to_string(),
            content: self.content,
            github_url: self.github_url.trim().to_string(),
            published: self.published,
        }
    }
}
